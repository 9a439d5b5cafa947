use crate::actions::compiler::{self, Operation};
use crate::actions::model::Action;
use crate::core::PageSession;
use crate::errors::{ControlError, Result};
use crate::runtime::VariableStore;
use serde_json::Value;
use tracing::{debug, info};

pub struct ActionRunner;

impl ActionRunner {
    /// Compile and execute `actions` one at a time, growing `store` with every capture.
    ///
    /// Each action is compiled only after its predecessor ran, so templates see every
    /// variable captured before them. The first failing operation aborts the run.
    pub async fn run<S: PageSession + ?Sized>(
        session: &S,
        actions: &[Action],
        store: &mut VariableStore,
    ) -> Result<()> {
        for (step, action) in actions.iter().enumerate() {
            let Some(operation) = compiler::compile(action, store) else {
                continue;
            };

            debug!(step, operation = operation.kind(), "executing action");

            let result =
                session
                    .execute(&operation)
                    .await
                    .map_err(|e| ControlError::ActionFailed {
                        step,
                        operation: operation.kind(),
                        detail: e.to_string(),
                    })?;

            if let Operation::Capture {
                source_selector,
                attribute,
                ..
            } = operation
            {
                let variable = store.capture(source_selector, attribute, captured_text(result));
                info!(
                    name = variable.name.as_str(),
                    selector = variable.source_selector.as_str(),
                    "captured runtime variable"
                );
            }
        }

        Ok(())
    }
}

fn captured_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::model::{CaptureVariable, SendKeys};
    use crate::browser::BrowserSession;
    use crate::core::Config;
    use crate::testing::{MockBrowser, MockCall};
    use serde_json::json;

    async fn session(browser: MockBrowser) -> BrowserSession<MockBrowser> {
        BrowserSession::new(browser, Config::default()).await.unwrap()
    }

    #[tokio::test]
    async fn later_steps_see_captured_variables() {
        let browser = MockBrowser::new().respond("a.next", json!("/page/2"));
        let calls = browser.calls();
        let session = session(browser).await;

        let actions = vec![
            Action::Navigate("https://shop.test/".to_string()),
            Action::CaptureVariable(CaptureVariable {
                css_selector: Some("a.next".to_string()),
                html_attribute: Some("href".to_string()),
            }),
            Action::Navigate("https://shop.test$0".to_string()),
        ];

        let mut store = VariableStore::new();
        ActionRunner::run(&session, &actions, &mut store).await.unwrap();

        assert_eq!(store.len(), 1);
        let variable = store.get("$0").unwrap();
        assert_eq!(variable.value, "/page/2");
        assert_eq!(variable.source_selector, "a.next");
        assert_eq!(variable.attribute.as_deref(), Some("href"));

        let navigations: Vec<String> = calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                MockCall::Navigate(url) => Some(url.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            navigations,
            vec!["https://shop.test/", "https://shop.test/page/2"]
        );
    }

    #[tokio::test]
    async fn skipped_capture_does_not_consume_a_name() {
        let browser = MockBrowser::new().respond("h1", json!("Title"));
        let session = session(browser).await;

        let actions = vec![
            Action::CaptureVariable(CaptureVariable::default()),
            Action::CaptureVariable(CaptureVariable {
                css_selector: Some("h1".to_string()),
                html_attribute: None,
            }),
        ];

        let mut store = VariableStore::new();
        ActionRunner::run(&session, &actions, &mut store).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("$0").unwrap().value, "Title");
    }

    #[tokio::test]
    async fn missing_attribute_captures_empty_string() {
        let session = session(MockBrowser::new()).await;
        let actions = vec![Action::CaptureVariable(CaptureVariable {
            css_selector: Some("img".to_string()),
            html_attribute: Some("alt".to_string()),
        })];

        let mut store = VariableStore::new();
        ActionRunner::run(&session, &actions, &mut store).await.unwrap();
        assert_eq!(store.get("$0").unwrap().value, "");
    }

    #[tokio::test]
    async fn capture_of_missing_element_fails_the_step() {
        let browser = MockBrowser::new().throw_on(
            "\"#absent\"",
            "TypeError: Cannot read properties of null (reading 'textContent')",
        );
        let calls = browser.calls();
        let session = session(browser).await;

        let actions = vec![
            Action::CaptureVariable(CaptureVariable {
                css_selector: Some("#absent".to_string()),
                html_attribute: None,
            }),
            Action::Navigate("https://shop.test/$0".to_string()),
        ];

        let mut store = VariableStore::new();
        let err = ActionRunner::run(&session, &actions, &mut store)
            .await
            .unwrap_err();

        match err {
            ControlError::ActionFailed {
                step,
                operation,
                detail,
            } => {
                assert_eq!(step, 0);
                assert_eq!(operation, "runtimeVar");
                assert!(detail.contains("TypeError"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_empty());
        assert!(!calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| matches!(call, MockCall::Navigate(_))));
    }

    #[tokio::test]
    async fn throwing_script_fails_the_step() {
        let browser =
            MockBrowser::new().throw_on("nope()", "ReferenceError: nope is not defined");
        let session = session(browser).await;

        let actions = vec![
            Action::Navigate("https://shop.test/".to_string()),
            Action::EvaluateScript("nope()".to_string()),
        ];

        let mut store = VariableStore::new();
        let err = ActionRunner::run(&session, &actions, &mut store)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::ActionFailed { step: 1, operation: "evalJs", .. }
        ));
    }

    #[tokio::test]
    async fn failing_step_aborts_the_run() {
        let browser = MockBrowser::new().fail_on("#missing");
        let calls = browser.calls();
        let session = session(browser).await;

        let actions = vec![
            Action::Click("#missing".to_string()),
            Action::SendKeys(SendKeys {
                css_selector: "input".to_string(),
                value: "never typed".to_string(),
            }),
        ];

        let mut store = VariableStore::new();
        let err = ActionRunner::run(&session, &actions, &mut store)
            .await
            .unwrap_err();

        match err {
            ControlError::ActionFailed {
                step, operation, ..
            } => {
                assert_eq!(step, 0);
                assert_eq!(operation, "click");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| matches!(call, MockCall::TypeText { .. })));
    }
}
