use crate::actions::model::{Action, CaptureVariable};
use crate::runtime::VariableStore;
use crate::utils::js_string;
use std::time::Duration;
use tracing::warn;

/// A concrete command against the live page, with every template already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Navigate {
        url: String,
    },
    Sleep {
        duration: Duration,
    },
    WaitVisible {
        selector: String,
    },
    Click {
        selector: String,
    },
    TypeText {
        selector: String,
        text: String,
    },
    /// Side-effecting script; the result is discarded.
    Evaluate {
        script: String,
    },
    /// Script whose string result becomes the next runtime variable.
    Capture {
        script: String,
        source_selector: String,
        attribute: Option<String>,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Navigate { .. } => "navigate",
            Operation::Sleep { .. } => "sleep",
            Operation::WaitVisible { .. } => "waitVisible",
            Operation::Click { .. } => "click",
            Operation::TypeText { .. } => "sendKeys",
            Operation::Evaluate { .. } => "evalJs",
            Operation::Capture { .. } => "runtimeVar",
        }
    }
}

/// Compile one action against the variables captured so far.
///
/// Returns `None` when the step has nothing to run (a capture without a CSS selector).
pub fn compile(action: &Action, store: &VariableStore) -> Option<Operation> {
    let operation = match action {
        Action::Navigate(url) => Operation::Navigate {
            url: store.substitute(url),
        },
        Action::Sleep(seconds) => Operation::Sleep {
            duration: Duration::from_secs(*seconds),
        },
        Action::WaitVisible(selector) => Operation::WaitVisible {
            selector: store.substitute(selector),
        },
        Action::Click(selector) => Operation::Click {
            selector: store.substitute(selector),
        },
        Action::SendKeys(keys) => Operation::TypeText {
            selector: store.substitute(&keys.css_selector),
            text: store.substitute(&keys.value),
        },
        Action::EvaluateScript(script) => Operation::Evaluate {
            script: store.substitute(script),
        },
        Action::CaptureVariable(capture) => return compile_capture(capture, store),
    };

    Some(operation)
}

fn compile_capture(capture: &CaptureVariable, store: &VariableStore) -> Option<Operation> {
    let Some(css_selector) = capture.css_selector.as_deref() else {
        warn!(
            variable = store.next_name().as_str(),
            "missing css selector for runtime variable, skipping capture"
        );
        return None;
    };

    let selector = store.substitute(css_selector);
    let read = match capture.html_attribute.as_deref() {
        Some(attribute) => format!(".getAttribute({})", js_string(&store.substitute(attribute))),
        None => ".textContent".to_string(),
    };

    Some(Operation::Capture {
        script: format!("document.querySelector({}){}", js_string(&selector), read),
        source_selector: css_selector.to_string(),
        attribute: capture.html_attribute.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::model::SendKeys;

    #[test]
    fn navigate_keeps_unmatched_tokens() {
        let store = VariableStore::new();
        let operation = compile(&Action::Navigate("http://x/$0".to_string()), &store);
        assert_eq!(
            operation,
            Some(Operation::Navigate {
                url: "http://x/$0".to_string()
            })
        );
    }

    #[test]
    fn substitutes_selectors_and_values() {
        let mut store = VariableStore::new();
        store.capture("#user", None, "ada");

        let operation = compile(
            &Action::SendKeys(SendKeys {
                css_selector: "#row-$0 input".to_string(),
                value: "hello $0".to_string(),
            }),
            &store,
        );

        assert_eq!(
            operation,
            Some(Operation::TypeText {
                selector: "#row-ada input".to_string(),
                text: "hello ada".to_string(),
            })
        );
    }

    #[test]
    fn sleep_is_not_templated() {
        let operation = compile(&Action::Sleep(3), &VariableStore::new());
        assert_eq!(
            operation,
            Some(Operation::Sleep {
                duration: Duration::from_secs(3)
            })
        );
    }

    #[test]
    fn capture_reads_attribute_of_first_match() {
        let mut store = VariableStore::new();
        store.capture("#page", None, "2");

        let operation = compile(
            &Action::CaptureVariable(CaptureVariable {
                css_selector: Some("li:nth-child($0) a".to_string()),
                html_attribute: Some("href".to_string()),
            }),
            &store,
        )
        .unwrap();

        assert_eq!(
            operation,
            Operation::Capture {
                script: r#"document.querySelector("li:nth-child(2) a").getAttribute("href")"#
                    .to_string(),
                source_selector: "li:nth-child($0) a".to_string(),
                attribute: Some("href".to_string()),
            }
        );
    }

    #[test]
    fn capture_defaults_to_text_content() {
        let operation = compile(
            &Action::CaptureVariable(CaptureVariable {
                css_selector: Some("h1".to_string()),
                html_attribute: None,
            }),
            &VariableStore::new(),
        )
        .unwrap();

        match operation {
            Operation::Capture { script, .. } => {
                assert_eq!(script, r#"document.querySelector("h1").textContent"#)
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn capture_without_selector_is_skipped() {
        let operation = compile(
            &Action::CaptureVariable(CaptureVariable::default()),
            &VariableStore::new(),
        );
        assert_eq!(operation, None);
    }
}
