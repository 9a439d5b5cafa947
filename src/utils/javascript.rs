use crate::core::BrowserTrait;
use crate::errors::{ControlError, Result};
use serde_json::Value;

/// Quote a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Expression that is truthy once the first element matching `selector` is rendered and
/// not hidden by style.
pub fn visibility_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({});
  if (!el) return false;
  const style = window.getComputedStyle(el);
  const rect = el.getBoundingClientRect();
  return style.display !== "none" && style.visibility !== "hidden"
    && (rect.width > 0 || rect.height > 0);
}})()"#,
        js_string(selector)
    )
}

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    /// Evaluate `script` and decode its result as JSON.
    ///
    /// The expression is wrapped in `JSON.stringify` so objects and arrays cross the
    /// protocol by value; `undefined` comes back as `Value::Null`.
    pub async fn evaluate_json<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        script: &str,
    ) -> Result<Value> {
        let wrapped = format!("JSON.stringify({})", script);
        match browser.execute_script(tab, &wrapped).await? {
            Value::String(encoded) => Ok(serde_json::from_str(&encoded)?),
            Value::Null => Ok(Value::Null),
            other => Err(ControlError::JavaScriptFailed(format!(
                "expected a JSON string from the page, got {}",
                other
            ))),
        }
    }

    pub async fn wait_for_condition<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        condition: &str,
        timeout_ms: u64,
        poll_interval_ms: u64,
    ) -> Result<bool> {
        let start_time = std::time::Instant::now();
        let timeout = tokio::time::Duration::from_millis(timeout_ms);
        let poll_interval = tokio::time::Duration::from_millis(poll_interval_ms.max(1));

        loop {
            let result = browser.execute_script(tab, condition).await?;
            if result.as_bool() == Some(true) {
                return Ok(true);
            }

            if start_time.elapsed() >= timeout {
                return Ok(false);
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
