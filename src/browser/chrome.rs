use crate::core::config::BrowserConfig;
use crate::core::BrowserTrait;
use crate::errors::{ControlError, Result};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Runtime;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self { browser: None }
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

/// headless_chrome blocks the calling thread; keep it off the async workers so run
/// deadlines can fire while a call is in flight.
async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ControlError::ChromeError(e.to_string()))?
}

/// A thrown exception fails the call; otherwise the primitive result, or `Null` for
/// `undefined` and object references.
fn script_result(returns: Runtime::EvaluateReturnObject) -> Result<Value> {
    if let Some(details) = returns.exception_details {
        let message = details
            .exception
            .and_then(|exception| exception.description)
            .unwrap_or(details.text);
        return Err(ControlError::JavaScriptFailed(message));
    }
    Ok(returns.result.value.unwrap_or(Value::Null))
}

fn launch_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-gpu".to_string(),
    ];

    if let Some(ref ua) = config.user_agent {
        args.push(format!("--user-agent={}", ua));
    }

    if config.disable_images {
        args.push("--blink-settings=imagesEnabled=false".to_string());
    }

    if config.debug {
        args.push("--enable-logging=stderr".to_string());
        args.push("--v=1".to_string());
    }

    args.extend(config.args.iter().cloned());
    args
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let args = launch_args(config);
        let headless = config.headless;
        let path = config.executable_path.clone();
        let window_size = (config.viewport.width, config.viewport.height);
        let idle_timeout = Duration::from_secs(config.idle_timeout_secs);

        debug!(?args, ?path, headless, "launching chrome");

        let browser = blocking(move || {
            let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
            let launch_options = LaunchOptions::default_builder()
                .headless(headless)
                .path(path)
                .window_size(Some(window_size))
                .idle_browser_timeout(idle_timeout)
                .args(args)
                .build()
                .map_err(|e| ControlError::LaunchFailed(e.to_string()))?;

            Browser::new(launch_options).map_err(|e| ControlError::LaunchFailed(e.to_string()))
        })
        .await?;

        self.browser = Some(browser);
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(ControlError::BrowserNotLaunched)?
            .clone();

        blocking(move || {
            browser
                .new_tab()
                .map_err(|e| ControlError::TabCreationFailed(e.to_string()))
        })
        .await
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        let tab = tab.clone();
        let url = url.to_string();

        blocking(move || {
            tab.navigate_to(&url)
                .map_err(|e| ControlError::NavigationFailed(e.to_string()))?;

            tab.wait_until_navigated()
                .map_err(|e| ControlError::NavigationFailed(e.to_string()))?;

            Ok(())
        })
        .await
    }

    async fn click(&self, tab: &Self::TabHandle, selector: &str) -> Result<()> {
        let tab = tab.clone();
        let selector = selector.to_string();

        blocking(move || {
            tab.find_element(&selector)
                .map_err(|e| ControlError::ElementNotFound(format!("{}: {}", selector, e)))?
                .click()
                .map_err(|e| ControlError::JavaScriptFailed(e.to_string()))?;

            Ok(())
        })
        .await
    }

    async fn type_text(&self, tab: &Self::TabHandle, selector: &str, text: &str) -> Result<()> {
        let tab = tab.clone();
        let selector = selector.to_string();
        let text = text.to_string();

        blocking(move || {
            let element = tab
                .find_element(&selector)
                .map_err(|e| ControlError::ElementNotFound(format!("{}: {}", selector, e)))?;

            element
                .click()
                .map_err(|e| ControlError::JavaScriptFailed(e.to_string()))?;

            element
                .type_into(&text)
                .map_err(|e| ControlError::JavaScriptFailed(e.to_string()))?;

            Ok(())
        })
        .await
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let tab = tab.clone();
        let script = script.to_string();

        blocking(move || {
            let returns = tab
                .call_method(Runtime::Evaluate {
                    expression: script,
                    return_by_value: Some(false),
                    generate_preview: Some(false),
                    silent: Some(false),
                    await_promise: Some(false),
                    include_command_line_api: Some(false),
                    user_gesture: Some(false),
                    object_group: None,
                    context_id: None,
                    throw_on_side_effect: None,
                    timeout: None,
                    disable_breaks: None,
                    repl_mode: None,
                    allow_unsafe_eval_blocked_by_csp: None,
                    unique_context_id: None,
                    serialization_options: None,
                })
                .map_err(|e| ControlError::JavaScriptFailed(e.to_string()))?;

            script_result(returns)
        })
        .await
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the handle terminates the launched process.
        self.browser = None;
        Ok(())
    }
}
