use crate::actions::Operation;
use crate::core::{BrowserTrait, Config, PageSession};
use crate::errors::{ControlError, Result};
use crate::utils::javascript::{visibility_script, JavaScriptRunner};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// One launched browser with one active tab, exclusively owned by a single run.
pub struct BrowserSession<B: BrowserTrait> {
    browser: B,
    tab: Option<B::TabHandle>,
    config: Config,
    session_id: String,
}

impl<B: BrowserTrait> BrowserSession<B> {
    pub async fn new(mut browser: B, config: Config) -> Result<Self> {
        browser.launch(&config.browser).await?;
        let tab = browser.new_tab().await?;
        let session_id = uuid::Uuid::new_v4().to_string();

        info!(
            session_id = session_id.as_str(),
            headless = config.browser.headless,
            "browser session ready"
        );

        Ok(Self {
            browser,
            tab: Some(tab),
            config,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.tab.is_some() && self.browser.is_running()
    }

    fn tab(&self) -> Result<&B::TabHandle> {
        self.tab.as_ref().ok_or(ControlError::NoActiveTab)
    }

    async fn wait_visible(&self, selector: &str) -> Result<()> {
        let timeout_ms = self.config.session.element_timeout_ms;
        let visible = JavaScriptRunner::wait_for_condition(
            &self.browser,
            self.tab()?,
            &visibility_script(selector),
            timeout_ms,
            self.config.session.poll_interval_ms,
        )
        .await?;

        if visible {
            Ok(())
        } else {
            Err(ControlError::ElementTimeout {
                selector: selector.to_string(),
                timeout_ms,
            })
        }
    }
}

#[async_trait]
impl<B: BrowserTrait> PageSession for BrowserSession<B> {
    async fn execute(&self, operation: &Operation) -> Result<Value> {
        let tab = self.tab()?;

        match operation {
            Operation::Navigate { url } => {
                debug!(url = url.as_str(), "navigate");
                self.browser.navigate(tab, url).await?;
            }
            Operation::Sleep { duration } => {
                debug!(?duration, "sleep");
                tokio::time::sleep(*duration).await;
            }
            Operation::WaitVisible { selector } => {
                debug!(selector = selector.as_str(), "wait visible");
                self.wait_visible(selector).await?;
            }
            Operation::Click { selector } => {
                debug!(selector = selector.as_str(), "click");
                self.browser.click(tab, selector).await?;
            }
            Operation::TypeText { selector, text } => {
                debug!(selector = selector.as_str(), "type text");
                self.browser.type_text(tab, selector, text).await?;
            }
            Operation::Evaluate { script } => {
                debug!(script = script.as_str(), "evaluate");
                self.browser.execute_script(tab, script).await?;
            }
            Operation::Capture { script, .. } => {
                debug!(script = script.as_str(), "capture");
                return JavaScriptRunner::evaluate_json(&self.browser, tab, script).await;
            }
        }

        Ok(Value::Null)
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        JavaScriptRunner::evaluate_json(&self.browser, self.tab()?, script).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.tab.take().is_some() {
            info!(session_id = self.session_id.as_str(), "closing browser session");
        }
        self.browser.close().await
    }
}
