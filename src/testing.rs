//! In-memory browser driver for tests.
//!
//! `MockBrowser` records every call it receives and answers scripts from registered
//! responses, so sessions, runners and the pipeline can be exercised without Chrome.

use crate::core::config::BrowserConfig;
use crate::core::BrowserTrait;
use crate::errors::{ControlError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Launch,
    NewTab,
    Navigate(String),
    Click(String),
    TypeText { selector: String, text: String },
    Script(String),
    Close,
}

#[derive(Default)]
pub struct MockBrowser {
    calls: Arc<Mutex<Vec<MockCall>>>,
    responses: Vec<(String, Value)>,
    failures: Vec<String>,
    exceptions: Vec<(String, String)>,
    hidden: Vec<String>,
    navigation_delay: Option<Duration>,
    launched: bool,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any script containing `needle` with `value`. First registration wins.
    pub fn respond(mut self, needle: impl Into<String>, value: Value) -> Self {
        self.responses.push((needle.into(), value));
        self
    }

    /// Fail any call whose URL, selector or script contains `needle`.
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    /// Make any script containing `needle` throw in the page with `message`, reported the way
    /// the Chrome driver reports uncaught exceptions.
    pub fn throw_on(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.exceptions.push((needle.into(), message.into()));
        self
    }

    /// Report elements matching `needle` as never visible.
    pub fn hide(mut self, needle: impl Into<String>) -> Self {
        self.hidden.push(needle.into());
        self
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    /// Shared handle on the call log; stays readable after the browser moves into a session.
    pub fn calls(&self) -> Arc<Mutex<Vec<MockCall>>> {
        self.calls.clone()
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check(&self, subject: &str) -> Result<()> {
        match self.failures.iter().find(|needle| subject.contains(needle.as_str())) {
            Some(needle) => Err(ControlError::JavaScriptFailed(format!(
                "mock failure for '{}'",
                needle
            ))),
            None => Ok(()),
        }
    }

    fn response_for(&self, script: &str) -> Option<&Value> {
        self.responses
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl BrowserTrait for MockBrowser {
    type TabHandle = ();

    async fn launch(&mut self, _config: &BrowserConfig) -> Result<()> {
        self.record(MockCall::Launch);
        self.launched = true;
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        if !self.launched {
            return Err(ControlError::BrowserNotLaunched);
        }
        self.record(MockCall::NewTab);
        Ok(())
    }

    async fn navigate(&self, _tab: &Self::TabHandle, url: &str) -> Result<()> {
        self.record(MockCall::Navigate(url.to_string()));
        if let Some(delay) = self.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        self.check(url)
            .map_err(|e| ControlError::NavigationFailed(e.to_string()))
    }

    async fn click(&self, _tab: &Self::TabHandle, selector: &str) -> Result<()> {
        self.record(MockCall::Click(selector.to_string()));
        self.check(selector)
            .map_err(|_| ControlError::ElementNotFound(selector.to_string()))
    }

    async fn type_text(&self, _tab: &Self::TabHandle, selector: &str, text: &str) -> Result<()> {
        self.record(MockCall::TypeText {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        self.check(selector)
            .map_err(|_| ControlError::ElementNotFound(selector.to_string()))
    }

    async fn execute_script(&self, _tab: &Self::TabHandle, script: &str) -> Result<Value> {
        self.record(MockCall::Script(script.to_string()));
        self.check(script)?;

        if let Some((_, message)) = self
            .exceptions
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
        {
            return Err(ControlError::JavaScriptFailed(message.clone()));
        }

        if script.contains("getBoundingClientRect") {
            let hidden = self
                .hidden
                .iter()
                .any(|needle| script.contains(needle.as_str()));
            return Ok(Value::Bool(!hidden));
        }

        // Mirrors the page: JSON.stringify(expr) hands back the encoded text.
        if let Some(inner) = script.strip_prefix("JSON.stringify(") {
            let encoded = self
                .response_for(inner)
                .map(|value| value.to_string())
                .unwrap_or_else(|| "null".to_string());
            return Ok(Value::String(encoded));
        }

        Ok(self.response_for(script).cloned().unwrap_or(Value::Null))
    }

    fn is_running(&self) -> bool {
        self.launched
    }

    async fn close(&mut self) -> Result<()> {
        self.record(MockCall::Close);
        self.launched = false;
        Ok(())
    }
}
