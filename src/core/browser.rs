use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Low-level driver for one remote-controlled browser.
#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &crate::core::config::BrowserConfig) -> Result<()>;

    /// Create a new tab/page
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL and wait for the navigation to settle
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Click the first element matching a CSS selector
    async fn click(&self, tab: &Self::TabHandle, selector: &str) -> Result<()>;

    /// Focus the first element matching a CSS selector and type into it
    async fn type_text(&self, tab: &Self::TabHandle, selector: &str, text: &str) -> Result<()>;

    /// Execute JavaScript in the browser
    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}
