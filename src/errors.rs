use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not visible within {timeout_ms}ms: {selector}")]
    ElementTimeout { selector: String, timeout_ms: u64 },

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Action {step} ({operation}) failed: {detail}")]
    ActionFailed {
        step: usize,
        operation: &'static str,
        detail: String,
    },

    #[error("Extraction for '{key}' failed: {detail}")]
    ExtractionFailed { key: String, detail: String },

    #[error("Invalid selector '{key}': {reason}")]
    InvalidSelector { key: String, reason: String },

    #[error("Duplicate selector key: {0}")]
    DuplicateKey(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Run timed out after {0}s")]
    Timeout(u64),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ControlError>;

impl ControlError {
    pub fn invalid_selector(key: &str, reason: impl Into<String>) -> Self {
        ControlError::InvalidSelector {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised before any browser work starts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ControlError::InvalidSelector { .. }
                | ControlError::DuplicateKey(_)
                | ControlError::InvalidRequest(_)
        )
    }
}
