use serde::{Deserialize, Serialize};

/// One scripted browser interaction. The wire form is an object with exactly one key,
/// e.g. `{"navigate": "https://example.com"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Navigate(String),
    /// Seconds to pause.
    Sleep(u64),
    WaitVisible(String),
    Click(String),
    SendKeys(SendKeys),
    #[serde(rename = "evalJs", alias = "evaluateScript")]
    EvaluateScript(String),
    #[serde(rename = "runtimeVar", alias = "captureVariable")]
    CaptureVariable(CaptureVariable),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendKeys {
    pub css_selector: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureVariable {
    #[serde(default)]
    pub css_selector: Option<String>,
    #[serde(default)]
    pub html_attribute: Option<String>,
}
