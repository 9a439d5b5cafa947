use crate::errors::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub session: SessionConfig,
    pub extraction: ExtractionConfig,
}

/// Everything session creation needs. Replaces process-wide headless/debug switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub executable_path: Option<PathBuf>,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
    /// Seconds without protocol traffic before the driver gives up on the browser.
    pub idle_timeout_secs: u64,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Used when a request carries no `timeoutSeconds`.
    pub default_timeout_secs: u64,
    pub element_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub omit_empty: bool,
    pub drop_value_with_children: bool,
    pub string_prop_mode: StringPropMode,
}

/// How a `StringProp` selector reduces its matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringPropMode {
    /// Text of the first matching node.
    #[default]
    First,
    /// Concatenated text of every matching node, refined afterwards.
    Join,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw).map_err(|e| {
            ControlError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Overlay `SITE_CONTROL_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(headless) = lookup("SITE_CONTROL_HEADLESS").and_then(|v| parse_flag(&v)) {
            self.browser.headless = headless;
        }
        if let Some(path) = lookup("SITE_CONTROL_CHROME_PATH").filter(|v| !v.is_empty()) {
            self.browser.executable_path = Some(PathBuf::from(path));
        }
        if let Some(debug) = lookup("SITE_CONTROL_DEBUG").and_then(|v| parse_flag(&v)) {
            self.browser.debug = debug;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable_path: None,
            viewport: Viewport::default(),
            user_agent: None,
            disable_images: false,
            args: vec![],
            idle_timeout_secs: 300,
            debug: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            element_timeout_ms: 10000,
            poll_interval_ms: 100,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            omit_empty: false,
            drop_value_with_children: true,
            string_prop_mode: StringPropMode::First,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
