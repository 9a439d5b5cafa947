use crate::actions::Action;
use crate::core::config::{ExtractionConfig, SessionConfig, StringPropMode};
use crate::errors::{ControlError, Result};
use crate::runtime::RuntimeVariable;
use crate::selectors::{ensure_unique_keys, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// One run: the interactions to perform and what to extract afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_value_with_children: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_prop_mode: Option<StringPropMode>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub selectors: Vec<Selector>,
}

impl ControlRequest {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reject malformed selector trees and key collisions before any browser work.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == Some(0) {
            return Err(ControlError::InvalidRequest(
                "timeoutSeconds must be positive".to_string(),
            ));
        }

        ensure_unique_keys(&self.selectors)?;
        for selector in &self.selectors {
            selector.validate()?;
        }

        Ok(())
    }

    pub fn timeout(&self, defaults: &SessionConfig) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(defaults.default_timeout_secs))
    }

    /// Request fields layered over configured extraction defaults.
    pub fn extraction_options(&self, defaults: &ExtractionConfig) -> ExtractionConfig {
        ExtractionConfig {
            omit_empty: self.omit_empty.unwrap_or(defaults.omit_empty),
            drop_value_with_children: self
                .drop_value_with_children
                .unwrap_or(defaults.drop_value_with_children),
            string_prop_mode: self.string_prop_mode.unwrap_or(defaults.string_prop_mode),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub runtime_variables: Vec<RuntimeVariable>,
    pub data: Map<String, Value>,
}
