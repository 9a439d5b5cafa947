use crate::errors::{ControlError, Result};
use crate::selectors::cleanup::NODE_FIELD;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result shape of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorType {
    #[serde(alias = "OBJECT_ARRAY", alias = "objectArray")]
    ObjectArray,
    #[serde(alias = "STRING_ARRAY", alias = "stringArray")]
    StringArray,
    #[serde(alias = "OBJECT_PROP", alias = "objectProp")]
    ObjectProp,
    #[serde(alias = "STRING_PROP", alias = "stringProp")]
    StringProp,
}

impl SelectorType {
    pub fn is_array(self) -> bool {
        matches!(self, SelectorType::ObjectArray | SelectorType::StringArray)
    }

    pub fn is_object(self) -> bool {
        matches!(self, SelectorType::ObjectArray | SelectorType::ObjectProp)
    }
}

/// Declarative description of one extracted field and, for object types, its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(rename = "type")]
    pub selector_type: SelectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_selectors: Vec<Selector>,
}

impl Selector {
    pub fn new(
        key: impl Into<String>,
        css_selector: impl Into<String>,
        selector_type: SelectorType,
    ) -> Self {
        Self {
            key: key.into(),
            css_selector: Some(css_selector.into()),
            selector_type,
            html_attribute: None,
            regex: None,
            sub_selectors: Vec::new(),
        }
    }

    /// A nested selector that refines its parent's node instead of querying again.
    pub fn pass_through(key: impl Into<String>, selector_type: SelectorType) -> Self {
        Self {
            key: key.into(),
            css_selector: None,
            selector_type,
            html_attribute: None,
            regex: None,
            sub_selectors: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.html_attribute = Some(attribute.into());
        self
    }

    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn with_child(mut self, child: Selector) -> Self {
        self.sub_selectors.push(child);
        self
    }

    /// Check the tree's structural invariants. Root selectors must carry a CSS selector.
    pub fn validate(&self) -> Result<()> {
        self.validate_node(true)
    }

    fn validate_node(&self, is_root: bool) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(ControlError::invalid_selector(&self.key, "key must not be empty"));
        }
        if self.key == NODE_FIELD {
            return Err(ControlError::invalid_selector(&self.key, "key is reserved"));
        }

        match self.css_selector.as_deref() {
            Some(css) if css.trim().is_empty() => {
                return Err(ControlError::invalid_selector(
                    &self.key,
                    "cssSelector must not be empty",
                ));
            }
            None if is_root => {
                return Err(ControlError::invalid_selector(
                    &self.key,
                    "top-level selectors need a cssSelector",
                ));
            }
            _ => {}
        }

        if self.regex.as_deref().is_some_and(str::is_empty) {
            return Err(ControlError::invalid_selector(&self.key, "regex must not be empty"));
        }

        if !self.sub_selectors.is_empty() && !self.selector_type.is_object() {
            return Err(ControlError::invalid_selector(
                &self.key,
                format!("{:?} cannot have subSelectors", self.selector_type),
            ));
        }

        ensure_unique_keys(&self.sub_selectors)?;
        for child in &self.sub_selectors {
            child.validate_node(false)?;
        }

        Ok(())
    }
}

/// Sibling keys become properties of the same object, so they must be distinct.
pub fn ensure_unique_keys(selectors: &[Selector]) -> Result<()> {
    let mut seen = HashSet::new();
    for selector in selectors {
        if !seen.insert(selector.key.as_str()) {
            return Err(ControlError::DuplicateKey(selector.key.clone()));
        }
    }
    Ok(())
}
