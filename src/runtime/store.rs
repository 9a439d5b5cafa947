use crate::runtime::template;
use serde::{Deserialize, Serialize};

/// A value captured from the page while actions run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVariable {
    pub name: String,
    pub source_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub value: String,
}

/// Append-only, capture-ordered sequence of runtime variables owned by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    variables: Vec<RuntimeVariable>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token the next captured variable will be stored under.
    pub fn next_name(&self) -> String {
        format!("${}", self.variables.len())
    }

    pub fn capture(
        &mut self,
        source_selector: impl Into<String>,
        attribute: Option<String>,
        value: impl Into<String>,
    ) -> &RuntimeVariable {
        let variable = RuntimeVariable {
            name: self.next_name(),
            source_selector: source_selector.into(),
            attribute,
            value: value.into(),
        };
        self.variables.push(variable);
        &self.variables[self.variables.len() - 1]
    }

    pub fn substitute(&self, source: &str) -> String {
        template::substitute(&self.variables, source)
    }

    pub fn get(&self, name: &str) -> Option<&RuntimeVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn as_slice(&self) -> &[RuntimeVariable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn into_vec(self) -> Vec<RuntimeVariable> {
        self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_capture_order() {
        let mut store = VariableStore::new();
        assert_eq!(store.next_name(), "$0");

        store.capture("#a", None, "first");
        let second = store.capture("#b", Some("href".to_string()), "second");
        assert_eq!(second.name, "$1");
        assert_eq!(second.attribute.as_deref(), Some("href"));

        let names: Vec<&str> = store.as_slice().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["$0", "$1"]);
        assert_eq!(store.get("$0").map(|v| v.value.as_str()), Some("first"));
    }

    #[test]
    fn substitutes_with_captured_values() {
        let mut store = VariableStore::new();
        store.capture("#id", None, "1234");
        assert_eq!(store.substitute("/orders/$0"), "/orders/1234");
    }

    #[test]
    fn serializes_camel_case_without_missing_attribute() {
        let mut store = VariableStore::new();
        store.capture(".price", None, "9.99");
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "$0", "sourceSelector": ".price", "value": "9.99" }
            ])
        );
    }
}
