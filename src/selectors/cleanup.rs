use serde_json::{Map, Value};

/// Property holding the matched node on intermediate entries. Never part of a result.
pub const NODE_FIELD: &str = "__node";

/// Property holding an entry's own extracted text or attribute.
pub const VALUE_FIELD: &str = "value";

/// In-page cleanup pass, applied once to the root result of every extraction script.
pub(crate) const CLEANUP_JS: &str = r#"const __clean = (data, dropValue) => {
    if (Array.isArray(data)) {
      return data.map((item) => __clean(item, dropValue));
    }
    if (typeof data === "string") {
      return data.trim();
    }
    if (data === null || typeof data !== "object") {
      return data;
    }
    const keys = Object.keys(data).filter((key) => key !== "__node");
    const nested = keys.some((key) => key !== "value");
    const out = {};
    for (const key of keys) {
      if (!(dropValue && nested && key === "value")) {
        out[key] = __clean(data[key], dropValue);
      }
    }
    return out;
  };"#;

/// Same cleanup as the in-page pass, for results produced outside the browser.
///
/// Drops node references, trims strings and, when `drop_value_with_children` is set, removes
/// `value` from objects that carry other properties. Running it twice changes nothing.
pub fn clean(data: Value, drop_value_with_children: bool) -> Value {
    match data {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| clean(item, drop_value_with_children))
                .collect(),
        ),
        Value::String(text) => Value::String(text.trim().to_string()),
        Value::Object(object) => {
            let nested = object
                .keys()
                .any(|key| key != NODE_FIELD && key != VALUE_FIELD);

            let mut out = Map::with_capacity(object.len());
            for (key, value) in object {
                if key == NODE_FIELD || (drop_value_with_children && nested && key == VALUE_FIELD) {
                    continue;
                }
                out.insert(key, clean(value, drop_value_with_children));
            }
            Value::Object(out)
        }
        other => other,
    }
}
