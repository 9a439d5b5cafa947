use crate::core::config::{ExtractionConfig, StringPropMode};
use crate::errors::{ControlError, Result};
use crate::runtime::VariableStore;
use crate::selectors::cleanup::{self, VALUE_FIELD};
use crate::selectors::model::{ensure_unique_keys, Selector, SelectorType};
use regex::Regex;
use scraper::{ElementRef, Html, Selector as CssSelector};
use serde_json::{Map, Value};

/// Applies selector trees to a static HTML document with the same shaping rules as the
/// compiled in-page scripts. Patterns use Rust `regex` syntax rather than JavaScript's.
pub struct SnapshotExtractor {
    options: ExtractionConfig,
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

struct Entry<'a> {
    value: String,
    node: ElementRef<'a>,
}

impl SnapshotExtractor {
    pub fn new(options: ExtractionConfig) -> Self {
        Self { options }
    }

    pub fn extract(&self, html: &str, selector: &Selector, store: &VariableStore) -> Result<Value> {
        selector.validate()?;
        let document = Html::parse_document(html);
        self.extract_from(&document, selector, store)
    }

    /// Extract every top-level selector into a key-ordered map.
    pub fn extract_all(
        &self,
        html: &str,
        selectors: &[Selector],
        store: &VariableStore,
    ) -> Result<Map<String, Value>> {
        ensure_unique_keys(selectors)?;
        for selector in selectors {
            selector.validate()?;
        }

        let document = Html::parse_document(html);
        let mut data = Map::new();
        for selector in selectors {
            let value = self.extract_from(&document, selector, store)?;
            data.insert(selector.key.clone(), value);
        }
        Ok(data)
    }

    fn extract_from(
        &self,
        document: &Html,
        selector: &Selector,
        store: &VariableStore,
    ) -> Result<Value> {
        let raw = self.evaluate(selector, Scope::Document(document), store)?;
        Ok(cleanup::clean(raw, self.options.drop_value_with_children))
    }

    fn evaluate<'a>(
        &self,
        selector: &Selector,
        scope: Scope<'a>,
        store: &VariableStore,
    ) -> Result<Value> {
        let selector_type = selector.selector_type;
        let join = selector_type == SelectorType::StringProp
            && self.options.string_prop_mode == StringPropMode::Join;
        let all = selector_type.is_array() || join;

        let nodes = match (selector.css_selector.as_deref(), scope) {
            (Some(css), scope) => select(scope, &parse_css(selector, &store.substitute(css))?, all),
            (None, Scope::Element(element)) => vec![element],
            (None, Scope::Document(document)) => vec![document.root_element()],
        };

        let attribute = selector.html_attribute.as_deref().map(|a| store.substitute(a));
        let read = |node: &ElementRef<'a>| -> String {
            match attribute.as_deref() {
                Some(name) => node.value().attr(name).unwrap_or("").to_string(),
                None => node.text().collect(),
            }
        };

        let mut entries: Vec<Entry<'a>> = if join {
            match nodes.first() {
                Some(first) => vec![Entry {
                    value: nodes.iter().map(&read).collect::<String>(),
                    node: *first,
                }],
                None => Vec::new(),
            }
        } else {
            nodes
                .into_iter()
                .map(|node| Entry {
                    value: read(&node),
                    node,
                })
                .collect()
        };

        if let Some(pattern) = selector.regex.as_deref() {
            let re = Regex::new(&store.substitute(pattern))
                .map_err(|e| ControlError::invalid_selector(&selector.key, e.to_string()))?;
            entries = entries
                .into_iter()
                .filter_map(|entry| {
                    let caps = re.captures(&entry.value)?;
                    let refined = caps.get(1).or_else(|| caps.get(0))?.as_str().to_string();
                    Some(Entry {
                        value: refined,
                        node: entry.node,
                    })
                })
                .collect();
        }

        if self.options.omit_empty && selector_type == SelectorType::StringArray {
            entries.retain(|entry| !entry.value.trim().is_empty());
        }

        let mut shaped = Vec::with_capacity(entries.len());
        for entry in entries {
            if selector_type.is_object() {
                let mut object = Map::new();
                object.insert(VALUE_FIELD.to_string(), Value::String(entry.value));
                for child in &selector.sub_selectors {
                    let value = self.evaluate(child, Scope::Element(entry.node), store)?;
                    object.insert(child.key.clone(), value);
                }
                shaped.push(Value::Object(object));
            } else {
                shaped.push(Value::String(entry.value));
            }
        }

        Ok(if selector_type.is_array() {
            Value::Array(shaped)
        } else {
            shaped.into_iter().next().unwrap_or(Value::Null)
        })
    }
}

fn parse_css(selector: &Selector, css: &str) -> Result<CssSelector> {
    CssSelector::parse(css)
        .map_err(|e| ControlError::invalid_selector(&selector.key, format!("{}: {:?}", css, e)))
}

fn select<'a>(scope: Scope<'a>, css: &CssSelector, all: bool) -> Vec<ElementRef<'a>> {
    let limit = if all { usize::MAX } else { 1 };
    match scope {
        Scope::Document(document) => document.select(css).take(limit).collect(),
        Scope::Element(element) => element.select(css).take(limit).collect(),
    }
}
