//! Selector tree to in-page script compilation.
//!
//! Every selector compiles to an expression over `scope`, the node its parent matched, or
//! over `document` for a root selector. Matches travel as `{ value, __node }` entries until
//! the selector's type reduces them to its result shape; object types attach one property
//! per child, each child expression evaluated with `scope` bound to the entry's node. CSS
//! selectors, attribute names and patterns are emitted as literals. The root script runs
//! the tree once and applies the cleanup pass to the result.

use crate::core::config::{ExtractionConfig, StringPropMode};
use crate::runtime::VariableStore;
use crate::selectors::cleanup::CLEANUP_JS;
use crate::selectors::model::{Selector, SelectorType};
use crate::utils::js_string;

const PRELUDE_JS: &str = r#"const __wrap = (nodes, read) =>
    nodes.map((node) => ({ value: read(node), __node: node }));
  const __joined = (nodes, read) =>
    nodes.length === 0
      ? []
      : [{ value: nodes.map((node) => read(node)).join(""), __node: nodes[0] }];
  const __refine = (entries, re) => {
    const out = [];
    for (const entry of entries) {
      const m = entry.value.match(re);
      if (m !== null) {
        const value = (m.length > 1 && m[1] !== undefined) ? m[1] : m[0];
        out.push({ value: value, __node: entry.__node });
      }
    }
    return out;
  };
  const __omitEmpty = (entries) => entries.filter((entry) => entry.value.trim() !== "");
  const __attach = (entries, build) =>
    entries.map((entry) => {
      const props = build(entry.__node);
      for (const key of Object.keys(props)) {
        entry[key] = props[key];
      }
      return entry;
    });
  const __first = (items) => (items.length > 0 ? items[0] : null);"#;

/// Code-generation mirror of a selector tree.
pub struct CompiledExtractor<'a> {
    selector: &'a Selector,
    children: Vec<CompiledExtractor<'a>>,
}

impl<'a> CompiledExtractor<'a> {
    pub fn new(selector: &'a Selector) -> Self {
        Self {
            selector,
            children: selector
                .sub_selectors
                .iter()
                .map(CompiledExtractor::new)
                .collect(),
        }
    }

    pub fn selector(&self) -> &'a Selector {
        self.selector
    }

    /// Expression for this subtree. `parent` is `None` for the root.
    fn emit(&self, parent: Option<SelectorType>, ctx: &EmitContext<'_>) -> String {
        let selector = self.selector;
        let selector_type = selector.selector_type;
        let join = selector_type == SelectorType::StringProp
            && ctx.options.string_prop_mode == StringPropMode::Join;
        let all = selector_type.is_array() || join;
        let target = if parent.is_some() { "scope" } else { "document" };

        let nodes = match selector.css_selector.as_deref() {
            Some(css) => format!(
                "Array.from({}.querySelectorAll({})){}",
                target,
                js_string(&ctx.store.substitute(css)),
                if all { "" } else { ".slice(0, 1)" }
            ),
            None if parent.is_some() => "[scope]".to_string(),
            // Rejected by validation; keep the script well-formed anyway.
            None => "[document.documentElement]".to_string(),
        };

        let read = match selector.html_attribute.as_deref() {
            Some(attr) => format!(
                "(node) => (node.getAttribute({}) || \"\")",
                js_string(&ctx.store.substitute(attr))
            ),
            None => "(node) => (node.textContent || \"\")".to_string(),
        };

        let mut entries = if join {
            format!("__joined({}, {})", nodes, read)
        } else {
            format!("__wrap({}, {})", nodes, read)
        };

        if let Some(pattern) = selector.regex.as_deref() {
            entries = format!(
                "__refine({}, new RegExp({}))",
                entries,
                js_string(&ctx.store.substitute(pattern))
            );
        }

        if ctx.options.omit_empty && selector_type == SelectorType::StringArray {
            entries = format!("__omitEmpty({})", entries);
        }

        if selector_type.is_object() && !self.children.is_empty() {
            let props = self
                .children
                .iter()
                .map(|child| {
                    format!(
                        "{}: {}",
                        js_string(&child.selector.key),
                        child.emit(Some(selector_type), ctx)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            entries = format!("__attach({}, (scope) => ({{ {} }}))", entries, props);
        }

        match selector_type {
            SelectorType::StringArray => format!("{}.map((entry) => entry.value)", entries),
            SelectorType::StringProp => {
                format!("__first({}.map((entry) => entry.value))", entries)
            }
            SelectorType::ObjectArray => entries,
            SelectorType::ObjectProp => format!("__first({})", entries),
        }
    }
}

struct EmitContext<'a> {
    options: &'a ExtractionConfig,
    store: &'a VariableStore,
}

/// Compiles selector trees into self-contained in-page scripts.
#[derive(Debug, Clone, Default)]
pub struct ExtractionCompiler {
    options: ExtractionConfig,
}

impl ExtractionCompiler {
    pub fn new(options: ExtractionConfig) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionConfig {
        &self.options
    }

    /// One expression evaluating to the cleaned result of `selector`.
    ///
    /// Output depends only on the selector tree, the options and the variable values, so
    /// equal inputs always produce identical text.
    pub fn compile(&self, selector: &Selector, store: &VariableStore) -> String {
        let extractor = CompiledExtractor::new(selector);
        let ctx = EmitContext {
            options: &self.options,
            store,
        };

        format!(
            "(() => {{\n  {}\n  {}\n  return __clean({}, {});\n}})()",
            PRELUDE_JS,
            CLEANUP_JS,
            extractor.emit(None, &ctx),
            self.options.drop_value_with_children
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_tester::Harness;

    fn compile(selector: &Selector) -> String {
        ExtractionCompiler::default().compile(selector, &VariableStore::new())
    }

    fn body(script: &str) -> &str {
        let start = script.find("return __clean(").unwrap();
        &script[start..]
    }

    fn items_selector() -> Selector {
        Selector::new("items", ".row", SelectorType::ObjectArray)
            .with_child(Selector::new("title", "h2", SelectorType::StringProp))
    }

    const PAGE: &str = r#"
        <div class="row" data-id="row-1"><h2> First </h2><a href="/one">more</a></div>
        <div class="row" data-id="row-2"><h2>Second</h2></div>
        <ul><li>a1</li><li>b2</li><li>c3</li><li>zz</li><li> </li></ul>
        <pre id="out"></pre>
    "#;

    const PUBLISH_RESULT: &str =
        r#"document.getElementById("out").textContent = JSON.stringify(__result);"#;

    /// Run a compiled script against `PAGE` and return the harness holding its JSON result.
    fn run_in_page(script: &str) -> Harness {
        let html = format!(
            "{}<script>\nconst __result = {};\n{}\n</script>",
            PAGE, script, PUBLISH_RESULT
        );
        Harness::from_html(&html).unwrap()
    }

    fn assert_page_result(options: ExtractionConfig, selector: &Selector, expected: &str) {
        let script = ExtractionCompiler::new(options).compile(selector, &VariableStore::new());
        run_in_page(&script).assert_text("#out", expected).unwrap();
    }

    #[test]
    fn compilation_is_deterministic() {
        let first = items_selector();
        let second = items_selector();
        assert_eq!(compile(&first), compile(&second));
        assert_eq!(compile(&first), compile(&first));
    }

    #[test]
    fn root_arrays_query_all_matches_in_document() {
        let script = compile(&Selector::new("names", "li.name", SelectorType::StringArray));
        assert_eq!(
            body(&script),
            "return __clean(__wrap(Array.from(document.querySelectorAll(\"li.name\")), \
             (node) => (node.textContent || \"\")).map((entry) => entry.value), true);\n})()"
        );
    }

    #[test]
    fn singular_types_take_first_match() {
        let script = compile(&Selector::new("title", "h1", SelectorType::StringProp));
        assert!(body(&script).contains(
            "__first(__wrap(Array.from(document.querySelectorAll(\"h1\")).slice(0, 1), "
        ));

        let script = compile(&Selector::new("hero", ".hero", SelectorType::ObjectProp));
        assert!(body(&script).starts_with(
            "return __clean(__first(__wrap(\
             Array.from(document.querySelectorAll(\".hero\")).slice(0, 1), "
        ));
    }

    #[test]
    fn children_are_scoped_to_the_parent_node() {
        let script = compile(&items_selector());
        assert!(body(&script).contains(
            "(scope) => ({ \"title\": __first(__wrap(\
             Array.from(scope.querySelectorAll(\"h2\")).slice(0, 1), "
        ));
    }

    #[test]
    fn pass_through_children_reuse_the_parent_node() {
        let selector = Selector::new("rows", "tr", SelectorType::ObjectArray).with_child(
            Selector::pass_through("id", SelectorType::StringProp)
                .with_attribute("data-id")
                .with_regex("(\\d+)"),
        );
        let script = compile(&selector);
        assert!(body(&script).contains(
            "__first(__refine(__wrap([scope], (node) => (node.getAttribute(\"data-id\") || \"\")), \
             new RegExp(\"(\\\\d+)\")).map((entry) => entry.value))"
        ));
    }

    #[test]
    fn omit_empty_only_filters_string_arrays() {
        let compiler = ExtractionCompiler::new(ExtractionConfig {
            omit_empty: true,
            ..Default::default()
        });
        let store = VariableStore::new();

        let strings =
            compiler.compile(&Selector::new("tags", ".tag", SelectorType::StringArray), &store);
        assert!(body(&strings).contains("__omitEmpty(__wrap("));

        let title =
            compiler.compile(&Selector::new("title", "h1", SelectorType::StringProp), &store);
        assert!(!body(&title).contains("__omitEmpty("));
    }

    #[test]
    fn join_mode_concatenates_all_matches() {
        let compiler = ExtractionCompiler::new(ExtractionConfig {
            string_prop_mode: StringPropMode::Join,
            ..Default::default()
        });
        let script = compiler.compile(
            &Selector::new("body", "p", SelectorType::StringProp).with_regex("total: (\\d+)"),
            &VariableStore::new(),
        );
        assert!(body(&script)
            .contains("__refine(__joined(Array.from(document.querySelectorAll(\"p\")), "));
    }

    #[test]
    fn cleanup_flag_is_passed_to_the_root() {
        let compiler = ExtractionCompiler::new(ExtractionConfig {
            drop_value_with_children: false,
            ..Default::default()
        });
        let script = compiler.compile(&items_selector(), &VariableStore::new());
        assert!(script.ends_with(", false);\n})()"));
    }

    #[test]
    fn templates_resolve_inside_selectors() {
        let mut store = VariableStore::new();
        store.capture("#category", None, "books");

        let selector = Selector::new("links", "a[data-cat=\"$0\"]", SelectorType::StringArray)
            .with_attribute("href");
        let script = ExtractionCompiler::default().compile(&selector, &store);
        assert!(script.contains("querySelectorAll(\"a[data-cat=\\\"books\\\"]\")"));
        assert!(script.contains("node.getAttribute(\"href\")"));
    }

    #[test]
    fn keys_are_emitted_as_string_literals() {
        let selector = Selector::new("rows", "tr", SelectorType::ObjectArray)
            .with_child(Selector::new("first name", "td", SelectorType::StringProp));
        assert!(compile(&selector).contains("({ \"first name\": __first("));
    }

    #[test]
    fn page_objects_keep_only_child_properties() {
        assert_page_result(
            ExtractionConfig::default(),
            &items_selector(),
            r#"[{"title":"First"},{"title":"Second"}]"#,
        );
    }

    #[test]
    fn page_keeps_value_beside_children_when_asked() {
        let options = ExtractionConfig {
            drop_value_with_children: false,
            ..Default::default()
        };
        let selector = Selector::new("rows", ".row", SelectorType::ObjectArray)
            .with_attribute("data-id")
            .with_child(
                Selector::new("link", "a", SelectorType::StringProp).with_attribute("href"),
            );
        assert_page_result(
            options,
            &selector,
            r#"[{"value":"row-1","link":"/one"},{"value":"row-2","link":null}]"#,
        );
    }

    #[test]
    fn page_regex_keeps_first_group_and_drops_misses() {
        let selector = Selector::new("digits", "li", SelectorType::StringArray).with_regex("(\\d)");
        assert_page_result(ExtractionConfig::default(), &selector, r#"["1","2","3"]"#);
    }

    #[test]
    fn page_empty_matches() {
        let missing_array = Selector::new("none", ".missing", SelectorType::StringArray);
        assert_page_result(ExtractionConfig::default(), &missing_array, "[]");

        let missing_text = Selector::new("none", ".missing", SelectorType::StringProp);
        assert_page_result(ExtractionConfig::default(), &missing_text, "null");

        let missing_object = Selector::new("none", ".missing", SelectorType::ObjectProp)
            .with_child(Selector::new("title", "h2", SelectorType::StringProp));
        assert_page_result(ExtractionConfig::default(), &missing_object, "null");
    }

    #[test]
    fn page_omit_empty_toggles_blank_entries() {
        let selector = Selector::new("items", "li", SelectorType::StringArray);

        let omit = ExtractionConfig {
            omit_empty: true,
            ..Default::default()
        };
        assert_page_result(omit, &selector, r#"["a1","b2","c3","zz"]"#);
        assert_page_result(
            ExtractionConfig::default(),
            &selector,
            r#"["a1","b2","c3","zz",""]"#,
        );
    }

    #[test]
    fn page_singular_takes_first_match() {
        let selector = Selector::new("title", "h2", SelectorType::StringProp);
        assert_page_result(ExtractionConfig::default(), &selector, r#""First""#);
    }
}
