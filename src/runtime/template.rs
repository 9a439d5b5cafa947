use crate::runtime::RuntimeVariable;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::{trace, warn};

/// Replaces every runtime variable token in `source` with the variable's value.
///
/// The source is scanned once from left to right. Text produced by a replacement is never
/// scanned again, so a captured value that happens to contain a token is emitted verbatim.
/// Where two tokens overlap (`$1` and `$10`) the longer one wins. Tokens without a matching
/// variable are left untouched.
pub fn substitute(variables: &[RuntimeVariable], source: &str) -> String {
    if variables.is_empty() || !source.contains('$') {
        return source.to_string();
    }

    // First capture of a name wins; names are unique in a well-formed store anyway.
    let mut values: HashMap<&str, &str> = HashMap::with_capacity(variables.len());
    for variable in variables {
        values
            .entry(variable.name.as_str())
            .or_insert(variable.value.as_str());
    }

    let mut tokens: Vec<&str> = values.keys().copied().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let pattern = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");

    let matcher = match Regex::new(&pattern) {
        Ok(matcher) => matcher,
        Err(e) => {
            warn!(error = %e, tokens = tokens.len(), "variable pattern rejected, text left as-is");
            return source.to_string();
        }
    };

    let output = matcher
        .replace_all(source, |caps: &Captures| {
            let token = &caps[0];
            values.get(token).copied().unwrap_or(token).to_string()
        })
        .into_owned();

    if output != source {
        trace!(source, output = output.as_str(), "substituted runtime variables");
    }

    output
}
