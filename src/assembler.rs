use crate::core::config::ExtractionConfig;
use crate::core::PageSession;
use crate::errors::{ControlError, Result};
use crate::runtime::VariableStore;
use crate::selectors::{ensure_unique_keys, ExtractionCompiler, Selector};
use crate::types::Output;
use serde_json::Map;
use tracing::{debug, info};

/// Runs one extraction script per top-level selector and collects the results by key.
pub struct ResultAssembler {
    compiler: ExtractionCompiler,
}

impl ResultAssembler {
    pub fn new(options: ExtractionConfig) -> Self {
        Self {
            compiler: ExtractionCompiler::new(options),
        }
    }

    /// Compiled script for every selector, in request order.
    pub fn scripts(&self, selectors: &[Selector], store: &VariableStore) -> Vec<(String, String)> {
        selectors
            .iter()
            .map(|selector| (selector.key.clone(), self.compiler.compile(selector, store)))
            .collect()
    }

    /// Evaluate each selector's script in order and store its result verbatim.
    ///
    /// Keys must be unique; the first failing evaluation aborts with no partial output.
    pub async fn assemble<S: PageSession + ?Sized>(
        &self,
        session: &S,
        selectors: &[Selector],
        store: VariableStore,
    ) -> Result<Output> {
        ensure_unique_keys(selectors)?;

        let mut data = Map::new();
        for (key, script) in self.scripts(selectors, &store) {
            debug!(key = key.as_str(), script = script.as_str(), "evaluating extraction script");

            let value = session
                .evaluate(&script)
                .await
                .map_err(|e| ControlError::ExtractionFailed {
                    key: key.clone(),
                    detail: e.to_string(),
                })?;

            data.insert(key, value);
        }

        info!(
            selectors = data.len(),
            variables = store.len(),
            "extraction complete"
        );

        Ok(Output {
            runtime_variables: store.into_vec(),
            data,
        })
    }
}
