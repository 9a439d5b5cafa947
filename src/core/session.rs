use crate::actions::Operation;
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;

/// The two narrow interfaces the compilers consume: run commands against a live page and
/// evaluate a script in it.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Run one operation. Script-evaluating operations return the script's JSON result,
    /// every other operation returns `Value::Null`.
    async fn execute(&self, operation: &Operation) -> Result<Value>;

    /// Evaluate an expression in the page and return its JSON-serialized result.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    async fn close(&mut self) -> Result<()>;

    /// Run an ordered command list, stopping at the first failure.
    async fn execute_all(&self, operations: &[Operation]) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            results.push(self.execute(operation).await?);
        }
        Ok(results)
    }
}
