pub mod actions;
pub mod assembler;
pub mod browser;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod runtime;
pub mod selectors;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod utils;

pub use crate::actions::{Action, ActionRunner, Operation};
pub use crate::assembler::ResultAssembler;
pub use crate::browser::BrowserSession;
#[cfg(feature = "chrome")]
pub use crate::browser::ChromeBrowser;
pub use crate::core::{BrowserTrait, Config, PageSession};
pub use crate::errors::{ControlError, Result};
pub use crate::pipeline::Pipeline;
pub use crate::runtime::{RuntimeVariable, VariableStore};
pub use crate::selectors::{ExtractionCompiler, Selector, SelectorType, SnapshotExtractor};
pub use crate::types::{ControlRequest, Output};
