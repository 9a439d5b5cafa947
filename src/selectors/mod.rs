pub mod cleanup;
pub mod compiler;
pub mod model;
pub mod snapshot;

pub use cleanup::clean;
pub use compiler::{CompiledExtractor, ExtractionCompiler};
pub use model::{ensure_unique_keys, Selector, SelectorType};
pub use snapshot::SnapshotExtractor;
