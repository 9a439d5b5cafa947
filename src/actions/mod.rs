pub mod compiler;
pub mod model;
pub mod runner;

pub use compiler::{compile, Operation};
pub use model::{Action, CaptureVariable, SendKeys};
pub use runner::ActionRunner;
