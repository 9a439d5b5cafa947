pub mod store;
pub mod template;

pub use store::{RuntimeVariable, VariableStore};
pub use template::substitute;
