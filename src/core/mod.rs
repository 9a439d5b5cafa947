pub mod browser;
pub mod config;
pub mod session;

pub use browser::BrowserTrait;
pub use config::{BrowserConfig, Config, ExtractionConfig, SessionConfig, StringPropMode};
pub use session::PageSession;
