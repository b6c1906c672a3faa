//! Configuration loading and parsing
//!
//! The display list comes from a TOML file, or from built-in defaults
//! when no file is given.

pub mod loader;
pub mod types;

pub use loader::load;
pub use types::{AppConfig, DisplayEntry, MuxEntry};
