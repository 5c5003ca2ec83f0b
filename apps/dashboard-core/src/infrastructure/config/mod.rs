//! Configuration
//!
//! Typed settings loaded from environment variables.

mod settings;

pub use settings::{ConfigError, Credentials, Settings};
