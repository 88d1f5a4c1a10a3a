//! # reachguard Config
//!
//! Configuration management for reachguard: layering bands and rules, probe
//! timing, remediation panel layout and the browser connection.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
