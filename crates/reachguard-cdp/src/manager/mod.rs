//! Browser instance manager.
//!
//! Connects to Chrome over CDP, launching a headless instance with its own
//! profile when nothing is listening on the debug port, and opens pages as
//! [`CdpDocument`](crate::CdpDocument)s.

mod manager_core;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::BrowserError;

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
