//! # reachguard CDP
//!
//! Chrome DevTools Protocol adapter for reachguard: a [`CdpDocument`]
//! implements [`RenderedDocument`](reachguard_core::RenderedDocument) for a
//! live browser tab, and [`BrowserManager`] launches or connects to Chrome
//! and opens those tabs.

mod bridge_script;
pub mod cdp;
mod document;
pub mod manager;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use document::CdpDocument;
pub use manager::{BrowserError, BrowserManager};
