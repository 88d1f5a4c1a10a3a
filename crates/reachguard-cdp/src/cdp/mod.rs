//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome/Chromium over WebSocket and speaks the CDP JSON-RPC
//! protocol. Only the domains the rendered-document adapter needs are
//! wrapped: Target, Page, Runtime and Emulation.
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let page = client.new_page().await?;
//! page.navigate("https://example.com", Duration::from_secs(30)).await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;
mod transport;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
