//! Browser manager errors.

use thiserror::Error;

use reachguard_core::DocumentError;

use crate::cdp::CdpError;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome or set browser.chrome_path.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Page error: {0}")]
    Page(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::ChromeNotAvailable(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::NavigationFailed(msg) => BrowserError::NavigationFailed(msg),
            CdpError::Timeout(msg) => BrowserError::NavigationFailed(format!("Timeout: {}", msg)),
            CdpError::SessionClosed => BrowserError::NotConnected,
            other => BrowserError::Page(other.to_string()),
        }
    }
}
