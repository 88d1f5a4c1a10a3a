//! Error types for layering, probing and remediation.

use thiserror::Error;

use crate::document::NodeId;

/// Errors reported by a [`RenderedDocument`](crate::document::RenderedDocument) adapter.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The handle no longer points at a live document (navigated away, closed).
    #[error("Document detached")]
    Detached,

    /// The node is gone from the document.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Render or navigation wait exceeded its bound.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transport or backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors produced by the layering pipeline.
#[derive(Debug, Error)]
pub enum LayeringError {
    /// Invalid layering plan. Always reported before any mutation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document handle detached or render wait timed out.
    #[error("Document unavailable: {0}")]
    DocumentUnavailable(#[from] DocumentError),

    /// Two rules claim the same element for different bands.
    #[error(
        "Ambiguous band for {element}: rule '{first_rule}' assigns {first_band}, \
         rule '{second_rule}' assigns {second_band}"
    )]
    AmbiguousBand {
        element: String,
        first_rule: String,
        first_band: String,
        second_rule: String,
        second_band: String,
    },
}

impl LayeringError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        LayeringError::Configuration(message.into())
    }
}

impl From<reachguard_config::ConfigError> for LayeringError {
    fn from(e: reachguard_config::ConfigError) -> Self {
        LayeringError::Configuration(e.to_string())
    }
}
