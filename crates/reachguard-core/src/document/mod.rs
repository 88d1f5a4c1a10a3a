//! Rendered document capability consumed by the layering pipeline.
//!
//! The pipeline never owns nodes. It talks to a live, rendered document
//! through [`RenderedDocument`], which offers four things:
//!
//! - computed presentation reads (bounding boxes, computed styles)
//! - presentation writes (the z-index / position / pointer-events override layer)
//! - point-based hit-testing, topmost first
//! - node cloning and insertion for remediation
//!
//! Every call is `async`: adapters backed by a browser suspend on the wire.

mod memory;
mod types;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DocumentError;

pub use memory::{Command, ElementSpec, MemoryDocument};
pub use types::{
    BoundingBox, ElementRef, NodeId, OverlaySpec, PointerEvents, Position, Presentation,
    ViewportInfo, ZIndex,
};

/// A live rendered document.
///
/// Implementations must return [`DocumentError::Detached`] from every method
/// once the handle no longer points at a live document.
#[async_trait]
pub trait RenderedDocument: Send + Sync {
    /// All elements in document order.
    async fn elements(&self) -> Result<Vec<ElementRef>, DocumentError>;

    /// Current viewport size and scroll position.
    async fn viewport(&self) -> Result<ViewportInfo, DocumentError>;

    /// Bounding box of a node in viewport coordinates.
    async fn bounding_box(&self, node: NodeId) -> Result<BoundingBox, DocumentError>;

    /// Computed value of a CSS property, override layer included.
    async fn computed_style(&self, node: NodeId, property: &str) -> Result<String, DocumentError>;

    /// The override currently installed on a node, if any.
    async fn presentation_override(&self, node: NodeId)
        -> Result<Option<Presentation>, DocumentError>;

    /// Replace the override on a node. `None` clears it and restores the
    /// node's own presentation.
    async fn set_presentation_override(
        &self,
        node: NodeId,
        presentation: Option<&Presentation>,
    ) -> Result<(), DocumentError>;

    /// Every element stacked at a viewport point, topmost first.
    async fn hit_test(&self, x: f64, y: f64) -> Result<Vec<ElementRef>, DocumentError>;

    /// Whether `node` is `ancestor` or one of its descendants.
    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DocumentError>;

    /// Insert a screen-anchored container at the top level of the document.
    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<ElementRef, DocumentError>;

    /// Append a behavioral duplicate of `original` to `container`.
    ///
    /// The duplicate shows the same content and activating it has the same
    /// outcome as activating the original.
    async fn duplicate_into(
        &self,
        original: NodeId,
        container: NodeId,
        presentation: &Presentation,
    ) -> Result<ElementRef, DocumentError>;

    /// Remove a node (and its subtree) from the document.
    async fn remove(&self, node: NodeId) -> Result<(), DocumentError>;

    /// Wait until layout and network are idle, bounded by `timeout`.
    async fn wait_for_render(&self, timeout: Duration) -> Result<(), DocumentError>;
}
