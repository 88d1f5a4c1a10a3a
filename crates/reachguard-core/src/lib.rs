//! # reachguard Core
//!
//! Stacking-order normalization and pointer reachability verification for
//! rendered documents.
//!
//! ## Components
//!
//! - [`LayeringPlan`] - Role rules mapped onto ordered stacking bands
//! - [`LayeringEngine`] - Deterministic z-index and pointer-policy assignment
//! - [`ReachabilityProbe`] - Center-point hit-testing of interactive controls
//! - [`RemediationPlanner`] - Reachable duplicates for blocked controls
//! - [`VerificationSession`] - The whole pipeline against one document
//!
//! The document itself is reached through the [`RenderedDocument`] trait;
//! [`MemoryDocument`] is a deterministic in-memory implementation.

pub mod document;
pub mod engine;
pub mod error;
pub mod plan;
pub mod probe;
pub mod remediation;
pub mod report;
pub mod session;

pub use document::{
    BoundingBox, Command, ElementRef, ElementSpec, MemoryDocument, NodeId, OverlaySpec,
    PointerEvents, Position, Presentation, RenderedDocument, ViewportInfo, ZIndex,
};
pub use engine::{LayeringEngine, StackingAssignment};
pub use error::{DocumentError, LayeringError};
pub use plan::{LayerBand, LayeringPlan, PointerPolicy, Selector, SelectorError};
pub use probe::{ExcludedElement, ExclusionReason, ProbePass, ReachabilityProbe, ReachabilityResult};
pub use remediation::{RemediationLayout, RemediationOutcome, RemediationPlanner, RemediationRecord};
pub use report::{ReportStatus, VerificationReport};
pub use session::{SessionOptions, VerificationSession};
