//! Stacking normalization.
//!
//! Assigns every element a z-index derived only from its band and its
//! position among the band's elements in document order, plus the band's
//! pointer policy. Prior overrides are cleared first, so running the engine
//! twice on the same document yields the same assignments.
//!
//! Only rule-matched elements have the z-index written (plus `position:
//! relative` when static). Unmatched wrappers such as `body` or `main` must
//! not open a stacking context around the controls they hold, so they get at
//! most a pointer policy.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::{ElementRef, NodeId, PointerEvents, Position, Presentation, RenderedDocument};
use crate::error::{DocumentError, LayeringError};
use crate::plan::{LayeringPlan, PointerPolicy};

/// The z-index (and pointer policy) given to one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingAssignment {
    pub element: ElementRef,
    pub band: String,
    pub z_index: i64,
    /// Whether a rule matched. Only matched elements have `z_index` written.
    pub matched: bool,
    /// `None` leaves the element's pointer policy as the document has it.
    pub pointer_events: Option<PointerEvents>,
}

/// How an element relates to its rule-matched ancestors.
#[derive(Debug, Clone, Copy, Default)]
struct Lineage {
    /// Inside a rule-matched interactive element of a Blocking band.
    inside_control: bool,
    /// Inside a rule-matched element of a Transparent band.
    inside_transparent: bool,
}

/// Applies a [`LayeringPlan`] to a rendered document.
pub struct LayeringEngine;

impl LayeringEngine {
    /// Normalize the stacking order of every element in `document`.
    ///
    /// Band resolution and z-index allocation finish before the first write,
    /// so configuration and ambiguity errors leave the document untouched. A
    /// document error during the write phase restores every override written
    /// in this pass before the error is returned.
    pub async fn apply<D>(
        document: &D,
        plan: &LayeringPlan,
    ) -> Result<Vec<StackingAssignment>, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        let elements = document.elements().await?;
        info!("Applying layering plan to {} elements", elements.len());

        let assignments = Self::assign(plan, elements)?;

        let mut journal = Vec::with_capacity(assignments.len());
        if let Err(e) = Self::write_all(document, &assignments, &mut journal).await {
            warn!("Layering failed after {} writes, rolling back: {}", journal.len(), e);
            Self::rollback(document, journal).await;
            return Err(e.into());
        }

        info!("Layering applied: {} assignments", assignments.len());
        Ok(assignments)
    }

    /// Compute assignments without touching the document.
    fn assign(
        plan: &LayeringPlan,
        elements: Vec<ElementRef>,
    ) -> Result<Vec<StackingAssignment>, LayeringError> {
        let mut lineage: HashMap<NodeId, Lineage> = HashMap::with_capacity(elements.len());
        let mut counters: HashMap<&str, i64> = HashMap::new();
        let mut assignments = Vec::with_capacity(elements.len());

        for element in elements {
            let resolved = plan.resolve(&element)?;
            let band = resolved.band;
            let matched = resolved.is_rule_match();
            let interactive = element.is_interactive();

            // Parents precede children in document order.
            let inherited = element
                .parent
                .and_then(|p| lineage.get(&p).copied())
                .unwrap_or_default();

            let pointer_events = match band.pointer_policy {
                PointerPolicy::Transparent => Some(PointerEvents::None),
                PointerPolicy::Blocking if matched => Some(PointerEvents::Auto),
                PointerPolicy::Blocking if !interactive && inherited.inside_control => {
                    Some(PointerEvents::None)
                }
                PointerPolicy::Blocking if interactive && inherited.inside_transparent => {
                    Some(PointerEvents::Auto)
                }
                PointerPolicy::Blocking => None,
            };

            lineage.insert(
                element.node,
                Lineage {
                    inside_control: inherited.inside_control
                        || (matched && interactive && band.pointer_policy == PointerPolicy::Blocking),
                    inside_transparent: inherited.inside_transparent
                        || (matched && band.pointer_policy == PointerPolicy::Transparent),
                },
            );

            let counter = counters.entry(band.name.as_str()).or_insert(0);
            if *counter >= plan.stride() {
                return Err(LayeringError::configuration(format!(
                    "band '{}' holds more than {} elements; raise the stride",
                    band.name,
                    plan.stride()
                )));
            }
            let z_index = plan.base_z(band) + *counter;
            *counter += 1;

            debug!(
                "{} -> {} z={} pointer={:?} rule={:?}",
                element, band.name, z_index, pointer_events, resolved.rule
            );

            assignments.push(StackingAssignment {
                element,
                band: band.name.clone(),
                z_index,
                matched,
                pointer_events,
            });
        }

        Ok(assignments)
    }

    async fn write_all<D>(
        document: &D,
        assignments: &[StackingAssignment],
        journal: &mut Vec<(NodeId, Option<Presentation>)>,
    ) -> Result<(), DocumentError>
    where
        D: RenderedDocument + ?Sized,
    {
        for assignment in assignments {
            let node = assignment.element.node;

            let prior = document.presentation_override(node).await?;
            journal.push((node, prior));

            document.set_presentation_override(node, None).await?;
            let presentation = if assignment.matched {
                // Read without our own override.
                let position = Position::parse(&document.computed_style(node, "position").await?);
                Presentation {
                    z_index: Some(assignment.z_index),
                    position: (position == Position::Static).then_some(Position::Relative),
                    pointer_events: assignment.pointer_events,
                }
            } else {
                Presentation {
                    pointer_events: assignment.pointer_events,
                    ..Default::default()
                }
            };
            document
                .set_presentation_override(node, Some(&presentation).filter(|p| !p.is_empty()))
                .await?;
        }
        Ok(())
    }

    /// Best-effort restoration of snapshotted overrides, newest first.
    async fn rollback<D>(document: &D, journal: Vec<(NodeId, Option<Presentation>)>)
    where
        D: RenderedDocument + ?Sized,
    {
        for (node, prior) in journal.into_iter().rev() {
            if let Err(e) = document.set_presentation_override(node, prior.as_ref()).await {
                warn!("Failed to restore override on {}: {}", node, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
