//! Remediation of unreachable controls.
//!
//! Every unreachable control gets a behavioral duplicate inside one
//! screen-anchored container stacked at the very top of the Tooltip band.
//! The duplicates are probed again once; whatever is still unreachable is
//! recorded as unresolved and never retried.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use reachguard_config::RemediationConfig;

use crate::document::{
    ElementRef, NodeId, OverlaySpec, PointerEvents, Presentation, RenderedDocument,
};
use crate::error::LayeringError;
use crate::plan::LayeringPlan;
use crate::probe::{ReachabilityProbe, ReachabilityResult};

/// Placement of the remediation container.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationLayout {
    pub panel_id: String,
    pub top: f64,
    pub right: f64,
    pub gap: f64,
}

impl Default for RemediationLayout {
    fn default() -> Self {
        Self::from(&RemediationConfig::default())
    }
}

impl From<&RemediationConfig> for RemediationLayout {
    fn from(config: &RemediationConfig) -> Self {
        Self {
            panel_id: config.panel_id.clone(),
            top: config.anchor_top,
            right: config.anchor_right,
            gap: config.gap,
        }
    }
}

/// Verification outcome of a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationOutcome {
    Resolved,
    /// Still unreachable. `blocking_element` is `None` when nothing was hit
    /// or the duplicate did not render with a visible area.
    Unresolved { blocking_element: Option<ElementRef> },
}

/// One remediated control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationRecord {
    pub original_element: ElementRef,
    pub clone_element: ElementRef,
    pub panel_id: String,
    pub outcome: RemediationOutcome,
}

impl RemediationRecord {
    pub fn is_resolved(&self) -> bool {
        self.outcome == RemediationOutcome::Resolved
    }
}

/// Builds the remediation container and verifies its duplicates.
pub struct RemediationPlanner<'p> {
    plan: &'p LayeringPlan,
    layout: RemediationLayout,
    settle_timeout: Duration,
}

impl<'p> RemediationPlanner<'p> {
    pub fn new(plan: &'p LayeringPlan, layout: RemediationLayout, settle_timeout: Duration) -> Self {
        Self {
            plan,
            layout,
            settle_timeout,
        }
    }

    /// Container placement: top of the Tooltip band. The container itself
    /// never intercepts pointers; only the duplicates inside it do.
    fn overlay_spec(&self) -> OverlaySpec {
        OverlaySpec {
            panel_id: self.layout.panel_id.clone(),
            z_index: self.plan.ceiling_z(self.plan.tooltip()),
            top: self.layout.top,
            right: self.layout.right,
            gap: self.layout.gap,
            pointer_events: PointerEvents::None,
        }
    }

    /// Duplicate every negative result into the remediation container.
    ///
    /// Positive results are ignored. Without negatives the document is not
    /// touched. On a document error the container is removed again.
    pub async fn remediate<D>(
        &self,
        document: &D,
        results: &[ReachabilityResult],
    ) -> Result<Vec<RemediationRecord>, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        let negatives: Vec<&ReachabilityResult> = results.iter().filter(|r| r.is_negative()).collect();
        if negatives.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Remediating {} unreachable controls into #{}",
            negatives.len(),
            self.layout.panel_id
        );
        let container = document.create_overlay(&self.overlay_spec()).await?;

        match self.populate(document, container.node, &negatives).await {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!("Remediation failed, removing #{}: {}", self.layout.panel_id, e);
                if let Err(remove_err) = document.remove(container.node).await {
                    warn!("Failed to remove remediation container: {}", remove_err);
                }
                Err(e)
            }
        }
    }

    async fn populate<D>(
        &self,
        document: &D,
        container: NodeId,
        negatives: &[&ReachabilityResult],
    ) -> Result<Vec<RemediationRecord>, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        let presentation = Presentation {
            pointer_events: Some(PointerEvents::Auto),
            ..Default::default()
        };

        let mut pairs = Vec::with_capacity(negatives.len());
        for result in negatives {
            let clone = document
                .duplicate_into(result.element.node, container, &presentation)
                .await?;
            pairs.push((result.element.clone(), clone));
        }

        document.wait_for_render(self.settle_timeout).await?;

        let clones: Vec<ElementRef> = pairs.iter().map(|(_, clone)| clone.clone()).collect();
        let mut verified: HashMap<NodeId, ReachabilityResult> = ReachabilityProbe::verify(document, &clones)
            .await?
            .into_iter()
            .map(|r| (r.element.node, r))
            .collect();

        let records = pairs
            .into_iter()
            .map(|(original, clone)| {
                let outcome = match verified.remove(&clone.node) {
                    Some(r) if r.clickable => RemediationOutcome::Resolved,
                    Some(r) => {
                        warn!(
                            "Duplicate of {} still unreachable, blocked by {}",
                            original,
                            r.blocking_element
                                .as_ref()
                                .map(ToString::to_string)
                                .unwrap_or_else(|| "nothing".to_string())
                        );
                        RemediationOutcome::Unresolved {
                            blocking_element: r.blocking_element,
                        }
                    }
                    None => {
                        warn!("Duplicate of {} is not visible", original);
                        RemediationOutcome::Unresolved {
                            blocking_element: None,
                        }
                    }
                };
                RemediationRecord {
                    original_element: original,
                    clone_element: clone,
                    panel_id: self.layout.panel_id.clone(),
                    outcome,
                }
            })
            .collect::<Vec<_>>();

        let resolved = records.iter().filter(|r| r.is_resolved()).count();
        info!("Remediation: {}/{} duplicates reachable", resolved, records.len());
        Ok(records)
    }
}

#[cfg(test)]
#[path = "remediation_tests.rs"]
mod tests;
