//! Verification session: layering, probing and remediation of one document.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, Instrument};

use reachguard_config::Config;

use crate::document::{ElementRef, NodeId, RenderedDocument};
use crate::engine::LayeringEngine;
use crate::error::LayeringError;
use crate::plan::LayeringPlan;
use crate::probe::{ProbePass, ReachabilityProbe, ReachabilityResult};
use crate::remediation::{RemediationLayout, RemediationPlanner, RemediationRecord};
use crate::report::VerificationReport;

/// Session options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on every render wait.
    pub settle_timeout: Duration,
    pub layout: RemediationLayout,
    /// Duplicate unreachable controls into the remediation container.
    pub remediate: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle_timeout: Duration::from_millis(config.probe.settle_timeout_ms),
            layout: RemediationLayout::from(&config.remediation),
            remediate: config.remediation.enabled,
        }
    }
}

/// Runs the full pipeline against one document.
///
/// The session owns its document and `run` takes `&mut self`, so at most one
/// pipeline is active against a document at a time.
pub struct VerificationSession<D: RenderedDocument> {
    document: D,
    plan: LayeringPlan,
    options: SessionOptions,
}

impl<D: RenderedDocument> VerificationSession<D> {
    pub fn new(document: D, plan: LayeringPlan, options: SessionOptions) -> Self {
        Self {
            document,
            plan,
            options,
        }
    }

    /// Build the plan and options from a loaded configuration.
    pub fn from_config(document: D, config: &Config) -> Result<Self, LayeringError> {
        let plan = LayeringPlan::from_config(&config.layering)?;
        Ok(Self::new(document, plan, SessionOptions::from_config(config)))
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn plan(&self) -> &LayeringPlan {
        &self.plan
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Wait for render, apply the plan, verify, remediate and verify again.
    pub async fn run(&mut self) -> Result<VerificationReport, LayeringError> {
        let settle = self.options.settle_timeout;

        self.document.wait_for_render(settle).await?;

        let assignments = LayeringEngine::apply(&self.document, &self.plan)
            .instrument(tracing::info_span!("apply"))
            .await?;

        self.document.wait_for_render(settle).await?;

        let ProbePass { results: pre, excluded } = async {
            let interactive = ReachabilityProbe::interactive_elements(&self.document).await?;
            ReachabilityProbe::measure(&self.document, &interactive).await
        }
        .instrument(tracing::info_span!("verify", pass = "pre"))
        .await?;

        let negatives = pre.iter().filter(|r| r.is_negative()).count();
        let records = if negatives > 0 && self.options.remediate {
            RemediationPlanner::new(&self.plan, self.options.layout.clone(), settle)
                .remediate(&self.document, &pre)
                .instrument(tracing::info_span!("remediate", negatives))
                .await?
        } else {
            Vec::new()
        };

        let post = if records.is_empty() {
            pre.clone()
        } else {
            self.verify_after_remediation(&records)
                .instrument(tracing::info_span!("verify", pass = "post"))
                .await?
        };

        let report =
            VerificationReport::new(pre, records, post, self.options.remediate).with_excluded(excluded);
        info!(
            assignments = assignments.len(),
            unreachable = negatives,
            excluded = report.excluded.len(),
            status = %report.status,
            "Verification finished"
        );
        Ok(report)
    }

    /// Probe the interactive elements again, measuring remediated controls on
    /// their duplicates and skipping the container's contents.
    async fn verify_after_remediation(
        &self,
        records: &[RemediationRecord],
    ) -> Result<Vec<ReachabilityResult>, LayeringError> {
        let container = records.first().and_then(|r| r.clone_element.parent);
        let replacements: HashMap<NodeId, &ElementRef> = records
            .iter()
            .map(|r| (r.original_element.node, &r.clone_element))
            .collect();

        let mut targets = Vec::new();
        for element in ReachabilityProbe::interactive_elements(&self.document).await? {
            if let Some(container) = container {
                if self.document.contains(container, element.node).await? {
                    continue;
                }
            }
            match replacements.get(&element.node) {
                Some(clone) => targets.push((*clone).clone()),
                None => targets.push(element),
            }
        }

        ReachabilityProbe::verify(&self.document, &targets).await
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
