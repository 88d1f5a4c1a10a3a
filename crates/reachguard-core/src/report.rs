//! Verification report.

use serde::Serialize;

use crate::probe::{ExcludedElement, ReachabilityResult};
use crate::remediation::RemediationRecord;

/// Overall verdict of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every probed control was reachable after layering.
    Clean,
    /// Some controls were unreachable; every duplicate is reachable.
    Remediated,
    /// Some controls were unreachable and are still unreachable.
    RemediationFailed,
    /// Some controls were unreachable and remediation was disabled.
    Unremediated,
}

impl ReportStatus {
    /// Whether every control ended up reachable.
    pub fn is_success(&self) -> bool {
        matches!(self, ReportStatus::Clean | ReportStatus::Remediated)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportStatus::Clean => "clean",
            ReportStatus::Remediated => "remediated",
            ReportStatus::RemediationFailed => "remediation failed",
            ReportStatus::Unremediated => "unremediated",
        };
        f.write_str(s)
    }
}

/// Pre-remediation results, remediation records and post-remediation results.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub pre: Vec<ReachabilityResult>,
    /// Interactive elements the pre pass skipped. They do not affect the status.
    pub excluded: Vec<ExcludedElement>,
    pub remediations: Vec<RemediationRecord>,
    pub post: Vec<ReachabilityResult>,
    pub status: ReportStatus,
}

impl VerificationReport {
    /// Build a report and derive its status.
    ///
    /// `remediation_enabled` only matters when the pre pass found negatives
    /// and no record was produced.
    pub fn new(
        pre: Vec<ReachabilityResult>,
        remediations: Vec<RemediationRecord>,
        post: Vec<ReachabilityResult>,
        remediation_enabled: bool,
    ) -> Self {
        let status = if pre.iter().all(|r| r.clickable) {
            ReportStatus::Clean
        } else if !remediation_enabled && remediations.is_empty() {
            ReportStatus::Unremediated
        } else if remediations.iter().all(|r| r.is_resolved()) && post.iter().all(|r| r.clickable) {
            ReportStatus::Remediated
        } else {
            ReportStatus::RemediationFailed
        };

        Self {
            pre,
            excluded: Vec::new(),
            remediations,
            post,
            status,
        }
    }

    /// Attach the elements the pre pass excluded.
    pub fn with_excluded(mut self, excluded: Vec<ExcludedElement>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Negative results of the pre-remediation pass.
    pub fn unreachable(&self) -> impl Iterator<Item = &ReachabilityResult> {
        self.pre.iter().filter(|r| r.is_negative())
    }

    /// Remediations whose duplicate is still unreachable.
    pub fn unresolved(&self) -> impl Iterator<Item = &RemediationRecord> {
        self.remediations.iter().filter(|r| !r.is_resolved())
    }
}
