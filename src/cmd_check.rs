//! `check` subcommand: run a verification session against a live page.

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;

use tracing::{info, warn};

use reachguard_cdp::BrowserManager;
use reachguard_config::{Config, ConfigLoader, ConfigValidator};
use reachguard_core::{RemediationOutcome, VerificationReport, VerificationSession};

/// Flags of the `check` subcommand.
pub(crate) struct CheckOptions {
    pub json: bool,
    pub remediate: bool,
    pub keep_open: bool,
}

/// Load and validate the configuration at `path`, falling back to defaults
/// when the file does not exist.
pub(crate) fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(path)?;
    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("{}: {}", warning.path, warning.message);
    }
    Ok(config)
}

pub(crate) async fn run_check(
    config_path: &Path,
    url: &str,
    options: CheckOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if !options.remediate {
        config.remediation.enabled = false;
    }

    let manager = BrowserManager::new(config.browser.clone());
    let result = check_page(&manager, &config, url, options.keep_open).await;

    if !options.keep_open {
        if let Err(e) = manager.shutdown().await {
            warn!("Browser shutdown failed: {}", e);
        }
    }

    let report = result?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(url, &report));
    }

    info!("Check of {} finished: {}", url, report.status);
    Ok(if report.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn check_page(
    manager: &BrowserManager,
    config: &Config,
    url: &str,
    keep_open: bool,
) -> Result<VerificationReport, Box<dyn std::error::Error>> {
    let document = manager.open_document(url).await?;
    let mut session = VerificationSession::from_config(document, config)?;
    let report = session.run().await?;

    if !keep_open {
        manager.close_document(session.into_document()).await?;
    }
    Ok(report)
}

/// Human-readable report.
pub(crate) fn render_report(url: &str, report: &VerificationReport) -> String {
    let mut out = String::new();
    let unreachable: Vec<_> = report.unreachable().collect();

    let _ = writeln!(out, "{}: {}", url, report.status);
    let _ = writeln!(
        out,
        "  {} controls probed, {} unreachable after layering",
        report.pre.len(),
        unreachable.len()
    );

    for result in &unreachable {
        let (x, y) = result.point;
        match result.blocking_element {
            Some(ref blocker) => {
                let _ = writeln!(out, "  - {} at ({:.0}, {:.0}) covered by {}", result.element, x, y, blocker);
            }
            None => {
                let _ = writeln!(out, "  - {} at ({:.0}, {:.0}) not hit", result.element, x, y);
            }
        }
    }

    if !report.excluded.is_empty() {
        let _ = writeln!(out, "  {} controls not probed:", report.excluded.len());
    }
    for excluded in &report.excluded {
        let _ = writeln!(out, "  - {} skipped: {}", excluded.element, excluded.reason);
    }

    if !report.remediations.is_empty() {
        let _ = writeln!(out, "  remediation panel #{}:", report.remediations[0].panel_id);
    }
    for record in &report.remediations {
        let outcome = match record.outcome {
            RemediationOutcome::Resolved => "reachable".to_string(),
            RemediationOutcome::Unresolved {
                blocking_element: Some(ref blocker),
            } => format!("still covered by {}", blocker),
            RemediationOutcome::Unresolved {
                blocking_element: None,
            } => "not rendered".to_string(),
        };
        let _ = writeln!(out, "    {} -> {}: {}", record.original_element, record.clone_element, outcome);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reachguard_core::{
        ElementRef, ExcludedElement, ExclusionReason, NodeId, ReachabilityResult, RemediationRecord,
        ZIndex,
    };

    fn button(node: u64, id: &str) -> ElementRef {
        ElementRef::new(NodeId(node), "button").with_id(id)
    }

    fn result(element: ElementRef, blocker: Option<ElementRef>) -> ReachabilityResult {
        ReachabilityResult {
            clickable: blocker.is_none(),
            element,
            blocking_element: blocker,
            effective_z_index: ZIndex::Value(300_000),
            point: (100.0, 60.0),
        }
    }

    #[test]
    fn test_render_clean_report() {
        let pre = vec![result(button(1, "go"), None)];
        let report = VerificationReport::new(pre.clone(), vec![], pre, true);

        let text = render_report("https://example.com", &report);
        assert!(text.starts_with("https://example.com: clean"));
        assert!(text.contains("1 controls probed, 0 unreachable"));
        assert!(!text.contains("remediation panel"));
        assert!(!text.contains("not probed"));
    }

    #[test]
    fn test_render_lists_excluded_controls() {
        let pre = vec![result(button(1, "go"), None)];
        let report = VerificationReport::new(pre.clone(), vec![], pre, true).with_excluded(vec![
            ExcludedElement {
                element: button(2, "more"),
                reason: ExclusionReason::OutsideViewport,
            },
            ExcludedElement {
                element: button(3, "hidden"),
                reason: ExclusionReason::ZeroArea,
            },
        ]);

        let text = render_report("https://example.com", &report);
        assert!(text.starts_with("https://example.com: clean"));
        assert!(text.contains("2 controls not probed"));
        assert!(text.contains("<button#more> #2 skipped: outside viewport"));
        assert!(text.contains("<button#hidden> #3 skipped: zero area"));
    }

    #[test]
    fn test_render_remediated_report() {
        let modal = ElementRef::new(NodeId(9), "div").with_class("modal");
        let pre = vec![result(button(1, "save"), Some(modal))];
        let clone = button(20, "save--reachguard");
        let records = vec![RemediationRecord {
            original_element: button(1, "save"),
            clone_element: clone.clone(),
            panel_id: "reachguard-panel".to_string(),
            outcome: RemediationOutcome::Resolved,
        }];
        let post = vec![result(clone, None)];
        let report = VerificationReport::new(pre, records, post, true);

        let text = render_report("https://example.com", &report);
        assert!(text.contains("remediated"));
        assert!(text.contains("covered by <div.modal> #9"));
        assert!(text.contains("remediation panel #reachguard-panel"));
        assert!(text.contains("<button#save--reachguard> #20: reachable"));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/reachguard.toml")).unwrap();
        assert!(config.remediation.enabled);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[probe]\nsettle_timeout_ms = 0\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
