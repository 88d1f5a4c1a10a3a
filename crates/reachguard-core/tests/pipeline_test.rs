//! End-to-end layering, probing and remediation against `MemoryDocument`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reachguard_config::LayeringConfig;
use reachguard_core::{
    ElementSpec, LayeringEngine, LayeringPlan, MemoryDocument, NodeId, PointerPolicy,
    ReachabilityProbe, RemediationLayout, RemediationOutcome, RemediationPlanner,
    RenderedDocument, ReportStatus, SessionOptions, VerificationSession, ViewportInfo, ZIndex,
};

fn default_plan() -> LayeringPlan {
    LayeringPlan::from_config(&LayeringConfig::default()).unwrap()
}

fn plan_with_stride(stride: i64) -> LayeringPlan {
    LayeringPlan::from_config(&LayeringConfig {
        stride,
        ..Default::default()
    })
    .unwrap()
}

/// Background canvas, a Control, then a Panel painted over the Control.
fn three_band_document() -> (MemoryDocument, NodeId, NodeId) {
    let doc = MemoryDocument::new(ViewportInfo::new(1280, 720));
    doc.append(None, ElementSpec::new("canvas").rect(0.0, 0.0, 1280.0, 720.0))
        .unwrap();
    let control = doc
        .append(None, ElementSpec::new("button").id("go").rect(200.0, 200.0, 120.0, 40.0))
        .unwrap();
    let panel = doc
        .append(None, ElementSpec::new("div").class("panel").rect(150.0, 150.0, 400.0, 300.0))
        .unwrap();
    (doc, control, panel)
}

#[tokio::test]
async fn test_three_band_scenario() {
    let (doc, control, panel) = three_band_document();
    let target = vec![doc.element(control).unwrap()];

    let before = ReachabilityProbe::verify(&doc, &target).await.unwrap();
    assert!(!before[0].clickable);
    assert_eq!(before[0].blocking_element.as_ref().map(|e| e.node), Some(panel));

    LayeringEngine::apply(&doc, &default_plan()).await.unwrap();

    let after = ReachabilityProbe::verify(&doc, &target).await.unwrap();
    assert!(after[0].clickable);
    assert!(after[0].blocking_element.is_none());
    assert_eq!(after[0].effective_z_index, ZIndex::Value(300_000));
}

/// A control inside a plain `<main>` wrapper, with a panel sibling of the
/// wrapper painted over it.
fn wrapped_control_document() -> (MemoryDocument, NodeId, NodeId) {
    let doc = MemoryDocument::new(ViewportInfo::new(1280, 720));
    let body = doc.append(None, ElementSpec::new("body").rect(0.0, 0.0, 1280.0, 720.0)).unwrap();
    let main = doc
        .append(Some(body), ElementSpec::new("main").rect(0.0, 0.0, 1280.0, 720.0))
        .unwrap();
    let control = doc
        .append(Some(main), ElementSpec::new("button").id("send").rect(200.0, 200.0, 120.0, 40.0))
        .unwrap();
    doc.append(Some(control), ElementSpec::new("span").rect(210.0, 210.0, 60.0, 20.0))
        .unwrap();
    let panel = doc
        .append(Some(body), ElementSpec::new("div").class("panel").rect(150.0, 150.0, 400.0, 300.0))
        .unwrap();
    (doc, control, panel)
}

#[tokio::test]
async fn test_control_in_plain_wrapper_rises_above_panel() {
    let (doc, control, panel) = wrapped_control_document();
    let target = vec![doc.element(control).unwrap()];

    let before = ReachabilityProbe::verify(&doc, &target).await.unwrap();
    assert_eq!(before[0].blocking_element.as_ref().map(|e| e.node), Some(panel));

    LayeringEngine::apply(&doc, &default_plan()).await.unwrap();

    let after = ReachabilityProbe::verify(&doc, &target).await.unwrap();
    assert!(after[0].clickable, "{after:#?}");
    let (x, y) = after[0].point;
    let top = doc.hit_test(x, y).await.unwrap();
    assert!(top[0].node == control || doc.contains(control, top[0].node).await.unwrap());
}

#[tokio::test]
async fn test_wrapped_control_session_is_clean() {
    let (doc, _, _) = wrapped_control_document();

    let mut options = SessionOptions::default();
    options.settle_timeout = Duration::from_millis(50);
    let mut session = VerificationSession::new(doc, default_plan(), options);
    let report = session.run().await.unwrap();

    assert_eq!(report.status, ReportStatus::Clean, "{report:#?}");
    assert!(report.remediations.is_empty());
}

#[tokio::test]
async fn test_zero_area_control_is_excluded_not_unreachable() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let hidden = doc
        .append(None, ElementSpec::new("button").rect(40.0, 40.0, 0.0, 0.0))
        .unwrap();

    LayeringEngine::apply(&doc, &default_plan()).await.unwrap();
    let results = ReachabilityProbe::verify(&doc, &[doc.element(hidden).unwrap()])
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_band_ordering_survives_crowded_lower_band() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let mut background = Vec::new();
    for i in 0..90 {
        let z = if i % 2 == 0 { 1_000 } else { 0 };
        background.push(
            doc.append(
                None,
                ElementSpec::new("div")
                    .class("background")
                    .rect(0.0, 0.0, 10.0, 10.0)
                    .z_index(z),
            )
            .unwrap(),
        );
    }
    let panel = doc.append(None, ElementSpec::new("nav")).unwrap();
    let control = doc.append(Some(panel), ElementSpec::new("a")).unwrap();

    let plan = plan_with_stride(100);
    LayeringEngine::apply(&doc, &plan).await.unwrap();

    let z = |node: NodeId| {
        let doc = &doc;
        async move {
            doc.computed_style(node, "z-index")
                .await
                .unwrap()
                .parse::<i64>()
                .unwrap()
        }
    };
    let panel_z = z(panel).await;
    let control_z = z(control).await;
    for node in background {
        assert!(z(node).await < panel_z);
    }
    assert!(panel_z < control_z);
}

#[tokio::test]
async fn test_idempotent_and_monotonic() {
    let (doc, _, _) = three_band_document();
    for i in 0..5 {
        doc.append(None, ElementSpec::new("button").z_index(7 * (5 - i))).unwrap();
    }

    let plan = default_plan();
    let first = LayeringEngine::apply(&doc, &plan).await.unwrap();
    let second = LayeringEngine::apply(&doc, &plan).await.unwrap();
    assert_eq!(first, second);

    let controls: Vec<i64> = first
        .iter()
        .filter(|a| a.band == "Control")
        .map(|a| a.z_index)
        .collect();
    assert_eq!(controls.len(), 6);
    assert!(controls.windows(2).all(|w| w[0] < w[1]));
    let distinct: HashSet<_> = first.iter().map(|a| a.z_index).collect();
    assert_eq!(distinct.len(), first.len());
}

#[tokio::test]
async fn test_controls_with_same_explicit_z_get_distinct_values() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let a = doc
        .append(None, ElementSpec::new("button").rect(0.0, 0.0, 50.0, 50.0).z_index(10))
        .unwrap();
    let b = doc
        .append(None, ElementSpec::new("button").rect(0.0, 0.0, 50.0, 50.0).z_index(10))
        .unwrap();

    let assignments = LayeringEngine::apply(&doc, &default_plan()).await.unwrap();
    let za = assignments.iter().find(|x| x.element.node == a).unwrap().z_index;
    let zb = assignments.iter().find(|x| x.element.node == b).unwrap().z_index;
    assert!(za < zb);
}

#[tokio::test]
async fn test_transparent_bands_never_block() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let body = doc.append(None, ElementSpec::new("body").rect(0.0, 0.0, 1280.0, 720.0)).unwrap();
    let toolbar = doc
        .append(Some(body), ElementSpec::new("div").role("toolbar").rect(0.0, 0.0, 600.0, 60.0))
        .unwrap();
    for i in 0..3 {
        doc.append(
            Some(toolbar),
            ElementSpec::new("button").rect(10.0 + 100.0 * i as f64, 10.0, 80.0, 40.0),
        )
        .unwrap();
    }
    doc.append(Some(body), ElementSpec::new("a").rect(700.0, 10.0, 80.0, 40.0)).unwrap();
    // A control group laid over every control, later in document order.
    doc.append(
        Some(body),
        ElementSpec::new("div").class("btn-group").rect(0.0, 0.0, 1280.0, 100.0).z_index(10),
    )
    .unwrap();
    // A tooltip over the link and a modal over the first button both block.
    doc.append(
        Some(body),
        ElementSpec::new("div").class("tooltip").rect(680.0, 0.0, 120.0, 100.0),
    )
    .unwrap();
    doc.append(
        Some(body),
        ElementSpec::new("div").role("dialog").rect(0.0, 0.0, 120.0, 100.0),
    )
    .unwrap();

    let plan = default_plan();
    LayeringEngine::apply(&doc, &plan).await.unwrap();

    let interactive = ReachabilityProbe::interactive_elements(&doc).await.unwrap();
    let results = ReachabilityProbe::verify(&doc, &interactive).await.unwrap();
    assert_eq!(results.len(), 4);

    let mut blockers = Vec::new();
    for result in &results {
        if let Some(ref blocker) = result.blocking_element {
            let band = plan.band_for(blocker).unwrap();
            assert_eq!(band.pointer_policy, PointerPolicy::Blocking);
            blockers.push(band.name.clone());
        }
    }
    blockers.sort();
    assert_eq!(blockers, vec!["Tooltip", "TransientOverlay"]);
}

#[tokio::test]
async fn test_remediation_soundness() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();
    let covered = doc
        .append(
            None,
            ElementSpec::new("button")
                .rect(500.0, 300.0, 100.0, 40.0)
                .on_activate(Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
        )
        .unwrap();
    doc.append(None, ElementSpec::new("div").class("overlay").rect(0.0, 0.0, 1280.0, 720.0))
        .unwrap();

    let plan = default_plan();
    LayeringEngine::apply(&doc, &plan).await.unwrap();
    let results = ReachabilityProbe::verify(&doc, &[doc.element(covered).unwrap()])
        .await
        .unwrap();
    assert!(!results[0].clickable);

    let planner = RemediationPlanner::new(&plan, RemediationLayout::default(), Duration::from_millis(50));
    let records = planner.remediate(&doc, &results).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, RemediationOutcome::Resolved);

    let recheck = ReachabilityProbe::verify(&doc, &[records[0].clone_element.clone()])
        .await
        .unwrap();
    assert!(recheck[0].clickable);

    let (x, y) = doc
        .bounding_box(records[0].clone_element.node)
        .await
        .unwrap()
        .center();
    doc.click_at(x, y).unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_session_reports_failure_loudly() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    doc.append(None, ElementSpec::new("button").rect(500.0, 300.0, 100.0, 40.0))
        .unwrap();
    doc.append(None, ElementSpec::new("div").class("overlay").rect(0.0, 0.0, 1280.0, 720.0))
        .unwrap();

    let mut options = SessionOptions::default();
    options.settle_timeout = Duration::from_millis(50);
    // Anchored past the right edge: the duplicate cannot be hit.
    options.layout.right = -5_000.0;

    let mut session = VerificationSession::new(doc, default_plan(), options);
    let report = session.run().await.unwrap();

    assert_eq!(report.status, ReportStatus::RemediationFailed);
    assert_eq!(report.remediations.len(), 1);
    assert!(matches!(
        report.remediations[0].outcome,
        RemediationOutcome::Unresolved { .. }
    ));
}
