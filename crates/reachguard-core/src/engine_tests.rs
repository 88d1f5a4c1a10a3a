use super::*;
use crate::document::{ElementSpec, MemoryDocument, ViewportInfo};
use reachguard_config::LayeringConfig;

fn plan_with_stride(stride: i64) -> LayeringPlan {
    let config = LayeringConfig {
        stride,
        ..Default::default()
    };
    LayeringPlan::from_config(&config).unwrap()
}

fn find<'a>(assignments: &'a [StackingAssignment], node: NodeId) -> &'a StackingAssignment {
    assignments.iter().find(|a| a.element.node == node).unwrap()
}

#[tokio::test]
async fn test_assigns_band_ranges_and_pointer_policy() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let body = doc.append(None, ElementSpec::new("body")).unwrap();
    let nav = doc.append(Some(body), ElementSpec::new("nav")).unwrap();
    let toolbar = doc.append(Some(nav), ElementSpec::new("div").role("toolbar")).unwrap();
    let button = doc.append(Some(toolbar), ElementSpec::new("button")).unwrap();
    let icon = doc.append(Some(button), ElementSpec::new("span")).unwrap();
    let tip = doc.append(Some(body), ElementSpec::new("div").class("tooltip")).unwrap();

    let plan = plan_with_stride(1000);
    let assignments = LayeringEngine::apply(&doc, &plan).await.unwrap();
    assert_eq!(assignments.len(), 6);

    // Background holds body and icon, in document order.
    assert_eq!(find(&assignments, body).z_index, 0);
    assert_eq!(find(&assignments, icon).z_index, 1);
    assert_eq!(find(&assignments, nav).z_index, 1000);
    assert_eq!(find(&assignments, toolbar).z_index, 2000);
    assert_eq!(find(&assignments, button).z_index, 3000);
    assert_eq!(find(&assignments, tip).z_index, 5000);

    assert_eq!(find(&assignments, body).pointer_events, None);
    assert_eq!(find(&assignments, nav).pointer_events, Some(PointerEvents::Auto));
    assert_eq!(find(&assignments, toolbar).pointer_events, Some(PointerEvents::None));
    assert_eq!(find(&assignments, button).pointer_events, Some(PointerEvents::Auto));
    assert_eq!(find(&assignments, icon).pointer_events, Some(PointerEvents::None));
    assert_eq!(find(&assignments, tip).pointer_events, Some(PointerEvents::Auto));

    assert_eq!(doc.computed_style(button, "z-index").await.unwrap(), "3000");
    assert_eq!(doc.computed_style(button, "position").await.unwrap(), "relative");
    assert_eq!(doc.computed_style(icon, "pointer-events").await.unwrap(), "none");
}

#[tokio::test]
async fn test_unmatched_wrapper_gets_no_stacking_override() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let body = doc.append(None, ElementSpec::new("body")).unwrap();
    let main = doc.append(Some(body), ElementSpec::new("main").z_index(4)).unwrap();
    let button = doc.append(Some(main), ElementSpec::new("button")).unwrap();
    let label = doc.append(Some(button), ElementSpec::new("span")).unwrap();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    assert!(!find(&assignments, body).matched);
    assert!(find(&assignments, button).matched);

    assert!(doc.presentation_override(body).await.unwrap().is_none());
    assert_eq!(doc.computed_style(body, "z-index").await.unwrap(), "auto");
    assert_eq!(doc.computed_style(body, "position").await.unwrap(), "static");
    // The page's own z-index is left alone.
    assert!(doc.presentation_override(main).await.unwrap().is_none());
    assert_eq!(doc.computed_style(main, "z-index").await.unwrap(), "4");

    // Descendants of a control only get the pointer policy.
    assert_eq!(
        doc.presentation_override(label).await.unwrap(),
        Some(Presentation {
            pointer_events: Some(PointerEvents::None),
            ..Default::default()
        })
    );
    assert_eq!(doc.computed_style(button, "z-index").await.unwrap(), "3000");
}

#[tokio::test]
async fn test_plain_wrapper_in_panel_keeps_pointer_policy() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let panel = doc.append(None, ElementSpec::new("aside")).unwrap();
    let wrapper = doc.append(Some(panel), ElementSpec::new("div")).unwrap();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    assert_eq!(find(&assignments, wrapper).pointer_events, None);
}

#[tokio::test]
async fn test_unmatched_control_in_transparent_group_stays_reachable() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let group = doc.append(None, ElementSpec::new("div").role("group")).unwrap();
    let item = doc.append(Some(group), ElementSpec::new("div").role("treeitem")).unwrap();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    assert_eq!(find(&assignments, group).pointer_events, Some(PointerEvents::None));
    assert_eq!(find(&assignments, item).pointer_events, Some(PointerEvents::Auto));
    assert_eq!(doc.computed_style(item, "pointer-events").await.unwrap(), "auto");
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let body = doc.append(None, ElementSpec::new("body")).unwrap();
    for i in 0..4 {
        let panel = doc.append(Some(body), ElementSpec::new("div").class("panel")).unwrap();
        doc.append(Some(panel), ElementSpec::new("button").z_index(i * 7)).unwrap();
    }

    let plan = plan_with_stride(1000);
    let first = LayeringEngine::apply(&doc, &plan).await.unwrap();
    let overrides_first = {
        let mut v = Vec::new();
        for a in &first {
            v.push(doc.presentation_override(a.element.node).await.unwrap());
        }
        v
    };

    let second = LayeringEngine::apply(&doc, &plan).await.unwrap();
    assert_eq!(first, second);
    for (a, before) in second.iter().zip(overrides_first) {
        assert_eq!(doc.presentation_override(a.element.node).await.unwrap(), before);
    }
}

#[tokio::test]
async fn test_monotonic_within_band() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let buttons: Vec<_> = (0..5)
        .map(|i| doc.append(None, ElementSpec::new("button").z_index(100 - i)).unwrap())
        .collect();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    let zs: Vec<_> = buttons.iter().map(|b| find(&assignments, *b).z_index).collect();
    assert!(zs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_identical_initial_z_gets_distinct_values() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let a = doc.append(None, ElementSpec::new("button").z_index(5)).unwrap();
    let b = doc.append(None, ElementSpec::new("button").z_index(5)).unwrap();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    assert_eq!(find(&assignments, a).z_index, 3000);
    assert_eq!(find(&assignments, b).z_index, 3001);
}

#[tokio::test]
async fn test_crowded_band_stays_below_next_band() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    for _ in 0..9 {
        doc.append(None, ElementSpec::new("div")).unwrap();
    }
    let nav = doc.append(None, ElementSpec::new("nav")).unwrap();

    let assignments = LayeringEngine::apply(&doc, &plan_with_stride(10)).await.unwrap();
    let background_max = assignments
        .iter()
        .filter(|a| a.band == "Background")
        .map(|a| a.z_index)
        .max()
        .unwrap();
    assert_eq!(background_max, 8);
    assert_eq!(find(&assignments, nav).z_index, 10);
}

#[tokio::test]
async fn test_band_overflow_fails_before_mutation() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let nodes: Vec<_> = (0..11)
        .map(|_| doc.append(None, ElementSpec::new("div")).unwrap())
        .collect();

    let err = LayeringEngine::apply(&doc, &plan_with_stride(10)).await.unwrap_err();
    assert!(matches!(err, LayeringError::Configuration(_)));
    for node in nodes {
        assert!(doc.presentation_override(node).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_ambiguous_band_fails_before_mutation() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let button = doc.append(None, ElementSpec::new("button")).unwrap();
    let both = doc
        .append(None, ElementSpec::new("div").class("panel").role("dialog"))
        .unwrap();

    let err = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap_err();
    assert!(matches!(err, LayeringError::AmbiguousBand { .. }));
    assert!(doc.presentation_override(button).await.unwrap().is_none());
    assert!(doc.presentation_override(both).await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_static_position_is_kept() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let fixed = doc
        .append(None, ElementSpec::new("div").class("modal").position(Position::Fixed))
        .unwrap();

    LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap();
    let presentation = doc.presentation_override(fixed).await.unwrap().unwrap();
    assert_eq!(presentation.position, None);
    assert_eq!(doc.computed_style(fixed, "position").await.unwrap(), "fixed");
}

#[tokio::test]
async fn test_write_failure_rolls_back() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    let first = doc.append(None, ElementSpec::new("button")).unwrap();
    let second = doc.append(None, ElementSpec::new("button")).unwrap();
    let third = doc.append(None, ElementSpec::new("button")).unwrap();

    let prior = Presentation {
        z_index: Some(42),
        ..Default::default()
    };
    doc.set_presentation_override(first, Some(&prior)).await.unwrap();

    // Two writes per element: the fourth write (second element) fails.
    doc.fail_write_after(3);
    let err = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap_err();
    assert!(matches!(err, LayeringError::DocumentUnavailable(DocumentError::Backend(_))));

    assert_eq!(doc.presentation_override(first).await.unwrap(), Some(prior));
    assert!(doc.presentation_override(second).await.unwrap().is_none());
    assert!(doc.presentation_override(third).await.unwrap().is_none());
}

#[tokio::test]
async fn test_detached_document_is_unavailable() {
    let doc = MemoryDocument::new(ViewportInfo::default());
    doc.append(None, ElementSpec::new("button")).unwrap();
    doc.detach();

    let err = LayeringEngine::apply(&doc, &plan_with_stride(1000)).await.unwrap_err();
    assert!(matches!(err, LayeringError::DocumentUnavailable(DocumentError::Detached)));
}
