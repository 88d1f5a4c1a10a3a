use super::*;
use crate::document::NodeId;
use reachguard_config::{BandConfig, LayeringConfig, RuleConfig};

fn standard_bands() -> Vec<LayerBand> {
    vec![
        LayerBand::new("Background", 0, PointerPolicy::Blocking),
        LayerBand::new("Panel", 1, PointerPolicy::Blocking),
        LayerBand::new("ControlGroup", 2, PointerPolicy::Transparent),
        LayerBand::new("Control", 3, PointerPolicy::Blocking),
        LayerBand::new("TransientOverlay", 4, PointerPolicy::Blocking),
        LayerBand::new("Tooltip", 5, PointerPolicy::Blocking),
    ]
}

fn no_rules() -> Vec<(&'static str, &'static str)> {
    Vec::new()
}

#[test]
fn test_default_config_builds() {
    let plan = LayeringPlan::from_config(&LayeringConfig::default()).unwrap();
    assert_eq!(plan.bands().len(), 6);
    assert_eq!(plan.stride(), 100_000);
    assert_eq!(plan.tooltip().name, "Tooltip");
    assert!(plan.rule_count() > 0);
}

#[test]
fn test_default_config_pointer_policies() {
    let plan = LayeringPlan::from_config(&LayeringConfig::default()).unwrap();
    let transparent: Vec<_> = plan
        .bands()
        .iter()
        .filter(|b| b.pointer_policy == PointerPolicy::Transparent)
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(transparent, vec!["ControlGroup"]);
    assert_eq!(plan.tooltip().pointer_policy, PointerPolicy::Blocking);

    let tooltip = ElementRef::new(NodeId(1), "div").with_role("tooltip");
    assert_eq!(plan.band_for(&tooltip).unwrap().pointer_policy, PointerPolicy::Blocking);
}

#[test]
fn test_bands_sorted_by_order() {
    let mut bands = standard_bands();
    bands.reverse();
    let plan = LayeringPlan::new(bands, no_rules(), 1000).unwrap();
    let names: Vec<_> = plan.bands().iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, REQUIRED_BANDS.to_vec());
}

#[test]
fn test_z_range_per_band() {
    let plan = LayeringPlan::new(standard_bands(), no_rules(), 1000).unwrap();
    let control = &plan.bands()[3];
    assert_eq!(control.name, "Control");
    assert_eq!(plan.base_z(control), 3000);
    assert_eq!(plan.ceiling_z(control), 3999);
    assert_eq!(plan.ceiling_z(plan.tooltip()), 5999);
}

#[test]
fn test_unmatched_element_defaults_to_background() {
    let plan = LayeringPlan::new(standard_bands(), vec![("button", "Control")], 1000).unwrap();
    let div = ElementRef::new(NodeId(1), "div");

    let resolved = plan.resolve(&div).unwrap();
    assert_eq!(resolved.band.name, "Background");
    assert!(!resolved.is_rule_match());
}

#[test]
fn test_first_matching_rule_wins() {
    let plan = LayeringPlan::new(
        standard_bands(),
        vec![("button.primary", "Control"), ("button", "Control"), (".tip", "Tooltip")],
        1000,
    )
    .unwrap();
    let button = ElementRef::new(NodeId(1), "button").with_class("primary");

    let resolved = plan.resolve(&button).unwrap();
    assert_eq!(resolved.band.name, "Control");
    assert_eq!(resolved.rule, Some("button.primary"));
}

#[test]
fn test_conflicting_rules_are_ambiguous() {
    let plan = LayeringPlan::new(
        standard_bands(),
        vec![(".panel", "Panel"), ("[role=dialog]", "TransientOverlay")],
        1000,
    )
    .unwrap();
    let element = ElementRef::new(NodeId(7), "div")
        .with_class("panel")
        .with_role("dialog");

    let err = plan.band_for(&element).unwrap_err();
    match err {
        LayeringError::AmbiguousBand {
            first_band,
            second_band,
            ..
        } => {
            assert_eq!(first_band, "Panel");
            assert_eq!(second_band, "TransientOverlay");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_required_band() {
    let bands: Vec<_> = standard_bands()
        .into_iter()
        .filter(|b| b.name != "ControlGroup")
        .collect();
    let err = LayeringPlan::new(bands, no_rules(), 1000).unwrap_err();
    assert!(err.to_string().contains("ControlGroup"));
}

#[test]
fn test_required_bands_must_ascend() {
    let mut bands = standard_bands();
    bands[1].order = 3;
    bands[3].order = 1;
    let err = LayeringPlan::new(bands, no_rules(), 1000).unwrap_err();
    assert!(matches!(err, LayeringError::Configuration(_)));
}

#[test]
fn test_tooltip_must_be_topmost() {
    let mut bands = standard_bands();
    bands.push(LayerBand::new("Chrome", 9, PointerPolicy::Blocking));
    let err = LayeringPlan::new(bands, no_rules(), 1000).unwrap_err();
    assert!(err.to_string().contains("topmost"));
}

#[test]
fn test_extra_band_between_required() {
    let mut bands: Vec<_> = standard_bands()
        .into_iter()
        .map(|mut b| {
            b.order *= 10;
            b
        })
        .collect();
    bands.push(LayerBand::new("Toast", 45, PointerPolicy::Blocking));
    let plan = LayeringPlan::new(bands, vec![(".toast", "Toast")], 1000).unwrap();
    assert_eq!(plan.bands()[5].name, "Toast");
}

#[test]
fn test_duplicate_band_names_and_orders() {
    let mut bands = standard_bands();
    bands.push(LayerBand::new("Panel", 7, PointerPolicy::Blocking));
    assert!(LayeringPlan::new(bands, no_rules(), 1000).is_err());

    let mut bands = standard_bands();
    bands[2].order = 1;
    assert!(LayeringPlan::new(bands, no_rules(), 1000).is_err());
}

#[test]
fn test_rule_with_unknown_band() {
    let err = LayeringPlan::new(standard_bands(), vec![("button", "Buttons")], 1000).unwrap_err();
    assert!(err.to_string().contains("Buttons"));
}

#[test]
fn test_rule_with_bad_selector() {
    let err = LayeringPlan::new(standard_bands(), vec![("nav > a", "Control")], 1000).unwrap_err();
    assert!(matches!(err, LayeringError::Configuration(_)));
}

#[test]
fn test_stride_bounds() {
    assert!(LayeringPlan::new(standard_bands(), no_rules(), 0).is_err());
    assert!(LayeringPlan::new(standard_bands(), no_rules(), -5).is_err());
    // Tooltip ceiling would be 6 * 400M - 1, past i32::MAX.
    assert!(LayeringPlan::new(standard_bands(), no_rules(), 400_000_000).is_err());
    assert!(LayeringPlan::new(standard_bands(), no_rules(), 300_000_000).is_ok());
}

#[test]
fn test_from_config_pointer_policy() {
    let config = LayeringConfig {
        stride: 500,
        bands: LayeringConfig::default().bands,
        rules: vec![RuleConfig::new("[role=toolbar]", "ControlGroup")],
    };
    let plan = LayeringPlan::from_config(&config).unwrap();
    let toolbar = ElementRef::new(NodeId(3), "div").with_role("toolbar");
    let band = plan.band_for(&toolbar).unwrap();
    assert_eq!(band.name, "ControlGroup");
    assert_eq!(band.pointer_policy, PointerPolicy::Transparent);
}

#[test]
fn test_from_config_rejects_negative_order() {
    let mut config = LayeringConfig::default();
    config.bands[0] = BandConfig::new("Background", -1, Default::default());
    assert!(LayeringPlan::from_config(&config).is_err());
}
