//! Layering configuration: stacking bands and role rules.

use serde::{Deserialize, Serialize};

/// Layering plan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// Z-index distance between the bases of two consecutive bands.
    ///
    /// Must exceed the largest number of elements any single band receives.
    #[serde(default = "default_stride")]
    pub stride: i64,

    /// Stacking bands, in any order (sorted by `order` when the plan is built).
    #[serde(default = "default_bands")]
    pub bands: Vec<BandConfig>,

    /// Role rules, evaluated in the listed order.
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            bands: default_bands(),
            rules: default_rules(),
        }
    }
}

/// A stacking band definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub name: String,
    pub order: i64,
    #[serde(default)]
    pub pointer: PointerPolicyConfig,
}

impl BandConfig {
    pub fn new(name: impl Into<String>, order: i64, pointer: PointerPolicyConfig) -> Self {
        Self {
            name: name.into(),
            order,
            pointer,
        }
    }
}

/// Pointer interception policy of a band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPolicyConfig {
    #[default]
    Blocking,
    Transparent,
}

/// A role rule mapping a structural selector to a band name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub selector: String,
    pub band: String,
}

impl RuleConfig {
    pub fn new(selector: impl Into<String>, band: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            band: band.into(),
        }
    }
}

fn default_stride() -> i64 {
    100_000
}

fn default_bands() -> Vec<BandConfig> {
    use PointerPolicyConfig::{Blocking, Transparent};
    vec![
        BandConfig::new("Background", 0, Blocking),
        BandConfig::new("Panel", 1, Blocking),
        BandConfig::new("ControlGroup", 2, Transparent),
        BandConfig::new("Control", 3, Blocking),
        BandConfig::new("TransientOverlay", 4, Blocking),
        BandConfig::new("Tooltip", 5, Blocking),
    ]
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(".tooltip, [role=tooltip]", "Tooltip"),
        RuleConfig::new(
            ".modal, .overlay, .dropdown, [role=dialog], [role=menu], [role=listbox]",
            "TransientOverlay",
        ),
        RuleConfig::new(
            "button, a, input, select, textarea, summary, .control, [role=button], [role=link], \
             [role=checkbox], [role=radio], [role=tab], [role=switch], [role=menuitem]",
            "Control",
        ),
        RuleConfig::new(
            ".control-group, .toolbar, .btn-group, fieldset, [role=toolbar], [role=group], [role=tablist]",
            "ControlGroup",
        ),
        RuleConfig::new(".panel, .sidebar, aside, nav, [role=navigation], [role=complementary]", "Panel"),
        RuleConfig::new(".canvas, .background, canvas", "Background"),
    ]
}
