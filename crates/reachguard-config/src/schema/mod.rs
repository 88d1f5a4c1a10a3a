//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_browser;
mod schema_layering;

pub use schema_browser::*;
pub use schema_layering::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layering: LayeringConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub remediation: RemediationConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound for waiting on a stable render before probing.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: default_settle_timeout_ms(),
        }
    }
}

fn default_settle_timeout_ms() -> u64 {
    5000
}

/// Remediation panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationConfig {
    /// Whether unreachable controls get duplicated into the rescue panel.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// DOM id of the synthetic panel.
    #[serde(default = "default_panel_id")]
    pub panel_id: String,

    /// Distance from the top of the viewport, in CSS pixels.
    #[serde(default = "default_anchor")]
    pub anchor_top: f64,

    /// Distance from the right edge of the viewport, in CSS pixels.
    #[serde(default = "default_anchor")]
    pub anchor_right: f64,

    /// Spacing between duplicates inside the panel.
    #[serde(default = "default_gap")]
    pub gap: f64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            panel_id: default_panel_id(),
            anchor_top: default_anchor(),
            anchor_right: default_anchor(),
            gap: default_gap(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_panel_id() -> String {
    "reachguard-remediation-panel".to_string()
}

fn default_anchor() -> f64 {
    16.0
}

fn default_gap() -> f64 {
    8.0
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
