//! Layering plan: role rules mapped onto ordered stacking bands.

mod selector;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use reachguard_config::{LayeringConfig, PointerPolicyConfig};

use crate::document::ElementRef;
use crate::error::LayeringError;

pub use selector::{Selector, SelectorError};

/// Bands every plan must define, lowest first.
pub const REQUIRED_BANDS: [&str; 6] = [
    "Background",
    "Panel",
    "ControlGroup",
    "Control",
    "TransientOverlay",
    "Tooltip",
];

/// Band an element falls back to when no rule matches it.
pub const DEFAULT_BAND: &str = "Background";

/// Highest z-index a browser honours.
const MAX_CSS_Z_INDEX: i64 = i32::MAX as i64;

/// Pointer interception policy of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPolicy {
    /// Matched elements intercept pointer events.
    Blocking,
    /// Matched elements never intercept, so they cannot shadow content below.
    Transparent,
}

impl From<PointerPolicyConfig> for PointerPolicy {
    fn from(p: PointerPolicyConfig) -> Self {
        match p {
            PointerPolicyConfig::Blocking => PointerPolicy::Blocking,
            PointerPolicyConfig::Transparent => PointerPolicy::Transparent,
        }
    }
}

/// A named, ordered layer of the stacking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerBand {
    pub name: String,
    pub order: i64,
    pub pointer_policy: PointerPolicy,
}

impl LayerBand {
    pub fn new(name: impl Into<String>, order: i64, pointer_policy: PointerPolicy) -> Self {
        Self {
            name: name.into(),
            order,
            pointer_policy,
        }
    }
}

impl fmt::Display for LayerBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.order)
    }
}

#[derive(Debug, Clone)]
struct RoleRule {
    selector: Selector,
    band: usize,
}

/// Result of resolving an element against the plan.
#[derive(Debug, Clone, Copy)]
pub struct BandMatch<'a> {
    pub band: &'a LayerBand,
    /// Selector of the first matching rule; `None` for the default band.
    pub rule: Option<&'a str>,
}

impl BandMatch<'_> {
    pub fn is_rule_match(&self) -> bool {
        self.rule.is_some()
    }
}

/// Validated mapping from structural role tags to stacking bands.
#[derive(Debug, Clone)]
pub struct LayeringPlan {
    /// Sorted by ascending order.
    bands: Vec<LayerBand>,
    rules: Vec<RoleRule>,
    stride: i64,
    default_band: usize,
}

impl LayeringPlan {
    /// Build a plan from bands, `(selector, band name)` rules and a stride.
    pub fn new<S, B>(
        mut bands: Vec<LayerBand>,
        rules: impl IntoIterator<Item = (S, B)>,
        stride: i64,
    ) -> Result<Self, LayeringError>
    where
        S: AsRef<str>,
        B: AsRef<str>,
    {
        if stride <= 0 {
            return Err(LayeringError::configuration(format!(
                "stride must be positive, got {}",
                stride
            )));
        }

        let mut names = HashSet::new();
        let mut orders = HashSet::new();
        for band in &bands {
            if !names.insert(band.name.clone()) {
                return Err(LayeringError::configuration(format!(
                    "duplicate band name '{}'",
                    band.name
                )));
            }
            if !orders.insert(band.order) {
                return Err(LayeringError::configuration(format!(
                    "band '{}' reuses order {}",
                    band.name, band.order
                )));
            }
            if band.order < 0 {
                return Err(LayeringError::configuration(format!(
                    "band '{}' has negative order {}",
                    band.name, band.order
                )));
            }
        }

        bands.sort_by_key(|b| b.order);

        let mut previous: Option<&LayerBand> = None;
        for required in REQUIRED_BANDS {
            let band = bands.iter().find(|b| b.name == required).ok_or_else(|| {
                LayeringError::configuration(format!("missing required band '{}'", required))
            })?;
            if let Some(prev) = previous {
                if band.order <= prev.order {
                    return Err(LayeringError::configuration(format!(
                        "band '{}' must be ordered above '{}'",
                        band.name, prev.name
                    )));
                }
            }
            previous = Some(band);
        }

        if bands.last().map(|b| b.name.as_str()) != Some("Tooltip") {
            return Err(LayeringError::configuration("band 'Tooltip' must be topmost"));
        }

        let top_order = bands.last().map(|b| b.order).unwrap_or(0);
        let ceiling = top_order
            .checked_add(1)
            .and_then(|n| n.checked_mul(stride))
            .map(|n| n - 1);
        if ceiling.is_none_or(|c| c > MAX_CSS_Z_INDEX) {
            return Err(LayeringError::configuration(format!(
                "stride {} pushes band '{}' beyond the maximum z-index",
                stride,
                bands.last().map(|b| b.name.as_str()).unwrap_or_default()
            )));
        }

        let mut compiled = Vec::new();
        for (selector, band_name) in rules {
            let (selector, band_name) = (selector.as_ref(), band_name.as_ref());
            let band = bands
                .iter()
                .position(|b| b.name == band_name)
                .ok_or_else(|| {
                    LayeringError::configuration(format!(
                        "rule '{}' references unknown band '{}'",
                        selector, band_name
                    ))
                })?;
            let selector =
                Selector::parse(selector).map_err(|e| LayeringError::configuration(e.to_string()))?;
            compiled.push(RoleRule { selector, band });
        }

        let default_band = bands
            .iter()
            .position(|b| b.name == DEFAULT_BAND)
            .ok_or_else(|| LayeringError::configuration("missing default band"))?;

        Ok(Self {
            bands,
            rules: compiled,
            stride,
            default_band,
        })
    }

    /// Build a plan from the `[layering]` configuration section.
    pub fn from_config(config: &LayeringConfig) -> Result<Self, LayeringError> {
        let bands = config
            .bands
            .iter()
            .map(|b| LayerBand::new(b.name.clone(), b.order, b.pointer.into()))
            .collect();
        let rules = config.rules.iter().map(|r| (r.selector.as_str(), r.band.as_str()));
        Self::new(bands, rules, config.stride)
    }

    /// The band for an element. Unmatched elements land in Background.
    pub fn band_for(&self, element: &ElementRef) -> Result<&LayerBand, LayeringError> {
        self.resolve(element).map(|m| m.band)
    }

    /// Resolve an element, keeping track of whether a rule matched.
    ///
    /// First match wins, but a later rule that also matches with a different
    /// band is an error rather than a silent precedence decision.
    pub fn resolve(&self, element: &ElementRef) -> Result<BandMatch<'_>, LayeringError> {
        let mut matching = self.rules.iter().filter(|r| r.selector.matches(element));

        let Some(first) = matching.next() else {
            return Ok(BandMatch {
                band: &self.bands[self.default_band],
                rule: None,
            });
        };

        if let Some(conflict) = matching.find(|r| r.band != first.band) {
            return Err(LayeringError::AmbiguousBand {
                element: element.to_string(),
                first_rule: first.selector.to_string(),
                first_band: self.bands[first.band].name.clone(),
                second_rule: conflict.selector.to_string(),
                second_band: self.bands[conflict.band].name.clone(),
            });
        }

        Ok(BandMatch {
            band: &self.bands[first.band],
            rule: Some(first.selector.as_str()),
        })
    }

    /// Bands in ascending order.
    pub fn bands(&self) -> &[LayerBand] {
        &self.bands
    }

    /// The topmost band.
    pub fn tooltip(&self) -> &LayerBand {
        // Construction guarantees Tooltip sorts last.
        &self.bands[self.bands.len() - 1]
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Lowest z-index of a band.
    pub fn base_z(&self, band: &LayerBand) -> i64 {
        band.order * self.stride
    }

    /// Highest z-index of a band.
    pub fn ceiling_z(&self, band: &LayerBand) -> i64 {
        self.base_z(band) + self.stride - 1
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
