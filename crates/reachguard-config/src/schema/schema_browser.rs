//! Browser connection configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser configuration for the Chrome DevTools Protocol adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Run a launched Chrome headless.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Pinned viewport width for probing.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Pinned viewport height for probing.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Chrome executable; discovered from well-known locations when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Profile directory for a launched Chrome.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Upper bound for navigation and page load.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: default_headless(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            chrome_path: None,
            profile_dir: None,
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

impl BrowserConfig {
    /// Get the profile directory, creating default if not specified.
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".reachguard")
                .join("browser-profile")
        })
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}
