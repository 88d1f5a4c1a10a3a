//! Navigation and load-state waits for CDP page session.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Navigate to URL and wait until the document has loaded.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<String, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }

        let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();

        self.wait_for_ready_state("complete", timeout).await?;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Poll `document.readyState` until it reaches `state` (or later).
    pub async fn wait_for_ready_state(&self, state: &str, timeout: Duration) -> Result<(), CdpError> {
        let target = ready_state_rank(state);
        let start = Instant::now();

        loop {
            let result = self.evaluate("document.readyState").await?;
            if result.as_str().map(ready_state_rank) >= Some(target) {
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "document.readyState did not reach '{}' within {:?}",
                    state, timeout
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

pub(super) fn ready_state_rank(state: &str) -> u8 {
    match state {
        "loading" => 0,
        "interactive" => 1,
        "complete" => 2,
        _ => 0,
    }
}
