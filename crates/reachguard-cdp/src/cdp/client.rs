//! CDP browser connection.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::error::CdpError;
use super::protocol::BrowserVersion;
use super::session::PageSession;
use super::transport::Transport;

/// Connection to a Chrome instance with remote debugging enabled.
pub struct CdpClient {
    browser: String,
    transport: Arc<Transport>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&http_endpoint)?;

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        let transport = Transport::connect(&version.web_socket_debugger_url).await?;
        debug!(
            "CDP client connected to {} ({})",
            version.browser, version.web_socket_debugger_url
        );

        Ok(Self {
            browser: version.browser,
            transport,
        })
    }

    /// Browser product string, e.g. `Chrome/126.0.6478.126`.
    pub fn browser(&self) -> &str {
        &self.browser
    }

    /// Open a blank tab and attach a session to it.
    pub async fn new_page(&self) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call("Target.createTarget", Some(json!({"url": "about:blank"})), None)
            .await?;
        let target_id = result["targetId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))?
            .to_string();
        debug!("Created page {}", target_id);

        self.attach_page(&target_id).await
    }

    /// Attach a session to an existing target.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    /// Close a page target.
    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.transport
            .call("Target.closeTarget", Some(json!({"targetId": target_id})), None)
            .await?;
        Ok(())
    }
}
