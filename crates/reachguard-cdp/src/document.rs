//! [`RenderedDocument`] over a CDP page session.
//!
//! Every operation is a single `Runtime.evaluate` round trip into the page
//! bridge installed by [`CdpDocument::attach`]. Node ids are allocated by the
//! bridge and stay valid as long as the node is connected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};

use reachguard_core::{
    BoundingBox, DocumentError, ElementRef, NodeId, OverlaySpec, Presentation, RenderedDocument,
    ViewportInfo,
};

use crate::bridge_script::{bridge_script, call_expression, parse_reply};
use crate::cdp::PageSession;

/// A rendered page reached through the DevTools protocol.
pub struct CdpDocument {
    session: Arc<PageSession>,
    /// Bridge install token. A reload installs a new bridge with a new epoch.
    epoch: String,
}

impl CdpDocument {
    /// Install the bridge into the page's current document.
    pub async fn attach(session: Arc<PageSession>) -> Result<Self, DocumentError> {
        let epoch = session.evaluate(bridge_script()).await?;
        let epoch = epoch
            .as_str()
            .ok_or_else(|| DocumentError::Backend(format!("bridge install returned {}", epoch)))?
            .to_string();

        debug!("Bridge attached to {} (epoch {})", session.target_id(), epoch);
        Ok(Self { session, epoch })
    }

    pub fn session(&self) -> &Arc<PageSession> {
        &self.session
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    async fn bridge<T: DeserializeOwned>(
        &self,
        method: &str,
        args: &[Value],
    ) -> Result<T, DocumentError> {
        let expression = call_expression(&self.epoch, method, args).map_err(encode_error)?;
        trace!("bridge call {}", method);
        let reply = self.session.evaluate(&expression).await?;
        decode(method, parse_reply(reply)?)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, DocumentError> {
    serde_json::from_value(value)
        .map_err(|e| DocumentError::Backend(format!("bad {} reply: {}", method, e)))
}

fn encode_error(e: serde_json::Error) -> DocumentError {
    DocumentError::Backend(format!("encode bridge call: {}", e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, DocumentError> {
    serde_json::to_value(value).map_err(encode_error)
}

#[async_trait]
impl RenderedDocument for CdpDocument {
    async fn elements(&self) -> Result<Vec<ElementRef>, DocumentError> {
        self.bridge("elements", &[]).await
    }

    async fn viewport(&self) -> Result<ViewportInfo, DocumentError> {
        self.bridge("viewport", &[]).await
    }

    async fn bounding_box(&self, node: NodeId) -> Result<BoundingBox, DocumentError> {
        self.bridge("boundingBox", &[json!(node)]).await
    }

    async fn computed_style(&self, node: NodeId, property: &str) -> Result<String, DocumentError> {
        self.bridge("computedStyle", &[json!(node), json!(property)]).await
    }

    async fn presentation_override(
        &self,
        node: NodeId,
    ) -> Result<Option<Presentation>, DocumentError> {
        self.bridge("getOverride", &[json!(node)]).await
    }

    async fn set_presentation_override(
        &self,
        node: NodeId,
        presentation: Option<&Presentation>,
    ) -> Result<(), DocumentError> {
        let presentation = presentation.filter(|p| !p.is_empty());
        let _: Value = self
            .bridge("setOverride", &[json!(node), to_json(&presentation)?])
            .await?;
        Ok(())
    }

    async fn hit_test(&self, x: f64, y: f64) -> Result<Vec<ElementRef>, DocumentError> {
        self.bridge("hitTest", &[json!(x), json!(y)]).await
    }

    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DocumentError> {
        self.bridge("contains", &[json!(ancestor), json!(node)]).await
    }

    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<ElementRef, DocumentError> {
        self.bridge("createOverlay", &[to_json(spec)?]).await
    }

    async fn duplicate_into(
        &self,
        original: NodeId,
        container: NodeId,
        presentation: &Presentation,
    ) -> Result<ElementRef, DocumentError> {
        self.bridge(
            "duplicate",
            &[json!(original), json!(container), to_json(presentation)?],
        )
        .await
    }

    async fn remove(&self, node: NodeId) -> Result<(), DocumentError> {
        let _: Value = self.bridge("remove", &[json!(node)]).await?;
        Ok(())
    }

    async fn wait_for_render(&self, timeout: Duration) -> Result<(), DocumentError> {
        let settle = async {
            self.session.wait_for_ready_state("complete", timeout).await?;
            let _: Value = self.bridge("settled", &[]).await?;
            Ok::<(), DocumentError>(())
        };

        match tokio::time::timeout(timeout, settle).await {
            Ok(result) => result,
            Err(_) => Err(DocumentError::Timeout(format!(
                "render did not settle within {:?}",
                timeout
            ))),
        }
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
