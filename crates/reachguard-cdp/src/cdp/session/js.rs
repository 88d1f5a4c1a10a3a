//! JavaScript execution for CDP page session.

use serde_json::{json, Value};

use crate::cdp::error::CdpError;
use crate::cdp::protocol::ExceptionDetails;

use super::core::PageSession;

impl PageSession {
    /// Evaluate a JavaScript expression and return its value.
    ///
    /// Promises are awaited.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        Self::unwrap_evaluation(result)
    }

    pub(super) fn unwrap_evaluation(result: Value) -> Result<Value, CdpError> {
        if let Some(exception) = result.get("exceptionDetails") {
            let details: ExceptionDetails = serde_json::from_value(exception.clone())?;
            return Err(CdpError::JavaScript(details.message()));
        }

        Ok(result["result"]["value"].clone())
    }
}
