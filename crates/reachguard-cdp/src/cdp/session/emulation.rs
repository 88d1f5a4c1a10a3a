//! Viewport emulation.

use crate::cdp::error::CdpError;
use crate::cdp::protocol::DeviceMetrics;

use super::core::PageSession;

impl PageSession {
    /// Pin the layout viewport so probe coordinates are reproducible.
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<(), CdpError> {
        let metrics = DeviceMetrics {
            width,
            height,
            device_scale_factor: 1.0,
            mobile: false,
        };
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(serde_json::to_value(metrics)?),
        )
        .await?;
        Ok(())
    }
}
