//! Emulation domain helpers: device metrics, user agent, throttling.

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;

use crate::error::Result;
use crate::protocol::devtool::DeviceMetrics;
use crate::session::Session;

// ============================================================================
// Session - Emulation domain
// ============================================================================

impl Session {
    /// Overrides device metrics (viewport size, scale, mobile flag).
    pub async fn set_device_metrics_override(&self, metrics: &DeviceMetrics) -> Result<()> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            serde_json::to_value(metrics)?,
        )
        .await
        .map(drop)
    }

    /// Clears a device metrics override.
    pub async fn clear_device_metrics_override(&self) -> Result<()> {
        self.call("Emulation.clearDeviceMetricsOverride", json!({}))
            .await
            .map(drop)
    }

    /// Overrides the user agent string.
    pub async fn set_user_agent_override(&self, user_agent: &str) -> Result<()> {
        self.call(
            "Emulation.setUserAgentOverride",
            json!({"userAgent": user_agent}),
        )
        .await
        .map(drop)
    }

    /// Hides or shows scrollbars in screenshots and screencasts.
    pub async fn set_scrollbars_hidden(&self, hidden: bool) -> Result<()> {
        self.call(
            "Emulation.setScrollbarsHidden",
            json!({"hidden": hidden}),
        )
        .await
        .map(drop)
    }

    /// Throttles the CPU by the given factor (1 = no throttling).
    pub async fn set_cpu_throttling_rate(&self, rate: f64) -> Result<()> {
        self.call("Emulation.setCPUThrottlingRate", json!({"rate": rate}))
            .await
            .map(drop)
    }

    /// Enables or disables `document.cookie`.
    pub async fn set_document_cookie_disabled(&self, disabled: bool) -> Result<()> {
        self.call(
            "Emulation.setDocumentCookieDisabled",
            json!({"disabled": disabled}),
        )
        .await
        .map(drop)
    }
}
