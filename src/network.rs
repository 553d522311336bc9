//! Network domain helpers: cookies, headers, conditions, bodies.

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::json;

use crate::error::{Error, Result};
use crate::protocol::devtool::CookieParam;
use crate::session::Session;

// ============================================================================
// Session - Network domain
// ============================================================================

impl Session {
    /// Sets cookies for the browser context.
    pub async fn set_cookies(&self, cookies: &[CookieParam]) -> Result<()> {
        self.call("Network.setCookies", json!({"cookies": cookies}))
            .await
            .map(drop)
    }

    /// Clears all browser cookies.
    pub async fn clear_browser_cookies(&self) -> Result<()> {
        self.call("Network.clearBrowserCookies", json!({}))
            .await
            .map(drop)
    }

    /// Sends the given extra headers with every request from this page.
    pub async fn set_extra_http_headers(&self, headers: &HashMap<String, String>) -> Result<()> {
        self.call("Network.setExtraHTTPHeaders", json!({"headers": headers}))
            .await
            .map(drop)
    }

    /// Emulates network conditions: offline flag, latency (ms) and
    /// throughput (bytes/s; −1 disables throttling).
    pub async fn emulate_network_conditions(
        &self,
        offline: bool,
        latency_ms: f64,
        download_throughput: f64,
        upload_throughput: f64,
    ) -> Result<()> {
        self.call(
            "Network.emulateNetworkConditions",
            json!({
                "offline": offline,
                "latency": latency_ms,
                "downloadThroughput": download_throughput,
                "uploadThroughput": upload_throughput,
            }),
        )
        .await
        .map(drop)
    }

    /// Blocks requests whose URLs match any of the given patterns.
    pub async fn set_blocked_urls(&self, patterns: &[&str]) -> Result<()> {
        self.call("Network.setBlockedURLs", json!({"urls": patterns}))
            .await
            .map(drop)
    }

    /// Returns the POST body of a captured request.
    pub async fn get_request_post_data(&self, request_id: &str) -> Result<String> {
        let reply = self
            .call(
                "Network.getRequestPostData",
                json!({"requestId": request_id}),
            )
            .await?;
        reply
            .get("postData")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::protocol(0, "getRequestPostData reply without postData"))
    }

    /// Returns the body of a finished response, decoded when the browser
    /// reports it base64-encoded.
    pub async fn get_response_body(&self, request_id: &str) -> Result<Vec<u8>> {
        let reply = self
            .call("Network.getResponseBody", json!({"requestId": request_id}))
            .await?;
        let body = reply
            .get("body")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol(0, "getResponseBody reply without body"))?;
        let encoded = reply
            .get("base64Encoded")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if encoded {
            Base64Standard
                .decode(body)
                .map_err(|err| Error::protocol(0, format!("response body decode: {err}")))
        } else {
            Ok(body.as_bytes().to_vec())
        }
    }
}
