//! Wire message types.
//!
//! Every outbound frame is a [`MethodCall`]; every inbound frame decodes to
//! a [`WireFrame`], which is either a reply (`id` + `result`/`error`) or an
//! event (`method` + `params`, no id).
//!
//! # Format
//!
//! Outbound:
//! ```json
//! {"id": 12, "method": "Page.navigate", "params": {...}, "sessionId": "..."}
//! ```
//!
//! Inbound reply / event:
//! ```json
//! {"id": 12, "result": {...}, "sessionId": "..."}
//! {"method": "Page.loadEventFired", "params": {...}, "sessionId": "..."}
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{CallId, SessionId};

// ============================================================================
// MethodCall
// ============================================================================

/// An outbound method call.
#[derive(Debug, Clone, Serialize)]
pub struct MethodCall {
    /// Client-allocated correlation id.
    pub id: CallId,

    /// Method name in `Domain.method` format.
    pub method: String,

    /// Method parameters.
    pub params: Value,

    /// Target session; absent for browser-level calls.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl MethodCall {
    /// Creates a new method call.
    #[inline]
    #[must_use]
    pub fn new(
        id: CallId,
        session_id: Option<SessionId>,
        method: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            id,
            method: method.into(),
            params,
            session_id,
        }
    }
}

// ============================================================================
// ProtocolError
// ============================================================================

/// Structured error payload of a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProtocolError {
    /// DevTools error code.
    #[serde(default)]
    pub code: i64,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Optional extra detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

// ============================================================================
// WireFrame
// ============================================================================

/// One decoded inbound frame.
///
/// The union of reply and event shapes; [`WireFrame::is_event`]
/// discriminates. A frame with an unknown shape (no id, no method) is
/// discarded by the reader with a warning.
#[derive(Debug, Clone, Deserialize)]
pub struct WireFrame {
    /// Correlation id; `0` for events.
    #[serde(default)]
    pub id: CallId,

    /// Reply payload, if success.
    #[serde(default)]
    pub result: Option<Value>,

    /// Reply error, if failure.
    #[serde(default)]
    pub error: Option<ProtocolError>,

    /// Event method; empty for replies.
    #[serde(default)]
    pub method: String,

    /// Event parameters.
    #[serde(default)]
    pub params: Value,

    /// Session the frame belongs to; absent for browser-level traffic.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl WireFrame {
    /// Returns `true` if this frame is an event rather than a reply.
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.id.value() == 0 && !self.method.is_empty()
    }

    /// Returns `true` if this is an error reply.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.code != 0 || !e.message.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_call_serialization() {
        let call = MethodCall::new(
            CallId(7),
            Some(SessionId::new("S1")),
            "Page.navigate",
            json!({"url": "about:blank"}),
        );
        let text = serde_json::to_string(&call).expect("serialize");
        assert!(text.contains("\"id\":7"));
        assert!(text.contains("Page.navigate"));
        assert!(text.contains("\"sessionId\":\"S1\""));
    }

    #[test]
    fn test_method_call_omits_empty_session() {
        let call = MethodCall::new(CallId(1), None, "Target.getTargets", json!({}));
        let text = serde_json::to_string(&call).expect("serialize");
        assert!(!text.contains("sessionId"));
    }

    #[test]
    fn test_reply_frame() {
        let frame: WireFrame =
            serde_json::from_str(r#"{"id": 3, "result": {"frameId": "F"}}"#).expect("parse");
        assert!(!frame.is_event());
        assert!(!frame.is_error());
        assert_eq!(frame.id, CallId(3));
    }

    #[test]
    fn test_error_frame() {
        let frame: WireFrame = serde_json::from_str(
            r#"{"id": 4, "error": {"code": -32000, "message": "Cannot find context with specified id"}}"#,
        )
        .expect("parse");
        assert!(frame.is_error());
        let err = frame.error.expect("error payload");
        assert_eq!(err.code, -32000);
    }

    #[test]
    fn test_event_frame() {
        let frame: WireFrame = serde_json::from_str(
            r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}, "sessionId": "S"}"#,
        )
        .expect("parse");
        assert!(frame.is_event());
        assert_eq!(frame.method, "Page.loadEventFired");
        assert_eq!(frame.session_id, Some(SessionId::new("S")));
    }
}
