//! DevTools domain types consumed by the core.
//!
//! Only the shapes the client actually reads are modelled; everything else
//! stays as raw [`serde_json::Value`] and flows through untouched.
//! Field names follow the protocol exactly
//! (<https://chromedevtools.github.io/devtools-protocol/>).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, ObjectId, SessionId, TargetId};

// ============================================================================
// Target domain
// ============================================================================

/// <https://chromedevtools.github.io/devtools-protocol/tot/Target#type-TargetInfo>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target identifier.
    pub target_id: TargetId,
    /// Target type (`"page"`, `"iframe"`, `"service_worker"`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Current URL.
    #[serde(default)]
    pub url: String,
    /// Whether a debugger is attached.
    #[serde(default)]
    pub attached: bool,
    /// Target that opened this one (popups).
    #[serde(default)]
    pub opener_id: Option<TargetId>,
}

/// `Target.targetCreated` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCreated {
    /// The created target.
    pub target_info: TargetInfo,
}

/// `Target.targetDestroyed` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyed {
    /// The destroyed target.
    pub target_id: TargetId,
}

/// `Target.targetCrashed` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCrashed {
    /// The crashed target.
    pub target_id: TargetId,
    /// Termination status.
    #[serde(default)]
    pub status: String,
    /// Platform-specific exit code.
    #[serde(default)]
    pub error_code: i64,
}

/// `Target.detachedFromTarget` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTarget {
    /// The detached session.
    pub session_id: SessionId,
}

// ============================================================================
// Runtime domain
// ============================================================================

/// `Runtime.executionContextCreated` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionContextCreated {
    /// The created context.
    pub context: ExecutionContextDescription,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Runtime#type-ExecutionContextDescription>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDescription {
    /// Context identifier.
    pub id: ExecutionContextId,
    /// Embedder-specific auxiliary data; carries `frameId` for page contexts.
    #[serde(default)]
    pub aux_data: Value,
}

impl ExecutionContextDescription {
    /// Extracts `auxData.frameId`, if present.
    #[must_use]
    pub fn frame_id(&self) -> Option<FrameId> {
        self.aux_data
            .get("frameId")
            .and_then(|v| v.as_str())
            .map(FrameId::new)
    }
}

/// `Runtime.executionContextDestroyed` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDestroyed {
    /// The destroyed context id.
    pub execution_context_id: ExecutionContextId,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Runtime#type-RemoteObject>
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// JS type (`"object"`, `"string"`, `"undefined"`, …).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// JS subtype (`"null"`, `"node"`, `"array"`, …).
    #[serde(default)]
    pub subtype: Option<String>,
    /// Class name for objects.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Primitive value, when returned by value.
    #[serde(default)]
    pub value: Value,
    /// Handle to the remote object, when returned by reference.
    #[serde(default)]
    pub object_id: Option<ObjectId>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

impl RemoteObject {
    /// Returns `true` for `undefined` or a `null` object.
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.kind == "undefined" || self.subtype.as_deref() == Some("null")
    }

    /// Returns the value as a boolean (`false` if absent or non-boolean).
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> bool {
        self.value.as_bool().unwrap_or(false)
    }

    /// Returns the value as a string.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidString`] if the remote value is not a string.
    pub fn as_string(&self) -> Result<String> {
        match self.value.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(Error::InvalidString),
        }
    }
}

/// Result of `Runtime.evaluate` / `Runtime.callFunctionOn`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// Evaluation result.
    pub result: RemoteObject,
    /// Exception details, when the script threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Runtime#type-ExceptionDetails>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text.
    #[serde(default)]
    pub text: String,
    /// Line number of the exception location.
    #[serde(default)]
    pub line_number: i64,
    /// Column number of the exception location.
    #[serde(default)]
    pub column_number: i64,
    /// Exception value, if available.
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl From<ExceptionDetails> for Error {
    fn from(details: ExceptionDetails) -> Self {
        let text = details
            .exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or(details.text);
        Error::JsException {
            text,
            line: details.line_number,
            column: details.column_number,
        }
    }
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Runtime#type-PropertyDescriptor>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Property value.
    #[serde(default)]
    pub value: Option<RemoteObject>,
    /// Whether the property shows up during enumeration.
    #[serde(default)]
    pub enumerable: bool,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesResult {
    /// Own property descriptors.
    pub result: Vec<PropertyDescriptor>,
    /// Exception details, when access threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Argument for `Runtime.callFunctionOn`.
#[derive(Debug, Clone, Serialize)]
pub struct CallArgument {
    /// Primitive value passed by value.
    pub value: Value,
}

// ============================================================================
// Page domain
// ============================================================================

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResult {
    /// Frame that navigated.
    #[serde(default)]
    pub frame_id: FrameId,
    /// Loader identifier; empty when no navigation was needed.
    #[serde(default)]
    pub loader_id: String,
    /// Error text for failed navigations.
    #[serde(default)]
    pub error_text: String,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Page#type-NavigationEntry>
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// Entry identifier.
    #[serde(default)]
    pub id: i64,
    /// Entry URL.
    #[serde(default)]
    pub url: String,
    /// URL as typed by the user.
    #[serde(default)]
    pub user_typed_url: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Transition type.
    #[serde(default)]
    pub transition_type: String,
}

/// Result of `Page.getNavigationHistory`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationHistory {
    /// Index of the current entry.
    pub current_index: i64,
    /// All history entries.
    pub entries: Vec<NavigationEntry>,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Page#type-Frame>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Frame identifier.
    pub id: FrameId,
    /// Parent frame, absent for the main frame.
    #[serde(default)]
    pub parent_id: Option<FrameId>,
    /// Frame URL.
    #[serde(default)]
    pub url: String,
    /// Frame name as specified in the tag.
    #[serde(default)]
    pub name: String,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Page#type-FrameTree>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTree {
    /// This node's frame.
    pub frame: Frame,
    /// Child frames.
    #[serde(default)]
    pub child_frames: Vec<FrameTree>,
}

impl FrameTree {
    /// Finds a frame by id anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: &FrameId) -> Option<&Frame> {
        if &self.frame.id == id {
            return Some(&self.frame);
        }
        self.child_frames.iter().find_map(|child| child.find(id))
    }
}

/// `Page.lifecycleEvent` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Frame the lifecycle event belongs to.
    pub frame_id: FrameId,
    /// Loader the event belongs to.
    #[serde(default)]
    pub loader_id: String,
    /// Event name (`"init"`, `"load"`, `"networkIdle"`, …).
    pub name: String,
    /// Monotonic timestamp.
    #[serde(default)]
    pub timestamp: f64,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Page#type-LayoutViewport>
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutViewport {
    /// Horizontal scroll offset in CSS pixels.
    #[serde(default)]
    pub page_x: i64,
    /// Vertical scroll offset in CSS pixels.
    #[serde(default)]
    pub page_y: i64,
    /// Viewport width in CSS pixels.
    #[serde(default)]
    pub client_width: i64,
    /// Viewport height in CSS pixels.
    #[serde(default)]
    pub client_height: i64,
}

/// Result of `Page.getLayoutMetrics`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    /// Visible viewport rectangle.
    #[serde(default)]
    pub layout_viewport: LayoutViewport,
    /// Full document content size.
    #[serde(default)]
    pub content_size: Rect,
}

// ============================================================================
// DOM domain
// ============================================================================

/// <https://chromedevtools.github.io/devtools-protocol/tot/DOM#type-Node>
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier within the agent.
    #[serde(default)]
    pub node_id: i64,
    /// Backend node identifier, stable across the session.
    #[serde(default)]
    pub backend_node_id: i64,
    /// Node type (1 = element, 3 = text, 9 = document, …).
    #[serde(default)]
    pub node_type: i64,
    /// Uppercase node name (`"DIV"`, `"SELECT"`, `"IFRAME"`, …).
    #[serde(default)]
    pub node_name: String,
    /// Flat list of `name, value` attribute pairs.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Frame id for frame-owner elements.
    #[serde(default)]
    pub frame_id: Option<FrameId>,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/DOM#type-Rect>
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    /// Left edge in CSS pixels.
    pub x: f64,
    /// Top edge in CSS pixels.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

/// One content quad: four corner points, clockwise, flattened to
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quad(pub Vec<f64>);

impl Quad {
    /// Returns the midpoint of the quad.
    #[must_use]
    pub fn middle(&self) -> (f64, f64) {
        let mut x = 0.0;
        let mut y = 0.0;
        for i in (0..8).step_by(2) {
            x += self.0[i];
            y += self.0[i + 1];
        }
        (x / 4.0, y / 4.0)
    }

    /// Returns the area via the shoelace formula.
    #[must_use]
    pub fn area(&self) -> f64 {
        let q = &self.0;
        let mut sum = 0.0;
        for i in 0..4 {
            let (x1, y1) = (q[i * 2], q[i * 2 + 1]);
            let (x2, y2) = (q[(i * 2 + 2) % 8], q[(i * 2 + 3) % 8]);
            sum += x1 * y2 - x2 * y1;
        }
        (sum / 2.0).abs()
    }

    /// Clamps every corner into the layout viewport.
    #[must_use]
    pub fn clamped(&self, viewport: &LayoutViewport) -> Quad {
        let width = viewport.client_width as f64;
        let height = viewport.client_height as f64;
        let mut q = self.0.clone();
        for i in (0..8).step_by(2) {
            q[i] = q[i].clamp(0.0, width);
            q[i + 1] = q[i + 1].clamp(0.0, height);
        }
        Quad(q)
    }

    /// Axis-aligned bounding rectangle of the quad.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let xs = [self.0[0], self.0[2], self.0[4], self.0[6]];
        let ys = [self.0[1], self.0[3], self.0[5], self.0[7]];
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

// ============================================================================
// Network domain
// ============================================================================

/// <https://chromedevtools.github.io/devtools-protocol/tot/Network#type-CookieParam>
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CookieParam {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// URL scoping the cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Cookie domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cookie path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expiry, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    /// HTTP-only flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Secure flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Network#type-Request>
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    #[serde(default)]
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Value,
    /// POST body, when small enough to inline.
    #[serde(default)]
    pub post_data: Option<String>,
}

/// `Network.loadingFailed` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailed {
    /// Request identifier.
    pub request_id: String,
    /// Failure description.
    #[serde(default)]
    pub error_text: String,
    /// Whether the request was canceled.
    #[serde(default)]
    pub canceled: bool,
}

// ============================================================================
// Fetch domain
// ============================================================================

/// <https://chromedevtools.github.io/devtools-protocol/tot/Network#type-ErrorReason>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorReason {
    /// Generic failure.
    Failed,
    /// Request aborted.
    Aborted,
    /// Request timed out.
    TimedOut,
    /// Access denied.
    AccessDenied,
    /// Connection closed.
    ConnectionClosed,
    /// Connection reset.
    ConnectionReset,
    /// Connection refused.
    ConnectionRefused,
    /// Connection aborted.
    ConnectionAborted,
    /// Connection failed.
    ConnectionFailed,
    /// DNS resolution failed.
    NameNotResolved,
    /// No network.
    InternetDisconnected,
    /// Address unreachable.
    AddressUnreachable,
    /// Blocked by the client.
    BlockedByClient,
    /// Blocked by the response.
    BlockedByResponse,
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Fetch#type-RequestPattern>
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// URL wildcard pattern (`*` and `?` supported).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    /// Resource type filter (`"Document"`, `"XHR"`, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Interception stage (`"Request"` or `"Response"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_stage: Option<String>,
}

impl RequestPattern {
    /// Pattern matching request URLs against a wildcard.
    #[must_use]
    pub fn url(pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }
}

/// <https://chromedevtools.github.io/devtools-protocol/tot/Fetch#type-HeaderEntry>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderEntry {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// `Fetch.requestPaused` event payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPaused {
    /// Interception identifier; terminate the request with it.
    pub request_id: String,
    /// The paused request.
    pub request: NetworkRequest,
    /// Frame that initiated the request.
    #[serde(default)]
    pub frame_id: Option<FrameId>,
    /// Resource type.
    #[serde(default)]
    pub resource_type: String,
    /// Response status, present at the Response stage.
    #[serde(default)]
    pub response_status_code: Option<i64>,
    /// Network-level request id, when known.
    #[serde(default)]
    pub network_id: Option<String>,
}

// ============================================================================
// Emulation domain
// ============================================================================

/// Parameters for `Emulation.setDeviceMetricsOverride`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    /// Viewport width in CSS pixels.
    pub width: i64,
    /// Viewport height in CSS pixels.
    pub height: i64,
    /// Device scale factor.
    pub device_scale_factor: f64,
    /// Whether to emulate a mobile device.
    pub mobile: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_middle_and_area() {
        let quad = Quad(vec![10.0, 10.0, 30.0, 10.0, 30.0, 20.0, 10.0, 20.0]);
        assert_eq!(quad.middle(), (20.0, 15.0));
        assert_eq!(quad.area(), 200.0);
    }

    #[test]
    fn test_quad_degenerate_area() {
        let quad = Quad(vec![5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        assert_eq!(quad.area(), 0.0);
    }

    #[test]
    fn test_quad_clamped() {
        let viewport = LayoutViewport {
            client_width: 100,
            client_height: 50,
            ..Default::default()
        };
        let quad = Quad(vec![-10.0, -5.0, 150.0, -5.0, 150.0, 80.0, -10.0, 80.0]);
        let clamped = quad.clamped(&viewport);
        assert_eq!(clamped.0, vec![0.0, 0.0, 100.0, 0.0, 100.0, 50.0, 0.0, 50.0]);
    }

    #[test]
    fn test_quad_bounding_rect() {
        let quad = Quad(vec![10.0, 10.0, 30.0, 10.0, 30.0, 20.0, 10.0, 20.0]);
        let rect = quad.bounding_rect();
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 10.0);
        assert_eq!(rect.width, 20.0);
        assert_eq!(rect.height, 10.0);
    }

    #[test]
    fn test_remote_object_nil() {
        let undef: RemoteObject =
            serde_json::from_str(r#"{"type": "undefined"}"#).expect("parse");
        assert!(undef.is_nil());

        let null: RemoteObject =
            serde_json::from_str(r#"{"type": "object", "subtype": "null", "value": null}"#)
                .expect("parse");
        assert!(null.is_nil());

        let node: RemoteObject =
            serde_json::from_str(r#"{"type": "object", "subtype": "node", "objectId": "o1"}"#)
                .expect("parse");
        assert!(!node.is_nil());
    }

    #[test]
    fn test_remote_object_as_string() {
        let obj: RemoteObject =
            serde_json::from_str(r#"{"type": "string", "value": "hi"}"#).expect("parse");
        assert_eq!(obj.as_string().expect("string"), "hi");

        let num: RemoteObject =
            serde_json::from_str(r#"{"type": "number", "value": 5}"#).expect("parse");
        assert!(matches!(num.as_string(), Err(Error::InvalidString)));
    }

    #[test]
    fn test_context_created_frame_id() {
        let event: ExecutionContextCreated = serde_json::from_str(
            r#"{"context": {"id": 4, "auxData": {"frameId": "F9", "isDefault": true}}}"#,
        )
        .expect("parse");
        assert_eq!(event.context.id, ExecutionContextId(4));
        assert_eq!(event.context.frame_id(), Some(FrameId::new("F9")));
    }

    #[test]
    fn test_frame_tree_find() {
        let tree: FrameTree = serde_json::from_str(
            r#"{
                "frame": {"id": "root", "url": "http://a"},
                "childFrames": [
                    {"frame": {"id": "child", "parentId": "root", "url": "http://b"}}
                ]
            }"#,
        )
        .expect("parse");
        assert!(tree.find(&FrameId::new("child")).is_some());
        assert!(tree.find(&FrameId::new("nope")).is_none());
    }

    #[test]
    fn test_exception_details_into_error() {
        let details: ExceptionDetails = serde_json::from_str(
            r#"{"text": "Uncaught", "lineNumber": 3, "columnNumber": 7,
                "exception": {"type": "object", "description": "TypeError: boom"}}"#,
        )
        .expect("parse");
        match Error::from(details) {
            Error::JsException { text, line, column } => {
                assert_eq!(text, "TypeError: boom");
                assert_eq!(line, 3);
                assert_eq!(column, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_request_pattern_url() {
        let pattern = RequestPattern::url("*://*/block");
        let json = serde_json::to_string(&pattern).expect("serialize");
        assert!(json.contains("urlPattern"));
        assert!(!json.contains("resourceType"));
    }
}
