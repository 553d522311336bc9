//! Runtime and DOM domains: expressions, remote objects, nodes, quads.
//!
//! Everything here is a single blocking protocol call; composition lives in
//! [`crate::element`] and [`crate::page`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, ObjectId};
use crate::protocol::devtool::{
    CallArgument, EvaluateResult, LayoutMetrics, Node, PropertiesResult, PropertyDescriptor, Quad,
    RemoteObject,
};
use crate::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Quads with an area at or below this many px² are not clickable.
const MIN_VISIBLE_AREA: f64 = 1.0;

// ============================================================================
// Session - Runtime domain
// ============================================================================

impl Session {
    /// Evaluates an expression in the given execution context.
    ///
    /// # Errors
    ///
    /// [`Error::JsException`] when the script throws;
    /// [`Error::StaleElementReference`] when the context is gone.
    pub(crate) async fn evaluate_in(
        &self,
        expression: &str,
        context: ExecutionContextId,
        await_promise: bool,
        return_by_value: bool,
    ) -> Result<RemoteObject> {
        let mut params = json!({
            "expression": expression,
            "awaitPromise": await_promise,
            "returnByValue": return_by_value,
        });
        if !context.is_default() {
            params["contextId"] = json!(context);
        }
        let result: EvaluateResult = self.call_into("Runtime.evaluate", params).await?;
        match result.exception_details {
            Some(details) => Err(details.into()),
            None => Ok(result.result),
        }
    }

    /// Evaluates an expression in the session's current context.
    ///
    /// Waits on the frame/context gate first, so the expression always runs
    /// in a context at least as fresh as the last navigation.
    pub async fn evaluate(&self, expression: &str) -> Result<RemoteObject> {
        let context = self.current_context().await?;
        self.evaluate_in(expression, context, true, true).await
    }

    /// Calls a function with the remote object as `this`.
    pub(crate) async fn call_function_on(
        &self,
        object_id: &ObjectId,
        declaration: &str,
        args: Vec<Value>,
        return_by_value: bool,
    ) -> Result<RemoteObject> {
        let arguments: Vec<CallArgument> =
            args.into_iter().map(|value| CallArgument { value }).collect();
        let result: EvaluateResult = self
            .call_into(
                "Runtime.callFunctionOn",
                json!({
                    "objectId": object_id,
                    "functionDeclaration": declaration,
                    "arguments": arguments,
                    "awaitPromise": true,
                    "returnByValue": return_by_value,
                }),
            )
            .await?;
        match result.exception_details {
            Some(details) => Err(details.into()),
            None => Ok(result.result),
        }
    }

    /// Returns the remote object's own properties.
    pub(crate) async fn get_properties(
        &self,
        object_id: &ObjectId,
    ) -> Result<Vec<PropertyDescriptor>> {
        let result: PropertiesResult = self
            .call_into(
                "Runtime.getProperties",
                json!({
                    "objectId": object_id,
                    "ownProperties": true,
                    "accessorPropertiesOnly": false,
                }),
            )
            .await?;
        match result.exception_details {
            Some(details) => Err(details.into()),
            None => Ok(result.result),
        }
    }

    /// Releases a remote object handle.
    pub(crate) async fn release_object(&self, object_id: &ObjectId) -> Result<()> {
        self.call("Runtime.releaseObject", json!({"objectId": object_id}))
            .await
            .map(drop)
    }

    /// Terminates the current or next JavaScript execution.
    pub async fn terminate_execution(&self) -> Result<()> {
        self.call("Runtime.terminateExecution", json!({}))
            .await
            .map(drop)
    }
}

// ============================================================================
// Session - DOM domain
// ============================================================================

impl Session {
    /// Describes the node behind a remote object (depth 1).
    pub(crate) async fn describe_node(&self, object_id: &ObjectId) -> Result<Node> {
        let reply = self
            .call(
                "DOM.describeNode",
                json!({"objectId": object_id, "depth": 1}),
            )
            .await?;
        let node = reply.get("node").cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(node)?)
    }

    /// Scrolls the node into view if it is outside the viewport.
    pub(crate) async fn scroll_into_view_if_needed(&self, object_id: &ObjectId) -> Result<()> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            json!({"objectId": object_id}),
        )
        .await
        .map(drop)
    }

    /// Focuses the node.
    pub(crate) async fn focus_object(&self, object_id: &ObjectId) -> Result<()> {
        self.call("DOM.focus", json!({"objectId": object_id}))
            .await
            .map(drop)
    }

    /// Returns the backend node id of a frame's owner element.
    pub async fn get_frame_owner(&self, frame_id: &FrameId) -> Result<i64> {
        let reply = self
            .call("DOM.getFrameOwner", json!({"frameId": frame_id}))
            .await?;
        reply
            .get("backendNodeId")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| Error::protocol(0, "getFrameOwner reply without backendNodeId"))
    }

    /// Sets the files of a file input node.
    pub(crate) async fn set_file_input_files(
        &self,
        object_id: &ObjectId,
        files: &[&str],
    ) -> Result<()> {
        self.call(
            "DOM.setFileInputFiles",
            json!({"objectId": object_id, "files": files}),
        )
        .await
        .map(drop)
    }

    /// Returns the node's first usable content quad.
    ///
    /// Quads with area ≤ 1 px² are skipped; with `clamp_to_viewport` the
    /// quad corners are first clamped into the layout viewport (an element
    /// hanging off-screen is judged by its on-screen part).
    ///
    /// # Errors
    ///
    /// [`Error::ElementIsOutOfViewport`] when no quad survives the filter.
    pub(crate) async fn get_content_quads(
        &self,
        object_id: &ObjectId,
        clamp_to_viewport: bool,
    ) -> Result<Quad> {
        let reply = self
            .call("DOM.getContentQuads", json!({"objectId": object_id}))
            .await?;
        let quads: Vec<Quad> = serde_json::from_value(
            reply
                .get("quads")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        )?;

        let viewport = if clamp_to_viewport {
            Some(self.get_layout_metrics().await?.layout_viewport)
        } else {
            None
        };

        for quad in quads {
            if quad.0.len() != 8 {
                continue;
            }
            let candidate = match &viewport {
                Some(viewport) => quad.clamped(viewport),
                None => quad,
            };
            if candidate.area() > MIN_VISIBLE_AREA {
                return Ok(candidate);
            }
        }
        Err(Error::ElementIsOutOfViewport)
    }

    /// Returns the page's layout metrics.
    pub async fn get_layout_metrics(&self) -> Result<LayoutMetrics> {
        self.call_into("Page.getLayoutMetrics", json!({})).await
    }
}

// ============================================================================
// Session - Overlay domain
// ============================================================================

impl Session {
    /// Highlights a node on screen. Debug aid.
    pub async fn highlight_node(&self, object_id: &ObjectId) -> Result<()> {
        self.call(
            "Overlay.highlightNode",
            json!({
                "objectId": object_id,
                "highlightConfig": {
                    "showRulers": true,
                    "borderColor": {"r": 255, "g": 1, "b": 1},
                },
            }),
        )
        .await
        .map(drop)
    }

    /// Highlights a quad on screen. Debug aid.
    pub async fn highlight_quad(&self, quad: &Quad) -> Result<()> {
        self.call(
            "Overlay.highlightQuad",
            json!({
                "quad": quad,
                "outlineColor": {"r": 255, "g": 1, "b": 1, "a": 0.7},
            }),
        )
        .await
        .map(drop)
    }
}

// ============================================================================
// Tests
// ============================================================================
