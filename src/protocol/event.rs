//! Event message types.
//!
//! Events are notifications pushed by the browser. Each [`EventMessage`]
//! carries the raw method and params for generic subscribers; the session
//! event loop additionally parses the lifecycle-relevant subset into
//! [`ParsedEvent`] variants.
//!
//! Unknown methods stay opaque — they are delivered to subscribers as raw
//! JSON and otherwise ignored.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::protocol::devtool::{
    DetachedFromTarget, ExecutionContextCreated, ExecutionContextDestroyed, LifecycleEvent,
    RequestPaused, TargetCrashed, TargetCreated, TargetDestroyed,
};

// ============================================================================
// EventMessage
// ============================================================================

/// One event as delivered to a session's queue.
#[derive(Debug, Clone)]
pub struct EventMessage {
    /// Event name in `Domain.event` format.
    pub method: String,

    /// Event-specific payload.
    pub params: Value,
}

impl EventMessage {
    /// Creates a new event message.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the domain part of the method name.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    ///
    /// Shapes that fail to decode degrade to [`ParsedEvent::Unknown`];
    /// a malformed built-in event must not take the event loop down.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        fn decode<T: serde::de::DeserializeOwned>(
            params: &Value,
            build: impl FnOnce(T) -> ParsedEvent,
        ) -> ParsedEvent {
            match serde_json::from_value(params.clone()) {
                Ok(payload) => build(payload),
                Err(_) => ParsedEvent::Unknown,
            }
        }

        match self.method.as_str() {
            "Runtime.executionContextCreated" => {
                decode(&self.params, ParsedEvent::ExecutionContextCreated)
            }
            "Runtime.executionContextDestroyed" => {
                decode(&self.params, ParsedEvent::ExecutionContextDestroyed)
            }
            "Runtime.executionContextsCleared" => ParsedEvent::ExecutionContextsCleared,
            "Target.targetCreated" => decode(&self.params, ParsedEvent::TargetCreated),
            "Target.targetDestroyed" => decode(&self.params, ParsedEvent::TargetDestroyed),
            "Target.targetCrashed" => decode(&self.params, ParsedEvent::TargetCrashed),
            "Target.detachedFromTarget" => decode(&self.params, ParsedEvent::DetachedFromTarget),
            "Page.lifecycleEvent" => decode(&self.params, ParsedEvent::Lifecycle),
            "Fetch.requestPaused" => {
                decode(&self.params, |p| ParsedEvent::RequestPaused(Box::new(p)))
            }
            _ => ParsedEvent::Unknown,
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed variants for the events the session lifecycle depends on.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// A JavaScript execution context was created.
    ExecutionContextCreated(ExecutionContextCreated),

    /// A JavaScript execution context was destroyed.
    ExecutionContextDestroyed(ExecutionContextDestroyed),

    /// All execution contexts were cleared (navigation).
    ExecutionContextsCleared,

    /// A target appeared (tab, popup, worker).
    TargetCreated(TargetCreated),

    /// A target was destroyed.
    TargetDestroyed(TargetDestroyed),

    /// A target crashed.
    TargetCrashed(TargetCrashed),

    /// A session was detached from its target.
    DetachedFromTarget(DetachedFromTarget),

    /// A page lifecycle transition (`init`, `load`, `networkIdle`, …).
    Lifecycle(LifecycleEvent),

    /// A request was paused by the Fetch interceptor.
    RequestPaused(Box<RequestPaused>),

    /// Any method the lifecycle does not track; stays opaque.
    Unknown,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{ExecutionContextId, SessionId, TargetId};
    use serde_json::json;

    #[test]
    fn test_domain() {
        let event = EventMessage::new("Page.loadEventFired", json!({}));
        assert_eq!(event.domain(), "Page");
    }

    #[test]
    fn test_parse_context_created() {
        let event = EventMessage::new(
            "Runtime.executionContextCreated",
            json!({"context": {"id": 2, "auxData": {"frameId": "F1"}}}),
        );
        match event.parse() {
            ParsedEvent::ExecutionContextCreated(created) => {
                assert_eq!(created.context.id, ExecutionContextId(2));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_parse_target_destroyed() {
        let event = EventMessage::new("Target.targetDestroyed", json!({"targetId": "T1"}));
        match event.parse() {
            ParsedEvent::TargetDestroyed(destroyed) => {
                assert_eq!(destroyed.target_id, TargetId::new("T1"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_parse_detached() {
        let event = EventMessage::new(
            "Target.detachedFromTarget",
            json!({"sessionId": "S1", "targetId": "T1"}),
        );
        match event.parse() {
            ParsedEvent::DetachedFromTarget(detached) => {
                assert_eq!(detached.session_id, SessionId::new("S1"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_method_stays_opaque() {
        let event = EventMessage::new("Animation.animationStarted", json!({"id": "a"}));
        assert!(matches!(event.parse(), ParsedEvent::Unknown));
    }

    #[test]
    fn test_malformed_builtin_degrades() {
        let event = EventMessage::new("Target.targetDestroyed", json!({"bogus": true}));
        assert!(matches!(event.parse(), ParsedEvent::Unknown));
    }
}
