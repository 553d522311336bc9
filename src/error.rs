//! Error types for the CDP client.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`].
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Session-fatal | [`Error::SessionClosed`], [`Error::ConnectionClosed`], [`Error::TargetCrashed`], [`Error::TargetDestroyed`], [`Error::Overwhelmed`] |
//! | Deadline | [`Error::Timeout`], [`Error::LoadTimeout`], [`Error::TargetCreatedTimeout`] |
//! | Element/DOM | [`Error::NoSuchElement`], [`Error::StaleElementReference`], [`Error::ElementInvisible`], [`Error::ElementIsOutOfViewport`], [`Error::ClickFailed`], [`Error::InvalidElementSelect`], [`Error::InvalidElementOption`], [`Error::InvalidString`], [`Error::FrameDetached`], [`Error::NoSuchFrame`] |
//! | Protocol | [`Error::Protocol`], [`Error::JsException`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |
//!
//! Session-fatal errors are latched: once one is observed, every further
//! call on that session returns the same kind without a round-trip.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{ExecutionContextId, FrameId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session-fatal
    // ========================================================================
    /// The session was already closed.
    #[error("session was already closed")]
    SessionClosed,

    /// The WebSocket connection closed; the browser may have died.
    #[error("websocket connection closed, browser may have died")]
    ConnectionClosed,

    /// The session's event queue overflowed and the session was dropped.
    #[error("session event queue overwhelmed")]
    Overwhelmed,

    /// The attached target crashed.
    #[error("target crashed: {status}")]
    TargetCrashed {
        /// Crash status reported by the browser.
        status: String,
    },

    /// The attached target was destroyed.
    #[error("target was destroyed")]
    TargetDestroyed,

    // ========================================================================
    // Deadline
    // ========================================================================
    /// A protocol call exceeded the session deadline.
    #[error("response timeout reached for {method}")]
    Timeout {
        /// Method that timed out.
        method: String,
    },

    /// A load or context-readiness wait exceeded the session deadline.
    #[error("load state timeout was reached")]
    LoadTimeout,

    /// No matching target appeared before the deadline.
    #[error("target creation timeout was reached")]
    TargetCreatedTimeout,

    // ========================================================================
    // Element / DOM
    // ========================================================================
    /// CSS selector matched no elements.
    #[error("no such element: {selector}")]
    NoSuchElement {
        /// CSS selector used.
        selector: String,
        /// Execution context searched.
        context: ExecutionContextId,
        /// Frame searched.
        frame: FrameId,
    },

    /// Referenced element is no longer attached to the DOM.
    #[error("referenced element is no longer attached to the DOM")]
    StaleElementReference,

    /// Element has no visible, interactable area.
    #[error("element invisible")]
    ElementInvisible,

    /// Element has no content quad inside the viewport.
    #[error("element is out of viewport")]
    ElementIsOutOfViewport,

    /// The dispatched click was not received by the element.
    #[error("click is not received by element")]
    ClickFailed,

    /// `select()` was invoked on an element that is not a `<select>`.
    #[error("specified element is not a SELECT")]
    InvalidElementSelect,

    /// A `<select>` has no option with one of the requested values.
    #[error("select element has no option {value}")]
    InvalidElementOption {
        /// The missing option value.
        value: String,
    },

    /// A JavaScript value was not the expected string.
    #[error("object type is not string")]
    InvalidString,

    /// The frame an element belonged to was detached.
    #[error("frame was detached")]
    FrameDetached,

    /// The element is not an IFRAME, or the frame id does not exist.
    #[error("no such frame")]
    NoSuchFrame,

    /// No target with page type was found.
    #[error("no target with page type found")]
    NoPageTarget,

    // ========================================================================
    // Protocol
    // ========================================================================
    /// Error reply from the browser, passed through verbatim.
    #[error("protocol error {code}: {message}")]
    Protocol {
        /// DevTools error code.
        code: i64,
        /// DevTools error message.
        message: String,
    },

    /// A JavaScript exception surfaced by `Runtime` evaluation.
    #[error("javascript exception: {text}")]
    JsException {
        /// Exception text from `exceptionDetails`.
        text: String,
        /// Line number in the evaluated script.
        line: i64,
        /// Column number in the evaluated script.
        column: i64,
    },

    // ========================================================================
    // External
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a protocol error.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Creates a call-timeout error.
    #[inline]
    pub fn timeout(method: impl Into<String>) -> Self {
        Self::Timeout {
            method: method.into(),
        }
    }

    /// Creates a no-such-element error.
    #[inline]
    pub fn no_such_element(
        selector: impl Into<String>,
        context: ExecutionContextId,
        frame: FrameId,
    ) -> Self {
        Self::NoSuchElement {
            selector: selector.into(),
            context,
            frame,
        }
    }

    /// Creates a target-crashed error.
    #[inline]
    pub fn target_crashed(status: impl Into<String>) -> Self {
        Self::TargetCrashed {
            status: status.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error permanently disables the session.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed
                | Self::ConnectionClosed
                | Self::Overwhelmed
                | Self::TargetCrashed { .. }
                | Self::TargetDestroyed
        )
    }

    /// Returns `true` if this is a deadline expiry.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::LoadTimeout | Self::TargetCreatedTimeout
        )
    }

    /// Returns `true` if this is an element-level error a retry façade may
    /// reasonably re-attempt.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::NoSuchElement { .. }
                | Self::StaleElementReference
                | Self::ElementInvisible
                | Self::ElementIsOutOfViewport
                | Self::ClickFailed
        )
    }

    /// Clones the latched fatal kind for delivery to another caller.
    ///
    /// Only meaningful for fatal variants; anything else maps to
    /// [`Error::SessionClosed`] since the session is gone either way.
    #[must_use]
    pub(crate) fn fatal_kind(&self) -> Error {
        match self {
            Self::SessionClosed => Self::SessionClosed,
            Self::ConnectionClosed => Self::ConnectionClosed,
            Self::Overwhelmed => Self::Overwhelmed,
            Self::TargetCrashed { status } => Self::TargetCrashed {
                status: status.clone(),
            },
            Self::TargetDestroyed => Self::TargetDestroyed,
            _ => Self::SessionClosed,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::protocol(-32000, "Cannot find context with specified id");
        assert_eq!(
            err.to_string(),
            "protocol error -32000: Cannot find context with specified id"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::ConnectionClosed.is_fatal());
        assert!(Error::SessionClosed.is_fatal());
        assert!(Error::TargetDestroyed.is_fatal());
        assert!(Error::target_crashed("oom").is_fatal());
        assert!(!Error::LoadTimeout.is_fatal());
        assert!(!Error::StaleElementReference.is_fatal());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::timeout("Page.navigate").is_timeout());
        assert!(Error::LoadTimeout.is_timeout());
        assert!(Error::TargetCreatedTimeout.is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_fatal_kind_clones_variant() {
        let err = Error::target_crashed("crashed");
        match err.fatal_kind() {
            Error::TargetCrashed { status } => assert_eq!(status, "crashed"),
            other => panic!("unexpected kind: {other}"),
        }
    }

    #[test]
    fn test_no_such_element_fields() {
        let err = Error::no_such_element("#missing", ExecutionContextId(3), FrameId::new("F1"));
        assert!(err.to_string().contains("#missing"));
        assert!(err.is_element_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
