//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time:
//! a `TargetId` cannot be passed where a `SessionId` is expected, even
//! though both are strings on the wire.
//!
//! | Type | Wire shape | Allocated by |
//! |------|------------|--------------|
//! | [`CallId`] | `i64` | client (monotonic, starts at 1) |
//! | [`TargetId`] | string | browser |
//! | [`SessionId`] | string | browser (`Target.attachToTarget`) |
//! | [`FrameId`] | string | browser (main frame id equals the target id) |
//! | [`ObjectId`] | string | browser (`Runtime` remote object) |
//! | [`ExecutionContextId`] | `i64` | browser (`0` = page default world) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Macros
// ============================================================================

/// Declares a string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw string identifier.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw string.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the identifier is empty.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

// ============================================================================
// CallId
// ============================================================================

/// Client-generated id correlating one request with its reply.
///
/// Strictly monotonic per connection, starting at 1, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CallId(pub i64);

impl CallId {
    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// String identifiers
// ============================================================================

string_id! {
    /// Identifier of a debuggable target (page, popup, iframe, worker).
    TargetId
}

string_id! {
    /// Identifier of a debugging session bound to one target.
    SessionId
}

string_id! {
    /// Identifier of a frame in the page's frame tree.
    ///
    /// The main frame's id equals the page's [`TargetId`].
    FrameId
}

string_id! {
    /// Identifier of a remote JavaScript object held by the browser.
    ObjectId
}

impl From<&TargetId> for FrameId {
    fn from(target: &TargetId) -> Self {
        Self::new(target.as_str())
    }
}

// ============================================================================
// ExecutionContextId
// ============================================================================

/// Identifier of a JavaScript execution context.
///
/// `0` denotes the main frame's default world and is omitted on the wire;
/// isolated worlds and child-frame contexts carry positive ids assigned by
/// the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ExecutionContextId(pub i64);

impl ExecutionContextId {
    /// The main frame's default world.
    pub const DEFAULT: Self = Self(0);

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }

    /// Returns `true` for the default world (id 0).
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ExecutionContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_id_roundtrip() {
        let id = TargetId::new("ABCDEF0123456789");
        assert_eq!(id.as_str(), "ABCDEF0123456789");
        assert_eq!(id.to_string(), "ABCDEF0123456789");

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"ABCDEF0123456789\"");

        let back: TargetId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_frame_id_from_target() {
        let target = TargetId::new("T1");
        let frame = FrameId::from(&target);
        assert_eq!(frame.as_str(), target.as_str());
    }

    #[test]
    fn test_call_id_transparent() {
        let id = CallId(42);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "42");
    }

    #[test]
    fn test_context_id_default() {
        assert!(ExecutionContextId::DEFAULT.is_default());
        assert!(!ExecutionContextId(7).is_default());
    }
}
