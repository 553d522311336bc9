//! WebSocket transport layer.
//!
//! One [`Connection`] per browser process, multiplexing any number of
//! attached sessions over the single DevTools socket.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Connection                       │
//! │  writer task ──► socket ──► reader task              │
//! │     ▲                          │                     │
//! │  send(id, method)        reply slots / event queues  │
//! │     │                          ▼                     │
//! │  Session A     Session B     Session C               │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Replies resolve single-shot slots keyed by call id; events route to the
//! queue registered for their `sessionId` (or broadcast when absent).

// ============================================================================
// Submodules
// ============================================================================

/// Connection, correlation tables and I/O loops.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, LOG_ERRORS, LOG_EVENTS, LOG_MESSAGES, LOG_VERBOSE};
