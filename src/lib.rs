//! Chrome DevTools Protocol client.
//!
//! An async client for driving Chromium-family browsers over the DevTools
//! WebSocket: sessions multiplexed over one connection, frame and
//! execution-context tracking across navigations, and stable element
//! handles with composed interactions.
//!
//! # Architecture
//!
//! ```text
//! Browser ──► Connection (writer + reader tasks, one socket)
//!                 │ replies: call-id → reply slot
//!                 │ events:  sessionId → session queue
//!                 ▼
//!             Session (event-loop task, per attached page)
//!                 │ frame/context state machine
//!                 ▼
//!             Element (object-id + captured context)
//! ```
//!
//! Key design points:
//!
//! - One WebSocket per browser; sessions attach with `flatten:true` and
//!   route by `sessionId`.
//! - Request ids are strictly monotonic; the reply slot is registered
//!   before the frame hits the wire, so replies never race registration.
//! - The element layer pins each handle to the execution context it was
//!   obtained in; a navigated-away handle fails locally with
//!   [`Error::StaleElementReference`], without a round-trip.
//! - Fatal session conditions (crash, destroy, detach, lost connection)
//!   latch: every blocked and subsequent call gets the same terminal error.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_cdp::{Browser, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // The embedding application launches the browser and captures the
//!     // "DevTools listening on ws://…" URL from its stderr.
//!     let browser = Browser::connect("ws://127.0.0.1:9222/devtools/browser/abc").await?;
//!     let page = browser.default_session().await?;
//!
//!     page.navigate("https://example.com").await?;
//!     let heading = page.query("h1").await?;
//!     println!("heading: {}", heading.get_text().await?);
//!
//!     browser.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Connection factory yielding [`Session`]s |
//! | [`session`] | Attached target: calls, subscriptions, event loop |
//! | [`element`] | DOM element handles and interactions |
//! | [`error`] | Error taxonomy and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message and domain types |
//! | [`transport`] | WebSocket connection internals |

// ============================================================================
// Modules
// ============================================================================

/// JS snippets installed by element operations.
mod atoms;

/// Browser factory.
pub mod browser;

/// Runtime/DOM domain calls.
mod dom;

/// Element handles and interactions.
pub mod element;

/// Emulation domain calls.
mod emulation;

/// Error types and result alias.
pub mod error;

/// Fetch-domain request interception.
pub mod fetch;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Input domain calls.
pub mod input;

/// Network domain calls.
mod network;

/// Page operations: navigation, tabs, queries, screenshots.
mod page;

/// Wire protocol message types.
pub mod protocol;

/// Session lifecycle and event dispatch.
pub mod session;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Core surface
pub use browser::Browser;
pub use element::Element;
pub use error::{Error, Result};
pub use session::{DEFAULT_DEADLINE, EventStream, Session, Subscription};

// Interception
pub use fetch::{ContinueOverrides, Interception, PausedRequest};
pub use protocol::devtool::{ErrorReason, HeaderEntry, RequestPattern};

// Identifiers
pub use identifiers::{CallId, ExecutionContextId, FrameId, ObjectId, SessionId, TargetId};

// Events and transport
pub use protocol::EventMessage;
pub use transport::{Connection, LOG_ERRORS, LOG_EVENTS, LOG_MESSAGES, LOG_VERBOSE};
