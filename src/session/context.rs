//! Frame → execution-context state machine.
//!
//! Each session evaluates JavaScript in exactly one context at a time:
//! the main frame's default world (id 0) or an isolated world created in a
//! child frame. The browser creates and destroys contexts asynchronously,
//! so the tracker holds one of two states:
//!
//! ```text
//!  Live { frame, id }     context is usable
//!  Pending { frame }      context must be (re)created before use
//!
//!  navigate/reload        → Live { main, 0 }
//!  switch_to(frame)       → Pending { frame }   (or Live{main,0} for main)
//!  executionContextCreated(frame, id) → Live { frame, id }
//!  executionContextDestroyed(id) while Live(_, id) → Pending { frame }
//!  executionContextsCleared → Live { main, 0 }
//! ```
//!
//! `Pending` resolves lazily: the first caller that needs the context
//! creates an isolated world; concurrent callers serialize on
//! [`ContextTracker::creation_guard`] so exactly one world is created per
//! frame. Every transition to `Live` wakes waiters.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

use crate::identifiers::{ExecutionContextId, FrameId};

// ============================================================================
// ContextState
// ============================================================================

/// Current binding between the tracked frame and a JS context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContextState {
    /// Context is live and usable.
    Live {
        /// Frame the context belongs to.
        frame: FrameId,
        /// The context id (0 = main frame default world).
        id: ExecutionContextId,
    },
    /// Context needs (re)creation before the next use.
    Pending {
        /// Frame a context must be created in.
        frame: FrameId,
    },
}

// ============================================================================
// ContextTracker
// ============================================================================

/// Per-session frame/context tracker.
pub(crate) struct ContextTracker {
    /// The main frame id (equals the target id).
    main_frame: FrameId,
    /// Current state.
    state: Mutex<ContextState>,
    /// Woken on every transition to `Live`.
    ready: Notify,
    /// Serializes isolated-world creation across concurrent readers.
    creating: tokio::sync::Mutex<()>,
}

impl ContextTracker {
    /// Creates a tracker bound to the main frame's default world.
    pub(crate) fn new(main_frame: FrameId) -> Self {
        Self {
            state: Mutex::new(ContextState::Live {
                frame: main_frame.clone(),
                id: ExecutionContextId::DEFAULT,
            }),
            main_frame,
            ready: Notify::new(),
            creating: tokio::sync::Mutex::new(()),
        }
    }

    /// Resets to the main frame's default world and wakes waiters.
    ///
    /// Called on successful navigation, on reload and on
    /// `Runtime.executionContextsCleared`.
    pub(crate) fn reset(&self) {
        *self.state.lock() = ContextState::Live {
            frame: self.main_frame.clone(),
            id: ExecutionContextId::DEFAULT,
        };
        trace!(frame = %self.main_frame, "context reset to main frame");
        self.ready.notify_waiters();
    }

    /// Switches the tracked frame. Idempotent.
    ///
    /// The main frame goes straight to `Live` with the default world;
    /// any other frame becomes `Pending` until a context is created.
    pub(crate) fn set_frame(&self, frame: FrameId) {
        if frame == self.main_frame {
            self.reset();
            return;
        }
        let mut state = self.state.lock();
        let tracked = match &*state {
            ContextState::Live { frame, .. } | ContextState::Pending { frame } => frame,
        };
        if *tracked == frame {
            // Idempotent; a live context for this frame stays live.
            return;
        }
        *state = ContextState::Pending { frame };
    }

    /// Records a context created by the browser for the tracked frame.
    ///
    /// Contexts for other frames are ignored.
    pub(crate) fn on_context_created(&self, frame: &FrameId, id: ExecutionContextId) {
        let mut state = self.state.lock();
        let tracked = match &*state {
            ContextState::Live { frame, .. } | ContextState::Pending { frame } => frame,
        };
        if tracked == frame {
            *state = ContextState::Live {
                frame: frame.clone(),
                id,
            };
            drop(state);
            trace!(frame = %frame, context = %id, "context live");
            self.ready.notify_waiters();
        }
    }

    /// Marks the context pending again if the destroyed id is the live one.
    pub(crate) fn on_context_destroyed(&self, id: ExecutionContextId) {
        let mut state = self.state.lock();
        if let ContextState::Live { frame, id: live } = &*state
            && *live == id
        {
            trace!(frame = %frame, context = %id, "context destroyed");
            *state = ContextState::Pending {
                frame: frame.clone(),
            };
        }
    }

    /// Returns the live context id without waiting, or `None` if pending.
    pub(crate) fn peek(&self) -> Option<ExecutionContextId> {
        match &*self.state.lock() {
            ContextState::Live { id, .. } => Some(*id),
            ContextState::Pending { .. } => None,
        }
    }

    /// Returns the frame a pending context must be created in, or `None`
    /// when the state is live.
    pub(crate) fn pending_frame(&self) -> Option<FrameId> {
        match &*self.state.lock() {
            ContextState::Pending { frame } => Some(frame.clone()),
            ContextState::Live { .. } => None,
        }
    }

    /// Returns the currently tracked frame.
    pub(crate) fn frame(&self) -> FrameId {
        match &*self.state.lock() {
            ContextState::Live { frame, .. } | ContextState::Pending { frame } => frame.clone(),
        }
    }

    /// Installs the id obtained from `Page.createIsolatedWorld`.
    ///
    /// Ignored if the tracked frame changed while the world was being
    /// created (a navigation raced the creation).
    pub(crate) fn install_created(&self, frame: &FrameId, id: ExecutionContextId) {
        self.on_context_created(frame, id);
    }

    /// Future resolving on the next transition to `Live`.
    pub(crate) fn ready(&self) -> tokio::sync::futures::Notified<'_> {
        self.ready.notified()
    }

    /// Guard serializing isolated-world creation.
    pub(crate) async fn creation_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.creating.lock().await
    }
}

// ============================================================================
// Tests
// ============================================================================
