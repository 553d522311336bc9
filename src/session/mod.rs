//! Session: the debugging channel bound to one page target.
//!
//! A [`Session`] is created by attaching to a target with
//! `Target.attachToTarget{flatten:true}`. It owns one event-loop task that
//! consumes the transport's per-session queue, dispatches events to
//! subscribers in registration order, and applies the built-in lifecycle
//! transitions (context tracking, crash/destroy/detach latching).
//!
//! All public operations are bounded by the session deadline (default
//! 60 s). A fatal condition — target crash, target destruction, detach,
//! abnormal transport closure — is latched: every blocked and subsequent
//! call returns the same terminal kind without a round-trip.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `context` | frame → execution-context state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Frame/context state machine.
pub(crate) mod context;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, SessionId, TargetId};
use crate::protocol::devtool::TargetInfo;
use crate::protocol::{EventMessage, ParsedEvent};
use crate::transport::Connection;
use crate::transport::connection::SessionReceiver;

use self::context::ContextTracker;

// ============================================================================
// Constants
// ============================================================================

/// Default per-operation deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Capacity of a [`Session::listen`] stream.
const LISTEN_QUEUE_CAPACITY: usize = 10;

/// Protocol error message Chrome emits for calls into a dead context.
const STALE_CONTEXT_MESSAGE: &str = "Cannot find context with specified id";

// ============================================================================
// Subscription registry
// ============================================================================

/// Callback invoked on the session event loop for each matching event.
///
/// Must be quick; post long-running work onto another task.
pub type EventCallback = dyn Fn(&EventMessage) + Send + Sync;

struct SubscriptionEntry {
    token: u64,
    method: String,
    callback: Arc<EventCallback>,
}

#[derive(Default)]
struct SubscriptionRegistry {
    next_token: u64,
    /// Insertion order is dispatch order.
    entries: Vec<SubscriptionEntry>,
}

/// Handle to one registered callback; unsubscribes on drop.
pub struct Subscription {
    session: Weak<SessionInner>,
    token: u64,
}

impl Subscription {
    /// Removes the callback explicitly.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.session.upgrade() {
            let mut registry = inner.subscriptions.lock();
            registry.entries.retain(|entry| entry.token != self.token);
        }
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// Bounded stream of events for a set of methods.
///
/// Produced by [`Session::listen`]; dropping (or [`EventStream::stop`])
/// unsubscribes and closes the stream.
pub struct EventStream {
    receiver: mpsc::Receiver<EventMessage>,
    _subscriptions: Vec<Subscription>,
}

impl EventStream {
    /// Receives the next event, or `None` once stopped.
    pub async fn next(&mut self) -> Option<EventMessage> {
        self.receiver.recv().await
    }

    /// Unsubscribes and closes the stream.
    pub fn stop(self) {
        // Drop does the work.
    }
}

// ============================================================================
// SessionInner
// ============================================================================

pub(crate) struct SessionInner {
    /// Non-owning transport handle; the session never extends the
    /// connection's lifetime.
    connection: Weak<Connection>,
    session_id: SessionId,
    target_id: TargetId,
    pub(crate) context: ContextTracker,
    subscriptions: Mutex<SubscriptionRegistry>,
    deadline: Mutex<Duration>,
    /// Latched terminal error; first writer wins.
    fatal: Mutex<Option<Error>>,
    /// Flipped to `true` exactly once, when `fatal` is latched.
    fatal_tx: watch::Sender<bool>,
}

impl SessionInner {
    /// Latches a terminal error and wakes every blocked operation.
    fn fail(&self, err: Error) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            debug!(session = %self.session_id, error = %err, "session failed");
            *fatal = Some(err);
            let _ = self.fatal_tx.send(true);
        }
    }

    /// Returns the latched terminal kind.
    fn latched(&self) -> Error {
        self.fatal
            .lock()
            .as_ref()
            .map(Error::fatal_kind)
            .unwrap_or(Error::SessionClosed)
    }

    fn is_failed(&self) -> bool {
        self.fatal.lock().is_some()
    }
}

// ============================================================================
// Session
// ============================================================================

/// A debugging session attached to one page target.
///
/// Cheap to clone; all clones share the same underlying session. A
/// terminated session is permanently unusable.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field("target_id", &self.inner.target_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Attach
// ============================================================================

impl Session {
    /// Attaches to a page target and starts the event loop.
    ///
    /// Sequence (any failure aborts the attach):
    ///
    /// 1. `Target.setDiscoverTargets{discover:true}`
    /// 2. `Target.attachToTarget{targetId, flatten:true}` → `sessionId`,
    ///    register the event queue
    /// 3. spawn the event-loop task
    /// 4. enable `Page`, `Runtime`, `Network{maxPostDataSize:2048}` and
    ///    lifecycle events
    ///
    /// # Errors
    ///
    /// Any protocol failure from the steps above, [`Error::Timeout`], or
    /// [`Error::ConnectionClosed`].
    pub async fn attach(connection: &Arc<Connection>, target_id: TargetId) -> Result<Session> {
        raw_call(
            connection,
            None,
            "Target.setDiscoverTargets",
            json!({"discover": true}),
            DEFAULT_DEADLINE,
        )
        .await?;

        let reply = raw_call(
            connection,
            None,
            "Target.attachToTarget",
            json!({"targetId": target_id, "flatten": true}),
            DEFAULT_DEADLINE,
        )
        .await?;
        let session_id = reply
            .get("sessionId")
            .and_then(|v| v.as_str())
            .map(SessionId::new)
            .ok_or_else(|| Error::protocol(0, "attachToTarget reply without sessionId"))?;

        let receiver = connection.register(session_id.clone());

        let (fatal_tx, _) = watch::channel(false);
        let inner = Arc::new(SessionInner {
            connection: Arc::downgrade(connection),
            session_id: session_id.clone(),
            target_id: target_id.clone(),
            context: ContextTracker::new(FrameId::from(&target_id)),
            subscriptions: Mutex::new(SubscriptionRegistry::default()),
            deadline: Mutex::new(DEFAULT_DEADLINE),
            fatal: Mutex::new(None),
            fatal_tx,
        });

        tokio::spawn(event_loop(Arc::clone(&inner), receiver));

        let session = Session { inner };
        debug!(session = %session_id, target = %target_id, "attached");

        if let Err(err) = session.enable_domains().await {
            // Unregistering drops the queue senders; the event loop sees the
            // closed channel and winds itself down.
            connection.unregister(&session_id);
            return Err(err);
        }

        Ok(session)
    }

    /// Domain enables every fresh session needs, in order.
    async fn enable_domains(&self) -> Result<()> {
        self.call("Page.enable", json!({})).await?;
        self.call("Runtime.enable", json!({})).await?;
        // maxPostDataSize: longest POST body (bytes) inlined into
        // requestWillBeSent notifications.
        self.call("Network.enable", json!({"maxPostDataSize": 2048}))
            .await?;
        self.call("Page.setLifecycleEventsEnabled", json!({"enabled": true}))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the attached target id.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        &self.inner.target_id
    }

    /// Returns the protocol session id.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns the frame whose context operations currently run in.
    #[inline]
    #[must_use]
    pub fn current_frame(&self) -> FrameId {
        self.inner.context.frame()
    }

    /// Returns the per-operation deadline.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Duration {
        *self.inner.deadline.lock()
    }

    /// Sets the per-operation deadline.
    pub fn set_deadline(&self, deadline: Duration) {
        *self.inner.deadline.lock() = deadline;
    }

    /// Returns `true` once the session is terminally unusable.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        if self.inner.is_failed() {
            return true;
        }
        match self.inner.connection.upgrade() {
            Some(connection) => connection.is_closed(),
            None => true,
        }
    }

    /// Upgrades the weak transport handle.
    pub(crate) fn connection(&self) -> Result<Arc<Connection>> {
        self.inner
            .connection
            .upgrade()
            .ok_or(Error::ConnectionClosed)
    }
}

// ============================================================================
// Session - Calls
// ============================================================================

impl Session {
    /// Sends a method call on this session and awaits the reply.
    ///
    /// Resolves with the first of: the reply, the latched fatal error, or
    /// the deadline ([`Error::Timeout`]; the pending slot is reclaimed so a
    /// late reply is discarded).
    ///
    /// # Errors
    ///
    /// Protocol errors pass through as [`Error::Protocol`], except the
    /// dead-context message which maps to [`Error::StaleElementReference`].
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let mut fatal_rx = self.inner.fatal_tx.subscribe();
        if *fatal_rx.borrow_and_update() {
            return Err(self.inner.latched());
        }

        let connection = self.connection()?;
        let slot = connection.send(Some(self.inner.session_id.clone()), method, params);
        let deadline = self.deadline();

        tokio::select! {
            outcome = slot.rx => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(map_protocol_error(err)),
                Err(_) => Err(Error::ConnectionClosed),
            },
            _ = fatal_rx.changed() => Err(self.inner.latched()),
            _ = tokio::time::sleep(deadline) => {
                connection.abandon(slot.id);
                Err(Error::timeout(method))
            }
        }
    }

    /// Sends a method call and deserializes the reply.
    pub(crate) async fn call_into<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================================================
// Session - Subscriptions
// ============================================================================

impl Session {
    /// Registers a callback for one event method.
    ///
    /// Callbacks for the same method fire in registration order, on the
    /// session event loop, before the built-in lifecycle transitions.
    /// The returned handle unsubscribes on drop; an unsubscribe racing a
    /// dispatch may let the callback fire at most once more.
    pub fn subscribe<F>(&self, method: &str, callback: F) -> Subscription
    where
        F: Fn(&EventMessage) + Send + Sync + 'static,
    {
        let mut registry = self.inner.subscriptions.lock();
        registry.next_token += 1;
        let token = registry.next_token;
        registry.entries.push(SubscriptionEntry {
            token,
            method: method.to_string(),
            callback: Arc::new(callback),
        });
        Subscription {
            session: Arc::downgrade(&self.inner),
            token,
        }
    }

    /// Opens a bounded stream over the given event methods.
    ///
    /// A consumer that lags more than [`LISTEN_QUEUE_CAPACITY`] events
    /// behind sheds the overflow with a warning; transport-to-session
    /// delivery stays lossless either way.
    #[must_use]
    pub fn listen(&self, methods: &[&str]) -> EventStream {
        let (tx, receiver) = mpsc::channel(LISTEN_QUEUE_CAPACITY);
        let subscriptions = methods
            .iter()
            .map(|method| {
                let tx = tx.clone();
                self.subscribe(method, move |event| {
                    if tx.try_send(event.clone()).is_err() {
                        warn!(method = %event.method, "listen stream full, event shed");
                    }
                })
            })
            .collect();
        EventStream {
            receiver,
            _subscriptions: subscriptions,
        }
    }
}

// ============================================================================
// Session - Event waits
// ============================================================================

impl Session {
    /// Waits for the first stream event accepted by `pick`, bounded by the
    /// session deadline.
    ///
    /// Aborts with the latched terminal error if the session fails while
    /// waiting; deadline expiry yields `on_timeout`.
    pub(crate) async fn await_event<T, F>(
        &self,
        stream: &mut EventStream,
        on_timeout: Error,
        mut pick: F,
    ) -> Result<T>
    where
        F: FnMut(&EventMessage) -> Option<T>,
    {
        let mut fatal_rx = self.inner.fatal_tx.subscribe();
        if *fatal_rx.borrow_and_update() {
            return Err(self.inner.latched());
        }
        let deadline = self.deadline();

        let wait = async {
            while let Some(event) = stream.next().await {
                if let Some(value) = pick(&event) {
                    return Ok(value);
                }
            }
            Err(Error::SessionClosed)
        };

        tokio::select! {
            outcome = wait => outcome,
            _ = fatal_rx.changed() => Err(self.inner.latched()),
            _ = tokio::time::sleep(deadline) => Err(on_timeout),
        }
    }
}

// ============================================================================
// Session - Context
// ============================================================================

impl Session {
    /// Switches script evaluation to the given frame.
    ///
    /// The context for a non-main frame is created lazily by the next
    /// operation that needs it.
    pub fn switch_to(&self, frame_id: impl Into<FrameId>) {
        self.inner.context.set_frame(frame_id.into());
    }

    /// Switches script evaluation back to the main frame.
    pub fn main(&self) {
        self.inner.context.reset();
    }

    /// Resolves the current execution context, creating an isolated world
    /// for a pending frame.
    ///
    /// Concurrent callers share one creation; the whole wait is bounded by
    /// the session deadline.
    ///
    /// # Errors
    ///
    /// [`Error::LoadTimeout`] on deadline expiry; any failure of
    /// `Page.createIsolatedWorld`.
    pub(crate) async fn current_context(&self) -> Result<ExecutionContextId> {
        let deadline = self.deadline();
        tokio::time::timeout(deadline, self.resolve_context())
            .await
            .map_err(|_| Error::LoadTimeout)?
    }

    async fn resolve_context(&self) -> Result<ExecutionContextId> {
        loop {
            if let Some(id) = self.inner.context.peek() {
                return Ok(id);
            }
            let guard = self.inner.context.creation_guard().await;
            // A concurrent caller (or the browser itself) may have produced
            // the context while we queued for the guard.
            if let Some(id) = self.inner.context.peek() {
                return Ok(id);
            }
            let ready = self.inner.context.ready();
            match self.inner.context.pending_frame() {
                Some(frame) => {
                    let id = self.create_isolated_world(&frame).await?;
                    self.inner.context.install_created(&frame, id);
                    return Ok(id);
                }
                None => {
                    // State moved under us; wait for the next Live transition.
                    drop(guard);
                    ready.await;
                }
            }
        }
    }
}

// ============================================================================
// Session - Target domain
// ============================================================================

impl Session {
    /// Lists all targets known to the browser.
    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>> {
        let reply = self.call("Target.getTargets", json!({})).await?;
        let infos = reply.get("targetInfos").cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(infos)?)
    }

    /// Brings this session's target to the foreground.
    pub async fn activate(&self) -> Result<()> {
        self.call(
            "Target.activateTarget",
            json!({"targetId": self.inner.target_id}),
        )
        .await
        .map(drop)
    }

    /// Detaches the debugger from this target, leaving the page running.
    pub async fn detach(&self) -> Result<()> {
        self.call(
            "Target.detachFromTarget",
            json!({"sessionId": self.inner.session_id}),
        )
        .await
        .map(drop)
    }

    /// Closes the target (the tab) and terminates the session.
    ///
    /// `Target.targetDestroyed` can arrive before the reply; a session that
    /// latched terminal state mid-call counts as successfully closed.
    pub async fn close(&self) -> Result<()> {
        match self
            .call(
                "Target.closeTarget",
                json!({"targetId": self.inner.target_id}),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if err.is_fatal() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

// ============================================================================
// Raw calls
// ============================================================================

/// One deadline-bounded call outside any session (browser-level traffic
/// and the attach handshake itself).
pub(crate) async fn raw_call(
    connection: &Connection,
    session_id: Option<SessionId>,
    method: &str,
    params: Value,
    deadline: Duration,
) -> Result<Value> {
    let slot = connection.send(session_id, method, params);
    match tokio::time::timeout(deadline, slot.rx).await {
        Ok(Ok(outcome)) => outcome.map_err(map_protocol_error),
        Ok(Err(_)) => Err(Error::ConnectionClosed),
        Err(_) => {
            connection.abandon(slot.id);
            Err(Error::timeout(method))
        }
    }
}

/// Maps wire-level errors onto the crate taxonomy.
fn map_protocol_error(err: Error) -> Error {
    match err {
        Error::Protocol { message, .. } if message == STALE_CONTEXT_MESSAGE => {
            Error::StaleElementReference
        }
        other => other,
    }
}

// ============================================================================
// Event loop
// ============================================================================

/// Consumes the transport queue until a terminal condition.
async fn event_loop(inner: Arc<SessionInner>, mut receiver: SessionReceiver) {
    loop {
        tokio::select! {
            event = receiver.events.recv() => match event {
                Some(event) => {
                    if !handle_event(&inner, &event) {
                        break;
                    }
                }
                None => {
                    inner.fail(Error::ConnectionClosed);
                    break;
                }
            },
            fault = receiver.fault.recv() => {
                inner.fail(fault.unwrap_or(Error::ConnectionClosed));
                break;
            }
        }
    }

    if let Some(connection) = inner.connection.upgrade() {
        connection.unregister(&inner.session_id);
    }
    debug!(session = %inner.session_id, "event loop terminated");
}

/// Dispatches one event; returns `false` when the loop must stop.
fn handle_event(inner: &Arc<SessionInner>, event: &EventMessage) -> bool {
    // User subscribers first, in registration order. The registry is
    // snapshotted so a callback may unsubscribe mid-dispatch.
    let callbacks: Vec<Arc<EventCallback>> = {
        let registry = inner.subscriptions.lock();
        registry
            .entries
            .iter()
            .filter(|entry| entry.method == event.method)
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    };
    for callback in callbacks {
        callback(event);
    }

    match event.parse() {
        ParsedEvent::ExecutionContextCreated(created) => {
            if let Some(frame) = created.context.frame_id() {
                inner.context.on_context_created(&frame, created.context.id);
            }
            true
        }
        ParsedEvent::ExecutionContextDestroyed(destroyed) => {
            inner
                .context
                .on_context_destroyed(destroyed.execution_context_id);
            true
        }
        ParsedEvent::ExecutionContextsCleared => {
            inner.context.reset();
            true
        }
        ParsedEvent::TargetCrashed(crashed) => {
            inner.fail(Error::target_crashed(crashed.status));
            false
        }
        ParsedEvent::TargetDestroyed(destroyed)
            if destroyed.target_id == inner.target_id =>
        {
            inner.fail(Error::TargetDestroyed);
            false
        }
        ParsedEvent::DetachedFromTarget(detached)
            if detached.session_id == inner.session_id =>
        {
            inner.fail(Error::SessionClosed);
            false
        }
        _ => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
