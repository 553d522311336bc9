//! WebSocket connection, reply correlation and event fan-out.
//!
//! One [`Connection`] owns the socket to the browser's DevTools endpoint.
//! Two tasks run for its lifetime:
//!
//! - **writer**: serializes outbound calls; registers the reply slot in the
//!   pending table immediately before the socket write, so a reply can never
//!   arrive while its slot is missing.
//! - **reader**: decodes inbound frames; resolves pending slots for replies
//!   and routes events to registered session queues (frames carrying a
//!   `sessionId` go to that session only; the rest broadcast).
//!
//! Closure is classified: a Close frame or clean stream end is graceful,
//! anything else abnormal. Both resolve every pending slot with
//! [`Error::ConnectionClosed`] and fault every registered session.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CallId, SessionId};
use crate::protocol::{EventMessage, MethodCall, WireFrame};

// ============================================================================
// Constants
// ============================================================================

/// Capacity of each session's event queue.
pub(crate) const EVENT_QUEUE_CAPACITY: usize = 16;

/// How long the reader blocks on a full session queue before declaring the
/// session overwhelmed.
const OVERWHELMED_AFTER: Duration = Duration::from_millis(500);

/// Log protocol errors.
pub const LOG_ERRORS: u8 = 0x01;
/// Log outbound calls and inbound replies.
pub const LOG_MESSAGES: u8 = 0x02;
/// Log inbound events.
pub const LOG_EVENTS: u8 = 0x04;
/// Log everything.
pub const LOG_VERBOSE: u8 = 0xFF;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of call ids to single-shot reply slots.
type PendingMap = FxHashMap<CallId, oneshot::Sender<Result<Value>>>;

/// Map of session ids to their delivery queues.
type SessionMap = FxHashMap<SessionId, SessionQueue>;

// ============================================================================
// SessionQueue
// ============================================================================

/// Delivery channels for one registered session.
pub(crate) struct SessionQueue {
    /// Ordered event delivery; bounded.
    events: mpsc::Sender<EventMessage>,
    /// Terminal fault delivery; capacity 1, first fault wins.
    fault: mpsc::Sender<Error>,
}

impl SessionQueue {
    /// Latches a terminal fault for the session. Later faults are dropped.
    fn raise(&self, err: Error) {
        let _ = self.fault.try_send(err);
    }
}

/// Receiving half handed to the session's event loop.
pub(crate) struct SessionReceiver {
    /// Ordered event stream.
    pub events: mpsc::Receiver<EventMessage>,
    /// Terminal fault, if any.
    pub fault: mpsc::Receiver<Error>,
}

// ============================================================================
// ReplySlot
// ============================================================================

/// Pending reply for one outbound call.
///
/// Await [`ReplySlot::rx`]; on deadline expiry call
/// [`Connection::abandon`] with [`ReplySlot::id`] so the pending entry is
/// reclaimed and a late reply is discarded instead of delivered.
pub(crate) struct ReplySlot {
    /// The allocated call id.
    pub id: CallId,
    /// Resolves exactly once with the reply or a terminal error.
    pub rx: oneshot::Receiver<Result<Value>>,
}

// ============================================================================
// WriterCommand
// ============================================================================

/// Commands consumed by the writer task.
enum WriterCommand {
    /// Serialize and send a call; the slot is registered just before the
    /// write.
    Send {
        call: MethodCall,
        reply_tx: oneshot::Sender<Result<Value>>,
    },
    /// Send a WebSocket Close frame and stop writing.
    Close,
}

// ============================================================================
// Connection
// ============================================================================

/// Duplex channel to the browser's DevTools endpoint.
///
/// Cheap to share behind an [`Arc`]; sessions keep a `Weak` reference so a
/// dropped connection is observed rather than kept alive.
pub struct Connection {
    /// Writer task mailbox.
    command_tx: mpsc::UnboundedSender<WriterCommand>,
    /// Monotonic call id allocator, starts at 1.
    next_id: AtomicI64,
    /// Pending reply slots (shared with writer and reader).
    pending: Arc<Mutex<PendingMap>>,
    /// Registered session queues (shared with reader).
    sessions: Arc<Mutex<SessionMap>>,
    /// Set once either loop terminates.
    closed: Arc<AtomicBool>,
    /// Protocol trace bitmask (`LOG_*` constants); shared with the reader.
    log_mask: Arc<AtomicU8>,
}

impl Connection {
    /// Dials the DevTools WebSocket endpoint and starts the I/O tasks.
    ///
    /// # Errors
    ///
    /// [`Error::WebSocket`] if the dial fails.
    pub async fn connect(websocket_url: &str) -> Result<Arc<Self>> {
        let (stream, _) = connect_async(websocket_url).await?;
        debug!(url = %websocket_url, "devtools endpoint connected");
        Ok(Self::start(stream))
    }

    /// Starts the writer and reader tasks over an established stream.
    pub(crate) fn start(stream: WsStream) -> Arc<Self> {
        let (ws_write, ws_read) = stream.split();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let connection = Arc::new(Self {
            command_tx: command_tx.clone(),
            next_id: AtomicI64::new(1),
            pending: Arc::new(Mutex::new(PendingMap::default())),
            sessions: Arc::new(Mutex::new(SessionMap::default())),
            closed: Arc::new(AtomicBool::new(false)),
            log_mask: Arc::new(AtomicU8::new(LOG_ERRORS)),
        });

        tokio::spawn(Self::writer_loop(
            ws_write,
            command_rx,
            Arc::clone(&connection.pending),
            Arc::clone(&connection.sessions),
            Arc::clone(&connection.closed),
        ));
        tokio::spawn(Self::reader_loop(
            ws_read,
            command_tx,
            Arc::clone(&connection.pending),
            Arc::clone(&connection.sessions),
            Arc::clone(&connection.closed),
            Arc::clone(&connection.log_mask),
        ));

        connection
    }

    /// Sets the protocol trace bitmask.
    pub fn set_log_mask(&self, mask: u8) {
        self.log_mask.store(mask, Ordering::Relaxed);
    }

    /// Returns `true` if the given trace category is enabled.
    #[inline]
    fn logs(&self, category: u8) -> bool {
        self.log_mask.load(Ordering::Relaxed) & category == category
    }

    /// Returns `true` once either I/O loop has terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Allocates a call id and hands the call to the writer.
    ///
    /// The returned slot resolves exactly once: with the reply `result`,
    /// with the reply `error` mapped to [`Error::Protocol`], or with
    /// [`Error::ConnectionClosed`].
    pub(crate) fn send(
        &self,
        session_id: Option<SessionId>,
        method: &str,
        params: Value,
    ) -> ReplySlot {
        let id = CallId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply_tx, rx) = oneshot::channel();

        if self.is_closed() {
            let _ = reply_tx.send(Err(Error::ConnectionClosed));
            return ReplySlot { id, rx };
        }

        if self.logs(LOG_MESSAGES) {
            debug!(id = %id, method, "send");
        }

        let call = MethodCall::new(id, session_id, method, params);
        if let Err(mpsc::error::SendError(command)) =
            self.command_tx.send(WriterCommand::Send { call, reply_tx })
            && let WriterCommand::Send { reply_tx, .. } = command
        {
            let _ = reply_tx.send(Err(Error::ConnectionClosed));
        }

        ReplySlot { id, rx }
    }

    /// Reclaims the pending slot of a call the caller gave up on.
    pub(crate) fn abandon(&self, id: CallId) {
        if self.pending.lock().remove(&id).is_some() {
            trace!(id = %id, "abandoned pending call");
        }
    }

    /// Registers a session for event delivery and returns its receivers.
    pub(crate) fn register(&self, session_id: SessionId) -> SessionReceiver {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (fault_tx, fault_rx) = mpsc::channel(1);
        self.sessions.lock().insert(
            session_id,
            SessionQueue {
                events: event_tx,
                fault: fault_tx,
            },
        );
        SessionReceiver {
            events: event_rx,
            fault: fault_rx,
        }
    }

    /// Removes a session from event delivery.
    pub(crate) fn unregister(&self, session_id: &SessionId) {
        self.sessions.lock().remove(session_id);
    }

    /// Sends a WebSocket Close frame; the reader observes the echo and
    /// winds the connection down gracefully.
    pub fn close(&self) {
        let _ = self.command_tx.send(WriterCommand::Close);
    }

    /// Number of calls still waiting for a reply.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    // ========================================================================
    // Writer loop
    // ========================================================================

    async fn writer_loop(
        mut ws_write: SplitSink<WsStream, Message>,
        mut command_rx: mpsc::UnboundedReceiver<WriterCommand>,
        pending: Arc<Mutex<PendingMap>>,
        sessions: Arc<Mutex<SessionMap>>,
        closed: Arc<AtomicBool>,
    ) {
        while let Some(command) = command_rx.recv().await {
            match command {
                WriterCommand::Send { call, reply_tx } => {
                    let text = match serde_json::to_string(&call) {
                        Ok(text) => text,
                        Err(err) => {
                            let _ = reply_tx.send(Err(Error::Json(err)));
                            continue;
                        }
                    };

                    // Slot must exist before the frame is on the wire.
                    pending.lock().insert(call.id, reply_tx);

                    if let Err(err) = ws_write.send(Message::Text(text.into())).await {
                        error!(error = %err, "websocket write failed");
                        if let Some(tx) = pending.lock().remove(&call.id) {
                            let _ = tx.send(Err(Error::ConnectionClosed));
                        }
                        break;
                    }
                }
                WriterCommand::Close => {
                    debug!("closing websocket");
                    let _ = ws_write.close().await;
                    break;
                }
            }
        }

        closed.store(true, Ordering::Release);
        Self::shutdown(&pending, &sessions);
        debug!("writer loop terminated");
    }

    // ========================================================================
    // Reader loop
    // ========================================================================

    async fn reader_loop(
        mut ws_read: SplitStream<WsStream>,
        command_tx: mpsc::UnboundedSender<WriterCommand>,
        pending: Arc<Mutex<PendingMap>>,
        sessions: Arc<Mutex<SessionMap>>,
        closed: Arc<AtomicBool>,
        log_mask: Arc<AtomicU8>,
    ) {
        loop {
            match ws_read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let mask = log_mask.load(Ordering::Relaxed);
                    Self::handle_frame(text.as_str(), &pending, &sessions, mask).await;
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("websocket closed by remote");
                    break;
                }
                Some(Err(err)) => {
                    error!(error = %err, "websocket read failed, abnormal closure");
                    break;
                }
                None => {
                    debug!("websocket stream ended");
                    break;
                }
                // Binary, Ping, Pong are not part of the protocol.
                _ => {}
            }
        }

        closed.store(true, Ordering::Release);
        Self::shutdown(&pending, &sessions);
        // Stop the writer as well; ignore failure if it is already gone.
        let _ = command_tx.send(WriterCommand::Close);
        debug!("reader loop terminated");
    }

    /// Decodes and dispatches one inbound frame.
    async fn handle_frame(
        text: &str,
        pending: &Mutex<PendingMap>,
        sessions: &Mutex<SessionMap>,
        log_mask: u8,
    ) {
        let frame: WireFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "undecodable frame discarded");
                return;
            }
        };

        if frame.is_event() {
            if log_mask & LOG_EVENTS == LOG_EVENTS {
                debug!(method = %frame.method, "event");
            }
            Self::dispatch_event(frame, sessions).await;
            return;
        }

        let slot = pending.lock().remove(&frame.id);
        let outcome = if frame.is_error() {
            let err = frame.error.unwrap_or_default();
            if log_mask & LOG_ERRORS == LOG_ERRORS {
                debug!(id = %frame.id, code = err.code, message = %err.message, "recv error");
            }
            Err(Error::protocol(err.code, err.message))
        } else {
            if log_mask & LOG_MESSAGES == LOG_MESSAGES {
                debug!(id = %frame.id, "recv");
            }
            Ok(frame.result.unwrap_or(Value::Null))
        };
        match slot {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => {
                warn!(id = %frame.id, "reply for unknown call discarded");
            }
        }
    }

    /// Routes an event to its session, or broadcasts it.
    ///
    /// Delivery applies back-pressure: a full queue blocks the reader for
    /// up to [`OVERWHELMED_AFTER`], after which the session is faulted with
    /// [`Error::Overwhelmed`] and dropped from the routing table. Events are
    /// never silently discarded for a live session.
    async fn dispatch_event(frame: WireFrame, sessions: &Mutex<SessionMap>) {
        let event = EventMessage::new(frame.method, frame.params);

        let targets: Vec<(SessionId, mpsc::Sender<EventMessage>)> = {
            let table = sessions.lock();
            match frame.session_id {
                Some(session_id) => table
                    .get(&session_id)
                    .map(|queue| (session_id.clone(), queue.events.clone()))
                    .into_iter()
                    .collect(),
                None => table
                    .iter()
                    .map(|(id, queue)| (id.clone(), queue.events.clone()))
                    .collect(),
            }
        };

        for (session_id, events) in targets {
            let send = tokio::time::timeout(OVERWHELMED_AFTER, events.send(event.clone()));
            match send.await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    // Receiver dropped; session is tearing down on its own.
                    sessions.lock().remove(&session_id);
                }
                Err(_) => {
                    warn!(session = %session_id, "session queue overwhelmed");
                    if let Some(queue) = sessions.lock().remove(&session_id) {
                        queue.raise(Error::Overwhelmed);
                    }
                }
            }
        }
    }

    /// Terminal cleanup shared by both loops; idempotent.
    fn shutdown(pending: &Mutex<PendingMap>, sessions: &Mutex<SessionMap>) {
        let slots: Vec<_> = pending.lock().drain().collect();
        let count = slots.len();
        for (_, tx) in slots {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }
        if count > 0 {
            debug!(count, "failed pending calls on shutdown");
        }

        let queues: Vec<_> = sessions.lock().drain().collect();
        for (_, queue) in queues {
            queue.raise(Error::ConnectionClosed);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
