//! In-process mock DevTools endpoint.
//!
//! Binds a real WebSocket server on a random localhost port and answers
//! client calls through a scripted responder. Tests drive the public
//! client API against it; no browser involved.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// The session id the default responder hands out for the first attach.
pub const SESSION_ONE: &str = "SESSION-1";

/// The page target id tests attach to by default.
pub const TARGET_ONE: &str = "TARGET-1";

// ============================================================================
// Reply / Outcome
// ============================================================================

/// How the mock answers one call.
pub enum Reply {
    /// Success result payload.
    Result(Value),
    /// Error reply.
    Error { code: i64, message: String },
    /// No reply at all (the call hangs).
    Ignore,
}

/// Reply plus any event frames pushed right after it.
pub struct Outcome {
    pub reply: Reply,
    pub events: Vec<Value>,
}

/// Successful reply.
pub fn ok(result: Value) -> Outcome {
    Outcome {
        reply: Reply::Result(result),
        events: Vec::new(),
    }
}

/// Successful reply followed by event frames.
pub fn ok_with_events(result: Value, events: Vec<Value>) -> Outcome {
    Outcome {
        reply: Reply::Result(result),
        events,
    }
}

/// Error reply.
pub fn err(code: i64, message: &str) -> Outcome {
    Outcome {
        reply: Reply::Error {
            code,
            message: message.to_string(),
        },
        events: Vec::new(),
    }
}

/// No reply; the client call blocks until its deadline.
pub fn ignore() -> Outcome {
    Outcome {
        reply: Reply::Ignore,
        events: Vec::new(),
    }
}

/// Builds one event frame routed to a session (or broadcast when `None`).
pub fn event(method: &str, params: Value, session: Option<&str>) -> Value {
    let mut frame = json!({"method": method, "params": params});
    if let Some(session) = session {
        frame["sessionId"] = json!(session);
    }
    frame
}

/// Answers the attach handshake and domain enables; `None` for anything
/// else. `attach_count` makes successive attaches hand out
/// `SESSION-1`, `SESSION-2`, ….
pub fn attach_responder(method: &str, attach_count: &mut usize) -> Option<Outcome> {
    match method {
        "Target.setDiscoverTargets"
        | "Page.enable"
        | "Runtime.enable"
        | "Network.enable"
        | "Page.setLifecycleEventsEnabled" => Some(ok(json!({}))),
        "Target.attachToTarget" => {
            *attach_count += 1;
            Some(ok(json!({"sessionId": format!("SESSION-{attach_count}")})))
        }
        "Target.getTargets" => Some(ok(json!({
            "targetInfos": [
                {"targetId": TARGET_ONE, "type": "page", "title": "", "url": "about:blank", "attached": false}
            ]
        }))),
        _ => None,
    }
}

// ============================================================================
// MockBrowser
// ============================================================================

/// Handle to the running mock endpoint.
pub struct MockBrowser {
    /// `ws://…` URL to connect the client to.
    pub url: String,
    /// Push extra event frames at any time.
    pub events: mpsc::UnboundedSender<Value>,
    /// Every `(method, params)` the mock received, in arrival order.
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    server: JoinHandle<()>,
}

impl MockBrowser {
    /// Starts the endpoint with the given responder.
    pub async fn spawn<F>(mut responder: F) -> MockBrowser
    where
        F: FnMut(&str, &Value) -> Outcome + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock endpoint");
        let addr = listener.local_addr().expect("local addr");
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Value>();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("websocket handshake");
            let (mut write, mut read) = ws.split();
            let mut events_open = true;

            loop {
                tokio::select! {
                    message = read.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            let frame: Value =
                                serde_json::from_str(text.as_str()).expect("client sends JSON");
                            let id = frame["id"].clone();
                            let method = frame["method"].as_str().unwrap_or_default().to_string();
                            let params = frame["params"].clone();
                            let session = frame["sessionId"].clone();
                            recorded
                                .lock()
                                .expect("calls lock")
                                .push((method.clone(), params.clone()));

                            let outcome = responder(&method, &params);
                            match outcome.reply {
                                Reply::Result(result) => {
                                    let mut reply = json!({"id": id, "result": result});
                                    if !session.is_null() {
                                        reply["sessionId"] = session;
                                    }
                                    if write
                                        .send(Message::Text(reply.to_string().into()))
                                        .await
                                        .is_err()
                                    {
                                        break;
                                    }
                                }
                                Reply::Error { code, message } => {
                                    let reply = json!({
                                        "id": id,
                                        "error": {"code": code, "message": message},
                                    });
                                    if write
                                        .send(Message::Text(reply.to_string().into()))
                                        .await
                                        .is_err()
                                    {
                                        break;
                                    }
                                }
                                Reply::Ignore => {}
                            }
                            for frame in outcome.events {
                                if write
                                    .send(Message::Text(frame.to_string().into()))
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(_)) => break,
                        _ => {}
                    },
                    pushed = event_rx.recv(), if events_open => match pushed {
                        Some(frame) => {
                            if write
                                .send(Message::Text(frame.to_string().into()))
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        None => events_open = false,
                    },
                }
            }
        });

        MockBrowser {
            url: format!("ws://{addr}"),
            events: event_tx,
            calls,
            server,
        }
    }

    /// Methods received so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Params of the first call to `method`, if any.
    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }
}

impl Drop for MockBrowser {
    fn drop(&mut self) {
        self.server.abort();
    }
}
