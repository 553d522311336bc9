//! Input domain: synthesized mouse and keyboard events.
//!
//! Only the control keys element operations need are defined here; a full
//! key table is a concern of higher layers.

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;

use crate::error::Result;
use crate::session::Session;

// ============================================================================
// Event type constants
// ============================================================================

pub(crate) const MOUSE_MOVED: &str = "mouseMoved";
pub(crate) const MOUSE_PRESSED: &str = "mousePressed";
pub(crate) const MOUSE_RELEASED: &str = "mouseReleased";

const KEY_DOWN: &str = "keyDown";
const KEY_UP: &str = "keyUp";

// ============================================================================
// KeyDefinition
// ============================================================================

/// Minimal description of one key for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Copy)]
pub struct KeyDefinition {
    /// DOM key value (`"Enter"`, `"Tab"`, …).
    pub key: &'static str,
    /// Windows virtual key code.
    pub key_code: i64,
    /// Text produced by the key, when any.
    pub text: &'static str,
}

/// Looks up the control keys the typing path dispatches as key events
/// rather than inserted text.
#[must_use]
pub(crate) fn key_definition(c: char) -> Option<KeyDefinition> {
    match c {
        '\n' | '\r' => Some(KeyDefinition {
            key: "Enter",
            key_code: 13,
            text: "\r",
        }),
        '\t' => Some(KeyDefinition {
            key: "Tab",
            key_code: 9,
            text: "",
        }),
        '\u{8}' => Some(KeyDefinition {
            key: "Backspace",
            key_code: 8,
            text: "",
        }),
        '\u{1b}' => Some(KeyDefinition {
            key: "Escape",
            key_code: 27,
            text: "",
        }),
        _ => None,
    }
}

// ============================================================================
// Session - Input domain
// ============================================================================

impl Session {
    /// Dispatches one mouse event at viewport coordinates.
    pub(crate) async fn dispatch_mouse_event(
        &self,
        x: f64,
        y: f64,
        event_type: &str,
        button: &str,
    ) -> Result<()> {
        self.call(
            "Input.dispatchMouseEvent",
            json!({
                "type": event_type,
                "button": button,
                "x": x,
                "y": y,
                "clickCount": 1,
            }),
        )
        .await
        .map(drop)
    }

    /// Moves the mouse to viewport coordinates.
    pub async fn mouse_move(&self, x: f64, y: f64) -> Result<()> {
        self.dispatch_mouse_event(x, y, MOUSE_MOVED, "none").await
    }

    /// Emulates inserting text that does not come from key presses
    /// (IME, emoji keyboard).
    pub async fn insert_text(&self, text: &str) -> Result<()> {
        self.call("Input.insertText", json!({"text": text}))
            .await
            .map(drop)
    }

    /// Presses one key: a `keyDown`/`keyUp` pair.
    pub async fn press(&self, key: KeyDefinition) -> Result<()> {
        let text = if key.text.is_empty() { key.key } else { key.text };
        self.call(
            "Input.dispatchKeyEvent",
            json!({
                "type": KEY_DOWN,
                "key": key.key,
                "windowsVirtualKeyCode": key.key_code,
                "text": text,
            }),
        )
        .await?;
        self.call(
            "Input.dispatchKeyEvent",
            json!({
                "type": KEY_UP,
                "key": key.key,
                "text": text,
            }),
        )
        .await
        .map(drop)
    }

    /// Sends characters one by one: control keys as key events, the rest
    /// as inserted text.
    pub async fn send_keys(&self, text: &str) -> Result<()> {
        for c in text.chars() {
            match key_definition(c) {
                Some(key) => self.press(key).await?,
                None => self.insert_text(&c.to_string()).await?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
