//! DOM element handles and composed interactions.
//!
//! An [`Element`] is a remote-object handle plus the execution context it
//! was obtained in. The context pins staleness: once the session's current
//! context moves on (navigation, frame swap, context destruction), every
//! method on the old handle returns
//! [`StaleElementReference`](Error::StaleElementReference) locally, without
//! a round-trip.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::{Value, json};
use tracing::debug;

use crate::atoms;
use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, ObjectId};
use crate::input::{MOUSE_MOVED, MOUSE_PRESSED, MOUSE_RELEASED};
use crate::protocol::devtool::{Rect, RemoteObject};
use crate::session::Session;

// ============================================================================
// Element
// ============================================================================

/// A handle to a DOM node in a page.
///
/// Produced by [`Session::query`] / [`Session::query_all`]. Handles are
/// cheap; the remote object is released when its context is destroyed, or
/// eagerly via [`Element::release`].
#[derive(Clone)]
pub struct Element {
    session: Session,
    object_id: ObjectId,
    context: ExecutionContextId,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("object_id", &self.object_id)
            .field("context", &self.context)
            .finish()
    }
}

// ============================================================================
// Element - Construction and state
// ============================================================================

impl Element {
    pub(crate) fn new(session: Session, object_id: ObjectId, context: ExecutionContextId) -> Self {
        Self {
            session,
            object_id,
            context,
        }
    }

    /// Returns the remote object id.
    #[inline]
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    /// Returns the execution context the element was captured in.
    #[inline]
    #[must_use]
    pub fn context(&self) -> ExecutionContextId {
        self.context
    }

    /// Returns `true` if the session has moved to a different execution
    /// context, so this handle no longer refers to a live node.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.session.inner.context.peek() != Some(self.context)
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.is_detached() {
            return Err(Error::StaleElementReference);
        }
        Ok(())
    }

    /// Releases the remote object handle in the browser.
    pub async fn release(self) -> Result<()> {
        self.session.release_object(&self.object_id).await
    }
}

// ============================================================================
// Element - Script plumbing
// ============================================================================

impl Element {
    /// Calls a function literal with this element as `this`.
    async fn call(&self, declaration: &str, args: Vec<Value>) -> Result<RemoteObject> {
        self.ensure_attached()?;
        self.session
            .call_function_on(&self.object_id, declaration, args, false)
            .await
    }

    /// Calls a function literal and returns its value.
    ///
    /// For example ``element.call_function("function(){return this.id}", vec![])``.
    pub async fn call_function(&self, declaration: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.call(declaration, args).await?.value)
    }

    async fn dispatch_events(&self, events: &[&str]) -> Result<()> {
        self.call(atoms::DISPATCH_EVENTS, vec![json!(events)])
            .await
            .map(drop)
    }

    /// Midpoint of the first visible content quad, viewport-clamped.
    async fn clickable_point(&self) -> Result<(f64, f64)> {
        let quad = self
            .session
            .get_content_quads(&self.object_id, true)
            .await?;
        Ok(quad.middle())
    }
}

// ============================================================================
// Element - Mouse
// ============================================================================

impl Element {
    /// Clicks the element at its quad midpoint, with miss-click detection.
    ///
    /// A one-shot capture-phase listener flips an expando flag only when
    /// the hit-tested node is this element or a descendant; an overlay
    /// swallowing the click leaves the flag unset and the method returns
    /// [`Error::ClickFailed`].
    ///
    /// A click that navigates away or closes the page destroys the context
    /// before the flag can be read; that counts as success.
    pub async fn click(&self) -> Result<()> {
        self.ensure_attached()?;
        self.session
            .scroll_into_view_if_needed(&self.object_id)
            .await?;
        let (x, y) = self.clickable_point().await?;
        self.call(atoms::PREVENT_MISS_CLICK, vec![]).await?;

        self.session
            .dispatch_mouse_event(x, y, MOUSE_MOVED, "none")
            .await?;
        self.session
            .dispatch_mouse_event(x, y, MOUSE_PRESSED, "left")
            .await?;
        self.session
            .dispatch_mouse_event(x, y, MOUSE_RELEASED, "left")
            .await?;

        match self.call(atoms::CLICK_DONE, vec![]).await {
            Ok(flag) if flag.as_bool() => Ok(()),
            Ok(_) => Err(Error::ClickFailed),
            Err(Error::StaleElementReference) => Ok(()),
            Err(err) if err.is_fatal() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Moves the mouse over the element.
    pub async fn hover(&self) -> Result<()> {
        self.ensure_attached()?;
        self.session
            .scroll_into_view_if_needed(&self.object_id)
            .await?;
        let (x, y) = self.clickable_point().await?;
        self.session.mouse_move(x, y).await
    }
}

// ============================================================================
// Element - Keyboard and forms
// ============================================================================

impl Element {
    /// Replaces the element's content with `text` in one insert.
    ///
    /// Sequence: scroll into view, visibility check, clear, focus,
    /// `Input.insertText`, then synthetic `keypress`, `input`, `keyup`,
    /// `change` events for listeners that expect keystrokes.
    pub async fn insert_text(&self, text: &str) -> Result<()> {
        debug!(object = %self.object_id, "insert text");
        self.ensure_attached()?;
        self.session
            .scroll_into_view_if_needed(&self.object_id)
            .await?;
        if !self.is_visible().await? {
            return Err(Error::ElementInvisible);
        }
        self.call(atoms::CLEAR_INPUT, vec![]).await?;
        self.focus().await?;
        self.session.insert_text(text).await?;
        self.dispatch_events(&["keypress", "input", "keyup", "change"])
            .await
    }

    /// Types character by character: control characters as key events,
    /// everything else as inserted text.
    pub async fn type_text(&self, text: &str) -> Result<()> {
        debug!(object = %self.object_id, "type text");
        self.ensure_attached()?;
        self.session
            .scroll_into_view_if_needed(&self.object_id)
            .await?;
        self.call(atoms::CLEAR_INPUT, vec![]).await?;
        self.focus().await?;
        self.session.send_keys(text).await
    }

    /// Focuses the element.
    pub async fn focus(&self) -> Result<()> {
        self.ensure_attached()?;
        self.session.focus_object(&self.object_id).await
    }

    /// Sets the files of a file input.
    pub async fn upload(&self, files: &[&str]) -> Result<()> {
        self.ensure_attached()?;
        self.session
            .set_file_input_files(&self.object_id, files)
            .await
    }

    /// Selects the options with the given values.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidElementSelect`] when the node is not a `<select>`;
    /// [`Error::InvalidElementOption`] when a value has no option.
    pub async fn select(&self, values: &[&str]) -> Result<()> {
        let node = {
            self.ensure_attached()?;
            self.session.describe_node(&self.object_id).await?
        };
        if node.node_name != "SELECT" {
            return Err(Error::InvalidElementSelect);
        }
        let contains = self
            .call(atoms::SELECT_CONTAINS, vec![json!(values)])
            .await?;
        if !contains.as_bool() {
            return Err(Error::InvalidElementOption {
                value: values.join(", "),
            });
        }
        self.call(atoms::SELECT, vec![json!(values)]).await?;
        self.dispatch_events(&["input", "change"]).await
    }

    /// Returns the selected options: their values, or their labels with
    /// `by_text`.
    pub async fn get_selected(&self, by_text: bool) -> Result<Vec<String>> {
        let atom = if by_text {
            atoms::GET_SELECTED_TEXT
        } else {
            atoms::GET_SELECTED
        };
        let list = self.call(atom, vec![]).await?;
        let Some(list_id) = list.object_id else {
            return Ok(Vec::new());
        };
        let properties = self.session.get_properties(&list_id).await?;
        let selected = properties
            .into_iter()
            .filter(|descriptor| descriptor.enumerable)
            .filter_map(|descriptor| descriptor.value)
            .filter_map(|object| object.value.as_str().map(str::to_string))
            .collect();
        self.session.release_object(&list_id).await?;
        Ok(selected)
    }

    /// Sets the checked flag and fires `input`/`change`.
    pub async fn checkbox(&self, check: bool) -> Result<()> {
        self.call(atoms::CHECKBOX, vec![json!(check)]).await?;
        self.dispatch_events(&["click", "input", "change"]).await
    }

    /// Reads the checked flag.
    pub async fn is_checked(&self) -> Result<bool> {
        Ok(self.call(atoms::CHECKED, vec![]).await?.as_bool())
    }
}

// ============================================================================
// Element - Inspection
// ============================================================================

impl Element {
    /// Returns the element's value or inner text.
    pub async fn get_text(&self) -> Result<String> {
        self.call(atoms::GET_INNER_TEXT, vec![]).await?.as_string()
    }

    /// Sets an attribute.
    pub async fn set_attr(&self, attribute: &str, value: &str) -> Result<()> {
        self.call(atoms::SET_ATTR, vec![json!(attribute), json!(value)])
            .await
            .map(drop)
    }

    /// Reads an attribute.
    pub async fn get_attr(&self, attribute: &str) -> Result<String> {
        self.call(atoms::GET_ATTR, vec![json!(attribute)])
            .await?
            .as_string()
    }

    /// Reads one computed style property.
    pub async fn get_computed_style(&self, style: &str) -> Result<String> {
        self.call(atoms::GET_COMPUTED_STYLE, vec![json!(style)])
            .await?
            .as_string()
    }

    /// Returns `true` when the element has a rendered, visible box.
    pub async fn is_visible(&self) -> Result<bool> {
        self.ensure_attached()?;
        match self.session.get_content_quads(&self.object_id, false).await {
            Ok(_) => {}
            Err(Error::ElementIsOutOfViewport) => return Ok(false),
            Err(err) => return Err(err),
        }
        Ok(self.call(atoms::IS_VISIBLE, vec![]).await?.as_bool())
    }

    /// Returns the bounding rectangle of the element's content quad.
    pub async fn get_rectangle(&self) -> Result<Rect> {
        self.ensure_attached()?;
        let quad = self
            .session
            .get_content_quads(&self.object_id, false)
            .await?;
        Ok(quad.bounding_rect())
    }

    /// Returns the frame id of an IFRAME/FRAME element.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchFrame`] when the element is not a frame owner.
    pub async fn get_frame_id(&self) -> Result<FrameId> {
        self.ensure_attached()?;
        let node = self.session.describe_node(&self.object_id).await?;
        if node.node_name != "IFRAME" && node.node_name != "FRAME" {
            return Err(Error::NoSuchFrame);
        }
        node.frame_id.ok_or(Error::FrameDetached)
    }

    /// Returns the types of event listeners attached to the element.
    pub async fn get_event_listeners(&self) -> Result<Vec<String>> {
        self.ensure_attached()?;
        let reply = self
            .session
            .call(
                "DOMDebugger.getEventListeners",
                json!({"objectId": self.object_id, "depth": 1, "pierce": true}),
            )
            .await?;
        let listeners = reply
            .get("listeners")
            .and_then(|v| v.as_array())
            .map(|listeners| {
                listeners
                    .iter()
                    .filter_map(|l| l.get("type"))
                    .filter_map(|t| t.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(listeners)
    }

    /// Awaits the first mutation on the element and returns its type
    /// (`"attributes"`, `"childList"`, `"characterData"`).
    ///
    /// Installs a one-shot `MutationObserver` promise; the wait is bounded
    /// by the session deadline like any call.
    pub async fn observe_mutation(
        &self,
        attributes: bool,
        child_list: bool,
        subtree: bool,
    ) -> Result<String> {
        self.call(
            atoms::MUTATION_OBSERVER,
            vec![json!(attributes), json!(child_list), json!(subtree)],
        )
        .await?
        .as_string()
    }
}

// ============================================================================
// Element - Scoped queries
// ============================================================================

impl Element {
    /// Finds the first descendant matching a CSS selector.
    pub async fn query(&self, selector: &str) -> Result<Element> {
        self.ensure_attached()?;
        self.session.query_inner(Some(self), selector).await
    }

    /// Finds all descendants matching a CSS selector.
    pub async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.ensure_attached()?;
        self.session.query_all_inner(Some(self), selector).await
    }
}
