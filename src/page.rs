//! Page operations: navigation, history, tabs, queries, screenshots.
//!
//! Navigation waits are subscribe-before-send: the load-event stream is
//! opened before `Page.navigate` goes out, so the event fired in response
//! can never be missed.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tracing::debug;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, TargetId};
use crate::protocol::devtool::{
    DeviceMetrics, FrameTree, NavigationEntry, NavigationHistory, NavigationResult, TargetCreated,
};
use crate::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Headless Chrome crashes on an empty new-tab url; substitute this.
const BLANK_PAGE: &str = "about:blank";

/// Isolated world name used for child-frame contexts.
const UTILITY_WORLD: &str = "utility";

// ============================================================================
// Session - Navigation
// ============================================================================

impl Session {
    /// Navigates the main frame to a URL and waits for the load event.
    ///
    /// Returns immediately when the browser reports an empty `loaderId`
    /// (the page is already at that URL). A non-empty `errorText` fails
    /// without waiting.
    ///
    /// # Errors
    ///
    /// [`Error::LoadTimeout`] when the load event does not arrive within
    /// the session deadline.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        let mut load = self.listen(&["Page.loadEventFired"]);

        let nav: NavigationResult = self
            .call_into(
                "Page.navigate",
                json!({
                    "url": url,
                    "transitionType": "typed",
                    "frameId": self.target_id(),
                }),
            )
            .await?;

        if !nav.error_text.is_empty() {
            return Err(Error::protocol(0, nav.error_text));
        }
        if nav.loader_id.is_empty() {
            // Already at this URL; no navigation happened.
            return Ok(());
        }

        self.await_event(&mut load, Error::LoadTimeout, |_| Some(()))
            .await?;
        self.inner.context.reset();
        Ok(())
    }

    /// Reloads the page, ignoring the cache, and waits for the load event.
    pub async fn reload(&self) -> Result<()> {
        debug!("reloading");
        let mut load = self.listen(&["Page.loadEventFired"]);
        self.call("Page.reload", json!({"ignoreCache": true}))
            .await?;
        self.inner.context.reset();
        self.await_event(&mut load, Error::LoadTimeout, |_| Some(()))
            .await
    }

    /// Moves through session history: −1 = back, +1 = forward.
    ///
    /// Out-of-range deltas are a no-op.
    pub async fn navigate_history(&self, delta: i64) -> Result<()> {
        let history = self.get_navigation_history().await?;
        let index = history.current_index + delta;
        if index >= 0 && (index as usize) < history.entries.len() {
            let entry_id = history.entries[index as usize].id;
            self.call(
                "Page.navigateToHistoryEntry",
                json!({"entryId": entry_id}),
            )
            .await?;
        }
        Ok(())
    }

    /// Returns the full navigation history.
    pub async fn get_navigation_history(&self) -> Result<NavigationHistory> {
        self.call_into("Page.getNavigationHistory", json!({})).await
    }

    /// Returns the current navigation entry.
    ///
    /// A fresh tab with no committed navigation reports index −1; that maps
    /// to a synthetic `about:blank` entry.
    pub async fn get_navigation_entry(&self) -> Result<NavigationEntry> {
        let history = self.get_navigation_history().await?;
        if history.current_index < 0 {
            return Ok(NavigationEntry {
                url: BLANK_PAGE.to_string(),
                ..NavigationEntry::default()
            });
        }
        history
            .entries
            .into_iter()
            .nth(history.current_index as usize)
            .ok_or_else(|| Error::protocol(0, "navigation history index out of range"))
    }
}

// ============================================================================
// Session - Tabs and popups
// ============================================================================

impl Session {
    /// Opens a new tab and attaches a session to it.
    pub async fn new_tab(&self, url: &str) -> Result<Session> {
        let url = if url.is_empty() { BLANK_PAGE } else { url };
        let reply = self
            .call("Target.createTarget", json!({"url": url}))
            .await?;
        let target_id = reply
            .get("targetId")
            .and_then(|v| v.as_str())
            .map(TargetId::new)
            .ok_or_else(|| Error::protocol(0, "createTarget reply without targetId"))?;
        Session::attach(&self.connection()?, target_id).await
    }

    /// Runs `before` (typically a click opening a popup), waits for a page
    /// target opened by this one, and attaches a session to it.
    ///
    /// The subscription is installed before `before` runs, so a popup that
    /// appears instantly is not missed.
    ///
    /// # Errors
    ///
    /// [`Error::TargetCreatedTimeout`] when no matching target appears
    /// within the session deadline.
    pub async fn on_target_created<F, Fut>(&self, before: F) -> Result<Session>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut created = self.listen(&["Target.targetCreated"]);
        before().await?;

        let own_target = self.target_id().clone();
        let target_id = self
            .await_event(&mut created, Error::TargetCreatedTimeout, |event| {
                let created: TargetCreated =
                    serde_json::from_value(event.params.clone()).ok()?;
                let info = created.target_info;
                (info.kind == "page" && info.opener_id.as_ref() == Some(&own_target))
                    .then_some(info.target_id)
            })
            .await?;
        created.stop();

        Session::attach(&self.connection()?, target_id).await
    }
}

// ============================================================================
// Session - Queries
// ============================================================================

impl Session {
    /// Finds the first element matching a CSS selector.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] when nothing matches.
    pub async fn query(&self, selector: &str) -> Result<Element> {
        self.query_inner(None, selector).await
    }

    /// Finds all elements matching a CSS selector.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchElement`] when nothing matches.
    pub async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.query_all_inner(None, selector).await
    }

    pub(crate) async fn query_inner(
        &self,
        parent: Option<&Element>,
        selector: &str,
    ) -> Result<Element> {
        let context = self.current_context().await?;
        let object = match parent {
            Some(parent) => {
                self.call_function_on(
                    parent.object_id(),
                    crate::atoms::QUERY_SELECTOR,
                    vec![Value::String(selector.to_string())],
                    false,
                )
                .await?
            }
            None => {
                let expression =
                    format!("document.querySelector({})", encode_js_string(selector)?);
                self.evaluate_in(&expression, context, false, false).await?
            }
        };

        match object.object_id {
            Some(object_id) if !object.is_nil() => {
                Ok(Element::new(self.clone(), object_id, context))
            }
            _ => Err(Error::no_such_element(selector, context, self.current_frame())),
        }
    }

    pub(crate) async fn query_all_inner(
        &self,
        parent: Option<&Element>,
        selector: &str,
    ) -> Result<Vec<Element>> {
        let context = self.current_context().await?;
        let list = match parent {
            Some(parent) => {
                self.call_function_on(
                    parent.object_id(),
                    crate::atoms::QUERY_SELECTOR_ALL,
                    vec![Value::String(selector.to_string())],
                    false,
                )
                .await?
            }
            None => {
                let expression =
                    format!("document.querySelectorAll({})", encode_js_string(selector)?);
                self.evaluate_in(&expression, context, false, false).await?
            }
        };

        let Some(list_id) = list.object_id else {
            return Err(Error::no_such_element(selector, context, self.current_frame()));
        };

        let properties = self.get_properties(&list_id).await?;
        let elements: Vec<Element> = properties
            .into_iter()
            .filter(|descriptor| descriptor.enumerable)
            .filter_map(|descriptor| descriptor.value)
            .filter_map(|object| object.object_id)
            .map(|object_id| Element::new(self.clone(), object_id, context))
            .collect();
        self.release_object(&list_id).await?;

        if elements.is_empty() {
            return Err(Error::no_such_element(selector, context, self.current_frame()));
        }
        Ok(elements)
    }
}

// ============================================================================
// Session - Frames and worlds
// ============================================================================

impl Session {
    /// Returns the page's frame tree.
    pub async fn get_frame_tree(&self) -> Result<FrameTree> {
        let reply = self.call("Page.getFrameTree", json!({})).await?;
        let tree = reply.get("frameTree").cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(tree)?)
    }

    /// Creates an isolated world in a frame and returns its context id.
    pub(crate) async fn create_isolated_world(
        &self,
        frame_id: &FrameId,
    ) -> Result<ExecutionContextId> {
        let reply = self
            .call(
                "Page.createIsolatedWorld",
                json!({
                    "frameId": frame_id,
                    "worldName": UTILITY_WORLD,
                    // sic: the protocol ships this misspelling.
                    "grantUniveralAccess": true,
                }),
            )
            .await?;
        reply
            .get("executionContextId")
            .and_then(|v| v.as_i64())
            .map(ExecutionContextId)
            .ok_or_else(|| Error::protocol(0, "createIsolatedWorld reply without context id"))
    }
}

// ============================================================================
// Session - Page configuration
// ============================================================================

impl Session {
    /// Installs a script evaluated in every new document before its own
    /// scripts run. Returns the script identifier.
    pub async fn add_script_on_new_document(&self, source: &str) -> Result<String> {
        let reply = self
            .call(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({"source": source}),
            )
            .await?;
        reply
            .get("identifier")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::protocol(0, "addScriptToEvaluateOnNewDocument without identifier"))
    }

    /// Removes a script installed with
    /// [`Session::add_script_on_new_document`].
    pub async fn remove_script_on_new_document(&self, identifier: &str) -> Result<()> {
        self.call(
            "Page.removeScriptToEvaluateOnNewDocument",
            json!({"identifier": identifier}),
        )
        .await
        .map(drop)
    }

    /// Sets the download behavior (`"allow"`, `"deny"`, `"default"`).
    pub async fn set_download_behavior(
        &self,
        behavior: &str,
        download_path: Option<&str>,
    ) -> Result<()> {
        let mut params = json!({"behavior": behavior});
        if let Some(path) = download_path {
            params["downloadPath"] = json!(path);
        }
        self.call("Page.setDownloadBehavior", params).await.map(drop)
    }

    /// Accepts or dismisses an open JavaScript dialog.
    pub async fn handle_javascript_dialog(
        &self,
        accept: bool,
        prompt_text: Option<&str>,
    ) -> Result<()> {
        let mut params = json!({"accept": accept});
        if let Some(text) = prompt_text {
            params["promptText"] = json!(text);
        }
        self.call("Page.handleJavaScriptDialog", params)
            .await
            .map(drop)
    }
}

// ============================================================================
// Session - Screenshots and viewport
// ============================================================================

impl Session {
    /// Captures a screenshot of the current page.
    ///
    /// `format` is `"png"` or `"jpeg"`; `quality` applies to jpeg only.
    /// Scrollbars are hidden first so they never appear in the capture.
    pub async fn capture_screenshot(&self, format: &str, quality: i64) -> Result<Vec<u8>> {
        self.set_scrollbars_hidden(true).await?;
        let reply = self
            .call(
                "Page.captureScreenshot",
                json!({
                    "format": format,
                    "quality": quality,
                    "fromSurface": true,
                }),
            )
            .await?;
        let data = reply
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol(0, "captureScreenshot reply without data"))?;
        Base64Standard
            .decode(data)
            .map_err(|err| Error::protocol(0, format!("screenshot decode: {err}")))
    }

    /// Resizes the emulated viewport to the full content size, so a
    /// subsequent screenshot covers the whole page.
    pub async fn fit_to_window(&self) -> Result<()> {
        let metrics = self.get_layout_metrics().await?;
        self.set_device_metrics_override(&DeviceMetrics {
            width: metrics.layout_viewport.client_width,
            height: metrics.content_size.height.ceil() as i64,
            device_scale_factor: 1.0,
            mobile: false,
        })
        .await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Encodes a string as a JS string literal (JSON is a subset).
fn encode_js_string(s: &str) -> Result<String> {
    Ok(serde_json::to_string(s)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_js_string_escapes_quotes() {
        let encoded = encode_js_string(r#"a[name="q"]"#).expect("encode");
        assert_eq!(encoded, r#""a[name=\"q\"]""#);
    }

    #[test]
    fn test_blank_page() {
        assert_eq!(BLANK_PAGE, "about:blank");
    }
}
