//! Browser factory: connect to a debugger endpoint and obtain sessions.
//!
//! Process launch and debugger-URL discovery belong to the embedding
//! application; this crate starts from a ready `ws://…/devtools/browser/…`
//! URL.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::TargetId;
use crate::protocol::devtool::TargetInfo;
use crate::session::{DEFAULT_DEADLINE, Session, raw_call};
use crate::transport::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Grace period for the browser to acknowledge `Browser.close`.
const CLOSE_DEADLINE: Duration = Duration::from_secs(10);

// ============================================================================
// Browser
// ============================================================================

/// Handle to one browser process's DevTools endpoint.
pub struct Browser {
    connection: Arc<Connection>,
}

impl Browser {
    /// Connects to a DevTools WebSocket URL.
    ///
    /// # Errors
    ///
    /// [`Error::WebSocket`] when the dial fails.
    pub async fn connect(websocket_url: &str) -> Result<Browser> {
        let connection = Connection::connect(websocket_url).await?;
        Ok(Browser { connection })
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Sets the protocol trace bitmask (see [`crate::transport`]).
    pub fn set_log_mask(&self, mask: u8) {
        self.connection.set_log_mask(mask);
    }

    /// Attaches to the first existing page target, or creates one.
    ///
    /// # Errors
    ///
    /// [`Error::NoPageTarget`] when the browser reports no page target and
    /// refuses to create one.
    pub async fn default_session(&self) -> Result<Session> {
        let reply = raw_call(
            &self.connection,
            None,
            "Target.getTargets",
            json!({}),
            DEFAULT_DEADLINE,
        )
        .await?;
        let targets: Vec<TargetInfo> =
            serde_json::from_value(reply.get("targetInfos").cloned().unwrap_or(Value::Null))?;

        let existing = targets
            .into_iter()
            .find(|target| target.kind == "page")
            .map(|target| target.target_id);

        let target_id = match existing {
            Some(target_id) => target_id,
            None => self.create_page_target().await?,
        };
        Session::attach(&self.connection, target_id).await
    }

    /// Attaches to a specific target.
    pub async fn new_session(&self, target_id: TargetId) -> Result<Session> {
        Session::attach(&self.connection, target_id).await
    }

    /// Asks the browser to exit, then closes the connection.
    ///
    /// The reply may never arrive when the process exits first; that is
    /// not an error.
    pub async fn close(self) -> Result<()> {
        match raw_call(
            &self.connection,
            None,
            "Browser.close",
            json!({}),
            CLOSE_DEADLINE,
        )
        .await
        {
            Ok(_) | Err(Error::ConnectionClosed) | Err(Error::Timeout { .. }) => {}
            Err(err) => return Err(err),
        }
        self.connection.close();
        debug!("browser connection closed");
        Ok(())
    }

    async fn create_page_target(&self) -> Result<TargetId> {
        let reply = raw_call(
            &self.connection,
            None,
            "Target.createTarget",
            json!({"url": "about:blank"}),
            DEFAULT_DEADLINE,
        )
        .await?;
        reply
            .get("targetId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(TargetId::new)
            .ok_or(Error::NoPageTarget)
    }
}
