//! Fetch domain: request interception.
//!
//! [`Session::intercept`] enables `Fetch.enable` for a set of patterns and
//! dispatches every paused request to a handler on a fresh task. The
//! handler must terminate each request by exactly one of
//! [`PausedRequest::fail`], [`PausedRequest::fulfill`] or
//! [`PausedRequest::continue_request`] — the browser holds the request
//! until one of them arrives.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::json;
use tracing::warn;

use crate::error::Result;
use crate::protocol::ParsedEvent;
use crate::protocol::devtool::{ErrorReason, HeaderEntry, RequestPattern, RequestPaused};
use crate::session::{Session, Subscription};

// ============================================================================
// PausedRequest
// ============================================================================

/// One request paused by the interceptor, awaiting a decision.
pub struct PausedRequest {
    session: Session,
    event: RequestPaused,
}

impl PausedRequest {
    /// The paused request's URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.event.request.url
    }

    /// The paused request's HTTP method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.event.request.method
    }

    /// The resource type (`"Document"`, `"XHR"`, …).
    #[inline]
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.event.resource_type
    }

    /// The full event payload.
    #[inline]
    #[must_use]
    pub fn event(&self) -> &RequestPaused {
        &self.event
    }

    /// Fails the request with the given network error.
    pub async fn fail(self, reason: ErrorReason) -> Result<()> {
        self.session
            .call(
                "Fetch.failRequest",
                json!({
                    "requestId": self.event.request_id,
                    "errorReason": reason,
                }),
            )
            .await
            .map(drop)
    }

    /// Answers the request with a synthetic response.
    pub async fn fulfill(
        self,
        response_code: i64,
        headers: &[HeaderEntry],
        body: Option<&[u8]>,
        response_phrase: Option<&str>,
    ) -> Result<()> {
        let mut params = json!({
            "requestId": self.event.request_id,
            "responseCode": response_code,
            "responseHeaders": headers,
        });
        if let Some(body) = body {
            params["body"] = json!(Base64Standard.encode(body));
        }
        if let Some(phrase) = response_phrase {
            params["responsePhrase"] = json!(phrase);
        }
        self.session
            .call("Fetch.fulfillRequest", params)
            .await
            .map(drop)
    }

    /// Releases the request, optionally overriding url, method, POST body
    /// or headers.
    pub async fn continue_request(self, overrides: ContinueOverrides<'_>) -> Result<()> {
        let mut params = json!({"requestId": self.event.request_id});
        if let Some(url) = overrides.url {
            params["url"] = json!(url);
        }
        if let Some(method) = overrides.method {
            params["method"] = json!(method);
        }
        if let Some(post_data) = overrides.post_data {
            params["postData"] = json!(Base64Standard.encode(post_data));
        }
        if let Some(headers) = overrides.headers {
            params["headers"] = json!(headers);
        }
        self.session
            .call("Fetch.continueRequest", params)
            .await
            .map(drop)
    }
}

/// Optional overrides for [`PausedRequest::continue_request`].
#[derive(Default)]
pub struct ContinueOverrides<'a> {
    /// Replacement URL.
    pub url: Option<&'a str>,
    /// Replacement HTTP method.
    pub method: Option<&'a str>,
    /// Replacement POST body.
    pub post_data: Option<&'a [u8]>,
    /// Replacement headers.
    pub headers: Option<&'a [HeaderEntry]>,
}

// ============================================================================
// Interception
// ============================================================================

/// Active interception; [`Interception::stop`] unsubscribes and disables
/// the Fetch domain.
pub struct Interception {
    session: Session,
    subscription: Option<Subscription>,
}

impl Interception {
    /// Stops intercepting: unsubscribes and sends `Fetch.disable`.
    pub async fn stop(mut self) -> Result<()> {
        self.subscription.take();
        self.session
            .call("Fetch.disable", json!({}))
            .await
            .map(drop)
    }
}

// ============================================================================
// Session - Fetch domain
// ============================================================================

impl Session {
    /// Starts intercepting requests matching the given patterns.
    ///
    /// The handler runs on a fresh task per paused request and must
    /// terminate it exactly once. Auth challenges are not handled
    /// (`handleAuthRequests:false`).
    pub async fn intercept<H, Fut>(
        &self,
        patterns: &[RequestPattern],
        handler: H,
    ) -> Result<Interception>
    where
        H: Fn(PausedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let session = self.clone();
        let subscription = self.subscribe("Fetch.requestPaused", move |event| {
            let ParsedEvent::RequestPaused(paused) = event.parse() else {
                warn!("undecodable Fetch.requestPaused event dropped");
                return;
            };
            let request = PausedRequest {
                session: session.clone(),
                event: *paused,
            };
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Err(err) = handler(request).await {
                    warn!(error = %err, "intercept handler failed");
                }
            });
        });

        self.call(
            "Fetch.enable",
            json!({
                "patterns": patterns,
                "handleAuthRequests": false,
            }),
        )
        .await?;

        Ok(Interception {
            session: self.clone(),
            subscription: Some(subscription),
        })
    }
}
