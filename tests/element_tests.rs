//! Element and query tests against the mock DevTools endpoint.

mod support;

use std::time::Duration;

use serde_json::{Value, json};

use chrome_cdp::{Browser, Error, Session, TargetId};
use support::{MockBrowser, attach_responder, err, event, ok};

// ============================================================================
// Helpers
// ============================================================================

async fn attach(mock: &MockBrowser) -> (Browser, Session) {
    let browser = Browser::connect(&mock.url).await.expect("connect");
    let session = browser
        .new_session(TargetId::new(support::TARGET_ONE))
        .await
        .expect("attach");
    (browser, session)
}

/// RemoteObject payload for a DOM node handle.
fn node_object(object_id: &str) -> Value {
    json!({"result": {
        "type": "object", "subtype": "node",
        "className": "HTMLElement", "objectId": object_id,
    }})
}

fn string_object(s: &str) -> Value {
    json!({"result": {"type": "string", "value": s}})
}

fn bool_object(b: bool) -> Value {
    json!({"result": {"type": "boolean", "value": b}})
}

fn undefined_object() -> Value {
    json!({"result": {"type": "undefined"}})
}

fn layout_metrics() -> Value {
    json!({
        "layoutViewport": {"pageX": 0, "pageY": 0, "clientWidth": 1280, "clientHeight": 720},
        "contentSize": {"x": 0.0, "y": 0.0, "width": 1280.0, "height": 2000.0},
    })
}

/// Declaration-based dispatch for the atoms used by element operations.
fn atom_reply(declaration: &str) -> Option<Value> {
    if declaration.contains("_cc=!1") {
        // miss-click guard install
        return Some(undefined_object());
    }
    if declaration.contains("return this._cc") {
        return Some(bool_object(true));
    }
    if declaration.contains("dispatchEvent") {
        return Some(undefined_object());
    }
    if declaration.contains("this.value||this.innerText") {
        return Some(string_object("hi"));
    }
    None
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn query_returns_element_and_reads_text() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => {
                let expression = params["expression"].as_str().unwrap_or_default();
                assert!(expression.contains(r##"document.querySelector("#x")"##));
                ok(node_object("OBJ-X"))
            }
            "Runtime.callFunctionOn" => {
                assert_eq!(params["objectId"], json!("OBJ-X"));
                let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
                ok(atom_reply(declaration).expect("known atom"))
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let element = session.query("#x").await.expect("element");
    assert!(!element.is_detached());
    assert_eq!(element.get_text().await.expect("text"), "hi");
}

#[tokio::test]
async fn query_maps_zero_matches_to_no_such_element() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, _| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => {
                ok(json!({"result": {"type": "object", "subtype": "null", "value": null}}))
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let error = session.query("#missing").await.unwrap_err();
    match error {
        Error::NoSuchElement { selector, frame, .. } => {
            assert_eq!(selector, "#missing");
            assert_eq!(frame.as_str(), support::TARGET_ONE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn query_all_collects_enumerable_nodes() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(json!({"result": {
                "type": "object", "subtype": "nodelist", "objectId": "LIST-1",
            }})),
            "Runtime.getProperties" => {
                assert_eq!(params["objectId"], json!("LIST-1"));
                ok(json!({"result": [
                    {"name": "0", "enumerable": true,
                     "value": {"type": "object", "subtype": "node", "objectId": "E-0"}},
                    {"name": "1", "enumerable": true,
                     "value": {"type": "object", "subtype": "node", "objectId": "E-1"}},
                    {"name": "length", "enumerable": false,
                     "value": {"type": "number", "value": 2}},
                ]}))
            }
            "Runtime.releaseObject" => ok(json!({})),
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let elements = session.query_all("li").await.expect("elements");
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].object_id().as_str(), "E-0");
    assert_eq!(elements[1].object_id().as_str(), "E-1");
}

// ============================================================================
// Staleness
// ============================================================================

#[tokio::test]
async fn element_goes_stale_over_the_wire_after_navigation() {
    let mut attaches = 0;
    let mut navigated = false;
    let mock = MockBrowser::spawn(move |method, _| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-OLD")),
            "Page.navigate" => {
                navigated = true;
                support::ok_with_events(
                    json!({"frameId": support::TARGET_ONE, "loaderId": "LOADER-2"}),
                    vec![event(
                        "Page.loadEventFired",
                        json!({"timestamp": 2.0}),
                        Some(support::SESSION_ONE),
                    )],
                )
            }
            "Runtime.callFunctionOn" if navigated => {
                // The old object's context is gone.
                err(-32000, "Cannot find context with specified id")
            }
            "Runtime.callFunctionOn" => ok(string_object("old text")),
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let element = session.query("#x").await.expect("element");
    assert_eq!(element.get_text().await.expect("text"), "old text");

    session
        .navigate("data:text/html,<p id=y>bye</p>")
        .await
        .expect("navigate");

    let error = element.get_text().await.unwrap_err();
    assert!(matches!(error, Error::StaleElementReference), "got {error}");
}

#[tokio::test]
async fn frame_element_goes_stale_locally_without_round_trip() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Page.createIsolatedWorld" => {
                assert_eq!(params["worldName"], json!("utility"));
                ok(json!({"executionContextId": 5}))
            }
            "Runtime.evaluate" => {
                // The frame's isolated world must be the evaluation context.
                assert_eq!(params["contextId"], json!(5));
                ok(node_object("OBJ-B"))
            }
            "Runtime.callFunctionOn" => ok(string_object("ok")),
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    session.switch_to("FRAME-1");

    let button = session.query("#b").await.expect("element");
    assert_eq!(button.get_text().await.expect("text"), "ok");
    let calls_before = mock.methods().len();

    // Back to the main frame: the captured context no longer matches.
    session.main();
    assert!(button.is_detached());
    let error = button.get_text().await.unwrap_err();
    assert!(matches!(error, Error::StaleElementReference), "got {error}");

    // Stale detection is local; nothing new hit the wire.
    assert_eq!(mock.methods().len(), calls_before);
}

// ============================================================================
// Click
// ============================================================================

#[tokio::test]
async fn click_dispatches_mouse_events_at_quad_midpoint() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-BTN")),
            "DOM.scrollIntoViewIfNeeded" => ok(json!({})),
            "DOM.getContentQuads" => ok(json!({
                "quads": [[10.0, 10.0, 110.0, 10.0, 110.0, 60.0, 10.0, 60.0]],
            })),
            "Page.getLayoutMetrics" => ok(layout_metrics()),
            "Input.dispatchMouseEvent" => {
                assert_eq!(params["x"], json!(60.0));
                assert_eq!(params["y"], json!(35.0));
                ok(json!({}))
            }
            "Runtime.callFunctionOn" => {
                let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
                ok(atom_reply(declaration).expect("known atom"))
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let button = session.query("#btn").await.expect("element");
    button.click().await.expect("click");

    let mouse_events: Vec<String> = mock
        .calls
        .lock()
        .expect("lock")
        .iter()
        .filter(|(method, _)| method == "Input.dispatchMouseEvent")
        .map(|(_, params)| params["type"].as_str().unwrap_or("").to_string())
        .collect();
    assert_eq!(mouse_events, vec!["mouseMoved", "mousePressed", "mouseReleased"]);
}

#[tokio::test]
async fn overlapped_click_reports_click_failed() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-BTN")),
            "DOM.scrollIntoViewIfNeeded" | "Input.dispatchMouseEvent" => ok(json!({})),
            "DOM.getContentQuads" => ok(json!({
                "quads": [[10.0, 10.0, 110.0, 10.0, 110.0, 60.0, 10.0, 60.0]],
            })),
            "Page.getLayoutMetrics" => ok(layout_metrics()),
            "Runtime.callFunctionOn" => {
                let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
                if declaration.contains("return this._cc") {
                    // The overlay swallowed the click; the flag stayed false.
                    ok(bool_object(false))
                } else {
                    ok(undefined_object())
                }
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let button = session.query("#btn").await.expect("element");
    let error = button.click().await.unwrap_err();
    assert!(matches!(error, Error::ClickFailed), "got {error}");
}

#[tokio::test]
async fn offscreen_element_is_out_of_viewport() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, _| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-OFF")),
            "DOM.scrollIntoViewIfNeeded" => ok(json!({})),
            // Fully left of the viewport; clamping collapses it to zero area.
            "DOM.getContentQuads" => ok(json!({
                "quads": [[-200.0, 10.0, -100.0, 10.0, -100.0, 60.0, -200.0, 60.0]],
            })),
            "Page.getLayoutMetrics" => ok(layout_metrics()),
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let element = session.query("#off").await.expect("element");
    let error = element.click().await.unwrap_err();
    assert!(matches!(error, Error::ElementIsOutOfViewport), "got {error}");
}

// ============================================================================
// Select
// ============================================================================

#[tokio::test]
async fn select_rejects_non_select_nodes_and_missing_options() {
    let mut attaches = 0;
    let mut node_name = "DIV";
    let mut has_options = false;
    let mock = MockBrowser::spawn(move |method, params| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-SEL")),
            "DOM.describeNode" => {
                let reply = ok(json!({"node": {
                    "nodeId": 1, "backendNodeId": 2, "nodeType": 1,
                    "nodeName": node_name,
                }}));
                // First describe sees a DIV, later ones a SELECT.
                node_name = "SELECT";
                reply
            }
            "Runtime.callFunctionOn" => {
                let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
                if declaration.contains("c.length==a.filter") {
                    let reply = ok(bool_object(has_options));
                    has_options = true;
                    return reply;
                }
                ok(undefined_object())
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let element = session.query("#choice").await.expect("element");

    let error = element.select(&["b"]).await.unwrap_err();
    assert!(matches!(error, Error::InvalidElementSelect), "got {error}");

    let error = element.select(&["nope"]).await.unwrap_err();
    assert!(
        matches!(error, Error::InvalidElementOption { ref value } if value == "nope"),
        "got {error}"
    );

    element.select(&["b"]).await.expect("select succeeds");
}

// ============================================================================
// Frames
// ============================================================================

#[tokio::test]
async fn get_frame_id_requires_an_iframe() {
    let mut attaches = 0;
    let mut node_name = "DIV";
    let mock = MockBrowser::spawn(move |method, _| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            "Runtime.evaluate" => ok(node_object("OBJ-F")),
            "DOM.describeNode" => {
                let reply = ok(json!({"node": {
                    "nodeId": 1, "backendNodeId": 2, "nodeType": 1,
                    "nodeName": node_name, "frameId": "FRAME-9",
                }}));
                node_name = "IFRAME";
                reply
            }
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    let element = session.query("#f").await.expect("element");

    let error = element.get_frame_id().await.unwrap_err();
    assert!(matches!(error, Error::NoSuchFrame), "got {error}");

    let frame_id = element.get_frame_id().await.expect("frame id");
    assert_eq!(frame_id.as_str(), "FRAME-9");
}

// ============================================================================
// Timeouts around the context gate
// ============================================================================

#[tokio::test]
async fn pending_context_times_out_with_load_timeout() {
    let mut attaches = 0;
    let mock = MockBrowser::spawn(move |method, _| {
        if let Some(outcome) = attach_responder(method, &mut attaches) {
            return outcome;
        }
        match method {
            // World creation never completes.
            "Page.createIsolatedWorld" => support::ignore(),
            other => panic!("unexpected method {other}"),
        }
    })
    .await;

    let (_browser, session) = attach(&mock).await;
    session.set_deadline(Duration::from_millis(150));
    session.switch_to("FRAME-1");

    let error = session.query("#b").await.unwrap_err();
    assert!(matches!(error, Error::LoadTimeout), "got {error}");
}
