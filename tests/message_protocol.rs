use domscope::{CaptureConfig, InspectEvent, Session};

const PAGE: &str = r#"
<html><head><style>
    #panel { background-color: #003366; color: #ffffff; }
</style></head>
<body>
    <section id="panel"><h2>Title</h2><p>Body text</p></section>
</body></html>
"#;

fn session() -> Session {
    Session::from_html(PAGE, None, CaptureConfig::default())
}

fn send(session: &mut Session, raw: &str) -> serde_json::Value {
    serde_json::to_value(session.handle_message(raw)).unwrap()
}

fn select_panel(session: &mut Session) {
    let target = session.find("#panel").unwrap();
    session.dispatch_event(InspectEvent::Enable).unwrap();
    session.dispatch_event(InspectEvent::Click { target }).unwrap();
}

#[test]
fn test_ping() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"PING"}"#);
    assert_eq!(reply, serde_json::json!({"success": true}));
}

#[test]
fn test_mode_messages_report_inspect_state() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"ENABLE_INSPECT_MODE"}"#);
    assert_eq!(reply["isInspectMode"], true);
    let reply = send(&mut s, r#"{"type":"DISABLE_INSPECT_MODE"}"#);
    assert_eq!(reply["isInspectMode"], false);
    let reply = send(&mut s, r#"{"type":"TOGGLE_INSPECT_MODE"}"#);
    assert_eq!(reply["isInspectMode"], true);
}

#[test]
fn test_styles_query_requires_selection() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"GET_ELEMENT_STYLES"}"#);
    assert_eq!(reply, serde_json::json!({"success": false, "error": "No element selected"}));
}

#[test]
fn test_html_query_requires_selection() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"GET_ELEMENT_HTML"}"#);
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"], "No element selected");
}

#[test]
fn test_styles_reply_shape() {
    let mut s = session();
    select_panel(&mut s);
    let reply = send(&mut s, r#"{"type":"GET_ELEMENT_STYLES"}"#);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["styles"]["backgroundColor"], "rgb(0, 51, 102)");
    assert!(reply["styles"]["_context"].is_object());
    assert!(reply["html"].as_str().unwrap().starts_with("<section"));
    assert!(reply["assets"].is_array());
    assert_eq!(reply["domStructure"]["tagName"], "section");
}

#[test]
fn test_html_reply_shape() {
    let mut s = session();
    select_panel(&mut s);
    let reply = send(&mut s, r#"{"type":"GET_ELEMENT_HTML"}"#);
    assert_eq!(reply["success"], true);
    let html = reply["html"].as_str().unwrap();
    assert!(html.contains("<h2>Title</h2>"));
    assert!(html.contains("<p>Body text</p>"));
    // style replies carry assets, html replies do not
    assert!(reply.get("styles").is_none());
    assert!(reply.get("assets").is_none());
}

#[test]
fn test_apply_styles_round_trip() {
    let mut s = session();
    select_panel(&mut s);
    let reply = send(
        &mut s,
        r##"{"type":"APPLY_STYLES","styles":{"backgroundColor":"#ff0000","opacity":"0.25"}}"##,
    );
    assert_eq!(reply, serde_json::json!({"success": true}));

    let reply = send(&mut s, r#"{"type":"GET_ELEMENT_STYLES"}"#);
    assert_eq!(reply["styles"]["backgroundColor"], "rgb(255, 0, 0)");
    assert_eq!(reply["styles"]["opacity"], "0.25");
}

#[test]
fn test_apply_styles_without_selection_needs_selector() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"APPLY_STYLES","styles":{"color":"red"}}"#);
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"], "No element selected");

    let reply = send(
        &mut s,
        r##"{"type":"APPLY_STYLES","selector":"#panel","styles":{"color":"red"}}"##,
    );
    assert_eq!(reply["success"], true);
}

#[test]
fn test_apply_styles_reports_selector_errors() {
    let mut s = session();
    let reply = send(
        &mut s,
        r##"{"type":"APPLY_STYLES","selector":"#ghost","styles":{"color":"red"}}"##,
    );
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().contains("#ghost"));
}

#[test]
fn test_unknown_message_type_fails_cleanly() {
    let mut s = session();
    let reply = send(&mut s, r#"{"type":"LAUNCH_MISSILES"}"#);
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().starts_with("Malformed message"));
}

#[test]
fn test_malformed_json_fails_cleanly() {
    let mut s = session();
    let reply = send(&mut s, "{\"type\": ");
    assert_eq!(reply["success"], false);
}
