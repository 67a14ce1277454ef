use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};
use wattch::demo::DemoServer;

/// Boot a demo backend and return its base URL. The serving thread is
/// detached; it dies with the test process.
fn boot(device_count: usize) -> String {
    let server = Arc::new(DemoServer::bind("127.0.0.1:0", device_count).unwrap());
    let addr = server.local_addr();
    let serving = Arc::clone(&server);
    thread::spawn(move || serving.run());
    format!("http://{addr}")
}

fn get_json(url: &str) -> Value {
    ureq::get(url).call().unwrap().into_json().unwrap()
}

fn error_status(err: ureq::Error) -> u16 {
    match err {
        ureq::Error::Status(code, _) => code,
        other => panic!("expected a status error, got: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[test]
fn devices_payload_carries_the_expected_fields() {
    let base = boot(4);
    let payload = get_json(&format!("{base}/api/devices/"));

    let devices = payload["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 4);

    let first = &devices[0];
    assert!(first["id"].is_i64());
    assert!(first["name"].is_string());
    assert!(first["room"].is_string());
    assert!(first["is_on"].is_boolean());
    assert!(first["last_seen"].is_string());

    let logs = first["recent_logs"].as_array().unwrap();
    assert!(!logs.is_empty() && logs.len() <= 10);
    assert!(logs[0]["timestamp"].is_string());
    assert!(logs[0]["power_watts"].is_number());
}

#[test]
fn logs_payload_names_the_device() {
    let base = boot(2);
    let payload = get_json(&format!("{base}/api/logs/2/"));

    assert!(payload["device"].is_string());
    let logs = payload["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 100);
}

#[test]
fn usage_summary_has_series_and_units() {
    let base = boot(5);
    let summary = get_json(&format!("{base}/api/usage/summary/"));

    assert!(!summary["daily"].as_array().unwrap().is_empty());
    assert!(summary["weekly"].is_array());
    assert!(summary["monthly"].is_array());
    assert_eq!(summary["units"], "W (average)");

    let top = summary["top_devices"].as_array().unwrap();
    assert!(!top.is_empty() && top.len() <= 5);
    assert!(top[0]["avg_power"].is_number());
    assert!(top[0]["name"].is_string());
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[test]
fn toggle_returns_the_new_state() {
    let base = boot(2);
    let before = get_json(&format!("{base}/api/devices/"));
    let was_on = before["devices"][0]["is_on"].as_bool().unwrap();

    let ack: Value = ureq::post(&format!("{base}/api/toggle/1/"))
        .call()
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(ack["id"], 1);
    assert_eq!(ack["is_on"], !was_on);
}

#[test]
fn reading_endpoint_validates_the_body() {
    let base = boot(1);

    let err = ureq::post(&format!("{base}/api/reading/"))
        .send_string("not json")
        .unwrap_err();
    assert_eq!(error_status(err), 400);

    let ack: Value = ureq::post(&format!("{base}/api/reading/"))
        .send_json(json!({"device_id": 1, "power_watts": 42.0}))
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(ack["status"], "ok");
}

// ---------------------------------------------------------------------------
// Routing errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_device_and_unknown_route_answer_404() {
    let base = boot(1);

    let err = ureq::post(&format!("{base}/api/toggle/42/"))
        .call()
        .unwrap_err();
    assert_eq!(error_status(err), 404);

    let err = ureq::get(&format!("{base}/api/nope/")).call().unwrap_err();
    assert_eq!(error_status(err), 404);
}

#[test]
fn method_mismatch_falls_through_the_router() {
    let base = boot(1);
    // toggling is POST-only
    let err = ureq::get(&format!("{base}/api/toggle/1/"))
        .call()
        .unwrap_err();
    assert_eq!(error_status(err), 404);
}

// ---------------------------------------------------------------------------
// Query parameters and chat
// ---------------------------------------------------------------------------

#[test]
fn notifications_honor_query_parameters() {
    let base = boot(8);

    let quiet = get_json(&format!("{base}/api/notifications/?threshold=999999"));
    assert!(quiet["alerts"].as_array().unwrap().is_empty());

    let busy = get_json(&format!("{base}/api/notifications/?threshold=0&since=48"));
    let alerts = busy["alerts"].as_array().unwrap();
    assert!(!alerts.is_empty() && alerts.len() <= 100);
    let first = &alerts[0];
    assert!(first["device"].is_string());
    assert!(first["power_watts"].is_number());
    assert!(first["action"].as_str().unwrap().contains("turning off"));
}

#[test]
fn chat_replies_locally() {
    let base = boot(1);

    let greeting: Value = ureq::post(&format!("{base}/api/chat/"))
        .send_json(json!({"message": ""}))
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(greeting["source"], "local");
    assert!(greeting["reply"].as_str().unwrap().starts_with("Hi!"));

    let billing: Value = ureq::post(&format!("{base}/api/chat/"))
        .send_json(json!({"message": "why is my bill so high?"}))
        .unwrap()
        .into_json()
        .unwrap();
    assert!(billing["reply"].as_str().unwrap().contains("save ~5-10%"));
}
