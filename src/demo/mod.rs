//! Built-in demo backend.
//!
//! A stand-in for the real power-monitoring API (sync, via `tiny_http`)
//! so the dashboard and the one-shot commands can run against live data
//! without a deployment: `wattch demo` in one terminal, point
//! `WATTCH_BASE_URL` at it in another. Serves the same routes and JSON
//! shapes from an in-memory roster of synthetic devices.
//!
//! Launched via `wattch demo` (default: `http://127.0.0.1:8641`).

mod state;

use std::io::{Cursor, Read};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use state::{DemoState, UsageFilter};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the demo backend on the given address and serve forever.
///
/// Blocks the current thread. Handles requests sequentially (sufficient
/// for one dashboard polling it).
pub fn serve(addr: &str, device_count: usize) -> Result<()> {
    let server = DemoServer::bind(addr, device_count)?;
    let local = server.local_addr();

    println!("wattch demo backend running at http://{local}");
    println!("Point the client at it: WATTCH_BASE_URL=http://{local} wattch dash");
    println!("Press Ctrl+C to stop.\n");

    server.run();
    Ok(())
}

/// A bound demo backend. Binding and serving are split so tests can
/// bind to port 0 and learn the assigned port before serving.
pub struct DemoServer {
    server: Server,
    state: Mutex<DemoState>,
}

impl DemoServer {
    /// Bind the listener and seed the device roster.
    pub fn bind(addr: &str, device_count: usize) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow::anyhow!("failed to start demo backend on {addr}: {e}"))?;
        Ok(Self {
            server,
            state: Mutex::new(DemoState::seed(device_count)),
        })
    }

    /// The address actually bound, e.g. `127.0.0.1:8641`.
    pub fn local_addr(&self) -> String {
        self.server
            .server_addr()
            .to_ip()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    /// Serve requests until the process exits. Errors are contained
    /// per-request; a failing handler answers 500 without taking the
    /// server down.
    pub fn run(&self) {
        for mut request in self.server.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();

            // Read body up-front for methods that carry one
            let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
                let mut buf = String::new();
                let _ = request.as_reader().read_to_string(&mut buf);
                Some(buf)
            } else {
                None
            };

            match self.dispatch(&method, &url, body.as_deref()) {
                Ok(resp) => {
                    let _ = request.respond(resp);
                }
                Err(e) => {
                    let body = serde_json::json!({ "error": e.to_string() }).to_string();
                    let resp = Response::from_data(body.as_bytes().to_vec())
                        .with_header(content_type_json())
                        .with_status_code(StatusCode(500));
                    let _ = request.respond(resp);
                }
            }

            // Brief access log
            println!(
                "{} {} {}",
                method,
                url,
                chrono::Local::now().format("%H:%M:%S")
            );
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, DemoState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("demo state lock poisoned"))
    }

    // -----------------------------------------------------------------------
    // Router
    // -----------------------------------------------------------------------

    /// Dispatch an incoming request to the matching handler.
    fn dispatch(
        &self,
        method: &Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<Response<Cursor<Vec<u8>>>> {
        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (&Method::Get, "/api/devices/") => json_response(&self.state()?.devices_payload()),
            (&Method::Get, "/api/usage/summary/") => {
                json_response(&self.state()?.usage_summary(&parse_usage_query(url)))
            }
            (&Method::Get, "/api/notifications/") => {
                let threshold = query_param(url, "threshold")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(250.0);
                let since_hours = query_param(url, "since")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24);
                json_response(&self.state()?.alerts(threshold, since_hours))
            }
            (&Method::Get, "/api/suggestions/") => json_response(&self.state()?.suggestions()),
            (&Method::Post, "/api/reading/") => self.post_reading(body.unwrap_or("{}")),
            (&Method::Post, "/api/chat/") => self.post_chat(body.unwrap_or("{}")),
            (&Method::Post, _) if path.starts_with("/api/toggle/") => self.post_toggle(path),
            (&Method::Get, _) if path.starts_with("/api/logs/") => self.get_logs(path),
            _ => Ok(not_found()),
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// `POST /api/toggle/{id}/` — flip a device and stamp `last_seen`.
    fn post_toggle(&self, path: &str) -> Result<Response<Cursor<Vec<u8>>>> {
        let Some(id) = route_id(path, "/api/toggle/") else {
            return Ok(not_found());
        };
        match self.state()?.toggle(id) {
            Some(ack) => json_response(&ack),
            None => Ok(not_found()),
        }
    }

    /// `GET /api/logs/{id}/` — up to 100 readings, newest first.
    fn get_logs(&self, path: &str) -> Result<Response<Cursor<Vec<u8>>>> {
        let Some(id) = route_id(path, "/api/logs/") else {
            return Ok(not_found());
        };
        match self.state()?.device_logs(id) {
            Some(logs) => json_response(&logs),
            None => Ok(not_found()),
        }
    }

    /// `POST /api/reading/` — record a sample; `is_on` follows it.
    fn post_reading(&self, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
        let Ok(reading) = serde_json::from_str::<ReadingBody>(body) else {
            return Ok(bad_request("invalid reading payload"));
        };
        match self
            .state()?
            .record_reading(reading.device_id, reading.power_watts)
        {
            Some(ack) => json_response(&ack),
            None => Ok(not_found()),
        }
    }

    /// `POST /api/chat/` — canned local replies keyed on the message.
    fn post_chat(&self, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
        let chat: ChatBody = serde_json::from_str(body).unwrap_or_default();
        json_response(&state::chat_reply(&chat.message))
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReadingBody {
    device_id: i64,
    power_watts: f64,
}

#[derive(Deserialize, Default)]
struct ChatBody {
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

/// Extract the numeric id from paths shaped like `/api/toggle/3/`.
fn route_id(path: &str, prefix: &str) -> Option<i64> {
    path.strip_prefix(prefix)?.trim_end_matches('/').parse().ok()
}

/// Fetch a single query parameter, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key { Some(decode_component(v)) } else { None }
    })
}

/// Parse the usage summary filters: `start`/`end` ISO datetimes, a
/// `room` name, and any number of repeated `device` ids.
fn parse_usage_query(url: &str) -> UsageFilter {
    let mut filter = UsageFilter::default();
    let Some(query) = url.split('?').nth(1) else {
        return filter;
    };
    for pair in query.split('&') {
        let Some((key, raw)) = pair.split_once('=') else {
            continue;
        };
        let value = decode_component(raw);
        match key {
            "start" => filter.start = parse_iso(&value),
            "end" => filter.end = parse_iso(&value),
            "room" if !value.is_empty() => filter.room = Some(value),
            "device" => {
                if let Ok(id) = value.parse() {
                    filter.device_ids.push(id);
                }
            }
            _ => {}
        }
    }
    filter
}

/// Parse an ISO timestamp; naive values are taken as UTC, bare dates as
/// midnight.
fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decode a percent-encoded query value; `+` decodes to a space.
fn decode_component(raw: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut bytes = raw.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => match (bytes.next(), bytes.next()) {
                (Some(hi), Some(lo)) => {
                    let hex = [hi, lo];
                    let decoded = std::str::from_utf8(&hex)
                        .ok()
                        .and_then(|text| u8::from_str_radix(text, 16).ok());
                    match decoded {
                        Some(value) => out.push(value),
                        None => out.extend_from_slice(&[b'%', hi, lo]),
                    }
                }
                (Some(hi), None) => out.extend_from_slice(&[b'%', hi]),
                (None, _) => out.push(b'%'),
            },
            other => out.push(other),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// 400 response.
fn bad_request(detail: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": detail }).to_string();
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(400))
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
