//! HTTP client for the power-monitoring backend.
//!
//! Talks to the backend's JSON API using the synchronous `ureq` client.
//! GETs are read-only; the only mutating calls are the device toggle,
//! the reading push, and the chat prompt, all issued on explicit user
//! action. Responses deserialize into the types in [`crate::model`].
//!
//! Authentication is out of scope here: when the config carries a
//! session cookie or CSRF token they are forwarded verbatim, and
//! obtaining them is the user's business.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::schema::BackendConfig;
use crate::model::{
    AlertsResponse, ChatReply, DeviceLogs, DevicesResponse, ReadingAck, SuggestionsResponse,
    ToggleResponse, UsageSummary,
};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /api/reading/`.
#[derive(Debug, Serialize)]
struct ReadingRequest {
    device_id: i64,
    power_watts: f64,
}

/// Body for `POST /api/chat/`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Optional query parameters for the usage summary.
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    /// ISO date/datetime lower bound.
    pub start: Option<String>,
    /// ISO date/datetime upper bound.
    pub end: Option<String>,
    /// Restrict to one room (case-insensitive on the backend).
    pub room: Option<String>,
    /// Restrict to specific device ids; repeated `device=` parameters.
    pub devices: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend HTTP client.
///
/// Built from the resolved config and reused for the lifetime of one
/// command invocation; the dash loop keeps a single client across
/// polls.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
    csrf_token: Option<String>,
    session_cookie: Option<String>,
}

impl BackendClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        let none_if_empty = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            csrf_token: none_if_empty(&config.csrf_token),
            session_cookie: none_if_empty(&config.session_cookie),
        }
    }

    /// The backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the backend is reachable and speaks the device API.
    ///
    /// Uses a short timeout (5 s) so `wattch health` doesn't stall when
    /// the backend is down. An empty roster still counts as healthy.
    pub fn is_healthy(&self) -> bool {
        let request = self
            .get("/api/devices/")
            .timeout(Duration::from_secs(5));
        match request.call() {
            Ok(resp) => resp.into_json::<DevicesResponse>().is_ok(),
            Err(_) => false,
        }
    }

    // -- read endpoints -----------------------------------------------------

    /// Fetch the current device snapshot from `GET /api/devices/`.
    ///
    /// Each device carries up to ten recent samples, oldest first.
    pub fn fetch_devices(&self) -> Result<DevicesResponse> {
        let resp = self
            .get("/api/devices/")
            .call()
            .context("device snapshot request failed")?;
        resp.into_json()
            .context("failed to parse device snapshot response")
    }

    /// Fetch a device's sample history from `GET /api/logs/{id}/`.
    ///
    /// Samples arrive newest first, capped at 100 by the backend.
    pub fn device_logs(&self, device_id: i64) -> Result<DeviceLogs> {
        let resp = self
            .get(&format!("/api/logs/{device_id}/"))
            .call()
            .with_context(|| format!("log request for device {device_id} failed"))?;
        resp.into_json().context("failed to parse device logs")
    }

    /// Fetch aggregated usage series from `GET /api/usage/summary/`.
    pub fn usage_summary(&self, query: &UsageQuery) -> Result<UsageSummary> {
        let mut request = self.get("/api/usage/summary/");
        if let Some(start) = &query.start {
            request = request.query("start", start);
        }
        if let Some(end) = &query.end {
            request = request.query("end", end);
        }
        if let Some(room) = &query.room {
            request = request.query("room", room);
        }
        for id in &query.devices {
            request = request.query("device", &id.to_string());
        }

        let resp = request.call().context("usage summary request failed")?;
        resp.into_json().context("failed to parse usage summary")
    }

    /// Fetch high-draw alerts from `GET /api/notifications/`.
    ///
    /// `threshold` is in watts, `since_hours` bounds the lookback
    /// window; the backend defaults them to 250 W over 24 h.
    pub fn alerts(
        &self,
        threshold: Option<f64>,
        since_hours: Option<u32>,
    ) -> Result<AlertsResponse> {
        let mut request = self.get("/api/notifications/");
        if let Some(threshold) = threshold {
            request = request.query("threshold", &threshold.to_string());
        }
        if let Some(hours) = since_hours {
            request = request.query("since", &hours.to_string());
        }

        let resp = request.call().context("notifications request failed")?;
        resp.into_json().context("failed to parse alerts")
    }

    /// Fetch saving suggestions from `GET /api/suggestions/`.
    pub fn suggestions(&self) -> Result<SuggestionsResponse> {
        let resp = self
            .get("/api/suggestions/")
            .call()
            .context("suggestions request failed")?;
        resp.into_json().context("failed to parse suggestions")
    }

    // -- mutating endpoints -------------------------------------------------

    /// Flip a device's on/off state via `POST /api/toggle/{id}/`.
    ///
    /// The backend is the source of truth: the returned state is what
    /// it committed, not a local guess.
    pub fn toggle(&self, device_id: i64) -> Result<ToggleResponse> {
        let resp = self
            .post(&format!("/api/toggle/{device_id}/"))
            .call()
            .with_context(|| format!("toggle request for device {device_id} failed"))?;
        resp.into_json().context("failed to parse toggle response")
    }

    /// Push a power sample via `POST /api/reading/`.
    ///
    /// The backend derives `is_on` from the sample (anything above 1 W
    /// counts as on) and stamps `last_seen`.
    pub fn post_reading(&self, device_id: i64, power_watts: f64) -> Result<ReadingAck> {
        let body = ReadingRequest {
            device_id,
            power_watts,
        };
        let resp = self
            .post("/api/reading/")
            .send_json(&body)
            .with_context(|| format!("reading push for device {device_id} failed"))?;
        resp.into_json().context("failed to parse reading ack")
    }

    /// Ask the backend's assistant a question via `POST /api/chat/`.
    pub fn ask(&self, message: &str) -> Result<ChatReply> {
        let body = ChatRequest { message };
        let resp = self
            .post("/api/chat/")
            .send_json(&body)
            .context("chat request failed")?;

        let parsed: ChatReply = resp.into_json().context("failed to parse chat reply")?;
        if parsed.reply.trim().is_empty() {
            anyhow::bail!("backend returned an empty reply");
        }
        Ok(parsed)
    }

    // -- request builders ---------------------------------------------------

    fn get(&self, path: &str) -> ureq::Request {
        let mut request = ureq::get(&self.url(path)).timeout(self.timeout);
        if let Some(cookie) = &self.session_cookie {
            request = request.set("Cookie", cookie);
        }
        request
    }

    /// POSTs additionally carry the CSRF token when one is configured.
    fn post(&self, path: &str) -> ureq::Request {
        let mut request = ureq::post(&self.url(path)).timeout(self.timeout);
        if let Some(cookie) = &self.session_cookie {
            request = request.set("Cookie", cookie);
        }
        if let Some(token) = &self.csrf_token {
            request = request.set("X-CSRFToken", token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let config = BackendConfig::default();
        let client = BackendClient::from_config(&config);
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
        assert_eq!(client.timeout, Duration::from_millis(10_000));
        assert!(client.csrf_token.is_none());
        assert!(client.session_cookie.is_none());
    }

    #[test]
    fn client_strips_trailing_slash() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:8000/".to_string(),
            ..Default::default()
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
        assert_eq!(
            client.url("/api/devices/"),
            "http://127.0.0.1:8000/api/devices/"
        );
    }

    #[test]
    fn empty_tokens_mean_no_headers() {
        let config = BackendConfig {
            csrf_token: "abc".to_string(),
            ..Default::default()
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.csrf_token.as_deref(), Some("abc"));

        let client = BackendClient::from_config(&BackendConfig::default());
        assert!(client.csrf_token.is_none());
    }
}
