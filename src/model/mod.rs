//! Wire types for the power-monitoring backend API.
//!
//! Field names match the backend's JSON byte for byte, so every struct
//! here derives both `Serialize` and `Deserialize`: the client parses
//! them and the demo backend emits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Devices and samples
// ---------------------------------------------------------------------------

/// A single power sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLog {
    pub timestamp: DateTime<Utc>,
    pub power_watts: f64,
}

/// A device as reported by `GET /api/devices/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    /// Empty string when no room is assigned.
    #[serde(default)]
    pub room: String,
    pub is_on: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    /// Up to ten samples, oldest first — the latest sample is last.
    #[serde(default)]
    pub recent_logs: Vec<PowerLog>,
}

impl Device {
    /// Current draw in watts: the latest sample, or 0.0 when nothing has
    /// been logged yet.
    pub fn current_draw(&self) -> f64 {
        self.recent_logs.last().map_or(0.0, |log| log.power_watts)
    }

    /// Room name for display; unassigned rooms show as "Unknown".
    pub fn display_room(&self) -> &str {
        if self.room.is_empty() {
            "Unknown"
        } else {
            &self.room
        }
    }

    /// Category inferred from the device name.
    pub fn kind(&self) -> DeviceKind {
        DeviceKind::from_name(&self.name)
    }
}

/// Device category inferred from keywords in the device name.
///
/// Drives the tag column in the device table and the watt ranges the
/// demo backend uses when generating readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Light,
    Tv,
    Fan,
    Climate,
    Computer,
    Phone,
    Router,
    Other,
}

impl DeviceKind {
    /// Classify a device by name. Keywords are checked in a fixed order,
    /// so "PC Fan" is a fan, not a computer.
    pub fn from_name(name: &str) -> Self {
        let n = name.to_lowercase();
        if n.contains("light") || n.contains("lamp") {
            Self::Light
        } else if n.contains("tv") || n.contains("television") {
            Self::Tv
        } else if n.contains("fan") {
            Self::Fan
        } else if n.contains("heater") || n.contains("cooler") {
            Self::Climate
        } else if n.contains("computer") || n.contains("pc") {
            Self::Computer
        } else if n.contains("phone") || n.contains("mobile") {
            Self::Phone
        } else if n.contains("router") || n.contains("wifi") {
            Self::Router
        } else {
            Self::Other
        }
    }

    /// Short tag for table display.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Tv => "tv",
            Self::Fan => "fan",
            Self::Climate => "climate",
            Self::Computer => "pc",
            Self::Phone => "phone",
            Self::Router => "wifi",
            Self::Other => "device",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// Envelope for `GET /api/devices/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// Response from `POST /api/toggle/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub id: i64,
    pub is_on: bool,
}

/// Response from `GET /api/logs/{id}/`.
///
/// Unlike `recent_logs` on a device snapshot, these arrive newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLogs {
    pub device: String,
    pub logs: Vec<PowerLog>,
}

/// One point in a usage series. `date` is the bucket start as the
/// backend sends it (an ISO datetime for day/week/month buckets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePoint {
    pub date: String,
    pub value: f64,
}

/// A top consumer in the usage summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopDevice {
    pub id: i64,
    pub name: String,
    pub avg_power: f64,
}

/// Response from `GET /api/usage/summary/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub daily: Vec<UsagePoint>,
    pub weekly: Vec<UsagePoint>,
    pub monthly: Vec<UsagePoint>,
    pub top_devices: Vec<TopDevice>,
    pub units: String,
}

/// A high-draw alert from `GET /api/notifications/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub device_id: i64,
    pub device: String,
    #[serde(default)]
    pub room: String,
    pub power_watts: f64,
    pub timestamp: DateTime<Utc>,
    pub action: String,
}

/// Envelope for `GET /api/notifications/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

/// A saving suggestion from `GET /api/suggestions/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub device_id: i64,
    pub device: String,
    #[serde(default)]
    pub room: String,
    pub avg_power: f64,
    pub suggestion: String,
    pub expected_savings_rs: f64,
}

/// Envelope for `GET /api/suggestions/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Ack from `POST /api/reading/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingAck {
    pub status: String,
}

/// Reply from `POST /api/chat/`.
///
/// `source` tags where the answer came from: `local` for the backend's
/// rule-based fallback, `openai` when it proxied a model, `error` when
/// the proxy failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_log(watts: f64) -> PowerLog {
        PowerLog {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            power_watts: watts,
        }
    }

    fn sample_device(name: &str, logs: Vec<PowerLog>) -> Device {
        Device {
            id: 1,
            name: name.to_string(),
            room: "Living Room".to_string(),
            is_on: true,
            last_seen: None,
            recent_logs: logs,
        }
    }

    #[test]
    fn current_draw_uses_latest_sample() {
        let device = sample_device("Lamp", vec![sample_log(10.0), sample_log(42.5)]);
        assert_eq!(device.current_draw(), 42.5);
    }

    #[test]
    fn current_draw_is_zero_without_samples() {
        let device = sample_device("Lamp", vec![]);
        assert_eq!(device.current_draw(), 0.0);
    }

    #[test]
    fn display_room_falls_back_to_unknown() {
        let mut device = sample_device("Lamp", vec![]);
        assert_eq!(device.display_room(), "Living Room");
        device.room.clear();
        assert_eq!(device.display_room(), "Unknown");
    }

    #[test]
    fn kind_matches_name_keywords() {
        assert_eq!(DeviceKind::from_name("Ceiling Lamp"), DeviceKind::Light);
        assert_eq!(DeviceKind::from_name("Smart TV"), DeviceKind::Tv);
        assert_eq!(DeviceKind::from_name("Desk Fan"), DeviceKind::Fan);
        assert_eq!(DeviceKind::from_name("Water Heater"), DeviceKind::Climate);
        assert_eq!(DeviceKind::from_name("Air Cooler"), DeviceKind::Climate);
        assert_eq!(DeviceKind::from_name("Gaming PC"), DeviceKind::Computer);
        assert_eq!(DeviceKind::from_name("Phone Charger"), DeviceKind::Phone);
        assert_eq!(DeviceKind::from_name("WiFi Router"), DeviceKind::Router);
        assert_eq!(DeviceKind::from_name("Mystery Box"), DeviceKind::Other);
    }

    #[test]
    fn kind_keyword_order_is_fixed() {
        // "fan" is checked before "pc", so a PC fan classifies as a fan.
        assert_eq!(DeviceKind::from_name("PC Fan"), DeviceKind::Fan);
    }

    #[test]
    fn device_deserializes_backend_json() {
        let json = r#"{
            "id": 3,
            "name": "Bedroom Light",
            "room": "",
            "is_on": false,
            "last_seen": null,
            "recent_logs": [
                {"timestamp": "2025-06-01T11:59:00+00:00", "power_watts": 0.0}
            ]
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.id, 3);
        assert!(device.room.is_empty());
        assert!(device.last_seen.is_none());
        assert_eq!(device.recent_logs.len(), 1);
        assert_eq!(device.current_draw(), 0.0);
    }

    #[test]
    fn device_tolerates_missing_optional_fields() {
        let json = r#"{"id": 9, "name": "Plug", "is_on": true}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert!(device.room.is_empty());
        assert!(device.recent_logs.is_empty());
        assert!(device.last_seen.is_none());
    }

    #[test]
    fn devices_response_roundtrips() {
        let json = r#"{"devices": [{"id": 1, "name": "TV", "room": "Hall",
            "is_on": true, "last_seen": "2025-06-01T12:00:00+00:00",
            "recent_logs": []}]}"#;
        let parsed: DevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.devices.len(), 1);
        assert_eq!(parsed.devices[0].name, "TV");
        assert!(parsed.devices[0].last_seen.is_some());
    }
}
