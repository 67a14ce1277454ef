//! In-memory roster behind the demo backend.
//!
//! Seeded at startup with a fixed set of household devices and roughly
//! eight days of synthetic readings, then mutated by toggle and reading
//! requests the same way the real backend mutates its database.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::Rng;

use crate::model::{
    Alert, AlertsResponse, ChatReply, Device, DeviceKind, DeviceLogs, DevicesResponse, PowerLog,
    ReadingAck, Suggestion, SuggestionsResponse, ToggleResponse, TopDevice, UsagePoint,
    UsageSummary,
};

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// Demo devices: name, room, and whether the device starts switched on.
const ROSTER: [(&str, &str, bool); 10] = [
    ("Living Room Light", "Living Room", true),
    ("Smart TV", "Living Room", true),
    ("Ceiling Fan", "Bedroom", true),
    ("Room Heater", "Bedroom", false),
    ("Desk Computer", "Office", true),
    ("Phone Charger", "Office", false),
    ("WiFi Router", "Hallway", true),
    ("Kitchen Light", "Kitchen", true),
    ("Water Purifier", "Kitchen", true),
    ("Washing Machine", "Utility", false),
];

/// Readings generated per device at seed time, two hours apart.
const SEED_SAMPLES: usize = 100;
const SAMPLE_SPACING_HOURS: i64 = 2;

/// Typical steady-state draw in watts for each device category.
fn watt_range(kind: DeviceKind) -> (f64, f64) {
    match kind {
        DeviceKind::Light => (8.0, 15.0),
        DeviceKind::Tv => (80.0, 140.0),
        DeviceKind::Fan => (45.0, 75.0),
        DeviceKind::Climate => (900.0, 1500.0),
        DeviceKind::Computer => (120.0, 250.0),
        DeviceKind::Phone => (4.0, 12.0),
        DeviceKind::Router => (6.0, 10.0),
        DeviceKind::Other => (30.0, 60.0),
    }
}

/// Synthetic reading history, oldest first: steady draw inside the
/// category's band with occasional spikes above it. Devices seeded as
/// off end on a 0 W reading so `is_on` and the latest sample agree.
fn generate_history(
    rng: &mut impl Rng,
    kind: DeviceKind,
    is_on: bool,
    now: DateTime<Utc>,
) -> Vec<PowerLog> {
    let (lo, hi) = watt_range(kind);
    let mut logs = Vec::with_capacity(SEED_SAMPLES);
    for i in 0..SEED_SAMPLES {
        let age_hours = (SEED_SAMPLES - 1 - i) as i64 * SAMPLE_SPACING_HOURS;
        let last = i == SEED_SAMPLES - 1;
        let power_watts = if last && !is_on {
            0.0
        } else if rng.gen_bool(0.05) {
            (hi * rng.gen_range(1.2..1.8)).round()
        } else {
            rng.gen_range(lo..hi).round()
        };
        logs.push(PowerLog {
            timestamp: now - Duration::hours(age_hours),
            power_watts,
        });
    }
    logs
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One demo device with its full reading history, oldest first.
struct DemoDevice {
    id: i64,
    name: String,
    room: String,
    is_on: bool,
    last_seen: Option<DateTime<Utc>>,
    logs: Vec<PowerLog>,
}

impl DemoDevice {
    /// Wire-shape snapshot with the last ten readings, oldest first.
    fn snapshot(&self) -> Device {
        let tail = self.logs.len().saturating_sub(10);
        Device {
            id: self.id,
            name: self.name.clone(),
            room: self.room.clone(),
            is_on: self.is_on,
            last_seen: self.last_seen,
            recent_logs: self.logs[tail..].to_vec(),
        }
    }
}

/// Parsed query filters for the usage summary endpoint.
#[derive(Debug, Default)]
pub(crate) struct UsageFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub room: Option<String>,
    pub device_ids: Vec<i64>,
}

/// The whole demo backend state: a roster of devices and their logs.
pub(crate) struct DemoState {
    devices: Vec<DemoDevice>,
}

impl DemoState {
    /// Seed the roster with synthetic history. `device_count` is clamped
    /// to the built-in roster size.
    pub(crate) fn seed(device_count: usize) -> Self {
        let now = Utc::now();
        let count = device_count.clamp(1, ROSTER.len());
        let mut rng = rand::thread_rng();

        let devices = ROSTER[..count]
            .iter()
            .enumerate()
            .map(|(i, &(name, room, is_on))| {
                let logs = generate_history(&mut rng, DeviceKind::from_name(name), is_on, now);
                DemoDevice {
                    id: i as i64 + 1,
                    name: name.to_string(),
                    room: room.to_string(),
                    is_on,
                    last_seen: logs.last().map(|log| log.timestamp),
                    logs,
                }
            })
            .collect();

        Self { devices }
    }

    /// `GET /api/devices/` payload.
    pub(crate) fn devices_payload(&self) -> DevicesResponse {
        DevicesResponse {
            devices: self.devices.iter().map(DemoDevice::snapshot).collect(),
        }
    }

    /// Flip a device and stamp `last_seen`. `None` for unknown ids.
    pub(crate) fn toggle(&mut self, id: i64) -> Option<ToggleResponse> {
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        device.is_on = !device.is_on;
        device.last_seen = Some(Utc::now());
        Some(ToggleResponse {
            id: device.id,
            is_on: device.is_on,
        })
    }

    /// Up to 100 readings for one device, newest first.
    pub(crate) fn device_logs(&self, id: i64) -> Option<DeviceLogs> {
        let device = self.devices.iter().find(|d| d.id == id)?;
        let logs = device.logs.iter().rev().take(100).cloned().collect();
        Some(DeviceLogs {
            device: device.name.clone(),
            logs,
        })
    }

    /// Record a sample; `is_on` follows the reading, matching the real
    /// backend's rule that anything above 1 W counts as on.
    pub(crate) fn record_reading(&mut self, id: i64, power_watts: f64) -> Option<ReadingAck> {
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        let now = Utc::now();
        device.logs.push(PowerLog {
            timestamp: now,
            power_watts,
        });
        device.is_on = power_watts > 1.0;
        device.last_seen = Some(now);
        Some(ReadingAck {
            status: "ok".to_string(),
        })
    }

    /// Usage series the real backend computes with SQL date truncation:
    /// per-day averages over the requested window (default last 30 days),
    /// per-week over the last twelve weeks, per-month over the last
    /// twelve months, plus the five heaviest devices by average draw.
    pub(crate) fn usage_summary(&self, filter: &UsageFilter) -> UsageSummary {
        let now = Utc::now();
        let start = filter.start.unwrap_or_else(|| now - Duration::days(30));
        let end = filter.end.unwrap_or(now);

        let selected: Vec<(&DemoDevice, &PowerLog)> = self
            .devices
            .iter()
            .filter(|d| {
                filter
                    .room
                    .as_deref()
                    .map_or(true, |room| d.room.eq_ignore_ascii_case(room))
            })
            .filter(|d| filter.device_ids.is_empty() || filter.device_ids.contains(&d.id))
            .flat_map(|d| d.logs.iter().map(move |log| (d, log)))
            .filter(|(_, log)| log.timestamp >= start && log.timestamp <= end)
            .collect();

        UsageSummary {
            daily: bucket_series(&selected, start, |day| day),
            weekly: bucket_series(&selected, now - Duration::weeks(12), week_start),
            monthly: bucket_series(&selected, now - Duration::days(365), month_start),
            top_devices: top_devices(&selected, 5),
            units: "W (average)".to_string(),
        }
    }

    /// Readings at or above `threshold` within the last `since_hours`,
    /// newest first, capped at 100.
    pub(crate) fn alerts(&self, threshold: f64, since_hours: u32) -> AlertsResponse {
        let since = Utc::now() - Duration::hours(i64::from(since_hours));
        let mut alerts: Vec<Alert> = self
            .devices
            .iter()
            .flat_map(|d| d.logs.iter().map(move |log| (d, log)))
            .filter(|(_, log)| log.timestamp >= since && log.power_watts >= threshold)
            .map(|(device, log)| Alert {
                device_id: device.id,
                device: device.name.clone(),
                room: device.room.clone(),
                power_watts: log.power_watts,
                timestamp: log.timestamp,
                action: "Consider turning off or reducing usage".to_string(),
            })
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        alerts.truncate(100);
        AlertsResponse { alerts }
    }

    /// Auto-shutdown suggestions for the heaviest devices over the last
    /// seven days. Devices averaging under 10 W are skipped.
    pub(crate) fn suggestions(&self) -> SuggestionsResponse {
        let since = Utc::now() - Duration::days(7);
        let mut ranked: Vec<(&DemoDevice, f64)> = self
            .devices
            .iter()
            .filter_map(|device| {
                let recent: Vec<f64> = device
                    .logs
                    .iter()
                    .filter(|log| log.timestamp >= since)
                    .map(|log| log.power_watts)
                    .collect();
                if recent.is_empty() {
                    return None;
                }
                let avg = recent.iter().sum::<f64>() / recent.len() as f64;
                Some((device, avg))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(10);

        let suggestions = ranked
            .into_iter()
            .filter(|&(_, avg)| avg >= 10.0)
            .map(|(device, avg)| Suggestion {
                device_id: device.id,
                device: device.name.clone(),
                room: device.room.clone(),
                avg_power: round1(avg),
                suggestion: "Schedule auto-shutdown during off-hours".to_string(),
                // ₹6 per kWh, eight idle hours a day, over a month
                expected_savings_rs: round2(avg * 6.0 * 8.0 * 30.0 / 1000.0),
            })
            .collect();
        SuggestionsResponse { suggestions }
    }
}

/// Canned assistant replies keyed on words in the message.
pub(crate) fn chat_reply(message: &str) -> ChatReply {
    let prompt = message.trim();
    let reply = if prompt.is_empty() {
        "Hi! Ask me about power usage, devices, or automation."
    } else {
        let p = prompt.to_lowercase();
        if p.contains("save") || p.contains("reduce") {
            "Try scheduling high-consumption devices off at night and enable auto-shutdown on idle."
        } else if p.contains("peak") {
            "Peak usage is typically early evening. Consider delaying washing machine or heater cycles."
        } else if p.contains("cost") || p.contains("bill") {
            "Based on current averages, lowering AC by 1°C can save ~5-10% monthly."
        } else if p.contains("device") || p.contains("which") {
            "Top consumers this week are TVs, ACs, and computers. Check the Compare page for details."
        } else {
            "I can help with devices, schedules, and savings tips. Ask me about top-consuming devices or how to cut costs."
        }
    };
    ChatReply {
        reply: reply.to_string(),
        source: "local".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Aggregation helpers
// ---------------------------------------------------------------------------

/// Average readings into buckets keyed by `bucket(day)`, skipping rows
/// before `not_before`. Bucket starts render as ISO midnights.
fn bucket_series<F>(
    rows: &[(&DemoDevice, &PowerLog)],
    not_before: DateTime<Utc>,
    bucket: F,
) -> Vec<UsagePoint>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (_, log) in rows {
        if log.timestamp < not_before {
            continue;
        }
        let key = bucket(log.timestamp.date_naive());
        let slot = buckets.entry(key).or_insert((0.0, 0));
        slot.0 += log.power_watts;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(day, (sum, count))| UsagePoint {
            date: format!("{day}T00:00:00Z"),
            value: round2(sum / count as f64),
        })
        .collect()
}

/// The `limit` heaviest devices by average draw over the given rows.
fn top_devices(rows: &[(&DemoDevice, &PowerLog)], limit: usize) -> Vec<TopDevice> {
    let mut totals: BTreeMap<i64, (&str, f64, usize)> = BTreeMap::new();
    for (device, log) in rows {
        let slot = totals
            .entry(device.id)
            .or_insert((device.name.as_str(), 0.0, 0));
        slot.1 += log.power_watts;
        slot.2 += 1;
    }
    let mut top: Vec<TopDevice> = totals
        .into_iter()
        .map(|(id, (name, sum, count))| TopDevice {
            id,
            name: name.to_string(),
            avg_power: round2(sum / count as f64),
        })
        .collect();
    top.sort_by(|a, b| b.avg_power.total_cmp(&a.avg_power));
    top.truncate(limit);
    top
}

/// Monday of the week containing `day`.
fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// First day of the month containing `day`.
fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
