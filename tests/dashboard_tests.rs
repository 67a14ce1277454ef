/// Dashboard composition tests across model, filter, stats, and render.
///
/// These run on a snapshot parsed from backend-shaped JSON — no HTTP —
/// and assert on the rendered text the way a user would see it.
use chrono::{Duration, Utc};

use wattch::config::schema::TariffConfig;
use wattch::filter::{DeviceFilter, StatusFilter};
use wattch::model::{Device, DevicesResponse};
use wattch::render::{self, chart};
use wattch::stats::build_stats;

/// Three devices as the API would report them: a busy TV, an off fan,
/// and a lamp that has never been seen and carries no room.
fn snapshot() -> Vec<Device> {
    let now = Utc::now();
    let recent = now - Duration::seconds(30);
    let payload = serde_json::json!({
        "devices": [
            {
                "id": 1, "name": "Smart TV", "room": "Living Room", "is_on": true,
                "last_seen": recent.to_rfc3339(),
                "recent_logs": [
                    {"timestamp": (now - Duration::minutes(5)).to_rfc3339(), "power_watts": 95.0},
                    {"timestamp": recent.to_rfc3339(), "power_watts": 110.0}
                ]
            },
            {
                "id": 2, "name": "Ceiling Fan", "room": "Bedroom", "is_on": false,
                "last_seen": (now - Duration::hours(3)).to_rfc3339(),
                "recent_logs": [
                    {"timestamp": (now - Duration::hours(3)).to_rfc3339(), "power_watts": 0.0}
                ]
            },
            {
                "id": 3, "name": "Desk Lamp", "is_on": true,
                "last_seen": null,
                "recent_logs": [
                    {"timestamp": recent.to_rfc3339(), "power_watts": 12.0}
                ]
            }
        ]
    });
    let parsed: DevicesResponse = serde_json::from_value(payload).unwrap();
    parsed.devices
}

// ---------------------------------------------------------------------------
// Stats over the parsed snapshot
// ---------------------------------------------------------------------------

#[test]
fn stats_cover_the_full_snapshot() {
    let devices = snapshot();
    let stats = build_stats(&devices, 6.0);

    assert_eq!(stats.total_devices, 3);
    assert_eq!(stats.active_devices, 2);
    assert_eq!(stats.total_power_watts, 122.0);
    assert_eq!(stats.peak_usage_watts, 110.0);
    assert_eq!(stats.efficiency_pct, 67);
}

#[test]
fn stat_cards_show_counts_currency_and_efficiency() {
    let devices = snapshot();
    let stats = build_stats(&devices, 6.0);
    let cards = render::stat_cards(&stats, &TariffConfig::default());

    assert!(cards.contains("2 / 3"));
    assert!(cards.contains("122 W"));
    assert!(cards.contains("₹527.04"));
    assert!(cards.contains("40.7 W"));
    assert!(cards.contains("2.9 kWh"));
    assert!(cards.contains("67%"));
}

// ---------------------------------------------------------------------------
// Filtered list vs. unfiltered stats
// ---------------------------------------------------------------------------

#[test]
fn filtered_table_and_full_stats_disagree_on_purpose() {
    let devices = snapshot();
    let filter = DeviceFilter::new(None, None, StatusFilter::from_str_opt(Some("on")));
    let visible = filter.apply(&devices);

    assert_eq!(visible.len(), 2);
    let table = render::device_table(&visible, Utc::now());
    assert!(table.contains("2 devices"));
    assert!(table.contains("Smart TV"));
    assert!(!table.contains("Ceiling Fan"));

    // aggregates always come from the full snapshot
    let stats = build_stats(&devices, 6.0);
    assert_eq!(stats.total_devices, 3);
    assert_eq!(stats.total_power_watts, 122.0);
}

#[test]
fn search_matches_rooms_too() {
    let devices = snapshot();
    let filter = DeviceFilter::new(Some("bedroom".to_string()), None, None);
    let visible = filter.apply(&devices);

    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name, "Ceiling Fan");
}

// ---------------------------------------------------------------------------
// Rendered regions
// ---------------------------------------------------------------------------

#[test]
fn device_table_shows_age_buckets_and_missing_rooms() {
    let devices = snapshot();
    let refs: Vec<&Device> = devices.iter().collect();
    let table = render::device_table(&refs, Utc::now());

    assert!(table.contains("Just now"));
    assert!(table.contains("3h ago"));
    assert!(table.contains("Never"));
    assert!(table.contains("Unknown"));
}

#[test]
fn chart_shares_follow_current_draw() {
    let devices = snapshot();
    let rendered = chart::power_chart(&devices, 40);

    // 110 W and 12 W of a 122 W total, plus an idle fan
    assert!(rendered.contains("Smart TV"));
    assert!(rendered.contains("(90%)"));
    assert!(rendered.contains("(10%)"));
    assert!(rendered.contains("(0%)"));
}

#[test]
fn activity_feed_reads_latest_samples() {
    let devices = snapshot();
    let feed = render::activity_feed(&devices, 10, Utc::now());

    assert!(feed.contains("Smart TV consuming 110W"));
    assert!(feed.contains("Ceiling Fan consuming 0W"));
    assert!(feed.contains("Desk Lamp consuming 12W"));
}
