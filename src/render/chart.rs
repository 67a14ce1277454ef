//! Power-share chart.
//!
//! The terminal rendition of the dashboard's share-of-draw chart: one
//! horizontal bar per device, scaled to its share of the summed current
//! draw. Colors cycle a fixed palette in device order, so a device
//! keeps its color across frames as long as the roster order holds.

use colored::{Color, Colorize};

use super::truncate;
use crate::model::Device;

/// Bar colors, cycled by device position.
const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
];

/// Render one bar per device, in snapshot order.
///
/// Devices with no draw keep their row with an empty bar, and an
/// all-zero snapshot renders all-zero shares rather than dividing by
/// zero. An empty snapshot renders nothing; the device table already
/// shows the placeholder.
pub fn power_chart(devices: &[Device], width: usize) -> String {
    let mut out = String::new();
    if devices.is_empty() {
        return out;
    }

    let total: f64 = devices.iter().map(Device::current_draw).sum();

    for (i, device) in devices.iter().enumerate() {
        let draw = device.current_draw();
        let share = if total > 0.0 { draw / total } else { 0.0 };
        let filled = ((share * width as f64).round() as usize).min(width);

        let bar = "█".repeat(filled);
        let pad = " ".repeat(width - filled);
        let color = PALETTE[i % PALETTE.len()];

        out.push_str(&format!(
            "  {:<22} {}{} {:>7} ({:.0}%)\n",
            truncate(&device.name, 22),
            bar.color(color),
            pad,
            format!("{:.0} W", draw),
            share * 100.0,
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PowerLog;
    use chrono::{TimeZone, Utc};

    fn device(name: &str, watts: f64) -> Device {
        Device {
            id: 1,
            name: name.to_string(),
            room: String::new(),
            is_on: watts > 1.0,
            last_seen: None,
            recent_logs: vec![PowerLog {
                timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
                power_watts: watts,
            }],
        }
    }

    fn bar_cells(line: &str) -> usize {
        line.chars().filter(|c| *c == '█').count()
    }

    #[test]
    fn bars_scale_to_share_of_total() {
        let devices = vec![device("Heater", 750.0), device("Lamp", 250.0)];
        let chart = power_chart(&devices, 40);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(bar_cells(lines[0]), 30);
        assert_eq!(bar_cells(lines[1]), 10);
        assert!(lines[0].contains("(75%)"));
        assert!(lines[1].contains("(25%)"));
    }

    #[test]
    fn zero_draw_keeps_an_empty_row() {
        let devices = vec![device("Heater", 200.0), device("Idle Plug", 0.0)];
        let chart = power_chart(&devices, 40);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Idle Plug"));
        assert_eq!(bar_cells(lines[1]), 0);
        assert!(lines[1].contains("(0%)"));
    }

    #[test]
    fn all_zero_snapshot_renders_without_dividing() {
        let devices = vec![device("A", 0.0), device("B", 0.0)];
        let chart = power_chart(&devices, 20);
        for line in chart.lines() {
            assert_eq!(bar_cells(line), 0);
            assert!(line.contains("(0%)"));
        }
    }

    #[test]
    fn empty_snapshot_renders_nothing() {
        assert!(power_chart(&[], 40).is_empty());
    }

    #[test]
    fn single_device_takes_the_full_width() {
        let devices = vec![device("Everything", 42.0)];
        let chart = power_chart(&devices, 25);
        assert_eq!(bar_cells(chart.lines().next().unwrap()), 25);
        assert!(chart.contains("(100%)"));
    }
}
