//! Terminal rendering for the dashboard regions.
//!
//! Every function here builds a `String` instead of printing, so the
//! live dashboard can compose a whole frame and redraw it atomically,
//! and the one-shot commands can print the same regions directly.
//! Colors go on fixed-width or whole-line pieces only; padded columns
//! are formatted plain first so ANSI codes never skew the widths.

pub mod chart;

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::config::schema::TariffConfig;
use crate::model::Device;
use crate::stats::DashboardStats;

// ---------------------------------------------------------------------------
// Device list
// ---------------------------------------------------------------------------

/// Render the device list region: a count label, column headers, and
/// one row per device. `devices` is the filtered view; pass the full
/// snapshot when no filter is active.
pub fn device_table(devices: &[&Device], now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let count = devices.len();
    let label = format!("{} device{}", count, if count == 1 { "" } else { "s" });
    out.push_str(&format!("  {}\n", label.bold()));

    if devices.is_empty() {
        out.push_str(&format!("  {}\n", "No devices found".yellow()));
        return out;
    }

    out.push_str(&format!(
        "  {:<8} {:<22} {:<14} {:<5} {:>8} Last seen\n",
        "Type", "Device", "Room", "State", "Draw"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(70)));

    for device in devices {
        let state = if device.is_on {
            "ON   ".green()
        } else {
            "OFF  ".red()
        };
        let draw = format!("{:.0} W", device.current_draw());
        out.push_str(&format!(
            "  {:<8} {:<22} {:<14} {} {:>8} {}\n",
            device.kind().tag(),
            truncate(&device.name, 22),
            truncate(device.display_room(), 14),
            state,
            draw,
            time_ago(device.last_seen, now),
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Stat cards
// ---------------------------------------------------------------------------

/// Render the aggregate summary block.
pub fn stat_cards(stats: &DashboardStats, tariff: &TariffConfig) -> String {
    let mut out = String::new();
    let money = format!("{}{:.2}", tariff.currency, stats.monthly_savings);

    out.push_str(&format!(
        "  {} {} / {}\n",
        "Active devices: ".bold(),
        stats.active_devices,
        stats.total_devices
    ));
    out.push_str(&format!(
        "  {} {} W\n",
        "Total power:    ".bold(),
        format_number(stats.total_power_watts.round() as usize)
    ));
    out.push_str(&format!("  {} {}\n", "Monthly savings:".bold(), money));
    out.push_str(&format!(
        "  {} {:.1} W\n",
        "Average usage:  ".bold(),
        stats.avg_usage_watts
    ));
    out.push_str(&format!(
        "  {} {:.0} W\n",
        "Peak usage:     ".bold(),
        stats.peak_usage_watts
    ));
    out.push_str(&format!(
        "  {} {:.1} kWh\n",
        "Daily usage:    ".bold(),
        stats.daily_usage_kwh
    ));
    out.push_str(&format!(
        "  {} {}%\n",
        "Efficiency:     ".bold(),
        stats.efficiency_pct
    ));

    out
}

// ---------------------------------------------------------------------------
// Activity feed
// ---------------------------------------------------------------------------

/// Render the latest sample of each logged device, in snapshot order,
/// capped at `limit` rows.
pub fn activity_feed(devices: &[Device], limit: usize, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let mut shown = 0;

    for device in devices {
        let Some(last) = device.recent_logs.last() else {
            continue;
        };
        if shown == limit {
            break;
        }
        let line = format!("{} consuming {:.0}W", device.name, last.power_watts);
        let ago = time_ago(Some(last.timestamp), now);
        out.push_str(&format!("  {line} {}\n", format!("({ago})").dimmed()));
        shown += 1;
    }

    if shown == 0 {
        out.push_str(&format!("  {}\n", "No activity yet".dimmed()));
    }

    out
}

// ---------------------------------------------------------------------------
// Error banner
// ---------------------------------------------------------------------------

/// One red line; the dash loop prints it above the previous frame's
/// data so a failed poll never blanks the screen.
pub fn error_banner(detail: &str) -> String {
    format!("  {} {}\n", "✗".red().bold(), detail.red())
}

// ---------------------------------------------------------------------------
// Time-ago formatting
// ---------------------------------------------------------------------------

/// Human "time ago" for a device's last-seen stamp.
///
/// Missing stamps render as "Never". Stamps in the future (clock skew
/// between client and backend) fall into the "Just now" bucket because
/// their age is negative.
pub fn time_ago(when: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(when) = when else {
        return "Never".to_string();
    };

    let seconds = (now - when).num_seconds();
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
pub(crate) fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    while end > 3 {
        groups.push(&digits[end - 3..end]);
        end -= 3;
    }
    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(",")
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
