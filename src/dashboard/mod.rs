//! Live dashboard loop — poll, render, sleep, repeat.
//!
//! Each tick fetches a fresh device snapshot and redraws the whole
//! frame. A failed poll never blanks the screen: the previous
//! snapshot's regions stay up with a red banner on top, and the loop
//! keeps going. The snapshot is replaced wholesale on success; frames
//! never mix data from two polls.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

use crate::api::BackendClient;
use crate::config::WattchConfig;
use crate::filter::DeviceFilter;
use crate::model::Device;
use crate::render::{self, chart};
use crate::stats;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for `wattch dash`.
#[derive(Debug, Clone)]
pub struct DashOptions {
    /// Narrows the device list region only; stats, chart, and feed
    /// always reflect the full snapshot.
    pub filter: DeviceFilter,
    pub interval: Duration,
    /// Render a single frame and return instead of looping.
    pub once: bool,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run the live dashboard until interrupted (or one frame with `once`).
pub fn run_dashboard(
    client: &BackendClient,
    config: &WattchConfig,
    opts: &DashOptions,
) -> Result<()> {
    // A zero interval would hammer the backend.
    let interval = opts.interval.max(Duration::from_secs(1));

    let mut snapshot: Vec<Device> = Vec::new();
    let mut last_error: Option<String> = None;

    loop {
        match client.fetch_devices() {
            Ok(resp) => {
                snapshot = resp.devices;
                last_error = None;
            }
            Err(err) => {
                last_error = Some(format!("Failed to fetch device data: {err:#}"));
            }
        }

        let frame = build_frame(
            &snapshot,
            last_error.as_deref(),
            config,
            &opts.filter,
            client.base_url(),
            !opts.once,
        );

        if config.dashboard.clear_screen {
            // ANSI clear + cursor home, so the frame redraws in place.
            print!("\x1b[2J\x1b[H");
        }
        print!("{frame}");
        let _ = std::io::stdout().flush();

        if opts.once {
            break;
        }
        std::thread::sleep(interval);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Frame composition
// ---------------------------------------------------------------------------

/// Compose one full frame from a snapshot.
fn build_frame(
    snapshot: &[Device],
    error: Option<&str>,
    config: &WattchConfig,
    filter: &DeviceFilter,
    base_url: &str,
    show_hint: bool,
) -> String {
    let now = Utc::now();
    let mut frame = String::new();

    frame.push_str(&format!("{}\n", "WATTCH Power Dashboard".bold().cyan()));
    frame.push_str(&format!("{}\n", "=".repeat(76)));
    frame.push_str(&format!(
        "{}\n",
        format!(
            "Backend: {}   updated {}",
            base_url,
            chrono::Local::now().format("%H:%M:%S")
        )
        .dimmed()
    ));

    if let Some(detail) = error {
        frame.push_str(&render::error_banner(detail));
    }
    frame.push('\n');

    let stats = stats::build_stats(snapshot, config.tariff.rate_per_kwh);
    frame.push_str(&format!("{}\n", "Overview".bold().cyan()));
    frame.push_str(&render::stat_cards(&stats, &config.tariff));
    frame.push('\n');

    if !snapshot.is_empty() {
        frame.push_str(&format!("{}\n", "Power Draw".bold().cyan()));
        frame.push_str(&chart::power_chart(snapshot, config.dashboard.chart_width));
        frame.push('\n');
    }

    frame.push_str(&format!("{}\n", "Devices".bold().cyan()));
    let visible = filter.apply(snapshot);
    frame.push_str(&render::device_table(&visible, now));
    frame.push('\n');

    frame.push_str(&format!("{}\n", "Recent Activity".bold().cyan()));
    frame.push_str(&render::activity_feed(
        snapshot,
        config.dashboard.feed_limit,
        now,
    ));

    if show_hint {
        frame.push('\n');
        frame.push_str(&format!("{}\n", "Press Ctrl+C to stop.".dimmed()));
    }

    frame
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
