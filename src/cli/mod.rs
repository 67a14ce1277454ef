//! Subcommand implementations.
//!
//! One `run_*` function per command:
//! - `wattch devices` — one-shot device list with filters
//! - `wattch stats` — aggregate figures for the current snapshot
//! - `wattch toggle <id>` — flip a device on or off
//! - `wattch logs <id>` — recent readings for one device
//! - `wattch usage` — daily/weekly/monthly averages and top consumers
//! - `wattch alerts` — high-draw readings
//! - `wattch suggestions` — auto-shutdown suggestions
//! - `wattch reading <id> <watts>` — push a power sample
//! - `wattch ask "<question>"` — query the backend assistant
//! - `wattch health` — config, backend reachability, auth
//! - `wattch config show|init|set|reset` — configuration management

use anyhow::Result;
use chrono::{Local, Utc};
use colored::Colorize;

use crate::api::{BackendClient, UsageQuery};
use crate::config;
use crate::config::schema::WattchConfig;
use crate::filter::DeviceFilter;
use crate::model::{Alert, Device, PowerLog, Suggestion, UsagePoint, UsageSummary};
use crate::render::{self, truncate};
use crate::stats::{self, DashboardStats};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Which usage series to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageSpan {
    Daily,
    Weekly,
    Monthly,
}

impl UsageSpan {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("weekly") => Self::Weekly,
            Some("monthly") => Self::Monthly,
            _ => Self::Daily,
        }
    }
}

// ---------------------------------------------------------------------------
// wattch devices
// ---------------------------------------------------------------------------

/// List devices from the current snapshot, after client-side filters.
pub fn run_devices(
    client: &BackendClient,
    filter: &DeviceFilter,
    format: OutputFormat,
) -> Result<()> {
    let response = client.fetch_devices()?;
    let visible = filter.apply(&response.devices);

    match format {
        OutputFormat::Json => print_devices_json(&visible)?,
        OutputFormat::Csv => print_devices_csv(&visible),
        OutputFormat::Table => {
            println!("{}", "WATTCH Devices".bold().cyan());
            println!("{}", "=".repeat(70));
            println!("{}", render::device_table(&visible, Utc::now()));
        }
    }

    Ok(())
}

fn print_devices_json(devices: &[&Device]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(devices)?);
    Ok(())
}

fn print_devices_csv(devices: &[&Device]) {
    println!("id,name,room,state,power_watts,last_seen");
    for device in devices {
        let last_seen = device
            .last_seen
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();
        println!(
            "{},{},{},{},{:.1},{}",
            device.id,
            device.name,
            device.room,
            if device.is_on { "on" } else { "off" },
            device.current_draw(),
            last_seen,
        );
    }
}

// ---------------------------------------------------------------------------
// wattch stats
// ---------------------------------------------------------------------------

/// Show aggregate figures for the current snapshot.
pub fn run_stats(
    client: &BackendClient,
    config: &WattchConfig,
    format: OutputFormat,
) -> Result<()> {
    let response = client.fetch_devices()?;

    if response.devices.is_empty() {
        println!(
            "{}",
            "No devices reported yet. Add devices on the backend, or try `wattch demo`.".yellow()
        );
        return Ok(());
    }

    let stats = stats::build_stats(&response.devices, config.tariff.rate_per_kwh);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => {
            println!("{}", "WATTCH Usage Overview".bold().cyan());
            println!("{}", "=".repeat(50));
            println!("{}", render::stat_cards(&stats, &config.tariff));
        }
    }

    Ok(())
}

fn print_stats_csv(stats: &DashboardStats) {
    println!(
        "total_devices,active_devices,total_power_watts,monthly_savings,avg_usage_watts,peak_usage_watts,daily_usage_kwh,efficiency_pct"
    );
    println!(
        "{},{},{:.1},{:.2},{:.1},{:.0},{:.1},{}",
        stats.total_devices,
        stats.active_devices,
        stats.total_power_watts,
        stats.monthly_savings,
        stats.avg_usage_watts,
        stats.peak_usage_watts,
        stats.daily_usage_kwh,
        stats.efficiency_pct,
    );
}

// ---------------------------------------------------------------------------
// wattch toggle
// ---------------------------------------------------------------------------

/// Flip a device and report its new state.
pub fn run_toggle(client: &BackendClient, device_id: i64) -> Result<()> {
    let ack = client.toggle(device_id)?;
    let state = if ack.is_on {
        "ON".green().bold()
    } else {
        "OFF".red().bold()
    };
    println!("{} Device {} is now {}", "✓".green().bold(), ack.id, state);

    // Refetch so the reported draw reflects the new state
    if let Ok(response) = client.fetch_devices()
        && let Some(device) = response.devices.iter().find(|d| d.id == ack.id)
    {
        println!(
            "  {}",
            format!(
                "{} · {} · {:.0} W",
                device.name,
                device.display_room(),
                device.current_draw()
            )
            .dimmed()
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// wattch logs
// ---------------------------------------------------------------------------

/// Show recent readings for one device, newest first.
pub fn run_logs(
    client: &BackendClient,
    device_id: i64,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let history = client.device_logs(device_id)?;

    if history.logs.is_empty() {
        println!(
            "{}",
            format!("No readings recorded for {} yet.", history.device).yellow()
        );
        return Ok(());
    }

    let shown: Vec<&PowerLog> = history.logs.iter().take(limit).collect();

    match format {
        OutputFormat::Json => print_logs_json(&history.device, &shown)?,
        OutputFormat::Csv => print_logs_csv(&shown),
        OutputFormat::Table => print_logs_table(&history.device, &shown),
    }

    Ok(())
}

fn print_logs_table(device: &str, logs: &[&PowerLog]) {
    println!("{}", format!("Readings — {device}").bold().cyan());
    println!("{}", "=".repeat(40));
    println!("  {:<20} {:>8}", "Time", "Watts");
    println!("  {}", "-".repeat(30));

    for log in logs {
        let time = log
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        println!("  {:<20} {:>8.1}", time, log.power_watts);
    }
}

fn print_logs_json(device: &str, logs: &[&PowerLog]) -> Result<()> {
    let value = serde_json::json!({
        "device": device,
        "logs": logs,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_logs_csv(logs: &[&PowerLog]) {
    println!("timestamp,power_watts");
    for log in logs {
        println!("{},{:.1}", log.timestamp.to_rfc3339(), log.power_watts);
    }
}

// ---------------------------------------------------------------------------
// wattch usage
// ---------------------------------------------------------------------------

/// Show averaged usage series and the top consumers.
pub fn run_usage(
    client: &BackendClient,
    query: &UsageQuery,
    span: UsageSpan,
    format: OutputFormat,
) -> Result<()> {
    let summary = client.usage_summary(query)?;
    let series = match span {
        UsageSpan::Daily => &summary.daily,
        UsageSpan::Weekly => &summary.weekly,
        UsageSpan::Monthly => &summary.monthly,
    };

    if series.is_empty() {
        println!("{}", "No usage data in the selected window.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_usage_json(&summary)?,
        OutputFormat::Csv => print_usage_csv(series),
        OutputFormat::Table => print_usage_table(&summary, series, span),
    }

    Ok(())
}

fn print_usage_table(summary: &UsageSummary, series: &[UsagePoint], span: UsageSpan) {
    let label = match span {
        UsageSpan::Daily => "Daily",
        UsageSpan::Weekly => "Weekly",
        UsageSpan::Monthly => "Monthly",
    };
    println!(
        "{}",
        format!("WATTCH Usage — {label} Averages").bold().cyan()
    );
    println!("{}", "=".repeat(50));
    println!("  {:<12} {:>10}", "Date", "Avg W");
    println!("  {}", "-".repeat(24));

    for point in series {
        println!("  {:<12} {:>10.2}", bucket_date(&point.date), point.value);
    }

    if !summary.top_devices.is_empty() {
        println!();
        println!("{}", "Top Consumers".bold().cyan());
        println!("  {:<22} {:>10}", "Device", "Avg W");
        println!("  {}", "-".repeat(34));
        for top in &summary.top_devices {
            println!("  {:<22} {:>10.2}", truncate(&top.name, 22), top.avg_power);
        }
    }
}

fn print_usage_json(summary: &UsageSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn print_usage_csv(series: &[UsagePoint]) {
    println!("date,avg_watts");
    for point in series {
        println!("{},{:.2}", bucket_date(&point.date), point.value);
    }
}

/// Date part of a bucket timestamp like `2025-06-01T00:00:00Z`.
fn bucket_date(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// wattch alerts
// ---------------------------------------------------------------------------

/// Show readings that crossed the high-draw threshold.
pub fn run_alerts(
    client: &BackendClient,
    threshold: Option<f64>,
    since_hours: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let response = client.alerts(threshold, since_hours)?;

    if response.alerts.is_empty() {
        println!("{}", "No high-draw alerts in the selected window.".green());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_alerts_json(&response.alerts)?,
        OutputFormat::Csv => print_alerts_csv(&response.alerts),
        OutputFormat::Table => print_alerts_table(&response.alerts),
    }

    Ok(())
}

fn print_alerts_table(alerts: &[Alert]) {
    println!("{}", "WATTCH High-Draw Alerts".bold().cyan());
    println!("{}", "=".repeat(66));
    println!(
        "  {:<17} {:<22} {:<14} {:>8}",
        "Time", "Device", "Room", "Watts"
    );
    println!("  {}", "-".repeat(64));

    for alert in alerts {
        let time = alert
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        println!(
            "  {:<17} {:<22} {:<14} {:>8.0}",
            time,
            truncate(&alert.device, 22),
            truncate(&alert.room, 14),
            alert.power_watts,
        );
    }

    println!();
    println!("  {}", alerts[0].action.dimmed());
}

fn print_alerts_json(alerts: &[Alert]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(alerts)?);
    Ok(())
}

fn print_alerts_csv(alerts: &[Alert]) {
    println!("timestamp,device_id,device,room,power_watts");
    for alert in alerts {
        println!(
            "{},{},{},{},{:.1}",
            alert.timestamp.to_rfc3339(),
            alert.device_id,
            alert.device,
            alert.room,
            alert.power_watts,
        );
    }
}

// ---------------------------------------------------------------------------
// wattch suggestions
// ---------------------------------------------------------------------------

/// Show the backend's auto-shutdown suggestions.
pub fn run_suggestions(client: &BackendClient, format: OutputFormat) -> Result<()> {
    let response = client.suggestions()?;

    if response.suggestions.is_empty() {
        println!("{}", "No suggestions — current usage already looks lean.".green());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_suggestions_json(&response.suggestions)?,
        OutputFormat::Csv => print_suggestions_csv(&response.suggestions),
        OutputFormat::Table => print_suggestions_table(&response.suggestions),
    }

    Ok(())
}

fn print_suggestions_table(suggestions: &[Suggestion]) {
    println!("{}", "WATTCH Saving Suggestions".bold().cyan());
    println!("{}", "=".repeat(62));
    println!(
        "  {:<22} {:<14} {:>8} {:>12}",
        "Device", "Room", "Avg W", "Est. ₹/mo"
    );
    println!("  {}", "-".repeat(60));

    for item in suggestions {
        println!(
            "  {:<22} {:<14} {:>8.1} {:>12.2}",
            truncate(&item.device, 22),
            truncate(&item.room, 14),
            item.avg_power,
            item.expected_savings_rs,
        );
    }

    println!();
    println!("  {}", suggestions[0].suggestion.dimmed());
}

fn print_suggestions_json(suggestions: &[Suggestion]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(suggestions)?);
    Ok(())
}

fn print_suggestions_csv(suggestions: &[Suggestion]) {
    println!("device_id,device,room,avg_power,expected_savings_rs");
    for item in suggestions {
        println!(
            "{},{},{},{:.1},{:.2}",
            item.device_id, item.device, item.room, item.avg_power, item.expected_savings_rs,
        );
    }
}

// ---------------------------------------------------------------------------
// wattch reading
// ---------------------------------------------------------------------------

/// Push a power sample for a device.
pub fn run_reading(client: &BackendClient, device_id: i64, watts: f64) -> Result<()> {
    client.post_reading(device_id, watts)?;
    println!(
        "{} Recorded {:.1} W for device {}",
        "✓".green().bold(),
        watts,
        device_id
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// wattch ask
// ---------------------------------------------------------------------------

/// Ask the backend's assistant a question.
pub fn run_ask(client: &BackendClient, message: &str) -> Result<()> {
    let reply = client.ask(message)?;
    println!("{}", reply.reply);
    println!();
    println!("  {}", format!("source: {}", reply.source).dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// wattch health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability, and auth material.
pub fn run_health(client: &BackendClient, config: &WattchConfig) -> Result<()> {
    println!("{}", "WATTCH Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    // config files
    let global = config::global_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        global,
        if global {
            "~/.wattch/config.toml found"
        } else {
            "not found (run `wattch config init` to create)"
        },
    );
    let project = config::project_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Project config",
        project,
        if project {
            ".wattch.toml found"
        } else {
            "none (optional)"
        },
    );

    // backend reachability
    let backend_ok = client.is_healthy();
    let backend_detail = if backend_ok {
        format!("reachable at {}", client.base_url())
    } else {
        "not reachable — is the backend running?".to_string()
    };
    print_health_item("Backend", backend_ok, &backend_detail);

    // device roster, only when the backend answered
    if backend_ok && let Ok(response) = client.fetch_devices() {
        let active = response.devices.iter().filter(|d| d.is_on).count();
        print_health_item(
            "Devices",
            !response.devices.is_empty(),
            &format!("{} reported, {} on", response.devices.len(), active),
        );
    }

    // auth material
    let csrf = !config.backend.csrf_token.is_empty();
    print_health_item(
        "CSRF token",
        csrf,
        if csrf {
            "configured"
        } else {
            "not set (needed if the backend enforces CSRF)"
        },
    );
    let cookie = !config.backend.session_cookie.is_empty();
    print_health_item(
        "Session cookie",
        cookie,
        if cookie {
            "configured"
        } else {
            "not set (needed if the backend requires login)"
        },
    );

    // tariff
    print_health_item(
        "Tariff",
        config.tariff.rate_per_kwh > 0.0,
        &format!(
            "{}{:.2} per kWh",
            config.tariff.currency, config.tariff.rate_per_kwh
        ),
    );

    println!();
    println!(
        "  {} `wattch demo` starts a local backend with sample data",
        "Hint:".dimmed()
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let mark = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {mark} {name:<16} {}", detail.dimmed());
}

// ---------------------------------------------------------------------------
// wattch config show | init | set | reset
// ---------------------------------------------------------------------------

/// Print the merged configuration as TOML, with the layers it came from.
pub fn run_config_show() -> Result<()> {
    println!("{}", "WATTCH Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{}", config::show_effective_config()?);

    println!("{}", "Layers, later ones winning:".dimmed());
    print_layer_line(true, "built-in defaults");
    print_layer_line(
        config::global_config_file().is_some_and(|p| p.exists()),
        "~/.wattch/config.toml",
    );
    print_layer_line(
        config::project_config_file().is_some_and(|p| p.exists()),
        ".wattch.toml",
    );
    print_layer_line(true, "WATTCH_* environment variables");

    Ok(())
}

fn print_layer_line(present: bool, label: &str) {
    if present {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Create `~/.wattch/config.toml` from the annotated defaults.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Wrote {}", "✓".green().bold(), path.display());
    println!(
        "  {}",
        "Edit the file to point wattch at your backend.".dimmed()
    );
    Ok(())
}

/// Update one key in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Put the global config back to the annotated defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} Restored defaults at {}", "✓".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
