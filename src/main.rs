use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use wattch::api::{BackendClient, UsageQuery};
use wattch::cli;
use wattch::config;
use wattch::dashboard::{self, DashOptions};
use wattch::demo;
use wattch::filter::{DeviceFilter, StatusFilter};

#[derive(Debug, Parser)]
#[command(name = "wattch")]
#[command(about = "Watch your watts — terminal dashboard for a home power-monitoring API")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Live dashboard — stats, power-share chart, device list, activity
    Dash {
        /// Seconds between polls (minimum 1; default from config)
        #[arg(long)]
        interval: Option<u64>,
        /// Render a single frame and exit
        #[arg(long)]
        once: bool,
        /// Substring match against device name and room
        #[arg(long)]
        search: Option<String>,
        /// Exact room name (case-insensitive)
        #[arg(long)]
        room: Option<String>,
        /// Filter by state: on, off
        #[arg(long)]
        status: Option<String>,
    },
    /// List devices from the current snapshot
    Devices {
        /// Substring match against device name and room
        #[arg(long)]
        search: Option<String>,
        /// Exact room name (case-insensitive)
        #[arg(long)]
        room: Option<String>,
        /// Filter by state: on, off
        #[arg(long)]
        status: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Flip a device on or off
    Toggle {
        /// Device id
        device_id: i64,
    },
    /// Show aggregate figures for the current snapshot
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent readings for one device, newest first
    Logs {
        /// Device id
        device_id: i64,
        /// Maximum readings to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show averaged usage series and top consumers
    Usage {
        /// Series to print: daily (default), weekly, monthly
        #[arg(long, default_value = "daily")]
        span: String,
        /// ISO date/datetime lower bound (default: 30 days ago)
        #[arg(long)]
        start: Option<String>,
        /// ISO date/datetime upper bound (default: now)
        #[arg(long)]
        end: Option<String>,
        /// Restrict to one room
        #[arg(long)]
        room: Option<String>,
        /// Restrict to specific device ids (repeatable)
        #[arg(long = "device")]
        devices: Vec<i64>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show readings that crossed the high-draw threshold
    Alerts {
        /// Threshold in watts (backend default: 250)
        #[arg(long)]
        threshold: Option<f64>,
        /// Look-back window in hours (backend default: 24)
        #[arg(long)]
        since: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the backend's auto-shutdown suggestions
    Suggestions {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Push a power sample for a device
    Reading {
        /// Device id
        device_id: i64,
        /// Power in watts
        watts: f64,
    },
    /// Ask the backend's assistant a question
    Ask {
        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        words: Vec<String>,
    },
    /// Check config, backend reachability, and auth material
    Health,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run a local demo backend with synthetic devices
    Demo {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8641")]
        addr: String,
        /// Number of demo devices (capped at the built-in roster)
        #[arg(long, default_value = "8")]
        devices: usize,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config file to ~/.wattch/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value in the global config, e.g. backend.base_url
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Dash {
            interval,
            once,
            search,
            room,
            status,
        } => {
            let config = config::load();
            let client = BackendClient::from_config(&config.backend);
            let options = DashOptions {
                filter: device_filter(search, room, status),
                interval: Duration::from_secs(
                    interval.unwrap_or(config.dashboard.interval_secs),
                ),
                once,
            };
            dashboard::run_dashboard(&client, &config, &options)
        }
        Commands::Devices {
            search,
            room,
            status,
            format,
        } => {
            let client = client_from_config();
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_devices(&client, &device_filter(search, room, status), fmt)
        }
        Commands::Toggle { device_id } => {
            let client = client_from_config();
            cli::run_toggle(&client, device_id)
        }
        Commands::Stats { format } => {
            let config = config::load();
            let client = BackendClient::from_config(&config.backend);
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&client, &config, fmt)
        }
        Commands::Logs {
            device_id,
            limit,
            format,
        } => {
            let client = client_from_config();
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_logs(&client, device_id, limit, fmt)
        }
        Commands::Usage {
            span,
            start,
            end,
            room,
            devices,
            format,
        } => {
            let client = client_from_config();
            let query = UsageQuery {
                start,
                end,
                room,
                devices,
            };
            let span = cli::UsageSpan::from_str_opt(Some(&span));
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_usage(&client, &query, span, fmt)
        }
        Commands::Alerts {
            threshold,
            since,
            format,
        } => {
            let client = client_from_config();
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_alerts(&client, threshold, since, fmt)
        }
        Commands::Suggestions { format } => {
            let client = client_from_config();
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_suggestions(&client, fmt)
        }
        Commands::Reading { device_id, watts } => {
            let client = client_from_config();
            cli::run_reading(&client, device_id, watts)
        }
        Commands::Ask { words } => {
            let client = client_from_config();
            let message = words.join(" ");
            cli::run_ask(&client, &message)
        }
        Commands::Health => {
            let config = config::load();
            let client = BackendClient::from_config(&config.backend);
            cli::run_health(&client, &config)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Demo { addr, devices } => demo::serve(&addr, devices),
    }
}

/// Build the backend client from the resolved config.
fn client_from_config() -> BackendClient {
    BackendClient::from_config(&config::load().backend)
}

/// Assemble the client-side device filter from CLI flags.
fn device_filter(
    search: Option<String>,
    room: Option<String>,
    status: Option<String>,
) -> DeviceFilter {
    DeviceFilter::new(search, room, StatusFilter::from_str_opt(status.as_deref()))
}
