/// Configuration schema and defaults for wattch.
///
/// Defines the TOML-serializable configuration structure with its three
/// sections: `[backend]`, `[dashboard]`, and `[tariff]`.
///
/// Every field has a sensible built-in default. Users only need to set
/// the values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level wattch configuration.
///
/// Maps directly to the `~/.wattch/config.toml` and `.wattch.toml` file
/// schemas. All sections and fields are optional — missing values fall
/// back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WattchConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub tariff: TariffConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Connection settings for the power-monitoring backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// CSRF token forwarded as `X-CSRFToken` on mutating requests.
    /// Empty means the header is not sent. Obtaining the token is up to
    /// the user (the backend issues it with the login page).
    pub csrf_token: String,
    /// Session cookie forwarded verbatim in the `Cookie` header.
    /// Empty means no cookie is sent.
    pub session_cookie: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 10_000,
            csrf_token: String::new(),
            session_cookie: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Live dashboard behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Seconds between polls of `GET /api/devices/`.
    pub interval_secs: u64,
    /// Width of the power-share bars, in terminal cells.
    pub chart_width: usize,
    /// Maximum rows in the activity feed.
    pub feed_limit: usize,
    /// Clear the screen between frames. Turn off when piping output or
    /// on terminals without ANSI support.
    pub clear_screen: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            chart_width: 40,
            feed_limit: 10,
            clear_screen: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [tariff]
// ---------------------------------------------------------------------------

/// Electricity tariff used for the savings estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Price per kilowatt-hour.
    pub rate_per_kwh: f64,
    /// Currency symbol shown next to money amounts.
    pub currency: String,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: 6.0,
            currency: "₹".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl WattchConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `wattch config init` to create a starting config file
    /// with all settings documented.
    pub fn default_toml() -> String {
        r#"# wattch configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (WATTCH_*)
#   2. Project config (.wattch.toml in current directory)
#   3. User global config (~/.wattch/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://127.0.0.1:8000"
timeout_ms = 10000
csrf_token = ""         # Sent as X-CSRFToken on toggle/reading/chat when set
session_cookie = ""     # Sent verbatim in the Cookie header when set

[dashboard]
interval_secs = 5       # Poll interval for `wattch dash`
chart_width = 40        # Width of the power-share bars
feed_limit = 10         # Maximum rows in the activity feed
clear_screen = true     # Redraw on a cleared screen each frame

[tariff]
rate_per_kwh = 6.0      # Electricity price per kWh
currency = "₹"          # Symbol shown next to money amounts
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = WattchConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert!(config.backend.csrf_token.is_empty());
        assert_eq!(config.dashboard.interval_secs, 5);
        assert_eq!(config.dashboard.chart_width, 40);
        assert!(config.dashboard.clear_screen);
        assert_eq!(config.tariff.rate_per_kwh, 6.0);
        assert_eq!(config.tariff.currency, "₹");
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[backend]
base_url = "http://powerhub.local:8000"
"#;
        let config: WattchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "http://powerhub.local:8000");
        // All other fields fall back to defaults
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert_eq!(config.dashboard.interval_secs, 5);
    }

    #[test]
    fn deserialize_full_toml() {
        let toml_str = r#"
[backend]
base_url = "https://power.example.com"
timeout_ms = 3000
csrf_token = "tok123"
session_cookie = "sessionid=abc"

[dashboard]
interval_secs = 2
chart_width = 60
feed_limit = 5
clear_screen = false

[tariff]
rate_per_kwh = 0.31
currency = "€"
"#;
        let config: WattchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "https://power.example.com");
        assert_eq!(config.backend.timeout_ms, 3000);
        assert_eq!(config.backend.csrf_token, "tok123");
        assert_eq!(config.backend.session_cookie, "sessionid=abc");
        assert_eq!(config.dashboard.interval_secs, 2);
        assert_eq!(config.dashboard.chart_width, 60);
        assert_eq!(config.dashboard.feed_limit, 5);
        assert!(!config.dashboard.clear_screen);
        assert_eq!(config.tariff.rate_per_kwh, 0.31);
        assert_eq!(config.tariff.currency, "€");
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: WattchConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.tariff.rate_per_kwh, 6.0);
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = WattchConfig::default_toml();
        let config: WattchConfig = toml::from_str(&toml_str).unwrap();
        // The annotated template must agree with the built-in defaults.
        assert_eq!(config.backend.base_url, BackendConfig::default().base_url);
        assert_eq!(config.backend.timeout_ms, BackendConfig::default().timeout_ms);
        assert_eq!(
            config.dashboard.interval_secs,
            DashboardConfig::default().interval_secs
        );
        assert_eq!(
            config.tariff.rate_per_kwh,
            TariffConfig::default().rate_per_kwh
        );
        assert_eq!(config.tariff.currency, TariffConfig::default().currency);
    }
}
