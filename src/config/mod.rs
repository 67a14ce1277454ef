//! Layered configuration.
//!
//! Values resolve in four layers, later ones winning:
//!
//! 1. built-in defaults ([`schema::WattchConfig::default`])
//! 2. user global file `~/.wattch/config.toml`
//! 3. project file `.wattch.toml` in the working directory
//! 4. `WATTCH_*` environment variables
//!
//! Files overlay key by key, so a project file that only sets
//! `[tariff]` keeps the global `[backend]` section intact. A file that
//! fails to parse is skipped rather than aborting the command;
//! `wattch config show` prints what actually took effect.

pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use toml::{Table, Value};

pub use schema::WattchConfig;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Resolve the effective configuration from all layers. Never fails:
/// unreadable layers are skipped and the rest still apply.
pub fn load() -> WattchConfig {
    let mut config = resolve_files().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Fold the built-in defaults and both config files into one document.
fn resolve_files() -> Option<WattchConfig> {
    let mut doc = Table::try_from(WattchConfig::default()).ok()?;

    for path in [global_config_file(), project_config_file()] {
        let Some(overlay) = path.and_then(read_table) else {
            continue;
        };
        merge_tables(&mut doc, overlay);
    }

    doc.try_into().ok()
}

/// Parse one TOML file, or `None` if it is absent or malformed.
fn read_table(path: PathBuf) -> Option<Table> {
    let content = fs::read_to_string(path).ok()?;
    content.parse().ok()
}

/// Overlay `overlay` onto `base`, recursing into tables so a file only
/// overrides the keys it actually sets.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Table(mut dst)), Value::Table(src)) => {
                merge_tables(&mut dst, src);
                Value::Table(dst)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

// ---------------------------------------------------------------------------
// File locations
// ---------------------------------------------------------------------------

/// `~/.wattch/config.toml`, the user-wide config.
pub fn global_config_file() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".wattch").join("config.toml"))
}

/// `.wattch.toml` in the current working directory.
pub fn project_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    Some(cwd.join(".wattch.toml"))
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Apply `WATTCH_*` variables on top of the merged file layers:
///
/// - `WATTCH_BASE_URL` — backend base URL
/// - `WATTCH_TIMEOUT_MS` — request timeout
/// - `WATTCH_CSRF_TOKEN` / `WATTCH_SESSION_COOKIE` — auth material
/// - `WATTCH_INTERVAL_SECS` — dashboard poll interval
/// - `WATTCH_CLEAR_SCREEN` — redraw in place (`1`/`true`/`yes`/`on`)
/// - `WATTCH_RATE_PER_KWH` / `WATTCH_CURRENCY` — tariff
fn apply_env_overrides(config: &mut WattchConfig) {
    if let Some(url) = env_var("WATTCH_BASE_URL") {
        config.backend.base_url = url;
    }
    if let Some(ms) = env_var("WATTCH_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.backend.timeout_ms = ms;
    }
    if let Some(token) = env_var("WATTCH_CSRF_TOKEN") {
        config.backend.csrf_token = token;
    }
    if let Some(cookie) = env_var("WATTCH_SESSION_COOKIE") {
        config.backend.session_cookie = cookie;
    }

    if let Some(secs) = env_var("WATTCH_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.dashboard.interval_secs = secs;
    }
    if let Some(flag) = env_var("WATTCH_CLEAR_SCREEN") {
        config.dashboard.clear_screen = truthy(&flag);
    }

    if let Some(rate) = env_var("WATTCH_RATE_PER_KWH").and_then(|v| v.parse().ok()) {
        config.tariff.rate_per_kwh = rate;
    }
    if let Some(symbol) = env_var("WATTCH_CURRENCY") {
        config.tariff.currency = symbol;
    }
}

/// Non-empty environment variable lookup.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Boolean spellings accepted from env vars and `config set`.
fn truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.wattch/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_file().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, WattchConfig::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

/// Update one key in the global config file, creating the file from
/// defaults if it does not exist yet.
///
/// Keys name a section and a field joined by a dot, as in
/// `backend.base_url` or `tariff.rate_per_kwh`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_file().context("could not determine home directory")?;

    let mut doc = if path.exists() {
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .parse()
            .with_context(|| format!("{} is not valid TOML", path.display()))?
    } else {
        Table::try_from(WattchConfig::default()).context("failed to serialize defaults")?
    };

    set_dotted_key(&mut doc, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let rendered = toml::to_string_pretty(&doc).context("failed to render config")?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

/// Overwrite the global config with the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Render the fully resolved config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to render effective config")
}

/// Apply `key = value` to a parsed config document, coercing the value
/// to the TOML type the field already has.
fn set_dotted_key(doc: &mut Table, key: &str, raw: &str) -> Result<()> {
    let (section, field) = key
        .split_once('.')
        .context("config keys look like `section.key`, e.g. backend.base_url")?;

    let table = doc
        .get_mut(section)
        .and_then(Value::as_table_mut)
        .with_context(|| format!("unknown config section '{section}'"))?;

    let coerced =
        coerce_value(table.get(field), raw).with_context(|| format!("invalid value for '{key}'"))?;
    table.insert(field.to_string(), coerced);
    Ok(())
}

/// Coerce a raw CLI string to the type of the value it replaces.
/// Fields not present in the document come in as strings.
fn coerce_value(existing: Option<&Value>, raw: &str) -> Result<Value> {
    let value = match existing {
        Some(Value::Boolean(_)) => Value::Boolean(truthy(raw)),
        Some(Value::Integer(_)) => Value::Integer(raw.parse()?),
        Some(Value::Float(_)) => Value::Float(raw.parse()?),
        _ => Value::String(raw.to_string()),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Table {
        s.parse().unwrap()
    }

    #[test]
    fn overlay_touches_only_the_keys_it_sets() {
        let mut base = parse(
            "[backend]\nbase_url = \"http://a\"\ntimeout_ms = 10000\n\n[tariff]\nrate_per_kwh = 6.0\n",
        );
        let overlay = parse("[backend]\nbase_url = \"http://b\"\n");
        merge_tables(&mut base, overlay);

        let backend = base["backend"].as_table().unwrap();
        assert_eq!(backend["base_url"].as_str(), Some("http://b"));
        assert_eq!(backend["timeout_ms"].as_integer(), Some(10_000));
        assert!(base.contains_key("tariff"));
    }

    #[test]
    fn overlay_can_add_new_sections() {
        let mut base = parse("[backend]\nbase_url = \"http://a\"\n");
        let overlay = parse("[dashboard]\ninterval_secs = 2\n");
        merge_tables(&mut base, overlay);

        assert_eq!(base["dashboard"]["interval_secs"].as_integer(), Some(2));
        assert!(base.contains_key("backend"));
    }

    #[test]
    fn dotted_key_coerces_to_existing_types() {
        let mut doc = parse(
            "[dashboard]\ninterval_secs = 5\nclear_screen = true\n\n[tariff]\nrate_per_kwh = 6.0\ncurrency = \"₹\"\n",
        );

        set_dotted_key(&mut doc, "dashboard.interval_secs", "2").unwrap();
        set_dotted_key(&mut doc, "dashboard.clear_screen", "no").unwrap();
        set_dotted_key(&mut doc, "tariff.rate_per_kwh", "8.5").unwrap();
        set_dotted_key(&mut doc, "tariff.currency", "Rs").unwrap();

        let dash = doc["dashboard"].as_table().unwrap();
        assert_eq!(dash["interval_secs"].as_integer(), Some(2));
        assert_eq!(dash["clear_screen"].as_bool(), Some(false));
        let tariff = doc["tariff"].as_table().unwrap();
        assert_eq!(tariff["rate_per_kwh"].as_float(), Some(8.5));
        assert_eq!(tariff["currency"].as_str(), Some("Rs"));
    }

    #[test]
    fn dotted_key_rejects_bad_keys_and_values() {
        let mut doc = parse("[backend]\ntimeout_ms = 10000\n");

        assert!(set_dotted_key(&mut doc, "nope.key", "x").is_err());
        assert!(set_dotted_key(&mut doc, "timeout_ms", "5").is_err());
        assert!(set_dotted_key(&mut doc, "backend.timeout_ms", "fast").is_err());
        // the original value survives failed updates
        assert_eq!(doc["backend"]["timeout_ms"].as_integer(), Some(10_000));
    }

    #[test]
    fn truthy_accepts_the_usual_spellings() {
        for form in ["1", "true", "TRUE", "yes", "on", " on "] {
            assert!(truthy(form), "{form:?} should read as true");
        }
        for form in ["0", "false", "no", "off", ""] {
            assert!(!truthy(form), "{form:?} should read as false");
        }
    }

    #[test]
    fn effective_config_renders_as_valid_toml() {
        let rendered = show_effective_config().unwrap();
        assert!(rendered.contains("[backend]"));
        let _: WattchConfig = toml::from_str(&rendered).unwrap();
    }
}
