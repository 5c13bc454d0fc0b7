/// Configuration system for ledgerstat.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::LedgerstatConfig::default()`]
/// 2. **User global config**: `~/.ledgerstat/config.toml`
/// 3. **Project local config**: `.ledgerstat.toml` in the current directory
/// 4. **Environment variables**: `LEDGERSTAT_*` overrides
///
/// Later layers override earlier ones at the key level: a file that only sets
/// `data.file` leaves every other value of the previous layer untouched.
/// Command-line flags are applied on top by `main`.
///
/// # Usage
///
/// ```rust,ignore
/// use ledgerstat::config;
///
/// let cfg = config::load()?;
/// let records = loader::load(&cfg.data.file, &cfg.data.load_options())?;
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{LedgerstatConfig, OutputFormat};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. A config file
/// that exists but does not parse is an error naming the file.
pub fn load() -> Result<LedgerstatConfig> {
    let defaults = toml::Value::try_from(LedgerstatConfig::default())
        .context("failed to serialize default config")?;
    let mut merged = defaults;

    for path in [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
    {
        if let Some(layer) = load_toml_file(&path)? {
            merge_values(&mut merged, layer);
        }
    }

    let mut config: LedgerstatConfig = merged
        .try_into()
        .context("invalid configuration value")?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Read a TOML file as a raw value tree. Missing files yield `None`.
fn load_toml_file(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let value = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(Some(value))
}

/// Recursively merge `overlay` into `base`, key by key.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.ledgerstat/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ledgerstat").join("config.toml"))
}

/// Path to the project local config: `.ledgerstat.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".ledgerstat.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `LEDGERSTAT_FILE`: purchase file path
/// - `LEDGERSTAT_HAS_HEADER`: skip the first line (`1`/`true`/`yes`/`on`)
/// - `LEDGERSTAT_MAX_RECORDS`: record limit, `0` for none
/// - `LEDGERSTAT_FORMAT`: `table`, `json` or `csv`
/// - `LEDGERSTAT_WEB_ADDR`: dashboard bind address
/// - `LEDGERSTAT_LOG`: log level
/// - `LEDGERSTAT_QUERY_LOG`: query history on/off
fn apply_env_overrides(config: &mut LedgerstatConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("LEDGERSTAT_FILE")
        && !val.is_empty()
    {
        config.data.file = PathBuf::from(val);
    }
    if let Some(val) = var("LEDGERSTAT_HAS_HEADER") {
        config.data.has_header = is_truthy(&val);
    }
    if let Some(val) = var("LEDGERSTAT_MAX_RECORDS") {
        match val.trim().parse::<usize>() {
            Ok(max) => config.data.max_records = max,
            Err(e) => tracing::warn!(
                value = %val,
                kept = config.data.max_records,
                "ignoring LEDGERSTAT_MAX_RECORDS: {e}"
            ),
        }
    }
    if let Some(val) = var("LEDGERSTAT_FORMAT")
        && !val.is_empty()
    {
        config.report.default_format = OutputFormat::from_str_opt(Some(&val));
    }
    if let Some(val) = var("LEDGERSTAT_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("LEDGERSTAT_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
    if let Some(val) = var("LEDGERSTAT_QUERY_LOG") {
        config.logging.query_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.ledgerstat/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.ledgerstat/ directory")?;
    }

    fs::write(&path, LedgerstatConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the dotted key,
/// checks the result is still a valid configuration, and writes it back.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root = match load_toml_file(&path)? {
        Some(existing) => existing,
        None => toml::Value::try_from(LedgerstatConfig::default())
            .context("failed to serialize default config")?,
    };

    set_toml_value(&mut root, key, value)?;

    let _: LedgerstatConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config(config: &LedgerstatConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn defaults_value() -> toml::Value {
        toml::Value::try_from(LedgerstatConfig::default()).unwrap()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn merge_overrides_only_present_keys() {
        let mut base = defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[data]
max_records = 0
"#,
        )
        .unwrap();
        merge_values(&mut base, overlay);

        let config: LedgerstatConfig = base.try_into().unwrap();
        assert_eq!(config.data.max_records, 0);
        assert_eq!(config.data.file, PathBuf::from("purchases.txt"));
        assert_eq!(config.report.precision, 2);
    }

    #[test]
    fn later_layers_win() {
        let mut base = defaults_value();
        merge_values(&mut base, toml::from_str("[web]\naddr = \"0.0.0.0:1\"").unwrap());
        merge_values(&mut base, toml::from_str("[web]\naddr = \"0.0.0.0:2\"").unwrap());
        let config: LedgerstatConfig = base.try_into().unwrap();
        assert_eq!(config.web.addr, "0.0.0.0:2");
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LEDGERSTAT_FILE", "data/2012.tsv"),
            ("LEDGERSTAT_MAX_RECORDS", "50"),
            ("LEDGERSTAT_FORMAT", "json"),
            ("LEDGERSTAT_QUERY_LOG", "yes"),
        ]);
        let mut config = LedgerstatConfig::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data.file, PathBuf::from("data/2012.tsv"));
        assert_eq!(config.data.max_records, 50);
        assert_eq!(config.report.default_format, OutputFormat::Json);
        assert!(config.logging.query_log);
        assert_eq!(config.logging.level, "warn");
    }

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn env_overrides_warn_on_unparseable_numbers() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();

        let mut config = LedgerstatConfig::default();
        tracing::subscriber::with_default(subscriber, || {
            apply_env_overrides(&mut config, |key| {
                (key == "LEDGERSTAT_MAX_RECORDS").then(|| "lots".to_string())
            });
        });

        assert_eq!(config.data.max_records, 1000);
        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("ignoring LEDGERSTAT_MAX_RECORDS"), "{logged}");
        assert!(logged.contains("lots"), "{logged}");
    }

    #[test]
    fn set_toml_value_keeps_value_types() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "data.has_header", "true").unwrap();
        set_toml_value(&mut root, "data.max_records", "250").unwrap();
        set_toml_value(&mut root, "web.addr", "0.0.0.0:8080").unwrap();

        let config: LedgerstatConfig = root.try_into().unwrap();
        assert!(config.data.has_header);
        assert_eq!(config.data.max_records, 250);
        assert_eq!(config.web.addr, "0.0.0.0:8080");
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root = defaults_value();
        assert!(set_toml_value(&mut root, "report.precision", "two").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root = defaults_value();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "data.nope", "value").is_err());
        assert!(set_toml_value(&mut root, "data.", "value").is_err());
    }

    #[test]
    fn show_effective_config_round_trips() {
        let toml_str = show_effective_config(&LedgerstatConfig::default()).unwrap();
        let parsed: LedgerstatConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.web.addr, "127.0.0.1:9747");
    }
}
