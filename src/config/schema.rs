/// Configuration schema and defaults for ledgerstat.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[data]`, `[report]`, `[web]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ledger::loader::LoadOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level ledgerstat configuration.
///
/// Maps directly to `~/.ledgerstat/config.toml` and `.ledgerstat.toml`.
/// Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerstatConfig {
    pub data: DataConfig,
    pub report: ReportConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [data]
// ---------------------------------------------------------------------------

/// Where purchases are loaded from and how the file is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Tab-separated purchase file.
    pub file: PathBuf,
    /// Skip the first line of the file.
    pub has_header: bool,
    /// Load at most this many purchases; `0` loads everything.
    pub max_records: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("purchases.txt"),
            has_header: false,
            max_records: 1000,
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            has_header: self.has_header,
            max_records: (self.max_records > 0).then_some(self.max_records),
        }
    }
}

// ---------------------------------------------------------------------------
// [report]
// ---------------------------------------------------------------------------

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Decimal places for amounts in tables.
    pub precision: usize,
    /// Format used when `--format` is not given.
    pub default_format: OutputFormat,
    /// Show at most this many rows in ranked tables; `0` shows all.
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            default_format: OutputFormat::Table,
            top: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostics and query history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Append every executed query to `~/.ledgerstat/query-log.jsonl`.
    pub query_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            query_log: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl LedgerstatConfig {
    /// Generate the annotated default TOML config file content.
    pub fn default_toml() -> String {
        r#"# ledgerstat Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Command-line flags
#   2. Environment variables (LEDGERSTAT_*)
#   3. Project config (.ledgerstat.toml in current directory)
#   4. User global config (~/.ledgerstat/config.toml)
#   5. Built-in defaults

[data]
file = "purchases.txt"    # Tab-separated: date, time, store, category, price, payment
has_header = false        # Set true for the header-augmented variant
max_records = 1000        # 0 = no limit

[report]
precision = 2             # Decimal places in tables
default_format = "table"  # table | json | csv
top = 0                   # Rows shown in ranked tables, 0 = all

[web]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
level = "warn"            # trace | debug | info | warn | error (RUST_LOG wins)
query_log = false         # Append queries to ~/.ledgerstat/query-log.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
