//! Query history for ledgerstat.
//!
//! When `logging.query_log` is enabled, every executed report appends one
//! JSON line to `~/.ledgerstat/query-log.jsonl`. Writing is best-effort: a
//! history failure never fails the query that produced it.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::ledger::Dimension;

// ---------------------------------------------------------------------------
// Query log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in `~/.ledgerstat/query-log.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub timestamp: String,
    /// Report name, e.g. `"totals"` or `"summary"`.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    /// Selected label or filter pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Rows in the result.
    pub rows: usize,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Query log
// ---------------------------------------------------------------------------

/// Handle to the query history file. A disabled log records nothing.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    path: Option<PathBuf>,
}

impl QueryLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        if config.query_log {
            Self {
                path: query_log_path(),
            }
        } else {
            Self::disabled()
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Log to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append one entry for a query that began at `started`.
    pub fn record(
        &self,
        action: &str,
        dimension: Option<Dimension>,
        value: Option<&str>,
        rows: usize,
        started: Instant,
    ) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = QueryLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            dimension,
            value: value.map(str::to_string),
            rows,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if let Err(e) = append_entry(path, &entry) {
            tracing::debug!(path = %path.display(), error = %e, "failed to append query log entry");
        }
    }
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read all entries from a query log file.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_entries(path: &Path) -> Vec<QueryLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<QueryLogEntry>(&line).ok())
        .collect()
}

/// The most recent `limit` entries, newest last.
pub fn recent_entries(path: &Path, limit: usize) -> Vec<QueryLogEntry> {
    let mut entries = read_entries(path);
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    entries
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &QueryLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the query log file.
pub fn query_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ledgerstat").join("query-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_log_writes_nothing() {
        let log = QueryLog::disabled();
        assert!(!log.is_enabled());
        log.record("count", None, None, 1, Instant::now());
    }

    #[test]
    fn entries_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("query-log.jsonl");
        let log = QueryLog::at(&path);

        log.record("totals", Some(Dimension::Store), None, 3, Instant::now());
        log.record(
            "summary",
            Some(Dimension::Category),
            Some("Food"),
            2,
            Instant::now(),
        );

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "totals");
        assert_eq!(entries[0].dimension, Some(Dimension::Store));
        assert_eq!(entries[0].value, None);
        assert_eq!(entries[1].value.as_deref(), Some("Food"));
        assert_eq!(entries[1].rows, 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query-log.jsonl");
        fs::write(
            &path,
            "not json\n{\"timestamp\":\"t\",\"action\":\"count\",\"rows\":4,\"duration_ms\":0}\n",
        )
        .unwrap();

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rows, 4);
    }

    #[test]
    fn recent_entries_keeps_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query-log.jsonl");
        let log = QueryLog::at(&path);
        for rows in 0..5 {
            log.record("count", None, None, rows, Instant::now());
        }

        let recent = recent_entries(&path, 2);
        let rows: Vec<usize> = recent.iter().map(|e| e.rows).collect();
        assert_eq!(rows, [3, 4]);
        assert_eq!(recent_entries(&path, 10).len(), 5);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&dir.path().join("absent.jsonl")).is_empty());
    }
}
