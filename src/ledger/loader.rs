//! Tab-separated purchase file reader.
//!
//! Each line holds exactly six fields: `date`, `time`, `store`, `category`,
//! `price`, `payment`. Dates are `YYYY-MM-DD` and times `HH:MM`; single-digit
//! months, days and hours are accepted. Any bad row aborts the load with
//! [`LedgerError::MalformedRecord`] naming its line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use super::PurchaseRecord;
use crate::error::LedgerError;

const FIELD_COUNT: usize = 6;

/// How the input file is laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip the first line (the header-augmented variant of the file).
    pub has_header: bool,
    /// Stop after this many records. `None` reads the whole file.
    pub max_records: Option<usize>,
}

/// Load every purchase from the file at `path`.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Vec<PurchaseRecord>, LedgerError> {
    let file = File::open(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(file, options).map_err(|err| match err {
        LedgerError::Io { source, .. } => LedgerError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    tracing::info!(path = %path.display(), records = records.len(), "ledger loaded");
    Ok(records)
}

/// Read purchases from any tab-separated source.
pub fn read_records<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<Vec<PurchaseRecord>, LedgerError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(options.has_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.records() {
        if options.max_records.is_some_and(|max| records.len() >= max) {
            break;
        }
        let row = result.map_err(csv_error)?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
        records.push(parse_record(&row, line)?);
    }

    Ok(records)
}

/// Turn one row into a purchase record.
pub fn parse_record(row: &StringRecord, line: usize) -> Result<PurchaseRecord, LedgerError> {
    let malformed = |reason: String| LedgerError::MalformedRecord { line, reason };

    if row.len() != FIELD_COUNT {
        return Err(malformed(format!(
            "expected {FIELD_COUNT} fields, found {}",
            row.len()
        )));
    }

    let date = NaiveDate::parse_from_str(&row[0], "%Y-%m-%d")
        .map_err(|e| malformed(format!("invalid date '{}': {e}", &row[0])))?;
    let time = NaiveTime::parse_from_str(&row[1], "%H:%M")
        .map_err(|e| malformed(format!("invalid time '{}': {e}", &row[1])))?;
    let price: f64 = row[4]
        .parse()
        .map_err(|_| malformed(format!("price is not numeric: '{}'", &row[4])))?;
    if !price.is_finite() || price < 0.0 {
        return Err(malformed(format!(
            "price must be a non-negative number: '{}'",
            &row[4]
        )));
    }

    Ok(PurchaseRecord {
        date,
        time,
        store: row[2].to_string(),
        category: row[3].to_string(),
        price,
        payment: row[5].to_string(),
    })
}

fn csv_error(err: csv::Error) -> LedgerError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LedgerError::Io {
            path: Default::default(),
            source,
        },
        other => LedgerError::MalformedRecord {
            line,
            reason: format!("{other:?}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
