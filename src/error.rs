//! Typed errors for the ledger and the statistics engine.
//!
//! Load-time errors ([`LedgerError::MalformedRecord`], [`LedgerError::Io`])
//! abort startup. Everything else is a recoverable query-time error that the
//! front ends report to the user without touching ledger state.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::Dimension;

/// Errors raised while loading or querying the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A row of the input file could not be turned into a purchase.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A query named a store/category/payment that is not in the index.
    #[error("no such {dimension} in data: {value}")]
    UnknownDimensionValue { dimension: Dimension, value: String },

    #[error("store pattern must not be empty")]
    EmptyPattern,

    /// The store pattern is not a valid regular expression.
    #[error("invalid store pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    /// Sample standard deviation needs at least two data points.
    #[error("standard deviation is not applicable to a sample of {count}")]
    DegenerateSample { count: usize },

    /// Percentage of a zero reference total.
    #[error("percentage is undefined for a zero total")]
    DivisionByZero,

    #[error("statistics require at least one data point")]
    EmptySample,
}
