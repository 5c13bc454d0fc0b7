//! ledgerstat: descriptive statistics over a personal purchase ledger.
//!
//! Purchases are loaded once from a tab-separated file into a [`ledger::Ledger`],
//! aggregated by store, category or payment method in [`stats`], shaped into
//! named reports by [`report`], and presented through the [`cli`] (tables,
//! text charts, interactive menu) or the [`web`] dashboard.

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod ledger;
pub mod report;
pub mod stats;
pub mod web;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
