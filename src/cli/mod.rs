//! CLI command implementations for ledgerstat.
//!
//! Provides subcommand handlers for:
//! - `ledgerstat stores|categories|payments`: dimension indexes
//! - `ledgerstat count`, `ledgerstat sort`: the ledger itself
//! - `ledgerstat summary|totals|spread`: aggregation reports
//! - `ledgerstat pie|trend`: text charts
//! - `ledgerstat filter`: store-name pattern search
//! - `ledgerstat history`: recent queries from the query log
//! - `ledgerstat config show|init|set|reset`: configuration management
//!
//! Every report renders as a table, JSON or CSV. Renderers write to any
//! [`Write`] so the text menu can share them.

pub mod chart;
pub mod menu;

use std::io::{self, Write};
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::schema::ReportConfig;
use crate::config::{self, LedgerstatConfig, OutputFormat};
use crate::error::StatsError;
use crate::history::{self, QueryLog, QueryLogEntry};
use crate::ledger::{Dimension, Ledger, PurchaseRecord, SortKey, SortOrder};
use crate::report::{
    self, Distribution, FilterReport, Granularity, LabelList, RankingReport, SelectionReport,
    Trend,
};
use crate::stats::{Metric, RankedGroup};

/// Width of the share bars drawn by `pie`.
const BAR_WIDTH: usize = 30;
/// Rows of the `trend` plot.
const PLOT_HEIGHT: usize = 10;

// ---------------------------------------------------------------------------
// Render options
// ---------------------------------------------------------------------------

/// How reports are rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Decimal places for amounts in tables.
    pub precision: usize,
    /// Row limit for ranked tables; `0` shows every row.
    pub top: usize,
}

impl RenderOptions {
    /// Options from the `[report]` config, with an optional format override.
    pub fn new(config: &ReportConfig, format: Option<OutputFormat>) -> Self {
        Self {
            format: format.unwrap_or(config.default_format),
            precision: config.precision,
            top: config.top,
        }
    }

    fn limit<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        if self.top == 0 || rows.len() <= self.top {
            rows
        } else {
            &rows[..self.top]
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(&ReportConfig::default(), None)
    }
}

// ---------------------------------------------------------------------------
// ledgerstat stores | categories | payments
// ---------------------------------------------------------------------------

/// List every label of a dimension.
pub fn run_labels(
    ledger: &Ledger,
    dimension: Dimension,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let list = report::labels(ledger, dimension);
    write_labels(&mut io::stdout().lock(), &list, opts)?;
    finish(history, "labels", Some(dimension), None, list.labels.len(), started);
    Ok(())
}

pub fn write_labels<W: Write>(out: &mut W, list: &LabelList, opts: &RenderOptions) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, list)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record([list.dimension.to_string()])?;
            for label in &list.labels {
                wtr.write_record([label])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            let title = format!("All {}", list.dimension.plural());
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(40))?;
            for label in &list.labels {
                writeln!(out, "  {label}")?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "Total of {} different {}.",
                list.labels.len(),
                list.dimension.plural()
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat count
// ---------------------------------------------------------------------------

/// Print the number of purchases.
pub fn run_count(ledger: &Ledger, opts: &RenderOptions, history: &QueryLog) -> Result<()> {
    let started = Instant::now();
    let count = report::count(ledger);
    write_count(&mut io::stdout().lock(), count, opts)?;
    finish(history, "count", None, None, 1, started);
    Ok(())
}

pub fn write_count<W: Write>(out: &mut W, count: usize, opts: &RenderOptions) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, &serde_json::json!({ "count": count }))?,
        OutputFormat::Csv => writeln!(out, "count\n{count}")?,
        OutputFormat::Table => writeln!(out, "{} {}", "Count of purchases:".bold(), count)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat sort
// ---------------------------------------------------------------------------

/// Reorder the ledger and print it.
pub fn run_sort(
    ledger: &mut Ledger,
    key: SortKey,
    order: SortOrder,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let records = report::sorted_records(ledger, key, order);
    let title = format!("Ledger sorted by {key}");
    write_records(&mut io::stdout().lock(), &title, records, opts)?;
    finish(history, "sort", None, Some(&key.to_string()), records.len(), started);
    Ok(())
}

/// Render purchases in ledger order.
pub fn write_records<W: Write>(
    out: &mut W,
    title: &str,
    records: &[PurchaseRecord],
    opts: &RenderOptions,
) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, records)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record(["date", "time", "store", "category", "price", "payment"])?;
            for record in records {
                wtr.write_record([
                    record.date.to_string(),
                    record.time.format("%H:%M").to_string(),
                    record.store.clone(),
                    record.category.clone(),
                    record.price.to_string(),
                    record.payment.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(96))?;
            writeln!(
                out,
                "  {:<10}  {:<5}  {:<22} {:<24} {:>12}  {}",
                "Date", "Time", "Store", "Category", "Price", "Payment"
            )?;
            writeln!(out, "  {}", "-".repeat(94))?;
            for (i, record) in records.iter().enumerate() {
                let line = format!(
                    "  {:<10}  {:<5}  {:<22} {:<24} {:>12}  {}",
                    record.date,
                    record.time.format("%H:%M"),
                    truncate(&record.store, 22),
                    truncate(&record.category, 24),
                    format_amount(record.price, opts.precision),
                    record.payment,
                );
                write_striped(out, i, &line)?;
            }
            writeln!(out, "  {}", format!("{} purchases", records.len()).dimmed())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat summary
// ---------------------------------------------------------------------------

/// Statistical summary for one store, category or payment method.
pub fn run_summary(
    ledger: &Ledger,
    dimension: Dimension,
    value: &str,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let summary = report::selection_summary(ledger, dimension, value).inspect_err(|e| {
        tracing::warn!(%dimension, value, "{e}");
    })?;
    write_selection(&mut io::stdout().lock(), &summary, opts)?;
    finish(
        history,
        "summary",
        Some(dimension),
        Some(value),
        summary.breakdown.len(),
        started,
    );
    Ok(())
}

pub fn write_selection<W: Write>(
    out: &mut W,
    report: &SelectionReport,
    opts: &RenderOptions,
) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, report)?,
        OutputFormat::Csv => {
            // Selection totals first, then a blank line and the breakdown.
            {
                let summary = &report.summary;
                let mut wtr = csv::Writer::from_writer(&mut *out);
                wtr.write_record([
                    "dimension", "value", "count", "sum", "mean", "std_dev", "min", "max",
                ])?;
                wtr.write_record([
                    report.dimension.to_string(),
                    report.value.clone(),
                    summary.count.to_string(),
                    summary.sum.to_string(),
                    summary.mean.to_string(),
                    optional_number(summary.std_dev()),
                    summary.min.to_string(),
                    summary.max.to_string(),
                ])?;
                wtr.flush()?;
            }
            writeln!(out)?;
            write_groups_csv(out, report.breakdown_dimension, &report.breakdown)?
        }
        OutputFormat::Table => {
            let summary = &report.summary;
            let p = opts.precision;
            let title = format!("Statistics for {} {}", report.dimension, report.value);
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(60))?;
            writeln!(out, "  {} {}", "Purchases:".bold(), summary.count)?;
            writeln!(out, "  {} {}", "Sum:      ".bold(), format_amount(summary.sum, p))?;
            writeln!(out, "  {} {}", "Mean:     ".bold(), format_amount(summary.mean, p))?;
            writeln!(
                out,
                "  {} {}",
                "Std dev:  ".bold(),
                format_metric(summary.std_dev(), p)
            )?;
            writeln!(out, "  {} {}", "Min:      ".bold(), format_amount(summary.min, p))?;
            writeln!(out, "  {} {}", "Max:      ".bold(), format_amount(summary.max, p))?;
            writeln!(out)?;

            let heading = format!(
                "Sales by {} within {}",
                report.breakdown_dimension, report.value
            );
            writeln!(out, "{}", heading.bold().cyan())?;
            let rows = opts.limit(&report.breakdown);
            let width = label_width(rows.iter().map(|g| g.label.as_str()));
            writeln!(
                out,
                "  {:<width$} {:>6} {:>12} {:>12} {:>10}",
                report.breakdown_dimension.title(),
                "Count",
                "Sum",
                "Mean",
                "Share"
            )?;
            writeln!(out, "  {}", "-".repeat(width + 44))?;
            for (i, group) in rows.iter().enumerate() {
                let stats = &group.stats;
                let line = format!(
                    "  {:<width$} {:>6} {:>12} {:>12} {:>10}",
                    truncate(&group.label, width),
                    stats.summary.count,
                    format_amount(stats.summary.sum, p),
                    format_amount(stats.summary.mean, p),
                    format_percentage(stats.percentage(), p),
                );
                write_striped(out, i, &line)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat totals | spread
// ---------------------------------------------------------------------------

/// Sum of sales per label.
pub fn run_totals(
    ledger: &Ledger,
    dimension: Dimension,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let ranking = report::totals(ledger, dimension);
    write_ranking(&mut io::stdout().lock(), &ranking, opts)?;
    finish(history, "totals", Some(dimension), None, ranking.rows.len(), started);
    Ok(())
}

/// Standard deviation of sales per label.
pub fn run_spread(
    ledger: &Ledger,
    dimension: Dimension,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let ranking = report::spread(ledger, dimension);
    write_ranking(&mut io::stdout().lock(), &ranking, opts)?;
    finish(history, "spread", Some(dimension), None, ranking.rows.len(), started);
    Ok(())
}

pub fn write_ranking<W: Write>(
    out: &mut W,
    ranking: &RankingReport,
    opts: &RenderOptions,
) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, ranking)?,
        OutputFormat::Csv => write_groups_csv(out, ranking.dimension, &ranking.rows)?,
        OutputFormat::Table => {
            let p = opts.precision;
            let title = match ranking.metric {
                Metric::Sum => format!("Sum of sales by {}", ranking.dimension),
                Metric::StdDev => format!("Spread of sales by {}", ranking.dimension),
                metric => format!("{} of sales by {}", metric, ranking.dimension),
            };
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(60))?;

            let rows = opts.limit(&ranking.rows);
            let width = label_width(rows.iter().map(|g| g.label.as_str()));
            writeln!(
                out,
                "  {:<width$} {:>6} {:>12} {:>12} {:>12} {:>10}",
                ranking.dimension.title(),
                "Count",
                "Sum",
                "Mean",
                "Std dev",
                "Share"
            )?;
            writeln!(out, "  {}", "-".repeat(width + 57))?;
            for (i, group) in rows.iter().enumerate() {
                let stats = &group.stats;
                let line = format!(
                    "  {:<width$} {:>6} {:>12} {:>12} {:>12} {:>10}",
                    truncate(&group.label, width),
                    stats.summary.count,
                    format_amount(stats.summary.sum, p),
                    format_amount(stats.summary.mean, p),
                    format_metric(stats.summary.std_dev(), p),
                    format_percentage(stats.percentage(), p),
                );
                write_striped(out, i, &line)?;
            }
            if rows.len() < ranking.rows.len() {
                let hidden = format!("… {} more", ranking.rows.len() - rows.len());
                writeln!(out, "  {}", hidden.dimmed())?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "  {} {}",
                "Total sales:".bold(),
                format_amount(ranking.total, p)
            )?;
        }
    }
    Ok(())
}

fn write_groups_csv<W: Write>(
    out: &mut W,
    dimension: Dimension,
    groups: &[RankedGroup],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(&mut *out);
    wtr.write_record([
        dimension.to_string().as_str(),
        "count",
        "sum",
        "mean",
        "std_dev",
        "min",
        "max",
        "percentage",
    ])?;
    for group in groups {
        let summary = &group.stats.summary;
        wtr.write_record([
            group.label.clone(),
            summary.count.to_string(),
            summary.sum.to_string(),
            summary.mean.to_string(),
            optional_number(summary.std_dev()),
            summary.min.to_string(),
            summary.max.to_string(),
            optional_number(group.stats.percentage()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat pie
// ---------------------------------------------------------------------------

/// Share of purchases per label, as text bars.
pub fn run_pie(
    ledger: &Ledger,
    dimension: Dimension,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let distribution = report::distribution(ledger, dimension);
    write_distribution(&mut io::stdout().lock(), &distribution, opts)?;
    finish(history, "pie", Some(dimension), None, distribution.slices.len(), started);
    Ok(())
}

pub fn write_distribution<W: Write>(
    out: &mut W,
    distribution: &Distribution,
    opts: &RenderOptions,
) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, distribution)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record([distribution.dimension.to_string().as_str(), "count", "share"])?;
            for slice in &distribution.slices {
                wtr.write_record([
                    slice.label.clone(),
                    slice.count.to_string(),
                    slice.share.map(|s| s.to_string()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            let title = format!("Purchases by {}", distribution.dimension);
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(60))?;
            let slices = opts.limit(&distribution.slices);
            let width = label_width(slices.iter().map(|s| s.label.as_str()));
            for (i, line) in chart::share_bars(slices, width, BAR_WIDTH).iter().enumerate() {
                write_striped(out, i, &format!("  {line}"))?;
            }
            writeln!(out)?;
            writeln!(out, "  {} {}", "Purchases:".bold(), distribution.total)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat trend
// ---------------------------------------------------------------------------

/// Sales over time, as a text plot.
pub fn run_trend(
    ledger: &Ledger,
    granularity: Granularity,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let trend = report::trend(ledger, granularity);
    write_trend(&mut io::stdout().lock(), &trend, opts)?;
    finish(
        history,
        "trend",
        None,
        Some(&granularity.to_string()),
        trend.points.len(),
        started,
    );
    Ok(())
}

pub fn write_trend<W: Write>(out: &mut W, trend: &Trend, opts: &RenderOptions) -> Result<()> {
    match opts.format {
        OutputFormat::Json => write_json(out, trend)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record([trend.granularity.to_string().as_str(), "count", "sum"])?;
            for point in &trend.points {
                wtr.write_record([
                    point.period.clone(),
                    point.count.to_string(),
                    point.sum.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            let title = format!("Sales per {}", trend.granularity);
            writeln!(out, "{}", title.bold().cyan())?;
            writeln!(out, "{}", "=".repeat(60))?;
            if trend.points.is_empty() {
                writeln!(out, "{}", "No purchases.".yellow())?;
                return Ok(());
            }
            for line in chart::line_plot(&trend.points, PLOT_HEIGHT, opts.precision) {
                writeln!(out, "  {line}")?;
            }
            writeln!(out)?;
            writeln!(out, "  {:<12} {:>8} {:>12}", "Period", "Count", "Sum")?;
            writeln!(out, "  {}", "-".repeat(34))?;
            for (i, point) in trend.points.iter().enumerate() {
                let line = format!(
                    "  {:<12} {:>8} {:>12}",
                    point.period,
                    point.count,
                    format_amount(point.sum, opts.precision),
                );
                write_striped(out, i, &line)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat filter
// ---------------------------------------------------------------------------

/// Purchases whose store matches a pattern.
pub fn run_filter(
    ledger: &Ledger,
    pattern: &str,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let started = Instant::now();
    let filtered = report::filter(ledger, pattern).inspect_err(|e| {
        tracing::warn!(pattern, "{e}");
    })?;
    write_filter(&mut io::stdout().lock(), &filtered, opts)?;
    finish(
        history,
        "filter",
        Some(Dimension::Store),
        Some(pattern),
        filtered.records.len(),
        started,
    );
    Ok(())
}

pub fn write_filter<W: Write>(out: &mut W, filtered: &FilterReport, opts: &RenderOptions) -> Result<()> {
    if filtered.records.is_empty() && opts.format == OutputFormat::Table {
        let message = format!("No store matches '{}'.", filtered.pattern);
        writeln!(out, "{}", message.yellow())?;
        return Ok(());
    }
    let title = format!("Stores matching '{}'", filtered.pattern);
    write_records(out, &title, &filtered.records, opts)
}

// ---------------------------------------------------------------------------
// ledgerstat menu
// ---------------------------------------------------------------------------

/// Run the interactive text menu on stdin/stdout.
pub fn run_menu(ledger: &mut Ledger, opts: &RenderOptions, history: &QueryLog) -> Result<()> {
    let stdin = io::stdin();
    menu::run(ledger, stdin.lock(), io::stdout(), opts, history)
}

// ---------------------------------------------------------------------------
// ledgerstat history
// ---------------------------------------------------------------------------

/// Show the most recent queries from the query log.
pub fn run_history(limit: usize, format: OutputFormat) -> Result<()> {
    let Some(path) = history::query_log_path() else {
        anyhow::bail!("could not determine home directory");
    };
    let entries = history::recent_entries(&path, limit);

    if entries.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No queries logged yet. Enable logging.query_log to record them.".yellow()
        );
        return Ok(());
    }

    write_history(&mut io::stdout().lock(), &entries, format)
}

pub fn write_history<W: Write>(
    out: &mut W,
    entries: &[QueryLogEntry],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, entries)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record(["timestamp", "action", "dimension", "value", "rows", "duration_ms"])?;
            for entry in entries {
                wtr.write_record([
                    entry.timestamp.clone(),
                    entry.action.clone(),
                    entry.dimension.map(|d| d.to_string()).unwrap_or_default(),
                    entry.value.clone().unwrap_or_default(),
                    entry.rows.to_string(),
                    entry.duration_ms.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            writeln!(out, "{}", "Recent queries".bold().cyan())?;
            writeln!(out, "{}", "=".repeat(80))?;
            writeln!(
                out,
                "  {:<25} {:<8} {:<9} {:<20} {:>6} {:>6}",
                "Timestamp", "Action", "Dimension", "Value", "Rows", "ms"
            )?;
            writeln!(out, "  {}", "-".repeat(78))?;
            for (i, entry) in entries.iter().enumerate() {
                let line = format!(
                    "  {:<25} {:<8} {:<9} {:<20} {:>6} {:>6}",
                    truncate(&entry.timestamp, 25),
                    entry.action,
                    entry.dimension.map(|d| d.to_string()).unwrap_or_default(),
                    truncate(entry.value.as_deref().unwrap_or(""), 20),
                    entry.rows,
                    entry.duration_ms,
                );
                write_striped(out, i, &line)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ledgerstat config
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show(config: &LedgerstatConfig) -> Result<()> {
    let toml_str = config::show_effective_config(config)?;
    println!("{}", "Effective ledgerstat Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.ledgerstat/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.ledgerstat/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".ledgerstat.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".ledgerstat.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "LEDGERSTAT_* environment variables".dimmed()
    );
    println!("  {} {}", "·".dimmed(), "command-line flags".dimmed());

    Ok(())
}

/// Initialize a default config file at `~/.ledgerstat/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to customize ledgerstat.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Trace a finished query and append it to the query log.
fn finish(
    history: &QueryLog,
    action: &str,
    dimension: Option<Dimension>,
    value: Option<&str>,
    rows: usize,
    started: Instant,
) {
    tracing::debug!(
        action,
        dimension = dimension.map(|d| d.to_string()),
        value,
        rows,
        elapsed_us = started.elapsed().as_micros() as u64,
        "query finished"
    );
    history.record(action, dimension, value, rows, started);
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Alternate rows are dimmed for readability.
fn write_striped<W: Write>(out: &mut W, index: usize, line: &str) -> io::Result<()> {
    if index % 2 == 0 {
        writeln!(out, "{line}")
    } else {
        writeln!(out, "{}", line.dimmed())
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(8, 28)
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format an amount with comma separators and a fixed number of decimals.
pub fn format_amount(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut result = String::new();
    if value < 0.0 {
        result.push('-');
    }
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if let Some(frac_part) = frac_part {
        result.push('.');
        result.push_str(frac_part);
    }
    result
}

/// A statistic that may be undefined: `n/a` for too few data points,
/// `undefined` for a zero reference total.
pub fn format_metric(value: Result<f64, StatsError>, precision: usize) -> String {
    match value {
        Ok(v) => format_amount(v, precision),
        Err(e) => undefined_label(e).to_string(),
    }
}

/// A percentage that may be undefined.
pub fn format_percentage(value: Result<f64, StatsError>, precision: usize) -> String {
    match value {
        Ok(v) => format!("{v:.precision$}%"),
        Err(e) => undefined_label(e).to_string(),
    }
}

fn undefined_label(err: StatsError) -> &'static str {
    match err {
        StatsError::DivisionByZero => "undefined",
        StatsError::DegenerateSample { .. } | StatsError::EmptySample => "n/a",
    }
}

/// Undefined values become empty CSV fields.
fn optional_number(value: Result<f64, StatsError>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::sample_ledger;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn with_format(format: OutputFormat) -> RenderOptions {
        RenderOptions {
            format,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0, 2), "0.00");
        assert_eq!(format_amount(42.5, 2), "42.50");
        assert_eq!(format_amount(999.0, 0), "999");
        assert_eq!(format_amount(1000.0, 0), "1,000");
        assert_eq!(format_amount(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_amount(-1234.5, 1), "-1,234.5");
    }

    #[test]
    fn test_format_undefined_metrics() {
        assert_eq!(
            format_metric(Err(StatsError::DegenerateSample { count: 1 }), 2),
            "n/a"
        );
        assert_eq!(
            format_percentage(Err(StatsError::DivisionByZero), 2),
            "undefined"
        );
        assert_eq!(format_percentage(Ok(85.714_285), 2), "85.71%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("Café Münster", 5), "Café…");
    }

    #[test]
    fn render_options_take_config_defaults() {
        let config = ReportConfig {
            precision: 3,
            default_format: OutputFormat::Csv,
            top: 5,
        };
        let opts = RenderOptions::new(&config, None);
        assert_eq!(opts.format, OutputFormat::Csv);
        assert_eq!(opts.top, 5);
        let opts = RenderOptions::new(&config, Some(OutputFormat::Json));
        assert_eq!(opts.format, OutputFormat::Json);
    }

    #[test]
    fn top_limits_rows() {
        let opts = RenderOptions {
            top: 2,
            ..RenderOptions::default()
        };
        assert_eq!(opts.limit(&[1, 2, 3]), &[1, 2]);
        assert_eq!(RenderOptions::default().limit(&[1, 2, 3]).len(), 3);
    }

    #[test]
    fn labels_table_reports_total() {
        let ledger = sample_ledger();
        let list = report::labels(&ledger, Dimension::Store);
        let text = render(|out| write_labels(out, &list, &RenderOptions::default()));
        assert!(text.contains("MegaMart"));
        assert!(text.contains("Total of 3 different stores."));
    }

    #[test]
    fn labels_csv_has_header_and_rows() {
        let ledger = sample_ledger();
        let list = report::labels(&ledger, Dimension::Payment);
        let text = render(|out| write_labels(out, &list, &with_format(OutputFormat::Csv)));
        assert_eq!(text, "payment\nAmex\nCash\nVisa\n");
    }

    #[test]
    fn totals_json_is_parseable() {
        let ledger = sample_ledger();
        let ranking = report::totals(&ledger, Dimension::Store);
        let text = render(|out| write_ranking(out, &ranking, &with_format(OutputFormat::Json)));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["metric"], "sum");
        assert_eq!(value["rows"][0]["label"], "MegaMart");
        assert_eq!(value["rows"][0]["sum"], 30.0);
    }

    #[test]
    fn spread_csv_leaves_undefined_std_dev_empty() {
        let ledger = sample_ledger();
        let ranking = report::spread(&ledger, Dimension::Store);
        let text = render(|out| write_ranking(out, &ranking, &with_format(OutputFormat::Csv)));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "store,count,sum,mean,std_dev,min,max,percentage"
        );
        assert!(lines[1].starts_with("MegaMart,2,30,15,"));
        // SuperShop has a single purchase
        assert!(lines.iter().any(|l| l.starts_with("SuperShop,1,5,5,,5,5,")));
    }

    #[test]
    fn spread_table_shows_na_for_single_purchase() {
        let ledger = sample_ledger();
        let ranking = report::spread(&ledger, Dimension::Store);
        let text = render(|out| write_ranking(out, &ranking, &RenderOptions::default()));
        assert!(text.contains("n/a"));
        assert!(text.contains("Total sales:"));
    }

    #[test]
    fn selection_table_has_breakdown() {
        let ledger = sample_ledger();
        let summary = report::selection_summary(&ledger, Dimension::Store, "MegaMart").unwrap();
        let text = render(|out| write_selection(out, &summary, &RenderOptions::default()));
        assert!(text.contains("Statistics for store MegaMart"));
        assert!(text.contains("Food"));
        assert!(text.contains("66.67%"));
    }

    #[test]
    fn selection_csv_leads_with_selection_totals() {
        let ledger = sample_ledger();
        let summary = report::selection_summary(&ledger, Dimension::Store, "MegaMart").unwrap();
        let text = render(|out| write_selection(out, &summary, &with_format(OutputFormat::Csv)));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "dimension,value,count,sum,mean,std_dev,min,max");
        let std_dev = summary.summary.std_dev().unwrap();
        assert_eq!(lines[1], format!("store,MegaMart,2,30,15,{std_dev},10,20"));
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("category,count,sum"));
        assert_eq!(lines.len(), 4 + summary.breakdown.len());
    }

    #[test]
    fn records_csv_round_trips_fields() {
        let ledger = sample_ledger();
        let text = render(|out| {
            write_records(out, "Ledger", ledger.records(), &with_format(OutputFormat::Csv))
        });
        let first = text.lines().nth(1).unwrap();
        assert_eq!(first, "2020-01-03,12:00,SuperShop,Food,5,Cash");
    }

    #[test]
    fn empty_filter_prints_notice() {
        let ledger = sample_ledger();
        let filtered = report::filter(&ledger, "nomatch").unwrap();
        let text = render(|out| write_filter(out, &filtered, &RenderOptions::default()));
        assert!(text.contains("No store matches 'nomatch'."));
    }

    #[test]
    fn trend_table_draws_plot() {
        let ledger = sample_ledger();
        let trend = report::trend(&ledger, Granularity::Day);
        let text = render(|out| write_trend(out, &trend, &RenderOptions::default()));
        assert!(text.contains('●'));
        assert!(text.contains("2020-01-02"));
    }

    #[test]
    fn history_csv_has_one_line_per_entry() {
        let entries = vec![QueryLogEntry {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            action: "totals".to_string(),
            dimension: Some(Dimension::Category),
            value: None,
            rows: 4,
            duration_ms: 1,
        }];
        let text = render(|out| write_history(out, &entries, OutputFormat::Csv));
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("totals,category,,4,1"));
    }
}
