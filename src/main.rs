use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ledgerstat::cli::{self, RenderOptions};
use ledgerstat::config::{self, LedgerstatConfig, OutputFormat};
use ledgerstat::history::QueryLog;
use ledgerstat::ledger::{Dimension, Ledger, SortKey, SortOrder, loader};
use ledgerstat::report::Granularity;
use ledgerstat::web;

#[derive(Debug, Parser)]
#[command(name = "ledgerstat")]
#[command(about = "Descriptive statistics over a ledger of purchases")]
struct App {
    /// Tab-separated purchase file (overrides data.file)
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    /// Output format: table (default), json, csv
    #[arg(long, global = true)]
    format: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(flatten)]
    Report(ReportCommand),
    /// Show recent queries from the query log
    History {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that load the purchase file.
#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// List all stores
    Stores,
    /// List all categories
    Categories,
    /// List all payment methods
    Payments,
    /// Count purchases
    Count,
    /// Sort the ledger and print it
    Sort {
        /// Sort key: date or price
        #[arg(long)]
        by: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Statistical summary for one store, category or payment method
    Summary {
        /// store, category or payment
        dimension: Dimension,
        /// The label to summarise, e.g. a store name
        value: String,
    },
    /// Sum of sales per store, category or payment method
    Totals { dimension: Dimension },
    /// Standard deviation of sales per store, category or payment method
    Spread { dimension: Dimension },
    /// Share of purchases per label, drawn as text bars
    Pie { dimension: Dimension },
    /// Sales over time, drawn as a text plot
    Trend {
        /// Bucket size: day, month or year
        #[arg(long, default_value = "month")]
        by: Granularity,
    },
    /// Purchases whose store matches a case-insensitive regular expression
    Filter { pattern: String },
    /// Interactive text menu
    Menu,
    /// Start the web dashboard
    Web {
        /// Address to bind (overrides web.addr)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.ledgerstat/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `data.max_records 0`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let format = app
        .format
        .as_deref()
        .map(|f| OutputFormat::from_str_opt(Some(f)));

    match app.command {
        Commands::Config { action } => run_config(action, app.file),
        Commands::History { limit } => {
            let config = resolve_config(app.file)?;
            let opts = RenderOptions::new(&config.report, format);
            cli::run_history(limit, opts.format)
        }
        Commands::Report(command) => {
            let config = resolve_config(app.file)?;
            ledgerstat::init_tracing(&config.logging.level);
            run_report(command, &config, format)
        }
    }
}

fn run_report(
    command: ReportCommand,
    config: &LedgerstatConfig,
    format: Option<OutputFormat>,
) -> Result<()> {
    let opts = RenderOptions::new(&config.report, format);
    let history = QueryLog::from_config(&config.logging);
    let mut ledger = open_ledger(config)?;

    match command {
        ReportCommand::Stores => cli::run_labels(&ledger, Dimension::Store, &opts, &history),
        ReportCommand::Categories => cli::run_labels(&ledger, Dimension::Category, &opts, &history),
        ReportCommand::Payments => cli::run_labels(&ledger, Dimension::Payment, &opts, &history),
        ReportCommand::Count => cli::run_count(&ledger, &opts, &history),
        ReportCommand::Sort { by, desc } => cli::run_sort(
            &mut ledger,
            by,
            SortOrder::from_descending(desc),
            &opts,
            &history,
        ),
        ReportCommand::Summary { dimension, value } => {
            cli::run_summary(&ledger, dimension, &value, &opts, &history)
        }
        ReportCommand::Totals { dimension } => cli::run_totals(&ledger, dimension, &opts, &history),
        ReportCommand::Spread { dimension } => cli::run_spread(&ledger, dimension, &opts, &history),
        ReportCommand::Pie { dimension } => cli::run_pie(&ledger, dimension, &opts, &history),
        ReportCommand::Trend { by } => cli::run_trend(&ledger, by, &opts, &history),
        ReportCommand::Filter { pattern } => cli::run_filter(&ledger, &pattern, &opts, &history),
        ReportCommand::Menu => cli::run_menu(&mut ledger, &opts, &history),
        ReportCommand::Web { addr, no_open } => {
            let addr = addr.unwrap_or_else(|| config.web.addr.clone());
            let open = config.web.open_browser && !no_open;
            web::serve(&mut ledger, &addr, open, &history)
        }
    }
}

/// Layered config with the `--file` flag applied on top.
fn resolve_config(file: Option<PathBuf>) -> Result<LedgerstatConfig> {
    let mut config = config::load()?;
    if let Some(file) = file {
        config.data.file = file;
    }
    Ok(config)
}

/// Load the purchase file named by the config. Any malformed row aborts.
fn open_ledger(config: &LedgerstatConfig) -> Result<Ledger> {
    let path = &config.data.file;
    let records = loader::load(path, &config.data.load_options())
        .with_context(|| format!("failed to load purchases from {}", path.display()))?;
    Ok(Ledger::new(records))
}

fn run_config(action: ConfigAction, file: Option<PathBuf>) -> Result<()> {
    match action {
        ConfigAction::Show => cli::run_config_show(&resolve_config(file)?),
        ConfigAction::Init { force } => cli::run_config_init(force),
        ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
        ConfigAction::Reset => cli::run_config_reset(),
    }
}
