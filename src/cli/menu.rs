//! Interactive numbered menu.
//!
//! Reads one line per prompt from any [`BufRead`] and writes to any
//! [`Write`], so a whole session can be scripted. Unknown labels, bad
//! patterns and illegal choices are reported and the loop continues with the
//! ledger untouched. End of input quits.

use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;

use super::{RenderOptions, finish};
use crate::error::LedgerError;
use crate::history::QueryLog;
use crate::ledger::{Dimension, Ledger, SortKey, SortOrder};
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Labels(Dimension),
    Count,
    Sort(SortKey, SortOrder),
    Summary(Dimension),
    Totals(Dimension),
    Spread(Dimension),
    Filter,
    Quit,
}

const ENTRIES: [(&str, Choice); 17] = [
    ("Print all stores.", Choice::Labels(Dimension::Store)),
    ("Print all categories.", Choice::Labels(Dimension::Category)),
    ("Print all payment methods.", Choice::Labels(Dimension::Payment)),
    ("Count purchases.", Choice::Count),
    (
        "Sort ledger by date ascending.",
        Choice::Sort(SortKey::Date, SortOrder::Ascending),
    ),
    (
        "Sort ledger by date descending.",
        Choice::Sort(SortKey::Date, SortOrder::Descending),
    ),
    (
        "Sort ledger by price ascending.",
        Choice::Sort(SortKey::Price, SortOrder::Ascending),
    ),
    (
        "Sort ledger by price descending.",
        Choice::Sort(SortKey::Price, SortOrder::Descending),
    ),
    (
        "Statistical summary for selected store.",
        Choice::Summary(Dimension::Store),
    ),
    (
        "Statistical summary for selected category.",
        Choice::Summary(Dimension::Category),
    ),
    (
        "Statistical summary for selected payment method.",
        Choice::Summary(Dimension::Payment),
    ),
    ("Sum of sales by stores.", Choice::Totals(Dimension::Store)),
    ("Sum of sales by categories.", Choice::Totals(Dimension::Category)),
    (
        "Sum of sales by payment methods.",
        Choice::Totals(Dimension::Payment),
    ),
    (
        "Standard deviation of sales by stores.",
        Choice::Spread(Dimension::Store),
    ),
    ("Filter ledger by store pattern.", Choice::Filter),
    ("Quit.", Choice::Quit),
];

/// Map a typed menu number to its entry.
fn parse_choice(line: &str) -> Option<Choice> {
    let number: usize = line.trim().parse().ok()?;
    ENTRIES
        .get(number.checked_sub(1)?)
        .map(|&(_, choice)| choice)
}

/// Singular noun used in prompts and "no such" messages.
fn noun(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Store => "store",
        Dimension::Category => "category",
        Dimension::Payment => "payment method",
    }
}

/// Run the menu until the user quits or input ends.
pub fn run<R: BufRead, W: Write>(
    ledger: &mut Ledger,
    input: R,
    output: W,
    opts: &RenderOptions,
    history: &QueryLog,
) -> Result<()> {
    let mut menu = Menu {
        ledger,
        input,
        output,
        opts,
        history,
    };
    menu.run()
}

struct Menu<'a, R, W> {
    ledger: &'a mut Ledger,
    input: R,
    output: W,
    opts: &'a RenderOptions,
    history: &'a QueryLog,
}

impl<R: BufRead, W: Write> Menu<'_, R, W> {
    fn run(&mut self) -> Result<()> {
        writeln!(self.output, "{}", "Welcome to the ledger of purchases!".bold())?;

        loop {
            self.print_menu()?;
            let Some(line) = self.prompt("Please enter your choice: ")? else {
                break;
            };

            match parse_choice(&line) {
                Some(Choice::Quit) => break,
                Some(choice) => self.dispatch(choice)?,
                None => writeln!(self.output, "{}", "Illegal choice.".red())?,
            }
        }

        writeln!(self.output, "Quitting...")?;
        self.output.flush()?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", "~".repeat(30))?;
        for (i, (label, _)) in ENTRIES.iter().enumerate() {
            let number = format!("{}.", i + 1);
            writeln!(self.output, "** {number:<4}{label} **")?;
        }
        writeln!(self.output, "{}", "~".repeat(30))?;
        writeln!(self.output)?;
        Ok(())
    }

    /// Print `message` and read one trimmed line; `None` at end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn dispatch(&mut self, choice: Choice) -> Result<()> {
        let started = Instant::now();
        let out = &mut self.output;
        let opts = self.opts;

        match choice {
            Choice::Labels(dimension) => {
                let list = report::labels(self.ledger, dimension);
                super::write_labels(out, &list, opts)?;
                finish(self.history, "labels", Some(dimension), None, list.labels.len(), started);
            }
            Choice::Count => {
                super::write_count(out, report::count(self.ledger), opts)?;
                finish(self.history, "count", None, None, 1, started);
            }
            Choice::Sort(key, order) => {
                let records = report::sorted_records(self.ledger, key, order);
                let title = format!("Sorting ledger by {key}");
                super::write_records(out, &title, records, opts)?;
                let key = key.to_string();
                finish(self.history, "sort", None, Some(&key), records.len(), started);
            }
            Choice::Summary(dimension) => {
                let message = format!("Please enter {}: ", noun(dimension));
                let Some(value) = self.prompt(&message)? else {
                    return Ok(());
                };
                match report::selection_summary(self.ledger, dimension, &value) {
                    Ok(summary) => {
                        super::write_selection(&mut self.output, &summary, opts)?;
                        finish(
                            self.history,
                            "summary",
                            Some(dimension),
                            Some(&value),
                            summary.breakdown.len(),
                            started,
                        );
                    }
                    Err(LedgerError::UnknownDimensionValue { .. }) => {
                        tracing::warn!(%dimension, value, "unknown label");
                        let message = format!("No such {} in data.", noun(dimension));
                        writeln!(self.output, "{}", message.yellow())?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Choice::Totals(dimension) => {
                let ranking = report::totals(self.ledger, dimension);
                super::write_ranking(out, &ranking, opts)?;
                finish(self.history, "totals", Some(dimension), None, ranking.rows.len(), started);
            }
            Choice::Spread(dimension) => {
                let ranking = report::spread(self.ledger, dimension);
                super::write_ranking(out, &ranking, opts)?;
                finish(self.history, "spread", Some(dimension), None, ranking.rows.len(), started);
            }
            Choice::Filter => {
                let Some(pattern) = self.prompt("Please enter store pattern: ")? else {
                    return Ok(());
                };
                match report::filter(self.ledger, &pattern) {
                    Ok(filtered) => {
                        super::write_filter(&mut self.output, &filtered, opts)?;
                        finish(
                            self.history,
                            "filter",
                            Some(Dimension::Store),
                            Some(&pattern),
                            filtered.records.len(),
                            started,
                        );
                    }
                    Err(e @ (LedgerError::EmptyPattern | LedgerError::InvalidPattern(_))) => {
                        tracing::warn!(pattern, "{e}");
                        writeln!(self.output, "{}", e.to_string().yellow())?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Choice::Quit => {}
        }

        writeln!(self.output, "{}", "-".repeat(100))?;
        Ok(())
    }
}
