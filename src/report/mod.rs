//! Named reports over the ledger.
//!
//! Every user-facing action (menu entry, CLI subcommand, web endpoint) maps
//! to exactly one function here. Reports return plain rows; rendering is the
//! front ends' job.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::{Dimension, Ledger, PurchaseRecord, SortKey, SortOrder};
use crate::stats::{self, Metric, RankedGroup, Summary};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Sorted distinct labels of one dimension.
#[derive(Debug, Clone, Serialize)]
pub struct LabelList {
    pub dimension: Dimension,
    pub labels: Vec<String>,
}

/// Statistics for one selected store/category/payment method, broken down by
/// a second dimension.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub dimension: Dimension,
    pub value: String,
    pub summary: Summary,
    pub breakdown_dimension: Dimension,
    /// Inner groups ranked by share of the selection's total.
    pub breakdown: Vec<RankedGroup>,
}

/// Per-label statistics ranked by one metric.
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub dimension: Dimension,
    pub metric: Metric,
    pub total: f64,
    pub rows: Vec<RankedGroup>,
}

/// Share of purchases per label (pie chart data).
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub dimension: Dimension,
    pub total: usize,
    pub slices: Vec<Slice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Slice {
    pub label: String,
    pub count: usize,
    /// Percent of all purchases; `None` only for an empty ledger.
    pub share: Option<f64>,
}

/// Time bucket for the sales trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Month,
    Year,
}

impl Granularity {
    fn format(self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "month" | "monthly" => Ok(Self::Month),
            "year" | "yearly" => Ok(Self::Year),
            other => Err(format!(
                "unknown granularity '{other}' (expected day, month or year)"
            )),
        }
    }
}

/// Sales per period in chronological order (line chart data).
#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub granularity: Granularity,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub count: usize,
    pub sum: f64,
}

/// Records whose store matches a pattern.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub pattern: String,
    pub records: Vec<PurchaseRecord>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// All labels of a dimension, alphabetically.
pub fn labels(ledger: &Ledger, dimension: Dimension) -> LabelList {
    LabelList {
        dimension,
        labels: ledger
            .index()
            .sorted_labels(dimension)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// Number of purchases in the ledger.
pub fn count(ledger: &Ledger) -> usize {
    ledger.len()
}

/// Reorder the ledger and return the records in their new order.
pub fn sorted_records(ledger: &mut Ledger, key: SortKey, order: SortOrder) -> &[PurchaseRecord] {
    ledger.sort_by(key, order);
    ledger.records()
}

/// Statistics for one label plus its breakdown by the complementary
/// dimension, normalised against the selection's own total.
pub fn selection_summary(
    ledger: &Ledger,
    dimension: Dimension,
    value: &str,
) -> Result<SelectionReport, LedgerError> {
    ledger.require_label(dimension, value)?;

    let inner = dimension.breakdown();
    let selection = stats::aggregate_within(ledger.records(), dimension, value, inner)
        .map_err(|_| LedgerError::UnknownDimensionValue {
            dimension,
            value: value.to_string(),
        })?;

    Ok(SelectionReport {
        dimension,
        value: selection.value,
        summary: selection.summary,
        breakdown_dimension: inner,
        breakdown: stats::rank_by_metric(
            selection.breakdown,
            Metric::Percentage,
            SortOrder::Descending,
        ),
    })
}

/// Sum of sales per label, largest first.
pub fn totals(ledger: &Ledger, dimension: Dimension) -> RankingReport {
    ranking(ledger, dimension, Metric::Sum)
}

/// Standard deviation of sales per label, largest first. Labels with a
/// single purchase have no standard deviation and come last.
pub fn spread(ledger: &Ledger, dimension: Dimension) -> RankingReport {
    ranking(ledger, dimension, Metric::StdDev)
}

/// Rank every label of `dimension` by `metric`, descending.
pub fn ranking(ledger: &Ledger, dimension: Dimension, metric: Metric) -> RankingReport {
    let result = stats::aggregate(ledger.records(), dimension);
    let total = result.total;
    RankingReport {
        dimension,
        metric,
        total,
        rows: stats::rank_by_metric(result, metric, SortOrder::Descending),
    }
}

/// Number of purchases per label as a share of all purchases.
pub fn distribution(ledger: &Ledger, dimension: Dimension) -> Distribution {
    let total = ledger.len();
    let ranked = stats::rank_by_metric(
        stats::aggregate(ledger.records(), dimension),
        Metric::Count,
        SortOrder::Descending,
    );

    let slices = ranked
        .into_iter()
        .map(|group| {
            let count = group.stats.summary.count;
            Slice {
                label: group.label,
                count,
                share: stats::percentage_of_total(count as f64, total as f64).ok(),
            }
        })
        .collect();

    Distribution {
        dimension,
        total,
        slices,
    }
}

/// Sales summed per day, month or year.
pub fn trend(ledger: &Ledger, granularity: Granularity) -> Trend {
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for record in ledger.records() {
        let period = record.date.format(granularity.format()).to_string();
        let bucket = buckets.entry(period).or_default();
        bucket.0 += 1;
        bucket.1 += record.price;
    }

    Trend {
        granularity,
        points: buckets
            .into_iter()
            .map(|(period, (count, sum))| TrendPoint { period, count, sum })
            .collect(),
    }
}

/// Purchases whose store matches `pattern` (case-insensitive regex).
pub fn filter(ledger: &Ledger, pattern: &str) -> Result<FilterReport, LedgerError> {
    if pattern.trim().is_empty() {
        return Err(LedgerError::EmptyPattern);
    }

    let records = ledger
        .filter_by_store_pattern(pattern)?
        .into_iter()
        .cloned()
        .collect();

    Ok(FilterReport {
        pattern: pattern.to_string(),
        records,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::record;

    fn ledger() -> Ledger {
        Ledger::new(vec![
            record("2020-01-01", "10:00", "MegaMart", "Food", 10.0, "Cash"),
            record("2020-01-15", "11:00", "MegaMart", "Toys", 30.0, "Visa"),
            record("2020-02-01", "12:00", "MegaMart", "Food", 20.0, "Visa"),
            record("2020-02-03", "09:00", "SuperShop", "Food", 40.0, "Cash"),
            record("2021-03-04", "08:00", "Corner", "Books", 5.0, "Cash"),
        ])
    }

    #[test]
    fn labels_are_sorted() {
        let list = labels(&ledger(), Dimension::Store);
        assert_eq!(list.labels, ["Corner", "MegaMart", "SuperShop"]);
    }

    #[test]
    fn selection_summary_breaks_store_down_by_category() {
        let report = selection_summary(&ledger(), Dimension::Store, "MegaMart").unwrap();
        assert_eq!(report.summary.count, 3);
        assert_eq!(report.summary.sum, 60.0);
        assert_eq!(report.breakdown_dimension, Dimension::Category);

        let labels: Vec<&str> = report.breakdown.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Food", "Toys"]);
        // Both are half of MegaMart's 60, not of the 105 grand total.
        for group in &report.breakdown {
            assert!((group.stats.percentage().unwrap() - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn selection_summary_breaks_category_down_by_store() {
        let report = selection_summary(&ledger(), Dimension::Category, "Food").unwrap();
        assert_eq!(report.breakdown_dimension, Dimension::Store);
        assert_eq!(report.breakdown[0].label, "SuperShop");
        assert!((report.breakdown[0].stats.percentage().unwrap() - 40.0 / 70.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn selection_summary_rejects_unknown_value() {
        let err = selection_summary(&ledger(), Dimension::Payment, "Bitcoin").unwrap_err();
        assert!(matches!(err, LedgerError::UnknownDimensionValue { .. }));
    }

    #[test]
    fn totals_rank_by_sum() {
        let report = totals(&ledger(), Dimension::Store);
        let labels: Vec<&str> = report.rows.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["MegaMart", "SuperShop", "Corner"]);
        assert_eq!(report.total, 105.0);
    }

    #[test]
    fn spread_puts_single_purchase_labels_last() {
        let report = spread(&ledger(), Dimension::Store);
        assert_eq!(report.rows[0].label, "MegaMart");
        assert!(report.rows[1].stats.summary.std_dev().is_err());
        assert!(report.rows[2].stats.summary.std_dev().is_err());
    }

    #[test]
    fn distribution_counts_purchases() {
        let report = distribution(&ledger(), Dimension::Payment);
        assert_eq!(report.total, 5);
        assert_eq!(report.slices[0].label, "Cash");
        assert_eq!(report.slices[0].count, 3);
        assert_eq!(report.slices[0].share, Some(60.0));
    }

    #[test]
    fn distribution_of_empty_ledger_has_no_slices() {
        let report = distribution(&Ledger::default(), Dimension::Payment);
        assert!(report.slices.is_empty());
    }

    #[test]
    fn trend_buckets_by_month_in_date_order() {
        let report = trend(&ledger(), Granularity::Month);
        let periods: Vec<&str> = report.points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2020-01", "2020-02", "2021-03"]);
        assert_eq!(report.points[0].sum, 40.0);
        assert_eq!(report.points[0].count, 2);
    }

    #[test]
    fn trend_by_year() {
        let report = trend(&ledger(), Granularity::Year);
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.points[1], TrendPoint {
            period: "2021".to_string(),
            count: 1,
            sum: 5.0,
        });
    }

    #[test]
    fn sorted_records_persist_in_ledger() {
        let mut ledger = ledger();
        let first = sorted_records(&mut ledger, SortKey::Price, SortOrder::Descending)[0].price;
        assert_eq!(first, 40.0);
        assert_eq!(ledger.records()[0].price, 40.0);
    }

    #[test]
    fn filter_rejects_empty_pattern() {
        assert!(matches!(
            filter(&ledger(), "  "),
            Err(LedgerError::EmptyPattern)
        ));
    }

    #[test]
    fn filter_returns_matching_records() {
        let report = filter(&ledger(), "mega").unwrap();
        assert_eq!(report.records.len(), 3);
        assert!(report.records.iter().all(|r| r.store == "MegaMart"));
    }
}
