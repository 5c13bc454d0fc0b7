//! Grouped aggregation and ranking engine.
//!
//! Everything here is a pure function of its inputs:
//!
//! - [`group_by`] partitions records by a [`Dimension`] into label → prices.
//!   Only labels with at least one record get an entry; callers must not
//!   assume every indexed label appears.
//! - [`Summary`] holds count, sum, mean, min, max and the sample standard
//!   deviation (undefined below two data points).
//! - [`percentage_of_total`] normalises a group sum against a reference total.
//! - [`aggregate`] and [`aggregate_within`] combine the above; the latter is
//!   the filter → group → normalise pattern used for "category X within
//!   store Y" style reports.
//! - [`rank_by_metric`] orders groups by any [`Metric`].
//!
//! Groups live in a `BTreeMap`, so iteration order is label order and ties
//! in a ranking fall back to ascending label (byte) order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::StatsError;
use crate::ledger::{Dimension, PurchaseRecord, SortOrder};

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics of a non-empty sample of prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    std_dev: Option<f64>,
}

impl Summary {
    /// Summarise a sample. Fails on an empty slice.
    pub fn from_prices(prices: &[f64]) -> Result<Self, StatsError> {
        if prices.is_empty() {
            return Err(StatsError::EmptySample);
        }

        let count = prices.len();
        let sum: f64 = prices.iter().sum();
        let mean = sum / count as f64;
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let std_dev = (count >= 2).then(|| {
            let squared: f64 = prices.iter().map(|p| (p - mean).powi(2)).sum();
            (squared / (count - 1) as f64).sqrt()
        });

        Ok(Self {
            count,
            sum,
            mean,
            min,
            max,
            std_dev,
        })
    }

    /// Sample standard deviation (denominator `count - 1`).
    pub fn std_dev(&self) -> Result<f64, StatsError> {
        self.std_dev
            .ok_or(StatsError::DegenerateSample { count: self.count })
    }
}

/// `group_sum / total_sum * 100`.
pub fn percentage_of_total(group_sum: f64, total_sum: f64) -> Result<f64, StatsError> {
    if total_sum == 0.0 {
        return Err(StatsError::DivisionByZero);
    }
    Ok(group_sum / total_sum * 100.0)
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Partition `records` by the label of `dimension`.
pub fn group_by<'a, I>(records: I, dimension: Dimension) -> BTreeMap<String, Vec<f64>>
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.label(dimension).to_string())
            .or_default()
            .push(record.price);
    }
    groups
}

/// Statistics for one group plus its share of the reference total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    #[serde(flatten)]
    pub summary: Summary,
    percentage: Option<f64>,
}

impl GroupStats {
    /// Share of the reference total, in percent.
    pub fn percentage(&self) -> Result<f64, StatsError> {
        self.percentage.ok_or(StatsError::DivisionByZero)
    }
}

/// Per-label statistics for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub dimension: Dimension,
    /// Reference total the percentages are computed against.
    pub total: f64,
    pub groups: BTreeMap<String, GroupStats>,
}

/// Group `records` by `dimension` and summarise each group against the sum
/// of all given records.
pub fn aggregate<'a, I>(records: I, dimension: Dimension) -> AggregationResult
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let groups = group_by(records, dimension);
    let total: f64 = groups.values().flatten().sum();
    summarise_groups(groups, dimension, total)
}

fn summarise_groups(
    groups: BTreeMap<String, Vec<f64>>,
    dimension: Dimension,
    total: f64,
) -> AggregationResult {
    let groups = groups
        .into_iter()
        .filter_map(|(label, prices)| {
            // group_by never yields an empty group
            let summary = Summary::from_prices(&prices).ok()?;
            let percentage = percentage_of_total(summary.sum, total).ok();
            Some((
                label,
                GroupStats {
                    summary,
                    percentage,
                },
            ))
        })
        .collect();

    AggregationResult {
        dimension,
        total,
        groups,
    }
}

/// Result of a two-level aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub dimension: Dimension,
    pub value: String,
    /// Statistics of every record matching the selection.
    pub summary: Summary,
    /// Matching records grouped by the inner dimension, percentages against
    /// `summary.sum`.
    pub breakdown: AggregationResult,
}

/// Filter to `outer == outer_value`, group the subset by `inner`, and
/// normalise each inner group against the subset's total.
///
/// Fails with [`StatsError::EmptySample`] when nothing matches.
pub fn aggregate_within<'a, I>(
    records: I,
    outer: Dimension,
    outer_value: &str,
    inner: Dimension,
) -> Result<Selection, StatsError>
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let selected: Vec<&PurchaseRecord> = records
        .into_iter()
        .filter(|record| record.label(outer) == outer_value)
        .collect();

    let prices: Vec<f64> = selected.iter().map(|record| record.price).collect();
    let summary = Summary::from_prices(&prices)?;
    let breakdown = summarise_groups(
        group_by(selected.iter().copied(), inner),
        inner,
        summary.sum,
    );

    Ok(Selection {
        dimension: outer,
        value: outer_value.to_string(),
        summary,
        breakdown,
    })
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Statistic a ranking orders groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Sum,
    Mean,
    StdDev,
    Min,
    Max,
    Percentage,
}

impl Metric {
    /// The metric's value for a group, or `None` when it is undefined.
    pub fn value(self, stats: &GroupStats) -> Option<f64> {
        let summary = &stats.summary;
        match self {
            Self::Count => Some(summary.count as f64),
            Self::Sum => Some(summary.sum),
            Self::Mean => Some(summary.mean),
            Self::StdDev => summary.std_dev().ok(),
            Self::Min => Some(summary.min),
            Self::Max => Some(summary.max),
            Self::Percentage => stats.percentage().ok(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::StdDev => "std",
            Self::Min => "min",
            Self::Max => "max",
            Self::Percentage => "percentage",
        };
        f.write_str(name)
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" | "total" => Ok(Self::Sum),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "std" | "stddev" | "std_dev" => Ok(Self::StdDev),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "pct" | "percent" | "percentage" => Ok(Self::Percentage),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// A group in ranked position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    pub label: String,
    #[serde(flatten)]
    pub stats: GroupStats,
}

/// Order the groups of `result` by `metric`.
///
/// The sort is stable over label order, so equal values keep ascending label
/// order. Groups whose metric is undefined come last in either direction.
pub fn rank_by_metric(
    result: AggregationResult,
    metric: Metric,
    order: SortOrder,
) -> Vec<RankedGroup> {
    let mut ranked: Vec<RankedGroup> = result
        .groups
        .into_iter()
        .map(|(label, stats)| RankedGroup { label, stats })
        .collect();

    ranked.sort_by(|a, b| {
        match (metric.value(&a.stats), metric.value(&b.stats)) {
            (Some(x), Some(y)) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
