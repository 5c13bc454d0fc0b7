/// End-to-end tests over a purchase file on disk.
///
/// Loads a small tab-separated ledger through the public loader and checks
/// the reports built on top of it.
use std::io::Write;

use tempfile::NamedTempFile;

use ledgerstat::error::{LedgerError, StatsError};
use ledgerstat::ledger::loader::{self, LoadOptions};
use ledgerstat::ledger::{Dimension, Ledger, SortKey, SortOrder};
use ledgerstat::report::{self, Granularity};
use ledgerstat::stats::{self, Metric, Summary};

const PURCHASES: &str = "\
2012-01-01\t09:00\tSan Jose\tMen's Clothing\t214.05\tAmex
2012-01-01\t09:00\tFort Worth\tWomen's Clothing\t153.57\tVisa
2012-01-01\t09:00\tSan Diego\tMusic\t66.08\tCash
2012-01-01\t09:00\tPittsburgh\tPet Supplies\t493.51\tDiscover
2012-01-01\t09:00\tOmaha\tChildren's Clothing\t235.63\tMasterCard
2012-1-2\t9:05\tSan Jose\tMusic\t20.00\tCash
2012-01-03\t10:15\tSan Diego\tMusic\t34.00\tVisa
2012-02-01\t11:00\tSan Jose\tMen's Clothing\t100.00\tAmex
";

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn load_ledger() -> Ledger {
    let file = write_file(PURCHASES);
    Ledger::new(loader::load(file.path(), &LoadOptions::default()).unwrap())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn loads_every_row() {
    let ledger = load_ledger();
    assert_eq!(report::count(&ledger), 8);
    assert_eq!(ledger.records()[5].date.to_string(), "2012-01-02");
}

#[test]
fn header_variant_skips_first_line() {
    let content = format!("date\ttime\tstore\tcategory\tprice\tpayment\n{PURCHASES}");
    let file = write_file(&content);
    let options = LoadOptions {
        has_header: true,
        ..LoadOptions::default()
    };
    assert_eq!(loader::load(file.path(), &options).unwrap().len(), 8);
}

#[test]
fn max_records_caps_the_load() {
    let file = write_file(PURCHASES);
    let options = LoadOptions {
        max_records: Some(3),
        ..LoadOptions::default()
    };
    assert_eq!(loader::load(file.path(), &options).unwrap().len(), 3);
}

#[test]
fn malformed_row_names_its_line() {
    let file = write_file("2012-01-01\t09:00\tOmaha\tMusic\t1.00\tCash\n2012-01-01\t09:00\tOmaha\tMusic\tcheap\tCash\n");
    let err = loader::load(file.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LedgerError::MalformedRecord { line: 2, .. }));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = loader::load(&dir.path().join("absent.txt"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LedgerError::Io { .. }));
    assert!(err.to_string().contains("absent.txt"));
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn group_sums_match_record_sums() {
    let ledger = load_ledger();
    for dimension in Dimension::ALL {
        let groups = stats::group_by(ledger.records(), dimension);
        for (label, prices) in &groups {
            let expected: f64 = ledger
                .records()
                .iter()
                .filter(|r| r.label(dimension) == label.as_str())
                .map(|r| r.price)
                .sum();
            let actual: f64 = prices.iter().sum();
            assert!((actual - expected).abs() < 1e-9, "{dimension} {label}");
        }
    }
}

#[test]
fn percentages_sum_to_one_hundred() {
    let ledger = load_ledger();
    for dimension in Dimension::ALL {
        let result = stats::aggregate(ledger.records(), dimension);
        let total: f64 = result
            .groups
            .values()
            .map(|g| g.percentage().unwrap())
            .sum();
        assert!((total - 100.0).abs() < 1e-6);
    }
}

#[test]
fn ranking_is_ordered_permutation() {
    let ledger = load_ledger();
    let result = stats::aggregate(ledger.records(), Dimension::Store);
    let mut labels: Vec<String> = result.groups.keys().cloned().collect();

    let ranked = stats::rank_by_metric(result, Metric::Mean, SortOrder::Ascending);
    let means: Vec<f64> = ranked.iter().map(|g| g.stats.summary.mean).collect();
    assert!(means.windows(2).all(|w| w[0] <= w[1]));

    let mut ranked_labels: Vec<String> = ranked.into_iter().map(|g| g.label).collect();
    labels.sort();
    ranked_labels.sort();
    assert_eq!(labels, ranked_labels);
}

#[test]
fn music_within_san_jose_uses_only_matching_records() {
    let ledger = load_ledger();
    let summary = report::selection_summary(&ledger, Dimension::Store, "San Jose").unwrap();

    assert_eq!(summary.summary.count, 3);
    assert!((summary.summary.sum - 334.05).abs() < 1e-9);

    let music = summary
        .breakdown
        .iter()
        .find(|g| g.label == "Music")
        .unwrap();
    assert_eq!(music.stats.summary.count, 1);
    let expected = 20.0 / 334.05 * 100.0;
    assert!((music.stats.percentage().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn unknown_store_is_recoverable() {
    let ledger = load_ledger();
    let err = report::selection_summary(&ledger, Dimension::Store, "Gotham").unwrap_err();
    assert_eq!(err.to_string(), "no such store in data: Gotham");
    assert_eq!(report::count(&ledger), 8);
}

#[test]
fn single_purchase_has_no_std_dev() {
    let summary = Summary::from_prices(&[42.0]).unwrap();
    assert_eq!(
        summary.std_dev(),
        Err(StatsError::DegenerateSample { count: 1 })
    );
}

// ---------------------------------------------------------------------------
// Sorting and filtering
// ---------------------------------------------------------------------------

#[test]
fn date_then_price_sort_is_idempotent() {
    let mut once = load_ledger();
    once.sort_by(SortKey::Date, SortOrder::Ascending);
    once.sort_by(SortKey::Price, SortOrder::Ascending);

    let mut twice = once.clone();
    twice.sort_by(SortKey::Date, SortOrder::Ascending);
    twice.sort_by(SortKey::Price, SortOrder::Ascending);
    twice.sort_by(SortKey::Date, SortOrder::Ascending);
    twice.sort_by(SortKey::Price, SortOrder::Ascending);

    assert_eq!(once.records(), twice.records());
}

#[test]
fn descending_date_sort_keeps_ties_in_order() {
    let mut ledger = load_ledger();
    ledger.sort_by(SortKey::Date, SortOrder::Descending);
    let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
    assert_eq!(stores[0], "San Jose");
    // The five 09:00 purchases on 2012-01-01 keep their file order.
    assert_eq!(
        &stores[3..],
        ["San Jose", "Fort Worth", "San Diego", "Pittsburgh", "Omaha"]
    );
}

#[test]
fn store_filter_is_case_insensitive_regex() {
    let ledger = load_ledger();
    let filtered = report::filter(&ledger, "^san").unwrap();
    assert_eq!(filtered.records.len(), 5);
    assert!(filtered.records.iter().all(|r| r.store.starts_with("San")));
}

#[test]
fn trend_per_month() {
    let ledger = load_ledger();
    let trend = report::trend(&ledger, Granularity::Month);
    let periods: Vec<&str> = trend.points.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(periods, ["2012-01", "2012-02"]);
    assert_eq!(trend.points[0].count, 7);
}
