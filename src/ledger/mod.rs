//! The in-memory purchase ledger.
//!
//! A [`Ledger`] owns the ordered sequence of [`PurchaseRecord`]s loaded at
//! startup together with a [`DimensionIndex`] of every distinct store,
//! category and payment label. Records are never mutated after load; the only
//! mutation the ledger supports is reordering the sequence in place
//! ([`Ledger::sort_by`]), which later queries observe.
//!
//! The ledger is owned by the entry point and passed by reference to every
//! handler; there is no process-wide instance.

pub mod loader;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Purchase record
// ---------------------------------------------------------------------------

/// A single purchase: one line of the input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_minutes")]
    pub time: NaiveTime,
    pub store: String,
    pub category: String,
    pub price: f64,
    pub payment: String,
}

impl PurchaseRecord {
    /// The record's label for the given dimension.
    pub fn label(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Store => &self.store,
            Dimension::Category => &self.category,
            Dimension::Payment => &self.payment,
        }
    }
}

fn serialize_minutes<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// A grouping key for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Store,
    Category,
    Payment,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Store, Dimension::Category, Dimension::Payment];

    /// Capitalized column heading, e.g. `"Store"`.
    pub fn title(self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Category => "Category",
            Self::Payment => "Payment",
        }
    }

    /// Plural noun used in listings, e.g. `"payment methods"`.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Store => "stores",
            Self::Category => "categories",
            Self::Payment => "payment methods",
        }
    }

    /// The dimension a selection on `self` is broken down by.
    ///
    /// A store is broken down by category; a category or a payment method is
    /// broken down by store.
    pub fn breakdown(self) -> Dimension {
        match self {
            Self::Store => Self::Category,
            Self::Category | Self::Payment => Self::Store,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Category => write!(f, "category"),
            Self::Payment => write!(f, "payment"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" | "stores" => Ok(Self::Store),
            "category" | "categories" => Ok(Self::Category),
            "payment" | "payments" => Ok(Self::Payment),
            other => Err(format!(
                "unknown dimension '{other}' (expected store, category or payment)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting keys
// ---------------------------------------------------------------------------

/// Direction of a sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Record field the ledger can be reordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Price,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Price => write!(f, "price"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "price" => Ok(Self::Price),
            other => Err(format!("unknown sort key '{other}' (expected date or price)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Dimension index
// ---------------------------------------------------------------------------

/// Distinct labels observed per dimension, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DimensionIndex {
    stores: LabelSet,
    categories: LabelSet,
    payments: LabelSet,
}

#[derive(Debug, Clone, Default)]
struct LabelSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl LabelSet {
    fn insert(&mut self, label: &str) {
        if !self.seen.contains(label) {
            self.seen.insert(label.to_string());
            self.ordered.push(label.to_string());
        }
    }
}

impl DimensionIndex {
    /// Build the index from a record sequence.
    pub fn build(records: &[PurchaseRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            index.stores.insert(&record.store);
            index.categories.insert(&record.category);
            index.payments.insert(&record.payment);
        }
        index
    }

    fn set(&self, dimension: Dimension) -> &LabelSet {
        match dimension {
            Dimension::Store => &self.stores,
            Dimension::Category => &self.categories,
            Dimension::Payment => &self.payments,
        }
    }

    /// Labels in the order they were first seen.
    pub fn labels(&self, dimension: Dimension) -> &[String] {
        &self.set(dimension).ordered
    }

    /// Labels sorted alphabetically.
    pub fn sorted_labels(&self, dimension: Dimension) -> Vec<&str> {
        let mut labels: Vec<&str> = self.labels(dimension).iter().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    pub fn contains(&self, dimension: Dimension, label: &str) -> bool {
        self.set(dimension).seen.contains(label)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Ordered purchase records plus their dimension index.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<PurchaseRecord>,
    index: DimensionIndex,
}

impl Ledger {
    pub fn new(records: Vec<PurchaseRecord>) -> Self {
        let index = DimensionIndex::build(&records);
        Self { records, index }
    }

    /// Records in the ledger's current order.
    pub fn records(&self) -> &[PurchaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index(&self) -> &DimensionIndex {
        &self.index
    }

    /// Check that `value` is a known label of `dimension`.
    pub fn require_label(&self, dimension: Dimension, value: &str) -> Result<(), LedgerError> {
        if self.index.contains(dimension, value) {
            Ok(())
        } else {
            Err(LedgerError::UnknownDimensionValue {
                dimension,
                value: value.to_string(),
            })
        }
    }

    /// Reorder the ledger in place. The sort is stable in both directions.
    pub fn sort_by(&mut self, key: SortKey, order: SortOrder) {
        match key {
            SortKey::Date => self.sort_by_date(order),
            SortKey::Price => self.sort_by_price(order),
        }
        tracing::debug!(%key, ?order, records = self.records.len(), "ledger reordered");
    }

    /// Stable sort on (date, time).
    pub fn sort_by_date(&mut self, order: SortOrder) {
        match order {
            SortOrder::Ascending => self
                .records
                .sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time))),
            SortOrder::Descending => self
                .records
                .sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time))),
        }
    }

    /// Stable sort on price.
    pub fn sort_by_price(&mut self, order: SortOrder) {
        match order {
            SortOrder::Ascending => self.records.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOrder::Descending => self.records.sort_by(|a, b| b.price.total_cmp(&a.price)),
        }
    }

    /// Records whose store name matches `pattern`, case-insensitively, in
    /// ledger order.
    ///
    /// The pattern is a regular expression searched anywhere in the store
    /// name, so a plain word behaves as a substring match.
    pub fn filter_by_store_pattern(
        &self,
        pattern: &str,
    ) -> Result<Vec<&PurchaseRecord>, LedgerError> {
        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(self
            .records
            .iter()
            .filter(|record| re.is_match(&record.store))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(
        date: &str,
        time: &str,
        store: &str,
        category: &str,
        price: f64,
        payment: &str,
    ) -> PurchaseRecord {
        PurchaseRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            store: store.to_string(),
            category: category.to_string(),
            price,
            payment: payment.to_string(),
        }
    }

    pub(crate) fn sample_ledger() -> Ledger {
        Ledger::new(vec![
            record("2020-01-03", "12:00", "SuperShop", "Food", 5.0, "Cash"),
            record("2020-01-01", "10:00", "MegaMart", "Food", 10.0, "Cash"),
            record("2020-01-02", "11:00", "MegaMart", "Toys", 20.0, "Visa"),
            record("2020-01-01", "09:30", "megamart outlet", "Books", 10.0, "Amex"),
        ])
    }

    #[test]
    fn index_holds_every_label_in_first_seen_order() {
        let ledger = sample_ledger();
        assert_eq!(
            ledger.index().labels(Dimension::Store),
            ["SuperShop", "MegaMart", "megamart outlet"]
        );
        assert_eq!(ledger.index().labels(Dimension::Payment), ["Cash", "Visa", "Amex"]);
        for record in ledger.records() {
            for dimension in Dimension::ALL {
                assert!(ledger.index().contains(dimension, record.label(dimension)));
            }
        }
    }

    #[test]
    fn sorted_labels_are_alphabetical() {
        let ledger = sample_ledger();
        assert_eq!(
            ledger.index().sorted_labels(Dimension::Category),
            vec!["Books", "Food", "Toys"]
        );
    }

    #[test]
    fn require_label_rejects_unknown_values() {
        let ledger = sample_ledger();
        assert!(ledger.require_label(Dimension::Store, "MegaMart").is_ok());
        let err = ledger.require_label(Dimension::Store, "Nowhere").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::UnknownDimensionValue { dimension: Dimension::Store, .. }
        ));
        assert_eq!(err.to_string(), "no such store in data: Nowhere");
    }

    #[test]
    fn sort_by_date_uses_time_within_a_day() {
        let mut ledger = sample_ledger();
        ledger.sort_by_date(SortOrder::Ascending);
        let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, ["megamart outlet", "MegaMart", "MegaMart", "SuperShop"]);
    }

    #[test]
    fn sort_by_price_is_stable_in_both_directions() {
        let mut ledger = sample_ledger();
        ledger.sort_by_price(SortOrder::Ascending);
        let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
        // The two 10.0 purchases keep their load order.
        assert_eq!(stores, ["SuperShop", "MegaMart", "megamart outlet", "MegaMart"]);

        let mut ledger = sample_ledger();
        ledger.sort_by_price(SortOrder::Descending);
        let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, ["MegaMart", "MegaMart", "megamart outlet", "SuperShop"]);
    }

    #[test]
    fn sort_by_date_keeps_equal_timestamps_in_order() {
        let mut ledger = Ledger::new(vec![
            record("2020-01-01", "09:00", "First", "Food", 1.0, "Cash"),
            record("2020-01-02", "09:00", "Later", "Food", 2.0, "Cash"),
            record("2020-01-01", "09:00", "Second", "Toys", 3.0, "Visa"),
            record("2020-01-01", "09:00", "Third", "Books", 4.0, "Amex"),
        ]);

        ledger.sort_by_date(SortOrder::Descending);
        let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, ["Later", "First", "Second", "Third"]);

        ledger.sort_by_date(SortOrder::Ascending);
        let stores: Vec<&str> = ledger.records().iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, ["First", "Second", "Third", "Later"]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut once = sample_ledger();
        once.sort_by(SortKey::Date, SortOrder::Ascending);
        once.sort_by(SortKey::Price, SortOrder::Ascending);

        let mut twice = once.clone();
        twice.sort_by(SortKey::Date, SortOrder::Ascending);
        twice.sort_by(SortKey::Price, SortOrder::Ascending);

        assert_eq!(once.records(), twice.records());
    }

    #[test]
    fn filter_is_case_insensitive_and_preserves_order() {
        let ledger = sample_ledger();
        let hits = ledger.filter_by_store_pattern("mega").unwrap();
        let stores: Vec<&str> = hits.iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, ["MegaMart", "MegaMart", "megamart outlet"]);
    }

    #[test]
    fn filter_supports_regular_expressions() {
        let ledger = sample_ledger();
        let hits = ledger.filter_by_store_pattern("^mega\\w+$").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(ledger.filter_by_store_pattern("zzz").unwrap().is_empty());
    }

    #[test]
    fn filter_rejects_invalid_pattern() {
        let ledger = sample_ledger();
        let err = ledger.filter_by_store_pattern("(unclosed").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPattern(_)));
    }

    #[test]
    fn dimension_parses_singular_and_plural() {
        assert_eq!("Stores".parse::<Dimension>(), Ok(Dimension::Store));
        assert_eq!("category".parse::<Dimension>(), Ok(Dimension::Category));
        assert_eq!("payments".parse::<Dimension>(), Ok(Dimension::Payment));
        assert!("vendor".parse::<Dimension>().is_err());
    }

    #[test]
    fn record_serializes_time_to_minutes() {
        let r = record("2020-01-01", "09:05", "A", "Food", 1.5, "Cash");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"date\":\"2020-01-01\""));
        assert!(json.contains("\"time\":\"09:05\""));
    }
}
