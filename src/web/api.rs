//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns an
//! [`ApiResponse`] with a JSON body. Bad parameters answer 400, an unknown
//! store/category/payment answers 404.

use std::time::Instant;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::history::QueryLog;
use crate::ledger::{Dimension, Ledger, PurchaseRecord, SortKey, SortOrder};
use crate::report::{self, Granularity};

/// Records returned by `/api/records` when no limit is given.
const DEFAULT_RECORD_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Overview API response: ledger size and the three indexes.
#[derive(Serialize)]
struct OverviewResponse {
    count: usize,
    total: f64,
    stores: Vec<String>,
    categories: Vec<String>,
    payments: Vec<String>,
}

#[derive(Serialize)]
struct RecordsResponse<'a> {
    total: usize,
    records: &'a [PurchaseRecord],
}

#[derive(Serialize)]
struct SortResponse {
    by: SortKey,
    order: SortOrder,
    count: usize,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordsParams {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DimensionParams {
    dimension: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrendParams {
    by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryParams {
    dimension: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterParams {
    pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SortParams {
    by: Option<String>,
    order: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Status and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Build a JSON success response.
fn json_response<T: Serialize + ?Sized>(data: &T) -> Result<ApiResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(ApiResponse { status: 200, body })
}

/// Build a JSON error response with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> Result<ApiResponse> {
    let body = serde_json::to_string(&ErrorResponse { error: message })
        .context("failed to serialize JSON error")?;
    Ok(ApiResponse { status, body })
}

/// Decode the query string of a URL into `T`.
fn parse_query<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    serde_urlencoded::from_str(query).map_err(|e| format!("invalid query string: {e}"))
}

/// The `dimension` parameter, defaulting to stores.
fn parse_dimension(raw: Option<&str>) -> Result<Dimension, String> {
    match raw {
        None | Some("") => Ok(Dimension::Store),
        Some(raw) => raw.parse(),
    }
}

/// Unwrap a parse result or answer 400.
macro_rules! or_bad_request {
    ($parsed:expr) => {
        match $parsed {
            Ok(value) => value,
            Err(message) => return error_response(400, &message),
        }
    };
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/overview`: purchase count, grand total and the indexes.
pub fn get_overview(ledger: &Ledger) -> Result<ApiResponse> {
    let labels = |dimension| report::labels(ledger, dimension).labels;
    let resp = OverviewResponse {
        count: report::count(ledger),
        total: ledger.records().iter().map(|r| r.price).sum(),
        stores: labels(Dimension::Store),
        categories: labels(Dimension::Category),
        payments: labels(Dimension::Payment),
    };
    json_response(&resp)
}

/// `GET /api/records?limit=N`: records in current ledger order.
pub fn get_records(ledger: &Ledger, url: &str) -> Result<ApiResponse> {
    let params: RecordsParams = or_bad_request!(parse_query(url));
    let limit = params.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    let records = ledger.records();

    json_response(&RecordsResponse {
        total: records.len(),
        records: &records[..limit.min(records.len())],
    })
}

/// `GET /api/totals?dimension=D`: sum of sales per label.
pub fn get_totals(ledger: &Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: DimensionParams = or_bad_request!(parse_query(url));
    let dimension = or_bad_request!(parse_dimension(params.dimension.as_deref()));

    let ranking = report::totals(ledger, dimension);
    history.record("totals", Some(dimension), None, ranking.rows.len(), started);
    json_response(&ranking)
}

/// `GET /api/spread?dimension=D`: standard deviation of sales per label.
pub fn get_spread(ledger: &Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: DimensionParams = or_bad_request!(parse_query(url));
    let dimension = or_bad_request!(parse_dimension(params.dimension.as_deref()));

    let ranking = report::spread(ledger, dimension);
    history.record("spread", Some(dimension), None, ranking.rows.len(), started);
    json_response(&ranking)
}

/// `GET /api/distribution?dimension=D`: pie chart data.
pub fn get_distribution(
    ledger: &Ledger,
    url: &str,
    history: &QueryLog,
) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: DimensionParams = or_bad_request!(parse_query(url));
    let dimension = or_bad_request!(parse_dimension(params.dimension.as_deref()));

    let distribution = report::distribution(ledger, dimension);
    history.record("pie", Some(dimension), None, distribution.slices.len(), started);
    json_response(&distribution)
}

/// `GET /api/trend?by=day|month|year`: line chart data.
pub fn get_trend(ledger: &Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: TrendParams = or_bad_request!(parse_query(url));
    let granularity: Granularity = match params.by.as_deref() {
        None | Some("") => Granularity::default(),
        Some(raw) => or_bad_request!(raw.parse()),
    };

    let trend = report::trend(ledger, granularity);
    let by = granularity.to_string();
    history.record("trend", None, Some(&by), trend.points.len(), started);
    json_response(&trend)
}

/// `GET /api/summary?dimension=D&value=V`: the form submission.
pub fn get_summary(ledger: &Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: SummaryParams = or_bad_request!(parse_query(url));
    let dimension = or_bad_request!(parse_dimension(params.dimension.as_deref()));
    let Some(value) = params.value.filter(|v| !v.is_empty()) else {
        return error_response(400, "missing parameter: value");
    };

    match report::selection_summary(ledger, dimension, &value) {
        Ok(summary) => {
            history.record(
                "summary",
                Some(dimension),
                Some(&value),
                summary.breakdown.len(),
                started,
            );
            json_response(&summary)
        }
        Err(e @ LedgerError::UnknownDimensionValue { .. }) => {
            tracing::warn!(%dimension, value, "{e}");
            error_response(404, &e.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/filter?pattern=P`: records whose store matches.
pub fn get_filter(ledger: &Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: FilterParams = or_bad_request!(parse_query(url));
    let pattern = params.pattern.unwrap_or_default();

    match report::filter(ledger, &pattern) {
        Ok(filtered) => {
            history.record(
                "filter",
                Some(Dimension::Store),
                Some(&pattern),
                filtered.records.len(),
                started,
            );
            json_response(&filtered)
        }
        Err(e @ (LedgerError::EmptyPattern | LedgerError::InvalidPattern(_))) => {
            tracing::warn!(pattern, "{e}");
            error_response(400, &e.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /api/sort?by=date|price&order=asc|desc`: reorder the ledger.
pub fn post_sort(ledger: &mut Ledger, url: &str, history: &QueryLog) -> Result<ApiResponse> {
    let started = Instant::now();
    let params: SortParams = or_bad_request!(parse_query(url));
    let Some(by) = params.by.filter(|b| !b.is_empty()) else {
        return error_response(400, "missing parameter: by");
    };
    let key: SortKey = or_bad_request!(by.parse());
    let order: SortOrder = match params.order.as_deref() {
        None | Some("") => SortOrder::Ascending,
        Some(raw) => or_bad_request!(raw.parse()),
    };

    let count = report::sorted_records(ledger, key, order).len();
    history.record("sort", None, Some(&by), count, started);
    json_response(&SortResponse { by: key, order, count })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
