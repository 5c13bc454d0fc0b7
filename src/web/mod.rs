//! Embedded web dashboard for ledgerstat.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard with the point-and-click summary form, pie
//!   charts and the sales trend
//! - JSON API endpoints for every report, plus ledger sorting
//!
//! Launched via `ledgerstat web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

pub use api::ApiResponse;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::history::QueryLog;
use crate::ledger::Ledger;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Requests are handled one at a time against the
/// borrowed ledger, so a sort is visible to every later request. Errors are
/// answered per request without stopping the server.
pub fn serve(ledger: &mut Ledger, addr: &str, open: bool, history: &QueryLog) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("ledgerstat dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");
    tracing::info!(addr, records = ledger.len(), "dashboard started");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            tracing::debug!("{e:#}");
        }
    }

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = match dispatch(ledger, history, &method, &url) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(%method, url, "{e:#}");
                api::error_response(500, &e.to_string())?
            }
        };

        let status = response.status;
        let content_type = if response.status == 200 && is_page(&url) {
            content_type_html()?
        } else {
            content_type_json()?
        };
        let http = Response::from_data(response.body.into_bytes())
            .with_header(content_type)
            .with_status_code(StatusCode(status));

        if let Err(e) = request.respond(http) {
            tracing::warn!(url, "failed to send response: {e}");
        }

        tracing::info!(%method, url, status, "request");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(
    ledger: &mut Ledger,
    history: &QueryLog,
    method: &Method,
    url: &str,
) -> Result<ApiResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(ApiResponse {
            status: 200,
            body: frontend::INDEX_HTML.to_string(),
        }),

        // API: ledger
        (&Method::Get, "/api/overview") => api::get_overview(ledger),
        (&Method::Get, "/api/records") => api::get_records(ledger, url),
        (&Method::Post, "/api/sort") => api::post_sort(ledger, url, history),

        // API: reports
        (&Method::Get, "/api/totals") => api::get_totals(ledger, url, history),
        (&Method::Get, "/api/spread") => api::get_spread(ledger, url, history),
        (&Method::Get, "/api/distribution") => api::get_distribution(ledger, url, history),
        (&Method::Get, "/api/trend") => api::get_trend(ledger, url, history),
        (&Method::Get, "/api/summary") => api::get_summary(ledger, url, history),
        (&Method::Get, "/api/filter") => api::get_filter(ledger, url, history),

        // 404
        _ => api::error_response(404, "not found"),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn is_page(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url);
    path == "/" || path == "/index.html"
}

/// JSON content type header.
fn content_type_json() -> Result<Header> {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("invalid JSON content type header"))
}

/// HTML content type header.
fn content_type_html() -> Result<Header> {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("invalid HTML content type header"))
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::sample_ledger;

    fn get(ledger: &mut Ledger, url: &str) -> ApiResponse {
        dispatch(ledger, &QueryLog::disabled(), &Method::Get, url).unwrap()
    }

    #[test]
    fn serves_the_page() {
        let resp = get(&mut sample_ledger(), "/");
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("<!DOCTYPE html>"));
        assert!(is_page("/?x=1"));
        assert!(!is_page("/api/overview"));
    }

    #[test]
    fn unknown_path_is_404() {
        assert_eq!(get(&mut sample_ledger(), "/api/nope").status, 404);
    }

    #[test]
    fn sort_requires_post() {
        assert_eq!(get(&mut sample_ledger(), "/api/sort?by=date").status, 404);
    }

    #[test]
    fn sort_is_visible_to_later_requests() {
        let mut ledger = sample_ledger();
        let history = QueryLog::disabled();
        let resp = dispatch(&mut ledger, &history, &Method::Post, "/api/sort?by=date&order=asc")
            .unwrap();
        assert_eq!(resp.status, 200);

        let records = get(&mut ledger, "/api/records?limit=1");
        let json: serde_json::Value = serde_json::from_str(&records.body).unwrap();
        assert_eq!(json["records"][0]["store"], "megamart outlet");
        assert_eq!(json["records"][0]["time"], "09:30");
    }

    #[test]
    fn report_endpoints_answer_json() {
        let mut ledger = sample_ledger();
        for url in [
            "/api/overview",
            "/api/totals?dimension=category",
            "/api/spread?dimension=store",
            "/api/distribution?dimension=payment",
            "/api/trend?by=day",
            "/api/summary?dimension=payment&value=Cash",
            "/api/filter?pattern=shop",
        ] {
            let resp = get(&mut ledger, url);
            assert_eq!(resp.status, 200, "{url}");
            assert!(serde_json::from_str::<serde_json::Value>(&resp.body).is_ok());
        }
    }
}
