// src/engine/inspect.rs
// =============================================================================
// Audits a single route: one GET request, timed, then a look at the HTML.
//
// Key functionality:
// - Records status code, response time, content type and size
// - Pulls <title>, meta description, <h1> count, link counts and images
//   without alt text out of the page
// - Sorts request failures into timeout / dns / ssl / connect / other
//
// A route that fails to load still produces a report; the failure is part
// of the audit result, not an error of the run.
// =============================================================================

use std::time::Instant;

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::{Route, RouteReport};

// How the request for a route ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// 2xx
    Ok,
    /// 3xx that the client did not follow
    Redirect,
    /// 4xx / 5xx
    HttpError,
    Timeout,
    DnsError,
    SslError,
    ConnectError,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub images_missing_alt: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageAudit {
    pub status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Audits `route` and wraps the outcome into a RouteReport.
pub async fn inspect_route(client: &Client, route: Route) -> RouteReport {
    let audit = audit_page(client, &route.url).await;
    debug!(url = %route.url, status = ?audit.status, ms = audit.response_time_ms, "route audited");

    RouteReport {
        route,
        data: into_fields(&audit),
    }
}

async fn audit_page(client: &Client, url: &str) -> PageAudit {
    let started = Instant::now();

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let (status, message) = categorize_error(&e);
            return PageAudit {
                status,
                status_code: None,
                response_time_ms: elapsed_ms(started),
                content_type: None,
                content_length: None,
                page: None,
                error: Some(message),
            };
        }
    };

    let status_code = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let status = if status_code.is_success() {
        FetchStatus::Ok
    } else if status_code.is_redirection() {
        FetchStatus::Redirect
    } else {
        FetchStatus::HttpError
    };

    let (body, error) = match response.text().await {
        Ok(body) => (Some(body), None),
        Err(e) => (None, Some(format!("failed to read body: {}", e))),
    };
    let response_time_ms = elapsed_ms(started);

    let is_html = content_type.as_deref().map_or(true, |ct| ct.contains("html"));
    let page = match (&body, Url::parse(url)) {
        (Some(html), Ok(base)) if is_html => Some(summarize_html(html, &base)),
        _ => None,
    };

    PageAudit {
        status,
        status_code: Some(status_code.as_u16()),
        response_time_ms,
        content_type,
        content_length: body.as_ref().map(String::len),
        page,
        error,
    }
}

/// Reads the SEO-ish basics out of a page.
pub fn summarize_html(html: &str, base: &Url) -> PageSummary {
    let document = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("constant selector is valid");
    let meta_sel = Selector::parse(r#"meta[name="description"]"#).expect("constant selector is valid");
    let h1_sel = Selector::parse("h1").expect("constant selector is valid");
    let link_sel = Selector::parse("a[href]").expect("constant selector is valid");
    let img_sel = Selector::parse("img").expect("constant selector is valid");

    let title = document
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let meta_description = document
        .select(&meta_sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let mut internal_links = 0;
    let mut external_links = 0;
    for href in document.select(&link_sel).filter_map(|el| el.value().attr("href")) {
        let Ok(target) = base.join(href) else { continue };
        match target.scheme() {
            "http" | "https" if target.host_str() == base.host_str() => internal_links += 1,
            "http" | "https" => external_links += 1,
            _ => {}
        }
    }

    let images_missing_alt = document
        .select(&img_sel)
        .filter(|img| img.value().attr("alt").map_or(true, |alt| alt.trim().is_empty()))
        .count();

    PageSummary {
        title,
        meta_description,
        h1_count: document.select(&h1_sel).count(),
        internal_links,
        external_links,
        images_missing_alt,
    }
}

// Sorts reqwest errors into a status plus a short message
fn categorize_error(error: &reqwest::Error) -> (FetchStatus, String) {
    let error_string = error.to_string();
    let lowered = error_string.to_lowercase();

    if error.is_timeout() {
        (FetchStatus::Timeout, "Request timed out".to_string())
    } else if error.is_connect() && lowered.contains("dns") {
        (FetchStatus::DnsError, "Could not resolve hostname".to_string())
    } else if lowered.contains("certificate") || lowered.contains("ssl") || lowered.contains("tls") {
        (FetchStatus::SslError, "SSL certificate error".to_string())
    } else if error.is_connect() {
        (FetchStatus::ConnectError, "Connection failed".to_string())
    } else {
        (FetchStatus::Error, error_string)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn into_fields(audit: &PageAudit) -> Map<String, Value> {
    match serde_json::to_value(audit) {
        Ok(Value::Object(fields)) => fields,
        // A plain struct always serializes to an object.
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_html() {
        let html = r#"
            <html><head>
              <title> Example Home </title>
              <meta name="description" content="An example site">
            </head><body>
              <h1>Welcome</h1>
              <a href="/about">About</a>
              <a href="https://example.com/blog">Blog</a>
              <a href="https://rust-lang.org">Rust</a>
              <a href="mailto:hi@example.com">Mail</a>
              <img src="/a.png" alt="A">
              <img src="/b.png">
              <img src="/c.png" alt="  ">
            </body></html>
        "#;
        let base = Url::parse("https://example.com/").unwrap();
        let summary = summarize_html(html, &base);

        assert_eq!(summary.title.as_deref(), Some("Example Home"));
        assert_eq!(summary.meta_description.as_deref(), Some("An example site"));
        assert_eq!(summary.h1_count, 1);
        assert_eq!(summary.internal_links, 2);
        assert_eq!(summary.external_links, 1);
        assert_eq!(summary.images_missing_alt, 2);
    }

    #[test]
    fn test_summarize_empty_page() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(summarize_html("", &base), PageSummary::default());
    }

    #[test]
    fn test_audit_fields_flatten_into_report() {
        let audit = PageAudit {
            status: FetchStatus::Timeout,
            status_code: None,
            response_time_ms: 10_000,
            content_type: None,
            content_length: None,
            page: None,
            error: Some("Request timed out".to_string()),
        };
        let fields = into_fields(&audit);

        assert_eq!(fields["status"], "timeout");
        assert_eq!(fields["response_time_ms"], 10_000);
        assert!(!fields.contains_key("status_code"));
    }
}
