// src/storage/report.rs
// =============================================================================
// Writes route reports to disk as pretty-printed JSON.
//
// Layout (default, ReportLayout::SiteWide):
//
//   <output_path>/<hostname>/result.json
//
// The folder is keyed by the hostname of the scanned site, not of the
// route, and the file name never changes. Every route of a run therefore
// writes the same file and the last write wins. Use ReportLayout::PerRoute
// to keep one file per route:
//
//   <output_path>/<hostname>/<route-slug>-<route-id>/result.json
//
// The route id is the first 8 hex digits of the SHA-256 of the full route
// URL, so "/about", "/about/" and "/About?x=1" get separate folders even
// though their readable slugs match.
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use super::dirs::ensure_dir;
use crate::engine::{Route, RouteReport};

pub const REPORT_FILE_NAME: &str = "result.json";

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportLayout {
    /// One result.json per site; routes overwrite each other.
    #[default]
    SiteWide,
    /// One result.json per route, under a folder named after the route.
    PerRoute,
}

/// Where a route's report ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub url: String,
    pub file: PathBuf,
}

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("failed to write report {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report for {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes `report` below `output_path` and returns where it went.
///
/// `site_host` is the hostname of the scan URL.
pub async fn write_report(
    report: &RouteReport,
    output_path: &Path,
    site_host: &str,
    layout: ReportLayout,
) -> Result<ReportEntry, ReportWriteError> {
    let mut dir = output_path.join(site_host);
    if layout == ReportLayout::PerRoute {
        dir.push(route_folder(&report.route));
    }

    ensure_dir(&dir).await.map_err(|source| ReportWriteError::Io {
        path: dir.clone(),
        source,
    })?;

    let file = dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(report).map_err(|source| {
        ReportWriteError::Serialize {
            path: file.clone(),
            source,
        }
    })?;

    // Write-then-rename so concurrent writers of the same file never
    // interleave; whichever rename lands last wins.
    let staging = dir.join(format!(
        ".{}.{}.{}.tmp",
        REPORT_FILE_NAME,
        std::process::id(),
        STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let written = match tokio::fs::write(&staging, json).await {
        Ok(()) => tokio::fs::rename(&staging, &file).await,
        Err(e) => Err(e),
    };
    if let Err(source) = written {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(ReportWriteError::Io { path: file, source });
    }

    debug!(url = %report.route.url, file = %file.display(), "report written");

    Ok(ReportEntry {
        url: report.route.url.clone(),
        file,
    })
}

/// Per-route folder name: readable slug plus a short id of the full URL.
fn route_folder(route: &Route) -> String {
    format!("{}-{}", route_slug(&route.path), route_id(&route.url))
}

fn route_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest[..4].iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Readable part of a route folder: "/" is "index", everything else keeps
/// its alphanumerics with the rest collapsed into single dashes.
fn route_slug(path: &str) -> String {
    let mut slug = String::with_capacity(path.len());
    let mut pending_dash = false;

    for c in path.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};
    use tempfile::TempDir;

    fn report(url: &str, path: &str, marker: u64) -> RouteReport {
        let mut data = Map::new();
        data.insert("marker".to_string(), Value::from(marker));
        RouteReport {
            route: Route {
                url: url.to_string(),
                path: path.to_string(),
            },
            data,
        }
    }

    #[tokio::test]
    async fn test_writes_pretty_json_under_hostname() {
        let out = TempDir::new().unwrap();
        let r = report("https://example.com/", "/", 1);

        let entry = write_report(&r, out.path(), "example.com", ReportLayout::SiteWide)
            .await
            .unwrap();

        assert_eq!(entry.url, "https://example.com/");
        assert_eq!(entry.file, out.path().join("example.com").join("result.json"));

        let content = std::fs::read_to_string(&entry.file).unwrap();
        assert!(content.contains("\n  \"route\""));
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["route"]["url"], "https://example.com/");
        assert_eq!(parsed["marker"], 1);
    }

    #[tokio::test]
    async fn test_site_wide_layout_last_write_wins() {
        let out = TempDir::new().unwrap();
        let routes = [
            report("https://example.com/", "/", 1),
            report("https://example.com/about", "/about", 2),
            report("https://example.com/blog", "/blog", 3),
        ];

        for r in &routes {
            write_report(r, out.path(), "example.com", ReportLayout::SiteWide)
                .await
                .unwrap();
        }

        let site_dir = out.path().join("example.com");
        assert_eq!(std::fs::read_dir(&site_dir).unwrap().count(), 1);

        let parsed: Value =
            serde_json::from_str(&std::fs::read_to_string(site_dir.join("result.json")).unwrap())
                .unwrap();
        assert_eq!(parsed["marker"], 3);
    }

    #[tokio::test]
    async fn test_per_route_layout_keeps_every_report() {
        let out = TempDir::new().unwrap();
        let home = report("https://example.com/", "/", 1);
        let about = report("https://example.com/about/team", "/about/team", 2);

        let a = write_report(&home, out.path(), "example.com", ReportLayout::PerRoute)
            .await
            .unwrap();
        let b = write_report(&about, out.path(), "example.com", ReportLayout::PerRoute)
            .await
            .unwrap();

        let home_dir = a.file.parent().unwrap().file_name().unwrap().to_str().unwrap();
        let about_dir = b.file.parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert!(home_dir.starts_with("index-"), "{home_dir}");
        assert!(about_dir.starts_with("about-team-"), "{about_dir}");
        assert_eq!(a.file.file_name().unwrap(), "result.json");
        assert!(a.file.exists() && b.file.exists());
    }

    #[tokio::test]
    async fn test_per_route_layout_separates_lookalike_routes() {
        let out = TempDir::new().unwrap();
        let routes = [
            ("https://example.com/about", "/about"),
            ("https://example.com/about/", "/about/"),
            ("https://example.com/About", "/About"),
            ("https://example.com/a-b", "/a-b"),
            ("https://example.com/a/b", "/a/b"),
            ("https://example.com/p?id=1", "/p"),
            ("https://example.com/p?id=2", "/p"),
        ];

        let mut files = std::collections::HashSet::new();
        for (marker, (url, path)) in routes.iter().enumerate() {
            let entry = write_report(
                &report(url, path, marker as u64),
                out.path(),
                "example.com",
                ReportLayout::PerRoute,
            )
            .await
            .unwrap();

            let parsed: Value =
                serde_json::from_str(&std::fs::read_to_string(&entry.file).unwrap()).unwrap();
            assert_eq!(parsed["route"]["url"], *url);
            files.insert(entry.file);
        }

        assert_eq!(files.len(), routes.len());
        let site_dir = out.path().join("example.com");
        assert_eq!(std::fs::read_dir(&site_dir).unwrap().count(), routes.len());
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_staging_file() {
        let out = TempDir::new().unwrap();
        // A non-empty directory named result.json cannot be renamed over.
        let blocked = out.path().join("example.com").join("result.json");
        std::fs::create_dir_all(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"x").unwrap();

        let err = write_report(
            &report("https://example.com/", "/", 1),
            out.path(),
            "example.com",
            ReportLayout::SiteWide,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReportWriteError::Io { .. }));

        let names: Vec<String> = std::fs::read_dir(out.path().join("example.com"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["result.json".to_string()]);
    }

    #[tokio::test]
    async fn test_io_failure_is_reported() {
        let out = TempDir::new().unwrap();
        // A file where the host folder should go makes the write fail.
        std::fs::write(out.path().join("example.com"), b"").unwrap();

        let err = write_report(
            &report("https://example.com/", "/", 1),
            out.path(),
            "example.com",
            ReportLayout::SiteWide,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportWriteError::Io { .. }));
    }

    #[test]
    fn test_route_slug() {
        assert_eq!(route_slug("/"), "index");
        assert_eq!(route_slug(""), "index");
        assert_eq!(route_slug("/about"), "about");
        assert_eq!(route_slug("/Docs/Getting Started/"), "docs-getting-started");
        assert_eq!(route_slug("/a//b.html"), "a-b-html");
    }

    #[test]
    fn test_route_folder_is_stable_and_url_keyed() {
        let route = |url: &str, path: &str| Route {
            url: url.to_string(),
            path: path.to_string(),
        };

        let about = route_folder(&route("https://example.com/about", "/about"));
        assert_eq!(about, route_folder(&route("https://example.com/about", "/about")));
        assert!(about.starts_with("about-"));
        assert_eq!(about.len(), "about-".len() + 8);
        assert!(about["about-".len()..].chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(about, route_folder(&route("https://example.com/about/", "/about/")));
        assert_ne!(
            route_folder(&route("https://example.com/p?id=1", "/p")),
            route_folder(&route("https://example.com/p?id=2", "/p"))
        );
    }
}
