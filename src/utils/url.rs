// src/utils/url.rs

//! Clarity URL conventions.
//!
//! Clarity sites publish no API; every rule in this module is positional and
//! was inferred from live sites. Keep all knowledge of segment indices here so
//! a change in the vendor's path scheme is a change to this file only.
//!
//! ```text
//! /AR/63912/184685/Web01/en/summary.html          state results page
//! /AR/Benton/63917/183978/Web01/en/summary.html   county results page
//!     └─ election path ──────────┘ └lang┘ └page┘
//! ```

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Level, LevelName, ReportFormat};

/// Page listing the counties of a state, relative to its summary page.
pub const LISTING_PAGE: &str = "select-county.html";

/// Results summary page name.
pub const SUMMARY_PAGE: &str = "summary.html";

const LANGUAGE: &str = "en";
const REPORTS_DIR: &str = "reports";

static STATE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("static regex"));
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("static regex"));

/// A parsed results-page URL with its non-empty path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarityPath {
    url: Url,
    segments: Vec<String>,
}

impl ClarityPath {
    /// Parse a results-page URL, requiring at least two path segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| AppError::malformed_url(raw, e))?;
        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(AppError::malformed_url(
                raw,
                format!(
                    "expected at least 2 path segments, found {}",
                    segments.len()
                ),
            ));
        }

        Ok(Self { url, segments })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// First path segment; a two-letter code on state and county pages.
    pub fn state_code(&self) -> &str {
        &self.segments[0]
    }

    /// Administrative levels named by the path, outermost first.
    ///
    /// Numeric second segments are internal election ids, not county names.
    /// Precincts are never named in a URL.
    pub fn levels(&self) -> Vec<LevelName> {
        let mut levels = Vec::new();

        if STATE_CODE.is_match(&self.segments[0]) {
            levels.push(LevelName::new(Level::State, &self.segments[0]));
        }
        if !NUMERIC.is_match(&self.segments[1]) {
            levels.push(LevelName::new(Level::County, &self.segments[1]));
        }

        levels
    }

    /// `{scheme}://{host}/{STATE}`, the root all county URLs hang from.
    pub fn state_base(&self) -> String {
        format!(
            "{}/{}",
            self.url.origin().ascii_serialization(),
            self.state_code()
        )
    }

    /// Segments between the state code and the trailing `en/summary.html`.
    fn election_path(&self) -> &[String] {
        let end = self.segments.len().saturating_sub(2).max(1);
        &self.segments[1..end]
    }

    fn reports_url(&self, file: &str) -> String {
        let mut parts = vec![self.state_base()];
        parts.extend(self.election_path().iter().cloned());
        parts.push(REPORTS_DIR.to_string());
        parts.push(file.to_string());
        parts.join("/")
    }

    /// Detail report archive in the given format.
    pub fn report_url(&self, format: ReportFormat) -> String {
        self.reports_url(&format!("detail{}.zip", format.extension()))
    }

    /// Summary report archive.
    pub fn summary_url(&self) -> String {
        self.reports_url("summary.zip")
    }

    /// Sibling page of the summary page listing child jurisdictions.
    ///
    /// Query and fragment are carried over unchanged.
    pub fn listing_url(&self) -> String {
        let mut path: Vec<&str> = self.url.path().split('/').collect();
        path.pop();
        path.push(LISTING_PAGE);

        let mut url = self.url.clone();
        url.set_path(&path.join("/"));
        url.to_string()
    }

    /// County landing page for a path fragment scraped from the listing page.
    ///
    /// Only the first two segments of the fragment (county name and election
    /// id) are meaningful; the landing page redirects to the versioned
    /// summary. Returns `None` when the fragment has no usable segment.
    pub fn county_page_url(&self, fragment: &str) -> Option<String> {
        let parts: Vec<&str> = fragment
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .take(2)
            .collect();

        if parts.is_empty() {
            return None;
        }

        Some(format!("{}/{}", self.state_base(), parts.join("/")))
    }
}

/// Summary page of a county once the redirect version segment is known.
pub fn county_summary_url(page_url: &str, segment: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        page_url.trim_end_matches('/'),
        segment,
        LANGUAGE,
        SUMMARY_PAGE
    )
}

/// Whether a redirect segment looks like a Clarity version id.
pub fn is_version_segment(segment: &str) -> bool {
    NUMERIC.is_match(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_URL: &str =
        "http://results.enr.clarityelections.com/AR/63912/184685/Web01/en/summary.html";
    const COUNTY_URL: &str =
        "http://results.enr.clarityelections.com/AR/Benton/63917/183978/Web01/en/summary.html";

    #[test]
    fn test_rejects_short_paths() {
        assert!(matches!(
            ClarityPath::parse("http://host/AR"),
            Err(AppError::MalformedUrl { .. })
        ));
        assert!(matches!(
            ClarityPath::parse("http://host/AR//"),
            Err(AppError::MalformedUrl { .. })
        ));
        assert!(matches!(
            ClarityPath::parse("not a url"),
            Err(AppError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_state_report_url() {
        let path = ClarityPath::parse(STATE_URL).unwrap();
        assert_eq!(
            path.report_url(ReportFormat::Xml),
            "http://results.enr.clarityelections.com/AR/63912/184685/Web01/reports/detailxml.zip"
        );
        assert_eq!(
            path.summary_url(),
            "http://results.enr.clarityelections.com/AR/63912/184685/Web01/reports/summary.zip"
        );
    }

    #[test]
    fn test_county_report_url() {
        let path = ClarityPath::parse(COUNTY_URL).unwrap();
        assert_eq!(
            path.report_url(ReportFormat::Txt),
            "http://results.enr.clarityelections.com/AR/Benton/63917/183978/Web01/reports/detailtxt.zip"
        );
    }

    #[test]
    fn test_listing_url_keeps_query() {
        let path = ClarityPath::parse(
            "http://results.enr.clarityelections.com/KY/50972/131636/en/summary.html?cid=0",
        )
        .unwrap();
        assert_eq!(
            path.listing_url(),
            "http://results.enr.clarityelections.com/KY/50972/131636/en/select-county.html?cid=0"
        );
    }

    #[test]
    fn test_county_page_url() {
        let path = ClarityPath::parse(STATE_URL).unwrap();
        assert_eq!(
            path.county_page_url("/Arkansas/63914/184690/en/summary.html"),
            Some("http://results.enr.clarityelections.com/AR/Arkansas/63914".to_string())
        );
        assert_eq!(path.county_page_url("//"), None);
    }

    #[test]
    fn test_county_summary_url() {
        assert_eq!(
            county_summary_url("http://host/AR/Arkansas/63914/", "184690"),
            "http://host/AR/Arkansas/63914/184690/en/summary.html"
        );
    }

    #[test]
    fn test_keeps_port_in_state_base() {
        let path = ClarityPath::parse("http://127.0.0.1:8080/GA/42277/113204/en/summary.html")
            .unwrap();
        assert_eq!(path.state_base(), "http://127.0.0.1:8080/GA");
    }
}
