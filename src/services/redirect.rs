// src/services/redirect.rs

//! Redirect resolution for county landing pages.
//!
//! A county landing page does not link to its results directly. It
//! forwards the browser to a versioned subdirectory, either through a
//! `<meta http-equiv="refresh">` tag or through a script include. Each
//! strategy recovers the version segment from one of those shapes.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::utils::url::is_version_segment;

/// Ways a landing page encodes its version segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStrategy {
    /// `<meta content="0;url=./184685/en/summary.html">`
    MetaRefresh,
    /// `<script src="./184685/js/version.js">`
    ScriptSource,
}

impl RedirectStrategy {
    /// Strategies in the order they are tried.
    pub const ALL: [RedirectStrategy; 2] =
        [RedirectStrategy::MetaRefresh, RedirectStrategy::ScriptSource];

    /// Version segment this strategy finds in the document, if any.
    pub fn extract(&self, document: &Html) -> Option<String> {
        match self {
            RedirectStrategy::MetaRefresh => {
                let selector = Selector::parse("meta[content]").ok()?;
                let content = document.select(&selector).next()?.value().attr("content")?;
                let target = content.split('=').nth(1)?;
                version_of(target)
            }
            RedirectStrategy::ScriptSource => {
                let selector = Selector::parse("script").ok()?;
                let script = document.select(&selector).next()?.value();

                // Attribute order is not preserved by the parser, so `src`
                // goes first explicitly.
                let others = script
                    .attrs()
                    .filter(|(name, _)| *name != "src")
                    .map(|(_, value)| value);
                script.attr("src").into_iter().chain(others).find_map(version_of)
            }
        }
    }
}

/// Version segment of a relative path such as `./184685/en/summary.html`.
fn version_of(path: &str) -> Option<String> {
    let segment = path.split('/').nth(1)?.trim();
    is_version_segment(segment).then(|| segment.to_string())
}

/// Find the version segment of a landing page, trying each strategy in turn.
pub fn resolve_segment(page_url: &str, html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    RedirectStrategy::ALL
        .iter()
        .find_map(|strategy| {
            let segment = strategy.extract(&document)?;
            log::debug!("{:?} redirect on {}: {}", strategy, page_url, segment);
            Some(segment)
        })
        .ok_or_else(|| AppError::extraction(page_url, "no recognizable redirect"))
}
