// src/services/subjurisdictions.rs

//! Subjurisdiction discovery.
//!
//! Builds a [`JurisdictionTree`] by scraping the county listing of a state
//! page and resolving each county's landing-page redirect.

use std::sync::Arc;

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{Jurisdiction, JurisdictionId, JurisdictionTree, Level};
use crate::services::redirect::resolve_segment;
use crate::utils::Fetcher;
use crate::utils::url::county_summary_url;

/// An anchor scraped from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Path fragment, e.g. `./Benton/63917`
    pub path: String,
    /// Display name, e.g. `Benton`
    pub name: String,
}

/// Crawler for the jurisdictions below a results page.
pub struct SubjurisdictionCrawler {
    fetcher: Arc<dyn Fetcher>,
}

impl SubjurisdictionCrawler {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Crawl every descendant of `root`, depth first.
    pub async fn crawl(&self, root: Jurisdiction) -> Result<JurisdictionTree> {
        let mut tree = JurisdictionTree::new(root);
        let mut work = vec![tree.root()];

        while let Some(id) = work.pop() {
            let children = self.subjurisdictions(&tree[id]).await?;

            let ids: Vec<JurisdictionId> = children
                .into_iter()
                .map(|child| tree.add_child(id, child))
                .collect();
            work.extend(ids.into_iter().rev());
        }

        log::info!(
            "Discovered {} jurisdictions below {}",
            tree.len() - 1,
            tree[tree.root()].url()
        );
        Ok(tree)
    }

    /// Direct children of one jurisdiction, in listing order.
    ///
    /// A listing page that cannot be fetched makes the jurisdiction a leaf.
    pub async fn subjurisdictions(&self, parent: &Jurisdiction) -> Result<Vec<Jurisdiction>> {
        let Some(listing_url) = parent.subjurisdiction_listing_url() else {
            return Ok(Vec::new());
        };
        let Some(child_level) = parent.level().child() else {
            return Ok(Vec::new());
        };

        let html = match self.fetcher.fetch_text(&listing_url).await {
            Ok(html) => html,
            Err(e) if e.is_transport() => {
                log::warn!("No subjurisdiction listing at {}: {}", listing_url, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut children = Vec::new();
        for entry in scrape_listing(&html) {
            let Some(page_url) = parent.path().county_page_url(&entry.path) else {
                log::debug!("Skipping listing entry with empty path: {:?}", entry);
                continue;
            };

            let url = self.resolve_summary_url(&page_url).await?;
            log::debug!("Resolved {} -> {}", entry.name, url);
            children.push(Jurisdiction::new(&url, child_level, entry.name)?);
        }

        Ok(children)
    }

    /// Follow a landing page's redirect to its versioned summary page.
    pub async fn resolve_summary_url(&self, page_url: &str) -> Result<String> {
        let html = self.fetcher.fetch_text(page_url).await?;
        let segment = resolve_segment(page_url, &html)?;
        Ok(county_summary_url(page_url, &segment))
    }
}

/// Anchors of a listing page that carry both a path and a name.
pub fn scrape_listing(html: &str) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("ul li a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let element = anchor.value();
            match (element.attr("value"), element.attr("id")) {
                (Some(path), Some(name)) => Some(ListingEntry {
                    path: path.to_string(),
                    name: name.to_string(),
                }),
                _ => {
                    log::debug!("Skipping listing anchor without value/id");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::utils::http::testing::StaticFetcher;

    const STATE_URL: &str = "http://host/AR/63912/184685/Web01/en/summary.html";
    const LISTING_URL: &str = "http://host/AR/63912/184685/Web01/en/select-county.html";

    const LISTING: &str = r#"<html><body><ul>
        <li><a id="Benton" value="./Benton/63917">Benton</a></li>
        <li><a value="./Nameless/1">no id</a></li>
        <li><a id="Ashley" value="Ashley/63901/">Ashley</a></li>
    </ul></body></html>"#;

    fn meta(segment: &str) -> String {
        format!(r#"<html><head><meta http-equiv="refresh" content="0;url=./{segment}/en/summary.html"></head></html>"#)
    }

    fn state() -> Jurisdiction {
        Jurisdiction::new(STATE_URL, Level::State, "AR").unwrap()
    }

    #[test]
    fn test_scrape_listing_skips_incomplete_anchors() {
        let entries = scrape_listing(LISTING);
        assert_eq!(
            entries,
            vec![
                ListingEntry {
                    path: "./Benton/63917".to_string(),
                    name: "Benton".to_string()
                },
                ListingEntry {
                    path: "Ashley/63901/".to_string(),
                    name: "Ashley".to_string()
                },
            ]
        );
        assert!(scrape_listing("<html><body></body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_root_alone() {
        let fetcher = Arc::new(StaticFetcher::new());
        let crawler = SubjurisdictionCrawler::new(fetcher.clone());

        let tree = crawler.crawl(state()).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(fetcher.requests(), vec![LISTING_URL]);
    }

    #[tokio::test]
    async fn test_crawl_resolves_counties_in_order() {
        let fetcher = StaticFetcher::new()
            .with(LISTING_URL, LISTING)
            .with("http://host/AR/Benton/63917", meta("183978"))
            .with(
                "http://host/AR/Ashley/63901",
                r#"<script src="./184001/js/version.js"></script>"#,
            );
        let crawler = SubjurisdictionCrawler::new(Arc::new(fetcher));

        let tree = crawler.crawl(state()).await.unwrap();
        let nodes: Vec<(&str, Level, &str)> = tree
            .iter()
            .map(|(_, j)| (j.name(), j.level(), j.url()))
            .collect();

        assert_eq!(
            nodes,
            vec![
                ("AR", Level::State, STATE_URL),
                (
                    "Benton",
                    Level::County,
                    "http://host/AR/Benton/63917/183978/en/summary.html"
                ),
                (
                    "Ashley",
                    Level::County,
                    "http://host/AR/Ashley/63901/184001/en/summary.html"
                ),
            ]
        );
        let benton = tree.children(tree.root())[0];
        assert_eq!(tree.parent(benton), Some(tree.root()));
        assert!(tree.children(benton).is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_county_fails_crawl() {
        let fetcher = StaticFetcher::new()
            .with(LISTING_URL, LISTING)
            .with("http://host/AR/Benton/63917", "<html><body>down</body></html>");
        let crawler = SubjurisdictionCrawler::new(Arc::new(fetcher));

        assert!(matches!(
            crawler.crawl(state()).await,
            Err(AppError::Extraction { .. })
        ));
    }

    #[tokio::test]
    async fn test_county_page_transport_error_propagates() {
        let fetcher = StaticFetcher::new().with(LISTING_URL, LISTING);
        let crawler = SubjurisdictionCrawler::new(Arc::new(fetcher));

        let err = crawler.crawl(state()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_counties_have_no_listing() {
        let county = Jurisdiction::new(
            "http://host/AR/Benton/63917/183978/Web01/en/summary.html",
            Level::County,
            "Benton",
        )
        .unwrap();
        let fetcher = Arc::new(StaticFetcher::new());
        let crawler = SubjurisdictionCrawler::new(fetcher.clone());

        assert!(crawler.subjurisdictions(&county).await.unwrap().is_empty());
        assert!(fetcher.requests().is_empty());
    }
}
