// src/pipeline/ingest.rs

//! Results ingestion: level inference, optional crawl, archive download and
//! decoding, merged into one ordered stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    Config, ElectionInfo, Jurisdiction, JurisdictionId, JurisdictionTree, Level, LevelName,
    ReportFormat, ResultRecord, infer_levels,
};
use crate::report::ReportDecoder;
use crate::services::SubjurisdictionCrawler;
use crate::storage::{ArchiveCache, extract_document};
use crate::utils::{Fetcher, HttpFetcher};

const DEFAULT_CONCURRENCY: usize = 4;

/// Entry point for discovering jurisdictions and streaming their results.
pub struct Ingestor {
    fetcher: Arc<dyn Fetcher>,
    cache: Option<ArchiveCache>,
    concurrency: usize,
}

impl Ingestor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Ingestor over HTTP, with the cache and concurrency from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config.http)?;
        Ok(Self::new(Arc::new(fetcher))
            .with_cache(ArchiveCache::from_config(&config.cache))
            .with_concurrency(config.http.max_concurrent))
    }

    pub fn with_cache(mut self, cache: Option<ArchiveCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Maximum archive downloads in flight; at least one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Crawl the jurisdictions below a results page.
    ///
    /// `level` defaults to the deepest level the URL names.
    pub async fn discover_jurisdictions(
        &self,
        root_url: &str,
        level: Option<Level>,
    ) -> Result<JurisdictionTree> {
        let levels = infer_levels(root_url)?;
        let deepest = deepest_level(root_url, &levels)?;
        let level = level.unwrap_or(deepest.level);
        let name = levels
            .iter()
            .find(|l| l.level == level)
            .map(|l| l.name.clone())
            .unwrap_or_default();

        let root = Jurisdiction::new(root_url, level, name)?;
        SubjurisdictionCrawler::new(self.fetcher.clone())
            .crawl(root)
            .await
    }

    /// Stream the results of a page and, with `expand`, of every
    /// jurisdiction below it.
    ///
    /// Fails up front only on a malformed URL or a failed crawl. Per
    /// jurisdiction failures arrive as `Err` items in the stream.
    pub async fn stream_results(&self, root_url: &str, expand: bool) -> Result<ResultStream> {
        let levels = infer_levels(root_url)?;
        let deepest = deepest_level(root_url, &levels)?;
        let root = Jurisdiction::new(root_url, deepest.level, deepest.name.clone())?;

        let tree = if expand {
            SubjurisdictionCrawler::new(self.fetcher.clone())
                .crawl(root)
                .await?
        } else {
            JurisdictionTree::new(root)
        };

        Ok(self.results_for(Arc::new(tree), levels))
    }

    /// Stream the results of every jurisdiction in a tree, in pre-order.
    pub fn results_for(&self, tree: Arc<JurisdictionTree>, levels: Vec<LevelName>) -> ResultStream {
        let jobs: Vec<(JurisdictionId, String)> = tree
            .walk()
            .into_iter()
            .map(|id| (id, tree[id].report_url(ReportFormat::Xml)))
            .collect();

        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let documents = stream::iter(jobs)
            .map(move |(id, url)| {
                let fetcher = fetcher.clone();
                let cache = cache.clone();
                async move {
                    let document = load_document(fetcher.as_ref(), cache.as_ref(), &url).await;
                    (id, document)
                }
            })
            .buffered(self.concurrency);

        let owner = tree.clone();
        let records = documents.flat_map(move |(id, document)| {
            decode_records(&owner[id], id, document)
        });

        let inner = records
            .scan(false, |halted, item| {
                if *halted {
                    return future::ready(None);
                }
                if let Err(e) = &item {
                    *halted = e.is_fatal();
                }
                future::ready(Some(item))
            })
            .boxed();

        ResultStream {
            tree,
            levels,
            inner,
        }
    }
}

/// The jurisdiction a results page belongs to.
fn deepest_level<'a>(root_url: &str, levels: &'a [LevelName]) -> Result<&'a LevelName> {
    levels
        .last()
        .ok_or_else(|| AppError::malformed_url(root_url, "no state or county in path"))
}

/// Archive bytes for a report URL, cache first, then the extracted document.
async fn load_document(
    fetcher: &dyn Fetcher,
    cache: Option<&ArchiveCache>,
    url: &str,
) -> Result<Vec<u8>> {
    let cached = match cache {
        Some(cache) => cache.read(url).await?,
        None => None,
    };

    let archive = match cached {
        Some(bytes) => bytes,
        None => {
            let bytes = fetcher.fetch(url).await?;
            if let Some(cache) = cache {
                if let Err(e) = cache.write(url, &bytes).await {
                    log::warn!("Failed to cache {}: {}", url, e);
                }
            }
            bytes
        }
    };

    extract_document(&archive)
}

fn decode_records(
    jurisdiction: &Jurisdiction,
    id: JurisdictionId,
    document: Result<Vec<u8>>,
) -> BoxStream<'static, Result<ResultRecord>> {
    match document.and_then(ReportDecoder::new) {
        Ok(decoder) => {
            log::info!(
                "Decoding {} for {}",
                describe(decoder.election()),
                jurisdiction.url()
            );
            stream::iter(decoder.map(move |record| record.map(|r| r.with_jurisdiction(id)))).boxed()
        }
        Err(e) => {
            log::warn!("No results for {}: {}", jurisdiction.url(), e);
            stream::once(future::ready(Err(e))).boxed()
        }
    }
}

/// Election name and date for log lines.
fn describe(election: &ElectionInfo) -> String {
    let name = election.name.as_deref().unwrap_or("unnamed election");
    match (election.date(), election.date_text.as_deref()) {
        (Some(date), _) => format!("{} ({})", name, date.format("%Y-%m-%d")),
        (None, Some(raw)) => format!("{} ({})", name, raw.trim()),
        (None, None) => name.to_string(),
    }
}

/// Lazy stream of result records tagged with their jurisdiction.
///
/// Ends early after a fatal error; see [`AppError::is_fatal`].
pub struct ResultStream {
    tree: Arc<JurisdictionTree>,
    levels: Vec<LevelName>,
    inner: BoxStream<'static, Result<ResultRecord>>,
}

impl ResultStream {
    /// Jurisdictions the stream covers; record ids index into it.
    pub fn tree(&self) -> &Arc<JurisdictionTree> {
        &self.tree
    }

    /// Levels named by the root URL, outermost first.
    pub fn levels(&self) -> &[LevelName] {
        &self.levels
    }
}

impl Stream for ResultStream {
    type Item = Result<ResultRecord>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
