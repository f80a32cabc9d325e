use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_info};
use futures_util::{stream, StreamExt};
use podcast_core::{DownloadTask, EpisodeOutcome, EpisodeReport, FailureKind, PodcastRecord, RunSummary};
use scraper::Html;
use url::Url;

use crate::config::CrawlConfig;
use crate::decode::decode_page;
use crate::episode::EpisodeFetcher;
use crate::events::{CrawlEvent, EventSink};
use crate::extract::{ExtractError, LinkExtractor};
use crate::http::{FetchedPage, HttpError, HttpSession};
use crate::persist::{ensure_output_dir, EpisodeStore, PersistError};
use crate::resolve::{PlayerLinkResolver, ResolveError};
use crate::retry::retry_async;

/// Failures that stop a crawl before any episode is scheduled.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("landing page {url}: {source}")]
    Landing { url: String, source: HttpError },
    #[error("landing page layout: {0}")]
    Layout(#[from] ExtractError),
    #[error("episode page layout: {0}")]
    EpisodeLayout(#[from] ResolveError),
    #[error("http client: {0}")]
    Client(HttpError),
    #[error("output root: {0}")]
    OutputRoot(#[from] PersistError),
}

/// Anything that can carry one episode task to a terminal outcome.
#[async_trait::async_trait]
pub trait EpisodeDownloader: Send + Sync {
    async fn download(&self, task: DownloadTask) -> EpisodeReport;
}

#[async_trait::async_trait]
impl EpisodeDownloader for EpisodeFetcher {
    async fn download(&self, task: DownloadTask) -> EpisodeReport {
        self.fetch(task).await
    }
}

/// Run one task per record, at most `max_concurrent` at a time, and collect
/// every report. A panicking task becomes a `TaskPanicked` report; its
/// siblings keep running.
pub async fn download_all(
    downloader: Arc<dyn EpisodeDownloader>,
    records: Vec<PodcastRecord>,
    max_concurrent: usize,
    sink: Arc<dyn EventSink>,
) -> Vec<EpisodeReport> {
    let tasks = records.into_iter().map(|record| {
        let downloader = downloader.clone();
        let sink = sink.clone();
        async move {
            let task = DownloadTask::new(record.clone());
            match tokio::spawn(async move { downloader.download(task).await }).await {
                Ok(report) => report,
                Err(err) => {
                    engine_error!("Task for {} ended abnormally: {}", record.name, err);
                    sink.emit(CrawlEvent::EpisodeFailed {
                        record: record.clone(),
                        failure: FailureKind::TaskPanicked,
                        detail: err.to_string(),
                    });
                    EpisodeReport {
                        record,
                        attempts: 0,
                        outcome: EpisodeOutcome::Failed(FailureKind::TaskPanicked),
                    }
                }
            }
        }
    });

    stream::iter(tasks)
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

/// Landing page to saved files, for one archive.
pub struct Crawler {
    config: CrawlConfig,
    session: HttpSession,
    store: EpisodeStore,
    extractor: LinkExtractor,
    downloader: Arc<dyn EpisodeDownloader>,
    sink: Arc<dyn EventSink>,
}

impl Crawler {
    pub fn new(config: CrawlConfig, sink: Arc<dyn EventSink>) -> Result<Self, CrawlError> {
        let session = HttpSession::new(config.http.clone()).map_err(CrawlError::Client)?;
        let store = EpisodeStore::new(config.output_root.clone());
        let mut extractor = LinkExtractor::new(&config.layout)?;
        if let Ok(base) = Url::parse(&config.landing_url) {
            extractor = extractor.with_base_url(base);
        }
        let resolver = Arc::new(PlayerLinkResolver::new(&config.layout)?);
        let fetcher = EpisodeFetcher::new(session.clone(), store.clone(), resolver, sink.clone())
            .with_retry(config.retry)
            .with_audio_content_types(config.audio_content_types.clone());

        Ok(Self {
            config,
            session,
            store,
            extractor,
            downloader: Arc::new(fetcher),
            sink,
        })
    }

    /// Replace the episode downloader; the landing page is still crawled for real.
    pub fn with_downloader(mut self, downloader: Arc<dyn EpisodeDownloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub async fn run(&self) -> Result<RunSummary, CrawlError> {
        ensure_output_dir(self.store.root())?;
        let records = self.discover().await?;
        engine_info!("Discovered {} episodes", records.len());

        let reports = download_all(
            self.downloader.clone(),
            records,
            self.config.max_concurrent_downloads,
            self.sink.clone(),
        )
        .await;

        let summary = RunSummary::from_reports(&reports);
        self.sink.emit(CrawlEvent::Finished(summary.clone()));
        Ok(summary)
    }

    /// Fetch the landing page and extract every episode record, creating
    /// section directories along the way.
    pub async fn discover(&self) -> Result<Vec<PodcastRecord>, CrawlError> {
        let url = Url::parse(&self.config.landing_url).map_err(|err| CrawlError::Landing {
            url: self.config.landing_url.clone(),
            source: HttpError::invalid_url(&self.config.landing_url, err),
        })?;

        let page = retry_async(
            &self.config.retry,
            HttpError::is_disconnect,
            |attempt, delay, _err| {
                self.sink.emit(CrawlEvent::Retrying {
                    target: url.to_string(),
                    attempt,
                    max_attempts: self.config.retry.max_attempts,
                    delay,
                })
            },
            |_| self.session.get_page(&url),
        )
        .await
        .map_err(|source| CrawlError::Landing {
            url: url.to_string(),
            source,
        })?;

        Ok(self.extract(&page)?)
    }

    fn extract(&self, page: &FetchedPage) -> Result<Vec<PodcastRecord>, ExtractError> {
        let decoded = decode_page(&page.bytes, page.content_type.as_deref());
        engine_debug!("Landing page {} decoded as {}", page.url, decoded.encoding_label);
        let document = Html::parse_document(&decoded.html);
        self.extractor
            .extract_links(&document, &self.store, self.sink.as_ref())
    }
}
