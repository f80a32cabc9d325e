use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use engine_logging::engine_debug;
use podcast_core::{DownloadTask, EpisodeOutcome, EpisodeReport, FailureKind, PodcastRecord};
use scraper::Html;
use url::Url;

use crate::decode::decode_page;
use crate::events::{CrawlEvent, EventSink};
use crate::http::{content_type_of, HttpError, HttpSession};
use crate::persist::{EpisodeStore, PersistError};
use crate::resolve::{AudioUrlResolver, ResolveError};
use crate::retry::{retry_async, RetryPolicy};

/// Binary content from the second hop, with the type the server claimed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub url: Url,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One failed attempt at fetching an episode.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl EpisodeError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, EpisodeError::Http(err) if err.is_disconnect())
    }

    /// `attempts` is how many tries were made; it only shows up for disconnects,
    /// which can only escape the retry loop once it is exhausted.
    pub fn failure_kind(&self, attempts: u32) -> FailureKind {
        match self {
            EpisodeError::Http(err) if err.is_disconnect() => {
                FailureKind::RetryExhausted { attempts }
            }
            EpisodeError::Http(err) => err.failure_kind(),
            EpisodeError::Resolve(ResolveError::InvalidLink { .. }) => FailureKind::InvalidUrl,
            EpisodeError::Resolve(_) => FailureKind::Parse,
            EpisodeError::Persist(PersistError::AlreadyExists(_)) => FailureKind::AlreadyExists,
            EpisodeError::Persist(_) => FailureKind::Persist,
        }
    }
}

enum Fetched {
    Saved { path: PathBuf, bytes: u64 },
    NotAudio { content_type: Option<String>, url: Url },
}

/// Two-hop download of one episode: episode page, then the audio it links to.
pub struct EpisodeFetcher {
    session: HttpSession,
    store: EpisodeStore,
    resolver: Arc<dyn AudioUrlResolver>,
    retry: RetryPolicy,
    audio_content_types: Vec<String>,
    sink: Arc<dyn EventSink>,
}

impl EpisodeFetcher {
    pub fn new(
        session: HttpSession,
        store: EpisodeStore,
        resolver: Arc<dyn AudioUrlResolver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            session,
            store,
            resolver,
            retry: RetryPolicy::default(),
            audio_content_types: vec!["audio/mpeg".to_string()],
            sink,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_audio_content_types(mut self, content_types: Vec<String>) -> Self {
        self.audio_content_types = content_types;
        self
    }

    /// Run one task to a terminal outcome. Never panics on remote input and
    /// never returns without an outcome.
    pub async fn fetch(&self, mut task: DownloadTask) -> EpisodeReport {
        if self.store.contains(&task.record) {
            self.sink.emit(CrawlEvent::AlreadyPresent {
                record: task.record.clone(),
            });
            return EpisodeReport {
                record: task.record,
                attempts: 0,
                outcome: EpisodeOutcome::SkippedExisting,
            };
        }

        let record = &task.record;
        let mut attempts = 0;
        let result = retry_async(
            &self.retry,
            EpisodeError::is_disconnect,
            |attempt, delay, _err| {
                self.sink.emit(CrawlEvent::Retrying {
                    target: record.link.clone(),
                    attempt,
                    max_attempts: self.retry.max_attempts,
                    delay,
                })
            },
            |attempt| {
                attempts = attempt;
                self.fetch_once(record)
            },
        )
        .await;
        task.attempts = attempts;

        let outcome = match result {
            Ok(Fetched::Saved { path, bytes }) => {
                self.sink.emit(CrawlEvent::Saved {
                    record: task.record.clone(),
                    path: path.clone(),
                    bytes,
                });
                EpisodeOutcome::Saved { path, bytes }
            }
            Ok(Fetched::NotAudio { content_type, url }) => {
                self.sink.emit(CrawlEvent::NotAudio {
                    record: task.record.clone(),
                    content_type: content_type.clone(),
                    url: url.to_string(),
                });
                EpisodeOutcome::SkippedContentType { content_type }
            }
            Err(err) => {
                let failure = err.failure_kind(task.attempts);
                self.sink.emit(CrawlEvent::EpisodeFailed {
                    record: task.record.clone(),
                    failure: failure.clone(),
                    detail: err.to_string(),
                });
                EpisodeOutcome::Failed(failure)
            }
        };

        EpisodeReport {
            record: task.record,
            attempts: task.attempts,
            outcome,
        }
    }

    async fn fetch_once(&self, record: &PodcastRecord) -> Result<Fetched, EpisodeError> {
        let page_url =
            Url::parse(&record.link).map_err(|err| HttpError::invalid_url(&record.link, err))?;
        let page = self.session.get_page(&page_url).await?;
        let audio_url = self.resolve_audio_url(&page.bytes, page.content_type.as_deref(), &page.url)?;
        engine_debug!("{} resolved to {}", record.name, audio_url);

        let response = self.session.get_following_redirects(audio_url).await?;
        let content_type = content_type_of(&response);
        let url = response.url().clone();
        if !self.is_audio(content_type.as_deref()) {
            return Ok(Fetched::NotAudio { content_type, url });
        }

        self.sink.emit(CrawlEvent::Downloading {
            record: record.clone(),
        });
        let audio = AudioFile {
            url,
            content_type,
            bytes: self.session.read_body(response).await?,
        };
        let bytes = audio.bytes.len() as u64;
        let path = self.persist(record.clone(), audio).await?;
        Ok(Fetched::Saved { path, bytes })
    }

    fn resolve_audio_url(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        page_url: &Url,
    ) -> Result<Url, ResolveError> {
        let decoded = decode_page(body, content_type);
        let document = Html::parse_document(&decoded.html);
        self.resolver.resolve(&document, page_url)
    }

    /// Media type only, parameters dropped, ASCII case-insensitive.
    fn is_audio(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return false;
        };
        let essence = content_type.split(';').next().unwrap_or(content_type).trim();
        self.audio_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    async fn persist(
        &self,
        record: PodcastRecord,
        audio: AudioFile,
    ) -> Result<PathBuf, PersistError> {
        engine_debug!(
            "Saving {} bytes of {} from {}",
            audio.bytes.len(),
            audio.content_type.as_deref().unwrap_or("unknown type"),
            audio.url
        );
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.save(&record, &audio.bytes))
            .await
            .map_err(|err| PersistError::Io(io::Error::other(err.to_string())))?
    }
}
