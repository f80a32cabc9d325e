use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use log::Level;
use podcast_core::{FailureKind, PodcastRecord, RunSummary};

/// Everything a crawl reports about its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    SectionSkipped {
        index: usize,
        reason: String,
    },
    SectionReady {
        header: String,
        episodes: usize,
    },
    RowSkipped {
        section: String,
        row: usize,
        reason: String,
    },
    Retrying {
        target: String,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
    AlreadyPresent {
        record: PodcastRecord,
    },
    Downloading {
        record: PodcastRecord,
    },
    Saved {
        record: PodcastRecord,
        path: PathBuf,
        bytes: u64,
    },
    NotAudio {
        record: PodcastRecord,
        content_type: Option<String>,
        url: String,
    },
    EpisodeFailed {
        record: PodcastRecord,
        failure: FailureKind,
        detail: String,
    },
    Finished(RunSummary),
}

impl CrawlEvent {
    pub fn level(&self) -> Level {
        match self {
            CrawlEvent::SectionSkipped { .. }
            | CrawlEvent::Retrying { .. }
            | CrawlEvent::EpisodeFailed { .. } => Level::Error,
            CrawlEvent::RowSkipped { .. } => Level::Warn,
            CrawlEvent::SectionReady { .. } | CrawlEvent::AlreadyPresent { .. } => Level::Debug,
            CrawlEvent::Downloading { .. }
            | CrawlEvent::Saved { .. }
            | CrawlEvent::NotAudio { .. }
            | CrawlEvent::Finished(_) => Level::Info,
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlEvent::SectionSkipped { index, reason } => {
                write!(f, "Unable to parse section {index}: {reason}")
            }
            CrawlEvent::SectionReady { header, episodes } => {
                write!(f, "Section {header:?}: {episodes} episodes")
            }
            CrawlEvent::RowSkipped {
                section,
                row,
                reason,
            } => write!(f, "Skipping row {row} of {section:?}: {reason}"),
            CrawlEvent::Retrying {
                target,
                attempt,
                max_attempts,
                delay,
            } => write!(
                f,
                "Server disconnected while fetching {target}. Retrying after {} seconds. Attempt {attempt}/{max_attempts}.",
                delay.as_secs_f32()
            ),
            CrawlEvent::AlreadyPresent { record } => {
                write!(f, "{} under {} already downloaded", record.name, record.section)
            }
            CrawlEvent::Downloading { record } => write!(f, "Downloading {}...", record.name),
            CrawlEvent::Saved { path, bytes, .. } => {
                write!(f, "Finished! {} ({bytes} bytes)", path.display())
            }
            CrawlEvent::NotAudio {
                record,
                content_type,
                url,
            } => write!(
                f,
                "Link for {} doesn't seem to be an audio file, see content type: {} link: {url}",
                record.name,
                content_type.as_deref().unwrap_or("<none>")
            ),
            CrawlEvent::EpisodeFailed {
                record,
                failure,
                detail,
            } => write!(
                f,
                "Error fetching {} under {} ({}): {failure}: {detail}",
                record.name, record.section, record.link
            ),
            CrawlEvent::Finished(summary) => write!(f, "{summary}"),
        }
    }
}

/// Receiver for crawl events, handed explicitly to every component.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Forwards events to the global log facade at their own level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl EventSink for LoggingSink {
    fn emit(&self, event: CrawlEvent) {
        match event.level() {
            Level::Error => engine_error!("{event}"),
            Level::Warn => engine_warn!("{event}"),
            Level::Info => engine_info!("{event}"),
            Level::Debug | Level::Trace => engine_debug!("{event}"),
        }
    }
}
