//! Podcast core: the crawl's data model and pure helpers, free of I/O.
mod model;
mod names;
mod outcome;
mod summary;

pub use model::{DownloadTask, PodcastRecord, Section, AUDIO_EXTENSION};
pub use names::{clean_episode_name, clean_link, sanitize_component};
pub use outcome::{EpisodeOutcome, EpisodeReport, FailureKind};
pub use summary::RunSummary;
