use std::path::{Path, PathBuf};

/// Extension given to every saved episode.
pub const AUDIO_EXTENSION: &str = "mp3";

/// A heading-delimited group of episodes on the landing page.
///
/// Maps 1:1 to a directory below the output root. Built once during
/// extraction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub episodes: Vec<PodcastRecord>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            episodes: Vec::new(),
        }
    }
}

/// One episode discovered on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PodcastRecord {
    pub name: String,
    pub section: String,
    pub link: String,
}

impl PodcastRecord {
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            link: link.into(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{AUDIO_EXTENSION}", self.name)
    }

    /// `(section, name)` is unique per run, so this path is never shared
    /// between two concurrent tasks.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(&self.section).join(self.file_name())
    }
}

/// A record handed to one asynchronous unit of work, plus its attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub record: PodcastRecord,
    pub attempts: u32,
}

impl DownloadTask {
    pub fn new(record: PodcastRecord) -> Self {
        Self {
            record,
            attempts: 0,
        }
    }
}
