use std::fmt;
use std::path::PathBuf;

use crate::PodcastRecord;

/// Terminal state of one episode task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Saved { path: PathBuf, bytes: u64 },
    SkippedExisting,
    SkippedContentType { content_type: Option<String> },
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Episode page lacked the content container, audio marker or link.
    Parse,
    InvalidUrl,
    /// Body read was interrupted or truncated.
    Payload,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
    /// The server kept dropping the connection until the retry bound ran out.
    RetryExhausted { attempts: u32 },
    Persist,
    /// Destination appeared between the existence check and the write.
    AlreadyExists,
    TaskPanicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Parse => write!(f, "episode page parse error"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Payload => write!(f, "payload error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::RetryExhausted { attempts } => {
                write!(f, "server disconnected, gave up after {attempts} attempts")
            }
            FailureKind::Persist => write!(f, "write error"),
            FailureKind::AlreadyExists => write!(f, "destination already exists"),
            FailureKind::TaskPanicked => write!(f, "task panicked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeReport {
    pub record: PodcastRecord,
    pub attempts: u32,
    pub outcome: EpisodeOutcome,
}
