//! Podcast engine: landing page crawl, two-hop episode download and persistence.
mod config;
mod crawl;
mod decode;
mod episode;
mod events;
mod extract;
mod http;
mod persist;
mod resolve;
mod retry;

pub use config::{CrawlConfig, HttpSettings, SiteLayout, DEFAULT_LANDING_URL, DEFAULT_USER_AGENT};
pub use crawl::{download_all, CrawlError, Crawler, EpisodeDownloader};
pub use decode::{decode_page, DecodedPage};
pub use episode::{AudioFile, EpisodeError, EpisodeFetcher};
pub use events::{CrawlEvent, EventSink, LoggingSink};
pub use extract::{ExtractError, LinkExtractor, SectionError, SkippedRow};
pub use http::{FetchedPage, HttpError, HttpSession};
pub use persist::{ensure_output_dir, EpisodeStore, PersistError};
pub use resolve::{AudioUrlResolver, PlayerLinkResolver, ResolveError};
pub use retry::{retry_async, RetryDecision, RetryPolicy};
