use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_LANDING_URL: &str = "https://orthodoxbiblestudy.info";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Whole-request deadline for HTML pages. Audio downloads have none.
    pub request_timeout: Duration,
    /// Longest silence tolerated while reading any response, audio included.
    pub read_timeout: Duration,
    /// Redirects followed when downloading audio. Episode pages never follow any.
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            read_timeout: Duration::from_secs(60),
            redirect_limit: 10,
            max_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// CSS selectors describing where things live on the archive's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Container whose direct children are the sections.
    pub sidebar: String,
    /// Which direct children of the sidebar count as sections.
    pub section: String,
    pub section_heading: String,
    pub section_table: String,
    /// Episode page element holding the player.
    pub content_container: String,
    pub audio_marker: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            sidebar: "div#sidebar".to_string(),
            section: "div".to_string(),
            section_heading: "h3".to_string(),
            section_table: "table".to_string(),
            content_container: "div.storycontent".to_string(),
            audio_marker: "audio.wp-audio-player".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub landing_url: String,
    pub output_root: PathBuf,
    pub http: HttpSettings,
    pub layout: SiteLayout,
    pub audio_content_types: Vec<String>,
    pub retry: RetryPolicy,
    pub max_concurrent_downloads: usize,
}

impl CrawlConfig {
    pub fn default_with_output(output_root: PathBuf) -> Self {
        Self {
            landing_url: DEFAULT_LANDING_URL.to_string(),
            output_root,
            http: HttpSettings::default(),
            layout: SiteLayout::default(),
            audio_content_types: vec!["audio/mpeg".to_string()],
            retry: RetryPolicy::default(),
            max_concurrent_downloads: 8,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::default_with_output(PathBuf::from("podcasts"))
    }
}
