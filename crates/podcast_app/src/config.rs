//! Optional RON settings file for the downloader.
//!
//! Every field may be left out; missing ones keep the engine defaults.
//! Looked up at `$PODCAST_DL_CONFIG` if set, else `./podcasts.ron`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use podcast_engine::{CrawlConfig, RetryPolicy};
use ron::extensions::Extensions;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "PODCAST_DL_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "podcasts.ron";
const DEFAULT_OUTPUT_DIR: &str = "podcasts";
const DEFAULT_LOG_FILE: &str = "podcast.log";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    landing_url: Option<String>,
    output_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    user_agent: Option<String>,
    connect_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    redirect_limit: Option<usize>,
    max_bytes: Option<u64>,
    audio_content_types: Option<Vec<String>>,
    retry_attempts: Option<u32>,
    retry_delay_secs: Option<u64>,
    max_concurrent_downloads: Option<usize>,
    layout: Option<LayoutOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LayoutOverrides {
    sidebar: Option<String>,
    section: Option<String>,
    section_heading: Option<String>,
    section_table: Option<String>,
    content_container: Option<String>,
    audio_marker: Option<String>,
}

/// Everything the binary needs to start a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub crawl: CrawlConfig,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
}

/// Load settings from the configured file, or defaults when there is none.
///
/// A path named by the environment variable must exist; the default file is
/// optional.
pub fn load() -> Result<Settings> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => load_file(Path::new(&path)),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                load_file(path)
            } else {
                settings_from_str("()")
            }
        }
    }
}

fn load_file(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    settings_from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn settings_from_str(text: &str) -> Result<Settings> {
    let file: FileConfig = ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(text)?;
    file.into_settings()
}

impl FileConfig {
    fn into_settings(self) -> Result<Settings> {
        let output_root = self
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let mut crawl = CrawlConfig::default_with_output(output_root);

        if let Some(url) = self.landing_url {
            crawl.landing_url = url;
        }
        if let Some(agent) = self.user_agent {
            crawl.http.user_agent = agent;
        }
        if let Some(secs) = self.connect_timeout_secs {
            crawl.http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            crawl.http.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.read_timeout_secs {
            crawl.http.read_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.redirect_limit {
            crawl.http.redirect_limit = limit;
        }
        if let Some(max) = self.max_bytes {
            crawl.http.max_bytes = max;
        }
        if let Some(types) = self.audio_content_types {
            if types.is_empty() {
                return Err(anyhow!("audio_content_types must not be empty"));
            }
            crawl.audio_content_types = types;
        }

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = self.retry_attempts {
            if attempts == 0 {
                return Err(anyhow!("retry_attempts must be at least 1"));
            }
            retry.max_attempts = attempts;
        }
        if let Some(secs) = self.retry_delay_secs {
            retry.delay = Duration::from_secs(secs);
        }
        crawl.retry = retry;

        if let Some(limit) = self.max_concurrent_downloads {
            if limit == 0 {
                return Err(anyhow!("max_concurrent_downloads must be at least 1"));
            }
            crawl.max_concurrent_downloads = limit;
        }

        if let Some(layout) = self.layout {
            let target = &mut crawl.layout;
            let overrides = [
                (layout.sidebar, &mut target.sidebar),
                (layout.section, &mut target.section),
                (layout.section_heading, &mut target.section_heading),
                (layout.section_table, &mut target.section_table),
                (layout.content_container, &mut target.content_container),
                (layout.audio_marker, &mut target.audio_marker),
            ];
            for (value, slot) in overrides {
                if let Some(value) = value {
                    *slot = value;
                }
            }
        }

        let log_level = match self.log_level {
            Some(name) => engine_logging::parse_level(&name)
                .ok_or_else(|| anyhow!("unknown log level {name:?}"))?,
            None => LevelFilter::Info,
        };

        Ok(Settings {
            crawl,
            log_file: self
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use podcast_engine::{DEFAULT_LANDING_URL, DEFAULT_USER_AGENT};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_keeps_every_default() {
        let settings = settings_from_str("()").unwrap();
        assert_eq!(settings.crawl.landing_url, DEFAULT_LANDING_URL);
        assert_eq!(settings.crawl.output_root, PathBuf::from("podcasts"));
        assert_eq!(settings.crawl.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.crawl.retry, RetryPolicy::default());
        assert_eq!(settings.crawl.max_concurrent_downloads, 8);
        assert_eq!(settings.log_file, PathBuf::from("podcast.log"));
        assert_eq!(settings.log_level, LevelFilter::Info);
    }

    #[test]
    fn fields_override_defaults() {
        let settings = settings_from_str(
            r#"(
                landing_url: "http://localhost:8080/",
                output_dir: "/srv/podcasts",
                log_level: "debug",
                retry_attempts: 3,
                retry_delay_secs: 1,
                read_timeout_secs: 30,
                max_concurrent_downloads: 2,
                audio_content_types: ["audio/mpeg", "audio/mp3"],
                layout: (sidebar: "aside"),
            )"#,
        )
        .unwrap();

        assert_eq!(settings.crawl.landing_url, "http://localhost:8080/");
        assert_eq!(settings.crawl.output_root, PathBuf::from("/srv/podcasts"));
        assert_eq!(settings.log_level, LevelFilter::Debug);
        assert_eq!(
            settings.crawl.retry,
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_secs(1),
            }
        );
        assert_eq!(settings.crawl.max_concurrent_downloads, 2);
        assert_eq!(settings.crawl.http.read_timeout, Duration::from_secs(30));
        assert_eq!(settings.crawl.audio_content_types.len(), 2);
        assert_eq!(settings.crawl.layout.sidebar, "aside");
        assert_eq!(settings.crawl.layout.section_heading, "h3");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(settings_from_str("(log_level: \"loud\")").is_err());
        assert!(settings_from_str("(max_concurrent_downloads: 0)").is_err());
        assert!(settings_from_str("(retry_attempts: 0)").is_err());
        assert!(settings_from_str("(landing_page: \"x\")").is_err());
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("podcasts.ron");
        fs::write(&path, "(output_dir: \"archive\")").unwrap();

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.crawl.output_root, PathBuf::from("archive"));
        assert!(load_file(&temp.path().join("missing.ron")).is_err());
    }
}
