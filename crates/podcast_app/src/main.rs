mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use engine_logging::{engine_error, engine_info};
use podcast_core::RunSummary;
use podcast_engine::{CrawlConfig, Crawler, LoggingSink};

fn main() -> ExitCode {
    let settings = match config::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("podcast-dl: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::initialize(&settings.log_file, settings.log_level);
    engine_info!(
        "Crawling {} into {:?}",
        settings.crawl.landing_url,
        settings.crawl.output_root
    );

    match run(settings.crawl) {
        // Failed episodes are in the summary; the run itself completed.
        Ok(_summary) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("Crawl could not start: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: CrawlConfig) -> Result<RunSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building the async runtime")?;
    let crawler = Crawler::new(config, Arc::new(LoggingSink))?;
    let summary = runtime.block_on(crawler.run())?;
    Ok(summary)
}
