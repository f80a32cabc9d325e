use podcast_core::{clean_episode_name, clean_link, sanitize_component, PodcastRecord, Section};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SiteLayout;
use crate::events::{CrawlEvent, EventSink};
use crate::persist::EpisodeStore;

/// Landing page problems that leave nothing to crawl.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("landing page has no sidebar matching `{0}`")]
    MissingSidebar(String),
}

/// Why a single section was left out.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("no {what} matching `{selector}`")]
    Missing {
        what: &'static str,
        selector: String,
    },
    #[error("header {0:?} is not usable as a directory name")]
    UnusableHeader(String),
    #[error("cannot create directory for {header:?}: {message}")]
    Directory { header: String, message: String },
}

/// A table row that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Turns the landing page into sections of episode records.
pub struct LinkExtractor {
    layout: SiteLayout,
    sidebar: Selector,
    section: Selector,
    heading: Selector,
    table: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
    base_url: Option<Url>,
}

impl LinkExtractor {
    pub fn new(layout: &SiteLayout) -> Result<Self, ExtractError> {
        Ok(Self {
            layout: layout.clone(),
            sidebar: parse_selector(&layout.sidebar)?,
            section: parse_selector(&layout.section)?,
            heading: parse_selector(&layout.section_heading)?,
            table: parse_selector(&layout.section_table)?,
            row: parse_selector("tr")?,
            cell: parse_selector("td")?,
            anchor: parse_selector("a")?,
            base_url: None,
        })
    }

    /// Relative episode links are resolved against `base`.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Parse every section of the sidebar, in page order. Pure: touches no files.
    pub fn sections(
        &self,
        document: &Html,
    ) -> Result<Vec<(Result<Section, SectionError>, Vec<SkippedRow>)>, ExtractError> {
        let sidebar = document
            .select(&self.sidebar)
            .next()
            .ok_or_else(|| ExtractError::MissingSidebar(self.layout.sidebar.clone()))?;

        Ok(sidebar
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| self.section.matches(child))
            .map(|element| self.parse_section(element))
            .collect())
    }

    /// Extract all records and create one directory per usable section.
    ///
    /// A section that is malformed, or whose directory cannot be created, is
    /// reported to `sink` and left out; the others are unaffected.
    pub fn extract_links(
        &self,
        document: &Html,
        store: &EpisodeStore,
        sink: &dyn EventSink,
    ) -> Result<Vec<PodcastRecord>, ExtractError> {
        let mut records = Vec::new();
        for (index, (parsed, skipped)) in self.sections(document)?.into_iter().enumerate() {
            let section = match parsed.and_then(|section| prepare_dir(section, store)) {
                Ok(section) => section,
                Err(err) => {
                    sink.emit(CrawlEvent::SectionSkipped {
                        index,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            for SkippedRow { row, reason } in skipped {
                sink.emit(CrawlEvent::RowSkipped {
                    section: section.header.clone(),
                    row,
                    reason,
                });
            }
            sink.emit(CrawlEvent::SectionReady {
                header: section.header.clone(),
                episodes: section.episodes.len(),
            });
            records.extend(section.episodes);
        }
        Ok(records)
    }

    fn parse_section(&self, element: ElementRef) -> (Result<Section, SectionError>, Vec<SkippedRow>) {
        let Some(table) = element.select(&self.table).next() else {
            return (Err(self.missing("table", &self.layout.section_table)), Vec::new());
        };
        let Some(heading) = element.select(&self.heading).next() else {
            return (Err(self.missing("heading", &self.layout.section_heading)), Vec::new());
        };
        let raw_header = heading.text().collect::<String>();
        let Some(header) = sanitize_component(&raw_header) else {
            return (Err(SectionError::UnusableHeader(raw_header)), Vec::new());
        };

        let mut section = Section::new(header);
        let mut skipped = Vec::new();
        for (row_index, row) in table.select(&self.row).enumerate() {
            match self.parse_row(row, &section.header) {
                Ok(Some(record)) => section.episodes.push(record),
                // Header rows carry only <th> cells.
                Ok(None) => {}
                Err(reason) => skipped.push(SkippedRow {
                    row: row_index,
                    reason,
                }),
            }
        }
        (Ok(section), skipped)
    }

    fn parse_row(&self, row: ElementRef, header: &str) -> Result<Option<PodcastRecord>, String> {
        let Some(cell) = row.select(&self.cell).last() else {
            return Ok(None);
        };
        let anchor = cell
            .select(&self.anchor)
            .next()
            .ok_or_else(|| "last cell has no link".to_string())?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| "link has no href".to_string())?;
        let raw_name = clean_episode_name(&anchor.text().collect::<String>());
        let name = sanitize_component(&raw_name)
            .ok_or_else(|| format!("episode name {raw_name:?} is not usable as a file name"))?;

        Ok(Some(PodcastRecord::new(name, header, self.resolve_link(href))))
    }

    /// Absolute links pass through; relative ones are joined onto the base URL.
    /// Anything else is kept as cleaned text and fails later as an invalid URL.
    fn resolve_link(&self, href: &str) -> String {
        let link = clean_link(href);
        if Url::parse(&link).is_ok() {
            return link;
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(&link).ok())
            .map(String::from)
            .unwrap_or(link)
    }

    fn missing(&self, what: &'static str, selector: &str) -> SectionError {
        SectionError::Missing {
            what,
            selector: selector.to_string(),
        }
    }
}

fn prepare_dir(section: Section, store: &EpisodeStore) -> Result<Section, SectionError> {
    match store.ensure_section_dir(&section.header) {
        Ok(_) => Ok(section),
        Err(err) => Err(SectionError::Directory {
            header: section.header,
            message: err.to_string(),
        }),
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{err:?}"),
    })
}
