use podcast_core::clean_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SiteLayout;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("no content container matching `{0}`")]
    MissingContainer(String),
    #[error("no audio player matching `{0}` inside the content container")]
    MissingMarker(String),
    #[error("no link in the paragraph before the audio player")]
    MissingLink,
    #[error("audio link {href:?} is not a valid url: {message}")]
    InvalidLink { href: String, message: String },
}

/// Finds the canonical audio URL on a parsed episode page.
pub trait AudioUrlResolver: Send + Sync {
    fn resolve(&self, page: &Html, page_url: &Url) -> Result<Url, ResolveError>;
}

/// Reads the first link of the closest paragraph preceding the audio player.
///
/// The player's own `src` is ignored; the archive's download link is the
/// canonical one. The href is percent-decoded, stripped of spaces, and
/// resolved against the episode page URL.
#[derive(Debug)]
pub struct PlayerLinkResolver {
    container_selector: String,
    marker_selector: String,
    container: Selector,
    marker: Selector,
    paragraph: Selector,
    anchor: Selector,
}

impl PlayerLinkResolver {
    pub fn new(layout: &SiteLayout) -> Result<Self, ResolveError> {
        Ok(Self {
            container_selector: layout.content_container.clone(),
            marker_selector: layout.audio_marker.clone(),
            container: parse_selector(&layout.content_container)?,
            marker: parse_selector(&layout.audio_marker)?,
            paragraph: parse_selector("p")?,
            anchor: parse_selector("a[href]")?,
        })
    }

    /// Closest `<p>` before `marker` in document order, ancestors included.
    fn preceding_paragraph<'a>(
        &self,
        container: ElementRef<'a>,
        marker: ElementRef<'a>,
    ) -> Option<ElementRef<'a>> {
        let mut last = None;
        for node in container.descendants() {
            if node.id() == marker.id() {
                break;
            }
            if let Some(element) = ElementRef::wrap(node) {
                if self.paragraph.matches(&element) {
                    last = Some(element);
                }
            }
        }
        last
    }
}

impl AudioUrlResolver for PlayerLinkResolver {
    fn resolve(&self, page: &Html, page_url: &Url) -> Result<Url, ResolveError> {
        let container = page
            .select(&self.container)
            .next()
            .ok_or_else(|| ResolveError::MissingContainer(self.container_selector.clone()))?;
        let marker = container
            .select(&self.marker)
            .next()
            .ok_or_else(|| ResolveError::MissingMarker(self.marker_selector.clone()))?;
        let href = self
            .preceding_paragraph(container, marker)
            .and_then(|p| p.select(&self.anchor).next())
            .and_then(|a| a.value().attr("href"))
            .ok_or(ResolveError::MissingLink)?;

        let link = clean_link(href);
        Url::parse(&link)
            .or_else(|_| page_url.join(&link))
            .map_err(|err| ResolveError::InvalidLink {
                href: href.to_string(),
                message: err.to_string(),
            })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ResolveError> {
    Selector::parse(selector).map_err(|err| ResolveError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{err:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(html: &str) -> Result<Url, ResolveError> {
        let resolver = PlayerLinkResolver::new(&SiteLayout::default()).unwrap();
        let page_url = Url::parse("https://archive.example/genesis/lecture-1/").unwrap();
        resolver.resolve(&Html::parse_document(html), &page_url)
    }

    #[test]
    fn link_before_player_is_decoded_and_despaced() {
        let html = r#"<div class="storycontent">
            <ul><li>notes</li></ul>
            <p><a href="https://cdn.example/Genesis%20Lecture%201.mp3">Download</a></p>
            <audio class="wp-audio-player" src="https://player.example/ignored.mp3"></audio>
        </div>"#;
        assert_eq!(
            resolve(html).unwrap().as_str(),
            "https://cdn.example/GenesisLecture1.mp3"
        );
    }

    #[test]
    fn nearest_paragraph_wins_over_earlier_ones() {
        let html = r#"<div class="storycontent">
            <p><a href="https://cdn.example/old.mp3">Old</a></p>
            <p><a href="/audio/new.mp3">New</a></p>
            <audio class="wp-audio-player"></audio>
            <p><a href="https://cdn.example/after.mp3">After</a></p>
        </div>"#;
        assert_eq!(
            resolve(html).unwrap().as_str(),
            "https://archive.example/audio/new.mp3"
        );
    }

    #[test]
    fn missing_container_and_marker_are_distinct() {
        assert_eq!(
            resolve("<div class=\"other\"></div>").unwrap_err(),
            ResolveError::MissingContainer("div.storycontent".into())
        );
        assert_eq!(
            resolve("<div class=\"storycontent\"><p><a href=\"x\">x</a></p></div>").unwrap_err(),
            ResolveError::MissingMarker("audio.wp-audio-player".into())
        );
    }

    #[test]
    fn paragraph_without_link_is_reported() {
        let html = r#"<div class="storycontent">
            <p>No link here</p>
            <audio class="wp-audio-player"></audio>
        </div>"#;
        assert_eq!(resolve(html).unwrap_err(), ResolveError::MissingLink);
    }
}
