#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use podcast_engine::{CrawlEvent, EventSink};

/// Records every event so tests can assert on what a real run would log.
#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<CrawlEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CrawlEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Landing page with one sidebar div per `(header, rows)` entry; each row is
/// `(anchor text, href)`.
pub fn landing_page(sections: &[(Option<&str>, &[(&str, &str)])]) -> String {
    let mut html = String::from("<html><body><div id=\"sidebar\">");
    for (header, rows) in sections {
        html.push_str("<div>");
        if let Some(header) = header {
            html.push_str(&format!("<h3>{header}</h3>"));
        }
        html.push_str("<table><tr><th>#</th><th>Lecture</th></tr>");
        for (i, (text, href)) in rows.iter().enumerate() {
            html.push_str(&format!(
                "<tr><td>{i}</td><td><a href=\"{href}\">{text}</a></td></tr>"
            ));
        }
        html.push_str("</table></div>");
    }
    html.push_str("</div></body></html>");
    html
}

/// Episode page whose download link precedes the player.
pub fn episode_page(audio_href: &str) -> String {
    format!(
        r#"<html><body><div class="storycontent">
            <ul><li>Notes</li></ul>
            <p><a href="{audio_href}">Download</a></p>
            <audio class="wp-audio-player" src="{audio_href}"></audio>
        </div></body></html>"#
    )
}
