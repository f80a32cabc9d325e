use std::collections::BTreeMap;
use std::fmt;

use crate::{EpisodeOutcome, EpisodeReport, FailureKind, PodcastRecord};

/// Aggregate of every episode outcome in one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub scheduled: usize,
    pub saved: usize,
    pub bytes_saved: u64,
    pub skipped_existing: usize,
    pub skipped_content_type: usize,
    pub failures: Vec<(PodcastRecord, FailureKind)>,
}

impl RunSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a EpisodeReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(report);
        }
        summary
    }

    pub fn record(&mut self, report: &EpisodeReport) {
        self.scheduled += 1;
        match &report.outcome {
            EpisodeOutcome::Saved { bytes, .. } => {
                self.saved += 1;
                self.bytes_saved += bytes;
            }
            EpisodeOutcome::SkippedExisting => self.skipped_existing += 1,
            EpisodeOutcome::SkippedContentType { .. } => self.skipped_content_type += 1,
            EpisodeOutcome::Failed(kind) => {
                self.failures.push((report.record.clone(), kind.clone()));
            }
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failure counts keyed by the failure's display text, sorted.
    pub fn failures_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (_, kind) in &self.failures {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished downloading! episodes={} saved={} ({} bytes) already_present={} not_audio={} failed={}",
            self.scheduled,
            self.saved,
            self.bytes_saved,
            self.skipped_existing,
            self.skipped_content_type,
            self.failed()
        )?;
        for (kind, count) in self.failures_by_kind() {
            write!(f, "\n  {kind}: {count}")?;
        }
        Ok(())
    }
}
