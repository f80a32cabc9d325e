use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use podcast_core::PodcastRecord;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to overwrite {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Episode files laid out as `{root}/{section}/{name}.mp3`.
///
/// Writes go to a temp file in the section directory and are linked into
/// place without clobbering, so a destination either holds a complete
/// download or does not exist.
#[derive(Debug, Clone)]
pub struct EpisodeStore {
    root: PathBuf,
}

impl EpisodeStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn destination(&self, record: &PodcastRecord) -> PathBuf {
        record.destination(&self.root)
    }

    pub fn contains(&self, record: &PodcastRecord) -> bool {
        self.destination(record).is_file()
    }

    /// Create the section directory. Safe to call repeatedly and concurrently.
    pub fn ensure_section_dir(&self, header: &str) -> Result<PathBuf, PersistError> {
        let dir = self.root.join(header);
        fs::create_dir_all(&dir)?;
        if !dir.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(dir)
    }

    /// Write `content` as the record's file. Fails if the file already exists.
    pub fn save(&self, record: &PodcastRecord, content: &[u8]) -> Result<PathBuf, PersistError> {
        let dir = self.root.join(&record.section);
        if !dir.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "section directory {} does not exist",
                dir.display()
            )));
        }

        let target = self.destination(record);
        if target.exists() {
            return Err(PersistError::AlreadyExists(target));
        }

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                PersistError::AlreadyExists(target.clone())
            } else {
                PersistError::Io(e.error)
            }
        })?;
        engine_debug!("Wrote {} bytes to {:?}", content.len(), target);
        Ok(target)
    }
}
