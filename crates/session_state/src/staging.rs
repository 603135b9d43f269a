//! Staging directories for pipeline artifacts.
//!
//! Downloads and transcripts are append-only while the pipeline runs; no
//! stage ever deletes an artifact. Cleanup is an explicit, out-of-band
//! operation so that artifacts stay inspectable after a run.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use itertools::Itertools;

/// File name suffix marking a summary artifact, and the naming convention the
/// posting stage uses to discover unposted work.
pub const SUMMARY_SUFFIX: &str = "_summary.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingDir {
    Downloads,
    Transcripts,
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    downloads: PathBuf,
    transcripts: PathBuf,
}

impl StagingArea {
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        let workdir = workdir.as_ref();
        StagingArea {
            downloads: workdir.join("downloads"),
            transcripts: workdir.join("transcripts"),
        }
    }

    pub fn downloads(&self) -> &Path {
        &self.downloads
    }

    pub fn transcripts(&self) -> &Path {
        &self.transcripts
    }

    fn path_of(&self, dir: StagingDir) -> &Path {
        match dir {
            StagingDir::Downloads => &self.downloads,
            StagingDir::Transcripts => &self.transcripts,
        }
    }

    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.downloads)?;
        fs::create_dir_all(&self.transcripts)?;
        Ok(())
    }

    /// Removes both staging directories wholesale.
    pub fn wipe_all(&self) -> io::Result<()> {
        for dir in [&self.downloads, &self.transcripts] {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
                tracing::info!(path = ?dir, "Deleted staging directory");
            }
        }
        Ok(())
    }

    /// Removes the contents of one staging directory while preserving the
    /// directory itself.
    pub fn clear(&self, dir: StagingDir) -> io::Result<()> {
        let path = self.path_of(dir);
        if !path.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        tracing::info!(path = ?path, "Cleared staging directory contents");
        Ok(())
    }

    /// Summary files in the transcripts directory, sorted by name.
    pub fn summary_files(&self) -> io::Result<Vec<PathBuf>> {
        if !self.transcripts.exists() {
            return Ok(Vec::new());
        }
        let files = fs::read_dir(&self.transcripts)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(SUMMARY_SUFFIX))
            })
            .sorted()
            .collect();
        Ok(files)
    }
}

/// The transcript a summary file was produced from, per the naming
/// convention: `<stem>_summary.txt` belongs to `<stem>.txt`.
pub fn companion_transcript(summary_path: &Path) -> Option<PathBuf> {
    let name = summary_path.file_name()?.to_str()?;
    let stem = name.strip_suffix(SUMMARY_SUFFIX)?;
    Some(summary_path.with_file_name(format!("{stem}.txt")))
}

/// The summary path for a transcript, per the same convention.
pub fn summary_path_for(transcript_path: &Path) -> Option<PathBuf> {
    let stem = transcript_path.file_stem()?.to_str()?;
    Some(transcript_path.with_file_name(format!("{stem}{SUMMARY_SUFFIX}")))
}
