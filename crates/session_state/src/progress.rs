use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Persists the identifier of the last fully processed video.
///
/// The marker is a single-line file, overwritten on every save. Writes go
/// through a sibling temp file followed by a rename so a crash can never
/// leave a half-written marker behind.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    path: PathBuf,
}

impl ProgressTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressTracker { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last processed video identifier, or `None` if the marker
    /// has never been written.
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim().to_string();
                Ok((!id.is_empty()).then_some(id))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Durably overwrites the marker with `video_id`.
    pub fn save(&self, video_id: &str) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, video_id)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(video_id, path = ?self.path, "Progress marker updated");
        Ok(())
    }
}
