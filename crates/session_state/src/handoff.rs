use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Field separator inside a handoff line. Neither the artifact path nor the
/// metadata may contain it; [`HandoffStore::append`] enforces this.
pub const RECORD_DELIMITER: char = '|';

/// One unit of pending work handed from a producing stage to the consuming
/// stage's (possibly much later) invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub artifact_path: PathBuf,
    pub metadata: Option<String>,
}

impl HandoffRecord {
    pub fn new(artifact_path: impl Into<PathBuf>, metadata: Option<String>) -> Self {
        HandoffRecord {
            artifact_path: artifact_path.into(),
            metadata,
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{}{}{}",
            self.artifact_path.display(),
            RECORD_DELIMITER,
            self.metadata.as_deref().unwrap_or_default()
        )
    }

    fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match line.split_once(RECORD_DELIMITER) {
            Some((path, metadata)) => Some(HandoffRecord {
                artifact_path: PathBuf::from(path),
                metadata: (!metadata.is_empty()).then(|| metadata.to_string()),
            }),
            None => Some(HandoffRecord {
                artifact_path: PathBuf::from(line),
                metadata: None,
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("artifact path contains the record delimiter '{RECORD_DELIMITER}': {0}")]
    DelimiterInPath(String),
    #[error("metadata contains the record delimiter '{RECORD_DELIMITER}': {0}")]
    DelimiterInMetadata(String),
}

/// Line-oriented store of [`HandoffRecord`]s, one named file per stage
/// transition, rooted in the pipeline's working directory.
///
/// A handoff file exists exactly while there is unconsumed work. Its absence
/// does not distinguish "nothing was ever produced" from "already consumed";
/// consumers treat both as a clean no-op.
#[derive(Debug, Clone)]
pub struct HandoffStore {
    dir: PathBuf,
}

impl HandoffStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HandoffStore { dir: dir.into() }
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.txt"))
    }

    /// Appends one pending-work record to the named handoff file, creating
    /// the file if needed.
    pub fn append(&self, name: &str, record: &HandoffRecord) -> Result<(), HandoffError> {
        let path_repr = record.artifact_path.display().to_string();
        if path_repr.contains(RECORD_DELIMITER) {
            return Err(HandoffError::DelimiterInPath(path_repr));
        }
        if let Some(metadata) = record.metadata.as_deref() {
            if metadata.contains(RECORD_DELIMITER) {
                return Err(HandoffError::DelimiterInMetadata(metadata.to_string()));
            }
        }

        fs::create_dir_all(&self.dir)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(name))?;
        writeln!(file, "{}", record.to_line())?;
        tracing::debug!(handoff = name, path = %path_repr, "Handoff record appended");
        Ok(())
    }

    /// Reads all pending records and deletes the file.
    ///
    /// Read-and-delete is one logical operation: if the consumer crashes
    /// after draining but before finishing its work, the drained records are
    /// lost. Draining a missing or empty file yields an empty list.
    pub fn drain(&self, name: &str) -> Result<Vec<HandoffRecord>, HandoffError> {
        let path = self.file_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records: Vec<HandoffRecord> =
            contents.lines().filter_map(HandoffRecord::from_line).collect();
        fs::remove_file(&path)?;
        tracing::debug!(handoff = name, count = records.len(), "Handoff records drained");
        Ok(records)
    }

    /// True when the named handoff holds no pending work.
    pub fn is_empty(&self, name: &str) -> bool {
        match fs::metadata(self.file_path(name)) {
            Ok(metadata) => metadata.len() == 0,
            Err(_) => true,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
