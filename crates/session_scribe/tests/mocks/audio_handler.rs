use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use session_scribe::{types::VideoCandidate, yt::AudioHandler};

/// Writes a real (fake-content) audio file into the downloads directory so
/// downstream stages see an artifact on disk.
#[derive(Clone, Default)]
pub struct MockAudioHandler {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    pub trim_fail_with: Option<String>,
}

impl MockAudioHandler {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_failing_trim(msg: &str) -> Self {
        Self {
            trim_fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl AudioHandler for MockAudioHandler {
    fn download(
        &self,
        candidate: &VideoCandidate,
        downloads_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.calls.lock().unwrap().push(candidate.video_id.clone());

        let path = downloads_dir.join(format!("{}.mp3", candidate.video_id));
        std::fs::write(&path, b"mock audio")?;
        Ok(path)
    }

    fn trim_silence(&self, _audio_path: &Path) -> anyhow::Result<()> {
        if let Some(ref msg) = self.trim_fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(())
    }
}
