use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;

use crate::{
    media::{AudioProcessor, Ffmpeg},
    types::VideoCandidate,
    yt::AudioHandler,
};

/// Audio handler shelling out to `yt-dlp` for the download and to ffmpeg for
/// the in-place silence trim.
#[derive(Debug, Clone)]
pub struct YtDlpAudioHandler {
    bin: PathBuf,
    cookies: Option<PathBuf>,
    ffmpeg: Ffmpeg,
}

impl YtDlpAudioHandler {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        YtDlpAudioHandler {
            bin: "yt-dlp".into(),
            cookies: None,
            ffmpeg,
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }
}

impl AudioHandler for YtDlpAudioHandler {
    fn download(
        &self,
        candidate: &VideoCandidate,
        downloads_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let base_name = &candidate.video_id;
        let output_template = downloads_dir.join(format!("{base_name}.%(ext)s"));
        let audio_mp3_path = downloads_dir.join(format!("{base_name}.mp3"));

        // download audio if needed
        if audio_mp3_path.exists() {
            tracing::debug!("Audio already exists at {}", audio_mp3_path.display());
            return Ok(audio_mp3_path);
        }

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-f")
            .arg("bestaudio[ext=m4a]/bestaudio")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("192K")
            .arg("-o")
            .arg(&output_template);
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(&candidate.url);

        tracing::info!(video_id = %candidate.video_id, "Starting download");
        let output = cmd.output().context("Failed to spawn yt-dlp")?;
        if !output.status.success() {
            anyhow::bail!(
                "Failed to download audio for {}: {}",
                candidate.video_id,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        if !audio_mp3_path.exists() {
            anyhow::bail!(
                "yt-dlp did not produce expected file: {}",
                audio_mp3_path.display()
            );
        }
        tracing::info!(path = ?audio_mp3_path, "Download completed");
        Ok(audio_mp3_path)
    }

    fn trim_silence(&self, audio_path: &Path) -> anyhow::Result<()> {
        let file_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid audio path: {}", audio_path.display()))?;
        let trimmed_path = audio_path.with_file_name(format!("trimmed_{file_name}"));

        self.ffmpeg.trim_silence(audio_path, &trimmed_path)?;

        // the trimmed file replaces the original at the same path
        std::fs::rename(&trimmed_path, audio_path).with_context(|| {
            format!(
                "Failed to replace {} with its trimmed version",
                audio_path.display()
            )
        })?;
        tracing::info!(path = ?audio_path, "Silence trimmed");
        Ok(())
    }
}
