//! External media tooling behind a narrow seam.
//!
//! Everything ffmpeg-shaped goes through [`AudioProcessor`] so the pipeline
//! and the transcription client can be exercised without the binary present.

use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output},
};

/// Double-ended silence trim: cut leading silence, reverse, cut again,
/// reverse back. Signal below -50 dBFS sustained for at least 0.3s counts
/// as silence.
const SILENCE_FILTER: &str = "silenceremove=start_periods=1:start_threshold=-50dB:start_silence=0.3,areverse,silenceremove=start_periods=1:start_threshold=-50dB:start_silence=0.3,areverse";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
    #[error("expected output file was not produced: {0}")]
    MissingOutput(PathBuf),
}

pub trait AudioProcessor {
    fn trim_silence(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(), MediaError>;

    fn split_audio_to_chunks(
        &self,
        input: impl AsRef<Path>,
        chunk_duration_seconds: u16,
        output_template: impl AsRef<Path>,
    ) -> Result<(), MediaError>;
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    bin: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Ffmpeg::new()
    }
}

impl Ffmpeg {
    pub fn new() -> Self {
        Ffmpeg { bin: "ffmpeg".into() }
    }

    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Ffmpeg { bin: bin.into() }
    }

    fn check(output: Output) -> Result<(), MediaError> {
        if !output.status.success() {
            return Err(MediaError::CommandFailed {
                tool: "ffmpeg",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl AudioProcessor for Ffmpeg {
    fn trim_silence(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(), MediaError> {
        let output_path = output.as_ref();
        let result = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(input.as_ref())
            .arg("-af")
            .arg(SILENCE_FILTER)
            .arg("-c:a")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg("2")
            .arg(output_path)
            .output()?;
        Self::check(result)?;
        if !output_path.exists() {
            return Err(MediaError::MissingOutput(output_path.to_path_buf()));
        }
        Ok(())
    }

    fn split_audio_to_chunks(
        &self,
        input: impl AsRef<Path>,
        chunk_duration_seconds: u16,
        output_template: impl AsRef<Path>,
    ) -> Result<(), MediaError> {
        let result = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(input.as_ref())
            .arg("-f")
            .arg("segment")
            .arg("-segment_time")
            .arg(chunk_duration_seconds.to_string())
            .arg("-c")
            .arg("copy")
            .arg(output_template.as_ref())
            .output()?;
        Self::check(result)
    }
}
