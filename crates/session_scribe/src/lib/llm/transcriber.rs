use std::{fmt::Debug, future::Future, path::PathBuf, time::Duration};

use serde::Deserialize;

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    type Error: Debug;

    fn transcribe(
        &self,
        request: TranscribeRequest,
    ) -> impl Future<Output = Result<TranscriptOutcome, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio_path: PathBuf,
    /// Spoken language to bias recognition towards.
    pub language: String,
    /// Context hint for the first stretch of audio.
    pub initial_prompt: Option<String>,
    /// Wall-clock budget. Implementations should stop at a clean boundary
    /// once it is exhausted and report what they have as partial text.
    pub deadline: Option<Duration>,
}

/// A transcription that ran out of budget is a normal outcome, not an error:
/// it produced no full transcript, possibly some partial text.
#[derive(Debug)]
pub enum TranscriptOutcome {
    Completed(TranscribeResponse),
    TimedOut { partial: Option<String> },
}

#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub duration: f64,
    pub text: String,
    pub segments: Option<Vec<TranscribeSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
