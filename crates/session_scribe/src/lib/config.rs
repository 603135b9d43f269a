use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Pipeline configuration, loaded from a JSON file.
///
/// Channels map a channel identifier to the phrase that marks a relevant
/// video title; the remaining fields steer transcription and posting.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub channels: Vec<ChannelConfig>,
    /// Spoken language the transcription is biased towards.
    #[serde(default = "default_language")]
    pub language: String,
    /// Context hint given to the transcriber for the first audio chunk.
    #[serde(default = "default_transcribe_prompt")]
    pub transcribe_prompt: String,
    /// Attach the full transcript as a file when posting a summary.
    #[serde(default)]
    pub attach_transcripts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub search_phrase: String,
}

fn default_language() -> String {
    "de".to_string()
}

fn default_transcribe_prompt() -> String {
    "Dies ist eine Aufzeichnung einer Ausschusssitzung.".to_string()
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
