use std::{borrow::Cow, path::PathBuf, time::Instant};

use reqwest::Client;
use serde::Deserialize;

use crate::{
    media::AudioProcessor, Summarizer, SummaryResponse, TranscribeRequest, TranscribeResponse,
    Transcriber, TranscriptOutcome,
};

pub struct OpenAIClient<F: AudioProcessor> {
    client: Client,
    api_key: String,
    ffmpeg: F,
    base_url: String,
}

impl<F: AudioProcessor + Clone> Clone for OpenAIClient<F> {
    fn clone(&self) -> Self {
        OpenAIClient {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            ffmpeg: self.ffmpeg.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl<F: AudioProcessor> OpenAIClient<F> {
    const SYSTEM_PROMPT: &str = include_str!("./prompts/system_0.txt");
    const USER_PROMPT: &str = "Erstelle eine detaillierte Zusammenfassung des Transcriptes. Sollte das CityLAB Berlin wörtlich erwähnt werden, weise darauf hin. Beginne mit einer kurzen Aufzählung der besprochenen Themen. Diese Aufzählung sollte vollständig sein.";
    const CHUNK_DURATION_SECONDS: u16 = 900;

    pub fn new(api_key: impl Into<String>, ffmpeg: F) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
            ffmpeg,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub async fn send_transcribe_request(
        &self,
        file: impl Into<PathBuf>,
        model_name: impl Into<String>,
        language: &str,
        prompt: Option<String>,
    ) -> Result<TranscribeResponse, OpenAIError> {
        let audio_path = file.into();

        let bytes = tokio::fs::read(&audio_path).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("chunk.mp3")
            .mime_str("audio/mpeg")
            .unwrap();

        let mut form = reqwest::multipart::Form::new()
            .text("model", model_name.into())
            .text("language", language.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", part);

        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt);
        }

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        let response = resp.json::<TranscribeResponse>().await?;

        Ok(response)
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": model_name.into(),
            "max_tokens": 4000,
            "temperature": 0.7,
            "messages": [
                {
                    "role": "system",
                    "content": Self::SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl<F: AudioProcessor + Send + Sync> Transcriber for OpenAIClient<F> {
    const TRANSCRIBER_MODEL: &'static str = "whisper-1";
    type Error = OpenAIError;

    async fn transcribe(&self, request: TranscribeRequest) -> Result<TranscriptOutcome, OpenAIError> {
        let TranscribeRequest {
            audio_path,
            language,
            initial_prompt,
            deadline,
        } = request;

        let base_name = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| OpenAIError::Ffmpeg("Invalid file path".into()))?;
        let chunks_dir_path = audio_path.with_file_name(format!("{base_name}_chunks"));

        let chunks_exist = std::fs::read_dir(&chunks_dir_path)
            .map(|mut entries| entries.any(|e| e.is_ok()))
            .unwrap_or(false);

        // chunk via ffmpeg if not already done
        if !chunks_exist {
            std::fs::create_dir_all(&chunks_dir_path)?;
            tracing::info!("Splitting audio to chunks");
            self.ffmpeg
                .split_audio_to_chunks(
                    &audio_path,
                    Self::CHUNK_DURATION_SECONDS,
                    chunks_dir_path.join(format!("{base_name}_%03d.mp3")),
                )
                .inspect_err(|e| tracing::error!(error = %e, "Failed to split audio to chunks"))
                .map_err(|e| OpenAIError::Ffmpeg(e.to_string()))?;
        }

        // collect and sort chunk files
        let mut chunks: Vec<PathBuf> = std::fs::read_dir(&chunks_dir_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        chunks.sort();

        let started = Instant::now();
        let mut all_segments = Vec::new();
        let mut all_text = String::new();
        let mut time_offset = 0.0_f64;
        let mut duration = 0.0_f64;
        let mut previous_text = initial_prompt;

        for chunk in &chunks {
            if let Some(budget) = deadline {
                if started.elapsed() >= budget {
                    tracing::warn!(
                        budget_secs = budget.as_secs(),
                        "Transcription budget exhausted before all chunks were processed"
                    );
                    let text = all_text.trim();
                    let partial = (!text.is_empty()).then(|| text.to_string());
                    return Ok(TranscriptOutcome::TimedOut { partial });
                }
            }

            let response = self
                .send_transcribe_request(chunk, Self::TRANSCRIBER_MODEL, &language, previous_text)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Failed to transcribe audio"))?;

            duration += response.duration;

            if let Some(segments) = response.segments {
                for mut seg in segments {
                    seg.start += time_offset;
                    seg.end += time_offset;
                    all_segments.push(seg);
                }
            }

            all_text.push_str(&response.text);
            all_text.push(' ');
            previous_text = Some(response.text);
            time_offset += Self::CHUNK_DURATION_SECONDS as f64;
        }

        Ok(TranscriptOutcome::Completed(TranscribeResponse {
            duration,
            text: all_text.trim().to_string(),
            segments: Some(all_segments),
        }))
    }
}

impl<F: AudioProcessor + Send + Sync> Summarizer for OpenAIClient<F> {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";
    type Error = OpenAIError;

    async fn summarize(&self, transcript: &str) -> Result<SummaryResponse, OpenAIError> {
        let transcript = clamp_to_context_window(transcript, Self::CONTEXT_WINDOW_LIMIT);
        let user_content = format!("{}\n\n{}", Self::USER_PROMPT, transcript);

        let response = self
            .send_completion_request(Self::SUMMARIZER_MODEL, user_content)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| OpenAIError::Api {
                status: 0,
                message: "No content in response".into(),
            })?;

        Ok(SummaryResponse {
            summary: summary.trim().to_string(),
        })
    }
}

/// Truncates `transcript` so its token count stays within `limit`.
///
/// The cut is proportional by characters rather than token-exact; the tail of
/// an over-long session is the least useful part for the topic overview.
fn clamp_to_context_window(transcript: &str, limit: usize) -> Cow<'_, str> {
    let bpe = match tiktoken_rs::cl100k_base() {
        Ok(bpe) => bpe,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load tokenizer, skipping context window check");
            return Cow::Borrowed(transcript);
        }
    };

    let token_count = bpe.encode_with_special_tokens(transcript).len();
    if token_count <= limit {
        return Cow::Borrowed(transcript);
    }

    let keep_chars = transcript.chars().count() * limit / token_count;
    tracing::warn!(
        token_count,
        limit,
        keep_chars,
        "Transcript exceeds the model context window, truncating"
    );
    Cow::Owned(transcript.chars().take(keep_chars).collect())
}
