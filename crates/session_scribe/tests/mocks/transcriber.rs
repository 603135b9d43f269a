use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use session_scribe::{TranscribeRequest, TranscribeResponse, Transcriber, TranscriptOutcome};

#[derive(Clone, Default)]
pub struct MockTranscriber {
    pub response_text: String,
    pub calls: Arc<Mutex<Vec<TranscribeRequest>>>,
    pub fail_with: Option<String>,
    /// Sleep long enough that only a budget cancellation ends the call.
    pub hang: bool,
    /// Report a timed-out outcome carrying this partial text.
    pub timeout_with_partial: Option<Option<String>>,
}

impl MockTranscriber {
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn timing_out_with(partial: Option<&str>) -> Self {
        Self {
            timeout_with_partial: Some(partial.map(str::to_string)),
            ..Default::default()
        }
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-whisper";
    type Error = anyhow::Error;

    async fn transcribe(&self, request: TranscribeRequest) -> anyhow::Result<TranscriptOutcome> {
        self.calls.lock().unwrap().push(request);

        if self.hang {
            tokio::time::sleep(Duration::from_secs(600)).await;
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        if let Some(ref partial) = self.timeout_with_partial {
            return Ok(TranscriptOutcome::TimedOut {
                partial: partial.clone(),
            });
        }

        Ok(TranscriptOutcome::Completed(TranscribeResponse {
            duration: 120.0,
            text: self.response_text.clone(),
            segments: None,
        }))
    }
}
