use std::sync::{Arc, Mutex};

use session_scribe::{config::ChannelConfig, types::VideoCandidate, yt::ChannelWatcher};

#[derive(Clone, Default)]
pub struct MockWatcher {
    pub candidate: Option<VideoCandidate>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockWatcher {
    pub fn returning(candidate: VideoCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl ChannelWatcher for MockWatcher {
    const CHANNEL_BASE_URL: &str = "https://youtube.example/channel";
    type Error = anyhow::Error;

    async fn latest_matching(
        &self,
        channel: &ChannelConfig,
    ) -> anyhow::Result<Option<VideoCandidate>> {
        self.calls.lock().unwrap().push(channel.channel_id.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.candidate.clone())
    }
}
