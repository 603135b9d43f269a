use std::path::PathBuf;

use tokio::process::Command;

use crate::{
    config::ChannelConfig,
    error::Error,
    types::{ChannelDump, FlatEntry, VideoCandidate},
    yt::ChannelWatcher,
};

/// Channel watcher backed by `yt-dlp`'s flat playlist extraction.
///
/// The channel's /videos page is dumped as a single JSON document; entries
/// arrive newest-first, so the first title match is the latest candidate.
#[derive(Debug, Clone)]
pub struct YtDlpWatcher {
    bin: PathBuf,
    cookies: Option<PathBuf>,
}

impl Default for YtDlpWatcher {
    fn default() -> Self {
        YtDlpWatcher::new()
    }
}

impl YtDlpWatcher {
    pub fn new() -> Self {
        YtDlpWatcher {
            bin: "yt-dlp".into(),
            cookies: None,
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }

    async fn dump_channel(&self, channel_url: &str) -> Result<ChannelDump, Error> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--quiet")
            .arg("--flat-playlist")
            .arg("--dump-single-json");
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(channel_url);

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(Error::YtDlp {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn candidate_from_entry(entry: FlatEntry) -> VideoCandidate {
    let url = entry
        .url
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id));
    VideoCandidate {
        video_id: entry.id,
        title: entry.title.unwrap_or_default(),
        url,
    }
}

/// First (newest) entry whose title contains `phrase`, case-insensitively.
fn find_latest_matching(dump: ChannelDump, phrase: &str) -> Option<VideoCandidate> {
    let phrase = phrase.to_lowercase();
    dump.entries
        .into_iter()
        .find(|entry| {
            entry
                .title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(&phrase))
        })
        .map(candidate_from_entry)
}

impl ChannelWatcher for YtDlpWatcher {
    const CHANNEL_BASE_URL: &str = "https://www.youtube.com/channel";

    type Error = Error;

    async fn latest_matching(
        &self,
        channel: &ChannelConfig,
    ) -> Result<Option<VideoCandidate>, Error> {
        let channel_url = format!(
            "{}/{}/videos",
            Self::CHANNEL_BASE_URL,
            channel.channel_id
        );
        let dump = self.dump_channel(&channel_url).await?;
        Ok(find_latest_matching(dump, &channel.search_phrase))
    }
}
