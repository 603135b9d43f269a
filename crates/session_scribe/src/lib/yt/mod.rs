pub mod audio_handler;
pub mod watcher;

use std::{
    fmt::Debug,
    future::Future,
    path::{Path, PathBuf},
};

use crate::{config::ChannelConfig, types::VideoCandidate};

/// Queries a monitored channel for the most recent video whose title contains
/// the channel's search phrase. Pure read; no state is touched.
pub trait ChannelWatcher {
    const CHANNEL_BASE_URL: &str;

    type Error: Debug;

    fn latest_matching(
        &self,
        channel: &ChannelConfig,
    ) -> impl Future<Output = Result<Option<VideoCandidate>, Self::Error>> + Send;
}

/// Fetches a candidate's audio into the downloads staging directory and trims
/// silence from it in place.
pub trait AudioHandler {
    fn download(&self, candidate: &VideoCandidate, downloads_dir: &Path)
        -> anyhow::Result<PathBuf>;

    fn trim_silence(&self, audio_path: &Path) -> anyhow::Result<()>;
}
