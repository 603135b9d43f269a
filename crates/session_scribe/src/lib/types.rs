use serde::Deserialize;

/// A newly discovered video that has not yet been confirmed processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub url: String,
}

/// What a pipeline run (or one stage of it) accomplished.
///
/// `NoNewWork` is a normal completion, reported distinctly so schedulers can
/// skip downstream stages instead of running them over stale inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NewWork,
    NoNewWork,
}

impl RunOutcome {
    pub fn new_work(self) -> bool {
        matches!(self, RunOutcome::NewWork)
    }
}

/// `yt-dlp --flat-playlist --dump-single-json` output for a channel page.
#[derive(Debug, Deserialize)]
pub struct ChannelDump {
    #[serde(default)]
    pub entries: Vec<FlatEntry>,
}

/// One flat playlist entry. Only the fields the watcher needs; everything
/// else in the dump is ignored.
#[derive(Debug, Deserialize)]
pub struct FlatEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
