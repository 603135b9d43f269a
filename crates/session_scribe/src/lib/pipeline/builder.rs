use std::{path::PathBuf, time::Duration};

use session_state::{HandoffStore, ProgressTracker, StagingArea};

use crate::{
    config::Config,
    slack::SummaryPoster,
    yt::{AudioHandler, ChannelWatcher},
    SessionPipeline, Summarizer, Transcriber,
};

pub struct SessionPipelineBuilder<W = (), A = (), T = (), S = (), P = ()> {
    workdir: PathBuf,
    config: Config,
    watcher: W,
    audio_handler: A,
    transcriber: T,
    summarizer: S,
    poster: P,
    transcribe_budget: Option<Duration>,
}

impl SessionPipelineBuilder {
    pub fn new(workdir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            workdir: workdir.into(),
            config,
            watcher: (),
            audio_handler: (),
            transcriber: (),
            summarizer: (),
            poster: (),
            transcribe_budget: None,
        }
    }
}

impl<W, A, T, S, P> SessionPipelineBuilder<W, A, T, S, P> {
    pub fn watcher<W2: ChannelWatcher + Send + Sync + 'static>(
        self,
        watcher: W2,
    ) -> SessionPipelineBuilder<W2, A, T, S, P> {
        SessionPipelineBuilder {
            workdir: self.workdir,
            config: self.config,
            watcher,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            poster: self.poster,
            transcribe_budget: self.transcribe_budget,
        }
    }

    pub fn audio_handler<A2: AudioHandler + Send + Sync + 'static>(
        self,
        audio_handler: A2,
    ) -> SessionPipelineBuilder<W, A2, T, S, P> {
        SessionPipelineBuilder {
            workdir: self.workdir,
            config: self.config,
            watcher: self.watcher,
            audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            poster: self.poster,
            transcribe_budget: self.transcribe_budget,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> SessionPipelineBuilder<W, A, T2, S, P> {
        SessionPipelineBuilder {
            workdir: self.workdir,
            config: self.config,
            watcher: self.watcher,
            audio_handler: self.audio_handler,
            transcriber,
            summarizer: self.summarizer,
            poster: self.poster,
            transcribe_budget: self.transcribe_budget,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> SessionPipelineBuilder<W, A, T, S2, P> {
        SessionPipelineBuilder {
            workdir: self.workdir,
            config: self.config,
            watcher: self.watcher,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer,
            poster: self.poster,
            transcribe_budget: self.transcribe_budget,
        }
    }

    pub fn poster<P2: SummaryPoster + Send + Sync + 'static>(
        self,
        poster: P2,
    ) -> SessionPipelineBuilder<W, A, T, S, P2> {
        SessionPipelineBuilder {
            workdir: self.workdir,
            config: self.config,
            watcher: self.watcher,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            poster,
            transcribe_budget: self.transcribe_budget,
        }
    }

    pub fn transcribe_budget(mut self, budget: Duration) -> Self {
        self.transcribe_budget = Some(budget);
        self
    }
}

impl<W, A, T, S, P> SessionPipelineBuilder<W, A, T, S, P>
where
    W: ChannelWatcher + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    P: SummaryPoster + Send + Sync + 'static,
{
    pub fn build(self) -> SessionPipeline<W, A, T, S, P> {
        let progress = ProgressTracker::new(self.workdir.join(super::MARKER_FILE));
        let handoffs = HandoffStore::new(&self.workdir);
        let staging = StagingArea::new(&self.workdir);

        SessionPipeline {
            config: self.config,
            transcribe_budget: self.transcribe_budget,
            watcher: self.watcher,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            poster: self.poster,
            progress,
            handoffs,
            staging,
        }
    }
}
