pub mod builder;

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context;
use session_state::{staging, HandoffRecord, HandoffStore, ProgressTracker, StagingArea};

use crate::{
    config::Config,
    slack::SummaryPoster,
    types::RunOutcome,
    yt::{AudioHandler, ChannelWatcher},
    Summarizer, TranscribeRequest, Transcriber, TranscriptOutcome,
};

/// Progress marker file name, relative to the working directory.
pub const MARKER_FILE: &str = "last-video.txt";

/// Handoff carrying downloaded audio awaiting transcription.
const PENDING_TRANSCRIPTION: &str = "pending-transcription";
/// Handoff carrying transcripts awaiting summarization.
const PENDING_SUMMARY: &str = "pending-summary";

/// Grace on top of the transcription budget before a transcriber that does
/// not honor its deadline is force-cancelled.
const BUDGET_GRACE: Duration = Duration::from_secs(1);

/// The pipeline orchestrator.
///
/// Each stage is an independently invocable method; stages communicate only
/// through the handoff store and the staging directories, so chaining them in
/// one process via [`SessionPipeline::run`] behaves exactly like running each
/// stage as its own process invocation at a later time.
pub struct SessionPipeline<W, A, T, S, P>
where
    W: ChannelWatcher + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    P: SummaryPoster + Send + Sync + 'static,
{
    config: Config,
    transcribe_budget: Option<Duration>,
    watcher: W,
    audio_handler: A,
    transcriber: T,
    summarizer: S,
    poster: P,
    progress: ProgressTracker,
    handoffs: HandoffStore,
    staging: StagingArea,
}

impl<W, A, T, S, P> SessionPipeline<W, A, T, S, P>
where
    W: ChannelWatcher + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    P: SummaryPoster + Send + Sync + 'static,
{
    /// Searches every configured channel for its latest matching video and
    /// stages the audio of each video not seen before.
    ///
    /// The progress marker is updated per candidate once its audio is on disk
    /// and the transcription handoff is written; from that point the video is
    /// recoverable from staged artifacts and never re-fetched.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self) -> anyhow::Result<RunOutcome> {
        self.staging
            .ensure()
            .context("Failed to create staging directories")?;

        let mut new_work = false;

        for channel in &self.config.channels {
            tracing::info!(
                channel = %channel.channel_id,
                phrase = %channel.search_phrase,
                "Searching channel for matching videos"
            );

            let candidate = self
                .watcher
                .latest_matching(channel)
                .await
                .map_err(|e| {
                    anyhow::anyhow!("Failed to query channel {}: {e:?}", channel.channel_id)
                })?;

            let Some(candidate) = candidate else {
                tracing::info!(channel = %channel.channel_id, "No videos matching the search phrase");
                continue;
            };

            let last_processed = self
                .progress
                .load()
                .context("Failed to read progress marker")?;
            if last_processed.as_deref() == Some(candidate.video_id.as_str()) {
                tracing::info!(
                    video_id = %candidate.video_id,
                    title = %candidate.title,
                    "Video has already been processed, skipping"
                );
                continue;
            }

            tracing::info!(video_id = %candidate.video_id, title = %candidate.title, "Found new video");

            let audio_path = self
                .audio_handler
                .download(&candidate, self.staging.downloads())?;

            if let Err(e) = self.audio_handler.trim_silence(&audio_path) {
                tracing::warn!(
                    error = ?e,
                    path = ?audio_path,
                    "Silence trimming failed, keeping the untrimmed audio"
                );
            }

            self.handoffs
                .append(
                    PENDING_TRANSCRIPTION,
                    &HandoffRecord::new(&audio_path, Some(candidate.url.clone())),
                )
                .context("Failed to record transcription handoff")?;
            self.progress
                .save(&candidate.video_id)
                .context("Failed to update progress marker")?;

            tracing::info!(video_id = %candidate.video_id, "Audio staged for transcription");
            new_work = true;
        }

        Ok(outcome(new_work))
    }

    /// Transcribes every audio artifact pending in the handoff.
    ///
    /// A missing artifact is logged and skipped; the remaining records are
    /// still processed. A transcription that exhausts its budget produces no
    /// handoff for the summarize stage, only an optional partial text file.
    #[tracing::instrument(skip(self))]
    pub async fn transcribe(&self) -> anyhow::Result<RunOutcome> {
        let records = self
            .handoffs
            .drain(PENDING_TRANSCRIPTION)
            .context("Failed to drain transcription handoff")?;
        if records.is_empty() {
            tracing::info!("No audio awaiting transcription");
            return Ok(RunOutcome::NoNewWork);
        }

        self.staging
            .ensure()
            .context("Failed to create staging directories")?;

        let mut new_work = false;

        for record in records {
            let audio_path = &record.artifact_path;
            if !audio_path.exists() {
                tracing::error!(path = ?audio_path, "Audio file from handoff record is missing, skipping");
                continue;
            }

            tracing::info!(path = ?audio_path, "Transcribing audio");
            let started = Instant::now();
            let request = TranscribeRequest {
                audio_path: audio_path.clone(),
                language: self.config.language.clone(),
                initial_prompt: Some(self.config.transcribe_prompt.clone()),
                deadline: self.transcribe_budget,
            };

            let outcome_for_record = self
                .transcribe_with_budget(request)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to transcribe {}: {e:?}", audio_path.display()))?;

            match outcome_for_record {
                TranscriptOutcome::Completed(response) => {
                    let transcript_path = self.transcript_path_for(audio_path)?;
                    std::fs::write(&transcript_path, &response.text).with_context(|| {
                        format!("Failed to write transcript {}", transcript_path.display())
                    })?;

                    let elapsed = started.elapsed().as_secs();
                    tracing::info!(
                        path = ?transcript_path,
                        elapsed_secs = elapsed,
                        audio_duration_secs = response.duration,
                        "Transcription completed"
                    );

                    self.handoffs
                        .append(
                            PENDING_SUMMARY,
                            &HandoffRecord::new(&transcript_path, record.metadata.clone()),
                        )
                        .context("Failed to record summary handoff")?;
                    new_work = true;
                }
                TranscriptOutcome::TimedOut { partial } => {
                    tracing::warn!(
                        path = ?audio_path,
                        "Transcription did not complete within the time budget"
                    );
                    if let Some(text) = partial.filter(|text| !text.is_empty()) {
                        let partial_path = self.partial_transcript_path_for(audio_path)?;
                        std::fs::write(&partial_path, text).with_context(|| {
                            format!("Failed to write partial transcript {}", partial_path.display())
                        })?;
                        tracing::info!(path = ?partial_path, "Partial transcription saved");
                    }
                }
            }
        }

        Ok(outcome(new_work))
    }

    async fn transcribe_with_budget(
        &self,
        request: TranscribeRequest,
    ) -> Result<TranscriptOutcome, T::Error> {
        match self.transcribe_budget {
            Some(budget) => {
                match tokio::time::timeout(
                    budget + BUDGET_GRACE,
                    self.transcriber.transcribe(request),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            budget_secs = budget.as_secs(),
                            "Transcriber exceeded its budget and was cancelled"
                        );
                        Ok(TranscriptOutcome::TimedOut { partial: None })
                    }
                }
            }
            None => self.transcriber.transcribe(request).await,
        }
    }

    /// Summarizes every transcript pending in the handoff, writing each
    /// summary next to its transcript with the source URL appended so the
    /// file is self-contained for posting.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self) -> anyhow::Result<RunOutcome> {
        let records = self
            .handoffs
            .drain(PENDING_SUMMARY)
            .context("Failed to drain summary handoff")?;
        if records.is_empty() {
            tracing::info!("No transcripts awaiting summarization");
            return Ok(RunOutcome::NoNewWork);
        }

        let mut new_work = false;

        for record in records {
            let transcript_path = &record.artifact_path;
            let transcript = match std::fs::read_to_string(transcript_path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        path = ?transcript_path,
                        "Transcript from handoff record is unreadable, skipping"
                    );
                    continue;
                }
            };

            tracing::info!(path = ?transcript_path, "Creating summary");
            let response = self
                .summarizer
                .summarize(&transcript)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to summarize transcript: {e:?}"))?;

            let summary_path = staging::summary_path_for(transcript_path).with_context(|| {
                format!("Invalid transcript file name: {}", transcript_path.display())
            })?;
            let video_url = record.metadata.as_deref().unwrap_or_default();
            std::fs::write(&summary_path, format!("{}\n\n{}", response.summary, video_url))
                .with_context(|| format!("Failed to write summary {}", summary_path.display()))?;

            tracing::info!(path = ?summary_path, "Summary saved");
            new_work = true;
        }

        Ok(outcome(new_work))
    }

    /// Posts every summary file found by naming convention in the transcripts
    /// directory, optionally attaching the companion transcript.
    ///
    /// Artifacts are never deleted or renamed here; posted summaries leave
    /// the staging area only through explicit cleanup.
    #[tracing::instrument(skip(self))]
    pub async fn post(&self) -> anyhow::Result<RunOutcome> {
        let summaries = self
            .staging
            .summary_files()
            .context("Failed to list summary files")?;
        if summaries.is_empty() {
            tracing::info!("No summaries to post");
            return Ok(RunOutcome::NoNewWork);
        }

        let mut new_work = false;

        for summary_path in summaries {
            let text = match std::fs::read_to_string(&summary_path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, path = ?summary_path, "Summary file is unreadable, skipping");
                    continue;
                }
            };

            tracing::info!(path = ?summary_path, "Posting summary");
            self.poster
                .post_summary(&text)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to post summary {}: {e}", summary_path.display()))?;
            new_work = true;

            if self.config.attach_transcripts {
                self.attach_transcript(&summary_path).await?;
            }
        }

        Ok(outcome(new_work))
    }

    async fn attach_transcript(&self, summary_path: &Path) -> anyhow::Result<()> {
        let Some(transcript_path) = staging::companion_transcript(summary_path) else {
            return Ok(());
        };
        if !transcript_path.exists() {
            return Ok(());
        }

        match self.poster.upload_transcript(&transcript_path).await {
            Ok(()) => {
                tracing::info!(path = ?transcript_path, "Transcript attached");
                Ok(())
            }
            Err(e) if e.is_permission() => {
                tracing::warn!(
                    error = %e,
                    "Missing permission to upload the transcript; grant the bot the files:write scope to enable attachments"
                );
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to upload transcript {}: {e}",
                transcript_path.display()
            )),
        }
    }

    /// Runs the whole chain once. When the download stage finds nothing new
    /// the remaining stages are skipped and the distinct no-new-work outcome
    /// is reported for the scheduler to short-circuit on.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> anyhow::Result<RunOutcome> {
        if let RunOutcome::NoNewWork = self.download().await? {
            tracing::info!("No new videos to process");
            return Ok(RunOutcome::NoNewWork);
        }

        self.transcribe().await?;
        self.summarize().await?;
        self.post().await?;

        Ok(RunOutcome::NewWork)
    }

    fn transcript_path_for(&self, audio_path: &Path) -> anyhow::Result<PathBuf> {
        let stem = audio_stem(audio_path)?;
        Ok(self.staging.transcripts().join(format!("{stem}.txt")))
    }

    fn partial_transcript_path_for(&self, audio_path: &Path) -> anyhow::Result<PathBuf> {
        let stem = audio_stem(audio_path)?;
        Ok(self.staging.transcripts().join(format!("{stem}_partial.txt")))
    }
}

fn audio_stem(audio_path: &Path) -> anyhow::Result<&str> {
    audio_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Invalid audio file name: {}", audio_path.display()))
}

fn outcome(new_work: bool) -> RunOutcome {
    if new_work {
        RunOutcome::NewWork
    } else {
        RunOutcome::NoNewWork
    }
}
