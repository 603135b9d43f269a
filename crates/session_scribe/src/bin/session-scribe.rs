use std::{path::PathBuf, process::ExitCode, str::FromStr, time::Duration};

use anyhow::Context;
use apalis::{layers::sentry::SentryLayer, prelude::*};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand, ValueEnum};
use cron::Schedule;

use session_scribe::{
    config::Config,
    media::Ffmpeg,
    openai::OpenAIClient,
    slack::SlackClient,
    tracing::init_tracing_subscriber,
    types::RunOutcome,
    yt::{audio_handler::YtDlpAudioHandler, watcher::YtDlpWatcher},
    SessionPipeline, SessionPipelineBuilder,
};
use session_state::{StagingArea, StagingDir};

/// Transcription budget applied by `--test` runs.
const TEST_BUDGET: Duration = Duration::from_secs(60);

/// Exit status for a run that completed normally but found no new video.
/// Schedulers use it to skip downstream invocations.
const NO_NEW_WORK_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(
    name = "session-scribe",
    about = "Watches channels for new committee session recordings, transcribes and summarizes them, and posts the summaries to Slack.",
    after_help = "Exit status: 0 when new work was done, 2 when the run found no new work, 1 on failure."
)]
struct Cli {
    /// Path to the channel configuration file
    #[arg(long, env = "SESSION_SCRIBE_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Working directory holding staging directories and pipeline state
    #[arg(long, env = "SESSION_SCRIBE_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// Slack bot token
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    slack_token: Option<String>,

    /// Slack channel that receives the summaries
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    slack_channel: Option<String>,

    /// Path to a cookies file passed to yt-dlp
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline once and exit
    Run {
        /// Bound transcription to a 60 second budget
        #[arg(long)]
        test: bool,
    },
    /// Search channels and stage new audio for transcription
    Download,
    /// Transcribe staged audio
    Transcribe {
        /// Bound transcription to a 60 second budget
        #[arg(long)]
        test: bool,
    },
    /// Summarize pending transcripts
    Summarize,
    /// Post pending summaries to Slack
    Post,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 */4 * * *")]
        schedule: String,
    },
    /// Remove the staging directories, or clear one directory's contents
    Cleanup {
        /// Clear only this directory, preserving the directory itself
        #[arg(long, value_enum)]
        dir: Option<CleanupDir>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CleanupDir {
    Downloads,
    Transcripts,
}

#[derive(Clone)]
struct PipelineSettings {
    config_path: PathBuf,
    workdir: PathBuf,
    openai_key: String,
    slack_token: String,
    slack_channel: String,
    cookies_path: Option<PathBuf>,
    transcribe_budget: Option<Duration>,
}

impl PipelineSettings {
    fn from_cli(cli: &Cli, test: bool) -> anyhow::Result<Self> {
        Ok(PipelineSettings {
            config_path: cli.config.clone(),
            workdir: cli.workdir.clone(),
            openai_key: cli.openai_key.clone().context("OPENAI_API_KEY not set")?,
            slack_token: cli.slack_token.clone().context("SLACK_BOT_TOKEN not set")?,
            slack_channel: cli
                .slack_channel
                .clone()
                .context("SLACK_CHANNEL_ID not set")?,
            cookies_path: cli.cookies_path.clone(),
            transcribe_budget: test.then_some(TEST_BUDGET),
        })
    }
}

type Pipeline = SessionPipeline<
    YtDlpWatcher,
    YtDlpAudioHandler,
    OpenAIClient<Ffmpeg>,
    OpenAIClient<Ffmpeg>,
    SlackClient,
>;

fn build_pipeline(settings: &PipelineSettings) -> anyhow::Result<Pipeline> {
    let config = Config::from_file(&settings.config_path)?;

    let ffmpeg = Ffmpeg::new();
    let openai = OpenAIClient::new(&settings.openai_key, ffmpeg.clone());
    let watcher = YtDlpWatcher::new().with_cookies(settings.cookies_path.clone());
    let audio_handler =
        YtDlpAudioHandler::new(ffmpeg).with_cookies(settings.cookies_path.clone());
    let poster = SlackClient::new(&settings.slack_token, &settings.slack_channel);

    let builder = SessionPipelineBuilder::new(&settings.workdir, config)
        .watcher(watcher)
        .audio_handler(audio_handler)
        .transcriber(openai.clone())
        .summarizer(openai)
        .poster(poster);
    let builder = match settings.transcribe_budget {
        Some(budget) => builder.transcribe_budget(budget),
        None => builder,
    };

    Ok(builder.build())
}

async fn run_pipeline(settings: &PipelineSettings) -> anyhow::Result<RunOutcome> {
    build_pipeline(settings)?.run().await
}

async fn handle_tick(_tick: Tick, settings: Data<PipelineSettings>) -> anyhow::Result<()> {
    tracing::info!("Running scheduled pipeline...");
    match run_pipeline(&settings).await? {
        RunOutcome::NewWork => tracing::info!("Scheduled run processed a new video"),
        RunOutcome::NoNewWork => tracing::info!("Scheduled run found no new videos"),
    }
    Ok(())
}

async fn execute(cli: Cli) -> anyhow::Result<RunOutcome> {
    match &cli.command {
        Command::Run { test } => {
            let settings = PipelineSettings::from_cli(&cli, *test)?;
            build_pipeline(&settings)?.run().await
        }
        Command::Download => {
            let settings = PipelineSettings::from_cli(&cli, false)?;
            build_pipeline(&settings)?.download().await
        }
        Command::Transcribe { test } => {
            let settings = PipelineSettings::from_cli(&cli, *test)?;
            build_pipeline(&settings)?.transcribe().await
        }
        Command::Summarize => {
            let settings = PipelineSettings::from_cli(&cli, false)?;
            build_pipeline(&settings)?.summarize().await
        }
        Command::Post => {
            let settings = PipelineSettings::from_cli(&cli, false)?;
            build_pipeline(&settings)?.post().await
        }
        Command::Cron { schedule } => {
            let settings = PipelineSettings::from_cli(&cli, false)?;
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(schedule)?;

            let worker = WorkerBuilder::new("session-scribe-cron")
                .backend(CronStream::new(schedule))
                .layer(SentryLayer::new())
                .data(settings)
                .build(handle_tick);

            worker.run().await?;
            Ok(RunOutcome::NewWork)
        }
        Command::Cleanup { dir } => {
            let staging = StagingArea::new(&cli.workdir);
            match dir {
                Some(CleanupDir::Downloads) => staging
                    .clear(StagingDir::Downloads)
                    .context("Failed to clear downloads directory")?,
                Some(CleanupDir::Transcripts) => staging
                    .clear(StagingDir::Transcripts)
                    .context("Failed to clear transcripts directory")?,
                None => staging
                    .wipe_all()
                    .context("Failed to remove staging directories")?,
            }
            tracing::info!("Successfully cleaned up staging directories");
            Ok(RunOutcome::NewWork)
        }
    }
}

fn exit_code(outcome: RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::NewWork => ExitCode::SUCCESS,
        RunOutcome::NoNewWork => ExitCode::from(NO_NEW_WORK_EXIT_CODE),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();

    if let Err(e) = init_tracing_subscriber() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match execute(cli).await {
        Ok(outcome) => exit_code(outcome),
        Err(e) => {
            tracing::error!(error = ?e, "Pipeline failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
