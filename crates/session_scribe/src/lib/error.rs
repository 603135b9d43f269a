use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yt-dlp exited with {status}: {stderr}")]
    YtDlp { status: ExitStatus, stderr: String },
}
