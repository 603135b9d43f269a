pub mod config;
mod error;
mod llm;
pub mod media;
mod pipeline;
pub mod slack;
pub mod tracing;
pub mod types;
pub mod yt;

pub use error::Error;
pub use llm::openai;
pub use llm::{
    summarizer::{Summarizer, SummaryResponse},
    transcriber::{
        TranscribeRequest, TranscribeResponse, TranscribeSegment, Transcriber, TranscriptOutcome,
    },
};
pub use pipeline::{builder::SessionPipelineBuilder, SessionPipeline, MARKER_FILE};
