//! # Session State
//!
//! Flat-file persistence for the pipeline: the progress marker that gates
//! reprocessing, the handoff records that carry artifacts from one stage
//! invocation to the next, and the staging directories holding the artifacts
//! themselves.
//!
//! Everything in this crate assumes a single active writer. Concurrent
//! pipeline runs against the same working directory are not safe and must be
//! prevented by whatever schedules the pipeline.

mod handoff;
mod progress;
pub mod staging;

pub use handoff::{HandoffError, HandoffRecord, HandoffStore, RECORD_DELIMITER};
pub use progress::ProgressTracker;
pub use staging::{StagingArea, StagingDir};
