pub mod audio_handler;
pub mod poster;
pub mod summarizer;
pub mod transcriber;
pub mod watcher;
