use std::{fmt::Debug, future::Future};

pub trait Summarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    fn summarize(
        &self,
        transcript: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug)]
pub struct SummaryResponse {
    pub summary: String,
}
