use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use session_scribe::slack::{PostError, SummaryPoster};

#[derive(Clone, Default)]
pub struct MockPoster {
    pub posts: Arc<Mutex<Vec<String>>>,
    pub uploads: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
    pub deny_uploads: bool,
}

impl MockPoster {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn denying_uploads() -> Self {
        Self {
            deny_uploads: true,
            ..Default::default()
        }
    }
}

impl SummaryPoster for MockPoster {
    async fn post_summary(&self, text: &str) -> Result<(), PostError> {
        if let Some(ref msg) = self.fail_with {
            return Err(PostError::Api(msg.clone()));
        }
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn upload_transcript(&self, path: &Path) -> Result<(), PostError> {
        if self.deny_uploads {
            return Err(PostError::Permission("missing_scope".to_string()));
        }
        self.uploads.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
