use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{line::ChatPlatform, queue::JobQueue};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub channel_secret: Arc<str>,
    pub images_dir: PathBuf,
    pub chat: Arc<dyn ChatPlatform>,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    pub fn new(
        channel_secret: &str,
        images_dir: impl Into<PathBuf>,
        chat: Arc<dyn ChatPlatform>,
        queue: JobQueue,
    ) -> Self {
        Self {
            channel_secret: Arc::from(channel_secret),
            images_dir: images_dir.into(),
            chat,
            queue: Arc::new(queue),
        }
    }
}
