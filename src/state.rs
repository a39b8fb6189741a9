use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::storage::media::MediaStorage;
use crate::modules::video::lifecycle::VideoLifecycle;
use crate::modules::video::repository::VideoRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repo: Arc<dyn VideoRepository>,
    pub storage: MediaStorage,
    pub lifecycle: VideoLifecycle,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn VideoRepository>,
        storage: MediaStorage,
        lifecycle: VideoLifecycle,
    ) -> Self {
        Self {
            config,
            repo,
            storage,
            lifecycle,
        }
    }
}
