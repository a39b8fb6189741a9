use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::connect_and_migrate;
use crate::infrastructure::queue::rabbitmq::RabbitJobQueue;
use crate::infrastructure::queue::{JobQueue, TRANSCODE_QUEUE};
use crate::infrastructure::storage::media::MediaStorage;
use crate::modules::video::lifecycle::VideoLifecycle;
use crate::modules::video::memory::InMemoryVideoRepository;
use crate::modules::video::repository::{PgVideoRepository, VideoRepository};
use crate::modules::video::transcoder::{ThumbnailSpec, Transcoder, TranscoderSettings};
use crate::state::AppState;
use crate::workers::pool::LocalJobQueue;
use crate::workers::transcoder::start_transcoder_worker;

pub fn create_app(state: AppState) -> Router {
    let limit = state.config.max_upload_bytes;

    crate::routes::configure_routes(state.clone())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires storage, persistence, the job queue and the lifecycle hooks from
/// configuration. Queue workers are spawned here too.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let storage = MediaStorage::new(&config.media_root);
    storage
        .ensure_layout()
        .await
        .context("Failed to prepare media root")?;

    let repo: Arc<dyn VideoRepository> = match &config.database_url {
        Some(url) => Arc::new(PgVideoRepository::new(connect_and_migrate(url).await?)),
        None => {
            warn!("DATABASE_URL not set, videos are kept in memory");
            Arc::new(InMemoryVideoRepository::new())
        }
    };

    let transcoder = Transcoder::new(TranscoderSettings::new(
        &config.ffmpeg_bin,
        storage.thumbnails_dir(),
    ));

    let queue: Arc<dyn JobQueue> = match &config.amqp_url {
        Some(url) => {
            let rabbit = RabbitJobQueue::new(url, TRANSCODE_QUEUE).await?;
            if config.run_transcode_worker {
                let (rabbit, transcoder) = (rabbit.clone(), transcoder.clone());
                tokio::spawn(async move {
                    if let Err(e) = start_transcoder_worker(rabbit, transcoder).await {
                        tracing::error!("Transcoder Worker stopped: {}", e);
                    }
                });
            }
            Arc::new(rabbit)
        }
        None => {
            info!("AMQP_URL not set, using {} local transcode worker(s)", config.transcode_workers);
            let (local, _workers) = LocalJobQueue::start(transcoder.clone(), config.transcode_workers);
            Arc::new(local)
        }
    };

    let thumbnail = ThumbnailSpec {
        offset: config.thumbnail_offset,
        width: config.thumbnail_width,
        height: config.thumbnail_height,
    };

    let lifecycle = VideoLifecycle::new(
        repo.clone(),
        queue,
        transcoder,
        &config.media_root,
        config.target_resolutions.clone(),
        thumbnail,
    );

    Ok(AppState::new(config, repo, storage, lifecycle))
}
