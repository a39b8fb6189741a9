//! Maintenance of a video's derived artifacts.
//!
//! The serving layer calls [`VideoLifecycle::on_video_created`] right after it
//! persisted a new record and [`VideoLifecycle::on_video_deleted`] right after
//! it removed one. Neither hook ever fails the caller: artifact problems are
//! logged and reported, the committed record is left alone.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::events::TranscodeJob;
use super::model::{Resolution, Video};
use super::paths;
use super::repository::VideoRepository;
use super::transcoder::{ThumbnailSpec, Transcoder};
use crate::infrastructure::queue::JobQueue;

/// What `on_video_created` managed to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CreatedArtifacts {
    /// Relative to the media root, when a thumbnail was made and attached.
    pub thumbnail_path: Option<String>,
    pub enqueued: Vec<Resolution>,
    pub not_enqueued: Vec<Resolution>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct VideoLifecycle {
    repo: Arc<dyn VideoRepository>,
    queue: Arc<dyn JobQueue>,
    transcoder: Transcoder,
    media_root: PathBuf,
    resolutions: Vec<Resolution>,
    thumbnail: ThumbnailSpec,
}

impl VideoLifecycle {
    pub fn new(
        repo: Arc<dyn VideoRepository>,
        queue: Arc<dyn JobQueue>,
        transcoder: Transcoder,
        media_root: impl Into<PathBuf>,
        resolutions: Vec<Resolution>,
        thumbnail: ThumbnailSpec,
    ) -> Self {
        Self {
            repo,
            queue,
            transcoder,
            media_root: media_root.into(),
            resolutions,
            thumbnail,
        }
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Thumbnail inline, transcodes out of band.
    pub async fn on_video_created(&self, video: &Video) -> CreatedArtifacts {
        let mut artifacts = CreatedArtifacts::default();
        let source = self.media_root.join(&video.source_path);

        if video.thumbnail_path.is_none() {
            artifacts.thumbnail_path = self.attach_thumbnail(video, &source).await;
        }

        for &resolution in &self.resolutions {
            match self.queue.enqueue(TranscodeJob::new(&source, resolution)).await {
                Ok(()) => {
                    info!("📤 Enqueued {} transcode for video {}", resolution, video.id);
                    artifacts.enqueued.push(resolution);
                }
                Err(e) => {
                    error!("Failed to enqueue {} transcode for video {}: {}", resolution, video.id, e);
                    artifacts.not_enqueued.push(resolution);
                }
            }
        }

        artifacts
    }

    async fn attach_thumbnail(&self, video: &Video, source: &Path) -> Option<String> {
        let thumbnail = match self.transcoder.make_thumbnail(source, self.thumbnail).await {
            Ok(path) => path,
            Err(e) => {
                error!("Thumbnail generation failed for video {}: {}", video.id, e);
                return None;
            }
        };

        let relative = thumbnail
            .strip_prefix(&self.media_root)
            .unwrap_or(&thumbnail)
            .to_string_lossy()
            .into_owned();

        match self.repo.attach_thumbnail(video.id, &relative).await {
            Ok(true) => Some(relative),
            Ok(false) => {
                warn!("Video {} already had a thumbnail or is gone", video.id);
                let recorded = match self.repo.find_by_id(video.id).await {
                    Ok(found) => found.and_then(|v| v.thumbnail_path),
                    Err(e) => {
                        error!("Failed to re-read video {}: {}", video.id, e);
                        return None;
                    }
                };
                if recorded.as_deref() != Some(relative.as_str()) {
                    remove_if_present(&thumbnail).await;
                }
                None
            }
            Err(e) => {
                error!("Failed to store thumbnail path for video {}: {}", video.id, e);
                // Delete only removes the recorded thumbnail.
                remove_if_present(&thumbnail).await;
                None
            }
        }
    }

    /// Removes the source, the thumbnail and every derived resolution.
    ///
    /// Every known resolution is checked, not only the configured ones, so
    /// files produced under an earlier configuration go too. Missing files
    /// are skipped, which keeps the hook idempotent. A job still running for
    /// this source can write its output after this returns; there is no
    /// cancellation.
    pub async fn on_video_deleted(&self, video: &Video) -> CleanupReport {
        let mut report = CleanupReport::default();
        let source = self.media_root.join(&video.source_path);

        let mut targets = vec![source.clone()];
        if let Some(thumbnail) = &video.thumbnail_path {
            targets.push(self.media_root.join(thumbnail));
        }
        for resolution in Resolution::ALL {
            match paths::derive(&source, resolution.label()) {
                Ok(derived) => targets.push(derived),
                Err(e) => warn!("Cannot derive {} path for video {}: {}", resolution, video.id, e),
            }
        }

        for target in targets {
            if remove_if_present(&target).await {
                report.removed.push(target);
            }
        }

        info!("🗑️ Removed {} artifact(s) of video {}", report.removed.len(), video.id);
        report
    }
}

async fn remove_if_present(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}
