use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::{CreateVideoForm, VideoResponse};
use super::error::VideoError;
use super::lifecycle::CleanupReport;
use super::model::{Access, Genre, NewVideo, Resolution, Video};
use super::paths;
use crate::middleware::auth::TokenClaims;
use crate::state::AppState;

pub struct VideoService;

impl VideoService {
    fn thumbnail_url(id: Uuid) -> String {
        format!("/api/v1/videos/{id}/thumbnail")
    }

    fn stream_url(id: Uuid, resolution: Resolution) -> String {
        format!("/api/v1/videos/{id}/stream/{resolution}")
    }

    async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Resolution URLs are discovered at read time: a URL is only returned
    /// when the derived file is on disk.
    pub async fn to_response(state: &AppState, video: Video) -> VideoResponse {
        let source = state.storage.absolute(&video.source_path);

        let mut urls = [None, None, None];
        for (slot, resolution) in urls.iter_mut().zip(Resolution::ALL) {
            if let Ok(derived) = paths::derive(&source, resolution.label()) {
                if Self::exists(&derived).await {
                    *slot = Some(Self::stream_url(video.id, resolution));
                }
            }
        }
        let [video_480p_url, video_720p_url, video_1080p_url] = urls;

        let thumbnail_url = match &video.thumbnail_path {
            Some(rel) if Self::exists(&state.storage.absolute(rel)).await => {
                Some(Self::thumbnail_url(video.id))
            }
            _ => None,
        };

        VideoResponse {
            video,
            thumbnail_url,
            video_480p_url,
            video_720p_url,
            video_1080p_url,
        }
    }

    /// Persists an uploaded video and runs the creation hook.
    ///
    /// `source_path` is the already stored upload, relative to the media
    /// root. It is removed again when the form turns out to be invalid.
    pub async fn create_video(
        state: AppState,
        owner_id: Uuid,
        form: CreateVideoForm,
        source_path: String,
    ) -> Result<VideoResponse, VideoError> {
        let absolute = state.storage.absolute(&source_path);

        let new = match Self::prepare(owner_id, form, &source_path, state.lifecycle.resolutions()) {
            Ok(new) => new,
            Err(e) => {
                if let Err(io) = tokio::fs::remove_file(&absolute).await {
                    warn!("Failed to discard rejected upload {}: {}", absolute.display(), io);
                }
                return Err(e);
            }
        };

        let video = state.repo.create(new).await?;
        info!("🎬 Created video {} at {}", video.id, video.source_path);

        let artifacts = state.lifecycle.on_video_created(&video).await;
        if !artifacts.not_enqueued.is_empty() {
            warn!(
                "Video {} is missing transcodes for {:?}",
                video.id, artifacts.not_enqueued
            );
        }

        // Re-read to pick up the thumbnail the hook attached.
        let video = state.repo.find_by_id(video.id).await?.unwrap_or(video);
        Ok(Self::to_response(&state, video).await)
    }

    fn prepare(
        owner_id: Uuid,
        form: CreateVideoForm,
        source_path: &str,
        resolutions: &[Resolution],
    ) -> Result<NewVideo, VideoError> {
        form.validate()
            .map_err(|e| VideoError::Validation(e.to_string()))?;
        paths::validate_source(Path::new(source_path), resolutions.iter().map(|r| r.label()))?;

        let genre = form
            .genre
            .parse::<Genre>()
            .map_err(|e| VideoError::Validation(e.to_string()))?;
        let access = form
            .access
            .parse::<Access>()
            .map_err(|e| VideoError::Validation(e.to_string()))?;

        Ok(NewVideo {
            title: form.title,
            description: form.description,
            source_path: source_path.to_string(),
            genre,
            access,
            owner_id,
        })
    }

    pub async fn list_videos(
        state: AppState,
        requester: Option<Uuid>,
        owner: Option<Uuid>,
    ) -> Result<Vec<VideoResponse>, VideoError> {
        let videos = state.repo.list_visible(requester, owner).await?;

        let mut responses = Vec::with_capacity(videos.len());
        for video in videos {
            responses.push(Self::to_response(&state, video).await);
        }
        Ok(responses)
    }

    /// Invisible videos are reported as missing, not as forbidden.
    async fn find_visible(
        state: &AppState,
        requester: Option<Uuid>,
        id: Uuid,
    ) -> Result<Video, VideoError> {
        state
            .repo
            .find_by_id(id)
            .await?
            .filter(|v| v.is_visible_to(requester))
            .ok_or(VideoError::NotFound)
    }

    pub async fn get_video(
        state: AppState,
        requester: Option<Uuid>,
        id: Uuid,
    ) -> Result<VideoResponse, VideoError> {
        let video = Self::find_visible(&state, requester, id).await?;
        Ok(Self::to_response(&state, video).await)
    }

    /// Deletes the record, then its files. Owners and admins only.
    pub async fn delete_video(
        state: AppState,
        user: &TokenClaims,
        id: Uuid,
    ) -> Result<CleanupReport, VideoError> {
        let video = state
            .repo
            .find_by_id(id)
            .await?
            .ok_or(VideoError::NotFound)?;

        if video.owner_id != user.sub && !user.is_admin() {
            return Err(VideoError::Forbidden);
        }

        let video = state.repo.delete(id).await?.ok_or(VideoError::NotFound)?;
        Ok(state.lifecycle.on_video_deleted(&video).await)
    }

    /// Source file, or the derived file for `resolution` when it exists.
    pub async fn stream_path(
        state: AppState,
        requester: Option<Uuid>,
        id: Uuid,
        resolution: Option<Resolution>,
    ) -> Result<PathBuf, VideoError> {
        let video = Self::find_visible(&state, requester, id).await?;
        let source = state.storage.absolute(&video.source_path);

        let path = match resolution {
            Some(resolution) => paths::derive(&source, resolution.label())?,
            None => source,
        };

        if !Self::exists(&path).await {
            return Err(VideoError::NotFound);
        }
        Ok(path)
    }

    pub async fn thumbnail_path(
        state: AppState,
        requester: Option<Uuid>,
        id: Uuid,
    ) -> Result<PathBuf, VideoError> {
        let video = Self::find_visible(&state, requester, id).await?;
        let path = video
            .thumbnail_path
            .map(|rel| state.storage.absolute(&rel))
            .ok_or(VideoError::NotFound)?;

        if !Self::exists(&path).await {
            return Err(VideoError::NotFound);
        }
        Ok(path)
    }
}
