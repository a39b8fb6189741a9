use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewVideo, Video};
use super::repository::VideoRepository;

/// Process-local store, used when no database is configured.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(&self, new: NewVideo) -> Result<Video> {
        let video = Video {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            source_path: new.source_path,
            thumbnail_path: None,
            genre: new.genre,
            access: new.access,
            owner_id: new.owner_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn list_visible(&self, requester: Option<Uuid>, owner: Option<Uuid>) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.is_visible_to(requester))
            .filter(|v| owner.is_none_or(|owner| v.owner_id == owner))
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn attach_thumbnail(&self, id: Uuid, thumbnail_path: &str) -> Result<bool> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&id) {
            Some(video) if video.thumbnail_path.is_none() => {
                video.thumbnail_path = Some(thumbnail_path.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.videos.write().await.remove(&id))
    }
}
