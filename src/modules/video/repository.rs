use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{NewVideo, Video};

/// Persistence of video records.
///
/// `attach_thumbnail` is the only way to write the thumbnail column and only
/// succeeds while it is still empty; it is reserved for the lifecycle hook.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, new: NewVideo) -> Result<Video>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>>;

    /// Videos visible to `requester`, optionally restricted to one owner, newest first.
    async fn list_visible(&self, requester: Option<Uuid>, owner: Option<Uuid>) -> Result<Vec<Video>>;

    /// Returns `false` when the record is missing or already has a thumbnail.
    async fn attach_thumbnail(&self, id: Uuid, thumbnail_path: &str) -> Result<bool>;

    /// Removes the row and returns it, `None` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<Option<Video>>;
}

pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn create(&self, new: NewVideo) -> Result<Video> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, title, description, source_path, genre, access, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.source_path)
        .bind(new.genre.as_str())
        .bind(new.access.as_str())
        .bind(new.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn list_visible(&self, requester: Option<Uuid>, owner: Option<Uuid>) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE (access = 'public' OR owner_id = $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(requester)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn attach_thumbnail(&self, id: Uuid, thumbnail_path: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE videos SET thumbnail_path = $1 WHERE id = $2 AND thumbnail_path IS NULL",
        )
        .bind(thumbnail_path)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("DELETE FROM videos WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }
}
