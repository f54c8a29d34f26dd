use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    entities::{
        media::{MediaInsert, MediaRecord, UpdateMediaRequest},
        pagination::Pagination,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxMediaRepo,
};

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn create_media(&self, media: &MediaInsert) -> Result<MediaRecord, AppError>;
    async fn list_media(&self, pagination: Pagination) -> Result<Vec<MediaRecord>, AppError>;
    async fn count_media(&self) -> Result<i64, AppError>;
    async fn get_media_by_id(&self, id: &Uuid) -> Result<MediaRecord, AppError>;
    async fn update_media(&self, id: &Uuid, changes: &UpdateMediaRequest) -> Result<MediaRecord, AppError>;
    async fn soft_delete_media(&self, id: &Uuid) -> Result<(), AppError>;
}

impl SqlxMediaRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxMediaRepo { pool }
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn create_media(&self, media: &MediaInsert) -> Result<MediaRecord, AppError> {
        let record = sqlx::query_as::<_, MediaRecord>(
            r#"
            INSERT INTO media (
                file_name, mime_type, size, url, thumbnail_url, blur_url,
                width, height, media_sizes, alt
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#
        )
        .bind(&media.file_name)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.url)
        .bind(&media.thumbnail_url)
        .bind(&media.blur_url)
        .bind(media.width)
        .bind(media.height)
        .bind(Json(&media.media_sizes))
        .bind(&media.alt)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_media(&self, pagination: Pagination) -> Result<Vec<MediaRecord>, AppError> {
        let records = sqlx::query_as::<_, MediaRecord>(
            r#"
            SELECT * FROM media
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn count_media(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_media_by_id(&self, id: &Uuid) -> Result<MediaRecord, AppError> {
        sqlx::query_as::<_, MediaRecord>(
            r#"SELECT * FROM media WHERE id = $1 AND deleted_at IS NULL"#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Media not found".into()))
    }

    async fn update_media(&self, id: &Uuid, changes: &UpdateMediaRequest) -> Result<MediaRecord, AppError> {
        // COALESCE keeps the stored value for fields left out of the request
        sqlx::query_as::<_, MediaRecord>(
            r#"
            UPDATE media SET
                alt = COALESCE($1, alt),
                file_name = COALESCE($2, file_name),
                updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING *
            "#
        )
        .bind(changes.alt.as_deref())
        .bind(changes.file_name.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Media not found".into()))
    }

    async fn soft_delete_media(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE media
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Media not found".into()));
        }

        Ok(())
    }
}
