use std::sync::Arc;

use tracing::{error, info};
use validator::Validate;

use crate::{
    entities::{
        media::{MediaRecord, UpdateMediaRequest, UploadedFile, MAX_ALT_LENGTH},
        pagination::{PageMeta, Pagination, PaginatedResponse},
    },
    errors::{AppError, MediaError},
    repositories::media::MediaRepository,
    settings::MediaConfig,
    use_cases::pipeline::MediaPipeline,
    utils::valid_uuid::valid_uuid,
};

pub struct MediaService<R>
where
    R: MediaRepository,
{
    pub media_repo: R,
    pub pipeline: Arc<MediaPipeline>,
}

impl<R> MediaService<R>
where
    R: MediaRepository,
{
    pub fn new(media_repo: R, config: MediaConfig) -> Self {
        MediaService {
            media_repo,
            pipeline: Arc::new(MediaPipeline::new(config)),
        }
    }

    pub fn config(&self) -> &MediaConfig {
        self.pipeline.config()
    }

    /// Processes one upload end to end and stores its metadata record.
    ///
    /// Alt text is held to the same limit as updates. Image work runs on the
    /// blocking pool; the call returns once the record is saved. If saving
    /// fails, files already written stay on disk.
    pub async fn upload_file(&self, file: UploadedFile, alt: Option<String>) -> Result<MediaRecord, MediaError> {
        let alt = alt.map(|a| a.trim().to_string()).unwrap_or_default();
        if alt.chars().count() as u64 > MAX_ALT_LENGTH {
            return Err(MediaError::InvalidMetadata(format!(
                "alt text must be at most {MAX_ALT_LENGTH} characters"
            )));
        }

        let pipeline = Arc::clone(&self.pipeline);

        let processed = tokio::task::spawn_blocking(move || pipeline.process(&file, &alt))
            .await
            .map_err(|e| MediaError::Io(format!("image processing task failed: {e}")))??;

        match self.media_repo.create_media(&processed.insert).await {
            Ok(record) => {
                info!(id = %record.id, file = %record.file_name, variants = record.media_sizes.len(), "Media uploaded");
                Ok(record)
            }
            Err(e) => {
                error!(
                    files = ?processed.written_files,
                    "Failed to save media record, written files are orphaned: {}", e
                );
                Err(MediaError::Persistence(e.to_string()))
            }
        }
    }

    /// Uploads files in order and stops at the first failure.
    pub async fn upload_files(
        &self,
        files: Vec<(UploadedFile, Option<String>)>,
    ) -> Result<Vec<MediaRecord>, (String, MediaError)> {
        let mut uploaded = Vec::with_capacity(files.len());

        for (file, alt) in files {
            let file_name = file.file_name.clone();
            let record = self.upload_file(file, alt).await.map_err(|e| (file_name, e))?;
            uploaded.push(record);
        }

        Ok(uploaded)
    }

    /// Lists live media, newest first
    pub async fn list_media(&self, pagination: Pagination) -> Result<PaginatedResponse<MediaRecord>, AppError> {
        let total = self.media_repo.count_media().await?;
        let data = if total == 0 {
            Vec::new()
        } else {
            self.media_repo.list_media(pagination).await?
        };

        Ok(PaginatedResponse {
            data,
            meta: PageMeta::new(pagination, total),
        })
    }

    pub async fn get_media_by_id(&self, id: &str) -> Result<MediaRecord, AppError> {
        let valid_id = valid_uuid(id)?;
        self.media_repo.get_media_by_id(&valid_id).await
    }

    /// Updates descriptive metadata. URLs and variants are not editable.
    pub async fn update_media(&self, id: &str, changes: UpdateMediaRequest) -> Result<MediaRecord, AppError> {
        changes.validate()?;
        let valid_id = valid_uuid(id)?;

        if changes.is_empty() {
            return self.media_repo.get_media_by_id(&valid_id).await;
        }

        self.media_repo.update_media(&valid_id, &changes).await
    }

    /// Soft delete. Files on disk are kept.
    pub async fn delete_media(&self, id: &str) -> Result<(), AppError> {
        let valid_id = valid_uuid(id)?;
        self.media_repo.soft_delete_media(&valid_id).await
    }
}
