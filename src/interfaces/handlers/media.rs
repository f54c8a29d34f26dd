use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use serde_json::json;
use tracing::instrument;

use crate::{
    entities::{
        media::{UpdateMediaRequest, UploadedFile},
        pagination::Pagination,
    },
    errors::AppError,
    AppState,
};

/// A multipart body split into file parts and text parts, by field name.
#[derive(Debug, Default)]
struct UploadForm {
    files: HashMap<String, Vec<UploadedFile>>,
    texts: HashMap<String, Vec<String>>,
}

impl UploadForm {
    fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        self.files.remove(field).unwrap_or_default()
    }

    fn take_texts(&mut self, field: &str) -> Vec<String> {
        self.texts.remove(field).unwrap_or_default()
    }
}

/// Room for a 255 character alt text in 4-byte UTF-8.
const MAX_TEXT_FIELD_BYTES: usize = 1024;

/// Reads every part of the body. A part with a filename is a file; any
/// file over `max_file_bytes` or text part over `MAX_TEXT_FIELD_BYTES` is
/// rejected while streaming.
async fn read_upload_form(mut payload: Multipart, max_file_bytes: usize) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let limit = if file_name.is_some() { max_file_bytes } else { MAX_TEXT_FIELD_BYTES };

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if data.len() + chunk.len() > limit {
                return Err(match file_name {
                    Some(_) => AppError::PayloadTooLarge(format!("file exceeds the {} byte upload limit", limit)),
                    None => AppError::PayloadTooLarge(format!("field '{}' exceeds {} bytes", name, limit)),
                });
            }
            data.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => form.files.entry(name).or_default().push(UploadedFile::new(file_name, data)),
            None => {
                let text = String::from_utf8(data)
                    .map_err(|_| AppError::InvalidInput(format!("field '{}' is not valid UTF-8", name)))?;
                form.texts.entry(name).or_default().push(text);
            }
        }
    }

    Ok(form)
}

fn upload_failed(file_name: &str, err: AppError) -> HttpResponse {
    let status = actix_web::ResponseError::status_code(&err);
    HttpResponse::build(status).json(json!({
        "error": format!("Failed to upload file: {}", file_name),
        "details": err.to_string(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn upload_single(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let media_service = &state.media_service;
    let mut form = read_upload_form(payload, media_service.config().max_upload_bytes).await?;

    let file = form
        .take_files("file")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InvalidInput("No file was uploaded under the 'file' field".into()))?;
    let alt = form.take_texts("alt").into_iter().next();

    let file_name = file.file_name.clone();
    match media_service.upload_file(file, alt).await {
        Ok(record) => Ok(HttpResponse::Created().json(record)),
        Err(e) => Ok(upload_failed(&file_name, e.into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn upload_multiple(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let media_service = &state.media_service;
    let mut form = read_upload_form(payload, media_service.config().max_upload_bytes).await?;

    let files = form.take_files("files");
    let alts = form.take_texts("alts");

    if files.is_empty() {
        return Err(AppError::InvalidInput("No files were uploaded".into()));
    }
    if !alts.is_empty() && alts.len() != files.len() {
        return Err(AppError::InvalidInput(
            "The number of alt texts does not match the number of files".into(),
        ));
    }

    let mut alts = alts.into_iter();
    let batch = files
        .into_iter()
        .map(|file| (file, alts.next()))
        .collect();

    match media_service.upload_files(batch).await {
        Ok(records) => Ok(HttpResponse::Created().json(records)),
        Err((file_name, e)) => Ok(upload_failed(&file_name, e.into())),
    }
}

#[instrument(skip(state, query))]
pub async fn list_media(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let pagination = Pagination::from_query(&query);
    let page = state.media_service.list_media(pagination).await?;

    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(state))]
pub async fn get_media_by_id(
    media_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let media = state.media_service.get_media_by_id(&media_id).await?;
    Ok(HttpResponse::Ok().json(media))
}

#[instrument(skip(state, data))]
pub async fn update_media(
    media_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateMediaRequest>,
) -> Result<impl Responder, AppError> {
    let media = state.media_service.update_media(&media_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(media))
}

#[instrument(skip(state))]
pub async fn delete_media(
    media_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.media_service.delete_media(&media_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
