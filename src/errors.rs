use std::borrow::Cow;
use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::entities::media::{SizeLabel, VariantSet};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnsupportedMedia(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::UnsupportedMedia(msg) => write!(f, "Unsupported media: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Database conflict occurred".into())
            }
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("IO error: {}", err))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::ContentTypeIncompatible => {
                AppError::InvalidInput("Expected a multipart/form-data request".to_string())
            }
            MultipartError::Payload(_) => {
                AppError::PayloadTooLarge("Upload payload rejected".to_string())
            }
            _ => AppError::InvalidInput(format!("Malformed multipart body: {}", err)),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::EmptyInput | MediaError::Decode(_) => AppError::UnsupportedMedia(err.to_string()),
            MediaError::InvalidImage(_) | MediaError::InvalidMetadata(_) => AppError::InvalidInput(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

/// Failures of the upload pipeline.
#[derive(Debug, Display)]
pub enum MediaError {
    #[display("Upload is empty")]
    EmptyInput,

    #[display("Failed to decode image: {_0}")]
    Decode(String),

    #[display("Invalid image: {_0}")]
    InvalidImage(String),

    #[display("Invalid upload metadata: {_0}")]
    InvalidMetadata(String),

    #[display("Failed to encode image: {_0}")]
    Encode(String),

    #[display("Storage error: {_0}")]
    Io(String),

    #[display("Failed to save media record: {_0}")]
    Persistence(String),

    /// Some variants could not be produced. `variants` holds the ones that
    /// were written before the upload was abandoned; `orphaned` names every
    /// file left in the upload directory, the original first.
    #[display("Failed to generate image variants: {failures}")]
    VariantsFailed {
        variants: VariantSet,
        failures: VariantFailures,
        orphaned: Vec<String>,
    },
}

impl std::error::Error for MediaError {}

#[derive(Debug, Clone)]
pub struct VariantFailure {
    pub label: SizeLabel,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct VariantFailures(pub Vec<VariantFailure>);

impl VariantFailures {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, label: SizeLabel, reason: impl Into<String>) {
        self.0.push(VariantFailure { label, reason: reason.into() });
    }
}

impl fmt::Display for VariantFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.0.iter()
            .map(|failure| format!("{}: {}", failure.label, failure.reason))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", messages)
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
