use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

// ───── Constants ──────────────────────────────────────────────────────
pub const MAX_ALT_LENGTH: u64 = 255;
const MAX_FILE_NAME_LENGTH: u64 = 255;

// ───── Variants ──────────────────────────────────────────────────────

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeLabel {
    #[display("small")]
    Small,
    #[display("medium")]
    Medium,
    #[display("large")]
    Large,
}

impl SizeLabel {
    /// Smallest first.
    pub const ALL: [SizeLabel; 3] = [SizeLabel::Small, SizeLabel::Medium, SizeLabel::Large];
}

/// One resized rendition of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// The renditions generated for an upload, keyed by size. A missing key
/// means that size was not produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<SizeVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<SizeVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<SizeVariant>,
}

impl VariantSet {
    pub fn get(&self, label: SizeLabel) -> Option<&SizeVariant> {
        match label {
            SizeLabel::Small => self.small.as_ref(),
            SizeLabel::Medium => self.medium.as_ref(),
            SizeLabel::Large => self.large.as_ref(),
        }
    }

    pub fn insert(&mut self, label: SizeLabel, variant: SizeVariant) {
        let slot = match label {
            SizeLabel::Small => &mut self.small,
            SizeLabel::Medium => &mut self.medium,
            SizeLabel::Large => &mut self.large,
        };
        *slot = Some(variant);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SizeLabel, &SizeVariant)> {
        SizeLabel::ALL
            .into_iter()
            .filter_map(move |label| self.get(label).map(|variant| (label, variant)))
    }

    /// The smallest rendition present, used as the thumbnail.
    pub fn smallest(&self) -> Option<&SizeVariant> {
        self.iter().next().map(|(_, variant)| variant)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ───── Upload Input ──────────────────────────────────────────────────

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile { file_name: file_name.into(), bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MediaRecord {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub thumbnail_url: String,
    pub blur_url: String,
    pub width: i32,
    pub height: i32,
    pub media_sizes: Json<VariantSet>,
    pub alt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A fully processed upload, ready to be stored.
#[derive(Debug, Clone)]
pub struct MediaInsert {
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub thumbnail_url: String,
    pub blur_url: String,
    pub width: i32,
    pub height: i32,
    pub media_sizes: VariantSet,
    pub alt: String,
}

// ───── API Request Models ───────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMediaRequest {
    #[validate(length(max = MAX_ALT_LENGTH, message = "Alt text must be at most 255 characters"))]
    pub alt: Option<String>,

    #[validate(length(min = 1, max = MAX_FILE_NAME_LENGTH, message = "File name must be 1-255 characters"))]
    pub file_name: Option<String>,
}

impl UpdateMediaRequest {
    pub fn is_empty(&self) -> bool {
        self.alt.is_none() && self.file_name.is_none()
    }
}
