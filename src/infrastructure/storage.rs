use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::DynamicImage;
use uuid::Uuid;

use crate::{
    entities::media::{SizeLabel, SizeVariant},
    errors::MediaError,
    imaging::{OutputFormat, SourceFormat},
    settings::MediaConfig,
};

const FALLBACK_BASE_NAME: &str = "upload";

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub url: String,
}

/// Flat-file storage under the configured upload directory.
///
/// Files are always opened with create-new semantics: a name clash is an
/// error, never an overwrite.
#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
    url_prefix: String,
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        FileStore {
            upload_dir: upload_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        FileStore::new(config.upload_dir.clone(), config.url_prefix.clone())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Creates the upload directory if needed. Safe to call repeatedly.
    pub fn ensure_dir(&self) -> Result<(), MediaError> {
        fs::create_dir_all(&self.upload_dir).map_err(|e| {
            MediaError::Io(format!("failed to create upload directory {}: {e}", self.upload_dir.display()))
        })
    }

    /// `{urlPrefix}/{file_name}` with forward slashes only.
    pub fn public_url(&self, file_name: &str) -> String {
        let prefix = self.url_prefix.replace('\\', "/");
        let prefix = prefix.trim_end_matches('/');
        format!("{}/{}", prefix, file_name.replace('\\', "/"))
    }

    /// Stores the untouched upload as `{stem}.{ext}`.
    pub fn write_original(&self, stem: &str, format: SourceFormat, bytes: &[u8]) -> Result<StoredFile, MediaError> {
        let file_name = format!("{stem}.{}", format.extension());
        let path = self.upload_dir.join(&file_name);

        let mut file = self.create_new(&path)?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        drop(file);

        if let Err(e) = written {
            self.discard(&path);
            return Err(MediaError::Io(format!("failed to write {}: {e}", path.display())));
        }

        Ok(StoredFile { url: self.public_url(&file_name), file_name })
    }

    /// Encodes `image` and stores it as `{stem}-{label}.{ext}`.
    pub fn write_variant(
        &self,
        image: &DynamicImage,
        stem: &str,
        label: SizeLabel,
        output: OutputFormat,
    ) -> Result<(StoredFile, SizeVariant), MediaError> {
        let file_name = format!("{stem}-{label}.{}", output.extension());
        let path = self.upload_dir.join(&file_name);

        let file = self.create_new(&path)?;
        if let Err(e) = Self::encode_into(image, output, file) {
            self.discard(&path);
            return Err(e);
        }

        let url = self.public_url(&file_name);
        let variant = SizeVariant {
            width: image.width(),
            height: image.height(),
            url: url.clone(),
        };

        Ok((StoredFile { file_name, url }, variant))
    }

    fn encode_into(image: &DynamicImage, output: OutputFormat, file: File) -> Result<(), MediaError> {
        let mut writer = BufWriter::new(file);
        output.encode(image, &mut writer)?;

        let file = writer
            .into_inner()
            .map_err(|e| MediaError::Io(format!("failed to flush variant: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| MediaError::Io(format!("failed to sync variant: {e}")))
    }

    fn create_new(&self, path: &Path) -> Result<File, MediaError> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| MediaError::Io(format!("failed to create {}: {e}", path.display())))
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "Failed to remove partial file: {}", e);
        }
    }
}

/// `{baseName}-{32 hex chars}`: the original name without directories or
/// extension, made filesystem-safe, plus a random suffix.
pub fn unique_stem(original_filename: &str) -> String {
    format!("{}-{}", base_name(original_filename), Uuid::new_v4().simple())
}

pub fn base_name(original_filename: &str) -> String {
    let normalized = original_filename.replace('\\', "/");
    let last_segment = normalized.rsplit('/').next().unwrap_or_default();
    let stem = Path::new(last_segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');

    if cleaned.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
