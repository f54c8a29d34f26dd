use tracing::{debug, error, warn};

use crate::{
    entities::media::{MediaInsert, SizeLabel, UploadedFile, VariantSet},
    errors::{MediaError, VariantFailures},
    imaging::{self, OutputFormat, PlaceholderSpec, SourceImage},
    settings::MediaConfig,
    storage::{unique_stem, FileStore, StoredFile},
};

/// Result of rendering the size variants of one upload. Successes and
/// failures are both kept so callers can decide what a partial result means.
#[derive(Debug, Default)]
pub struct VariantOutcome {
    pub variants: VariantSet,
    pub written: Vec<StoredFile>,
    pub failures: VariantFailures,
    /// Sizes wider than the source. These are not rendered (no upscaling).
    pub skipped: Vec<SizeLabel>,
}

/// Everything produced for an upload before it is handed to storage.
#[derive(Debug)]
pub struct ProcessedUpload {
    pub insert: MediaInsert,
    pub written_files: Vec<String>,
}

/// Synchronous, CPU-bound half of an upload: decode, placeholder, variants
/// and file writes.
#[derive(Debug, Clone)]
pub struct MediaPipeline {
    config: MediaConfig,
    store: FileStore,
}

impl MediaPipeline {
    pub fn new(config: MediaConfig) -> Self {
        let store = FileStore::from_config(&config);
        MediaPipeline { config, store }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Decodes the upload, stores the original (the primary rendition),
    /// builds the placeholder and every size variant.
    ///
    /// Nothing is written when decoding fails. Any variant failure aborts
    /// with `MediaError::VariantsFailed`, which carries the variants that
    /// were written and the names of every file left behind.
    pub fn process(&self, file: &UploadedFile, alt: &str) -> Result<ProcessedUpload, MediaError> {
        let source = imaging::decode(file.bytes.as_slice(), &file.file_name)?;

        self.store.ensure_dir()?;
        let stem = unique_stem(&file.file_name);
        let original = self.store.write_original(&stem, source.format, &file.bytes)?;
        debug!(file = %original.file_name, "Stored original upload");

        let blur_url = self.placeholder(&source, &file.file_name);

        let outcome = self.generate_variants(&source, &stem);
        if !outcome.failures.is_empty() {
            let mut orphaned = vec![original.file_name];
            orphaned.extend(outcome.written.into_iter().map(|stored| stored.file_name));
            error!(
                files = ?orphaned,
                "Variant generation failed, written files are orphaned: {}", outcome.failures
            );
            return Err(MediaError::VariantsFailed {
                variants: outcome.variants,
                failures: outcome.failures,
                orphaned,
            });
        }

        let thumbnail_url = outcome
            .variants
            .smallest()
            .map(|variant| variant.url.clone())
            .unwrap_or_else(|| original.url.clone());

        let mut written_files = vec![original.file_name];
        written_files.extend(outcome.written.into_iter().map(|stored| stored.file_name));

        let insert = MediaInsert {
            file_name: file.file_name.clone(),
            mime_type: source.format.mime_type().to_string(),
            size: file.size() as i64,
            url: original.url,
            thumbnail_url,
            blur_url,
            width: source.width() as i32,
            height: source.height() as i32,
            media_sizes: outcome.variants,
            alt: alt.to_string(),
        };

        Ok(ProcessedUpload { insert, written_files })
    }

    /// Blur-up preview as a data URI, or an empty string if it could not be
    /// produced. Never fails the upload.
    pub fn placeholder(&self, source: &SourceImage, file_name: &str) -> String {
        let spec = PlaceholderSpec {
            width: self.config.placeholder_width,
            sigma: self.config.placeholder_sigma,
            quality: self.config.placeholder_quality,
        };

        match imaging::blur_placeholder(&source.image, spec) {
            Ok(uri) => uri,
            Err(e) => {
                warn!(file = %file_name, "Failed to generate blur placeholder: {}", e);
                String::new()
            }
        }
    }

    /// Resizes and writes each configured size independently.
    pub fn generate_variants(&self, source: &SourceImage, stem: &str) -> VariantOutcome {
        let output = OutputFormat::for_source(source.format, self.config.variant_quality);
        let mut outcome = VariantOutcome::default();

        for (label, width) in SizeLabel::ALL.into_iter().zip(self.config.widths()) {
            if width > source.width() {
                debug!(%label, width, source_width = source.width(), "Skipping variant wider than source");
                outcome.skipped.push(label);
                continue;
            }

            let written = imaging::resize(&source.image, width, None)
                .and_then(|resized| self.store.write_variant(&resized, stem, label, output));

            match written {
                Ok((stored, variant)) => {
                    debug!(%label, width = variant.width, height = variant.height, "Wrote variant");
                    outcome.variants.insert(label, variant);
                    outcome.written.push(stored);
                }
                Err(e) => {
                    warn!(%label, "Failed to generate variant: {}", e);
                    outcome.failures.push(label, e.to_string());
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::{fs, io::Cursor};
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> MediaPipeline {
        MediaPipeline::new(MediaConfig {
            upload_dir: dir.path().join("uploads"),
            url_prefix: "/public/uploads".into(),
            ..MediaConfig::default()
        })
    }

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 251) as u8, (y % 241) as u8, 60])
        }));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn files_in(dir: &TempDir) -> Vec<String> {
        match fs::read_dir(dir.path().join("uploads")) {
            Ok(entries) => entries.map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn renders_all_three_sizes_for_a_large_jpeg() {
        let dir = TempDir::new().unwrap();
        let upload = UploadedFile::new("photo.jpg", encoded(2000, 1000, ImageFormat::Jpeg));

        let processed = pipeline(&dir).process(&upload, "sunset").unwrap();
        let insert = &processed.insert;

        for (label, width) in [(SizeLabel::Small, 320), (SizeLabel::Medium, 640), (SizeLabel::Large, 1024)] {
            let variant = insert.media_sizes.get(label).expect("variant present");
            assert_eq!((variant.width, variant.height), (width, width / 2));
            assert!(variant.url.starts_with("/public/uploads/photo-"));
            assert!(variant.url.ends_with(&format!("-{label}.jpg")));
        }

        assert_eq!(insert.mime_type, "image/jpeg");
        assert_eq!((insert.width, insert.height), (2000, 1000));
        assert!(insert.url.ends_with(".jpg") && !insert.url.contains("-large"));
        assert_eq!(insert.thumbnail_url, insert.media_sizes.small.as_ref().unwrap().url);
        assert!(insert.blur_url.starts_with(imaging::DATA_URI_PREFIX));
        assert_eq!(insert.alt, "sunset");
        assert_eq!(processed.written_files.len(), 4);
        assert_eq!(files_in(&dir).len(), 4);
    }

    #[test]
    fn small_png_is_not_upscaled() {
        let dir = TempDir::new().unwrap();
        let upload = UploadedFile::new("icon.png", encoded(50, 50, ImageFormat::Png));

        let processed = pipeline(&dir).process(&upload, "").unwrap();

        assert!(processed.insert.media_sizes.is_empty());
        assert_eq!(processed.insert.thumbnail_url, processed.insert.url);
        assert!(processed.insert.url.ends_with(".png"));
        assert_eq!(files_in(&dir).len(), 1);
    }

    #[test]
    fn mid_sized_image_gets_only_the_sizes_it_can_fill() {
        let dir = TempDir::new().unwrap();
        let upload = UploadedFile::new("banner.png", encoded(700, 100, ImageFormat::Png));

        let processed = pipeline(&dir).process(&upload, "").unwrap();
        let sizes = &processed.insert.media_sizes;

        assert!(sizes.small.is_some() && sizes.medium.is_some());
        assert!(sizes.large.is_none());
        assert!(sizes.medium.as_ref().unwrap().url.ends_with("-medium.png"));
    }

    #[test]
    fn non_image_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let upload = UploadedFile::new("notes.txt", b"hello there".to_vec());

        let err = pipeline(&dir).process(&upload, "").unwrap_err();

        assert!(matches!(err, MediaError::Decode(_)));
        assert!(files_in(&dir).is_empty());
    }

    #[test]
    fn variant_failures_are_collected_with_partial_successes() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline.store().ensure_dir().unwrap();

        let source = imaging::decode(encoded(1200, 600, ImageFormat::Jpeg).as_slice(), "a.jpg").unwrap();

        // Occupy the medium variant's file name so its create-new open fails
        fs::write(dir.path().join("uploads").join("taken-medium.jpg"), b"existing").unwrap();

        let outcome = pipeline.generate_variants(&source, "taken");

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures.0[0].label, SizeLabel::Medium);
        assert!(outcome.variants.small.is_some());
        assert!(outcome.variants.large.is_some());
        assert_eq!(outcome.written.len(), 2);
        assert_eq!(
            fs::read(dir.path().join("uploads").join("taken-medium.jpg")).unwrap(),
            b"existing"
        );
    }

    #[test]
    fn placeholder_failure_does_not_fail_the_upload() {
        let dir = TempDir::new().unwrap();
        let pipeline = MediaPipeline::new(MediaConfig {
            placeholder_sigma: 0.0,
            ..pipeline(&dir).config().clone()
        });
        let upload = UploadedFile::new("photo.jpg", encoded(2000, 1000, ImageFormat::Jpeg));

        let processed = pipeline.process(&upload, "dusk").unwrap();

        assert!(processed.insert.blur_url.is_empty());
        assert_eq!(processed.insert.media_sizes.len(), 3);
        assert_eq!(processed.written_files.len(), 4);
        assert_eq!(files_in(&dir).len(), 4);
    }

    #[test]
    fn variant_failure_reports_every_file_left_on_disk() {
        let dir = TempDir::new().unwrap();
        // a zero width cannot be resized to, so only small fails
        let pipeline = MediaPipeline::new(MediaConfig {
            small_width: 0,
            ..pipeline(&dir).config().clone()
        });
        let upload = UploadedFile::new("photo.jpg", encoded(1200, 600, ImageFormat::Jpeg));

        let err = pipeline.process(&upload, "").unwrap_err();

        let (variants, failures, orphaned) = match err {
            MediaError::VariantsFailed { variants, failures, orphaned } => (variants, failures, orphaned),
            other => panic!("expected VariantsFailed, got {other:?}"),
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures.0[0].label, SizeLabel::Small);
        assert!(variants.small.is_none());
        assert_eq!(variants.len(), 2);

        assert_eq!(orphaned.len(), 3);
        assert!(orphaned[0].starts_with("photo-") && orphaned[0].ends_with(".jpg"));
        assert!(!orphaned[0].contains("-medium") && !orphaned[0].contains("-large"));
        let mut on_disk = files_in(&dir);
        let mut expected = orphaned.clone();
        on_disk.sort();
        expected.sort();
        assert_eq!(on_disk, expected);
    }

    #[test]
    fn same_name_uploads_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let upload = UploadedFile::new("photo.jpg", encoded(800, 400, ImageFormat::Jpeg));

        let first = pipeline.process(&upload, "").unwrap();
        let second = pipeline.process(&upload, "").unwrap();

        assert_ne!(first.insert.url, second.insert.url);
        for (label, variant) in first.insert.media_sizes.iter() {
            assert_ne!(Some(&variant.url), second.insert.media_sizes.get(label).map(|v| &v.url));
        }
        assert_eq!(files_in(&dir).len(), first.written_files.len() + second.written_files.len());
    }
}
