use std::io::{Cursor, Read};
use std::path::Path;

use derive_more::Display;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};

use crate::errors::MediaError;

/// Largest width or height accepted, to keep decompression bombs out.
const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Container formats accepted for upload.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    #[display("JPEG")]
    Jpeg,
    #[display("PNG")]
    Png,
    #[display("GIF")]
    Gif,
}

impl SourceFormat {
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            ImageFormat::Png => Some(SourceFormat::Png),
            ImageFormat::Gif => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Gif => ImageFormat::Gif,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::Gif => "gif",
        }
    }
}

/// A decoded upload. Lives only as long as the upload being processed.
#[derive(Debug)]
pub struct SourceImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Reads the whole stream and decodes it.
///
/// The format is sniffed from the leading bytes; the filename is consulted
/// only when sniffing fails. Anything other than JPEG, PNG or GIF is a
/// `MediaError::Decode`.
pub fn decode<R: Read>(mut reader: R, filename_hint: &str) -> Result<SourceImage, MediaError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| MediaError::Io(format!("failed to read upload stream: {e}")))?;

    if bytes.is_empty() {
        return Err(MediaError::EmptyInput);
    }

    let format = detect_format(&bytes, filename_hint)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);

    let mut reader = ImageReader::with_format(Cursor::new(bytes.as_slice()), format.image_format());
    reader.limits(limits);

    let image = reader
        .decode()
        .map_err(|e| MediaError::Decode(format!("{format} data is corrupt or unsupported: {e}")))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(MediaError::Decode(format!("{format} image has zero dimensions")));
    }

    tracing::debug!(%format, width = image.width(), height = image.height(), "Decoded upload");

    Ok(SourceImage { image, format })
}

fn detect_format(bytes: &[u8], filename_hint: &str) -> Result<SourceFormat, MediaError> {
    let sniffed = image::guess_format(bytes).ok();
    let format = sniffed.or_else(|| ImageFormat::from_path(Path::new(filename_hint)).ok());

    match format {
        Some(format) => SourceFormat::from_image_format(format).ok_or_else(|| {
            MediaError::Decode(format!("{} images are not supported", format_name(format)))
        }),
        None => Err(MediaError::Decode("unrecognized image format".to_string())),
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_uppercase())
        .unwrap_or_else(|| format!("{format:?}"))
}
