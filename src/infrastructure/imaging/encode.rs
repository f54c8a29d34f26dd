use std::io::Write;

use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    DynamicImage,
};

use crate::{errors::MediaError, imaging::SourceFormat};

/// Encoding used for a written rendition. The file extension always
/// matches the bytes actually produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    /// JPEG sources stay JPEG; PNG and GIF sources become PNG so
    /// transparency survives resizing.
    pub fn for_source(source: SourceFormat, jpeg_quality: u8) -> Self {
        match source {
            SourceFormat::Jpeg => OutputFormat::Jpeg { quality: jpeg_quality },
            SourceFormat::Png | SourceFormat::Gif => OutputFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn encode<W: Write>(&self, image: &DynamicImage, writer: W) -> Result<(), MediaError> {
        match *self {
            OutputFormat::Jpeg { quality } => encode_jpeg(image, quality, writer),
            OutputFormat::Png => image
                .write_with_encoder(PngEncoder::new(writer))
                .map_err(|e| MediaError::Encode(format!("PNG encoding failed: {e}"))),
        }
    }
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg<W: Write>(image: &DynamicImage, quality: u8, writer: W) -> Result<(), MediaError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality.clamp(1, 100)))
        .map_err(|e| MediaError::Encode(format!("JPEG encoding failed: {e}")))
}
