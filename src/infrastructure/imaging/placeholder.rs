use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;

use crate::{
    errors::MediaError,
    imaging::{encode::encode_jpeg, transform},
};

pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// How the inline blur-up preview is produced: shrink to `width`, blur with
/// `sigma`, encode as JPEG at `quality`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderSpec {
    pub width: u32,
    pub sigma: f32,
    pub quality: u8,
}

impl Default for PlaceholderSpec {
    fn default() -> Self {
        PlaceholderSpec { width: 64, sigma: 5.0, quality: 30 }
    }
}

/// Thumbnails the source, blurs it and returns a JPEG data URI.
pub fn blur_placeholder(source: &DynamicImage, spec: PlaceholderSpec) -> Result<String, MediaError> {
    let width = spec.width.min(source.width().max(1));
    let thumbnail = transform::resize(source, width, None)?;
    let blurred = transform::blur(&thumbnail, spec.sigma)?;
    encode_placeholder(&blurred, spec.quality)
}

/// Encodes an already blurred image as `data:image/jpeg;base64,...`.
pub fn encode_placeholder(image: &DynamicImage, quality: u8) -> Result<String, MediaError> {
    let mut buf = Vec::new();
    encode_jpeg(image, quality, &mut buf)?;

    let encoded = STANDARD.encode(&buf);
    if encoded.is_empty() {
        return Err(MediaError::Encode("placeholder encoding produced no data".to_string()));
    }

    Ok(format!("{DATA_URI_PREFIX}{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

    fn photo(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 90])
        }))
    }

    fn decode_uri(uri: &str) -> DynamicImage {
        let payload = uri.strip_prefix(DATA_URI_PREFIX).expect("data URI prefix");
        let bytes = STANDARD.decode(payload).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn placeholder_is_a_small_jpeg_data_uri() {
        let uri = blur_placeholder(&photo(2000, 1000), PlaceholderSpec::default()).unwrap();

        assert!(uri.starts_with(DATA_URI_PREFIX));
        assert!(uri.len() > DATA_URI_PREFIX.len());
        assert_eq!(decode_uri(&uri).dimensions(), (64, 32));
    }

    #[test]
    fn small_sources_are_not_upscaled() {
        let uri = blur_placeholder(&photo(20, 10), PlaceholderSpec::default()).unwrap();
        assert_eq!(decode_uri(&uri).dimensions(), (20, 10));
    }

    #[test]
    fn placeholder_is_deterministic() {
        let source = photo(300, 200);
        let first = blur_placeholder(&source, PlaceholderSpec::default()).unwrap();
        let second = blur_placeholder(&source, PlaceholderSpec::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_sigma_fails_without_panicking() {
        let spec = PlaceholderSpec { sigma: 0.0, ..PlaceholderSpec::default() };
        assert!(matches!(blur_placeholder(&photo(10, 10), spec), Err(MediaError::InvalidImage(_))));
    }
}
