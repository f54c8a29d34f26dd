use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::errors::MediaError;

/// Every resize goes through the same filter so output is reproducible.
pub const RESAMPLING_FILTER: FilterType = FilterType::Lanczos3;

/// Height that keeps the source aspect ratio at `target_width`.
///
/// Rounds to the nearest pixel and never returns less than 1.
pub fn derived_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    let height = (target_width as f64 * source_height as f64 / source_width as f64).round();
    (height as u32).max(1)
}

/// Scales `image` to `target_width`. When `target_height` is `None` the
/// height is derived with [`derived_height`].
pub fn resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: Option<u32>,
) -> Result<DynamicImage, MediaError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidImage(format!("cannot resize a {width}x{height} image")));
    }
    if target_width == 0 || target_height == Some(0) {
        return Err(MediaError::InvalidImage("target dimensions must be positive".to_string()));
    }

    let target_height = target_height.unwrap_or_else(|| derived_height(width, height, target_width));

    Ok(image.resize_exact(target_width, target_height, RESAMPLING_FILTER))
}

/// Gaussian blur with standard deviation `sigma`.
pub fn blur(image: &DynamicImage, sigma: f32) -> Result<DynamicImage, MediaError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidImage(format!("cannot blur a {width}x{height} image")));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(MediaError::InvalidImage(format!("blur sigma must be positive, got {sigma}")));
    }

    Ok(image.blur(sigma))
}
