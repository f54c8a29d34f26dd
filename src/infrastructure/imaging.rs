//! Image decoding, resampling and encoding.

pub mod decode;
pub mod encode;
pub mod placeholder;
pub mod transform;

pub use decode::{decode, SourceFormat, SourceImage};
pub use encode::OutputFormat;
pub use placeholder::{blur_placeholder, PlaceholderSpec, DATA_URI_PREFIX};
pub use transform::{blur, derived_height, resize};
