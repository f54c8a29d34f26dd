pub mod media;
pub mod pipeline;
