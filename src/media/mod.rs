//! Image processing for uploads, rotation, and thumbnails.

pub mod codec;
mod upload;

pub use upload::{StageBatch, StagedUpload, UploadPipeline};
