//! Staging of uploaded bytes.
//!
//! An upload is decoded, turned upright, re-encoded into the staging
//! directory, and measured. The staged file is later moved into its album by
//! the image manager; nothing here touches the database.

use std::path::{Path, PathBuf};

use chrono::Utc;
use picfolio_common::paths::{file_stem_of, file_type_of};
use picfolio_common::{Error, Result};
use serde::Serialize;
use tracing::debug;

use super::codec;
use crate::config::ThumbnailConfig;

/// An upload written to the staging directory and ready to join an album.
#[derive(Debug, Clone, Serialize)]
pub struct StagedUpload {
    pub staged_path: PathBuf,
    /// Lower-cased extension of the uploaded name; empty when it had none.
    pub file_type: String,
    /// The uploaded file name as the client sent it.
    pub title: String,
    /// Byte length of the upload as received.
    pub size: u64,
    pub height: u32,
    pub width: u32,
}

/// Result of staging several parts of one request.
///
/// Staging stops at the first failure; `staged` holds what succeeded before it.
#[derive(Debug, Default)]
pub struct StageBatch {
    pub staged: Vec<StagedUpload>,
    pub error: Option<Error>,
}

/// Decodes uploads and writes them to the staging directory.
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    staging_dir: PathBuf,
    jpeg_quality: u8,
}

impl UploadPipeline {
    pub fn new(staging_dir: PathBuf, thumbnail: ThumbnailConfig) -> Self {
        Self {
            staging_dir,
            jpeg_quality: thumbnail.jpeg_quality,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stage one upload.
    ///
    /// Fails with [`Error::Decode`] when the bytes are not a supported image;
    /// in that case no file is written.
    pub async fn stage(&self, bytes: Vec<u8>, file_name: &str) -> Result<StagedUpload> {
        let pipeline = self.clone();
        let file_name = file_name.to_string();

        tokio::task::spawn_blocking(move || pipeline.stage_blocking(&bytes, &file_name))
            .await
            .map_err(|e| Error::internal(format!("Staging task failed: {}", e)))?
    }

    /// Stage every named part in order, stopping at the first failure.
    ///
    /// Parts with an empty file name are form fields without a file and are
    /// skipped.
    pub async fn stage_many<I>(&self, parts: I) -> StageBatch
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut batch = StageBatch::default();

        for (file_name, bytes) in parts {
            if file_name.is_empty() {
                continue;
            }
            match self.stage(bytes, &file_name).await {
                Ok(staged) => batch.staged.push(staged),
                Err(e) => {
                    batch.error = Some(e);
                    break;
                }
            }
        }

        batch
    }

    /// Synchronous body of [`stage`](Self::stage).
    fn stage_blocking(&self, bytes: &[u8], file_name: &str) -> Result<StagedUpload> {
        let decoded = codec::decode_normalized(bytes)?;
        let file_type = file_type_of(file_name);
        let name = staging_name(file_name, Utc::now().timestamp_millis());
        let staged_path = self.staging_dir.join(name);

        std::fs::create_dir_all(&self.staging_dir).map_err(|e| {
            Error::storage(format!(
                "Failed to create staging directory {}: {}",
                self.staging_dir.display(),
                e
            ))
        })?;

        codec::save(&decoded.image, &staged_path, self.jpeg_quality, decoded.format)?;

        debug!(
            file_name,
            staged = %staged_path.display(),
            width = decoded.image.width(),
            height = decoded.image.height(),
            "Staged upload"
        );

        Ok(StagedUpload {
            staged_path,
            file_type,
            title: file_name.to_string(),
            size: bytes.len() as u64,
            height: decoded.image.height(),
            width: decoded.image.width(),
        })
    }
}

/// Longest stem, in bytes, carried into a staging name.
const MAX_STEM_BYTES: usize = 100;

/// `<stem>-<millis>-<suffix>.<ext>`, lower-cased with spaces as dashes.
///
/// The stem is cut to [`MAX_STEM_BYTES`] on a char boundary so long client
/// names still fit the filesystem's name limit.
fn staging_name(file_name: &str, millis: i64) -> String {
    let mut stem = file_stem_of(file_name).to_lowercase().replace(' ', "-");
    if stem.len() > MAX_STEM_BYTES {
        let mut end = MAX_STEM_BYTES;
        while !stem.is_char_boundary(end) {
            end -= 1;
        }
        stem.truncate(end);
    }
    let file_type = file_type_of(file_name);
    let suffix: u16 = rand::random();

    if file_type.is_empty() {
        format!("{}-{}-{:04x}", stem, millis, suffix)
    } else {
        format!("{}-{}-{:04x}.{}", stem, millis, suffix, file_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::codec::test_images::{encode, marked};
    use image::{GenericImageView, ImageFormat};

    fn pipeline(dir: &Path) -> UploadPipeline {
        UploadPipeline::new(dir.join("temp"), ThumbnailConfig::default())
    }

    #[test]
    fn test_staging_name() {
        let name = staging_name("My Holiday Photo.JPG", 1700000000000);
        assert!(name.starts_with("my-holiday-photo-1700000000000-"));
        assert!(name.ends_with(".jpg"));

        let bare = staging_name("README", 1);
        assert!(bare.starts_with("readme-1-"));
        assert!(!bare.contains('.'));
    }

    #[test]
    fn test_staging_name_caps_long_stems() {
        let long = format!("{}.jpg", "a".repeat(300));
        let name = staging_name(&long, 1700000000000);
        assert!(name.starts_with(&format!("{}-1700000000000-", "a".repeat(MAX_STEM_BYTES))));
        assert!(name.ends_with(".jpg"));
        assert!(name.len() < 255);

        // Two-byte chars: the cut never splits one.
        let accented = format!("{}.png", "é".repeat(120));
        let name = staging_name(&accented, 1);
        assert!(name.starts_with(&format!("{}-1-", "é".repeat(MAX_STEM_BYTES / 2))));
    }

    #[tokio::test]
    async fn test_stage_with_very_long_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encode(&marked(30, 20), ImageFormat::Png);
        let file_name = format!("{}.png", "holiday ".repeat(40));

        let staged = pipeline(dir.path()).stage(bytes, &file_name).await.unwrap();

        assert!(staged.staged_path.is_file());
        assert_eq!(staged.title, file_name);
        assert_eq!(staged.file_type, "png");
    }

    #[test]
    fn test_staging_names_differ_within_one_millisecond() {
        let names: std::collections::HashSet<_> =
            (0..8).map(|_| staging_name("a.jpg", 42)).collect();
        assert!(names.len() > 1);
    }

    #[tokio::test]
    async fn test_stage_png() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encode(&marked(300, 200), ImageFormat::Png);
        let len = bytes.len() as u64;

        let staged = pipeline(dir.path()).stage(bytes, "Beach Day.PNG").await.unwrap();

        assert_eq!(staged.file_type, "png");
        assert_eq!(staged.title, "Beach Day.PNG");
        assert_eq!(staged.size, len);
        assert_eq!((staged.width, staged.height), (300, 200));
        assert!(staged.staged_path.starts_with(dir.path().join("temp")));
        assert!(staged.staged_path.is_file());
    }

    #[tokio::test]
    async fn test_stage_reencodes_to_extension_format() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encode(&marked(64, 48), ImageFormat::Png);

        let staged = pipeline(dir.path()).stage(bytes, "mislabelled.jpg").await.unwrap();

        let written = std::fs::read(&staged.staged_path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
        assert_eq!(codec::open(&staged.staged_path).unwrap().dimensions(), (64, 48));
    }

    #[tokio::test]
    async fn test_stage_without_extension_keeps_source_format() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = encode(&marked(10, 10), ImageFormat::Png);

        let staged = pipeline(dir.path()).stage(bytes, "noext").await.unwrap();

        assert_eq!(staged.file_type, "");
        let written = std::fs::read(&staged.staged_path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_stage_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let err = pipeline
            .stage(b"plain text".to_vec(), "notes.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode(_)));
        let leftovers = std::fs::read_dir(pipeline.staging_dir())
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_stage_many_skips_empty_names_and_stops_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let png = encode(&marked(10, 10), ImageFormat::Png);

        let batch = pipeline(dir.path())
            .stage_many(vec![
                ("a.png".to_string(), png.clone()),
                (String::new(), b"field value".to_vec()),
                ("b.png".to_string(), png.clone()),
                ("broken.png".to_string(), b"nope".to_vec()),
                ("c.png".to_string(), png),
            ])
            .await;

        let titles: Vec<_> = batch.staged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["a.png", "b.png"]);
        assert!(matches!(batch.error, Some(Error::Decode(_))));
    }
}
