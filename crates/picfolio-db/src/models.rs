//! Rust models matching the database schema.
//!
//! Album and image reference each other only through id fields. An image's
//! `album_id` is its owning album; an album's `cover_photo_id` is a weak
//! pointer to one of its images.

use std::path::Path;

use chrono::{DateTime, Utc};
use picfolio_common::{AlbumId, ImageId};
use serde::{Deserialize, Serialize};

/// Album model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub description: Option<String>,
    pub cover_photo_id: Option<ImageId>,
    pub created_at: DateTime<Utc>,
}

/// Image model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: ImageId,
    pub album_id: AlbumId,
    /// Absolute path of the original file.
    pub path: String,
    /// Lower-cased extension taken from the uploaded file name.
    pub file_type: String,
    /// Original file name.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Byte length of the uploaded original.
    pub size_bytes: i64,
    /// Pixel height in display orientation.
    pub height: u32,
    /// Pixel width in display orientation.
    pub width: u32,
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Path of the original file on disk.
    pub fn file_path(&self) -> &Path {
        Path::new(&self.path)
    }
}
