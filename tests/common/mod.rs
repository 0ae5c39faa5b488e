//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], a [`MediaLibrary`] whose files live in a
//! temporary directory, plus helpers that synthesise image uploads.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use picfolio::config::{LibraryPaths, ThumbnailConfig};
use picfolio::library::MediaLibrary;
use picfolio::storage::thumbnail_path_for;
use picfolio_common::{AlbumId, ImageId};
use picfolio_db::models::{Album, Image};
use picfolio_db::pool::{get_conn, PooledConnection};
use tempfile::TempDir;

/// A library backed by a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub library: MediaLibrary,
}

impl TestHarness {
    /// Files in a temp dir, database in memory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let library = MediaLibrary::in_memory(dir.path()).expect("failed to open library");
        Self { dir, library }
    }

    /// Files and a SQLite database file in a temp dir.
    pub fn on_disk() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let paths = LibraryPaths {
            image_dir: dir.path().join("images"),
            staging_dir: dir.path().join("staging"),
            database_path: dir.path().join("picfolio.db"),
        };
        let library =
            MediaLibrary::open_at(paths, ThumbnailConfig::default()).expect("failed to open library");
        Self { dir, library }
    }

    pub fn conn(&self) -> PooledConnection {
        get_conn(self.library.pool()).expect("failed to get connection")
    }

    pub fn create_album(&self, title: &str) -> Album {
        self.library
            .albums()
            .create_album(title, None)
            .expect("failed to create album")
    }

    pub fn album(&self, id: AlbumId) -> Option<Album> {
        self.library.albums().get_album(id).expect("failed to get album")
    }

    pub fn image(&self, id: ImageId) -> Option<Image> {
        self.library.images().get_image(id).expect("failed to get image")
    }

    pub fn cover_of(&self, id: AlbumId) -> Option<ImageId> {
        self.album(id).and_then(|a| a.cover_photo_id)
    }

    pub fn images_of(&self, id: AlbumId) -> Vec<ImageId> {
        self.library
            .images()
            .get_all_images_by_album(id)
            .expect("failed to list images")
            .into_iter()
            .map(|i| i.id)
            .collect()
    }

    /// Upload a generated JPEG of the given size.
    pub async fn upload_jpeg(&self, album_id: AlbumId, name: &str, width: u32, height: u32) -> ImageId {
        self.library
            .images()
            .upload(album_id, jpeg(width, height), name)
            .await
            .expect("upload failed")
    }

    /// Wait for background file removals.
    pub async fn settle(&self) {
        self.library.reaper().flush().await;
    }

    pub fn album_dir(&self, id: AlbumId) -> PathBuf {
        self.library.albums().get_album_path(id)
    }

    pub fn staging_files(&self) -> usize {
        std::fs::read_dir(self.library.uploads().staging_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn thumbnail_of(image: &Image) -> PathBuf {
    thumbnail_path_for(image.file_path())
}

/// Dimensions of an image file on disk.
pub fn dimensions_on_disk(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).expect("failed to read image dimensions")
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Encoded image bytes in the given format.
pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, format)
        .expect("failed to encode test image");
    buf.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

/// A JPEG stored `width` x `height` carrying an EXIF orientation tag.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let plain = jpeg(width, height);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08"); // big-endian header, IFD at 8
    tiff.extend_from_slice(&1u16.to_be_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(plain.len() + payload.len() + 4);
    out.extend_from_slice(&plain[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&plain[2..]);
    out
}
