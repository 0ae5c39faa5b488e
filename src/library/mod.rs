//! The album and image managers and the library that wires them together.
//!
//! [`MediaLibrary`] owns one of each collaborator (pool, file store, reaper,
//! upload pipeline) and hands clones to the managers. All paths come from the
//! [`LibraryPaths`] it is opened with.

mod albums;
mod images;

pub use albums::AlbumManager;
pub use images::{ImageManager, UploadBatch};

use std::path::Path;

use picfolio_common::{Error, Result};
use picfolio_db::pool::{init_memory_pool, init_pool, DbPool};
use tracing::info;

use crate::config::{Config, LibraryPaths, ThumbnailConfig};
use crate::media::UploadPipeline;
use crate::storage::{FileReaper, FileStore};

/// A photo library rooted at one image directory and one database.
///
/// Must be created inside a Tokio runtime; the file reaper runs as a task on
/// it.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    pool: DbPool,
    files: FileStore,
    reaper: FileReaper,
    uploads: UploadPipeline,
    albums: AlbumManager,
    images: ImageManager,
}

impl MediaLibrary {
    /// Open the library described by `config`, resolving relative paths
    /// against the current directory.
    pub fn open(config: &Config) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let paths = LibraryPaths::resolve(&config.storage, &cwd);
        Self::open_at(paths, config.thumbnail)
    }

    /// Open a library at already-resolved paths, creating directories and the
    /// database as needed.
    pub fn open_at(paths: LibraryPaths, thumbnail: ThumbnailConfig) -> Result<Self> {
        paths.ensure_dirs().map_err(|e| {
            Error::storage(format!(
                "Failed to create library directories under {}: {}",
                paths.image_dir.display(),
                e
            ))
        })?;

        let db_path = paths.database_path.to_str().ok_or_else(|| {
            Error::invalid_input(format!(
                "Database path is not valid UTF-8: {}",
                paths.database_path.display()
            ))
        })?;
        let pool = init_pool(db_path)?;

        info!(
            images = %paths.image_dir.display(),
            database = %paths.database_path.display(),
            "Opened library"
        );
        Ok(Self::assemble(pool, paths, thumbnail))
    }

    /// A library with files under `base` and an in-memory database.
    pub fn in_memory(base: &Path) -> Result<Self> {
        let paths = LibraryPaths {
            image_dir: base.join("images"),
            staging_dir: base.join("staging"),
            database_path: base.join("unused.db"),
        };
        std::fs::create_dir_all(&paths.image_dir)?;
        std::fs::create_dir_all(&paths.staging_dir)?;

        let pool = init_memory_pool()?;
        Ok(Self::assemble(pool, paths, ThumbnailConfig::default()))
    }

    fn assemble(pool: DbPool, paths: LibraryPaths, thumbnail: ThumbnailConfig) -> Self {
        let files = FileStore::new(paths.image_dir.clone());
        let reaper = FileReaper::spawn();
        let uploads = UploadPipeline::new(paths.staging_dir.clone(), thumbnail);
        let albums = AlbumManager::new(pool.clone(), files.clone(), reaper.clone());
        let images = ImageManager::new(
            pool.clone(),
            files.clone(),
            reaper.clone(),
            albums.clone(),
            uploads.clone(),
            thumbnail,
        );

        Self {
            pool,
            files,
            reaper,
            uploads,
            albums,
            images,
        }
    }

    pub fn albums(&self) -> &AlbumManager {
        &self.albums
    }

    pub fn images(&self) -> &ImageManager {
        &self.images
    }

    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn reaper(&self) -> &FileReaper {
        &self.reaper
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Wait for queued file removals to finish.
    pub async fn shutdown(&self) {
        self.reaper.flush().await;
    }
}
