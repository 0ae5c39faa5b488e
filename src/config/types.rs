use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per album
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Where uploads are decoded and written before they join an album
    /// (default: `<image_dir>/temp`)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Staging files older than this are removed by `reconcile` (default: 24)
    #[serde(default = "default_staging_max_age")]
    pub staging_max_age_hours: u64,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./data/images")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/picfolio.db")
}

fn default_staging_max_age() -> u64 {
    24
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            staging_dir: None,
            database_path: default_database_path(),
            staging_max_age_hours: default_staging_max_age(),
        }
    }
}

impl StorageConfig {
    /// Staging directory, falling back to `temp` under the image root.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.image_dir.join("temp"))
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    /// Thumbnails fit inside a square of this many pixels (default: 650)
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG quality for every re-encode, 1-100 (default: 100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_dimension() -> u32 {
    650
}

fn default_jpeg_quality() -> u8 {
    100
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Absolute locations derived from [`StorageConfig`].
///
/// Built once at startup and handed to the file store and upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub image_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub database_path: PathBuf,
}

impl LibraryPaths {
    /// Resolve relative paths against `base`.
    pub fn resolve(storage: &StorageConfig, base: &Path) -> Self {
        let absolute = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };

        Self {
            image_dir: absolute(&storage.image_dir),
            staging_dir: absolute(&storage.staging_dir()),
            database_path: absolute(&storage.database_path),
        }
    }

    /// Create the image root, the staging directory, and the database's parent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.image_dir)?;
        std::fs::create_dir_all(&self.staging_dir)?;
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
