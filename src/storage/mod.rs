//! Filesystem layout of the photo library.
//!
//! Every album owns one directory named by its id directly under the image
//! root. An image's original and its thumbnail are sibling files in that
//! directory:
//!
//! ```text
//! <root>/<album_id>/<image_id>.<file_type>
//! <root>/<album_id>/<image_id>.thumb.jpg
//! ```
//!
//! [`FileStore`] performs the synchronous filesystem steps the managers need;
//! [`FileReaper`] removes files in the background once their records are gone.

mod reaper;

pub use reaper::FileReaper;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use picfolio_common::{AlbumId, Error, ImageId, Result};
use walkdir::WalkDir;

/// Appended to an original's stem to name its thumbnail.
pub const THUMBNAIL_SUFFIX: &str = ".thumb.jpg";

/// Derive the thumbnail path of an original: drop the trailing extension and
/// append [`THUMBNAIL_SUFFIX`].
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use picfolio::storage::thumbnail_path_for;
///
/// assert_eq!(
///     thumbnail_path_for(Path::new("/lib/a1/i1.png")),
///     PathBuf::from("/lib/a1/i1.thumb.jpg"),
/// );
/// ```
pub fn thumbnail_path_for(original: &Path) -> PathBuf {
    let mut name: OsString = original
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(THUMBNAIL_SUFFIX);
    original.with_file_name(name)
}

/// Filesystem operations scoped to album directories under one root.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new `FileStore` rooted at `root` (an absolute path).
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding an album's files.
    pub fn album_dir(&self, album_id: AlbumId) -> PathBuf {
        self.root.join(album_id.to_string())
    }

    /// Final location of an image's original file.
    pub fn image_path(&self, album_id: AlbumId, image_id: ImageId, file_type: &str) -> PathBuf {
        self.album_dir(album_id)
            .join(format!("{}.{}", image_id, file_type))
    }

    /// Create an album's directory (and any missing parents).
    pub fn create_album_dir(&self, album_id: AlbumId) -> Result<PathBuf> {
        let dir = self.album_dir(album_id);
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::storage(format!("Failed to create album directory {}: {}", dir.display(), e))
        })?;
        Ok(dir)
    }

    /// Recursively remove an album's directory.
    ///
    /// Returns `Ok(false)` if the directory did not exist.
    pub fn remove_album_dir(&self, album_id: AlbumId) -> Result<bool> {
        let dir = self.album_dir(album_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove album directory {}: {}",
                dir.display(),
                e
            ))),
        }
    }

    /// Move a file, renaming where possible and copying otherwise.
    ///
    /// On failure the source is left in place and no partial destination
    /// remains.
    pub fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        match std::fs::rename(src, dst) {
            Ok(()) => {
                tracing::debug!(src = %src.display(), dst = %dst.display(), "Renamed file");
                return Ok(());
            }
            Err(e) if !src.exists() => {
                return Err(Error::storage(format!(
                    "Source file missing {}: {}",
                    src.display(),
                    e
                )));
            }
            Err(e) => {
                tracing::debug!(
                    src = %src.display(),
                    dst = %dst.display(),
                    error = %e,
                    "Rename failed, falling back to copy"
                );
            }
        }

        copy_then_remove(src, dst)
    }

    /// Remove a single file.
    ///
    /// Returns `Ok(false)` if the file did not exist; any other failure is an
    /// error.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Every album directory under the root, with the id its name encodes.
    ///
    /// Entries whose names are not album ids (such as a staging directory
    /// living under the root) are skipped.
    pub fn list_album_dirs(&self) -> Result<Vec<(AlbumId, PathBuf)>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(album_id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<AlbumId>().ok())
            else {
                continue;
            };
            dirs.push((album_id, entry.path()));
        }

        dirs.sort();
        Ok(dirs)
    }

    /// Regular files directly inside an album's directory, sorted by path.
    ///
    /// A missing directory yields an empty list.
    pub fn list_files(&self, album_id: AlbumId) -> Result<Vec<PathBuf>> {
        let dir = self.album_dir(album_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::storage(format!("Failed to list {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Copy `src` to `dst`, then delete `src`.
///
/// A failed copy removes whatever part of `dst` was written. If the source
/// cannot be removed afterwards, the copy is undone so the file exists once.
fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    if let Err(e) = std::fs::copy(src, dst) {
        let _ = std::fs::remove_file(dst);
        return Err(Error::storage(format!(
            "Failed to copy {} to {}: {}",
            src.display(),
            dst.display(),
            e
        )));
    }

    if let Err(e) = std::fs::remove_file(src) {
        let _ = std::fs::remove_file(dst);
        return Err(Error::storage(format!(
            "Failed to remove source file {}: {}",
            src.display(),
            e
        )));
    }

    tracing::debug!(src = %src.display(), dst = %dst.display(), "Copied file");
    Ok(())
}
