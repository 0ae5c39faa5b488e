//! Album lifecycle and the cover-photo rules.

use std::path::PathBuf;

use picfolio_common::{AlbumId, Error, ImageId, Result};
use picfolio_db::models::Album;
use picfolio_db::pool::{get_conn, DbPool};
use picfolio_db::queries::{albums, images};
use tracing::{debug, info, warn};

use crate::storage::{FileReaper, FileStore};

/// Creates, edits, and deletes albums, keeping each album's directory and
/// cover photo in step with its records.
#[derive(Debug, Clone)]
pub struct AlbumManager {
    pool: DbPool,
    files: FileStore,
    reaper: FileReaper,
}

impl AlbumManager {
    pub fn new(pool: DbPool, files: FileStore, reaper: FileReaper) -> Self {
        Self { pool, files, reaper }
    }

    /// Insert an album and create its directory.
    ///
    /// If the directory cannot be created the record is removed again and the
    /// storage error is returned.
    pub fn create_album(&self, title: &str, description: Option<&str>) -> Result<Album> {
        let id = AlbumId::new();
        let album = {
            let conn = get_conn(&self.pool)?;
            albums::create_album(&conn, id, title, description)?
        };

        if let Err(e) = self.files.create_album_dir(id) {
            let undo = get_conn(&self.pool).and_then(|conn| albums::delete_album(&conn, id));
            if let Err(undo_err) = undo {
                warn!(
                    album_id = %id,
                    error = %undo_err,
                    "Failed to remove album record after directory creation failed"
                );
            }
            return Err(e);
        }

        info!(album_id = %id, title, "Created album");
        Ok(album)
    }

    pub fn get_album(&self, album_id: AlbumId) -> Result<Option<Album>> {
        let conn = get_conn(&self.pool)?;
        albums::get_album(&conn, album_id)
    }

    pub fn get_all_albums(&self) -> Result<Vec<Album>> {
        let conn = get_conn(&self.pool)?;
        albums::get_all_albums(&conn)
    }

    /// Delete an album, its image records, and its directory.
    ///
    /// Records go first, in one bulk call for the images; the directory is
    /// handed to the reaper afterwards. Returns `Ok(false)` if the album did
    /// not exist, in which case nothing is touched.
    pub fn delete_album(&self, album_id: AlbumId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;

        if albums::get_album(&conn, album_id)?.is_none() {
            debug!(album_id = %album_id, "Album already absent");
            return Ok(false);
        }

        let album_images = images::get_all_images_by_album(&conn, album_id)?;
        if !album_images.is_empty() {
            images::delete_images_by_album(&conn, album_id)?;
        }

        albums::delete_album(&conn, album_id)?;
        self.reaper.remove_dir(self.files.album_dir(album_id));

        info!(album_id = %album_id, images = album_images.len(), "Deleted album");
        Ok(true)
    }

    /// Make `image_id` the album's cover.
    ///
    /// Fails with `NotFound` if the album does not exist and with
    /// `InvariantViolation` if the image is missing or belongs to another
    /// album.
    pub fn set_album_cover_photo(&self, album_id: AlbumId, image_id: ImageId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        ensure_cover_belongs(&conn, album_id, image_id)?;

        if !albums::set_cover_photo(&conn, album_id, Some(image_id))? {
            return Err(Error::not_found(format!("album {}", album_id)));
        }

        debug!(album_id = %album_id, image_id = %image_id, "Set cover photo");
        Ok(())
    }

    /// Make `image_id` the cover only if the album has none yet.
    ///
    /// Returns whether this call set it. Of several concurrent callers on an
    /// album without a cover, exactly one wins.
    pub fn set_album_cover_photo_if_unset(
        &self,
        album_id: AlbumId,
        image_id: ImageId,
    ) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        ensure_cover_belongs(&conn, album_id, image_id)?;

        let set = albums::set_cover_photo_if_unset(&conn, album_id, image_id)?;
        if set {
            debug!(album_id = %album_id, image_id = %image_id, "Set initial cover photo");
        }
        Ok(set)
    }

    /// Point the cover at the album's first remaining image, or clear it.
    pub fn reassign_cover_photo(&self, album_id: AlbumId) -> Result<Option<ImageId>> {
        let conn = get_conn(&self.pool)?;
        let cover = images::get_all_images_by_album(&conn, album_id)?
            .first()
            .map(|image| image.id);

        albums::set_cover_photo(&conn, album_id, cover)?;

        match cover {
            Some(image_id) => debug!(album_id = %album_id, image_id = %image_id, "Reassigned cover photo"),
            None => debug!(album_id = %album_id, "Cleared cover photo"),
        }
        Ok(cover)
    }

    /// Overwrite title, description, and cover photo.
    ///
    /// Values are stored as given; keeping the previous title when the user
    /// submits an empty one is up to the caller. A supplied cover must be an
    /// image of this album.
    pub fn update_album(
        &self,
        album_id: AlbumId,
        title: &str,
        description: Option<&str>,
        cover_photo_id: Option<ImageId>,
    ) -> Result<()> {
        let conn = get_conn(&self.pool)?;

        if let Some(image_id) = cover_photo_id {
            ensure_cover_belongs(&conn, album_id, image_id)?;
        }

        albums::update_album(&conn, album_id, title, description, cover_photo_id)?;

        info!(album_id = %album_id, "Updated album");
        Ok(())
    }

    /// Directory holding the album's files.
    pub fn get_album_path(&self, album_id: AlbumId) -> PathBuf {
        self.files.album_dir(album_id)
    }
}

fn ensure_cover_belongs(
    conn: &rusqlite::Connection,
    album_id: AlbumId,
    image_id: ImageId,
) -> Result<()> {
    if albums::get_album(conn, album_id)?.is_none() {
        return Err(Error::not_found(format!("album {}", album_id)));
    }

    match images::get_image(conn, image_id)? {
        Some(image) if image.album_id == album_id => Ok(()),
        Some(image) => Err(Error::invariant(format!(
            "image {} belongs to album {}, not {}",
            image_id, image.album_id, album_id
        ))),
        None => Err(Error::invariant(format!(
            "cover photo {} does not exist",
            image_id
        ))),
    }
}
