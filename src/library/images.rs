//! Image lifecycle: create from a staged upload, rotate, describe, delete.
//!
//! Each operation walks the database, the album directory, and the codec in a
//! fixed order. A failure part-way leaves at worst an inert file (an original
//! without a record, a missing thumbnail); records never point at albums that
//! are gone.

use std::path::PathBuf;

use chrono::{SubsecRound, Utc};
use picfolio_common::{AlbumId, Error, ImageId, Result};
use picfolio_db::models::Image;
use picfolio_db::pool::{get_conn, DbPool};
use picfolio_db::queries::{albums, images};
use tracing::{info, warn};

use super::AlbumManager;
use crate::config::ThumbnailConfig;
use crate::media::{codec, StagedUpload, UploadPipeline};
use crate::storage::{thumbnail_path_for, FileReaper, FileStore};

/// Outcome of adding several uploads to one album.
#[derive(Debug, Default)]
pub struct UploadBatch {
    /// Images created, in upload order.
    pub image_ids: Vec<ImageId>,
    /// The staging failure that ended the batch, or else the first failure
    /// to add a staged upload.
    pub error: Option<Error>,
}

#[derive(Debug, Clone)]
pub struct ImageManager {
    pool: DbPool,
    files: FileStore,
    reaper: FileReaper,
    albums: AlbumManager,
    uploads: UploadPipeline,
    thumbnail: ThumbnailConfig,
}

impl ImageManager {
    pub fn new(
        pool: DbPool,
        files: FileStore,
        reaper: FileReaper,
        albums: AlbumManager,
        uploads: UploadPipeline,
        thumbnail: ThumbnailConfig,
    ) -> Self {
        Self {
            pool,
            files,
            reaper,
            albums,
            uploads,
            thumbnail,
        }
    }

    /// Move a staged upload into its album and record it.
    ///
    /// Steps, in order: move the staged file, insert the record, write the
    /// thumbnail, and claim the album cover if it has none. A failed move
    /// leaves the staged file where it was. A failed insert queues the moved
    /// file for removal. A failed thumbnail is logged and otherwise ignored.
    pub async fn create_image(&self, album_id: AlbumId, staged: StagedUpload) -> Result<ImageId> {
        if staged.file_type.is_empty() {
            return Err(Error::invalid_input(format!(
                "upload {} has no file extension",
                staged.title
            )));
        }

        {
            let conn = get_conn(&self.pool)?;
            if albums::get_album(&conn, album_id)?.is_none() {
                return Err(Error::not_found(format!("album {}", album_id)));
            }
        }

        let image_id = ImageId::new();
        let path = self.files.image_path(album_id, image_id, &staged.file_type);

        self.files.create_album_dir(album_id)?;
        self.files.move_file(&staged.staged_path, &path)?;

        let record = Image {
            id: image_id,
            album_id,
            path: path.to_string_lossy().into_owned(),
            file_type: staged.file_type,
            title: Some(staged.title),
            description: None,
            size_bytes: i64::try_from(staged.size).unwrap_or(i64::MAX),
            height: staged.height,
            width: staged.width,
            created_at: Utc::now().trunc_subsecs(6),
        };

        let inserted = get_conn(&self.pool).and_then(|conn| images::create_image(&conn, &record));
        if let Err(e) = inserted {
            warn!(
                image_id = %image_id,
                path = %path.display(),
                "Image record insert failed, discarding moved file"
            );
            self.reaper.remove_files([path]);
            return Err(e);
        }

        if let Err(e) = self.generate_thumbnail(path.clone()).await {
            warn!(
                image_id = %image_id,
                path = %path.display(),
                error = %e,
                "Thumbnail generation failed"
            );
        }

        self.albums.set_album_cover_photo_if_unset(album_id, image_id)?;

        info!(
            image_id = %image_id,
            album_id = %album_id,
            width = record.width,
            height = record.height,
            "Created image"
        );
        Ok(image_id)
    }

    /// Stage raw bytes and add them to an album.
    ///
    /// When staging succeeds but the image cannot be created, the staged file
    /// is queued for removal.
    pub async fn upload(
        &self,
        album_id: AlbumId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<ImageId> {
        let staged = self.uploads.stage(bytes, file_name).await?;
        let staged_path = staged.staged_path.clone();

        self.create_image(album_id, staged).await.inspect_err(|_| {
            self.reaper.remove_files([staged_path]);
        })
    }

    /// Stage every part, then add whatever staged successfully.
    ///
    /// Staging stops at the first undecodable part. Uploads staged before it
    /// are still added, and a failure to add one does not stop the others.
    pub async fn upload_many<I>(&self, album_id: AlbumId, parts: I) -> UploadBatch
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let staged = self.uploads.stage_many(parts).await;
        let mut batch = UploadBatch::default();
        let mut create_error = None;

        for upload in staged.staged {
            let title = upload.title.clone();
            let staged_path = upload.staged_path.clone();
            match self.create_image(album_id, upload).await {
                Ok(image_id) => batch.image_ids.push(image_id),
                Err(e) => {
                    warn!(album_id = %album_id, file = %title, error = %e, "Failed to add upload");
                    self.reaper.remove_files([staged_path]);
                    create_error.get_or_insert(e);
                }
            }
        }

        batch.error = staged.error.or(create_error);
        batch
    }

    pub fn get_image(&self, image_id: ImageId) -> Result<Option<Image>> {
        let conn = get_conn(&self.pool)?;
        images::get_image(&conn, image_id)
    }

    /// Images of an album in upload order.
    pub fn get_all_images_by_album(&self, album_id: AlbumId) -> Result<Vec<Image>> {
        let conn = get_conn(&self.pool)?;
        images::get_all_images_by_album(&conn, album_id)
    }

    /// Delete an image record and queue its files for removal.
    ///
    /// If the image was its album's cover, the cover moves to the first
    /// remaining image or is cleared. Returns `Ok(false)` if the image did
    /// not exist.
    pub fn delete_image(&self, image_id: ImageId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;

        let Some(image) = images::get_image(&conn, image_id)? else {
            return Ok(false);
        };
        let album = albums::get_album(&conn, image.album_id)?;

        let original = PathBuf::from(&image.path);
        let thumbnail = thumbnail_path_for(&original);
        self.reaper.remove_files([original, thumbnail]);

        images::delete_image(&conn, image_id)?;
        drop(conn);

        if album.is_some_and(|album| album.cover_photo_id == Some(image_id)) {
            self.albums.reassign_cover_photo(image.album_id)?;
        }

        info!(image_id = %image_id, album_id = %image.album_id, "Deleted image");
        Ok(true)
    }

    /// Rotate an image 90 degrees counter-clockwise.
    ///
    /// The original is rewritten, the thumbnail regenerated, and the stored
    /// dimensions updated from the rotated pixels. Returns `Ok(false)` if the
    /// image did not exist.
    pub async fn rotate_image(&self, image_id: ImageId) -> Result<bool> {
        let Some(image) = self.get_image(image_id)? else {
            return Ok(false);
        };

        let path = PathBuf::from(&image.path);
        let thumb_path = thumbnail_path_for(&path);
        let thumbnail = self.thumbnail;
        let (width, height, thumb_result) = tokio::task::spawn_blocking(move || {
            let rotated = codec::rotate_file_ccw(&path, thumbnail.jpeg_quality)?;
            let thumb_result = codec::write_thumbnail(
                &rotated,
                &path,
                thumbnail.max_dimension,
                thumbnail.jpeg_quality,
            );
            Ok::<_, Error>((rotated.width(), rotated.height(), thumb_result))
        })
        .await
        .map_err(|e| Error::internal(format!("Rotate task failed: {}", e)))??;

        if let Err(e) = thumb_result {
            // Leave no thumbnail in the old orientation; reconcile rebuilds it.
            warn!(image_id = %image_id, error = %e, "Thumbnail regeneration failed");
            if let Err(e) = self.files.remove_file(&thumb_path) {
                warn!(image_id = %image_id, error = %e, "Failed to remove stale thumbnail");
            }
        }

        let conn = get_conn(&self.pool)?;
        images::update_dimensions(&conn, image_id, height, width)?;

        info!(image_id = %image_id, width, height, "Rotated image");
        Ok(true)
    }

    /// Update the user-editable description. Nothing else about an image can
    /// change through this call.
    pub fn update_image(&self, image_id: ImageId, description: Option<&str>) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        images::update_image(&conn, image_id, description)
    }

    /// (Re)write the thumbnail of an original on the blocking pool.
    pub(crate) async fn generate_thumbnail(&self, original: PathBuf) -> Result<PathBuf> {
        let thumbnail = self.thumbnail;
        tokio::task::spawn_blocking(move || {
            let image = codec::open(&original)?;
            codec::write_thumbnail(
                &image,
                &original,
                thumbnail.max_dimension,
                thumbnail.jpeg_quality,
            )
        })
        .await
        .map_err(|e| Error::internal(format!("Thumbnail task failed: {}", e)))?
    }
}
