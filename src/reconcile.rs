//! Repair sweep for the inconsistencies the managers tolerate.
//!
//! Album and image operations never roll back across the database and the
//! filesystem. What they can leave behind is picked up here:
//!
//! - files in album directories that belong to no image of that album
//! - directories of albums that no longer exist
//! - records whose original now lives under a different image root
//! - originals whose thumbnail is missing
//! - cover pointers that no longer resolve to an image of their album
//! - staged uploads that never joined an album
//!
//! Files are matched to records by the image id in their name, never by the
//! stored path, and nothing is deleted until the database has been asked
//! again and the file is older than the grace period.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use picfolio_common::{AlbumId, ImageId, Result};
use picfolio_db::models::{Album, Image};
use picfolio_db::pool::get_conn;
use picfolio_db::queries::{albums, images};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::library::MediaLibrary;
use crate::storage::thumbnail_path_for;

/// Album files and directories younger than this are never removed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(15 * 60);

/// What a sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Unreferenced files removed from album directories.
    pub orphan_files_removed: usize,
    /// Directories removed because their album is gone.
    pub album_dirs_removed: usize,
    /// Records updated to the location their original was found at.
    pub paths_relocated: usize,
    pub thumbnails_regenerated: usize,
    /// Albums whose cover was reassigned or cleared.
    pub covers_repaired: usize,
    pub staged_files_removed: usize,
    /// Images whose original file is missing; these cannot be repaired here.
    pub missing_originals: usize,
    /// Repairs that were attempted and failed.
    pub failures: usize,
}

impl ReconcileReport {
    /// Whether the sweep found nothing to do.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Runs repair sweeps over one library.
pub struct Reconciler {
    library: MediaLibrary,
    staging_max_age: Duration,
    grace_period: Duration,
}

impl Reconciler {
    /// Staged files older than `staging_max_age` are treated as abandoned.
    pub fn new(library: MediaLibrary, staging_max_age: Duration) -> Self {
        Self {
            library,
            staging_max_age,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Override [`DEFAULT_GRACE_PERIOD`].
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Run one full sweep.
    ///
    /// Individual repair failures are logged and counted; only failing to
    /// read the records or list the image root aborts the sweep.
    pub async fn run(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let (all_albums, all_images) = {
            let conn = get_conn(self.library.pool())?;
            (albums::get_all_albums(&conn)?, images::get_all_images(&conn)?)
        };

        let located = self.locate_originals(&all_images, &mut report);
        let incomplete: HashSet<AlbumId> = located
            .iter()
            .filter(|(_, original)| original.is_none())
            .map(|(image, _)| image.album_id)
            .collect();

        self.sweep_album_dirs(&all_albums, &all_images, &incomplete, &mut report)?;
        self.repair_thumbnails(&located, &mut report).await;
        self.repair_covers(&all_albums, &all_images, &mut report);
        self.sweep_staging(&mut report);

        info!(
            orphan_files = report.orphan_files_removed,
            album_dirs = report.album_dirs_removed,
            relocated = report.paths_relocated,
            thumbnails = report.thumbnails_regenerated,
            covers = report.covers_repaired,
            staged = report.staged_files_removed,
            missing_originals = report.missing_originals,
            failures = report.failures,
            "Reconciliation complete"
        );
        Ok(report)
    }

    /// Where an image's original and thumbnail belong under the current root.
    fn expected_paths(&self, image: &Image) -> [PathBuf; 2] {
        let original = self
            .library
            .files()
            .image_path(image.album_id, image.id, &image.file_type);
        let thumbnail = thumbnail_path_for(&original);
        [original, thumbnail]
    }

    /// Find each image's original, at its stored path or where the current
    /// root puts it. `None` marks an original that is nowhere to be found.
    fn locate_originals<'a>(
        &self,
        all_images: &'a [Image],
        report: &mut ReconcileReport,
    ) -> Vec<(&'a Image, Option<PathBuf>)> {
        let mut located = Vec::with_capacity(all_images.len());

        for image in all_images {
            if image.file_path().is_file() {
                located.push((image, Some(image.file_path().to_path_buf())));
                continue;
            }

            let [expected, _] = self.expected_paths(image);
            if expected.is_file() {
                self.relocate(image, &expected, report);
                located.push((image, Some(expected)));
                continue;
            }

            warn!(image_id = %image.id, path = %image.path, "Original file is missing");
            report.missing_originals += 1;
            located.push((image, None));
        }

        located
    }

    fn relocate(&self, image: &Image, path: &Path, report: &mut ReconcileReport) {
        let stored = path.to_string_lossy();
        let updated = get_conn(self.library.pool())
            .and_then(|conn| images::update_path(&conn, image.id, &stored));

        match updated {
            Ok(()) => {
                info!(
                    image_id = %image.id,
                    from = %image.path,
                    to = %path.display(),
                    "Relocated image record"
                );
                report.paths_relocated += 1;
            }
            Err(e) => {
                warn!(image_id = %image.id, error = %e, "Failed to relocate image record");
                report.failures += 1;
            }
        }
    }

    fn sweep_album_dirs(
        &self,
        all_albums: &[Album],
        all_images: &[Image],
        incomplete: &HashSet<AlbumId>,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let files = self.library.files();
        let known: HashSet<AlbumId> = all_albums.iter().map(|a| a.id).collect();
        let expected: HashSet<PathBuf> = all_images
            .iter()
            .flat_map(|image| self.expected_paths(image))
            .collect();
        let cutoff = SystemTime::now().checked_sub(self.grace_period);
        let conn = get_conn(self.library.pool())?;

        for (album_id, dir) in files.list_album_dirs()? {
            if !known.contains(&album_id) {
                if !is_settled(&dir, cutoff) || albums::get_album(&conn, album_id)?.is_some() {
                    debug!(dir = %dir.display(), "Skipping directory of a new album");
                    continue;
                }
                match files.remove_album_dir(album_id) {
                    Ok(_) => {
                        debug!(dir = %dir.display(), "Removed directory of deleted album");
                        report.album_dirs_removed += 1;
                    }
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Failed to remove album directory");
                        report.failures += 1;
                    }
                }
                continue;
            }

            if incomplete.contains(&album_id) {
                warn!(
                    album_id = %album_id,
                    "Album has missing originals, leaving its files in place"
                );
                continue;
            }

            let listed = match files.list_files(album_id) {
                Ok(listed) => listed,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to list album directory");
                    report.failures += 1;
                    continue;
                }
            };

            for path in listed.into_iter().filter(|p| !expected.contains(p)) {
                if !is_settled(&path, cutoff) {
                    continue;
                }
                match self.is_live(&conn, album_id, &path) {
                    Ok(false) => {}
                    Ok(true) => continue,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to look up file owner");
                        report.failures += 1;
                        continue;
                    }
                }

                match files.remove_file(&path) {
                    Ok(_) => {
                        debug!(path = %path.display(), "Removed unreferenced file");
                        report.orphan_files_removed += 1;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to remove unreferenced file");
                        report.failures += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Whether the database now has an image of `album_id` that owns `path`.
    fn is_live(&self, conn: &Connection, album_id: AlbumId, path: &Path) -> Result<bool> {
        let Some(image_id) = image_id_of(path) else {
            return Ok(false);
        };
        Ok(images::get_image(conn, image_id)?
            .filter(|image| image.album_id == album_id)
            .is_some_and(|image| self.expected_paths(&image).iter().any(|p| p == path)))
    }

    async fn repair_thumbnails(
        &self,
        located: &[(&Image, Option<PathBuf>)],
        report: &mut ReconcileReport,
    ) {
        for (image, original) in located {
            let Some(original) = original else {
                continue;
            };
            if thumbnail_path_for(original).is_file() {
                continue;
            }

            match self.library.images().generate_thumbnail(original.clone()).await {
                Ok(_) => {
                    debug!(image_id = %image.id, "Regenerated thumbnail");
                    report.thumbnails_regenerated += 1;
                }
                Err(e) => {
                    warn!(image_id = %image.id, error = %e, "Failed to regenerate thumbnail");
                    report.failures += 1;
                }
            }
        }
    }

    fn repair_covers(
        &self,
        all_albums: &[Album],
        all_images: &[Image],
        report: &mut ReconcileReport,
    ) {
        let owner: HashMap<ImageId, AlbumId> =
            all_images.iter().map(|i| (i.id, i.album_id)).collect();

        for album in all_albums {
            let Some(cover) = album.cover_photo_id else {
                continue;
            };
            if owner.get(&cover) == Some(&album.id) {
                continue;
            }

            match self.library.albums().reassign_cover_photo(album.id) {
                Ok(new_cover) => {
                    info!(
                        album_id = %album.id,
                        stale = %cover,
                        cover = ?new_cover,
                        "Repaired dangling cover photo"
                    );
                    report.covers_repaired += 1;
                }
                Err(e) => {
                    warn!(album_id = %album.id, error = %e, "Failed to repair cover photo");
                    report.failures += 1;
                }
            }
        }
    }

    fn sweep_staging(&self, report: &mut ReconcileReport) {
        let staging_dir = self.library.uploads().staging_dir();
        let Some(cutoff) = SystemTime::now().checked_sub(self.staging_max_age) else {
            return;
        };

        for entry in WalkDir::new(staging_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if !is_older_than(entry.path(), cutoff) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(path = %entry.path().display(), "Removed abandoned staged file");
                    report.staged_files_removed += 1;
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to remove staged file");
                    report.failures += 1;
                }
            }
        }
    }
}

/// The image id an album file is named after: the text before the first dot.
fn image_id_of(path: &Path) -> Option<ImageId> {
    path.file_name()?.to_str()?.split('.').next()?.parse().ok()
}

/// Whether `path` was last modified before `cutoff`.
fn is_settled(path: &Path, cutoff: Option<SystemTime>) -> bool {
    cutoff.is_some_and(|cutoff| is_older_than(path, cutoff))
}

fn is_older_than(path: &Path, cutoff: SystemTime) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|modified| modified <= cutoff)
        .unwrap_or(false)
}
