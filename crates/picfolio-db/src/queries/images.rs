//! Image database queries.
//!
//! This module provides CRUD operations for image records, per-album
//! listing, and the bulk delete used when an album is removed.

use chrono::SecondsFormat;
use picfolio_common::{AlbumId, Error, ImageId, Result};
use rusqlite::Connection;

use super::{parse_id, parse_timestamp};
use crate::models::Image;

const IMAGE_COLUMNS: &str =
    "id, album_id, path, file_type, title, description, size_bytes, height, width, created_at";

/// Parse an image from a database row.
///
/// Expects columns in the order of `IMAGE_COLUMNS`.
fn parse_image_row(row: &rusqlite::Row) -> rusqlite::Result<Image> {
    Ok(Image {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        album_id: parse_id(1, &row.get::<_, String>(1)?)?,
        path: row.get(2)?,
        file_type: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        size_bytes: row.get(6)?,
        height: row.get(7)?,
        width: row.get(8)?,
        created_at: parse_timestamp(9, &row.get::<_, String>(9)?)?,
    })
}

/// Insert a new image record.
///
/// # Returns
///
/// * `Ok(ImageId)` - The ID of the inserted image
/// * `Err(Error)` - If a database error occurs
pub fn create_image(conn: &Connection, image: &Image) -> Result<ImageId> {
    conn.execute(
        "INSERT INTO images (id, album_id, path, file_type, title, description,
                             size_bytes, height, width, created_at)
         VALUES (:id, :album_id, :path, :file_type, :title, :description,
                 :size_bytes, :height, :width, :created_at)",
        rusqlite::named_params! {
            ":id": image.id.to_string(),
            ":album_id": image.album_id.to_string(),
            ":path": &image.path,
            ":file_type": &image.file_type,
            ":title": &image.title,
            ":description": &image.description,
            ":size_bytes": image.size_bytes,
            ":height": image.height,
            ":width": image.width,
            ":created_at": image.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(image.id)
}

/// Get an image by ID.
///
/// # Returns
///
/// * `Ok(Some(Image))` - The image if found
/// * `Ok(None)` - If the image does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    let result = conn.query_row(
        &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_image_row,
    );

    match result {
        Ok(image) => Ok(Some(image)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

fn query_images(
    conn: &Connection,
    sql: &str,
    params: &[(&str, &dyn rusqlite::ToSql)],
) -> Result<Vec<Image>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| Error::database(e.to_string()))?;

    let images = stmt
        .query_map(params, parse_image_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(images)
}

/// List every image record across all albums, in insertion order.
pub fn get_all_images(conn: &Connection) -> Result<Vec<Image>> {
    query_images(
        conn,
        &format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY rowid"),
        &[],
    )
}

/// List the images of one album in upload order.
///
/// The first element is the oldest surviving upload, which is the image
/// chosen when an album's cover has to be reassigned.
pub fn get_all_images_by_album(conn: &Connection, album_id: AlbumId) -> Result<Vec<Image>> {
    query_images(
        conn,
        &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE album_id = :album_id ORDER BY rowid"),
        rusqlite::named_params! { ":album_id": album_id.to_string() },
    )
}

/// Update the user-editable fields of an image (currently the description).
///
/// # Returns
///
/// * `Ok(())` - If the update succeeded
/// * `Err(Error)` - If the image does not exist or a database error occurs
pub fn update_image(conn: &Connection, id: ImageId, description: Option<&str>) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE images SET description = :description WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":description": description,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if rows_affected == 0 {
        return Err(Error::not_found(format!("image {}", id)));
    }

    Ok(())
}

/// Store new pixel dimensions for an image after its file was rewritten.
///
/// # Returns
///
/// * `Ok(())` - If the update succeeded
/// * `Err(Error)` - If the image does not exist or a database error occurs
pub fn update_dimensions(conn: &Connection, id: ImageId, height: u32, width: u32) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE images SET height = :height, width = :width WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":height": height,
                ":width": width,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if rows_affected == 0 {
        return Err(Error::not_found(format!("image {}", id)));
    }

    Ok(())
}

/// Point an image record at the current location of its original.
///
/// # Returns
///
/// * `Ok(())` - If the update succeeded
/// * `Err(Error)` - If the image does not exist or a database error occurs
pub fn update_path(conn: &Connection, id: ImageId, path: &str) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE images SET path = :path WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":path": path,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if rows_affected == 0 {
        return Err(Error::not_found(format!("image {}", id)));
    }

    Ok(())
}

/// Delete an image by ID.
///
/// # Returns
///
/// * `Ok(true)` - If the image was deleted
/// * `Ok(false)` - If the image did not exist
/// * `Err(Error)` - If a database error occurs
pub fn delete_image(conn: &Connection, id: ImageId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM images WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

/// Delete all images of an album in one statement.
///
/// # Returns
///
/// * `Ok(u64)` - Number of images deleted
/// * `Err(Error)` - If a database error occurs
pub fn delete_images_by_album(conn: &Connection, album_id: AlbumId) -> Result<u64> {
    let rows_affected = conn
        .execute(
            "DELETE FROM images WHERE album_id = :album_id",
            rusqlite::named_params! { ":album_id": album_id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected as u64)
}
