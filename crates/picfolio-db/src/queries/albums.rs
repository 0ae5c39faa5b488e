//! Album database queries.
//!
//! This module provides CRUD operations for albums and the two writes of the
//! cover-photo pointer: the unconditional one and the first-writer-wins one.

use chrono::{SecondsFormat, SubsecRound, Utc};
use picfolio_common::{AlbumId, Error, ImageId, Result};
use rusqlite::Connection;

use super::{parse_id, parse_timestamp};
use crate::models::Album;

const ALBUM_COLUMNS: &str = "id, title, description, cover_photo_id, created_at";

/// Parse an album from a database row.
///
/// Expects columns in order: id, title, description, cover_photo_id, created_at.
fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
    let cover_photo_id = match row.get::<_, Option<String>>(3)? {
        Some(id) => Some(parse_id(3, &id)?),
        None => None,
    };

    Ok(Album {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        description: row.get(2)?,
        cover_photo_id,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

/// Insert a new album record.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `id` - Pre-generated album ID
/// * `title` - Album title
/// * `description` - Optional description
///
/// # Returns
///
/// * `Ok(Album)` - The created album (no cover photo yet)
/// * `Err(Error)` - If a database error occurs
pub fn create_album(
    conn: &Connection,
    id: AlbumId,
    title: &str,
    description: Option<&str>,
) -> Result<Album> {
    // Stored with microsecond precision; truncate so the returned album
    // compares equal to what a later read yields.
    let created_at = Utc::now().trunc_subsecs(6);

    conn.execute(
        "INSERT INTO albums (id, title, description, cover_photo_id, created_at)
         VALUES (:id, :title, :description, NULL, :created_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":title": title,
            ":description": description,
            ":created_at": created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Album {
        id,
        title: title.to_string(),
        description: description.map(str::to_string),
        cover_photo_id: None,
        created_at,
    })
}

/// Get an album by ID.
///
/// # Returns
///
/// * `Ok(Some(Album))` - The album if found
/// * `Ok(None)` - If the album does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_album(conn: &Connection, id: AlbumId) -> Result<Option<Album>> {
    let result = conn.query_row(
        &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_album_row,
    );

    match result {
        Ok(album) => Ok(Some(album)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all albums, oldest first.
pub fn get_all_albums(conn: &Connection) -> Result<Vec<Album>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ALBUM_COLUMNS} FROM albums ORDER BY created_at, rowid"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let albums = stmt
        .query_map([], parse_album_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(albums)
}

/// Overwrite an album's title, description, and cover photo.
///
/// All three values are written verbatim; `None` clears the column.
///
/// # Returns
///
/// * `Ok(())` - If the update succeeded
/// * `Err(Error)` - If the album does not exist or a database error occurs
pub fn update_album(
    conn: &Connection,
    id: AlbumId,
    title: &str,
    description: Option<&str>,
    cover_photo_id: Option<ImageId>,
) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE albums
             SET title = :title, description = :description, cover_photo_id = :cover_photo_id
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":title": title,
                ":description": description,
                ":cover_photo_id": cover_photo_id.map(|c| c.to_string()),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if rows_affected == 0 {
        return Err(Error::not_found(format!("album {}", id)));
    }

    Ok(())
}

/// Set (or with `None`, clear) an album's cover photo unconditionally.
///
/// # Returns
///
/// * `Ok(true)` - If the album row was updated
/// * `Ok(false)` - If the album does not exist
/// * `Err(Error)` - If a database error occurs
pub fn set_cover_photo(
    conn: &Connection,
    album_id: AlbumId,
    cover_photo_id: Option<ImageId>,
) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE albums SET cover_photo_id = :cover_photo_id WHERE id = :id",
            rusqlite::named_params! {
                ":id": album_id.to_string(),
                ":cover_photo_id": cover_photo_id.map(|c| c.to_string()),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

/// Set an album's cover photo only if it has none.
///
/// The check and the write are a single statement, so of two concurrent
/// callers exactly one sees `Ok(true)`.
///
/// # Returns
///
/// * `Ok(true)` - If the cover was unset and is now `image_id`
/// * `Ok(false)` - If the album already had a cover or does not exist
/// * `Err(Error)` - If a database error occurs
pub fn set_cover_photo_if_unset(
    conn: &Connection,
    album_id: AlbumId,
    image_id: ImageId,
) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE albums SET cover_photo_id = :cover_photo_id
             WHERE id = :id AND cover_photo_id IS NULL",
            rusqlite::named_params! {
                ":id": album_id.to_string(),
                ":cover_photo_id": image_id.to_string(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

/// Delete an album record. Its images are not touched.
///
/// # Returns
///
/// * `Ok(true)` - If the album was deleted
/// * `Ok(false)` - If the album did not exist
/// * `Err(Error)` - If a database error occurs
pub fn delete_album(conn: &Connection, id: AlbumId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM albums WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_create_and_get_album() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let id = AlbumId::new();
        let created = create_album(&conn, id, "Trip", Some("Summer 2024")).unwrap();
        assert_eq!(created.id, id);
        assert!(created.cover_photo_id.is_none());

        let found = get_album(&conn, id).unwrap().unwrap();
        assert_eq!(found.title, "Trip");
        assert_eq!(found.description.as_deref(), Some("Summer 2024"));
        assert!(found.cover_photo_id.is_none());
    }

    #[test]
    fn test_get_album_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(get_album(&conn, AlbumId::new()).unwrap().is_none());
    }

    #[test]
    fn test_get_all_albums_in_creation_order() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = create_album(&conn, AlbumId::new(), "First", None).unwrap();
        let second = create_album(&conn, AlbumId::new(), "Second", None).unwrap();
        let third = create_album(&conn, AlbumId::new(), "Third", None).unwrap();

        let ids: Vec<_> = get_all_albums(&conn).unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_update_album_writes_verbatim() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let album = create_album(&conn, AlbumId::new(), "Trip", Some("old")).unwrap();
        let cover = ImageId::new();

        update_album(&conn, album.id, "Renamed", None, Some(cover)).unwrap();

        let found = get_album(&conn, album.id).unwrap().unwrap();
        assert_eq!(found.title, "Renamed");
        assert!(found.description.is_none());
        assert_eq!(found.cover_photo_id, Some(cover));
    }

    #[test]
    fn test_update_missing_album() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let err = update_album(&conn, AlbumId::new(), "x", None, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_cover_photo_if_unset_first_writer_wins() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let album = create_album(&conn, AlbumId::new(), "Trip", None).unwrap();
        let first = ImageId::new();
        let second = ImageId::new();

        assert!(set_cover_photo_if_unset(&conn, album.id, first).unwrap());
        assert!(!set_cover_photo_if_unset(&conn, album.id, second).unwrap());

        let found = get_album(&conn, album.id).unwrap().unwrap();
        assert_eq!(found.cover_photo_id, Some(first));
    }

    #[test]
    fn test_set_cover_photo_overwrites_and_clears() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let album = create_album(&conn, AlbumId::new(), "Trip", None).unwrap();
        let first = ImageId::new();
        let second = ImageId::new();

        assert!(set_cover_photo(&conn, album.id, Some(first)).unwrap());
        assert!(set_cover_photo(&conn, album.id, Some(second)).unwrap());
        assert_eq!(
            get_album(&conn, album.id).unwrap().unwrap().cover_photo_id,
            Some(second)
        );

        assert!(set_cover_photo(&conn, album.id, None).unwrap());
        assert!(get_album(&conn, album.id)
            .unwrap()
            .unwrap()
            .cover_photo_id
            .is_none());
    }

    #[test]
    fn test_set_cover_photo_missing_album() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(!set_cover_photo(&conn, AlbumId::new(), Some(ImageId::new())).unwrap());
        assert!(!set_cover_photo_if_unset(&conn, AlbumId::new(), ImageId::new()).unwrap());
    }

    #[test]
    fn test_delete_album() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let album = create_album(&conn, AlbumId::new(), "Trip", None).unwrap();

        assert!(delete_album(&conn, album.id).unwrap());
        assert!(get_album(&conn, album.id).unwrap().is_none());
        assert!(!delete_album(&conn, album.id).unwrap());
    }
}
