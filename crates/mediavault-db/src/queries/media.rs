//! Media catalog queries.
//!
//! The engine looks entries up by id; the optional kind filter keeps the
//! music endpoints from serving video rows and vice versa.

use chrono::{DateTime, Utc};
use mediavault_common::{Error, MediaId, MediaKind, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::MediaRecord;

const SELECT_COLUMNS: &str = "SELECT id, kind, title, locator, thumbnail_url, created_at FROM media";

/// Create a catalog entry with a database-assigned id.
pub fn create_media(
    conn: &Connection,
    kind: MediaKind,
    title: &str,
    locator: &str,
    thumbnail_url: Option<&str>,
) -> Result<MediaRecord> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO media (kind, title, locator, thumbnail_url, created_at)
         VALUES (:kind, :title, :locator, :thumbnail_url, :created_at)",
        rusqlite::named_params! {
            ":kind": kind.as_str(),
            ":title": title,
            ":locator": locator,
            ":thumbnail_url": thumbnail_url,
            ":created_at": created_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(MediaRecord {
        id: MediaId::new(conn.last_insert_rowid()),
        kind,
        title: title.to_string(),
        locator: locator.to_string(),
        thumbnail_url: thumbnail_url.map(str::to_string),
        created_at,
    })
}

/// Create a catalog entry with a caller-chosen id.
///
/// Fails if the id is already taken.
pub fn create_media_with_id(
    conn: &Connection,
    id: MediaId,
    kind: MediaKind,
    title: &str,
    locator: &str,
    thumbnail_url: Option<&str>,
) -> Result<MediaRecord> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO media (id, kind, title, locator, thumbnail_url, created_at)
         VALUES (:id, :kind, :title, :locator, :thumbnail_url, :created_at)",
        rusqlite::named_params! {
            ":id": id.get(),
            ":kind": kind.as_str(),
            ":title": title,
            ":locator": locator,
            ":thumbnail_url": thumbnail_url,
            ":created_at": created_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(MediaRecord {
        id,
        kind,
        title: title.to_string(),
        locator: locator.to_string(),
        thumbnail_url: thumbnail_url.map(str::to_string),
        created_at,
    })
}

/// Get a catalog entry by id.
pub fn get_media(conn: &Connection, id: MediaId) -> Result<Option<MediaRecord>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = :id"),
        rusqlite::named_params! { ":id": id.get() },
        row_to_media,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get a catalog entry by id, only if it is of the given kind.
pub fn get_media_of_kind(
    conn: &Connection,
    id: MediaId,
    kind: MediaKind,
) -> Result<Option<MediaRecord>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = :id AND kind = :kind"),
        rusqlite::named_params! { ":id": id.get(), ":kind": kind.as_str() },
        row_to_media,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List entries of a kind, oldest first.
pub fn list_media(conn: &Connection, kind: MediaKind) -> Result<Vec<MediaRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} WHERE kind = :kind ORDER BY id"))
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(rusqlite::named_params! { ":kind": kind.as_str() }, row_to_media)
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete an entry. Returns whether a row was removed.
pub fn delete_media(conn: &Connection, id: MediaId) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM media WHERE id = :id",
            rusqlite::named_params! { ":id": id.get() },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(affected > 0)
}

fn row_to_media(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let kind_text: String = row.get(1)?;
    let kind = kind_text.parse::<MediaKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;

    let created_text: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(MediaRecord {
        id: MediaId::new(row.get(0)?),
        kind,
        title: row.get(2)?,
        locator: row.get(3)?,
        thumbnail_url: row.get(4)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool, PooledConnection};

    fn setup_test_db() -> PooledConnection {
        let pool = init_memory_pool().unwrap();
        get_conn(&pool).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let conn = setup_test_db();
        let created = create_media(
            &conn,
            MediaKind::Audio,
            "Song",
            "song.mp3",
            Some("https://example.com/cover.jpg"),
        )
        .unwrap();

        let found = get_media(&conn, created.id).unwrap().unwrap();
        assert_eq!(found.title, "Song");
        assert_eq!(found.kind, MediaKind::Audio);
        assert_eq!(found.locator, "song.mp3");
        assert_eq!(
            found.thumbnail_url.as_deref(),
            Some("https://example.com/cover.jpg")
        );
    }

    #[test]
    fn test_get_nonexistent() {
        let conn = setup_test_db();
        assert!(get_media(&conn, MediaId::new(999)).unwrap().is_none());
    }

    #[test]
    fn test_create_with_id() {
        let conn = setup_test_db();
        let created = create_media_with_id(
            &conn,
            MediaId::new(42),
            MediaKind::Video,
            "Rick",
            "https://youtu.be/dQw4w9WgXcQ",
            None,
        )
        .unwrap();
        assert_eq!(created.id, MediaId::new(42));
        assert!(get_media(&conn, MediaId::new(42)).unwrap().is_some());

        let dup = create_media_with_id(&conn, MediaId::new(42), MediaKind::Video, "x", "y", None);
        assert!(matches!(dup, Err(Error::Database(_))));
    }

    #[test]
    fn test_get_media_of_kind_filters() {
        let conn = setup_test_db();
        let video = create_media(&conn, MediaKind::Video, "Clip", "clip.mp4", None).unwrap();

        assert!(get_media_of_kind(&conn, video.id, MediaKind::Video)
            .unwrap()
            .is_some());
        assert!(get_media_of_kind(&conn, video.id, MediaKind::Audio)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_and_delete() {
        let conn = setup_test_db();
        let a = create_media(&conn, MediaKind::Audio, "A", "a.mp3", None).unwrap();
        create_media(&conn, MediaKind::Audio, "B", "b.mp3", None).unwrap();
        create_media(&conn, MediaKind::Video, "C", "c.mp4", None).unwrap();

        let audio = list_media(&conn, MediaKind::Audio).unwrap();
        assert_eq!(audio.len(), 2);
        assert_eq!(audio[0].title, "A");

        assert!(delete_media(&conn, a.id).unwrap());
        assert!(!delete_media(&conn, a.id).unwrap());
        assert_eq!(list_media(&conn, MediaKind::Audio).unwrap().len(), 1);
    }
}
