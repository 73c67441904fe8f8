//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 1;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: create the `movies` table.
///
/// Genres are kept inline as a JSON array; there is no separate genre table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS movies (
            movie_id         INTEGER PRIMARY KEY,
            title            TEXT NOT NULL,
            poster_url       TEXT NOT NULL,
            backdrop_url     TEXT NOT NULL,
            overview         TEXT NOT NULL,
            genres           TEXT NOT NULL DEFAULT '[]',
            release_date     TEXT,
            language         TEXT,
            popularity       REAL,
            vote_average     REAL,
            vote_count       INTEGER,
            budget           INTEGER,
            homepage         TEXT,
            runtime_minutes  INTEGER,
            tagline          TEXT,
            status           TEXT,
            updated_at       INTEGER NOT NULL
        );",
    )
    .context("failed to create movies table")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_movies_table_exists_after_migration() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let stmt = conn
            .prepare("SELECT movie_id, genres, updated_at FROM movies LIMIT 0")
            .unwrap();
        assert_eq!(stmt.column_count(), 3);
    }
}
