//! Database connection management.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// Database file name.
const DB_FILE_NAME: &str = "movies.db";

/// Application directory under the XDG data home.
const APP_DIR_NAME: &str = "movies";

/// Opens (or creates) the database and runs migrations.
///
/// - If `dir` is `Some`, uses `{dir}/movies.db`.
/// - Otherwise uses `$XDG_DATA_HOME/movies/movies.db`, or
///   `~/.local/share/movies/movies.db` when that is unset.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub fn open_db(dir: Option<&Path>) -> Result<Connection> {
    let db_path = resolve_db_path(dir)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    run_migrations(&conn).context("database migration failed")?;
    tracing::debug!(path = %db_path.display(), "database ready");

    Ok(conn)
}

/// Resolves the database file path.
///
/// `dir` wins; otherwise the file lives in `$XDG_DATA_HOME/movies/`,
/// falling back to `~/.local/share/movies/`.
fn resolve_db_path(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(d) => Ok(d.join(DB_FILE_NAME)),
        None => default_db_path(std::env::var_os("XDG_DATA_HOME"), std::env::var_os("HOME")),
    }
}

/// Picks the data directory from the given environment values.
/// A relative `XDG_DATA_HOME` is ignored.
fn default_db_path(xdg_data_home: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    let xdg = xdg_data_home.map(PathBuf::from).filter(|p| p.is_absolute());
    let base = match (xdg, home) {
        (Some(xdg), _) => xdg,
        (None, Some(home)) if !home.is_empty() => PathBuf::from(home).join(".local").join("share"),
        (None, _) => bail!("HOME environment variable is not set"),
    };
    Ok(base.join(APP_DIR_NAME).join(DB_FILE_NAME))
}
