//! Config file location.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// File name of the config inside its directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory under the XDG config home.
const APP_DIR_NAME: &str = "movies";

/// Resolves the config file path.
///
/// `--dir` wins; otherwise the file lives in `$XDG_CONFIG_HOME/movies/`,
/// falling back to `~/.config/movies/`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is usable
/// (only when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(d) => Ok(d.join(CONFIG_FILE_NAME)),
        None => default_config_path(
            std::env::var_os("XDG_CONFIG_HOME"),
            std::env::var_os("HOME"),
        ),
    }
}

/// Picks the config directory from the given environment values.
///
/// A relative `XDG_CONFIG_HOME` is ignored, as the XDG base directory
/// rules require.
fn default_config_path(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf> {
    let xdg = xdg_config_home
        .map(PathBuf::from)
        .filter(|p| p.is_absolute());
    let base = match (xdg, home) {
        (Some(xdg), _) => xdg,
        (None, Some(home)) if !home.is_empty() => PathBuf::from(home).join(".config"),
        (None, _) => bail!("HOME environment variable is not set"),
    };
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
