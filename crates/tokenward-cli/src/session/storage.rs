//! Location of the persisted session file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

const SESSION_FILE: &str = "session.json";

/// Resolve the session file path, defaulting to the platform data directory.
///
/// The directory itself is created lazily on the first write.
pub fn session_path(data_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => ProjectDirs::from("", "", "tokenward")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    Ok(dir.join(SESSION_FILE))
}
