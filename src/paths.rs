//! Picking writable locations for the database file and exported reports.
//!
//! Constrained deployments (serverless functions, read-only containers) often only allow writes
//! under the system temp directory, so both the database and the export directory fall back there
//! when their configured location cannot be written to.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name of the throwaway file written to check that a directory is writable.
const PROBE_FILE_NAME: &str = ".write_test";

/// Connection strings that SQLite treats as something other than a plain file path.
const SPECIAL_DATABASE_PREFIXES: [&str; 2] = [":memory:", "file:"];

/// Creates `dir` if needed and checks that a file can be written to and removed from it.
pub fn probe_writable(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let probe = dir.join(PROBE_FILE_NAME);
    fs::write(&probe, b"ok")?;
    fs::remove_file(&probe)
}

/// Returns `preferred` if it is writable, otherwise `<temp dir>/<fallback_name>`.
pub fn writable_dir_or_temp(preferred: &Path, fallback_name: &str) -> Result<PathBuf> {
    match probe_writable(preferred) {
        Ok(()) => Ok(preferred.to_path_buf()),
        Err(err) => {
            let fallback = env::temp_dir().join(fallback_name);
            warn!(
                preferred = %preferred.display(),
                fallback = %fallback.display(),
                error = %err,
                "directory is not writable, falling back to temp storage"
            );
            fs::create_dir_all(&fallback).map_err(|source| Error::DirectoryCreate {
                path: fallback.clone(),
                source,
            })?;
            Ok(fallback)
        }
    }
}

/// Resolves the SQLite connection string, moving the database file into the temp directory when
/// its parent directory is not writable.
///
/// In-memory and URI-style connection strings are returned unchanged.
pub fn resolve_database_url(database_url: &str) -> String {
    if SPECIAL_DATABASE_PREFIXES
        .iter()
        .any(|prefix| database_url.starts_with(prefix))
    {
        return database_url.to_string();
    }

    let path = Path::new(database_url.strip_prefix("sqlite://").unwrap_or(database_url));
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let resolved = match probe_writable(&parent) {
        Ok(()) => path.to_string_lossy().into_owned(),
        Err(err) => {
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "attendance.db".into());
            let relocated = env::temp_dir().join(file_name);
            warn!(
                database = %path.display(),
                relocated = %relocated.display(),
                error = %err,
                "database directory is not writable, relocating database to temp storage"
            );
            relocated.to_string_lossy().into_owned()
        }
    };

    debug!(database_url = %resolved, "resolved database location");
    resolved
}
