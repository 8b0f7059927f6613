pub mod cli;
pub mod display;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod paths;
pub mod report;
pub mod schema;
pub mod settings;
pub mod web;

pub use crate::error::{Error, Result};
pub use crate::manager::AttendanceManager;
pub use crate::settings::Settings;

use tracing::warn;

/// Opens the database named by `settings`, creating its tables if needed.
///
/// The database file is moved to the temp directory if its configured location is not writable.
/// A failure to create the tables is logged and otherwise ignored, so that the service can still
/// start on a read-only filesystem.
pub fn create_manager(settings: &Settings) -> Result<AttendanceManager> {
    let database_url = paths::resolve_database_url(&settings.database_url);
    let mut manager = AttendanceManager::connect(&database_url)?;

    if let Err(err) = manager.run_migrations() {
        warn!(error = %err, "could not initialize the database schema, continuing without it");
    }

    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_schema_failure_does_not_prevent_startup() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("corrupt.db");
        fs::write(&db, vec![b'x'; 4096]).unwrap();

        let settings = Settings {
            database_url: db.to_string_lossy().into_owned(),
            ..Settings::default()
        };

        let mut manager = create_manager(&settings).unwrap();

        assert!(matches!(manager.get_roster(), Err(Error::Database(_))));
    }

    #[test]
    fn test_fresh_database_gets_its_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            database_url: tmp.path().join("attendance.db").to_string_lossy().into_owned(),
            ..Settings::default()
        };

        let mut manager = create_manager(&settings).unwrap();

        assert_eq!(manager.num_students().unwrap(), 0);
    }
}
