//! Loading [`Settings`] from defaults, `config.toml`, and the environment.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Result;

/// Default configuration file, resolved relative to the working directory. The extension is
/// optional.
pub const DEFAULT_CONFIG_FILE: &str = "config";

/// Prefix for environment variables overriding individual settings, e.g. `ATTENDANCE_BIND_ADDR`.
const ENV_PREFIX: &str = "ATTENDANCE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the SQLite database file.
    pub database_url: String,
    /// Where exported reports are written when it is writable.
    pub export_dir: PathBuf,
    /// Address the HTTP server listens on.
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "attendance.db".to_string(),
            export_dir: PathBuf::from("exports"),
            bind_addr: "127.0.0.1:5001".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings, with later sources overriding earlier ones:
    ///
    /// 1. built-in defaults
    /// 2. the config file at `config_path`, if it exists
    /// 3. `ATTENDANCE_*` environment variables
    /// 4. the conventional `DATABASE_URL` and `EXPORT_DIR` variables
    ///
    /// A `.env` file in the working directory is loaded into the environment first.
    pub fn load_from(config_path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("export_dir", defaults.export_dir.to_string_lossy().into_owned())?
            .set_default("bind_addr", defaults.bind_addr)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("database_url", env::var("DATABASE_URL").ok())?
            .set_override_option("export_dir", env::var("EXPORT_DIR").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
