//! The error type shared by the storage context, the report exporter and the web layer.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while managing attendance.
#[derive(Error, Debug)]
pub enum Error {
    /// Another student already holds this roll number.
    #[error("Student with this roll number already exists!")]
    DuplicateRollNumber {
        /// The rejected roll number.
        roll_no: String,
    },

    /// No student has the given ID.
    #[error("Student {0} not found")]
    StudentNotFound(i32),

    /// A date string was not in `YYYY-MM-DD` form.
    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A required roster field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("failed to connect to database at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: diesel::result::ConnectionError,
    },

    #[error("database query failed: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database migration failed: {0}")]
    Migration(String),

    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for attendance operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is the caller's fault and should be shown to them as-is.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRollNumber { .. }
                | Self::StudentNotFound(_)
                | Self::InvalidDate { .. }
                | Self::MissingField(_)
        )
    }
}
