use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::error::Error;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl Error {
    /// The HTTP status a handler responds with when it fails with this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::DuplicateRollNumber { .. } => StatusCode::CONFLICT,
            Error::StudentNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidDate { .. } | Error::MissingField(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Infrastructure failures are logged in full but not shown to the client.
        let message = if self.is_user_error() {
            self.to_string()
        } else {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let duplicate = Error::DuplicateRollNumber {
            roll_no: "01".to_string(),
        };
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::StudentNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::MissingField("name").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = Error::Migration("disk I/O error".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
