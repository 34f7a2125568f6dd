//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use ticketdesk_domain::DeskError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DeskError);

impl From<InfraError> for DeskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DeskError> for InfraError {
    fn from(value: DeskError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDeskError {
    fn into_desk(self) -> DeskError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → DeskError */
/* -------------------------------------------------------------------------- */

impl IntoDeskError for SqlError {
    fn into_desk(self) -> DeskError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => DeskError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        DeskError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        DeskError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::NotADatabase, _) => {
                        DeskError::Database("file is not a database".into())
                    }
                    _ => DeskError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => DeskError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                DeskError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                DeskError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => DeskError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                DeskError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => DeskError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => DeskError::Database("invalid SQL query".into()),
            other => DeskError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_desk())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → DeskError */
/* -------------------------------------------------------------------------- */

impl IntoDeskError for r2d2::Error {
    fn into_desk(self) -> DeskError {
        DeskError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_desk())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DeskError */
/* -------------------------------------------------------------------------- */

impl IntoDeskError for HttpError {
    fn into_desk(self) -> DeskError {
        if self.is_timeout() {
            return DeskError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DeskError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => DeskError::Auth(message),
                404 => DeskError::NotFound(message),
                400..=499 if code != 429 => DeskError::InvalidInput(message),
                _ => DeskError::Network(message),
            };
        }

        if self.is_decode() {
            return DeskError::Network(format!("invalid response body: {self}"));
        }

        DeskError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_desk())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error / std::io::Error → DeskError */
/* -------------------------------------------------------------------------- */

impl IntoDeskError for serde_json::Error {
    fn into_desk(self) -> DeskError {
        DeskError::InvalidInput(format!("invalid JSON: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_desk())
    }
}

impl IntoDeskError for std::io::Error {
    fn into_desk(self) -> DeskError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => DeskError::NotFound(format!("file not found: {self}")),
            _ => DeskError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_desk())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → DeskError */
/* -------------------------------------------------------------------------- */

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        InfraError(DeskError::Internal(format!("blocking task failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
