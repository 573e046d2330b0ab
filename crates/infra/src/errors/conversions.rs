//! Conversions from external infrastructure errors into domain errors.

use agendasync_domain::AgendaSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AgendaSyncError);

impl From<InfraError> for AgendaSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AgendaSyncError> for InfraError {
    fn from(value: AgendaSyncError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AgendaSyncError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain = match value {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        AgendaSyncError::Database("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        AgendaSyncError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => AgendaSyncError::Database(format!(
                        "constraint violation (code {}): {message}",
                        err.extended_code
                    )),
                    _ => AgendaSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {message}",
                        err.code, err.extended_code
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                AgendaSyncError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                AgendaSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                AgendaSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                AgendaSyncError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidQuery => AgendaSyncError::Database("invalid SQL query".into()),
            other => AgendaSyncError::Database(other.to_string()),
        };

        InfraError(domain)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AgendaSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(AgendaSyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AgendaSyncError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let domain = if value.is_timeout() {
            AgendaSyncError::Transient(format!("http request timed out: {value}"))
        } else if value.is_connect() || value.is_request() {
            AgendaSyncError::Transient(format!("http request failed: {value}"))
        } else if value.is_decode() {
            AgendaSyncError::Internal(format!("failed to decode provider response: {value}"))
        } else {
            AgendaSyncError::Transient(format!("http error: {value}"))
        };

        InfraError(domain)
    }
}
