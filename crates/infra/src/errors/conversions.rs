//! Conversions from external infrastructure errors into domain errors.

use goldfish_domain::GoldfishError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GoldfishError);

impl From<InfraError> for GoldfishError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GoldfishError> for InfraError {
    fn from(value: GoldfishError) -> Self {
        InfraError(value)
    }
}

trait IntoGoldfishError {
    fn into_goldfish(self) -> GoldfishError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → GoldfishError */
/* -------------------------------------------------------------------------- */

impl IntoGoldfishError for SqlError {
    fn into_goldfish(self) -> GoldfishError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        GoldfishError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        GoldfishError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        GoldfishError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        GoldfishError::Database("check constraint violation".into())
                    }
                    _ => GoldfishError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => GoldfishError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                GoldfishError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                GoldfishError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => GoldfishError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => GoldfishError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_goldfish())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → GoldfishError */
/* -------------------------------------------------------------------------- */

impl IntoGoldfishError for r2d2::Error {
    fn into_goldfish(self) -> GoldfishError {
        GoldfishError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_goldfish())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GoldfishError */
/* -------------------------------------------------------------------------- */

impl IntoGoldfishError for HttpError {
    fn into_goldfish(self) -> GoldfishError {
        if self.is_timeout() {
            return GoldfishError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return GoldfishError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return GoldfishError::Network(format!("malformed upstream response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => GoldfishError::Auth(message),
                404 => GoldfishError::NotFound(message),
                _ => GoldfishError::Upstream { status: code, message },
            };
        }

        GoldfishError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_goldfish())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
