use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use thiserror::Error;
use validator::ValidationErrors;

/// A single rejected field of a request body.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Malformed key {0:?}")]
    MalformedKey(Vec<u8>),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Validation failed: {}", describe(.0))]
    Validation(Vec<Violation>),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<u64>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Storage(_) | Error::Encoding(_) | Error::MalformedKey(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            Error::Storage(_) | Error::Encoding(_) | Error::MalformedKey(_) => {
                error!("{}", self);
                json!({ "error": "Database error", "status": status.as_u16() })
            }
            Error::NotFound { .. } => {
                info!("{}", self);
                json!({ "error": self.to_string(), "status": status.as_u16() })
            }
            Error::Validation(violations) => {
                warn!("{}", self);
                json!({
                    "error": "Validation failed",
                    "status": status.as_u16(),
                    "violations": violations,
                })
            }
            Error::BadRequest(msg) => {
                warn!("{}", self);
                json!({ "error": msg, "status": status.as_u16() })
            }
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations: Vec<Violation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| Violation {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), |m| m.to_string()),
                })
            })
            .collect();
        violations.sort();
        Error::Validation(violations)
    }
}

impl From<TransactionError<Error>> for Error {
    fn from(err: TransactionError<Error>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Error::Storage(e),
        }
    }
}

/// Aborts a sled transaction with a crate error.
pub fn abort<E: Into<Error>>(err: E) -> ConflictableTransactionError<Error> {
    ConflictableTransactionError::Abort(err.into())
}
