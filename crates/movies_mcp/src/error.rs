//! Error kinds and their JSON-RPC wire mapping (spec §7).
//!
//! Domain and repository errors are translated here without wrapping detail
//! through the transport: the wire message stays short and user-actionable,
//! while `tracing::error!` at the call site keeps the full context server-side.

use crate::protocol::{ErrorCode, JsonRpcError};
use movies_domain::ValidationError;
use movies_db::DbError;
use thiserror::Error;

/// A tool/resource/prompt handler's outcome, already shaped for the wire.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("{0}")]
    InvalidParams(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ContextExpired(String),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, McpError>;

impl McpError {
    pub fn into_wire(self) -> JsonRpcError {
        match self {
            McpError::InvalidParams(msg) => JsonRpcError::new(ErrorCode::InvalidParams, msg),
            McpError::Validation(msg) => JsonRpcError::new(ErrorCode::InvalidParams, msg),
            McpError::NotFound(entity) => {
                JsonRpcError::new(ErrorCode::InvalidParams, format!("{entity} not found"))
            }
            McpError::Conflict(msg) => JsonRpcError::new(ErrorCode::InvalidParams, msg),
            McpError::ContextExpired(msg) => JsonRpcError::new(ErrorCode::InvalidParams, msg),
            McpError::Internal(msg) => JsonRpcError::new(ErrorCode::InternalError, msg),
        }
    }
}

impl From<Vec<ValidationError>> for McpError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        McpError::Validation(joined)
    }
}

impl From<ValidationError> for McpError {
    fn from(error: ValidationError) -> Self {
        McpError::Validation(error.to_string())
    }
}

impl From<DbError> for McpError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound(what) => McpError::NotFound(what),
            DbError::Conflict(what) => McpError::Conflict(what),
            DbError::Sqlx(e) => McpError::Internal(format!("database error: {e}")),
            DbError::Serialization(e) => McpError::Internal(format!("serialization error: {e}")),
            DbError::CorruptRow(what) => McpError::Internal(format!("corrupted row: {what}")),
        }
    }
}

/// Build a `data.errors[]` payload for a validation failure, as required by
/// the `-32602` wire contract for tool-argument validation.
pub fn validation_error_data(errors: &[crate::tools::schema::ValidationFailure]) -> serde_json::Value {
    serde_json::json!({
        "errors": errors.iter().map(|e| serde_json::json!({
            "field": e.path,
            "message": e.message,
        })).collect::<Vec<_>>()
    })
}
