//! Error types for the session core.
//!
//! Two layers: [`ServiceError`] is what a collaborator (address space,
//! subscription engine, history manager) reports and is passed through to
//! the session's caller unchanged. [`SessionError`] adds the failures that
//! originate in this crate: state machine violations and identifier
//! exhaustion.

use thiserror::Error;
use ua_proto::StatusCode;

use crate::{identity::IdentifierKind, session::SessionState};

/// A service-level failure reported by a collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct ServiceError {
    /// Status code returned to the client
    pub status: StatusCode,
    /// Human-readable detail
    pub message: String,
}

impl ServiceError {
    /// Error with a status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<StatusCode> for ServiceError {
    fn from(status: StatusCode) -> Self {
        Self { status, message: String::new() }
    }
}

/// Errors that can occur during session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation not allowed in the session's current state
    #[error("invalid session state: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Collaborator failure, passed through
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An identifier counter reached its maximum
    ///
    /// Not recoverable: the process has issued every value of this kind.
    #[error("{0} identifiers exhausted")]
    IdentifiersExhausted(IdentifierKind),
}

impl SessionError {
    /// Status code to report to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidState { .. } => StatusCode::BAD_SESSION_ID_INVALID,
            Self::Service(err) => err.status,
            Self::IdentifiersExhausted(_) => StatusCode::BAD_INTERNAL_ERROR,
        }
    }
}
