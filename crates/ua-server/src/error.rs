//! Server error types.

use std::fmt;

use ua_core::{ServiceError, SessionError};

use crate::scheduler::SchedulerError;

/// Errors that can occur in the server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (unparsable endpoint URL, empty application URI).
    ///
    /// Fatal: the server cannot be constructed. Fix configuration and
    /// restart.
    Config(String),

    /// Session error (identifier exhaustion, collaborator failure while
    /// bootstrapping through the internal session).
    Session(SessionError),

    /// Background scheduler error (worker runtime could not be built).
    Scheduler(SchedulerError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::Scheduler(err) => write!(f, "scheduler error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Scheduler(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<ServiceError> for ServerError {
    fn from(err: ServiceError) -> Self {
        Self::Session(SessionError::Service(err))
    }
}

impl From<SchedulerError> for ServerError {
    fn from(err: SchedulerError) -> Self {
        Self::Scheduler(err)
    }
}
