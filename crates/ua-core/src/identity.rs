//! Process-wide identifier allocation.
//!
//! Session ids, authentication tokens and secure channel ids come from
//! independent atomic counters that only move forward. Each counter starts
//! above a reserved low range so issued values never collide with
//! well-known node ids, and no value is ever issued twice, even after the
//! session that held it closes.

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use ua_proto::NodeId;

use crate::error::SessionError;

/// First session id handed out.
pub const FIRST_SESSION_ID: u32 = 10;

/// First authentication token handed out.
pub const FIRST_AUTHENTICATION_TOKEN: u32 = 1000;

/// First secure channel id handed out.
pub const FIRST_CHANNEL_ID: u32 = 6;

/// Which counter an identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// Public session id
    SessionId,
    /// Secret authentication token
    AuthenticationToken,
    /// Secure channel id
    ChannelId,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionId => write!(f, "session id"),
            Self::AuthenticationToken => write!(f, "authentication token"),
            Self::ChannelId => write!(f, "channel id"),
        }
    }
}

/// Monotonic counters shared by every session of one server.
///
/// Owned by the server and injected into session construction behind an
/// `Arc`. Increments are single atomic operations, so concurrent session
/// creation never observes the same value twice.
#[derive(Debug)]
pub struct IdentityAllocator {
    next_session_id: AtomicU32,
    next_authentication_token: AtomicU32,
    next_channel_id: AtomicU32,
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAllocator {
    /// Allocator starting at the reserved-range boundaries.
    pub fn new() -> Self {
        Self::starting_at(FIRST_SESSION_ID, FIRST_AUTHENTICATION_TOKEN, FIRST_CHANNEL_ID)
    }

    /// Allocator starting at explicit values.
    pub fn starting_at(session_id: u32, authentication_token: u32, channel_id: u32) -> Self {
        Self {
            next_session_id: AtomicU32::new(session_id),
            next_authentication_token: AtomicU32::new(authentication_token),
            next_channel_id: AtomicU32::new(channel_id),
        }
    }

    /// Next session id, as a numeric node id in namespace 0.
    pub fn next_session_id(&self) -> Result<NodeId, SessionError> {
        take(&self.next_session_id, IdentifierKind::SessionId).map(NodeId::from)
    }

    /// Next authentication token, as a numeric node id in namespace 0.
    pub fn next_authentication_token(&self) -> Result<NodeId, SessionError> {
        take(&self.next_authentication_token, IdentifierKind::AuthenticationToken)
            .map(NodeId::from)
    }

    /// Next secure channel id.
    pub fn next_channel_id(&self) -> Result<u32, SessionError> {
        take(&self.next_channel_id, IdentifierKind::ChannelId)
    }
}

/// Returns the current value and advances the counter, or fails once the
/// counter cannot advance. `u32::MAX` itself is never issued.
fn take(counter: &AtomicU32, kind: IdentifierKind) -> Result<u32, SessionError> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1))
        .map_err(|_| SessionError::IdentifiersExhausted(kind))
}
