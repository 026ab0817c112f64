//! Session and discovery core of an OPC-UA server.
//!
//! Pure bookkeeping, no I/O: everything that touches the address space,
//! subscriptions or history goes through the collaborator traits in
//! [`services`], and time and randomness come from an [`env::Environment`].
//!
//! # Components
//!
//! - [`IdentityAllocator`]: process-wide session id, authentication token and
//!   secure channel id counters
//! - [`InternalSession`]: per-client state machine (`Created` → `Activated` →
//!   `Closed`), request dispatch and subscription ownership
//! - [`DiscoveryRegistry`]: known servers keyed by application URI
//! - [`EndpointRegistry`]: endpoint descriptors, rewritten per client socket
//! - [`SessionOrigin`]: the copy rule between callers and the shared store
//! - [`CredentialVerifier`]: pluggable role decision on activation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod discovery;
pub mod endpoints;
pub mod env;
pub mod error;
pub mod identity;
pub mod isolation;
pub mod node;
pub mod services;
pub mod session;

pub use credentials::{AdminNameVerifier, CredentialVerifier, UserRole};
pub use discovery::{DiscoveryRegistry, KnownServer};
pub use endpoints::{EndpointRegistry, rewrite_endpoint_url};
pub use error::{ServiceError, SessionError};
pub use identity::{IdentifierKind, IdentityAllocator};
pub use isolation::{Detach, SessionOrigin};
pub use node::Node;
pub use services::{
    AttributeService, HistoryManager, MethodCallback, MethodService, NodeManagementService,
    PublishCallback, Services, SubscriptionService, ViewService,
};
pub use session::{InternalSession, SessionConfig, SessionContext, SessionState};
