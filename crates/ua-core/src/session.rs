//! Per-client session state machine.
//!
//! One [`InternalSession`] exists per client connection, plus one the server
//! keeps for its own use. The session carries identity, role and the set of
//! subscriptions it created, and forwards every service request to the
//! shared collaborators.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  activate_session  ┌───────────┐  close_session  ┌────────┐
//! │ Created │───────────────────>│ Activated │────────────────>│ Closed │
//! └─────────┘                    └───────────┘                 └────────┘
//!      │                                                           ↑
//!      └────────────────────── close_session ──────────────────────┘
//! ```
//!
//! Only activation checks the state. Dispatch (read, write, browse, ...)
//! is forwarded regardless of state, including on a closed session; the
//! transport layer drops closed sessions from its index before routing.

use std::{
    fmt,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
};

use bytes::Bytes;
use ua_proto::{
    DataValue, EndpointDescription, GetEndpointsParameters, NodeId, StatusCode,
    services::{
        ActivateSessionParameters, ActivateSessionResult, AddNodesItem, AddNodesResult,
        AddReferencesItem, BrowseDescription, BrowsePath, BrowsePathResult, BrowseResult,
        CallMethodRequest, CallMethodResult, CreateMonitoredItemsParameters,
        CreateSessionParameters, CreateSessionResult, CreateSubscriptionParameters,
        CreateSubscriptionResult, DeleteMonitoredItemsParameters, DeleteNodesItem,
        DeleteReferencesItem, HistoryReadParameters, HistoryReadResult,
        ModifyMonitoredItemsParameters, MonitoredItemCreateResult, MonitoredItemModifyResult,
        NotificationMessage, ReadParameters, RepublishParameters, SubscriptionAcknowledgement,
        WriteParameters,
    },
};

use crate::{
    credentials::{CredentialVerifier, UserRole},
    endpoints::EndpointRegistry,
    env::Environment,
    error::{ServiceError, SessionError},
    identity::IdentityAllocator,
    isolation::SessionOrigin,
    node::Node,
    services::{MethodCallback, PublishCallback, Services},
};

/// Maximum request size advertised in `CreateSession` responses.
pub const DEFAULT_MAX_REQUEST_MESSAGE_SIZE: u32 = 65536;

/// Length in bytes of server nonces.
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, not yet activated
    Created,
    /// Activated by the client
    Activated,
    /// Closed (terminal)
    Closed,
}

/// Fixed values a session advertises to its client.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Advertised maximum request message size
    pub max_request_message_size: u32,
    /// Server nonce length in bytes
    pub nonce_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_request_message_size: DEFAULT_MAX_REQUEST_MESSAGE_SIZE,
            nonce_length: DEFAULT_NONCE_LENGTH,
        }
    }
}

/// Everything a session shares with its server.
///
/// Cloned into each session; all members are shared handles.
#[derive(Clone)]
pub struct SessionContext<E: Environment> {
    /// Time and randomness
    pub env: E,
    /// Collaborators requests are forwarded to
    pub services: Services,
    /// The server's endpoints
    pub endpoints: Arc<EndpointRegistry>,
    /// Role decision on activation
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Process-wide id counters
    pub identities: Arc<IdentityAllocator>,
    /// Advertised limits
    pub config: SessionConfig,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    user: UserRole,
    nonce: Bytes,
}

/// A client's session.
///
/// All methods take `&self`; the transport layer may share a session across
/// request handlers.
pub struct InternalSession<E: Environment> {
    ctx: SessionContext<E>,
    name: String,
    origin: SessionOrigin,
    session_id: NodeId,
    authentication_token: NodeId,
    inner: Mutex<SessionInner>,
    /// Ids of subscriptions created through this session.
    subscriptions: Mutex<Vec<u32>>,
}

impl<E: Environment> InternalSession<E> {
    /// Create a session in [`SessionState::Created`].
    ///
    /// # Errors
    ///
    /// - [`SessionError::IdentifiersExhausted`] if the id counters are spent
    pub fn new(
        ctx: SessionContext<E>,
        name: impl Into<String>,
        user: UserRole,
        origin: SessionOrigin,
    ) -> Result<Self, SessionError> {
        let session_id = ctx.identities.next_session_id()?;
        let authentication_token = ctx.identities.next_authentication_token()?;
        let name = name.into();

        tracing::info!(%session_id, name = %name, "Created internal session");

        Ok(Self {
            ctx,
            name,
            origin,
            session_id,
            authentication_token,
            inner: Mutex::new(SessionInner {
                state: SessionState::Created,
                user,
                nonce: Bytes::new(),
            }),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Public session id.
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    /// Secret token the client authenticates requests with.
    pub fn authentication_token(&self) -> &NodeId {
        &self.authentication_token
    }

    /// Whether the session serves a remote client.
    pub fn is_external(&self) -> bool {
        self.origin.is_external()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    /// Current role.
    pub fn user(&self) -> UserRole {
        self.lock_inner().user
    }

    /// Most recently issued server nonce. Empty before `create_session`.
    pub fn nonce(&self) -> Bytes {
        self.lock_inner().nonce.clone()
    }

    /// Ids of the subscriptions this session owns, in creation order.
    pub fn subscription_ids(&self) -> Vec<u32> {
        self.lock_subscriptions().clone()
    }

    /// Handle for attribute access to `node_id` through this session.
    pub fn node(&self, node_id: NodeId) -> Node<'_, E> {
        Node::new(self, node_id)
    }

    /// Answer the client's `CreateSession` request.
    ///
    /// The requested timeout is returned as the revised timeout unchanged;
    /// no clamping is applied. A fresh nonce replaces any previous one.
    pub fn create_session(
        &self,
        params: &CreateSessionParameters,
        client_socket: Option<SocketAddr>,
    ) -> CreateSessionResult {
        tracing::info!(session_id = %self.session_id, "Create session request");

        let nonce = self.ctx.env.nonce(self.ctx.config.nonce_length);
        self.lock_inner().nonce = nonce.clone();

        CreateSessionResult {
            session_id: self.session_id.clone(),
            authentication_token: self.authentication_token.clone(),
            revised_session_timeout: params.requested_session_timeout,
            server_nonce: nonce,
            server_endpoints: self.get_endpoints(None, client_socket),
            max_request_message_size: self.ctx.config.max_request_message_size,
        }
    }

    /// Activate the session.
    ///
    /// Every supplied client certificate is accepted with a good status;
    /// certificate validation happens outside this crate. The identity
    /// token is handed to the configured [`CredentialVerifier`], whose
    /// answer becomes the session's role.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] unless the session is `Created`
    /// - [`SessionError::Service`] if the verifier rejects the token; the
    ///   session stays `Created`
    pub fn activate_session(
        &self,
        params: &ActivateSessionParameters,
    ) -> Result<ActivateSessionResult, SessionError> {
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Created {
            return Err(SessionError::InvalidState {
                state: inner.state,
                operation: "activate_session",
            });
        }

        let user = self.ctx.verifier.verify(&params.user_identity_token, inner.user)?;
        let nonce = self.ctx.env.nonce(self.ctx.config.nonce_length);

        inner.nonce = nonce.clone();
        inner.state = SessionState::Activated;
        inner.user = user;
        drop(inner);

        tracing::info!(
            session_id = %self.session_id,
            name = %self.name,
            %user,
            "Activated internal session"
        );

        Ok(ActivateSessionResult {
            server_nonce: nonce,
            results: vec![StatusCode::GOOD; params.client_software_certificates.len()],
        })
    }

    /// Close the session and cancel every subscription it owns.
    ///
    /// Subscriptions are always torn down; `delete_subscriptions` is accepted
    /// for interface compatibility. Cancellation failures are logged, never
    /// returned: ids the engine has already dropped are not errors. Closing
    /// again repeats the (now empty) teardown.
    pub fn close_session(&self, delete_subscriptions: bool) {
        self.lock_inner().state = SessionState::Closed;

        let mut owned = self.lock_subscriptions();
        let ids = std::mem::take(&mut *owned);
        tracing::info!(
            session_id = %self.session_id,
            ?ids,
            delete_subscriptions,
            "Closing session"
        );

        if ids.is_empty() {
            return;
        }

        match self.ctx.services.subscriptions.delete_subscriptions(&ids) {
            Ok(statuses) => {
                for (id, status) in ids.iter().zip(statuses) {
                    if status.is_bad() {
                        tracing::debug!(subscription_id = id, %status, "Subscription already gone");
                    }
                }
            },
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    ?ids,
                    "Subscription teardown failed: {err}"
                );
            },
        }
    }

    /// The server's endpoints, rewritten for `client_socket` when given.
    pub fn get_endpoints(
        &self,
        params: Option<&GetEndpointsParameters>,
        client_socket: Option<SocketAddr>,
    ) -> Vec<EndpointDescription> {
        self.ctx.endpoints.get_endpoints(params, client_socket)
    }

    /// Read attributes.
    ///
    /// Results handed to an internal caller share no buffer with the
    /// address space.
    pub fn read(&self, params: &ReadParameters) -> Result<Vec<DataValue>, ServiceError> {
        let results = self.ctx.services.attributes.read(params)?;
        Ok(self.origin.cross(results))
    }

    /// Write attributes with the session's role.
    ///
    /// Values from an internal caller are detached before the store sees
    /// them.
    pub fn write(&self, mut params: WriteParameters) -> Result<Vec<StatusCode>, ServiceError> {
        params.nodes_to_write = self.origin.cross(params.nodes_to_write);
        self.ctx.services.attributes.write(params, self.user())
    }

    /// Read stored history.
    pub fn history_read(
        &self,
        params: &HistoryReadParameters,
    ) -> Result<Vec<HistoryReadResult>, ServiceError> {
        self.ctx.services.history.read_history(params)
    }

    /// Browse references.
    pub fn browse(&self, nodes: &[BrowseDescription]) -> Result<Vec<BrowseResult>, ServiceError> {
        self.ctx.services.views.browse(nodes)
    }

    /// Resolve relative browse paths.
    pub fn translate_browse_paths_to_node_ids(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, ServiceError> {
        self.ctx.services.views.translate_browse_paths_to_node_ids(paths)
    }

    /// Add nodes with the session's role.
    pub fn add_nodes(
        &self,
        items: &[AddNodesItem],
    ) -> Result<Vec<AddNodesResult>, ServiceError> {
        self.ctx.services.nodes.add_nodes(items, self.user())
    }

    /// Delete nodes with the session's role.
    pub fn delete_nodes(
        &self,
        items: &[DeleteNodesItem],
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.ctx.services.nodes.delete_nodes(items, self.user())
    }

    /// Add references with the session's role.
    pub fn add_references(
        &self,
        items: &[AddReferencesItem],
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.ctx.services.nodes.add_references(items, self.user())
    }

    /// Delete references with the session's role.
    pub fn delete_references(
        &self,
        items: &[DeleteReferencesItem],
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.ctx.services.nodes.delete_references(items, self.user())
    }

    /// Bind a method implementation.
    pub fn add_method_callback(&self, method_id: NodeId, callback: MethodCallback) {
        self.ctx.services.methods.add_method_callback(method_id, callback);
    }

    /// Call methods.
    pub fn call(
        &self,
        requests: &[CallMethodRequest],
    ) -> Result<Vec<CallMethodResult>, ServiceError> {
        self.ctx.services.methods.call(requests)
    }

    /// Create a subscription and record it as owned by this session.
    ///
    /// The owned set stays locked from the engine call until the id is
    /// recorded, so a concurrent `delete_subscriptions` or `close_session`
    /// sees either no subscription or an owned one.
    pub fn create_subscription(
        &self,
        params: &CreateSubscriptionParameters,
        callback: PublishCallback,
    ) -> Result<CreateSubscriptionResult, ServiceError> {
        let mut owned = self.lock_subscriptions();
        let result = self.ctx.services.subscriptions.create_subscription(params, callback)?;
        owned.push(result.subscription_id);
        drop(owned);

        tracing::debug!(
            session_id = %self.session_id,
            subscription_id = result.subscription_id,
            "Created subscription"
        );
        Ok(result)
    }

    /// Delete subscriptions.
    ///
    /// Owned ids among `ids` are dropped from this session's set; ids it
    /// does not own are skipped. The engine is then asked to cancel the
    /// full `ids` list as given, including ids owned by other sessions.
    /// The set stays locked until the engine has answered, so no concurrent
    /// `create_subscription` on this session interleaves with the removal.
    pub fn delete_subscriptions(&self, ids: &[u32]) -> Result<Vec<StatusCode>, ServiceError> {
        let mut owned = self.lock_subscriptions();
        owned.retain(|id| !ids.contains(id));

        tracing::debug!(session_id = %self.session_id, ?ids, "Deleting subscriptions");
        self.ctx.services.subscriptions.delete_subscriptions(ids)
    }

    /// Add monitored items.
    pub fn create_monitored_items(
        &self,
        params: &CreateMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemCreateResult>, ServiceError> {
        self.ctx.services.subscriptions.create_monitored_items(params)
    }

    /// Modify monitored items.
    pub fn modify_monitored_items(
        &self,
        params: &ModifyMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemModifyResult>, ServiceError> {
        self.ctx.services.subscriptions.modify_monitored_items(params)
    }

    /// Delete monitored items.
    pub fn delete_monitored_items(
        &self,
        params: &DeleteMonitoredItemsParameters,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.ctx.services.subscriptions.delete_monitored_items(params)
    }

    /// Resend an unacknowledged notification.
    pub fn republish(
        &self,
        params: &RepublishParameters,
    ) -> Result<NotificationMessage, ServiceError> {
        self.ctx.services.subscriptions.republish(params)
    }

    /// Acknowledge notifications and request the next publish.
    pub fn publish(&self, acks: &[SubscriptionAcknowledgement]) -> Result<(), ServiceError> {
        self.ctx.services.subscriptions.publish(acks)
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<u32>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Environment> fmt::Display for InternalSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InternalSession(name:{}, user:{}, id:{}, auth_token:{})",
            self.name,
            self.user(),
            self.session_id,
            self.authentication_token
        )
    }
}

impl<E: Environment> fmt::Debug for InternalSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalSession")
            .field("name", &self.name)
            .field("session_id", &self.session_id)
            .field("origin", &self.origin)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
