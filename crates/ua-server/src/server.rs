//! The process-wide server object.
//!
//! [`InternalServer`] owns what every session shares: the endpoint list,
//! the discovery registry, the identity counters and the collaborator
//! handles. It also owns a privileged internal session (Admin role, no
//! serialization boundary) that it uses for its own address-space writes:
//! the namespace array at construction, the server status on start, the
//! clock tick and the history capability bits.

use std::{net::SocketAddr, sync::Arc};

use ua_core::{
    AdminNameVerifier, CredentialVerifier, DiscoveryRegistry, EndpointRegistry, IdentityAllocator,
    InternalSession, Services, SessionContext, SessionError, SessionOrigin, UserRole,
    env::Environment,
};
use ua_proto::{
    ApplicationDescription, AttributeId, DataValue, EndpointDescription, FindServersParameters,
    GetEndpointsParameters, MdnsDiscoveryConfiguration, NodeId, RegisterServer2Parameters,
    RegisteredServer,
    attribute::{access_level, event_notifier, object_ids},
};

use crate::{config::ServerConfig, error::ServerError, memory::Retention, scheduler::Scheduler};

/// Name of the server's own session.
pub const INTERNAL_SESSION_NAME: &str = "Internal";

/// `ServerState::Running`.
const SERVER_STATE_RUNNING: i32 = 0;

/// Session factory, discovery registry and background clock of one server.
pub struct InternalServer<E: Environment> {
    config: ServerConfig,
    ctx: SessionContext<E>,
    discovery: DiscoveryRegistry,
    /// Shared with the clock job.
    internal: Arc<InternalSession<E>>,
    scheduler: Scheduler,
}

impl<E: Environment> InternalServer<E> {
    /// Build a server that upgrades "admin" user-name tokens to the Admin
    /// role when `config.allow_remote_admin` is set.
    ///
    /// # Errors
    ///
    /// See [`InternalServer::new_with_verifier`].
    pub fn new(config: ServerConfig, env: E, services: Services) -> Result<Self, ServerError> {
        let verifier = Arc::new(AdminNameVerifier::new(config.allow_remote_admin));
        Self::new_with_verifier(config, env, services, verifier)
    }

    /// Build a server with a custom credential verifier.
    ///
    /// Registers the configured endpoints, creates the internal session and
    /// writes the namespace array. Nothing runs in the background until
    /// [`InternalServer::start`].
    ///
    /// # Errors
    ///
    /// - [`ServerError::Config`] if the configuration does not validate
    /// - [`ServerError::Session`] if the namespace array write fails
    /// - [`ServerError::Scheduler`] if the clock worker cannot start
    pub fn new_with_verifier(
        config: ServerConfig,
        env: E,
        services: Services,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let endpoints = Arc::new(EndpointRegistry::new());
        for endpoint in config.endpoint_descriptions() {
            endpoints.add(endpoint);
        }

        let ctx = SessionContext {
            env,
            services,
            endpoints,
            verifier,
            identities: Arc::new(IdentityAllocator::new()),
            config: config.session_config(),
        };
        let internal = Arc::new(InternalSession::new(
            ctx.clone(),
            INTERNAL_SESSION_NAME,
            UserRole::Admin,
            SessionOrigin::Internal,
        )?);

        internal
            .node(NodeId::from(object_ids::SERVER_NAMESPACE_ARRAY))
            .set_value(config.namespace_array.clone())?;

        tracing::info!(
            application_uri = %config.application_uri,
            endpoints = ctx.endpoints.len(),
            "Server created"
        );

        Ok(Self {
            config,
            ctx,
            discovery: DiscoveryRegistry::new(),
            internal,
            scheduler: Scheduler::new()?,
        })
    }

    /// Mark the server running and start the clock.
    ///
    /// Writes the running state and start time, registers each endpoint's
    /// application description for discovery, and unless the clock is
    /// disabled writes the current time once and then every
    /// `clock_interval`.
    ///
    /// Calling `start` twice re-registers the same discovery entries (no
    /// duplicates) and schedules a second clock job.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if a status write fails
    pub fn start(&self) -> Result<(), ServerError> {
        let now = self.ctx.env.utc_now();
        self.internal
            .node(NodeId::from(object_ids::SERVER_SERVER_STATUS_STATE))
            .set_value(SERVER_STATE_RUNNING)?;
        self.internal
            .node(NodeId::from(object_ids::SERVER_SERVER_STATUS_START_TIME))
            .set_value(now)?;

        for endpoint in self.ctx.endpoints.snapshot() {
            self.discovery.register(endpoint.server, None);
        }

        if !self.config.disabled_clock {
            tick_clock(&self.internal, &self.ctx.env);

            let session = Arc::clone(&self.internal);
            let env = self.ctx.env.clone();
            self.scheduler.schedule_repeating("clock", self.config.clock_interval, move || {
                tick_clock(&session, &env);
            });
        }

        tracing::info!(
            application_uri = %self.config.application_uri,
            clock = !self.config.disabled_clock,
            "Server started"
        );
        Ok(())
    }

    /// Stop the clock and the history collaborator.
    ///
    /// Open sessions are left as they are.
    pub fn stop(&self) {
        self.scheduler.stop();
        self.ctx.services.history.stop();
        tracing::info!(application_uri = %self.config.application_uri, "Server stopped");
    }

    /// Create a session bound to this server's collaborators.
    ///
    /// `external` sessions serve remote clients whose values have crossed a
    /// serialization boundary; internal sessions get copy isolation.
    ///
    /// # Errors
    ///
    /// - [`SessionError::IdentifiersExhausted`] if the id counters are spent
    pub fn create_session(
        &self,
        name: impl Into<String>,
        user: UserRole,
        external: bool,
    ) -> Result<InternalSession<E>, SessionError> {
        InternalSession::new(self.ctx.clone(), name, user, SessionOrigin::from_external(external))
    }

    /// Allocate a secure channel id. The first id is 6.
    ///
    /// # Errors
    ///
    /// - [`SessionError::IdentifiersExhausted`] if the counter is spent
    pub fn next_channel_id(&self) -> Result<u32, SessionError> {
        self.ctx.identities.next_channel_id()
    }

    /// Append an endpoint. Duplicates are kept.
    pub fn add_endpoint(&self, endpoint: EndpointDescription) {
        self.ctx.endpoints.add(endpoint);
    }

    /// Endpoints, filtered by transport profile and rewritten for
    /// `client_socket` when given.
    pub fn get_endpoints(
        &self,
        params: Option<&GetEndpointsParameters>,
        client_socket: Option<SocketAddr>,
    ) -> Vec<EndpointDescription> {
        self.ctx.endpoints.get_endpoints(params, client_socket)
    }

    /// Known servers matching the request's URI filters.
    pub fn find_servers(&self, params: &FindServersParameters) -> Vec<ApplicationDescription> {
        self.discovery.find_servers(&params.server_uris)
    }

    /// Register or replace a server in the discovery registry.
    pub fn register_server(
        &self,
        server: &RegisteredServer,
        discovery_configuration: Option<MdnsDiscoveryConfiguration>,
    ) {
        self.discovery.register_server(server, discovery_configuration);
    }

    /// `RegisterServer2`: [`InternalServer::register_server`] with the
    /// request's discovery configuration.
    pub fn register_server2(&self, params: &RegisterServer2Parameters) {
        self.discovery.register_server2(params);
    }

    /// Start capturing value history of `node`.
    ///
    /// Sets `Historizing` and the history-read bit of both access levels,
    /// then hands the node to the history collaborator.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if an attribute update or the collaborator
    ///   fails
    pub fn enable_history_data_change(
        &self,
        node: &NodeId,
        retention: Retention,
    ) -> Result<(), ServerError> {
        let handle = self.internal.node(node.clone());
        handle.set_attribute(AttributeId::Historizing, DataValue::new(true))?;
        handle.set_attr_bits(AttributeId::AccessLevel, access_level::HISTORY_READ)?;
        handle.set_attr_bits(AttributeId::UserAccessLevel, access_level::HISTORY_READ)?;

        self.ctx.services.history.historize_data_change(
            node,
            retention.period,
            retention.count,
        )?;
        tracing::debug!(%node, "Enabled data change history");
        Ok(())
    }

    /// Stop capturing value history of `node`. Stored history is kept.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if an attribute update or the collaborator
    ///   fails
    pub fn disable_history_data_change(&self, node: &NodeId) -> Result<(), ServerError> {
        let handle = self.internal.node(node.clone());
        handle.set_attribute(AttributeId::Historizing, DataValue::new(false))?;
        handle.unset_attr_bits(AttributeId::AccessLevel, access_level::HISTORY_READ)?;
        handle.unset_attr_bits(AttributeId::UserAccessLevel, access_level::HISTORY_READ)?;

        self.ctx.services.history.dehistorize(node)?;
        tracing::debug!(%node, "Disabled data change history");
        Ok(())
    }

    /// Start capturing events of `source`.
    ///
    /// Does nothing, and reports success, when `source` does not have the
    /// subscribe-to-events bit set. Use [`InternalServer::supports_events`]
    /// to tell the two apart.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if reading the event notifier, the
    ///   attribute update or the collaborator fails
    pub fn enable_history_event(
        &self,
        source: &NodeId,
        retention: Retention,
    ) -> Result<(), ServerError> {
        if !self.supports_events(source)? {
            tracing::debug!(%source, "Not an event source, event history unchanged");
            return Ok(());
        }

        self.internal
            .node(source.clone())
            .set_attr_bits(AttributeId::EventNotifier, event_notifier::HISTORY_READ)?;
        self.ctx.services.history.historize_event(source, retention.period, retention.count)?;
        tracing::debug!(%source, "Enabled event history");
        Ok(())
    }

    /// Stop capturing events of `source`.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if the attribute update or the collaborator
    ///   fails
    pub fn disable_history_event(&self, source: &NodeId) -> Result<(), ServerError> {
        self.internal
            .node(source.clone())
            .unset_attr_bits(AttributeId::EventNotifier, event_notifier::HISTORY_READ)?;
        self.ctx.services.history.dehistorize(source)?;
        tracing::debug!(%source, "Disabled event history");
        Ok(())
    }

    /// Whether `source`'s event notifier has the subscribe-to-events bit.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Session`] if the event notifier cannot be read
    pub fn supports_events(&self, source: &NodeId) -> Result<bool, ServerError> {
        let notifier =
            self.internal.node(source.clone()).get_attribute(AttributeId::EventNotifier)?;
        let bits = notifier.value.as_u32().unwrap_or(0);
        Ok(bits & u32::from(event_notifier::SUBSCRIBE_TO_EVENTS) != 0)
    }

    /// The server's own session.
    pub fn internal_session(&self) -> &InternalSession<E> {
        &self.internal
    }

    /// The discovery registry.
    pub fn discovery(&self) -> &DiscoveryRegistry {
        &self.discovery
    }

    /// Whether remote "admin" logins are upgraded to Admin.
    pub fn allow_remote_admin(&self) -> bool {
        self.config.allow_remote_admin
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl<E: Environment> std::fmt::Debug for InternalServer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalServer")
            .field("application_uri", &self.config.application_uri)
            .field("endpoints", &self.ctx.endpoints.len())
            .field("known_servers", &self.discovery.len())
            .finish_non_exhaustive()
    }
}

/// Write the current time to `Server_ServerStatus_CurrentTime`.
fn tick_clock<E: Environment>(session: &InternalSession<E>, env: &E) {
    let now = env.utc_now();
    let node = session.node(NodeId::from(object_ids::SERVER_SERVER_STATUS_CURRENT_TIME));
    match node.set_value(now) {
        Ok(()) => tracing::debug!(%now, "Clock tick"),
        Err(err) => tracing::warn!("Clock tick failed: {err}"),
    }
}
