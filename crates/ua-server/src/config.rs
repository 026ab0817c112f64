//! Server configuration.

use std::time::Duration;

use ua_core::session::{DEFAULT_MAX_REQUEST_MESSAGE_SIZE, DEFAULT_NONCE_LENGTH, SessionConfig};
use ua_proto::{
    ApplicationDescription, ApplicationType, EndpointDescription, LocalizedText,
    MessageSecurityMode, UserTokenPolicy, UserTokenType,
    discovery::{SECURITY_POLICY_NONE, TRANSPORT_PROFILE_UATCP},
};
use url::Url;

use crate::error::ServerError;

/// Default endpoint the server advertises.
pub const DEFAULT_ENDPOINT_URL: &str = "opc.tcp://0.0.0.0:4840/server/";

/// Default namespace array: the standard OPC-UA namespace only.
pub const DEFAULT_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// Configuration of an [`InternalServer`](crate::InternalServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Globally unique application URI (discovery key)
    pub application_uri: String,
    /// Product URI
    pub product_uri: String,
    /// Display name
    pub application_name: String,
    /// Endpoint URLs to advertise
    pub endpoint_urls: Vec<String>,
    /// Whether a remote "admin" user-name token grants the Admin role
    pub allow_remote_admin: bool,
    /// Suppress the background clock task
    pub disabled_clock: bool,
    /// Interval between clock ticks
    pub clock_interval: Duration,
    /// Maximum request size advertised to clients
    pub max_request_message_size: u32,
    /// Server nonce length in bytes
    pub nonce_length: usize,
    /// Namespace URIs written to `Server_NamespaceArray`
    pub namespace_array: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            application_uri: "urn:ua-server:server".to_string(),
            product_uri: "urn:ua-server".to_string(),
            application_name: "UA Server".to_string(),
            endpoint_urls: vec![DEFAULT_ENDPOINT_URL.to_string()],
            allow_remote_admin: true,
            disabled_clock: false,
            clock_interval: Duration::from_secs(1),
            max_request_message_size: DEFAULT_MAX_REQUEST_MESSAGE_SIZE,
            nonce_length: DEFAULT_NONCE_LENGTH,
            namespace_array: vec![DEFAULT_NAMESPACE_URI.to_string()],
        }
    }
}

impl ServerConfig {
    /// Check the configuration before the server is built.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Config`] for an empty application URI, an unparsable
    ///   endpoint URL or a zero clock interval
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.application_uri.is_empty() {
            return Err(ServerError::Config("application URI is empty".to_string()));
        }
        for endpoint in &self.endpoint_urls {
            Url::parse(endpoint)
                .map_err(|e| ServerError::Config(format!("endpoint URL {endpoint:?}: {e}")))?;
        }
        if self.clock_interval.is_zero() {
            return Err(ServerError::Config("clock interval is zero".to_string()));
        }
        Ok(())
    }

    /// Limits handed to every session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_request_message_size: self.max_request_message_size,
            nonce_length: self.nonce_length,
        }
    }

    /// This server's application description.
    pub fn application_description(&self) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: self.application_uri.clone(),
            product_uri: self.product_uri.clone(),
            application_name: LocalizedText::new(&self.application_name),
            application_type: ApplicationType::Server,
            gateway_server_uri: String::new(),
            discovery_profile_uri: String::new(),
            discovery_urls: self.endpoint_urls.clone(),
        }
    }

    /// One unsecured UA-TCP endpoint per configured URL, accepting anonymous
    /// and user-name tokens.
    pub fn endpoint_descriptions(&self) -> Vec<EndpointDescription> {
        let server = self.application_description();
        let tokens = vec![
            UserTokenPolicy {
                policy_id: "anonymous".to_string(),
                token_type: UserTokenType::Anonymous,
                security_policy_uri: String::new(),
            },
            UserTokenPolicy {
                policy_id: "username".to_string(),
                token_type: UserTokenType::UserName,
                security_policy_uri: String::new(),
            },
        ];

        self.endpoint_urls
            .iter()
            .map(|url| EndpointDescription {
                endpoint_url: url.clone(),
                server: server.clone(),
                security_mode: MessageSecurityMode::None,
                security_policy_uri: SECURITY_POLICY_NONE.to_string(),
                user_identity_tokens: tokens.clone(),
                transport_profile_uri: TRANSPORT_PROFILE_UATCP.to_string(),
                ..EndpointDescription::default()
            })
            .collect()
    }
}
