//! Discovery and endpoint descriptors.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::LocalizedText;

/// Transport profile for UA-TCP with binary encoding.
pub const TRANSPORT_PROFILE_UATCP: &str =
    "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary";

/// Security policy URI for unsecured endpoints.
pub const SECURITY_POLICY_NONE: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

/// Kind of OPC-UA application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    /// Server
    #[default]
    Server,
    /// Client
    Client,
    /// Both client and server
    ClientAndServer,
    /// Discovery server
    DiscoveryServer,
}

/// Describes an application, as returned by `FindServers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDescription {
    /// Globally unique application URI (discovery registry key)
    pub application_uri: String,
    /// URI of the product
    pub product_uri: String,
    /// Display name of the application
    pub application_name: LocalizedText,
    /// Kind of application
    pub application_type: ApplicationType,
    /// Gateway server URI, empty if none
    pub gateway_server_uri: String,
    /// Discovery profile URI, empty if none
    pub discovery_profile_uri: String,
    /// URLs at which the application's discovery endpoints are reachable
    pub discovery_urls: Vec<String>,
}

/// Server description submitted by `RegisterServer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredServer {
    /// Application URI of the registering server
    pub server_uri: String,
    /// Product URI
    pub product_uri: String,
    /// Names in one or more locales
    pub server_names: Vec<LocalizedText>,
    /// Kind of application
    pub server_type: ApplicationType,
    /// Gateway server URI, empty if none
    pub gateway_server_uri: String,
    /// Discovery URLs
    pub discovery_urls: Vec<String>,
    /// Semaphore file path, empty if none
    pub semaphore_file_path: String,
    /// Whether the server is online
    pub is_online: bool,
}

/// mDNS discovery configuration submitted by `RegisterServer2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdnsDiscoveryConfiguration {
    /// mDNS server name
    pub mdns_server_name: String,
    /// Server capability identifiers
    pub server_capabilities: Vec<String>,
}

/// `FindServers` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindServersParameters {
    /// Endpoint URL the client used
    pub endpoint_url: String,
    /// Preferred locales
    pub locale_ids: Vec<String>,
    /// Application URI filters, matched by colon-segment prefix
    pub server_uris: Vec<String>,
}

/// `RegisterServer2` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterServer2Parameters {
    /// The server to register
    pub server: RegisteredServer,
    /// Optional discovery configuration
    pub discovery_configuration: Option<MdnsDiscoveryConfiguration>,
}

/// Message security mode of an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    /// Invalid
    Invalid,
    /// No security
    #[default]
    None,
    /// Signed messages
    Sign,
    /// Signed and encrypted messages
    SignAndEncrypt,
}

/// Kind of user identity token an endpoint accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserTokenType {
    /// Anonymous
    #[default]
    Anonymous,
    /// User name and password
    UserName,
    /// X.509 certificate
    Certificate,
    /// Issued (e.g. WS-Security) token
    IssuedToken,
}

/// A user identity token policy advertised by an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokenPolicy {
    /// Policy id referenced by identity tokens
    pub policy_id: String,
    /// Token type
    pub token_type: UserTokenType,
    /// Security policy used to encrypt the token, empty for the endpoint's
    pub security_policy_uri: String,
}

/// Describes an endpoint a client can connect to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescription {
    /// URL of the endpoint, e.g. `opc.tcp://host:4840/server`
    pub endpoint_url: String,
    /// The application exposing the endpoint
    pub server: ApplicationDescription,
    /// Server application instance certificate (DER)
    pub server_certificate: Bytes,
    /// Message security mode
    pub security_mode: MessageSecurityMode,
    /// Security policy URI
    pub security_policy_uri: String,
    /// Accepted user identity tokens
    pub user_identity_tokens: Vec<UserTokenPolicy>,
    /// Transport profile URI
    pub transport_profile_uri: String,
    /// Relative security level
    pub security_level: u8,
}

/// `GetEndpoints` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetEndpointsParameters {
    /// Endpoint URL the client used
    pub endpoint_url: String,
    /// Preferred locales
    pub locale_ids: Vec<String>,
    /// Transport profile filter; empty means all endpoints
    pub profile_uris: Vec<String>,
}
