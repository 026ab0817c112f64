//! Session service set: `CreateSession`, `ActivateSession`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{ApplicationDescription, EndpointDescription, NodeId, StatusCode};

/// `CreateSession` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionParameters {
    /// Description of the connecting client
    pub client_description: ApplicationDescription,
    /// Endpoint URL the client used
    pub endpoint_url: String,
    /// Human-readable session name
    pub session_name: String,
    /// Client nonce
    pub client_nonce: Bytes,
    /// Requested session timeout in milliseconds
    pub requested_session_timeout: f64,
    /// Largest response the client accepts, 0 for no limit
    pub max_response_message_size: u32,
}

/// `CreateSession` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionResult {
    /// Public session id
    pub session_id: NodeId,
    /// Secret token the client attaches to every request
    pub authentication_token: NodeId,
    /// Session timeout the server applies, in milliseconds
    pub revised_session_timeout: f64,
    /// Fresh server nonce
    pub server_nonce: Bytes,
    /// Endpoints of this server, rewritten for the client's socket
    pub server_endpoints: Vec<EndpointDescription>,
    /// Largest request the server accepts
    pub max_request_message_size: u32,
}

/// A client software certificate with its signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSoftwareCertificate {
    /// Certificate bytes
    pub certificate_data: Bytes,
    /// Signature over the certificate
    pub signature: Bytes,
}

/// Identity the client presents on activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserIdentityToken {
    /// No identity
    Anonymous {
        /// Policy id from the endpoint's token policies
        policy_id: String,
    },
    /// User name and (possibly encrypted) password
    UserName {
        /// Policy id from the endpoint's token policies
        policy_id: String,
        /// User name
        user_name: String,
        /// Password bytes
        password: Bytes,
        /// Algorithm used to encrypt the password, empty if plain
        encryption_algorithm: String,
    },
    /// X.509 user certificate
    X509 {
        /// Policy id from the endpoint's token policies
        policy_id: String,
        /// Certificate (DER)
        certificate_data: Bytes,
    },
    /// Token issued by an external authority
    Issued {
        /// Policy id from the endpoint's token policies
        policy_id: String,
        /// Token bytes
        token_data: Bytes,
    },
}

impl Default for UserIdentityToken {
    fn default() -> Self {
        Self::Anonymous { policy_id: String::new() }
    }
}

impl UserIdentityToken {
    /// User name token with a plain password.
    pub fn user_name(user_name: impl Into<String>, password: impl Into<Bytes>) -> Self {
        Self::UserName {
            policy_id: String::new(),
            user_name: user_name.into(),
            password: password.into(),
            encryption_algorithm: String::new(),
        }
    }
}

/// `ActivateSession` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateSessionParameters {
    /// Client software certificates
    pub client_software_certificates: Vec<SignedSoftwareCertificate>,
    /// Identity of the user
    pub user_identity_token: UserIdentityToken,
    /// Preferred locales
    pub locale_ids: Vec<String>,
}

/// `ActivateSession` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateSessionResult {
    /// Fresh server nonce
    pub server_nonce: Bytes,
    /// One status per submitted client software certificate
    pub results: Vec<StatusCode>,
}
