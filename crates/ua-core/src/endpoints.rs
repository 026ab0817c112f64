//! Endpoint descriptors and per-client URL rewriting.
//!
//! Endpoints are registered once at startup with the URL the server binds
//! (often `0.0.0.0`). A client behind NAT or on another interface cannot
//! use that, so `get_endpoints` can hand back copies whose URL authority is
//! replaced by the address the client actually connected to. Stored
//! descriptors are never modified.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{PoisonError, RwLock},
};

use ua_proto::{EndpointDescription, GetEndpointsParameters};
use url::Url;

/// Append-only list of the server's endpoints.
///
/// Duplicates are allowed; where a lookup is ambiguous the first registered
/// endpoint wins.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: RwLock<Vec<EndpointDescription>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint.
    pub fn add(&self, endpoint: EndpointDescription) {
        self.endpoints.write().unwrap_or_else(PoisonError::into_inner).push(endpoint);
    }

    /// Copy of every registered endpoint, in registration order.
    pub fn snapshot(&self) -> Vec<EndpointDescription> {
        self.endpoints.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Endpoints for a `GetEndpoints` / `CreateSession` response.
    ///
    /// Non-empty `profile_uris` in `params` restrict the result to endpoints
    /// with a listed transport profile. With `client_socket`, each returned
    /// URL has its host and port replaced by the socket's; scheme and path
    /// are kept. A stored URL that does not parse is returned unchanged.
    pub fn get_endpoints(
        &self,
        params: Option<&GetEndpointsParameters>,
        client_socket: Option<SocketAddr>,
    ) -> Vec<EndpointDescription> {
        let endpoints = self.endpoints.read().unwrap_or_else(PoisonError::into_inner);
        let profiles = params.map(|p| p.profile_uris.as_slice()).unwrap_or_default();

        endpoints
            .iter()
            .filter(|e| profiles.is_empty() || profiles.contains(&e.transport_profile_uri))
            .map(|e| {
                let mut endpoint = e.clone();
                if let Some(socket) = client_socket {
                    match rewrite_endpoint_url(&endpoint.endpoint_url, socket) {
                        Ok(url) => endpoint.endpoint_url = url,
                        Err(err) => tracing::warn!(
                            url = %endpoint.endpoint_url,
                            "Cannot rewrite endpoint URL: {err}"
                        ),
                    }
                }
                endpoint
            })
            .collect()
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replace the authority of `endpoint_url` with `socket`'s host and port.
///
/// Any user info in the stored URL is dropped.
pub fn rewrite_endpoint_url(
    endpoint_url: &str,
    socket: SocketAddr,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(endpoint_url)?;

    let host = match socket.ip() {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("[{ip}]"),
    };
    url.set_host(Some(&host))?;
    url.set_port(Some(socket.port())).map_err(|()| url::ParseError::EmptyHost)?;
    url.set_username("").map_err(|()| url::ParseError::EmptyHost)?;
    url.set_password(None).map_err(|()| url::ParseError::EmptyHost)?;

    Ok(url.into())
}
