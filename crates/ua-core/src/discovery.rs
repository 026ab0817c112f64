//! Discovery registry for known servers.
//!
//! Maps application URI to the server's description and optional discovery
//! configuration. At most one entry per URI: registering a URI again
//! replaces the previous entry in place, so `find_servers` keeps returning
//! entries in first-registration order.
//!
//! Lookups filter by colon-segment prefix, not substring: the filter
//! `urn:foo` matches `urn:foo:1` but neither `urn:foobar` nor `xurn:foo`.

use std::sync::{PoisonError, RwLock};

use ua_proto::{
    ApplicationDescription, MdnsDiscoveryConfiguration, RegisterServer2Parameters, RegisteredServer,
};

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownServer {
    /// Description returned by `find_servers`
    pub description: ApplicationDescription,
    /// Configuration supplied by `RegisterServer2`, if any
    pub discovery_configuration: Option<MdnsDiscoveryConfiguration>,
}

/// Thread-safe registry of known servers.
#[derive(Debug, Default)]
pub struct DiscoveryRegistry {
    servers: RwLock<Vec<KnownServer>>,
}

impl DiscoveryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `description.application_uri`.
    pub fn register(
        &self,
        description: ApplicationDescription,
        discovery_configuration: Option<MdnsDiscoveryConfiguration>,
    ) {
        let entry = KnownServer { description, discovery_configuration };
        let mut servers = self.servers.write().unwrap_or_else(PoisonError::into_inner);

        match servers
            .iter_mut()
            .find(|s| s.description.application_uri == entry.description.application_uri)
        {
            Some(existing) => *existing = entry,
            None => servers.push(entry),
        }
    }

    /// Register a server from a `RegisterServer` request.
    ///
    /// The application name is the first of `server_names`; locale
    /// selection is not modelled.
    pub fn register_server(
        &self,
        server: &RegisteredServer,
        discovery_configuration: Option<MdnsDiscoveryConfiguration>,
    ) {
        let description = ApplicationDescription {
            application_uri: server.server_uri.clone(),
            product_uri: server.product_uri.clone(),
            application_name: server.server_names.first().cloned().unwrap_or_default(),
            application_type: server.server_type,
            gateway_server_uri: server.gateway_server_uri.clone(),
            discovery_profile_uri: String::new(),
            discovery_urls: server.discovery_urls.clone(),
        };

        tracing::debug!(uri = %server.server_uri, "Registering server");
        self.register(description, discovery_configuration);
    }

    /// Register a server from a `RegisterServer2` request.
    pub fn register_server2(&self, params: &RegisterServer2Parameters) {
        self.register_server(&params.server, params.discovery_configuration.clone());
    }

    /// Descriptions matching any of `server_uris`, or all when empty.
    pub fn find_servers(&self, server_uris: &[String]) -> Vec<ApplicationDescription> {
        let servers = self.servers.read().unwrap_or_else(PoisonError::into_inner);

        servers
            .iter()
            .filter(|s| {
                server_uris.is_empty()
                    || server_uris.iter().any(|f| uri_has_prefix(&s.description.application_uri, f))
            })
            .map(|s| s.description.clone())
            .collect()
    }

    /// Entry for an application URI.
    pub fn get(&self, application_uri: &str) -> Option<KnownServer> {
        let servers = self.servers.read().unwrap_or_else(PoisonError::into_inner);
        servers.iter().find(|s| s.description.application_uri == application_uri).cloned()
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no server is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether the colon-separated segments of `filter` are a prefix of those of
/// `uri`.
fn uri_has_prefix(uri: &str, filter: &str) -> bool {
    let mut segments = uri.split(':');
    filter.split(':').all(|f| segments.next() == Some(f))
}

#[cfg(test)]
mod tests {
    use ua_proto::LocalizedText;

    use super::*;

    fn description(uri: &str, name: &str) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: uri.to_string(),
            application_name: LocalizedText::new(name),
            ..ApplicationDescription::default()
        }
    }

    fn uris(descriptions: &[ApplicationDescription]) -> Vec<&str> {
        descriptions.iter().map(|d| d.application_uri.as_str()).collect()
    }

    #[test]
    fn segment_prefix_matching() {
        assert!(uri_has_prefix("urn:foo:1", "urn:foo"));
        assert!(uri_has_prefix("urn:foo", "urn:foo"));
        assert!(uri_has_prefix("urn:foo:1", "urn"));
        assert!(!uri_has_prefix("urn:foobar", "urn:foo"));
        assert!(!uri_has_prefix("urn", "urn:foo"));
        assert!(!uri_has_prefix("xurn:foo", "urn:foo"));
    }

    #[test]
    fn find_servers_filters_by_prefix() {
        let registry = DiscoveryRegistry::new();
        registry.register(description("urn:foo:1", "A"), None);
        registry.register(description("urn:bar:1", "B"), None);

        let found = registry.find_servers(&["urn:foo".to_string()]);
        assert_eq!(uris(&found), vec!["urn:foo:1"]);

        let all = registry.find_servers(&[]);
        assert_eq!(uris(&all), vec!["urn:foo:1", "urn:bar:1"]);
    }

    #[test]
    fn any_filter_may_match() {
        let registry = DiscoveryRegistry::new();
        registry.register(description("urn:foo:1", "A"), None);
        registry.register(description("urn:bar:1", "B"), None);
        registry.register(description("urn:baz:1", "C"), None);

        let found = registry.find_servers(&["urn:baz".to_string(), "urn:foo:1".to_string()]);
        assert_eq!(uris(&found), vec!["urn:foo:1", "urn:baz:1"]);
    }

    #[test]
    fn re_registration_replaces_in_place() {
        let registry = DiscoveryRegistry::new();
        registry.register(description("urn:foo:1", "A"), None);
        registry.register(description("urn:bar:1", "B"), None);
        registry.register(description("urn:foo:1", "A2"), None);

        assert_eq!(registry.len(), 2);
        let all = registry.find_servers(&[]);
        assert_eq!(all[0].application_name.text, "A2");
        assert_eq!(all[1].application_name.text, "B");
    }

    #[test]
    fn register_server_copies_descriptor_fields() {
        let registry = DiscoveryRegistry::new();
        let server = RegisteredServer {
            server_uri: "urn:plant:boiler".to_string(),
            product_uri: "urn:vendor:product".to_string(),
            server_names: vec![LocalizedText::new("Boiler"), LocalizedText::new("Chaudière")],
            gateway_server_uri: "urn:gateway".to_string(),
            discovery_urls: vec!["opc.tcp://boiler:4840".to_string()],
            ..RegisteredServer::default()
        };
        let config = MdnsDiscoveryConfiguration {
            mdns_server_name: "boiler".to_string(),
            server_capabilities: vec!["DA".to_string()],
        };

        registry.register_server2(&RegisterServer2Parameters {
            server,
            discovery_configuration: Some(config.clone()),
        });

        let entry = registry.get("urn:plant:boiler").unwrap();
        assert_eq!(entry.description.product_uri, "urn:vendor:product");
        assert_eq!(entry.description.application_name.text, "Boiler");
        assert_eq!(entry.description.gateway_server_uri, "urn:gateway");
        assert_eq!(entry.description.discovery_urls, vec!["opc.tcp://boiler:4840"]);
        assert_eq!(entry.discovery_configuration, Some(config));
    }

    #[test]
    fn register_server_without_names_uses_empty_name() {
        let registry = DiscoveryRegistry::new();
        let server =
            RegisteredServer { server_uri: "urn:anon".to_string(), ..RegisteredServer::default() };

        registry.register_server(&server, None);

        let entry = registry.get("urn:anon").unwrap();
        assert_eq!(entry.description.application_name, LocalizedText::default());
        assert!(entry.discovery_configuration.is_none());
    }
}
