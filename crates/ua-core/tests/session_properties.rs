//! Property-based tests for session identity, subscription teardown and the
//! discovery registry.

mod common;

use std::collections::{BTreeSet, HashSet};

use common::{Harness, ignore_publish};
use proptest::prelude::*;
use ua_core::{DiscoveryRegistry, SessionOrigin};
use ua_proto::{ApplicationDescription, LocalizedText, services::CreateSubscriptionParameters};

fn description(uri: &str, name: &str) -> ApplicationDescription {
    ApplicationDescription {
        application_uri: uri.to_string(),
        application_name: LocalizedText::new(name),
        ..ApplicationDescription::default()
    }
}

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["urn", "foo", "bar", "foobar", "1", "2"]).prop_map(str::to_string)
}

fn uri() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|s| s.join(":"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: session ids and tokens are never issued twice, whatever
    /// order sessions are created and closed in
    #[test]
    fn prop_identifiers_unique(closes in prop::collection::vec(any::<bool>(), 1..40)) {
        let harness = Harness::new();
        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();

        for close in closes {
            let session = harness.session(SessionOrigin::External);
            prop_assert!(ids.insert(session.session_id().clone()));
            prop_assert!(tokens.insert(session.authentication_token().clone()));
            if close {
                session.close_session(true);
            }
        }
    }

    /// Property: delete_subscriptions removes exactly the owned ids it was
    /// given and forwards the requested list to the engine untouched
    #[test]
    fn prop_teardown_passthrough(
        owned in 1usize..8,
        requested in prop::collection::vec(1u32..16, 0..10),
    ) {
        let harness = Harness::new();
        let session = harness.session(SessionOrigin::External);
        let params = CreateSubscriptionParameters::default();
        let created: Vec<u32> = (0..owned)
            .map(|_| {
                session.create_subscription(&params, ignore_publish()).unwrap().subscription_id
            })
            .collect();

        session.delete_subscriptions(&requested)?;

        let expected: Vec<u32> =
            created.iter().copied().filter(|id| !requested.contains(id)).collect();
        prop_assert_eq!(session.subscription_ids(), expected);

        let forwarded = harness.subscriptions.delete_requests.lock().unwrap().clone();
        prop_assert_eq!(forwarded, vec![requested]);
    }

    /// Property: closing leaves nothing owned and nothing live in the engine
    #[test]
    fn prop_close_cancels_everything(owned in 0usize..8) {
        let harness = Harness::new();
        let session = harness.session(SessionOrigin::External);
        let params = CreateSubscriptionParameters::default();
        for _ in 0..owned {
            session.create_subscription(&params, ignore_publish())?;
        }

        session.close_session(true);

        prop_assert!(session.subscription_ids().is_empty());
        prop_assert!(harness.subscriptions.live.lock().unwrap().is_empty());
    }

    /// Property: a filter matches exactly the URIs whose leading colon
    /// segments equal the filter's segments
    #[test]
    fn prop_find_servers_segment_prefix(
        uris in prop::collection::vec(uri(), 0..10),
        filter in uri(),
    ) {
        let registry = DiscoveryRegistry::new();
        for uri in &uris {
            registry.register(description(uri, uri), None);
        }

        let found: BTreeSet<String> = registry
            .find_servers(std::slice::from_ref(&filter))
            .into_iter()
            .map(|d| d.application_uri)
            .collect();

        let filter_segments: Vec<&str> = filter.split(':').collect();
        let expected: BTreeSet<String> = uris
            .iter()
            .filter(|uri| {
                let segments: Vec<&str> = uri.split(':').collect();
                segments.starts_with(&filter_segments)
            })
            .cloned()
            .collect();

        prop_assert_eq!(found, expected);
    }

    /// Property: after any sequence of registrations, each URI maps to the
    /// last description registered for it
    #[test]
    fn prop_last_registration_wins(
        registrations in prop::collection::vec((uri(), any::<u8>()), 1..20),
    ) {
        let registry = DiscoveryRegistry::new();
        for (uri, tag) in &registrations {
            registry.register(description(uri, &tag.to_string()), None);
        }

        let distinct: HashSet<&String> = registrations.iter().map(|(uri, _)| uri).collect();
        prop_assert_eq!(registry.len(), distinct.len());
        prop_assert_eq!(registry.find_servers(&[]).len(), distinct.len());

        for uri in distinct {
            let last = registrations.iter().rev().find(|(u, _)| u == uri).map(|(_, t)| t);
            let entry = registry.get(uri).unwrap();
            prop_assert_eq!(Some(entry.description.application_name.text), last.map(u8::to_string));
        }
    }
}
