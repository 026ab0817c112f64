//! Fuzz target for the session lifecycle and subscription ownership
//!
//! # Strategy
//!
//! - Two external sessions and the server's internal session share one
//!   in-memory backend
//! - Random interleavings of activate, close, create/delete subscription,
//!   value writes, publish and channel id allocation
//! - Deletes may name ids owned by the other session, or no session at all
//!
//! # Invariants
//!
//! - Activation succeeds only from `Created`; `Closed` is terminal
//! - Every subscription the engine still holds is owned by some session
//! - Closing a session empties its owned set
//! - Channel ids strictly increase
//! - Closing every session leaves the engine empty

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ua_core::{InternalSession, PublishCallback, SessionState, UserRole, env::test_utils::MockEnv};
use ua_proto::{
    NodeId, object_ids,
    services::{ActivateSessionParameters, CreateSubscriptionParameters, UserIdentityToken},
};
use ua_server::{InternalServer, MemoryBackend, ServerConfig};

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Activate { session: bool, admin: bool },
    Close { session: bool, delete_subscriptions: bool },
    CreateSubscription { session: bool, publishing_interval: u16 },
    DeleteSubscriptions { session: bool, ids: Vec<u8> },
    Write { value: i32 },
    Publish { session: bool },
    ChannelId,
}

fuzz_target!(|input: (u64, Vec<SessionOp>)| {
    let (seed, ops) = input;
    let env = MockEnv::with_seed(seed);
    let backend = MemoryBackend::new(env.clone());
    let config = ServerConfig { disabled_clock: true, ..ServerConfig::default() };
    let server = InternalServer::new(config, env, backend.services()).expect("server");

    let sessions = [
        server.create_session("a", UserRole::Anonymous, true).expect("session a"),
        server.create_session("b", UserRole::Anonymous, true).expect("session b"),
    ];
    let pick = |second: bool| &sessions[usize::from(second)];
    let callback: PublishCallback = Arc::new(|_| {});
    let mut last_channel = None;

    for op in ops {
        match op {
            SessionOp::Activate { session, admin } => {
                let session = pick(session);
                let before = session.state();
                let token = if admin {
                    UserIdentityToken::user_name("admin", "")
                } else {
                    UserIdentityToken::default()
                };
                let params =
                    ActivateSessionParameters { user_identity_token: token, ..Default::default() };

                let result = session.activate_session(&params);
                assert_eq!(result.is_ok(), before == SessionState::Created);
                if result.is_ok() {
                    assert_eq!(session.state(), SessionState::Activated);
                } else {
                    assert_eq!(session.state(), before);
                }
            },
            SessionOp::Close { session, delete_subscriptions } => {
                let session = pick(session);
                session.close_session(delete_subscriptions);
                assert_eq!(session.state(), SessionState::Closed);
                assert!(session.subscription_ids().is_empty());
            },
            SessionOp::CreateSubscription { session, publishing_interval } => {
                let params = CreateSubscriptionParameters {
                    requested_publishing_interval: f64::from(publishing_interval),
                    ..Default::default()
                };
                if let Ok(result) = pick(session).create_subscription(&params, callback.clone()) {
                    assert!(backend.subscriptions.is_live(result.subscription_id));
                }
            },
            SessionOp::DeleteSubscriptions { session, ids } => {
                let ids: Vec<u32> = ids.into_iter().map(u32::from).collect();
                let session = pick(session);
                let _ = session.delete_subscriptions(&ids);
                assert!(session.subscription_ids().iter().all(|id| !ids.contains(id)));
            },
            SessionOp::Write { value } => {
                let node = NodeId::from(object_ids::SERVER_SERVER_STATUS_CURRENT_TIME);
                let _ = server.internal_session().node(node).set_value(value);
            },
            SessionOp::Publish { session } => {
                let _ = pick(session).publish(&[]);
            },
            SessionOp::ChannelId => {
                if let Ok(id) = server.next_channel_id() {
                    assert!(id >= 6);
                    if let Some(last) = last_channel {
                        assert!(id > last);
                    }
                    last_channel = Some(id);
                }
            },
        }

        check_ownership(&backend, &sessions);
    }

    for session in &sessions {
        session.close_session(true);
    }
    assert!(backend.subscriptions.is_empty());
});

fn check_ownership(backend: &MemoryBackend<MockEnv>, sessions: &[InternalSession<MockEnv>; 2]) {
    let owned: Vec<u32> = sessions.iter().flat_map(InternalSession::subscription_ids).collect();
    let live = backend.subscriptions.len();
    let owned_live = owned.iter().filter(|id| backend.subscriptions.is_live(**id)).count();
    assert_eq!(live, owned_live, "engine holds a subscription no session owns");
}
