//! In-memory collaborators.
//!
//! A [`MemoryBackend`] bundles an address space, a subscription engine and
//! a history store that share nothing but the write path: every successful
//! attribute write is forwarded to the subscription engine (data change
//! notifications) and to the history store (captured values).
//!
//! All three are cheap to clone; clones share state. Tests keep a clone to
//! inspect what the server did through the [`Services`] handles.

mod address_space;
mod history;
mod subscriptions;

use std::sync::Arc;

pub use address_space::{MemoryAddressSpace, WriteObserver};
pub use history::{DEFAULT_RETENTION_PERIOD, MemoryHistory, Retention};
pub use subscriptions::{MAX_RETRANSMISSION_QUEUE, MIN_PUBLISHING_INTERVAL, MemorySubscriptions};
use ua_core::{Services, env::Environment};

/// Address space, subscriptions and history held in process memory.
#[derive(Clone)]
pub struct MemoryBackend<E: Environment> {
    /// Node store
    pub address_space: MemoryAddressSpace,
    /// Subscription engine
    pub subscriptions: MemorySubscriptions<E>,
    /// History store
    pub history: MemoryHistory<E>,
}

impl<E: Environment> MemoryBackend<E> {
    /// Fresh backend with the standard server nodes.
    pub fn new(env: E) -> Self {
        let address_space = MemoryAddressSpace::new();
        let subscriptions = MemorySubscriptions::new(env.clone());
        let history = MemoryHistory::new(env);

        let notify = subscriptions.clone();
        address_space.add_write_observer(Arc::new(move |node, attribute, value| {
            notify.on_write(node, attribute, value);
        }));
        let capture = history.clone();
        address_space.add_write_observer(Arc::new(move |node, attribute, value| {
            capture.on_write(node, attribute, value);
        }));

        Self { address_space, subscriptions, history }
    }

    /// Service handles backed by this store.
    pub fn services(&self) -> Services {
        let address_space = Arc::new(self.address_space.clone());
        Services {
            attributes: address_space.clone(),
            views: address_space.clone(),
            nodes: address_space.clone(),
            methods: address_space,
            subscriptions: Arc::new(self.subscriptions.clone()),
            history: Arc::new(self.history.clone()),
        }
    }
}

impl<E: Environment> std::fmt::Debug for MemoryBackend<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}
