//! Recording collaborators for session tests.
//!
//! The attribute store hands out clones of what it holds, so byte buffers in
//! read results alias the stored values unless the session detaches them.

#![allow(dead_code)]

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc, Mutex,
        mpsc::{Receiver, Sender, channel},
    },
    time::Duration,
};

use ua_core::{
    AdminNameVerifier, AttributeService, EndpointRegistry, HistoryManager, IdentityAllocator,
    InternalSession, MethodCallback, MethodService, NodeManagementService, PublishCallback,
    ServiceError, Services, SessionConfig, SessionContext, SessionOrigin, SubscriptionService,
    UserRole, ViewService, env::test_utils::MockEnv,
};
use ua_proto::{
    AttributeId, DataValue, NodeId, StatusCode,
    services::{
        AddNodesItem, AddNodesResult, AddReferencesItem, BrowseDescription, BrowsePath,
        BrowsePathResult, BrowseResult, CallMethodRequest, CallMethodResult,
        CreateMonitoredItemsParameters, CreateSubscriptionParameters, CreateSubscriptionResult,
        DeleteMonitoredItemsParameters, DeleteNodesItem, DeleteReferencesItem,
        HistoryReadParameters, HistoryReadResult, ModifyMonitoredItemsParameters,
        MonitoredItemCreateResult, MonitoredItemModifyResult, NotificationMessage,
        ReadParameters, RepublishParameters, SubscriptionAcknowledgement, WriteParameters,
    },
};

/// Attribute store keyed by `(node, attribute)`.
#[derive(Default)]
pub struct FakeAttributes {
    pub values: Mutex<HashMap<(NodeId, AttributeId), DataValue>>,
    pub write_users: Mutex<Vec<UserRole>>,
}

impl FakeAttributes {
    pub fn insert(&self, node: NodeId, attribute: AttributeId, value: DataValue) {
        self.values.lock().unwrap().insert((node, attribute), value);
    }

    pub fn get(&self, node: &NodeId, attribute: AttributeId) -> Option<DataValue> {
        self.values.lock().unwrap().get(&(node.clone(), attribute)).cloned()
    }
}

impl AttributeService for FakeAttributes {
    fn read(&self, params: &ReadParameters) -> Result<Vec<DataValue>, ServiceError> {
        let values = self.values.lock().unwrap();
        Ok(params
            .nodes_to_read
            .iter()
            .map(|r| {
                values
                    .get(&(r.node_id.clone(), r.attribute_id))
                    .cloned()
                    .unwrap_or_else(|| DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN))
            })
            .collect())
    }

    fn write(
        &self,
        params: WriteParameters,
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.write_users.lock().unwrap().push(user);
        let mut values = self.values.lock().unwrap();
        Ok(params
            .nodes_to_write
            .into_iter()
            .map(|w| {
                values.insert((w.node_id, w.attribute_id), w.value);
                StatusCode::GOOD
            })
            .collect())
    }
}

/// Subscription engine that records every cancellation request.
#[derive(Default)]
pub struct FakeSubscriptions {
    next_id: Mutex<u32>,
    pub live: Mutex<BTreeSet<u32>>,
    pub delete_requests: Mutex<Vec<Vec<u32>>>,
    pub publish_calls: Mutex<Vec<Vec<SubscriptionAcknowledgement>>>,
}

impl SubscriptionService for FakeSubscriptions {
    fn create_subscription(
        &self,
        params: &CreateSubscriptionParameters,
        _callback: PublishCallback,
    ) -> Result<CreateSubscriptionResult, ServiceError> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        self.live.lock().unwrap().insert(*next);
        Ok(CreateSubscriptionResult {
            subscription_id: *next,
            revised_publishing_interval: params.requested_publishing_interval,
            revised_lifetime_count: params.requested_lifetime_count,
            revised_max_keep_alive_count: params.requested_max_keep_alive_count,
        })
    }

    fn delete_subscriptions(&self, ids: &[u32]) -> Result<Vec<StatusCode>, ServiceError> {
        self.delete_requests.lock().unwrap().push(ids.to_vec());
        let mut live = self.live.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                if live.remove(id) {
                    StatusCode::GOOD
                } else {
                    StatusCode::BAD_SUBSCRIPTION_ID_INVALID
                }
            })
            .collect())
    }

    fn create_monitored_items(
        &self,
        params: &CreateMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemCreateResult>, ServiceError> {
        Ok(vec![MonitoredItemCreateResult::default(); params.items_to_create.len()])
    }

    fn modify_monitored_items(
        &self,
        params: &ModifyMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemModifyResult>, ServiceError> {
        Ok(vec![MonitoredItemModifyResult::default(); params.items_to_modify.len()])
    }

    fn delete_monitored_items(
        &self,
        params: &DeleteMonitoredItemsParameters,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        Ok(vec![StatusCode::GOOD; params.monitored_item_ids.len()])
    }

    fn republish(
        &self,
        _params: &RepublishParameters,
    ) -> Result<NotificationMessage, ServiceError> {
        Err(StatusCode::BAD_MESSAGE_NOT_AVAILABLE.into())
    }

    fn publish(&self, acks: &[SubscriptionAcknowledgement]) -> Result<(), ServiceError> {
        self.publish_calls.lock().unwrap().push(acks.to_vec());
        Ok(())
    }
}

/// Subscription engine that parks inside `create_subscription` after the
/// subscription is live, until the test releases it.
pub struct GatedSubscriptions {
    pub inner: FakeSubscriptions,
    entered: Mutex<Sender<u32>>,
    release: Mutex<Receiver<()>>,
}

impl GatedSubscriptions {
    /// The engine, a receiver told each id as it goes live, and the sender
    /// that lets one parked creation return.
    pub fn new() -> (Self, Receiver<u32>, Sender<()>) {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let engine = Self {
            inner: FakeSubscriptions::default(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (engine, entered_rx, release_tx)
    }

    pub fn live(&self) -> BTreeSet<u32> {
        self.inner.live.lock().unwrap().clone()
    }
}

impl SubscriptionService for GatedSubscriptions {
    fn create_subscription(
        &self,
        params: &CreateSubscriptionParameters,
        callback: PublishCallback,
    ) -> Result<CreateSubscriptionResult, ServiceError> {
        let result = self.inner.create_subscription(params, callback)?;
        self.entered.lock().unwrap().send(result.subscription_id).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(result)
    }

    fn delete_subscriptions(&self, ids: &[u32]) -> Result<Vec<StatusCode>, ServiceError> {
        self.inner.delete_subscriptions(ids)
    }

    fn create_monitored_items(
        &self,
        params: &CreateMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemCreateResult>, ServiceError> {
        self.inner.create_monitored_items(params)
    }

    fn modify_monitored_items(
        &self,
        params: &ModifyMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemModifyResult>, ServiceError> {
        self.inner.modify_monitored_items(params)
    }

    fn delete_monitored_items(
        &self,
        params: &DeleteMonitoredItemsParameters,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.inner.delete_monitored_items(params)
    }

    fn republish(&self, params: &RepublishParameters) -> Result<NotificationMessage, ServiceError> {
        self.inner.republish(params)
    }

    fn publish(&self, acks: &[SubscriptionAcknowledgement]) -> Result<(), ServiceError> {
        self.inner.publish(acks)
    }
}

/// Views, node management, methods and history with canned answers.
#[derive(Default)]
pub struct Inert {
    pub node_users: Mutex<Vec<UserRole>>,
    pub method_bindings: Mutex<Vec<NodeId>>,
}

impl ViewService for Inert {
    fn browse(&self, nodes: &[BrowseDescription]) -> Result<Vec<BrowseResult>, ServiceError> {
        Ok(vec![BrowseResult::default(); nodes.len()])
    }

    fn translate_browse_paths_to_node_ids(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, ServiceError> {
        Ok(vec![BrowsePathResult::default(); paths.len()])
    }
}

impl NodeManagementService for Inert {
    fn add_nodes(
        &self,
        items: &[AddNodesItem],
        user: UserRole,
    ) -> Result<Vec<AddNodesResult>, ServiceError> {
        self.node_users.lock().unwrap().push(user);
        Ok(vec![AddNodesResult::default(); items.len()])
    }

    fn delete_nodes(
        &self,
        items: &[DeleteNodesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.node_users.lock().unwrap().push(user);
        Ok(vec![StatusCode::GOOD; items.len()])
    }

    fn add_references(
        &self,
        items: &[AddReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.node_users.lock().unwrap().push(user);
        Ok(vec![StatusCode::GOOD; items.len()])
    }

    fn delete_references(
        &self,
        items: &[DeleteReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        self.node_users.lock().unwrap().push(user);
        Ok(vec![StatusCode::GOOD; items.len()])
    }
}

impl MethodService for Inert {
    fn call(&self, requests: &[CallMethodRequest]) -> Result<Vec<CallMethodResult>, ServiceError> {
        Ok(vec![CallMethodResult::default(); requests.len()])
    }

    fn add_method_callback(&self, method_id: NodeId, _callback: MethodCallback) {
        self.method_bindings.lock().unwrap().push(method_id);
    }
}

impl HistoryManager for Inert {
    fn historize_data_change(
        &self,
        _node: &NodeId,
        _retention_period: Duration,
        _retention_count: u32,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    fn historize_event(
        &self,
        _source: &NodeId,
        _retention_period: Duration,
        _retention_count: u32,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    fn dehistorize(&self, _node: &NodeId) -> Result<(), ServiceError> {
        Ok(())
    }

    fn read_history(
        &self,
        params: &HistoryReadParameters,
    ) -> Result<Vec<HistoryReadResult>, ServiceError> {
        Ok(vec![HistoryReadResult::default(); params.nodes_to_read.len()])
    }

    fn stop(&self) {}
}

/// A session context wired to fresh fakes.
pub struct Harness {
    pub attributes: Arc<FakeAttributes>,
    pub subscriptions: Arc<FakeSubscriptions>,
    pub inert: Arc<Inert>,
    pub endpoints: Arc<EndpointRegistry>,
    pub ctx: SessionContext<MockEnv>,
}

impl Harness {
    pub fn new() -> Self {
        let attributes = Arc::new(FakeAttributes::default());
        let subscriptions = Arc::new(FakeSubscriptions::default());
        let inert = Arc::new(Inert::default());
        let endpoints = Arc::new(EndpointRegistry::new());

        let services = Services {
            attributes: attributes.clone(),
            views: inert.clone(),
            nodes: inert.clone(),
            methods: inert.clone(),
            subscriptions: subscriptions.clone(),
            history: inert.clone(),
        };
        let ctx = SessionContext {
            env: MockEnv::with_seed(42),
            services,
            endpoints: Arc::clone(&endpoints),
            verifier: Arc::new(AdminNameVerifier::new(true)),
            identities: Arc::new(IdentityAllocator::new()),
            config: SessionConfig::default(),
        };

        Self { attributes, subscriptions, inert, endpoints, ctx }
    }

    pub fn session(&self, origin: SessionOrigin) -> InternalSession<MockEnv> {
        InternalSession::new(self.ctx.clone(), "test", UserRole::Anonymous, origin).unwrap()
    }

    /// An external session whose subscription engine is `engine`.
    pub fn session_with_engine(
        &self,
        engine: Arc<dyn SubscriptionService>,
    ) -> InternalSession<MockEnv> {
        let mut ctx = self.ctx.clone();
        ctx.services.subscriptions = engine;
        InternalSession::new(ctx, "test", UserRole::Anonymous, SessionOrigin::External).unwrap()
    }
}

/// Publish callback that drops everything.
pub fn ignore_publish() -> PublishCallback {
    Arc::new(|_| {})
}
