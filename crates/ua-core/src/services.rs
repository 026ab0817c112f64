//! Collaborator interfaces consumed by sessions and the server.
//!
//! The session core owns no address space, subscription engine or history
//! store. It forwards to these traits and passes their errors through
//! unchanged. All methods are synchronous and take `&self`: implementations
//! are shared behind `Arc` by every session of a server and synchronize
//! internally.

use std::{sync::Arc, time::Duration};

use ua_proto::{
    DataValue, NodeId, StatusCode, Variant,
    services::{
        AddNodesItem, AddNodesResult, AddReferencesItem, BrowseDescription, BrowsePath,
        BrowsePathResult, BrowseResult, CallMethodRequest, CallMethodResult,
        CreateMonitoredItemsParameters, CreateSubscriptionParameters, CreateSubscriptionResult,
        DeleteMonitoredItemsParameters, DeleteNodesItem, DeleteReferencesItem,
        HistoryReadParameters, HistoryReadResult, ModifyMonitoredItemsParameters,
        MonitoredItemCreateResult, MonitoredItemModifyResult, NotificationMessage, PublishResult,
        ReadParameters, RepublishParameters, SubscriptionAcknowledgement, WriteParameters,
    },
};

use crate::{credentials::UserRole, error::ServiceError};

/// Receives publish results for one subscription.
pub type PublishCallback = Arc<dyn Fn(PublishResult) + Send + Sync>;

/// Implementation of a method node: `(object_id, input_arguments)` to
/// output arguments.
pub type MethodCallback =
    Arc<dyn Fn(&NodeId, &[Variant]) -> Result<Vec<Variant>, StatusCode> + Send + Sync>;

/// Attribute read and write against the address space.
pub trait AttributeService: Send + Sync {
    /// One result per requested attribute, in request order.
    ///
    /// Per-attribute failures are reported in each `DataValue::status`;
    /// `Err` is reserved for failures of the whole request.
    fn read(&self, params: &ReadParameters) -> Result<Vec<DataValue>, ServiceError>;

    /// Write attributes on behalf of `user`. One status per value.
    fn write(&self, params: WriteParameters, user: UserRole)
    -> Result<Vec<StatusCode>, ServiceError>;
}

/// Reference traversal.
pub trait ViewService: Send + Sync {
    /// References of each described node.
    fn browse(&self, nodes: &[BrowseDescription]) -> Result<Vec<BrowseResult>, ServiceError>;

    /// Resolve each relative path to target node ids.
    fn translate_browse_paths_to_node_ids(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, ServiceError>;
}

/// Structural changes to the address space.
pub trait NodeManagementService: Send + Sync {
    /// Add nodes on behalf of `user`.
    fn add_nodes(
        &self,
        items: &[AddNodesItem],
        user: UserRole,
    ) -> Result<Vec<AddNodesResult>, ServiceError>;

    /// Delete nodes on behalf of `user`.
    fn delete_nodes(
        &self,
        items: &[DeleteNodesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError>;

    /// Add references on behalf of `user`.
    fn add_references(
        &self,
        items: &[AddReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError>;

    /// Delete references on behalf of `user`.
    fn delete_references(
        &self,
        items: &[DeleteReferencesItem],
        user: UserRole,
    ) -> Result<Vec<StatusCode>, ServiceError>;
}

/// Method invocation.
pub trait MethodService: Send + Sync {
    /// Invoke each requested method.
    fn call(&self, requests: &[CallMethodRequest]) -> Result<Vec<CallMethodResult>, ServiceError>;

    /// Bind `callback` to `method_id`, replacing any previous binding.
    fn add_method_callback(&self, method_id: NodeId, callback: MethodCallback);
}

/// The subscription engine.
///
/// Owns subscription state, sampling and publishing. Sessions only track
/// which ids they created.
pub trait SubscriptionService: Send + Sync {
    /// Create a subscription whose notifications go to `callback`.
    fn create_subscription(
        &self,
        params: &CreateSubscriptionParameters,
        callback: PublishCallback,
    ) -> Result<CreateSubscriptionResult, ServiceError>;

    /// Cancel subscriptions. One status per id; an id the engine does not
    /// know yields a bad status, not an `Err`.
    fn delete_subscriptions(&self, ids: &[u32]) -> Result<Vec<StatusCode>, ServiceError>;

    /// Add monitored items to a subscription.
    fn create_monitored_items(
        &self,
        params: &CreateMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemCreateResult>, ServiceError>;

    /// Change monitored item parameters.
    fn modify_monitored_items(
        &self,
        params: &ModifyMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemModifyResult>, ServiceError>;

    /// Remove monitored items.
    fn delete_monitored_items(
        &self,
        params: &DeleteMonitoredItemsParameters,
    ) -> Result<Vec<StatusCode>, ServiceError>;

    /// Resend a notification that was not acknowledged.
    fn republish(&self, params: &RepublishParameters)
    -> Result<NotificationMessage, ServiceError>;

    /// Acknowledge notifications and ask for the next publish.
    fn publish(&self, acks: &[SubscriptionAcknowledgement]) -> Result<(), ServiceError>;
}

/// The history collaborator.
pub trait HistoryManager: Send + Sync {
    /// Start capturing value changes of `node`.
    fn historize_data_change(
        &self,
        node: &NodeId,
        retention_period: Duration,
        retention_count: u32,
    ) -> Result<(), ServiceError>;

    /// Start capturing events emitted by `source`.
    fn historize_event(
        &self,
        source: &NodeId,
        retention_period: Duration,
        retention_count: u32,
    ) -> Result<(), ServiceError>;

    /// Stop capturing for `node`. Stored history is kept.
    fn dehistorize(&self, node: &NodeId) -> Result<(), ServiceError>;

    /// Read stored history.
    fn read_history(
        &self,
        params: &HistoryReadParameters,
    ) -> Result<Vec<HistoryReadResult>, ServiceError>;

    /// Stop all capture. Called once at server shutdown.
    fn stop(&self);
}

/// The full set of collaborators a server and its sessions dispatch to.
#[derive(Clone)]
pub struct Services {
    /// Attribute read and write
    pub attributes: Arc<dyn AttributeService>,
    /// Browse and path translation
    pub views: Arc<dyn ViewService>,
    /// Node and reference management
    pub nodes: Arc<dyn NodeManagementService>,
    /// Method calls
    pub methods: Arc<dyn MethodService>,
    /// Subscription engine
    pub subscriptions: Arc<dyn SubscriptionService>,
    /// History manager
    pub history: Arc<dyn HistoryManager>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
