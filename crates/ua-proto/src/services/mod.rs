//! Parameter and result types of the services a session dispatches.
//!
//! Grouped by OPC-UA service set. Each request carries only the fields the
//! session core or its collaborators look at; request headers and
//! diagnostics belong to the transport layer.

pub mod attribute;
pub mod method;
pub mod node_management;
pub mod session;
pub mod subscription;
pub mod view;

pub use attribute::{
    HistoryReadParameters, HistoryReadResult, HistoryReadValueId, ReadParameters, ReadValueId,
    WriteParameters, WriteValue,
};
pub use method::{CallMethodRequest, CallMethodResult};
pub use node_management::{
    AddNodesItem, AddNodesResult, AddReferencesItem, DeleteNodesItem, DeleteReferencesItem,
};
pub use session::{
    ActivateSessionParameters, ActivateSessionResult, CreateSessionParameters,
    CreateSessionResult, SignedSoftwareCertificate, UserIdentityToken,
};
pub use subscription::{
    CreateMonitoredItemsParameters, CreateSubscriptionParameters, CreateSubscriptionResult,
    DeleteMonitoredItemsParameters, ModifyMonitoredItemsParameters, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemModifyRequest, MonitoredItemModifyResult,
    MonitoredItemNotification, MonitoringMode, MonitoringParameters, NotificationData,
    NotificationMessage, PublishResult, RepublishParameters, SubscriptionAcknowledgement,
};
pub use view::{
    BrowseDescription, BrowseDirection, BrowsePath, BrowsePathResult, BrowsePathTarget,
    BrowseResult, ReferenceDescription, RelativePathElement,
};
