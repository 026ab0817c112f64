//! Subscription and monitored item service sets, plus `Publish`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DataValue, StatusCode, Variant, services::ReadValueId};

/// `CreateSubscription` request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionParameters {
    /// Requested publishing interval in milliseconds
    pub requested_publishing_interval: f64,
    /// Requested lifetime in publishing intervals
    pub requested_lifetime_count: u32,
    /// Requested keep-alive count in publishing intervals
    pub requested_max_keep_alive_count: u32,
    /// Notification limit per publish, 0 for no limit
    pub max_notifications_per_publish: u32,
    /// Whether publishing starts enabled
    pub publishing_enabled: bool,
    /// Relative priority
    pub priority: u8,
}

impl Default for CreateSubscriptionParameters {
    fn default() -> Self {
        Self {
            requested_publishing_interval: 1000.0,
            requested_lifetime_count: 3000,
            requested_max_keep_alive_count: 10,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }
}

/// `CreateSubscription` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionResult {
    /// Server-assigned subscription id
    pub subscription_id: u32,
    /// Publishing interval applied, in milliseconds
    pub revised_publishing_interval: f64,
    /// Lifetime count applied
    pub revised_lifetime_count: u32,
    /// Keep-alive count applied
    pub revised_max_keep_alive_count: u32,
}

/// Whether a monitored item samples and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitoringMode {
    /// Neither sampling nor reporting
    Disabled,
    /// Sampling without reporting
    Sampling,
    /// Sampling and reporting
    #[default]
    Reporting,
}

/// Sampling parameters of a monitored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    /// Client-chosen handle echoed in notifications
    pub client_handle: u32,
    /// Sampling interval in milliseconds
    pub sampling_interval: f64,
    /// Queue size
    pub queue_size: u32,
    /// Discard the oldest value when the queue overflows
    pub discard_oldest: bool,
}

/// One monitored item to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateRequest {
    /// Attribute to monitor
    pub item_to_monitor: ReadValueId,
    /// Initial monitoring mode
    pub monitoring_mode: MonitoringMode,
    /// Requested sampling parameters
    pub requested_parameters: MonitoringParameters,
}

/// `CreateMonitoredItems` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMonitoredItemsParameters {
    /// Subscription that owns the items
    pub subscription_id: u32,
    /// Items to create
    pub items_to_create: Vec<MonitoredItemCreateRequest>,
}

/// Result of creating one monitored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateResult {
    /// Outcome
    pub status_code: StatusCode,
    /// Server-assigned item id
    pub monitored_item_id: u32,
    /// Sampling interval applied
    pub revised_sampling_interval: f64,
    /// Queue size applied
    pub revised_queue_size: u32,
}

/// One monitored item to modify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemModifyRequest {
    /// Item to modify
    pub monitored_item_id: u32,
    /// New sampling parameters
    pub requested_parameters: MonitoringParameters,
}

/// `ModifyMonitoredItems` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifyMonitoredItemsParameters {
    /// Subscription that owns the items
    pub subscription_id: u32,
    /// Items to modify
    pub items_to_modify: Vec<MonitoredItemModifyRequest>,
}

/// Result of modifying one monitored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemModifyResult {
    /// Outcome
    pub status_code: StatusCode,
    /// Sampling interval applied
    pub revised_sampling_interval: f64,
    /// Queue size applied
    pub revised_queue_size: u32,
}

/// `DeleteMonitoredItems` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMonitoredItemsParameters {
    /// Subscription that owns the items
    pub subscription_id: u32,
    /// Items to delete
    pub monitored_item_ids: Vec<u32>,
}

/// `Republish` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepublishParameters {
    /// Subscription to republish from
    pub subscription_id: u32,
    /// Sequence number of the message to resend
    pub retransmit_sequence_number: u32,
}

/// Acknowledges receipt of a notification message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionAcknowledgement {
    /// Subscription the message came from
    pub subscription_id: u32,
    /// Sequence number being acknowledged
    pub sequence_number: u32,
}

/// A changed value of one monitored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemNotification {
    /// Client handle of the item
    pub client_handle: u32,
    /// New value
    pub value: DataValue,
}

/// Payload of a notification message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationData {
    /// Data changes
    DataChange(Vec<MonitoredItemNotification>),
    /// Event field lists, one per event
    Events(Vec<Vec<Variant>>),
}

/// A numbered batch of notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Sequence number within the subscription
    pub sequence_number: u32,
    /// When the message was produced
    pub publish_time: Option<DateTime<Utc>>,
    /// Notifications, empty for keep-alives
    pub notification_data: Vec<NotificationData>,
}

/// Delivered to the publish callback of a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    /// Subscription the message belongs to
    pub subscription_id: u32,
    /// Sequence numbers still available for republish
    pub available_sequence_numbers: Vec<u32>,
    /// Whether more notifications are queued
    pub more_notifications: bool,
    /// The message
    pub notification_message: NotificationMessage,
    /// Results of the acknowledgements carried by the publish request
    pub results: Vec<StatusCode>,
}
