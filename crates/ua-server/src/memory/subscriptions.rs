use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use ua_core::{PublishCallback, ServiceError, SubscriptionService, env::Environment};
use ua_proto::{
    AttributeId, DataValue, NodeId, StatusCode,
    services::{
        CreateMonitoredItemsParameters, CreateSubscriptionParameters, CreateSubscriptionResult,
        DeleteMonitoredItemsParameters, ModifyMonitoredItemsParameters, MonitoredItemCreateResult,
        MonitoredItemModifyResult, MonitoredItemNotification, MonitoringMode,
        MonitoringParameters, NotificationData, NotificationMessage, PublishResult,
        RepublishParameters, SubscriptionAcknowledgement,
    },
};

/// Lower bound applied to requested publishing intervals, in milliseconds.
pub const MIN_PUBLISHING_INTERVAL: f64 = 50.0;

/// Lifetime count is revised up to this many keep-alive periods.
const LIFETIME_KEEP_ALIVE_RATIO: u32 = 3;

/// Unacknowledged messages kept per subscription for republish. The oldest
/// is dropped first.
pub const MAX_RETRANSMISSION_QUEUE: usize = 32;

/// Deleted subscription ids remembered by [`MemorySubscriptions::cancelled`].
const MAX_CANCELLED_HISTORY: usize = 1024;

#[derive(Debug)]
struct MonitoredItem {
    node_id: NodeId,
    attribute_id: AttributeId,
    mode: MonitoringMode,
    parameters: MonitoringParameters,
    /// Values waiting for the next publish, at most `queue_size` long.
    queue: VecDeque<DataValue>,
}

impl MonitoredItem {
    fn push(&mut self, value: DataValue) {
        self.queue.push_back(value);
        self.trim();
    }

    /// Drop the oldest values beyond `queue_size`.
    fn trim(&mut self) {
        let capacity = usize::try_from(self.parameters.queue_size).unwrap_or(usize::MAX);
        while self.queue.len() > capacity {
            self.queue.pop_front();
        }
    }
}

struct Subscription {
    callback: PublishCallback,
    publishing_enabled: bool,
    items: BTreeMap<u32, MonitoredItem>,
    /// Sent but unacknowledged messages, by sequence number.
    sent: BTreeMap<u32, NotificationMessage>,
    next_sequence_number: u32,
}

impl Subscription {
    /// Drain every item queue, in monitored item id order.
    fn take_notifications(&mut self) -> Vec<MonitoredItemNotification> {
        let mut notifications = Vec::new();
        for item in self.items.values_mut() {
            let client_handle = item.parameters.client_handle;
            notifications.extend(
                item.queue
                    .drain(..)
                    .map(|value| MonitoredItemNotification { client_handle, value }),
            );
        }
        notifications
    }
}

#[derive(Default)]
struct SubscriptionsInner {
    subscriptions: BTreeMap<u32, Subscription>,
    next_subscription_id: u32,
    next_item_id: u32,
    /// Most recently deleted ids, in deletion order.
    cancelled: VecDeque<u32>,
}

impl SubscriptionsInner {
    fn subscription(&mut self, id: u32) -> Result<&mut Subscription, ServiceError> {
        self.subscriptions.get_mut(&id).ok_or_else(|| {
            ServiceError::new(StatusCode::BAD_SUBSCRIPTION_ID_INVALID, format!("subscription {id}"))
        })
    }
}

/// In-memory subscription engine.
///
/// Value changes arrive through [`MemorySubscriptions::on_write`] and queue
/// a notification for every reporting item on that attribute. Each item
/// holds at most its revised `queue_size` values and discards the oldest.
/// Each `publish` call delivers one message per subscription with queued
/// notifications to that subscription's callback. Keep-alives and lifetime
/// expiry are not modelled.
#[derive(Clone)]
pub struct MemorySubscriptions<E: Environment> {
    env: E,
    inner: Arc<Mutex<SubscriptionsInner>>,
}

impl<E: Environment> MemorySubscriptions<E> {
    /// Empty engine. Subscription ids start at 1.
    pub fn new(env: E) -> Self {
        Self { env, inner: Arc::new(Mutex::new(SubscriptionsInner::default())) }
    }

    /// Queue a data change for every reporting item watching `attribute`
    /// of `node_id`.
    pub fn on_write(&self, node_id: &NodeId, attribute: AttributeId, value: &DataValue) {
        let mut inner = self.lock();
        for subscription in inner.subscriptions.values_mut() {
            subscription
                .items
                .values_mut()
                .filter(|item| item.mode == MonitoringMode::Reporting)
                .filter(|item| item.node_id == *node_id && item.attribute_id == attribute)
                .for_each(|item| item.push(value.clone()));
        }
    }

    /// Most recently deleted ids, in deletion order. Only the last 1024 are
    /// kept.
    pub fn cancelled(&self) -> Vec<u32> {
        self.lock().cancelled.iter().copied().collect()
    }

    /// Whether subscription `id` exists.
    pub fn is_live(&self, id: u32) -> bool {
        self.lock().subscriptions.contains_key(&id)
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Whether no subscription is live.
    pub fn is_empty(&self) -> bool {
        self.lock().subscriptions.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, SubscriptionsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Environment> SubscriptionService for MemorySubscriptions<E> {
    fn create_subscription(
        &self,
        params: &CreateSubscriptionParameters,
        callback: PublishCallback,
    ) -> Result<CreateSubscriptionResult, ServiceError> {
        let mut inner = self.lock();
        let subscription_id = inner.next_subscription_id.checked_add(1).ok_or_else(|| {
            ServiceError::new(StatusCode::BAD_INTERNAL_ERROR, "subscription ids exhausted")
        })?;
        inner.next_subscription_id = subscription_id;

        let keep_alive = params.requested_max_keep_alive_count.max(1);
        let lifetime = params
            .requested_lifetime_count
            .max(keep_alive.saturating_mul(LIFETIME_KEEP_ALIVE_RATIO));
        let interval = if params.requested_publishing_interval.is_finite() {
            params.requested_publishing_interval.max(MIN_PUBLISHING_INTERVAL)
        } else {
            MIN_PUBLISHING_INTERVAL
        };

        inner.subscriptions.insert(subscription_id, Subscription {
            callback,
            publishing_enabled: params.publishing_enabled,
            items: BTreeMap::new(),
            sent: BTreeMap::new(),
            next_sequence_number: 1,
        });
        tracing::debug!(subscription_id, interval, "Created subscription");

        Ok(CreateSubscriptionResult {
            subscription_id,
            revised_publishing_interval: interval,
            revised_lifetime_count: lifetime,
            revised_max_keep_alive_count: keep_alive,
        })
    }

    fn delete_subscriptions(&self, ids: &[u32]) -> Result<Vec<StatusCode>, ServiceError> {
        let mut inner = self.lock();
        Ok(ids
            .iter()
            .map(|id| {
                if inner.subscriptions.remove(id).is_some() {
                    if inner.cancelled.len() == MAX_CANCELLED_HISTORY {
                        inner.cancelled.pop_front();
                    }
                    inner.cancelled.push_back(*id);
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
        let mut inner = self.lock();
        let first_id = inner.next_item_id;
        let subscription = inner.subscription(params.subscription_id)?;

        let mut next_id = first_id;
        let results: Vec<_> = params
            .items_to_create
            .iter()
            .map(|request| {
                next_id += 1;
                let mut parameters = request.requested_parameters.clone();
                parameters.queue_size = parameters.queue_size.max(1);
                parameters.sampling_interval = parameters.sampling_interval.max(0.0);

                let result = MonitoredItemCreateResult {
                    status_code: StatusCode::GOOD,
                    monitored_item_id: next_id,
                    revised_sampling_interval: parameters.sampling_interval,
                    revised_queue_size: parameters.queue_size,
                };
                subscription.items.insert(next_id, MonitoredItem {
                    node_id: request.item_to_monitor.node_id.clone(),
                    attribute_id: request.item_to_monitor.attribute_id,
                    mode: request.monitoring_mode,
                    parameters,
                    queue: VecDeque::new(),
                });
                result
            })
            .collect();

        inner.next_item_id = next_id;
        Ok(results)
    }

    fn modify_monitored_items(
        &self,
        params: &ModifyMonitoredItemsParameters,
    ) -> Result<Vec<MonitoredItemModifyResult>, ServiceError> {
        let mut inner = self.lock();
        let subscription = inner.subscription(params.subscription_id)?;

        Ok(params
            .items_to_modify
            .iter()
            .map(|request| match subscription.items.get_mut(&request.monitored_item_id) {
                Some(item) => {
                    item.parameters = request.requested_parameters.clone();
                    item.parameters.queue_size = item.parameters.queue_size.max(1);
                    item.trim();
                    MonitoredItemModifyResult {
                        status_code: StatusCode::GOOD,
                        revised_sampling_interval: item.parameters.sampling_interval,
                        revised_queue_size: item.parameters.queue_size,
                    }
                },
                None => MonitoredItemModifyResult {
                    status_code: StatusCode::BAD_MONITORED_ITEM_ID_INVALID,
                    ..MonitoredItemModifyResult::default()
                },
            })
            .collect())
    }

    fn delete_monitored_items(
        &self,
        params: &DeleteMonitoredItemsParameters,
    ) -> Result<Vec<StatusCode>, ServiceError> {
        let mut inner = self.lock();
        let subscription = inner.subscription(params.subscription_id)?;

        Ok(params
            .monitored_item_ids
            .iter()
            .map(|id| {
                if subscription.items.remove(id).is_some() {
                    StatusCode::GOOD
                } else {
                    StatusCode::BAD_MONITORED_ITEM_ID_INVALID
                }
            })
            .collect())
    }

    fn republish(&self, params: &RepublishParameters) -> Result<NotificationMessage, ServiceError> {
        let mut inner = self.lock();
        let subscription = inner.subscription(params.subscription_id)?;

        subscription
            .sent
            .get(&params.retransmit_sequence_number)
            .cloned()
            .ok_or_else(|| StatusCode::BAD_MESSAGE_NOT_AVAILABLE.into())
    }

    fn publish(&self, acks: &[SubscriptionAcknowledgement]) -> Result<(), ServiceError> {
        let mut deliveries = Vec::new();

        {
            let mut inner = self.lock();

            let mut ack_results: BTreeMap<u32, Vec<StatusCode>> = BTreeMap::new();
            for ack in acks {
                let status = match inner.subscriptions.get_mut(&ack.subscription_id) {
                    Some(subscription) => {
                        if subscription.sent.remove(&ack.sequence_number).is_some() {
                            StatusCode::GOOD
                        } else {
                            StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN
                        }
                    },
                    None => StatusCode::BAD_SUBSCRIPTION_ID_INVALID,
                };
                ack_results.entry(ack.subscription_id).or_default().push(status);
            }

            let now = self.env.utc_now();
            for (id, subscription) in &mut inner.subscriptions {
                if !subscription.publishing_enabled {
                    continue;
                }
                let notifications = subscription.take_notifications();
                if notifications.is_empty() {
                    continue;
                }

                let sequence_number = subscription.next_sequence_number;
                subscription.next_sequence_number = sequence_number.wrapping_add(1).max(1);
                let message = NotificationMessage {
                    sequence_number,
                    publish_time: Some(now),
                    notification_data: vec![NotificationData::DataChange(notifications)],
                };
                subscription.sent.insert(sequence_number, message.clone());
                while subscription.sent.len() > MAX_RETRANSMISSION_QUEUE {
                    subscription.sent.pop_first();
                }

                let result = PublishResult {
                    subscription_id: *id,
                    available_sequence_numbers: subscription.sent.keys().copied().collect(),
                    more_notifications: false,
                    notification_message: message,
                    results: ack_results.remove(id).unwrap_or_default(),
                };
                deliveries.push((Arc::clone(&subscription.callback), result));
            }
        }

        // Callbacks may call back into the engine.
        for (callback, result) in deliveries {
            callback(result);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ua_core::env::test_utils::MockEnv;
    use ua_proto::services::{MonitoredItemCreateRequest, MonitoredItemModifyRequest, ReadValueId};

    use super::*;

    fn recorder() -> (PublishCallback, Arc<Mutex<Vec<PublishResult>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        (Arc::new(move |result| sink.lock().unwrap().push(result)), received)
    }

    fn watch(
        engine: &MemorySubscriptions<MockEnv>,
        subscription_id: u32,
        node: &NodeId,
        mode: MonitoringMode,
    ) -> u32 {
        let params = CreateMonitoredItemsParameters {
            subscription_id,
            items_to_create: vec![MonitoredItemCreateRequest {
                item_to_monitor: ReadValueId::new(node.clone(), AttributeId::Value),
                monitoring_mode: mode,
                requested_parameters: MonitoringParameters {
                    client_handle: 7,
                    ..MonitoringParameters::default()
                },
            }],
        };
        engine.create_monitored_items(&params).unwrap()[0].monitored_item_id
    }

    #[test]
    fn ids_start_at_one_and_parameters_are_revised() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, _) = recorder();
        let params = CreateSubscriptionParameters {
            requested_publishing_interval: 0.0,
            requested_lifetime_count: 1,
            requested_max_keep_alive_count: 0,
            ..CreateSubscriptionParameters::default()
        };

        let first = engine.create_subscription(&params, Arc::clone(&callback)).unwrap();
        let second = engine.create_subscription(&params, callback).unwrap();

        assert_eq!((first.subscription_id, second.subscription_id), (1, 2));
        let interval = first.revised_publishing_interval;
        assert!((interval - MIN_PUBLISHING_INTERVAL).abs() < f64::EPSILON);
        assert_eq!(first.revised_max_keep_alive_count, 1);
        assert_eq!(first.revised_lifetime_count, 3);
    }

    #[test]
    fn delete_reports_unknown_ids() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, _) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;

        let statuses = engine.delete_subscriptions(&[id, id, 99]).unwrap();

        assert_eq!(statuses, vec![
            StatusCode::GOOD,
            StatusCode::BAD_SUBSCRIPTION_ID_INVALID,
            StatusCode::BAD_SUBSCRIPTION_ID_INVALID
        ]);
        assert_eq!(engine.cancelled(), vec![id]);
        assert!(engine.is_empty());
    }

    #[test]
    fn writes_reach_reporting_items_on_publish() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, received) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let node = NodeId::string(2, "Temperature");
        watch(&engine, id, &node, MonitoringMode::Reporting);
        watch(&engine, id, &node, MonitoringMode::Sampling);

        engine.on_write(&node, AttributeId::Value, &DataValue::new(21.5));
        engine.on_write(&NodeId::string(2, "Other"), AttributeId::Value, &DataValue::new(0.0));
        engine.publish(&[]).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let message = &received[0].notification_message;
        assert_eq!(message.sequence_number, 1);
        assert_eq!(message.notification_data, vec![NotificationData::DataChange(vec![
            MonitoredItemNotification { client_handle: 7, value: DataValue::new(21.5) }
        ])]);
        assert_eq!(received[0].available_sequence_numbers, vec![1]);
    }

    #[test]
    fn queue_of_one_delivers_only_the_latest_value() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, received) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let node = NodeId::string(2, "Pressure");
        watch(&engine, id, &node, MonitoringMode::Reporting);

        for value in 0..100i32 {
            engine.on_write(&node, AttributeId::Value, &DataValue::new(value));
        }
        engine.publish(&[]).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[0].notification_message.notification_data, vec![
            NotificationData::DataChange(vec![MonitoredItemNotification {
                client_handle: 7,
                value: DataValue::new(99i32)
            }])
        ]);
    }

    #[test]
    fn shrinking_the_queue_drops_the_oldest_values() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, received) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let node = NodeId::string(2, "Flow");
        let item = watch(&engine, id, &node, MonitoringMode::Reporting);
        let resize = |queue_size| ModifyMonitoredItemsParameters {
            subscription_id: id,
            items_to_modify: vec![MonitoredItemModifyRequest {
                monitored_item_id: item,
                requested_parameters: MonitoringParameters {
                    client_handle: 7,
                    queue_size,
                    ..MonitoringParameters::default()
                },
            }],
        };
        engine.modify_monitored_items(&resize(4)).unwrap();

        for value in 1..=4i32 {
            engine.on_write(&node, AttributeId::Value, &DataValue::new(value));
        }
        engine.modify_monitored_items(&resize(2)).unwrap();
        engine.publish(&[]).unwrap();

        let received = received.lock().unwrap();
        let expected: Vec<_> = [3i32, 4]
            .into_iter()
            .map(|v| MonitoredItemNotification { client_handle: 7, value: DataValue::new(v) })
            .collect();
        assert_eq!(received[0].notification_message.notification_data, vec![
            NotificationData::DataChange(expected)
        ]);
    }

    #[test]
    fn unacknowledged_messages_are_capped() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, received) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let node = NodeId::string(2, "Speed");
        watch(&engine, id, &node, MonitoringMode::Reporting);

        let rounds = u32::try_from(MAX_RETRANSMISSION_QUEUE).unwrap() + 10;
        for value in 0..rounds {
            engine.on_write(&node, AttributeId::Value, &DataValue::new(value));
            engine.publish(&[]).unwrap();
        }

        let received = received.lock().unwrap();
        let available = &received.last().unwrap().available_sequence_numbers;
        assert_eq!(available.len(), MAX_RETRANSMISSION_QUEUE);
        assert_eq!(available.first(), Some(&11));
        assert_eq!(available.last(), Some(&rounds));
        let dropped = engine
            .republish(&RepublishParameters { subscription_id: id, retransmit_sequence_number: 1 })
            .unwrap_err();
        assert_eq!(dropped.status, StatusCode::BAD_MESSAGE_NOT_AVAILABLE);
    }

    #[test]
    fn acknowledged_messages_leave_the_retransmit_queue() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, received) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let node = NodeId::string(2, "Level");
        watch(&engine, id, &node, MonitoringMode::Reporting);

        engine.on_write(&node, AttributeId::Value, &DataValue::new(1i32));
        engine.publish(&[]).unwrap();
        let republished = engine
            .republish(&RepublishParameters { subscription_id: id, retransmit_sequence_number: 1 })
            .unwrap();
        assert_eq!(republished.sequence_number, 1);

        engine.on_write(&node, AttributeId::Value, &DataValue::new(2i32));
        let acks = [
            SubscriptionAcknowledgement { subscription_id: id, sequence_number: 1 },
            SubscriptionAcknowledgement { subscription_id: id, sequence_number: 9 },
        ];
        engine.publish(&acks).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[1].results, vec![
            StatusCode::GOOD,
            StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN
        ]);
        assert_eq!(received[1].available_sequence_numbers, vec![2]);
        let gone = engine
            .republish(&RepublishParameters { subscription_id: id, retransmit_sequence_number: 1 })
            .unwrap_err();
        assert_eq!(gone.status, StatusCode::BAD_MESSAGE_NOT_AVAILABLE);
    }

    #[test]
    fn monitored_item_operations_check_ids() {
        let engine = MemorySubscriptions::new(MockEnv::with_seed(1));
        let (callback, _) = recorder();
        let id = engine
            .create_subscription(&CreateSubscriptionParameters::default(), callback)
            .unwrap()
            .subscription_id;
        let item = watch(&engine, id, &NodeId::string(2, "X"), MonitoringMode::Reporting);

        let modified = engine
            .modify_monitored_items(&ModifyMonitoredItemsParameters {
                subscription_id: id,
                items_to_modify: vec![
                    MonitoredItemModifyRequest {
                        monitored_item_id: item,
                        requested_parameters: MonitoringParameters {
                            queue_size: 5,
                            ..MonitoringParameters::default()
                        },
                    },
                    MonitoredItemModifyRequest {
                        monitored_item_id: item + 100,
                        ..MonitoredItemModifyRequest::default()
                    },
                ],
            })
            .unwrap();
        assert_eq!(modified[0].revised_queue_size, 5);
        assert_eq!(modified[1].status_code, StatusCode::BAD_MONITORED_ITEM_ID_INVALID);

        let deleted = engine
            .delete_monitored_items(&DeleteMonitoredItemsParameters {
                subscription_id: id,
                monitored_item_ids: vec![item, item],
            })
            .unwrap();
        assert_eq!(deleted, vec![StatusCode::GOOD, StatusCode::BAD_MONITORED_ITEM_ID_INVALID]);

        let missing = engine
            .delete_monitored_items(&DeleteMonitoredItemsParameters {
                subscription_id: 99,
                monitored_item_ids: vec![item],
            })
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::BAD_SUBSCRIPTION_ID_INVALID);
    }
}
