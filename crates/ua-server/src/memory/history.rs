use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::TimeDelta;
use ua_core::{HistoryManager, ServiceError, env::Environment};
use ua_proto::{
    AttributeId, DataValue, NodeId, StatusCode,
    services::{HistoryReadParameters, HistoryReadResult},
};

/// Retention period used when the caller does not choose one.
pub const DEFAULT_RETENTION_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How much history a node keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Values older than this are dropped
    pub period: Duration,
    /// Maximum values kept, 0 for no limit
    pub count: u32,
}

impl Default for Retention {
    /// Seven days, no count limit.
    fn default() -> Self {
        Self { period: DEFAULT_RETENTION_PERIOD, count: 0 }
    }
}

#[derive(Debug)]
struct DataHistory {
    retention: Retention,
    capturing: bool,
    values: VecDeque<DataValue>,
}

#[derive(Debug, Default)]
struct HistoryInner {
    data: HashMap<NodeId, DataHistory>,
    events: HashMap<NodeId, Retention>,
    stopped: bool,
}

/// In-memory history store.
///
/// Captures `Value` writes of historized variables, stamped with the
/// environment clock, and trims them by count and by age on every insert.
/// Event sources are recorded but no event history is stored.
#[derive(Clone)]
pub struct MemoryHistory<E: Environment> {
    env: E,
    inner: Arc<Mutex<HistoryInner>>,
}

impl<E: Environment> MemoryHistory<E> {
    /// Empty store.
    pub fn new(env: E) -> Self {
        Self { env, inner: Arc::new(Mutex::new(HistoryInner::default())) }
    }

    /// Record a write if `node_id` is historized.
    pub fn on_write(&self, node_id: &NodeId, attribute: AttributeId, value: &DataValue) {
        if attribute != AttributeId::Value {
            return;
        }

        let now = self.env.utc_now();
        let mut inner = self.lock();
        if inner.stopped {
            return;
        }
        let Some(history) = inner.data.get_mut(node_id) else {
            return;
        };
        if !history.capturing {
            return;
        }

        let mut entry = value.clone();
        entry.server_timestamp = Some(now);
        history.values.push_back(entry);

        let limit = history.retention.count as usize;
        while limit > 0 && history.values.len() > limit {
            history.values.pop_front();
        }
        if let Ok(period) = TimeDelta::from_std(history.retention.period) {
            let horizon = now - period;
            while history
                .values
                .front()
                .and_then(|v| v.server_timestamp)
                .is_some_and(|t| t < horizon)
            {
                history.values.pop_front();
            }
        }
    }

    /// Whether value changes of `node_id` are being captured.
    pub fn is_historizing(&self, node_id: &NodeId) -> bool {
        self.lock().data.get(node_id).is_some_and(|h| h.capturing)
    }

    /// Retention of `node_id`'s data history, if it ever had one.
    pub fn retention(&self, node_id: &NodeId) -> Option<Retention> {
        self.lock().data.get(node_id).map(|h| h.retention)
    }

    /// Whether `node_id` is registered as an event source.
    pub fn is_event_source(&self, node_id: &NodeId) -> bool {
        self.lock().events.contains_key(node_id)
    }

    /// Whether [`HistoryManager::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Environment> HistoryManager for MemoryHistory<E> {
    fn historize_data_change(
        &self,
        node: &NodeId,
        retention_period: Duration,
        retention_count: u32,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        if inner.stopped {
            return Err(ServiceError::new(StatusCode::BAD_INTERNAL_ERROR, "history stopped"));
        }

        let retention = Retention { period: retention_period, count: retention_count };
        let history = inner.data.entry(node.clone()).or_insert_with(|| DataHistory {
            retention,
            capturing: true,
            values: VecDeque::new(),
        });
        history.retention = retention;
        history.capturing = true;

        tracing::debug!(%node, ?retention_period, retention_count, "Historizing data changes");
        Ok(())
    }

    fn historize_event(
        &self,
        source: &NodeId,
        retention_period: Duration,
        retention_count: u32,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        if inner.stopped {
            return Err(ServiceError::new(StatusCode::BAD_INTERNAL_ERROR, "history stopped"));
        }

        inner
            .events
            .insert(source.clone(), Retention { period: retention_period, count: retention_count });
        tracing::debug!(%source, "Historizing events");
        Ok(())
    }

    fn dehistorize(&self, node: &NodeId) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        if let Some(history) = inner.data.get_mut(node) {
            history.capturing = false;
        }
        inner.events.remove(node);
        Ok(())
    }

    fn read_history(
        &self,
        params: &HistoryReadParameters,
    ) -> Result<Vec<HistoryReadResult>, ServiceError> {
        let inner = self.lock();
        let limit = match params.num_values_per_node {
            0 => usize::MAX,
            n => n as usize,
        };

        Ok(params
            .nodes_to_read
            .iter()
            .map(|request| {
                let Some(history) = inner.data.get(&request.node_id) else {
                    return HistoryReadResult {
                        status_code: StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED,
                        ..HistoryReadResult::default()
                    };
                };

                let data_values = history
                    .values
                    .iter()
                    .filter(|v| {
                        let Some(t) = v.server_timestamp else { return false };
                        params.start_time.is_none_or(|start| t >= start)
                            && params.end_time.is_none_or(|end| t <= end)
                    })
                    .take(limit)
                    .cloned()
                    .collect();

                HistoryReadResult {
                    status_code: StatusCode::GOOD,
                    data_values,
                    ..HistoryReadResult::default()
                }
            })
            .collect())
    }

    fn stop(&self) {
        let mut inner = self.lock();
        inner.stopped = true;
        for history in inner.data.values_mut() {
            history.capturing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use ua_core::env::test_utils::MockEnv;
    use ua_proto::{Variant, services::HistoryReadValueId};

    use super::*;

    const WEEK: Duration = DEFAULT_RETENTION_PERIOD;

    fn read_values(history: &MemoryHistory<MockEnv>, node: &NodeId) -> Vec<Variant> {
        let params = HistoryReadParameters {
            nodes_to_read: vec![HistoryReadValueId {
                node_id: node.clone(),
                continuation_point: bytes::Bytes::new(),
            }],
            ..HistoryReadParameters::default()
        };
        let result = history.read_history(&params).unwrap().remove(0);
        result.data_values.into_iter().map(|v| v.value).collect()
    }

    #[test]
    fn captures_value_writes_only_while_historizing() {
        let history = MemoryHistory::new(MockEnv::with_seed(1));
        let node = NodeId::string(2, "Flow");

        history.on_write(&node, AttributeId::Value, &DataValue::new(1i32));
        history.historize_data_change(&node, WEEK, 0).unwrap();
        history.on_write(&node, AttributeId::Value, &DataValue::new(2i32));
        history.on_write(&node, AttributeId::Description, &DataValue::new("ignored"));
        history.dehistorize(&node).unwrap();
        history.on_write(&node, AttributeId::Value, &DataValue::new(3i32));

        assert_eq!(read_values(&history, &node), vec![Variant::Int32(2)]);
        assert!(!history.is_historizing(&node));
    }

    #[test]
    fn retention_count_keeps_newest() {
        let history = MemoryHistory::new(MockEnv::with_seed(1));
        let node = NodeId::string(2, "Flow");
        history.historize_data_change(&node, WEEK, 2).unwrap();

        for v in 0..5i32 {
            history.on_write(&node, AttributeId::Value, &DataValue::new(v));
        }

        assert_eq!(read_values(&history, &node), vec![Variant::Int32(3), Variant::Int32(4)]);
    }

    #[test]
    fn retention_period_drops_old_values() {
        let env = MockEnv::with_seed(1);
        let history = MemoryHistory::new(env.clone());
        let node = NodeId::string(2, "Flow");
        history.historize_data_change(&node, Duration::from_secs(60), 0).unwrap();

        history.on_write(&node, AttributeId::Value, &DataValue::new(1i32));
        env.advance(TimeDelta::seconds(61));
        history.on_write(&node, AttributeId::Value, &DataValue::new(2i32));

        assert_eq!(read_values(&history, &node).len(), 1);
    }

    #[test]
    fn read_filters_by_interval_and_count() {
        let env = MockEnv::with_seed(1);
        let history = MemoryHistory::new(env.clone());
        let node = NodeId::string(2, "Flow");
        history.historize_data_change(&node, WEEK, 0).unwrap();

        let start = env.utc_now();
        for v in 0..4i32 {
            history.on_write(&node, AttributeId::Value, &DataValue::new(v));
            env.advance(TimeDelta::seconds(1));
        }

        let params = HistoryReadParameters {
            start_time: Some(start + TimeDelta::seconds(1)),
            end_time: None,
            num_values_per_node: 2,
            nodes_to_read: vec![
                HistoryReadValueId {
                    node_id: node,
                    continuation_point: bytes::Bytes::new(),
                },
                HistoryReadValueId {
                    node_id: NodeId::string(2, "Unknown"),
                    continuation_point: bytes::Bytes::new(),
                },
            ],
        };
        let results = history.read_history(&params).unwrap();

        let values: Vec<_> = results[0].data_values.iter().map(|v| v.value.clone()).collect();
        assert_eq!(values, vec![Variant::Int32(1), Variant::Int32(2)]);
        assert_eq!(results[1].status_code, StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);
    }

    #[test]
    fn stop_ends_capture_and_rejects_new_nodes() {
        let history = MemoryHistory::new(MockEnv::with_seed(1));
        let node = NodeId::string(2, "Flow");
        history.historize_data_change(&node, WEEK, 0).unwrap();

        history.stop();
        history.on_write(&node, AttributeId::Value, &DataValue::new(1i32));

        assert!(history.is_stopped());
        assert!(read_values(&history, &node).is_empty());
        let err = history.historize_event(&node, WEEK, 0).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_INTERNAL_ERROR);
    }
}
