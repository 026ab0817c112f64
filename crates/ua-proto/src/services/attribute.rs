//! Attribute service set: `Read`, `Write`, `HistoryRead`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AttributeId, DataValue, NodeId, StatusCode};

/// Identifies one attribute to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadValueId {
    /// Node to read
    pub node_id: NodeId,
    /// Attribute to read
    pub attribute_id: AttributeId,
    /// Optional numeric range for array values
    pub index_range: Option<String>,
}

impl ReadValueId {
    /// Read of a whole attribute.
    pub fn new(node_id: NodeId, attribute_id: AttributeId) -> Self {
        Self { node_id, attribute_id, index_range: None }
    }
}

/// `Read` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadParameters {
    /// Maximum acceptable age of cached values in milliseconds
    pub max_age: f64,
    /// Attributes to read
    pub nodes_to_read: Vec<ReadValueId>,
}

/// One attribute write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteValue {
    /// Node to write
    pub node_id: NodeId,
    /// Attribute to write
    pub attribute_id: AttributeId,
    /// Optional numeric range for array values
    pub index_range: Option<String>,
    /// Value to store
    pub value: DataValue,
}

impl WriteValue {
    /// Write of a whole attribute.
    pub fn new(node_id: NodeId, attribute_id: AttributeId, value: DataValue) -> Self {
        Self { node_id, attribute_id, index_range: None, value }
    }

    /// Deep copy that shares no buffer with `self`.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            node_id: self.node_id.clone(),
            attribute_id: self.attribute_id,
            index_range: self.index_range.clone(),
            value: self.value.detached(),
        }
    }
}

/// `Write` request parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteParameters {
    /// Attributes to write
    pub nodes_to_write: Vec<WriteValue>,
}

/// One node to read history for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReadValueId {
    /// Node (variable or event source)
    pub node_id: NodeId,
    /// Continuation point from a previous call, empty for a fresh read
    pub continuation_point: Bytes,
}

/// `HistoryRead` request parameters (raw-modified details).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReadParameters {
    /// Start of the interval, open if `None`
    pub start_time: Option<DateTime<Utc>>,
    /// End of the interval, open if `None`
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum values per node, 0 for no limit
    pub num_values_per_node: u32,
    /// Nodes to read
    pub nodes_to_read: Vec<HistoryReadValueId>,
}

/// History of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReadResult {
    /// Outcome for this node
    pub status_code: StatusCode,
    /// Continuation point if more values remain
    pub continuation_point: Bytes,
    /// Historical values
    pub data_values: Vec<DataValue>,
}
