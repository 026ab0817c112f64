//! Node management service set: add/delete nodes and references.

use serde::{Deserialize, Serialize};

use crate::{LocalizedText, NodeClass, NodeId, QualifiedName, StatusCode, Variant};

/// One node to add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddNodesItem {
    /// Parent of the new node
    pub parent_node_id: NodeId,
    /// Reference type from the parent to the new node
    pub reference_type_id: NodeId,
    /// Requested id of the new node
    pub requested_new_node_id: NodeId,
    /// Browse name
    pub browse_name: QualifiedName,
    /// Node class
    pub node_class: NodeClass,
    /// Display name
    pub display_name: LocalizedText,
    /// Initial value for variables
    pub value: Option<Variant>,
    /// Type definition, `None` for the default of the class
    pub type_definition: Option<NodeId>,
}

/// Result of adding one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNodesResult {
    /// Outcome
    pub status_code: StatusCode,
    /// Id of the new node, null on failure
    pub added_node_id: NodeId,
}

/// One node to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNodesItem {
    /// Node to delete
    pub node_id: NodeId,
    /// Also delete references pointing at this node
    pub delete_target_references: bool,
}

/// One reference to add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReferencesItem {
    /// Source node
    pub source_node_id: NodeId,
    /// Reference type
    pub reference_type_id: NodeId,
    /// Direction of the reference from the source
    pub is_forward: bool,
    /// Target node
    pub target_node_id: NodeId,
    /// Class of the target
    pub target_node_class: NodeClass,
}

/// One reference to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReferencesItem {
    /// Source node
    pub source_node_id: NodeId,
    /// Reference type
    pub reference_type_id: NodeId,
    /// Direction of the reference from the source
    pub is_forward: bool,
    /// Target node
    pub target_node_id: NodeId,
    /// Also delete the opposite reference
    pub delete_bidirectional: bool,
}
