//! View service set: `Browse`, `TranslateBrowsePathsToNodeIds`.

use serde::{Deserialize, Serialize};

use crate::{LocalizedText, NodeClass, NodeId, QualifiedName, StatusCode};

/// Which references to follow when browsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowseDirection {
    /// Forward references only
    #[default]
    Forward,
    /// Inverse references only
    Inverse,
    /// Both directions
    Both,
}

/// One node to browse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseDescription {
    /// Node to browse from
    pub node_id: NodeId,
    /// Direction of references to return
    pub browse_direction: BrowseDirection,
    /// Reference type filter, `None` for all types
    pub reference_type_id: Option<NodeId>,
    /// Whether subtypes of the reference type match
    pub include_subtypes: bool,
}

/// A reference returned by browse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescription {
    /// Reference type
    pub reference_type_id: NodeId,
    /// Whether the reference is forward from the browsed node
    pub is_forward: bool,
    /// The node at the other end
    pub node_id: NodeId,
    /// Browse name of the target
    pub browse_name: QualifiedName,
    /// Display name of the target
    pub display_name: LocalizedText,
    /// Class of the target
    pub node_class: NodeClass,
}

/// Browse result for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseResult {
    /// Outcome for this node
    pub status_code: StatusCode,
    /// References found
    pub references: Vec<ReferenceDescription>,
}

/// One hop of a relative browse path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePathElement {
    /// Reference type to follow, `None` for any
    pub reference_type_id: Option<NodeId>,
    /// Follow the reference in the inverse direction
    pub is_inverse: bool,
    /// Browse name the target must have
    pub target_name: QualifiedName,
}

/// A start node and a relative path from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsePath {
    /// Node the path starts at
    pub starting_node: NodeId,
    /// Hops to follow
    pub relative_path: Vec<RelativePathElement>,
}

/// A node a browse path resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsePathTarget {
    /// Resolved node
    pub target_id: NodeId,
    /// Index of the first unprocessed path element, `u32::MAX` if complete
    pub remaining_path_index: u32,
}

/// Result of translating one browse path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsePathResult {
    /// Outcome for this path
    pub status_code: StatusCode,
    /// Matching targets
    pub targets: Vec<BrowsePathTarget>,
}
