//! Attribute ids, node classes, and well-known bit masks and node ids.

use serde::{Deserialize, Serialize};

/// Node attributes addressable by read/write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum AttributeId {
    /// `NodeId`
    NodeId = 1,
    /// `NodeClass`
    NodeClass = 2,
    /// `BrowseName`
    BrowseName = 3,
    /// `DisplayName`
    DisplayName = 4,
    /// `Description`
    Description = 5,
    /// `WriteMask`
    WriteMask = 6,
    /// `UserWriteMask`
    UserWriteMask = 7,
    /// `IsAbstract`
    IsAbstract = 8,
    /// `Symmetric`
    Symmetric = 9,
    /// `InverseName`
    InverseName = 10,
    /// `ContainsNoLoops`
    ContainsNoLoops = 11,
    /// `EventNotifier`
    EventNotifier = 12,
    /// `Value`
    Value = 13,
    /// `DataType`
    DataType = 14,
    /// `ValueRank`
    ValueRank = 15,
    /// `ArrayDimensions`
    ArrayDimensions = 16,
    /// `AccessLevel`
    AccessLevel = 17,
    /// `UserAccessLevel`
    UserAccessLevel = 18,
    /// `MinimumSamplingInterval`
    MinimumSamplingInterval = 19,
    /// `Historizing`
    Historizing = 20,
    /// `Executable`
    Executable = 21,
    /// `UserExecutable`
    UserExecutable = 22,
}

/// Class of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum NodeClass {
    /// Unspecified
    #[default]
    Unspecified = 0,
    /// Object
    Object = 1,
    /// Variable
    Variable = 2,
    /// Method
    Method = 4,
    /// Object type
    ObjectType = 8,
    /// Variable type
    VariableType = 16,
    /// Reference type
    ReferenceType = 32,
    /// Data type
    DataType = 64,
    /// View
    View = 128,
}

/// Bits of the `AccessLevel` and `UserAccessLevel` attributes.
pub mod access_level {
    /// Current value can be read
    pub const CURRENT_READ: u8 = 1 << 0;
    /// Current value can be written
    pub const CURRENT_WRITE: u8 = 1 << 1;
    /// History can be read
    pub const HISTORY_READ: u8 = 1 << 2;
    /// History can be updated
    pub const HISTORY_WRITE: u8 = 1 << 3;
}

/// Bits of the `EventNotifier` attribute.
pub mod event_notifier {
    /// Node emits events that can be subscribed to
    pub const SUBSCRIBE_TO_EVENTS: u8 = 1 << 0;
    /// Event history can be read
    pub const HISTORY_READ: u8 = 1 << 2;
    /// Event history can be updated
    pub const HISTORY_WRITE: u8 = 1 << 3;
}

/// Well-known numeric node ids in namespace 0.
pub mod object_ids {
    /// `ObjectsFolder`
    pub const OBJECTS_FOLDER: u32 = 85;
    /// `HasComponent` reference type
    pub const HAS_COMPONENT: u32 = 47;
    /// `HasProperty` reference type
    pub const HAS_PROPERTY: u32 = 46;
    /// `Organizes` reference type
    pub const ORGANIZES: u32 = 35;
    /// `HasTypeDefinition` reference type
    pub const HAS_TYPE_DEFINITION: u32 = 40;
    /// `FolderType`
    pub const FOLDER_TYPE: u32 = 61;
    /// `BaseDataVariableType`
    pub const BASE_DATA_VARIABLE_TYPE: u32 = 63;
    /// `Server` object
    pub const SERVER: u32 = 2253;
    /// `Server_NamespaceArray`
    pub const SERVER_NAMESPACE_ARRAY: u32 = 2255;
    /// `Server_ServerStatus`
    pub const SERVER_SERVER_STATUS: u32 = 2256;
    /// `Server_ServerStatus_StartTime`
    pub const SERVER_SERVER_STATUS_START_TIME: u32 = 2257;
    /// `Server_ServerStatus_CurrentTime`
    pub const SERVER_SERVER_STATUS_CURRENT_TIME: u32 = 2258;
    /// `Server_ServerStatus_State`
    pub const SERVER_SERVER_STATUS_STATE: u32 = 2259;
}
