//! OPC-UA status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-bit OPC-UA status code.
///
/// The top two bits carry severity: `00` good, `01` uncertain, `10` bad.
/// Only the codes this server produces are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(u32);

impl StatusCode {
    /// Operation succeeded
    pub const GOOD: Self = Self(0);
    /// Unexpected internal error
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    /// Nothing to do (empty request)
    pub const BAD_NOTHING_TO_DO: Self = Self(0x800F_0000);
    /// User lacks permission for the operation
    pub const BAD_USER_ACCESS_DENIED: Self = Self(0x801F_0000);
    /// Session id is not valid (also used for activation in the wrong state)
    pub const BAD_SESSION_ID_INVALID: Self = Self(0x8025_0000);
    /// Session was closed
    pub const BAD_SESSION_CLOSED: Self = Self(0x8026_0000);
    /// Subscription id is not valid
    pub const BAD_SUBSCRIPTION_ID_INVALID: Self = Self(0x8028_0000);
    /// Node id does not exist in the address space
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// Attribute is not supported by the node
    pub const BAD_ATTRIBUTE_ID_INVALID: Self = Self(0x8035_0000);
    /// Attribute is not writable
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    /// Monitored item id is not valid
    pub const BAD_MONITORED_ITEM_ID_INVALID: Self = Self(0x8042_0000);
    /// Parent node id does not exist
    pub const BAD_PARENT_NODE_ID_INVALID: Self = Self(0x805B_0000);
    /// Requested node id is already in use
    pub const BAD_NODE_ID_EXISTS: Self = Self(0x805E_0000);
    /// Source node id of a reference does not exist
    pub const BAD_SOURCE_NODE_ID_INVALID: Self = Self(0x8064_0000);
    /// Target node id of a reference does not exist
    pub const BAD_TARGET_NODE_ID_INVALID: Self = Self(0x8065_0000);
    /// Browse path matched nothing
    pub const BAD_NO_MATCH: Self = Self(0x806F_0000);
    /// History operation not supported for the node
    pub const BAD_HISTORY_OPERATION_UNSUPPORTED: Self = Self(0x8072_0000);
    /// Acknowledged sequence number is unknown
    pub const BAD_SEQUENCE_NUMBER_UNKNOWN: Self = Self(0x807A_0000);
    /// Requested message is no longer available for republish
    pub const BAD_MESSAGE_NOT_AVAILABLE: Self = Self(0x807B_0000);
    /// Value has the wrong data type
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// Method id does not refer to a callable method
    pub const BAD_METHOD_INVALID: Self = Self(0x8075_0000);

    /// Wrap a raw code.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw 32-bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Severity is good.
    pub const fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Severity is bad.
    pub const fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Symbolic name for the named codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::GOOD => "Good",
            Self::BAD_INTERNAL_ERROR => "BadInternalError",
            Self::BAD_NOTHING_TO_DO => "BadNothingToDo",
            Self::BAD_USER_ACCESS_DENIED => "BadUserAccessDenied",
            Self::BAD_SESSION_ID_INVALID => "BadSessionIdInvalid",
            Self::BAD_SESSION_CLOSED => "BadSessionClosed",
            Self::BAD_SUBSCRIPTION_ID_INVALID => "BadSubscriptionIdInvalid",
            Self::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            Self::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid",
            Self::BAD_NOT_WRITABLE => "BadNotWritable",
            Self::BAD_MONITORED_ITEM_ID_INVALID => "BadMonitoredItemIdInvalid",
            Self::BAD_PARENT_NODE_ID_INVALID => "BadParentNodeIdInvalid",
            Self::BAD_NODE_ID_EXISTS => "BadNodeIdExists",
            Self::BAD_SOURCE_NODE_ID_INVALID => "BadSourceNodeIdInvalid",
            Self::BAD_TARGET_NODE_ID_INVALID => "BadTargetNodeIdInvalid",
            Self::BAD_NO_MATCH => "BadNoMatch",
            Self::BAD_HISTORY_OPERATION_UNSUPPORTED => "BadHistoryOperationUnsupported",
            Self::BAD_SEQUENCE_NUMBER_UNKNOWN => "BadSequenceNumberUnknown",
            Self::BAD_MESSAGE_NOT_AVAILABLE => "BadMessageNotAvailable",
            Self::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            Self::BAD_METHOD_INVALID => "BadMethodInvalid",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
