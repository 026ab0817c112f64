//! Node identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric identifier (`i=`)
    Numeric(u32),
    /// String identifier (`s=`)
    String(String),
    /// GUID identifier (`g=`), raw 16 bytes
    Guid([u8; 16]),
    /// Opaque identifier (`b=`)
    Opaque(Vec<u8>),
}

/// Identifies a node in the address space (or a session / token).
///
/// Display follows the OPC-UA string form: `i=2258` in namespace 0,
/// `ns=2;s=Boiler` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index
    pub namespace: u16,
    /// Identifier within the namespace
    pub identifier: Identifier,
}

impl NodeId {
    /// Numeric node id.
    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self { namespace, identifier: Identifier::Numeric(value) }
    }

    /// String node id.
    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self { namespace, identifier: Identifier::String(value.into()) }
    }

    /// The null node id (`i=0`).
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Whether this is the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// Numeric value if this is a numeric id.
    pub fn as_u32(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self::numeric(0, value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(s) => write!(f, "s={s}"),
            Identifier::Guid(g) => {
                write!(f, "g=")?;
                for (i, b) in g.iter().enumerate() {
                    if matches!(i, 4 | 6 | 8 | 10) {
                        write!(f, "-")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            },
            Identifier::Opaque(bytes) => {
                write!(f, "b=")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            },
        }
    }
}
