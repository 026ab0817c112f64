//! Attribute values.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NodeId, StatusCode};

/// Human-readable text with an optional locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Locale id (e.g. `en-US`), empty when unspecified
    pub locale: String,
    /// The text
    pub text: String,
}

impl LocalizedText {
    /// Text without a locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self { locale: String::new(), text: text.into() }
    }
}

/// Namespace-qualified browse name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index of the name
    pub namespace_index: u16,
    /// Name within the namespace
    pub name: String,
}

impl QualifiedName {
    /// Qualified name in the given namespace.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self { namespace_index, name: name.into() }
    }
}

/// A dynamically typed attribute value.
///
/// `ByteString` holds a [`Bytes`] buffer, so clones share the allocation.
/// Use [`Variant::detached`] to get a value that shares nothing with its
/// source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    /// No value
    #[default]
    Empty,
    /// Boolean
    Boolean(bool),
    /// Unsigned 8-bit integer (access levels, event notifier)
    Byte(u8),
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Signed 64-bit integer
    Int64(i64),
    /// IEEE double
    Double(f64),
    /// UTF-8 string
    String(String),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Raw bytes
    ByteString(Bytes),
    /// Node id
    NodeId(NodeId),
    /// Localized text
    LocalizedText(LocalizedText),
    /// One-dimensional array
    Array(Vec<Variant>),
}

impl Variant {
    /// Boolean value, if this is a `Boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Non-negative integer value widened to `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Byte(v) => Some(u32::from(*v)),
            Self::UInt32(v) => Some(*v),
            Self::Int32(v) => u32::try_from(*v).ok(),
            Self::Int64(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Timestamp, if this is a `DateTime`.
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Deep copy that shares no buffer with `self`.
    ///
    /// `Clone` on a `ByteString` only bumps a reference count; this
    /// reallocates it (recursively through arrays).
    #[must_use]
    pub fn detached(&self) -> Self {
        match self {
            Self::ByteString(bytes) => Self::ByteString(Bytes::copy_from_slice(bytes)),
            Self::Array(items) => Self::Array(items.iter().map(Self::detached).collect()),
            other => other.clone(),
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<u8> for Variant {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for Variant {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Bytes> for Variant {
    fn from(v: Bytes) -> Self {
        Self::ByteString(v)
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Self::NodeId(v)
    }
}

impl From<LocalizedText> for Variant {
    fn from(v: LocalizedText) -> Self {
        Self::LocalizedText(v)
    }
}

impl From<Vec<String>> for Variant {
    fn from(v: Vec<String>) -> Self {
        Self::Array(v.into_iter().map(Self::String).collect())
    }
}

/// A value with quality and timestamps, as read from or written to an
/// attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    /// The value
    pub value: Variant,
    /// Quality of the value
    pub status: StatusCode,
    /// When the source produced the value
    pub source_timestamp: Option<DateTime<Utc>>,
    /// When the server received the value
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Good-quality value without timestamps.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self { value: value.into(), ..Self::default() }
    }

    /// Value-less result carrying a bad status.
    pub fn bad(status: StatusCode) -> Self {
        Self { status, ..Self::default() }
    }

    /// Deep copy that shares no buffer with `self`.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            value: self.value.detached(),
            status: self.status,
            source_timestamp: self.source_timestamp,
            server_timestamp: self.server_timestamp,
        }
    }
}

impl From<Variant> for DataValue {
    fn from(value: Variant) -> Self {
        Self { value, ..Self::default() }
    }
}
