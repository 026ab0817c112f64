//! Copy rule between a session's caller and the shared address space.
//!
//! Values held by the address space share their byte buffers with any clone.
//! A caller in the same process that received such a clone could observe, or
//! through interior buffers alias, live server state without going through
//! the write path and its change notifications. Internal sessions therefore
//! detach values at the boundary: read results on the way out, write values
//! on the way in. External sessions carry values that were just decoded
//! from the wire and share nothing with the store, so they cross unchanged.
//!
//! The session applies [`SessionOrigin::cross`] exactly once per direction.

use ua_proto::{DataValue, services::WriteValue};

/// A value that can be copied so it shares no buffer with its source.
pub trait Detach {
    /// Deep copy that shares no allocation with `self`.
    #[must_use]
    fn detach(&self) -> Self;
}

impl Detach for DataValue {
    fn detach(&self) -> Self {
        self.detached()
    }
}

impl Detach for WriteValue {
    fn detach(&self) -> Self {
        self.detached()
    }
}

/// Where a session's caller lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOrigin {
    /// Same process as the server, sharing memory with the address space
    Internal,
    /// Remote client across the transport boundary
    External,
}

impl SessionOrigin {
    /// Origin from the transport layer's `external` flag.
    pub fn from_external(external: bool) -> Self {
        if external { Self::External } else { Self::Internal }
    }

    /// Whether the caller is a remote client.
    pub fn is_external(self) -> bool {
        matches!(self, Self::External)
    }

    /// Move `values` across the session boundary.
    ///
    /// Internal callers get detached copies; external values pass through.
    pub fn cross<T: Detach>(self, values: Vec<T>) -> Vec<T> {
        match self {
            Self::Internal => values.iter().map(Detach::detach).collect(),
            Self::External => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use ua_proto::Variant;

    use super::*;

    fn buffer_ptr(value: &DataValue) -> *const u8 {
        match &value.value {
            Variant::ByteString(bytes) => bytes.as_ptr(),
            other => panic!("expected byte string, got {other:?}"),
        }
    }

    #[test]
    fn internal_crossing_reallocates() {
        let stored = DataValue::new(Bytes::from_static(b"live"));
        let crossed = SessionOrigin::Internal.cross(vec![stored.clone()]);

        assert_eq!(crossed[0], stored);
        assert_ne!(buffer_ptr(&crossed[0]), buffer_ptr(&stored));
    }

    #[test]
    fn external_crossing_passes_through() {
        let stored = DataValue::new(Bytes::from_static(b"live"));
        let crossed = SessionOrigin::External.cross(vec![stored.clone()]);

        assert_eq!(buffer_ptr(&crossed[0]), buffer_ptr(&stored));
    }

    #[test]
    fn origin_from_flag() {
        assert!(SessionOrigin::from_external(true).is_external());
        assert!(!SessionOrigin::from_external(false).is_external());
    }
}
