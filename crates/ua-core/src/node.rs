//! Attribute access to a single node through a session.

use ua_proto::{
    AttributeId, DataValue, NodeId, StatusCode, Variant,
    services::{ReadParameters, ReadValueId, WriteParameters, WriteValue},
};

use crate::{env::Environment, error::ServiceError, session::InternalSession};

/// A node addressed through a session.
///
/// Every access is a regular read or write on the session, so isolation
/// and the session's role apply.
pub struct Node<'a, E: Environment> {
    session: &'a InternalSession<E>,
    node_id: NodeId,
}

impl<'a, E: Environment> Node<'a, E> {
    /// Handle for `node_id` on `session`.
    pub fn new(session: &'a InternalSession<E>, node_id: NodeId) -> Self {
        Self { session, node_id }
    }

    /// The node's id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Read one attribute.
    ///
    /// # Errors
    ///
    /// The read failed, or returned a bad status for the attribute.
    pub fn get_attribute(&self, attribute: AttributeId) -> Result<DataValue, ServiceError> {
        let params = ReadParameters {
            max_age: 0.0,
            nodes_to_read: vec![ReadValueId::new(self.node_id.clone(), attribute)],
        };
        let value = self
            .session
            .read(&params)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::new(StatusCode::BAD_INTERNAL_ERROR, "empty read result")
            })?;

        if value.status.is_bad() {
            let message = format!("read {attribute:?} of {}", self.node_id);
            return Err(ServiceError::new(value.status, message));
        }
        Ok(value)
    }

    /// Read the `Value` attribute.
    ///
    /// # Errors
    ///
    /// The read failed, or returned a bad status for the attribute.
    pub fn get_value(&self) -> Result<Variant, ServiceError> {
        Ok(self.get_attribute(AttributeId::Value)?.value)
    }

    /// Write one attribute.
    ///
    /// # Errors
    ///
    /// The write failed, or returned a bad status for the attribute.
    pub fn set_attribute(
        &self,
        attribute: AttributeId,
        value: DataValue,
    ) -> Result<(), ServiceError> {
        let params = WriteParameters {
            nodes_to_write: vec![WriteValue::new(self.node_id.clone(), attribute, value)],
        };
        let status = self
            .session
            .write(params)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::new(StatusCode::BAD_INTERNAL_ERROR, "empty write result")
            })?;

        if status.is_bad() {
            let message = format!("write {attribute:?} of {}", self.node_id);
            return Err(ServiceError::new(status, message));
        }
        Ok(())
    }

    /// Write the `Value` attribute.
    pub fn set_value(&self, value: impl Into<Variant>) -> Result<(), ServiceError> {
        self.set_attribute(AttributeId::Value, DataValue::new(value))
    }

    /// Set `mask` bits of an integer attribute.
    pub fn set_attr_bits(&self, attribute: AttributeId, mask: u8) -> Result<(), ServiceError> {
        self.update_bits(attribute, |v| v | u32::from(mask))
    }

    /// Clear `mask` bits of an integer attribute.
    pub fn unset_attr_bits(&self, attribute: AttributeId, mask: u8) -> Result<(), ServiceError> {
        self.update_bits(attribute, |v| v & !u32::from(mask))
    }

    /// Read-modify-write that keeps the attribute's integer kind. An unset
    /// attribute is treated as a zero byte.
    fn update_bits(
        &self,
        attribute: AttributeId,
        update: impl Fn(u32) -> u32,
    ) -> Result<(), ServiceError> {
        let mut value = self.get_attribute(attribute)?;

        value.value = match value.value {
            Variant::Empty => Variant::Byte(update(0) as u8),
            Variant::Byte(v) => Variant::Byte(update(u32::from(v)) as u8),
            Variant::UInt32(v) => Variant::UInt32(update(v)),
            Variant::Int32(v) => Variant::Int32(update(v as u32) as i32),
            other => {
                return Err(ServiceError::new(
                    StatusCode::BAD_TYPE_MISMATCH,
                    format!("{attribute:?} of {} is not a bit mask: {other:?}", self.node_id),
                ));
            },
        };

        self.set_attribute(attribute, value)
    }
}
