//! OPC-UA service-layer types.
//!
//! Plain data shared by the session core and its collaborators: node ids,
//! status codes, variants and data values, attribute ids, discovery and
//! endpoint descriptors, and the parameter/result structs of every service
//! the session dispatches.
//!
//! Nothing in this crate performs I/O or encodes to the binary wire format.
//! The transport layer owns that; values arriving here have already been
//! decoded into owned Rust data.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod discovery;
mod node_id;
pub mod services;
mod status;
mod variant;

pub use attribute::{AttributeId, NodeClass, object_ids};
pub use discovery::{
    ApplicationDescription, ApplicationType, EndpointDescription, FindServersParameters,
    GetEndpointsParameters, MdnsDiscoveryConfiguration, MessageSecurityMode,
    RegisterServer2Parameters, RegisteredServer, UserTokenPolicy, UserTokenType,
};
pub use node_id::{Identifier, NodeId};
pub use status::StatusCode;
pub use variant::{DataValue, LocalizedText, QualifiedName, Variant};
