//! Method service set: `Call`.

use serde::{Deserialize, Serialize};

use crate::{NodeId, StatusCode, Variant};

/// One method invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMethodRequest {
    /// Object the method is invoked on
    pub object_id: NodeId,
    /// Method node
    pub method_id: NodeId,
    /// Input arguments
    pub input_arguments: Vec<Variant>,
}

/// Result of one method invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMethodResult {
    /// Outcome
    pub status_code: StatusCode,
    /// Per-argument status, empty when all arguments were accepted
    pub input_argument_results: Vec<StatusCode>,
    /// Output arguments
    pub output_arguments: Vec<Variant>,
}
