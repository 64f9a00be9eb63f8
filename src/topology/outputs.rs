//! Stack outputs published after a successful build.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::{GraphError, GraphResult};

/// Identifiers downstream stacks consume. Per-zone lists keep zone order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedOutputs {
    pub vpc_id: String,
    pub vpc_cidr: String,
    pub nat_eips: Vec<String>,
    pub public_subnet_ids: Vec<String>,
    pub public_subnet_cidrs: Vec<String>,
    pub public_subnet_route_table_id: String,
    pub private_subnet_ids: Vec<String>,
    pub private_subnet_cidrs: Vec<String>,
    pub protected_subnet_ids: Vec<String>,
    pub protected_subnet_cidrs: Vec<String>,
    pub private_subnet_route_table_ids: Vec<String>,
    /// Absent when private subnets are disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_vpc_endpoint_id: Option<String>,
}

impl ExportedOutputs {
    /// Outputs keyed by export name, in declaration order.
    pub fn to_map(&self) -> GraphResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(GraphError::Serialization(format!(
                "outputs serialized to {} instead of an object",
                other
            ))),
        }
    }
}
