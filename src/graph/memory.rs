//! In-memory resource graph engine.
//!
//! Creates nothing in the cloud. Every request is recorded and answered with
//! a deterministic identifier, which makes the engine suitable for previews
//! and for asserting on the exact requests a topology issues.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::trace;

use super::{GraphError, GraphResult, ResourceGraph, ResourceRequest, ResourceState, ResourceType};

/// Resource graph engine that keeps everything in memory
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    created: RwLock<Vec<(ResourceRequest, ResourceState)>>,
    exports: RwLock<Map<String, Value>>,
    failures: RwLock<HashMap<String, String>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation of the resource with this logical name fail.
    pub fn fail_on(&self, name: impl Into<String>, message: impl Into<String>) {
        self.failures.write().insert(name.into(), message.into());
    }

    /// Every successful request with the state it was answered with, in
    /// creation order.
    pub fn created(&self) -> Vec<(ResourceRequest, ResourceState)> {
        self.created.read().clone()
    }

    /// Number of created resources of one type.
    pub fn count(&self, resource_type: ResourceType) -> usize {
        self.created
            .read()
            .iter()
            .filter(|(request, _)| request.resource_type() == resource_type)
            .count()
    }

    /// Requests of one type, ordered by logical name.
    pub fn requests_of(&self, resource_type: ResourceType) -> Vec<ResourceRequest> {
        let mut requests: Vec<ResourceRequest> = self
            .created
            .read()
            .iter()
            .filter(|(request, _)| request.resource_type() == resource_type)
            .map(|(request, _)| request.clone())
            .collect();
        requests.sort_by(|a, b| a.name().cmp(b.name()));
        requests
    }

    /// The request that created the resource with this logical name.
    pub fn request(&self, name: &str) -> Option<ResourceRequest> {
        self.created
            .read()
            .iter()
            .find(|(request, _)| request.name() == name)
            .map(|(request, _)| request.clone())
    }

    /// The identifier assigned to the resource with this logical name.
    pub fn id_of(&self, name: &str) -> Option<String> {
        self.created
            .read()
            .iter()
            .find(|(request, _)| request.name() == name)
            .map(|(_, state)| state.id.clone())
    }

    /// All exported outputs, in export order.
    pub fn exports(&self) -> Map<String, Value> {
        self.exports.read().clone()
    }

    /// One exported output.
    pub fn exported(&self, name: &str) -> Option<Value> {
        self.exports.read().get(name).cloned()
    }

    fn assign_id(request: &ResourceRequest) -> String {
        let suffix: String = request
            .name()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        format!("{}-{}", request.resource_type().id_prefix(), suffix)
    }

    /// Documentation-range address derived from the logical name.
    fn public_ip(name: &str) -> String {
        let host = name.bytes().fold(0u32, |acc, b| acc + u32::from(b)) % 254 + 1;
        format!("198.51.100.{}", host)
    }
}

#[async_trait]
impl ResourceGraph for InMemoryGraph {
    async fn create(&self, request: ResourceRequest) -> GraphResult<ResourceState> {
        if let Some(message) = self.failures.read().get(request.name()) {
            return Err(GraphError::creation(&request.urn, message.clone()));
        }

        let mut state = ResourceState::new(Self::assign_id(&request));
        state.attributes = request.properties.clone();
        if request.resource_type() == ResourceType::Eip {
            state = state.with_attribute("publicIp", Value::String(Self::public_ip(request.name())));
        }

        trace!(resource = %request.urn, id = %state.id, "In-memory create");
        self.created.write().push((request, state.clone()));
        Ok(state)
    }

    async fn export(&self, name: &str, value: Value) -> GraphResult<()> {
        self.exports.write().insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Urn;
    use serde_json::json;

    fn request(ty: ResourceType, name: &str) -> ResourceRequest {
        let mut properties = Map::new();
        properties.insert("vpc".to_string(), json!(true));
        ResourceRequest {
            urn: Urn::new(ty, name),
            properties,
            depends_on: vec![],
        }
    }

    #[tokio::test]
    async fn test_ids_are_deterministic() {
        let engine = InMemoryGraph::new();
        let state = engine
            .create(request(ResourceType::NatGateway, "NATGateway0"))
            .await
            .unwrap();

        assert_eq!(state.id, "nat-natgateway0");
        assert_eq!(engine.id_of("NATGateway0").as_deref(), Some("nat-natgateway0"));
        assert_eq!(engine.count(ResourceType::NatGateway), 1);
    }

    #[tokio::test]
    async fn test_eip_reports_public_ip() {
        let engine = InMemoryGraph::new();
        let state = engine
            .create(request(ResourceType::Eip, "NAT0EIP"))
            .await
            .unwrap();

        let ip = state.attributes["publicIp"].as_str().unwrap();
        assert!(ip.starts_with("198.51.100."));
        assert_eq!(state.attributes["vpc"], json!(true));
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let engine = InMemoryGraph::new();
        engine.fail_on("VPC", "limit exceeded");

        let err = engine
            .create(request(ResourceType::Vpc, "VPC"))
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::ResourceCreation { .. }));
        assert!(engine.created().is_empty());
    }

    #[tokio::test]
    async fn test_exports_keep_order() {
        let engine = InMemoryGraph::new();
        engine.export("vpcId", json!("vpc-vpc")).await.unwrap();
        engine.export("natEips", json!([])).await.unwrap();

        let exports = engine.exports();
        let keys: Vec<&str> = exports.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["vpcId", "natEips"]);
        assert_eq!(engine.exported("vpcId"), Some(json!("vpc-vpc")));
    }
}
