//! Integration tests for the resource graph
//!
//! Exercises deployments against engines other than the in-memory one:
//! - creation order matches the recorded dependency edges
//! - independent resources are created concurrently
//! - engine errors surface with the failing resource's identity
//! - exports only reach the engine after every resource exists

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use basenet::graph::{
    Deployment, GraphError, GraphResult, ResourceGraph, ResourceRequest, ResourceState,
    ResourceType, StackContext, Urn,
};
use basenet::topology;
use common::*;

/// Engine that sleeps per resource and records start and finish order.
#[derive(Default)]
struct RecordingGraph {
    started: Mutex<Vec<Urn>>,
    finished: Mutex<Vec<Urn>>,
    exported_after: Mutex<Vec<usize>>,
    in_flight: Mutex<usize>,
    peak_in_flight: Mutex<usize>,
}

impl RecordingGraph {
    fn position(&self, urn: &Urn) -> Option<usize> {
        self.finished.lock().iter().position(|u| u == urn)
    }
}

#[async_trait]
impl ResourceGraph for RecordingGraph {
    async fn create(&self, request: ResourceRequest) -> GraphResult<ResourceState> {
        self.started.lock().push(request.urn.clone());
        {
            let mut in_flight = self.in_flight.lock();
            *in_flight += 1;
            let mut peak = self.peak_in_flight.lock();
            *peak = (*peak).max(*in_flight);
        }

        tokio::time::sleep(Duration::from_millis(5)).await;

        *self.in_flight.lock() -= 1;
        self.finished.lock().push(request.urn.clone());

        let id = format!("{}-{}", request.resource_type().id_prefix(), request.name());
        let mut state = ResourceState::new(id);
        state.attributes = request.properties;
        if request.urn.resource_type() == ResourceType::Eip {
            state = state.with_attribute("publicIp", json!("203.0.113.10"));
        }
        Ok(state)
    }

    async fn export(&self, _name: &str, _value: Value) -> GraphResult<()> {
        let finished = self.finished.lock().len();
        self.exported_after.lock().push(finished);
        Ok(())
    }
}

/// Engine that rejects every request.
struct RejectingGraph;

#[async_trait]
impl ResourceGraph for RejectingGraph {
    async fn create(&self, _request: ResourceRequest) -> GraphResult<ResourceState> {
        Err(GraphError::Engine("credentials expired".to_string()))
    }

    async fn export(&self, name: &str, _value: Value) -> GraphResult<()> {
        Err(GraphError::Engine(format!("unexpected export of {}", name)))
    }
}

#[tokio::test]
async fn test_creation_respects_dependency_edges() {
    let settings = resolve(json!({ "createProtectedSubnets": true }), "us-east-1")
        .await
        .unwrap();
    let engine = Arc::new(RecordingGraph::default());
    let deployment = Deployment::new(engine.clone(), StackContext::new("network", "ci", "us-east-1"));

    topology::build(&settings, &deployment).await.unwrap();

    let graph = deployment.dependency_graph();
    for node in graph.nodes() {
        let created_at = engine.position(&node.urn).unwrap();
        for edge in graph.get_direct_dependencies(&node.urn) {
            let producer_at = engine.position(&edge.from).unwrap();
            assert!(
                producer_at < created_at,
                "{} was created before {}",
                node.urn,
                edge.from
            );
        }
    }
}

#[tokio::test]
async fn test_independent_resources_run_concurrently() {
    let settings = resolve(json!({ "numberOfAvailabilityZones": 4 }), "us-west-2")
        .await
        .unwrap();
    let engine = Arc::new(RecordingGraph::default());
    let deployment = Deployment::new(engine.clone(), StackContext::new("network", "ci", "us-west-2"));

    topology::build(&settings, &deployment).await.unwrap();

    // The four public subnets only wait for the VPC
    assert!(*engine.peak_in_flight.lock() >= 4);
    assert_eq!(engine.started.lock().len(), deployment.resource_count());
}

#[tokio::test]
async fn test_exports_follow_every_creation() {
    let settings = resolve(json!({}), "us-east-1").await.unwrap();
    let engine = Arc::new(RecordingGraph::default());
    let deployment = Deployment::new(engine.clone(), StackContext::new("network", "ci", "us-east-1"));

    let outputs = topology::build(&settings, &deployment).await.unwrap();
    assert_eq!(outputs.nat_eips, vec!["203.0.113.10", "203.0.113.10"]);

    let total = deployment.resource_count();
    let exported_after = engine.exported_after.lock().clone();
    assert_eq!(exported_after.len(), 12);
    assert!(exported_after.iter().all(|&finished| finished == total));
}

#[tokio::test]
async fn test_engine_errors_name_the_resource() {
    let settings = resolve(json!({}), "us-east-1").await.unwrap();
    let deployment = Deployment::new(
        Arc::new(RejectingGraph),
        StackContext::new("network", "ci", "us-east-1"),
    );

    let err = topology::build(&settings, &deployment).await.unwrap_err();
    match err {
        GraphError::ResourceCreation { urn, message } => {
            // Only resources without inputs from other resources can fail first
            assert!(matches!(
                urn.resource_type(),
                ResourceType::Vpc | ResourceType::VpcDhcpOptions
            ));
            assert_eq!(message, "Engine error: credentials expired");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_dot_output_marks_explicit_edges() {
    let built = build(json!({}), "us-east-1").await;
    let dot = built.deployment.dependency_graph().to_dot();

    assert!(dot.starts_with("digraph resources {"));
    assert!(dot.contains("NAT0EIP"));
    assert!(dot.contains("style=dashed"));
}
