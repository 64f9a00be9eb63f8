//! Shared fixtures for the basenet integration tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use basenet::graph::{Deployment, InMemoryGraph, StackContext};
use basenet::settings::{
    NetworkSettings, RawNetworkConfig, SettingsError, SettingsResult, ShapePolicy, StackValues,
    StaticZones, ZoneDiscovery,
};
use basenet::topology::{self, ExportedOutputs};

// ============================================================================
// Stack Values
// ============================================================================

/// Stack values from a JSON object literal.
pub fn stack_values(value: Value) -> StackValues {
    match value {
        Value::Object(map) => StackValues::new(map),
        _ => StackValues::new(Map::new()),
    }
}

/// Two zones in us-east-1, as a fresh account reports them.
pub fn us_east_1_zones() -> StaticZones {
    StaticZones::new(["us-east-1a", "us-east-1b", "us-east-1c", "us-east-1d"])
}

// ============================================================================
// Zone Discovery Doubles
// ============================================================================

/// Discovery that always fails.
pub struct FailingZones;

#[async_trait]
impl ZoneDiscovery for FailingZones {
    async fn list_availability_zones(&self, region: &str) -> SettingsResult<Vec<String>> {
        Err(SettingsError::Discovery {
            region: region.to_string(),
            message: "RequestExpired".to_string(),
        })
    }
}

/// Discovery that counts how often it is asked.
#[derive(Default)]
pub struct CountingZones {
    calls: AtomicUsize,
}

impl CountingZones {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ZoneDiscovery for CountingZones {
    async fn list_availability_zones(&self, region: &str) -> SettingsResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(["a", "b", "c"].iter().map(|s| format!("{}{}", region, s)).collect())
    }
}

// ============================================================================
// Resolution and Build Helpers
// ============================================================================

/// Resolve settings leniently against four lettered zones.
pub async fn resolve(values: Value, region: &str) -> SettingsResult<NetworkSettings> {
    let values = stack_values(values);
    RawNetworkConfig::new(&values)
        .with_policy(ShapePolicy::Lenient)
        .resolve(&StaticZones::lettered(region, 4), region)
        .await
}

/// Result of building a topology against the in-memory engine.
pub struct Built {
    pub engine: Arc<InMemoryGraph>,
    pub deployment: Deployment,
    pub outputs: ExportedOutputs,
}

pub fn deployment(region: &str) -> (Arc<InMemoryGraph>, Deployment) {
    let engine = Arc::new(InMemoryGraph::new());
    let deployment = Deployment::new(engine.clone(), StackContext::new("network", "test", region));
    (engine, deployment)
}

/// Resolve `values` in `region` and build the topology.
pub async fn build(values: Value, region: &str) -> Built {
    let settings = resolve(values, region).await.expect("settings resolve");
    let (engine, deployment) = deployment(region);
    let outputs = topology::build(&settings, &deployment)
        .await
        .expect("topology builds");
    Built {
        engine,
        deployment,
        outputs,
    }
}
