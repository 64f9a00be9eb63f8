//! # basenet - AWS base network topology
//!
//! basenet turns a handful of stack configuration values into a complete,
//! dependency-ordered AWS base network: a VPC with DHCP options and an
//! Internet Gateway, one public subnet per availability zone, optional NAT
//! gateways with private subnets, optional NACL-protected subnets, and a
//! shared S3 gateway endpoint.
//!
//! ## Core Concepts
//!
//! - **Settings**: raw configuration resolved once into immutable
//!   [`NetworkSettings`](settings::NetworkSettings) with per-zone plans
//! - **Resources**: typed arguments registered with a
//!   [`Deployment`](graph::Deployment), created concurrently once their inputs exist
//! - **Outputs**: deferred identifiers that carry the resources they depend on
//! - **Engine**: the [`ResourceGraph`](graph::ResourceGraph) that actually
//!   creates resources; an in-memory engine ships for previews and tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Configuration Resolver                         │
//! │        (stack values + zone discovery → NetworkSettings)             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Topology Builder                             │
//! │          (VPC, subnets, routing, NAT, NACLs, S3 endpoint)            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Deployment + ResourceGraph engine                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use basenet::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let values = StackValues::default();
//!     let engine = Arc::new(InMemoryGraph::new());
//!     let deployment = Deployment::new(engine, StackContext::new("network", "dev", "us-west-2"));
//!
//!     let zones = StaticZones::lettered("us-west-2", 3);
//!     let (_, outputs) = basenet::provision(&values, ShapePolicy::Lenient, &zones, &deployment).await?;
//!     println!("{}", outputs.vpc_id);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Settings
    pub use crate::settings::{
        ConfigSource, NetworkSettings, RawNetworkConfig, SettingsError, ShapePolicy, StackValues,
        StaticZones, SubnetPlan, SubnetRole, ZoneDiscovery, ZonePlan,
    };

    // Resource graph
    pub use crate::graph::{
        Deployment, GraphError, InMemoryGraph, Output, Resource, ResourceGraph, ResourceOptions,
        ResourceRequest, ResourceState, ResourceType, StackContext, Urn,
    };

    // Topology
    pub use crate::topology::{build, ExportedOutputs};
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Settings resolution: configuration lookup, defaults, zone discovery and
/// per-zone subnet plans.
pub mod settings;

/// Resource graph: deferred outputs, registration, dependency tracking and
/// the engine interface.
pub mod graph;

/// Network topology builder.
pub mod topology;

// ============================================================================
// Configuration
// ============================================================================

/// Tool configuration: stack file loading and environment overrides.
pub mod config;

pub use error::{Error, Result};

use graph::Deployment;
use settings::{ConfigSource, NetworkSettings, RawNetworkConfig, ShapePolicy, ZoneDiscovery};
use topology::ExportedOutputs;

/// Resolve settings from `source`, then build and export the topology.
///
/// The region is taken from the deployment's stack context.
pub async fn provision<S: ConfigSource>(
    source: &S,
    policy: ShapePolicy,
    discovery: &dyn ZoneDiscovery,
    deployment: &Deployment,
) -> Result<(NetworkSettings, ExportedOutputs)> {
    let settings = RawNetworkConfig::new(source)
        .with_policy(policy)
        .resolve(discovery, &deployment.context().region)
        .await?;
    let outputs = topology::build(&settings, deployment).await?;
    Ok((settings, outputs))
}

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of basenet.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
