//! Resource graph abstraction.
//!
//! The topology builder never talks to a cloud API directly. It registers
//! typed resources with a [`Deployment`], which records the dependency edges
//! in a [`DependencyGraph`] and hands fully resolved creation requests to a
//! [`ResourceGraph`] engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Topology Builder                            │
//! │          (registers resources in program order, never blocks)        │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                             Deployment                               │
//! │   (one tokio task per resource, awaiting its deferred inputs)        │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                                                   │
//!          ▼                                                   ▼
//! ┌─────────────────────┐                       ┌─────────────────────────┐
//! │  Dependency Graph   │                       │   ResourceGraph engine  │
//! │  (petgraph DAG)     │                       │  (in-memory or external)│
//! └─────────────────────┘                       └─────────────────────────┘
//! ```
//!
//! Identifiers are modelled as [`Output`] values: shared futures that carry
//! the set of resources they were derived from. Passing an output as an
//! input to another resource is what creates an implicit dependency edge.

pub mod dependencies;
pub mod deployment;
pub mod memory;
pub mod output;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dependencies::{DependencyGraph, DependencyNode, DependencyType, ResourceDependency};
pub use deployment::{Deployment, Input, Inputs, Resource, ResourceArgs, ResourceOptions};
pub use memory::InMemoryGraph;
pub use output::Output;

/// Errors raised while building or executing the resource graph
///
/// The type is `Clone` so one failure can be observed by every deferred
/// value derived from the failing resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Failed to create {urn}: {message}")]
    ResourceCreation { urn: Urn, message: String },

    #[error("Resource registered twice: {0}")]
    DuplicateResource(Urn),

    #[error("Resource not found in dependency graph: {0}")]
    ResourceNotFound(String),

    #[error("Resource {urn} did not report attribute '{attribute}'")]
    MissingAttribute { urn: Urn, attribute: String },

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("Failed to export '{name}': {message}")]
    Export { name: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

impl GraphError {
    /// Creates a resource creation error for the given resource.
    pub fn creation(urn: &Urn, message: impl Into<String>) -> Self {
        Self::ResourceCreation {
            urn: urn.clone(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for resource graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Every resource type the network topology can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Vpc,
    VpcDhcpOptions,
    VpcDhcpOptionsAssociation,
    InternetGateway,
    RouteTable,
    Route,
    RouteTableAssociation,
    Subnet,
    Eip,
    NatGateway,
    NetworkAcl,
    NetworkAclRule,
    VpcEndpoint,
}

impl ResourceType {
    /// The provider type token understood by declarative engines.
    pub fn token(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "aws:ec2/vpc:Vpc",
            ResourceType::VpcDhcpOptions => "aws:ec2/vpcDhcpOptions:VpcDhcpOptions",
            ResourceType::VpcDhcpOptionsAssociation => {
                "aws:ec2/vpcDhcpOptionsAssociation:VpcDhcpOptionsAssociation"
            }
            ResourceType::InternetGateway => "aws:ec2/internetGateway:InternetGateway",
            ResourceType::RouteTable => "aws:ec2/routeTable:RouteTable",
            ResourceType::Route => "aws:ec2/route:Route",
            ResourceType::RouteTableAssociation => {
                "aws:ec2/routeTableAssociation:RouteTableAssociation"
            }
            ResourceType::Subnet => "aws:ec2/subnet:Subnet",
            ResourceType::Eip => "aws:ec2/eip:Eip",
            ResourceType::NatGateway => "aws:ec2/natGateway:NatGateway",
            ResourceType::NetworkAcl => "aws:ec2/networkAcl:NetworkAcl",
            ResourceType::NetworkAclRule => "aws:ec2/networkAclRule:NetworkAclRule",
            ResourceType::VpcEndpoint => "aws:ec2/vpcEndpoint:VpcEndpoint",
        }
    }

    /// Prefix EC2 uses for identifiers of this resource type.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "vpc",
            ResourceType::VpcDhcpOptions => "dopt",
            ResourceType::VpcDhcpOptionsAssociation => "dopt-assoc",
            ResourceType::InternetGateway => "igw",
            ResourceType::RouteTable => "rtb",
            ResourceType::Route => "r",
            ResourceType::RouteTableAssociation => "rtbassoc",
            ResourceType::Subnet => "subnet",
            ResourceType::Eip => "eipalloc",
            ResourceType::NatGateway => "nat",
            ResourceType::NetworkAcl => "acl",
            ResourceType::NetworkAclRule => "aclrule",
            ResourceType::VpcEndpoint => "vpce",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Identity of a resource within one run: its type plus logical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Urn {
    resource_type: ResourceType,
    name: String,
}

impl Urn {
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Logical name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.resource_type.token(), self.name)
    }
}

/// Project, stack and region a deployment runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackContext {
    pub project: String,
    pub stack: String,
    pub region: String,
}

impl StackContext {
    pub fn new(
        project: impl Into<String>,
        stack: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            region: region.into(),
        }
    }

    /// `<project>-<stack>`, used as the Name tag of stack-wide resources.
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.project, self.stack)
    }
}

/// A fully resolved resource creation request handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub urn: Urn,
    /// Input properties with every deferred value already resolved
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Resources this one must be created after, beyond its input references
    pub depends_on: Vec<Urn>,
}

impl ResourceRequest {
    pub fn resource_type(&self) -> ResourceType {
        self.urn.resource_type()
    }

    pub fn name(&self) -> &str {
        self.urn.name()
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// String property lookup; `None` when absent or not a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

/// What the engine reports back once a resource exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-assigned identifier
    pub id: String,
    /// Output attributes (for example `cidrBlock` or `publicIp`)
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: serde_json::Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// The resource-graph engine a deployment drives.
///
/// Implementations create (or reconcile) one resource per call and publish
/// named stack outputs. They are free to run calls concurrently; the
/// deployment only issues a request once every input it references exists.
#[async_trait]
pub trait ResourceGraph: Send + Sync {
    /// Create the requested resource and report its identifier and attributes.
    async fn create(&self, request: ResourceRequest) -> GraphResult<ResourceState>;

    /// Publish one named stack output.
    async fn export(&self, name: &str, value: serde_json::Value) -> GraphResult<()>;
}
