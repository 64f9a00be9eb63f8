//! Resource Dependency Tracking
//!
//! Records every registered resource and the edges between them so the
//! topology can be inspected without a live engine:
//!
//! - Execution ordering (topological sort)
//! - Impact analysis (what depends on a resource)
//! - Cycle detection
//! - Dependency visualization (DOT)

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::{GraphError, GraphResult, ResourceType, Urn};

/// A node in the dependency graph representing one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Resource identity
    pub urn: Urn,
    /// Registration sequence number
    pub sequence: u64,
}

impl DependencyNode {
    pub fn new(urn: Urn) -> Self {
        Self { urn, sequence: 0 }
    }
}

/// How a dependency between two resources came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyType {
    /// An input of the dependent references an output of the dependency
    Reference,
    /// Declared through `depends_on`
    Explicit,
}

/// A dependency between two resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDependency {
    /// The resource that must exist first
    pub from: Urn,
    /// The resource that waits for it
    pub to: Urn,
    pub dependency_type: DependencyType,
}

impl ResourceDependency {
    pub fn new(from: Urn, to: Urn, dependency_type: DependencyType) -> Self {
        Self {
            from,
            to,
            dependency_type,
        }
    }
}

/// The dependency graph for resource relationships
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, ResourceDependency>,
    node_indices: HashMap<Urn, NodeIndex>,
    sequence_counter: u64,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a resource is already registered
    pub fn contains(&self, urn: &Urn) -> bool {
        self.node_indices.contains_key(urn)
    }

    /// Add a resource to the graph. Registering the same URN twice is an error.
    pub fn add_node(&mut self, mut node: DependencyNode) -> GraphResult<NodeIndex> {
        if self.contains(&node.urn) {
            return Err(GraphError::DuplicateResource(node.urn));
        }

        node.sequence = self.sequence_counter;
        self.sequence_counter += 1;

        let urn = node.urn.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(urn, idx);
        Ok(idx)
    }

    /// Add a dependency edge between two registered resources
    pub fn add_dependency(&mut self, dependency: ResourceDependency) -> GraphResult<()> {
        let from_idx = self.index_of(&dependency.from)?;
        let to_idx = self.index_of(&dependency.to)?;

        self.graph.update_edge(from_idx, to_idx, dependency);
        Ok(())
    }

    /// Record that `consumer` takes an output of `producer` as an input
    pub fn add_reference_dependency(&mut self, producer: &Urn, consumer: &Urn) -> GraphResult<()> {
        self.add_dependency(ResourceDependency::new(
            producer.clone(),
            consumer.clone(),
            DependencyType::Reference,
        ))
    }

    /// Record a declared `depends_on` edge
    pub fn add_explicit_dependency(&mut self, dependency: &Urn, dependent: &Urn) -> GraphResult<()> {
        self.add_dependency(ResourceDependency::new(
            dependency.clone(),
            dependent.clone(),
            DependencyType::Explicit,
        ))
    }

    fn index_of(&self, urn: &Urn) -> GraphResult<NodeIndex> {
        self.node_indices
            .get(urn)
            .copied()
            .ok_or_else(|| GraphError::ResourceNotFound(urn.to_string()))
    }

    /// Check for dependency cycles
    pub fn has_cycles(&self) -> bool {
        tarjan_scc(&self.graph).iter().any(|scc| scc.len() > 1)
    }

    /// Get all cycles in the graph
    pub fn get_cycles(&self) -> Vec<Vec<Urn>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                scc.into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.urn.clone()))
                    .collect()
            })
            .collect()
    }

    /// Get a creation order that respects every dependency
    pub fn get_execution_order(&self) -> GraphResult<Vec<Urn>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.urn.clone()))
                .collect()),
            Err(_) => Err(GraphError::DependencyCycle(
                "Cannot determine creation order: dependency cycle exists".to_string(),
            )),
        }
    }

    /// Get all resources that depend on a given resource (direct and transitive)
    pub fn get_dependents(&self, urn: &Urn) -> Vec<Urn> {
        self.walk(urn, Direction::Outgoing)
    }

    /// Get all resources that a given resource depends on (direct and transitive)
    pub fn get_dependencies(&self, urn: &Urn) -> Vec<Urn> {
        self.walk(urn, Direction::Incoming)
    }

    fn walk(&self, urn: &Urn, direction: Direction) -> Vec<Urn> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut queue = VecDeque::new();

        if let Some(&start_idx) = self.node_indices.get(urn) {
            queue.push_back(start_idx);

            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors_directed(current, direction) {
                    if seen.insert(neighbor) {
                        if let Some(node) = self.graph.node_weight(neighbor) {
                            found.push(node.urn.clone());
                        }
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        found
    }

    /// Get direct dependencies of a resource
    pub fn get_direct_dependencies(&self, urn: &Urn) -> Vec<ResourceDependency> {
        self.node_indices
            .get(urn)
            .map(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|edge| edge.weight().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Registered resources in registration order
    pub fn nodes(&self) -> Vec<&DependencyNode> {
        let mut nodes: Vec<&DependencyNode> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.sequence);
        nodes
    }

    /// Number of registered resources per type
    pub fn count_by_type(&self) -> BTreeMap<ResourceType, usize> {
        let mut counts = BTreeMap::new();
        for node in self.graph.node_weights() {
            *counts.entry(node.urn.resource_type()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of registered resources of one type
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.graph
            .node_weights()
            .filter(|n| n.urn.resource_type() == resource_type)
            .count()
    }

    /// Generate a DOT format representation for visualization
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph resources {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in self.nodes() {
            let label = format!("{}\\n{}", node.urn.name(), node.urn.resource_type().token());
            output.push_str(&format!("  \"{}\" [label=\"{}\"];\n", node.urn, label));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            let dep = edge.weight();
            let style = match dep.dependency_type {
                DependencyType::Reference => "solid",
                DependencyType::Explicit => "dashed",
            };

            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [style={}];\n",
                dep.from, dep.to, style
            ));
        }

        output.push_str("}\n");
        output
    }
}
