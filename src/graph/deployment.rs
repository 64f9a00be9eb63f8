//! Resource registration.
//!
//! A [`Deployment`] accepts typed resource arguments in program order and
//! returns immediately with a [`Resource`] handle. Behind each handle a tokio
//! task waits for the resource's explicit dependencies and deferred inputs,
//! then asks the [`ResourceGraph`] engine to create it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use futures::future;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::{
    DependencyGraph, DependencyNode, GraphError, GraphResult, Output, ResourceGraph,
    ResourceRequest, ResourceState, ResourceType, StackContext, Urn,
};

/// One input property of a resource.
#[derive(Debug, Clone)]
pub enum Input {
    /// Known at registration time
    Value(Value),
    /// Learned from another resource once it exists
    Deferred(Output<Value>),
}

impl Input {
    /// Resources this input is derived from.
    pub fn dependencies(&self) -> BTreeSet<Urn> {
        match self {
            Input::Value(_) => BTreeSet::new(),
            Input::Deferred(output) => output.dependencies().clone(),
        }
    }

    pub async fn resolve(self) -> GraphResult<Value> {
        match self {
            Input::Value(value) => Ok(value),
            Input::Deferred(output) => output.resolve().await,
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Value(Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Value(Value::Bool(value))
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Input::Value(Value::from(value))
    }
}

impl From<Vec<String>> for Input {
    fn from(values: Vec<String>) -> Self {
        Input::Value(Value::Array(values.into_iter().map(Value::String).collect()))
    }
}

impl From<IndexMap<String, String>> for Input {
    fn from(tags: IndexMap<String, String>) -> Self {
        let map: Map<String, Value> = tags
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Input::Value(Value::Object(map))
    }
}

impl From<Output<Value>> for Input {
    fn from(output: Output<Value>) -> Self {
        Input::Deferred(output)
    }
}

impl From<Output<String>> for Input {
    fn from(output: Output<String>) -> Self {
        Input::Deferred(output.apply(Value::String))
    }
}

impl From<Output<Vec<String>>> for Input {
    fn from(output: Output<Vec<String>>) -> Self {
        Input::Deferred(
            output.apply(|values| Value::Array(values.into_iter().map(Value::String).collect())),
        )
    }
}

/// Named input properties, kept in declaration order.
pub type Inputs = IndexMap<String, Input>;

/// Typed arguments of one resource type.
pub trait ResourceArgs {
    /// The resource type these arguments create
    const TYPE: ResourceType;

    /// Flatten into named inputs.
    fn into_inputs(self) -> Inputs;
}

/// Options that are not resource inputs.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Resources that must exist before this one, beyond input references
    pub depends_on: Vec<Resource>,
}

impl ResourceOptions {
    pub fn depends_on(mut self, resource: &Resource) -> Self {
        self.depends_on.push(resource.clone());
        self
    }
}

/// Handle to a registered resource.
#[derive(Debug, Clone)]
pub struct Resource {
    urn: Urn,
    state: Output<ResourceState>,
}

impl Resource {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    /// The engine's state report for this resource.
    pub fn state(&self) -> &Output<ResourceState> {
        &self.state
    }

    /// The identifier the engine assigns.
    pub fn id(&self) -> Output<String> {
        self.state.apply(|state| state.id)
    }

    /// An output attribute reported by the engine.
    pub fn attribute(&self, name: &str) -> Output<Value> {
        let urn = self.urn.clone();
        let attribute = name.to_string();
        self.state.try_apply(move |mut state| {
            state
                .attributes
                .remove(&attribute)
                .ok_or(GraphError::MissingAttribute { urn, attribute })
        })
    }

    /// A string-valued output attribute.
    pub fn string_attribute(&self, name: &str) -> Output<String> {
        let urn = self.urn.clone();
        let attribute = name.to_string();
        self.attribute(name).try_apply(move |value| match value {
            Value::String(s) => Ok(s),
            _ => Err(GraphError::MissingAttribute { urn, attribute }),
        })
    }
}

#[derive(Clone)]
struct PendingResource {
    urn: Urn,
    state: Output<ResourceState>,
    abort: AbortHandle,
}

/// One run against a resource-graph engine.
pub struct Deployment {
    engine: Arc<dyn ResourceGraph>,
    context: StackContext,
    dependencies: Mutex<DependencyGraph>,
    registered: Mutex<Vec<PendingResource>>,
}

impl Deployment {
    pub fn new(engine: Arc<dyn ResourceGraph>, context: StackContext) -> Self {
        Self {
            engine,
            context,
            dependencies: Mutex::new(DependencyGraph::new()),
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &StackContext {
        &self.context
    }

    /// Register a resource and start creating it in the background.
    ///
    /// Returns as soon as the resource is recorded. Must be called from
    /// within a tokio runtime.
    pub fn register<A: ResourceArgs>(
        &self,
        name: impl Into<String>,
        args: A,
        options: ResourceOptions,
    ) -> GraphResult<Resource> {
        let urn = Urn::new(A::TYPE, name);
        let inputs = args.into_inputs();

        let handle = Handle::try_current().map_err(|e| {
            GraphError::Engine(format!("No tokio runtime available to create {}: {}", urn, e))
        })?;

        let references: BTreeSet<Urn> = inputs.values().flat_map(Input::dependencies).collect();
        {
            let mut graph = self.dependencies.lock();
            graph.add_node(DependencyNode::new(urn.clone()))?;
            for producer in &references {
                graph.add_reference_dependency(producer, &urn)?;
            }
            for dependency in &options.depends_on {
                graph.add_explicit_dependency(dependency.urn(), &urn)?;
            }
        }

        debug!(
            resource = %urn,
            references = references.len(),
            explicit = options.depends_on.len(),
            "Registered resource"
        );

        let engine = Arc::clone(&self.engine);
        let task_urn = urn.clone();
        let task = handle.spawn(async move {
            let depends_on: Vec<Urn> = options.depends_on.iter().map(|r| r.urn.clone()).collect();
            for dependency in &options.depends_on {
                dependency.state.resolve().await?;
            }

            let mut properties = Map::new();
            for (key, input) in inputs {
                properties.insert(key, input.resolve().await?);
            }

            let request = ResourceRequest {
                urn: task_urn.clone(),
                properties,
                depends_on,
            };

            info!(resource = %task_urn, "Creating resource");
            let state = engine.create(request).await.map_err(|e| match e {
                GraphError::ResourceCreation { .. } => e,
                other => GraphError::creation(&task_urn, other.to_string()),
            })?;
            info!(resource = %task_urn, id = %state.id, "Created resource");

            Ok(state)
        });

        let abort = task.abort_handle();
        let join_urn = urn.clone();
        let state = Output::from_future(
            async move {
                match task.await {
                    Ok(result) => result,
                    Err(e) if e.is_cancelled() => Err(GraphError::creation(
                        &join_urn,
                        "creation cancelled after an earlier failure",
                    )),
                    Err(e) => Err(GraphError::creation(&join_urn, e.to_string())),
                }
            },
            BTreeSet::from([urn.clone()]),
        );

        self.registered.lock().push(PendingResource {
            urn: urn.clone(),
            state: state.clone(),
            abort,
        });

        Ok(Resource { urn, state })
    }

    /// Wait for every registered resource to be created.
    ///
    /// On the first failure the tasks still pending are aborted and that
    /// failure is returned.
    pub async fn wait(&self) -> GraphResult<()> {
        let pending: Vec<PendingResource> = self.registered.lock().clone();

        let result = future::try_join_all(pending.iter().map(|p| p.state.resolve())).await;
        match result {
            Ok(states) => {
                info!(resources = states.len(), "All resources created");
                Ok(())
            }
            Err(err) => {
                let aborted = self.abort_pending();
                warn!(error = %err, aborted, "Deployment failed");
                Err(err)
            }
        }
    }

    /// Cancel every creation that has not finished. Returns how many were
    /// cancelled.
    pub fn abort_pending(&self) -> usize {
        let mut aborted = 0;
        for p in self.registered.lock().iter() {
            if p.state.peek().is_none() {
                p.abort.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            debug!(aborted, "Cancelled pending creations");
        }
        aborted
    }

    /// Publish named outputs in the given order.
    ///
    /// Every name and value is checked before the first export, so a
    /// rejected output leaves nothing published.
    pub async fn export_all(&self, outputs: Map<String, Value>) -> GraphResult<()> {
        for (name, value) in &outputs {
            if name.is_empty() {
                return Err(GraphError::Export {
                    name: name.clone(),
                    message: "output name is empty".to_string(),
                });
            }
            if value.is_null() {
                return Err(GraphError::Export {
                    name: name.clone(),
                    message: "output value is null".to_string(),
                });
            }
        }

        for (name, value) in outputs {
            debug!(output = %name, "Exporting output");
            self.engine
                .export(&name, value)
                .await
                .map_err(|e| GraphError::Export {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Snapshot of the dependency edges recorded so far.
    pub fn dependency_graph(&self) -> DependencyGraph {
        self.dependencies.lock().clone()
    }

    pub fn resource_count(&self) -> usize {
        self.registered.lock().len()
    }

    /// URNs in registration order.
    pub fn registered(&self) -> Vec<Urn> {
        self.registered.lock().iter().map(|p| p.urn.clone()).collect()
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("context", &self.context)
            .field("resources", &self.resource_count())
            .finish()
    }
}
