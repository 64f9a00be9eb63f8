//! Deferred values.
//!
//! An [`Output`] is a value that becomes known once the resources it was
//! derived from have been created. It is cheap to clone, every clone observes
//! the same result, and it remembers which resources it depends on so that
//! handing it to another resource records the dependency edge.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt, Shared};

use super::{GraphResult, Urn};

/// A deferred value plus the resources it was derived from.
#[derive(Clone)]
pub struct Output<T> {
    value: Shared<BoxFuture<'static, GraphResult<T>>>,
    dependencies: BTreeSet<Urn>,
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An output whose value is already known and depends on nothing.
    pub fn known(value: T) -> Self {
        Self::from_future(future::ready(Ok(value)), BTreeSet::new())
    }

    /// Wrap a future, tagging it with the resources it depends on.
    pub fn from_future<F>(value: F, dependencies: BTreeSet<Urn>) -> Self
    where
        F: Future<Output = GraphResult<T>> + Send + 'static,
    {
        Self {
            value: value.boxed().shared(),
            dependencies,
        }
    }

    /// Resources this value is derived from.
    pub fn dependencies(&self) -> &BTreeSet<Urn> {
        &self.dependencies
    }

    /// Transform the eventual value. Dependencies carry over unchanged.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_apply(move |value| Ok(f(value)))
    }

    /// Fallible transform of the eventual value.
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> GraphResult<U> + Send + 'static,
    {
        let value = self.value.clone();
        Output::from_future(async move { f(value.await?) }, self.dependencies.clone())
    }

    /// Combine outputs into one list-shaped output.
    ///
    /// The combined value resolves once every element has resolved and keeps
    /// the input order. The first failing element fails the whole list.
    pub fn all(outputs: impl IntoIterator<Item = Output<T>>) -> Output<Vec<T>> {
        let outputs: Vec<Output<T>> = outputs.into_iter().collect();
        let dependencies = outputs
            .iter()
            .flat_map(|output| output.dependencies.iter().cloned())
            .collect();
        let values: Vec<_> = outputs.into_iter().map(|output| output.value).collect();

        Output::from_future(future::try_join_all(values), dependencies)
    }

    /// Wait for the value.
    pub async fn resolve(&self) -> GraphResult<T> {
        self.value.clone().await
    }

    /// The value if it has already resolved.
    pub fn peek(&self) -> Option<GraphResult<T>> {
        self.value.peek().cloned()
    }
}

impl<T> fmt::Debug for Output<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("value", &self.peek())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
