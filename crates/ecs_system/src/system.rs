//! The [`System`] trait: one processing unit.
//!
//! A system receives a [`SystemContext`] describing the filtered view of the
//! world plus caller data, and either finishes immediately or hands back a
//! future for the queue to await.

use std::fmt;
use std::future::Future;

use ecs_component::ComponentFilter;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::SystemContext;
use crate::inject::ServiceToken;

/// The result of starting a system run.
pub enum Execution {
    /// The run finished synchronously.
    Complete(anyhow::Result<()>),
    /// The run continues asynchronously; the queue awaits the future.
    Pending(BoxFuture<'static, anyhow::Result<()>>),
}

impl Execution {
    /// A successful synchronous run.
    #[must_use]
    pub fn done() -> Self {
        Self::Complete(Ok(()))
    }

    /// Wrap an asynchronous run.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Returns `true` for [`Execution::Pending`].
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<anyhow::Result<()>> for Execution {
    fn from(result: anyhow::Result<()>) -> Self {
        Self::Complete(result)
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(result) => f.debug_tuple("Complete").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A processing unit run by an execution queue.
///
/// Systems are stateless per run: the same instance (cached per type) serves
/// every queue, so per-run state belongs in the context or the caller data.
///
/// # Examples
///
/// ```rust
/// use ecs_component::{Component, ComponentFilter};
/// use ecs_system::{Execution, System, SystemContext};
///
/// struct Position(f32);
/// impl Component for Position {
///     fn type_name() -> &'static str { "Position" }
/// }
///
/// #[derive(Default)]
/// struct Drift;
///
/// impl System for Drift {
///     type Data = f32;
///
///     fn filter(&self) -> ComponentFilter {
///         ComponentFilter::new().with::<Position>()
///     }
///
///     fn run(&self, ctx: SystemContext<f32>) -> Execution {
///         let dx = *ctx.data();
///         ctx.entities().for_each(|entity, _| {
///             if let Ok(pos) = entity.write().get_component_mut::<Position>() {
///                 pos.0 += dx;
///             }
///         });
///         Execution::done()
///     }
/// }
/// ```
pub trait System: Send + Sync + 'static {
    /// The caller data this system is scheduled with.
    type Data: Send + Sync + 'static;

    /// Name used in logs and errors. Defaults to the type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// The system's own entity filter. Invocation configs may extend it.
    fn filter(&self) -> ComponentFilter {
        ComponentFilter::new()
    }

    /// Services resolved and bound into the context before every run.
    fn dependencies(&self) -> Vec<ServiceToken> {
        Vec::new()
    }

    /// Start one run.
    fn run(&self, ctx: SystemContext<Self::Data>) -> Execution;

    /// Called when the owning queue is stopped while this system is running.
    fn force_stop(&self) {}
}

/// Strip the module path from a type name (`a::b::Movement` -> `Movement`).
/// Generic arguments are kept as they are.
#[must_use]
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
