//! Dependency resolution for systems.
//!
//! A system declares the services it needs through
//! [`System::dependencies`](crate::System::dependencies). Before each run the
//! queue asks a [`Resolver`] for every declared [`ServiceToken`] and binds the
//! results into a [`Services`] bag on the system's context. Systems never have
//! fields patched in place.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::context::{GroupId, QueueId};

/// A type-erased service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Identifies a service by its Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceToken {
    id: TypeId,
    name: &'static str,
}

impl ServiceToken {
    /// Token for service type `T`.
    #[must_use]
    pub fn of<T: Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the service's type id.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name of the service.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ServiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Where a resolution happens: the group and queue of the running system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionScope {
    /// Group requesting the service.
    pub group: GroupId,
    /// Queue requesting the service.
    pub queue: QueueId,
}

/// Source of services for systems.
pub trait Resolver: Send + Sync {
    /// Resolve `token` for `scope`, or `None` if no such service exists.
    fn resolve(&self, token: ServiceToken, scope: &InjectionScope) -> Option<Service>;
}

/// A resolver backed by a type-keyed map of process-wide instances.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<TypeId, Service>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any previous instance of the same type.
    pub fn register<T: Send + Sync + 'static>(&self, service: T) {
        self.register_arc(Arc::new(service));
    }

    /// Register an already shared service.
    pub fn register_arc<T: Send + Sync + 'static>(&self, service: Arc<T>) {
        if self.services.insert(TypeId::of::<T>(), service).is_some() {
            debug!(service = std::any::type_name::<T>(), "service replaced");
        } else {
            debug!(service = std::any::type_name::<T>(), "service registered");
        }
    }

    /// Returns the registered `T`, if any.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let service = Arc::clone(self.services.get(&TypeId::of::<T>())?.value());
        service.downcast::<T>().ok()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Resolver for ServiceRegistry {
    fn resolve(&self, token: ServiceToken, _scope: &InjectionScope) -> Option<Service> {
        self.services.get(&token.type_id()).map(|s| Arc::clone(s.value()))
    }
}

/// Resolve every token in `tokens`, binding them into a [`Services`] bag.
///
/// # Errors
///
/// Returns the first token the resolver could not satisfy.
pub fn bind(
    resolver: &dyn Resolver,
    tokens: &[ServiceToken],
    scope: &InjectionScope,
) -> Result<Services, ServiceToken> {
    let mut bound = HashMap::with_capacity(tokens.len());
    for &token in tokens {
        let service = resolver.resolve(token, scope).ok_or(token)?;
        bound.insert(token.type_id(), service);
    }
    Ok(Services { bound })
}

/// Services bound for one system run.
#[derive(Debug, Clone, Default)]
pub struct Services {
    bound: HashMap<TypeId, Service>,
}

impl Services {
    /// Returns the bound `T`, if it was declared and resolved.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.bound.get(&TypeId::of::<T>())?.clone().downcast::<T>().ok()
    }

    /// Returns a read-only view of the bound `T`.
    #[must_use]
    pub fn read_only<T: Send + Sync + 'static>(&self) -> Option<ReadOnly<T>> {
        self.get::<T>().map(ReadOnly)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// An immutable view of a shared service: it only hands out `&T` and cannot
/// be turned back into the owning `Arc`.
pub struct ReadOnly<T>(Arc<T>);

impl<T> Deref for ReadOnly<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.0).finish()
    }
}
