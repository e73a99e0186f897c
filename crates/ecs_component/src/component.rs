//! Core [`Component`] trait and the runtime type identity used to look
//! components up.
//!
//! Components are opaque data records. Their identity is their concrete type,
//! expressed at runtime as a [`ComponentType`]: a [`ComponentTypeId`] wrapping
//! the type's [`TypeId`] plus the declared name for diagnostics.
//!
//! Two distinct types may declare the same name. They remain distinct
//! components; only log output and error messages would read the same.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a concrete component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(TypeId);

impl ComponentTypeId {
    /// Returns the [`ComponentTypeId`] for the Rust component type `T`.
    #[must_use]
    pub fn of<T: Component + ?Sized>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.0
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// The core component trait.
///
/// Every data fragment attached to an entity implements this trait. At most
/// one instance of each component type may be attached to a given entity.
///
/// # Examples
///
/// ```rust
/// use ecs_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component type, used in logs and
    /// error messages.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::of::<Self>()
    }

    /// Returns the runtime [`ComponentType`] descriptor for this component.
    fn component_type() -> ComponentType {
        ComponentType {
            id: Self::component_type_id(),
            name: Self::type_name(),
        }
    }
}

/// Runtime identity of a component type.
///
/// Equality and hashing consider only the [`ComponentTypeId`]; the name is
/// carried for log output and error messages.
#[derive(Debug, Clone, Copy)]
pub struct ComponentType {
    /// The concrete type identity.
    pub id: ComponentTypeId,
    /// The declared component name (e.g. `"Position"`).
    pub name: &'static str,
}

impl ComponentType {
    /// Returns the descriptor for component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::component_type()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type-erased component instance together with its type descriptor.
pub(crate) struct StoredComponent {
    pub(crate) ty: ComponentType,
    pub(crate) value: Box<dyn Any + Send + Sync>,
}

impl StoredComponent {
    pub(crate) fn new<T: Component>(value: T) -> Self {
        Self {
            ty: T::component_type(),
            value: Box::new(value),
        }
    }
}

impl fmt::Debug for StoredComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredComponent")
            .field("ty", &self.ty.name)
            .finish_non_exhaustive()
    }
}
