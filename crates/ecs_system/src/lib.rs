//! # ecs_system
//!
//! Processing units and how they are grouped, ordered and fed.
//!
//! This crate provides:
//!
//! - [`System`]: one processing unit, finishing synchronously or handing back
//!   a future through [`Execution`].
//! - [`SystemContext`]: the filtered world view, caller data, bound services
//!   and cancellation token of one run.
//! - [`SystemConfig`]: per-entry scheduling options (data override, filter
//!   extension, repeat, run condition).
//! - [`SystemGroup`]: a logical phase producing its systems per trigger, as a
//!   [`SystemChain`] or as legacy [`OrderedSystems`].
//! - [`SingletonCache`]: one shared instance per system and group type.
//! - [`Resolver`] / [`ServiceRegistry`]: dependency resolution bound into
//!   each run's context.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ecs_system::{
//!     Execution, SingletonCache, System, SystemChain, SystemConfig, SystemContext,
//!     SystemGroup, SystemList,
//! };
//!
//! #[derive(Default)]
//! struct Integrate;
//!
//! impl System for Integrate {
//!     type Data = f32;
//!
//!     fn run(&self, _ctx: SystemContext<f32>) -> Execution {
//!         Execution::done()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Physics;
//!
//! impl SystemGroup for Physics {
//!     type Data = f32;
//!
//!     fn systems(&self, _dt: &Arc<f32>, cache: &SingletonCache) -> SystemList<f32> {
//!         let mut chain = SystemChain::new();
//!         chain
//!             .append(SystemConfig::new(cache.get::<Integrate>()).repeat(2))
//!             .expect("fresh chain");
//!         chain.into()
//!     }
//! }
//!
//! let sorted = Physics.sorted(&Arc::new(0.016), &SingletonCache::new());
//! assert_eq!(sorted.len(), 1);
//! assert_eq!(sorted[0].config.repeat, 2);
//! ```

pub mod cache;
pub mod cancel;
pub mod chain;
pub mod config;
pub mod context;
pub mod group;
pub mod inject;
pub mod ordered;
pub mod system;

pub use cache::SingletonCache;
pub use cancel::CancellationToken;
pub use chain::{ChainError, SystemChain};
pub use config::{Condition, SystemConfig};
pub use context::{GroupId, QueueId, SystemContext};
pub use group::{GroupRef, ScheduledSystem, SystemGroup, SystemList};
pub use inject::{
    InjectionScope, ReadOnly, Resolver, Service, ServiceRegistry, ServiceToken, Services, bind,
};
pub use ordered::{ORDER_STEP, OrderedSystems};
pub use system::{Execution, System, short_type_name};
