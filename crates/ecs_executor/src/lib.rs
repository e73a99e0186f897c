//! # ecs_executor
//!
//! Drives system groups against an entity storage.
//!
//! - [`ExecutionQueue`]: flattens one or more groups sharing caller data into
//!   an ordered list of [`Invocation`]s and drains it with pause, resume and
//!   stop support. Systems that return a pending result are awaited, racing
//!   the queue's stop signal.
//! - [`ExecutionController`]: the registry of live queues, with per-queue and
//!   bulk lifecycle operations.
//! - [`GroupTrigger`]: creates and runs a queue for a fixed group list each
//!   time an event is dispatched.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ecs_component::EntityStorage;
//! use ecs_executor::{ExecutionController, QueueOutcome};
//! use ecs_system::{
//!     Execution, GroupRef, SingletonCache, System, SystemChain, SystemConfig, SystemContext,
//!     SystemGroup, SystemList,
//! };
//!
//! #[derive(Default)]
//! struct Greet;
//!
//! impl System for Greet {
//!     type Data = String;
//!
//!     fn run(&self, ctx: SystemContext<String>) -> Execution {
//!         assert_eq!(ctx.data(), "hello");
//!         Execution::done()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Startup;
//!
//! impl SystemGroup for Startup {
//!     type Data = String;
//!
//!     fn systems(&self, _data: &Arc<String>, cache: &SingletonCache) -> SystemList<String> {
//!         let mut chain = SystemChain::new();
//!         chain.append(SystemConfig::new(cache.get::<Greet>())).expect("fresh chain");
//!         chain.into()
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let controller = ExecutionController::new(Arc::new(EntityStorage::default()));
//! let id = controller.create(&[GroupRef::of::<Startup>()], "hello".to_string());
//! let outcome = controller.run(id, true).await.unwrap();
//! assert_eq!(outcome, QueueOutcome::Completed);
//! assert!(!controller.has_queue(id));
//! # });
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod invocation;
pub mod queue;
pub mod trigger;

pub use config::{ControllerConfig, DEFAULT_QUEUE_NAME};
pub use controller::ExecutionController;
pub use error::ExecutionError;
pub use invocation::Invocation;
pub use queue::{ExecutionQueue, QueueOutcome, QueueStatus};
pub use trigger::GroupTrigger;
