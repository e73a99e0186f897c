//! Controller configuration.

use serde::Deserialize;

/// Name given to queues created without one.
pub const DEFAULT_QUEUE_NAME: &str = "unnamed";

/// Configuration for an [`ExecutionController`](crate::ExecutionController).
///
/// Missing fields fall back to their defaults when deserialised, so an empty
/// JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Name used by [`ExecutionController::create`](crate::ExecutionController::create).
    pub default_queue_name: String,
    /// Whether [`ExecutionController::run_default`](crate::ExecutionController::run_default)
    /// lets systems suspend.
    pub allow_async: bool,
}

impl ControllerConfig {
    /// Default config: queues named `"unnamed"`, async allowed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name given to queues created without one.
    #[must_use]
    pub fn with_default_queue_name(mut self, name: impl Into<String>) -> Self {
        self.default_queue_name = name.into();
        self
    }

    /// Set whether queues may await pending system runs.
    #[must_use]
    pub fn with_allow_async(mut self, allow_async: bool) -> Self {
        self.allow_async = allow_async;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_queue_name: DEFAULT_QUEUE_NAME.to_string(),
            allow_async: true,
        }
    }
}
