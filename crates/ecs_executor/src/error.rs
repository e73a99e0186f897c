//! Executor error types.

use ecs_system::QueueId;

/// Errors surfaced by [`ExecutionController`](crate::ExecutionController)
/// and [`ExecutionQueue`](crate::ExecutionQueue).
///
/// Stopping a queue is not an error: a stopped run returns
/// [`QueueOutcome::Stopped`](crate::QueueOutcome::Stopped).
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// No live queue has this id.
    #[error("execution queue {0} not found")]
    QueueNotFound(QueueId),

    /// A system returned a pending result while the run forbids async.
    #[error("system '{system}' returned a pending result in queue {queue}, but async execution is not allowed")]
    AsyncProhibited { system: String, queue: QueueId },

    /// A declared dependency could not be resolved.
    #[error("system '{system}' depends on '{service}', which could not be resolved")]
    MissingDependency { system: String, service: String },

    /// A system's run returned an error.
    #[error("system '{system}' failed in queue {queue}: {source}")]
    SystemFailed {
        system: String,
        queue: QueueId,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutionError {
    /// Name of the system the error is attributed to, if any.
    #[must_use]
    pub fn system(&self) -> Option<&str> {
        match self {
            Self::QueueNotFound(_) => None,
            Self::AsyncProhibited { system, .. }
            | Self::MissingDependency { system, .. }
            | Self::SystemFailed { system, .. } => Some(system),
        }
    }
}
