//! Fixed-rate frame loop.
//!
//! Each frame:
//!
//! 1. Build the frame's [`FrameData`] (frame number, `dt`, bounds).
//! 2. Create one queue over the configured groups and run it.
//! 3. Log the census.
//! 4. Sleep off the rest of the frame budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ecs_executor::{ExecutionController, QueueOutcome};
use ecs_system::GroupRef;
use tracing::{debug, info, warn};

use crate::systems::FrameData;

/// Configuration for the frame loop.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Target frames per second.
    pub frame_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_frames: u64,
    /// Half-extent of the world cube.
    pub bounds: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            max_frames: 0,
            bounds: 50.0,
        }
    }
}

/// Drives one queue per frame through a shared controller.
pub struct FrameLoop {
    frame_id: u64,
    config: FrameConfig,
    controller: Arc<ExecutionController<FrameData>>,
    groups: Vec<GroupRef<FrameData>>,
}

impl FrameLoop {
    /// Create a loop that runs `groups` through `controller` once per frame.
    #[must_use]
    pub fn new(
        config: FrameConfig,
        controller: Arc<ExecutionController<FrameData>>,
        groups: Vec<GroupRef<FrameData>>,
    ) -> Self {
        Self {
            frame_id: 0,
            config,
            controller,
            groups,
        }
    }

    /// Returns the number of frames run so far.
    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Run one frame with time step `dt`.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the frame's queue.
    pub async fn frame(&mut self, dt: f32) -> Result<Arc<FrameData>> {
        self.frame_id += 1;
        let data = Arc::new(FrameData::new(self.frame_id, dt, self.config.bounds));
        let id = self.controller.create_named(
            &self.groups,
            Arc::clone(&data),
            format!("frame-{}", self.frame_id),
        );
        debug!(frame = self.frame_id, queue = %id, dt, "frame start");

        match self.controller.run_default(id).await? {
            QueueOutcome::Completed => debug!(
                frame = self.frame_id,
                moving = data.stats.moving(),
                frozen = data.stats.frozen(),
                "frame complete"
            ),
            QueueOutcome::Stopped => warn!(frame = self.frame_id, "frame stopped early"),
        }
        Ok(data)
    }

    /// Run frames at the configured rate until `max_frames` is reached, or
    /// forever when it is 0.
    ///
    /// # Errors
    ///
    /// Returns the first frame error.
    pub async fn run(&mut self) -> Result<()> {
        let frame_duration = frame_period(self.config.frame_rate)?;
        let mut frame_count = 0u64;

        info!(
            frame_rate = self.config.frame_rate,
            max_frames = self.config.max_frames,
            "starting frame loop"
        );

        loop {
            let start = Instant::now();

            let data = self.frame(frame_duration.as_secs_f32()).await?;

            frame_count += 1;
            if self.config.frame_rate >= 1.0 && frame_count % self.config.frame_rate as u64 == 0 {
                info!(
                    frame = self.frame_id,
                    moving = data.stats.moving(),
                    frozen = data.stats.frozen(),
                    "census"
                );
            }
            if self.config.max_frames > 0 && frame_count >= self.config.max_frames {
                info!(frames = frame_count, "frame loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            } else {
                warn!(
                    frame = self.frame_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
        Ok(())
    }
}

/// Time budget of one frame at `frame_rate` frames per second.
///
/// # Errors
///
/// Returns an error if the rate is not positive or the period does not fit
/// in a [`Duration`].
pub fn frame_period(frame_rate: f64) -> Result<Duration> {
    anyhow::ensure!(frame_rate > 0.0, "frame rate must be positive, got {frame_rate}");
    Duration::try_from_secs_f64(frame_rate.recip())
        .with_context(|| format!("frame rate {frame_rate} gives an unrepresentable frame period"))
}
