//! # ecs_app: frame-loop demo
//!
//! Populates a world of moving entities and runs the `Motion` and `Census`
//! groups once per frame through an execution controller.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments (each has an `ECS_*` environment fallback).
//! 2. Populate the entity storage.
//! 3. Enter the fixed-rate frame loop.
//! 4. Optionally write a JSON snapshot of the final world.

mod components;
mod frame;
mod systems;
mod world;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ecs_component::EntityStorage;
use ecs_executor::{ControllerConfig, ExecutionController};
use ecs_system::GroupRef;
use tracing::info;
use tracing_subscriber::EnvFilter;

use frame::{FrameConfig, FrameLoop};
use systems::{Census, Motion};

#[derive(Parser)]
#[command(name = "ecs_app", about = "Fixed-rate ECS frame loop demo")]
struct Args {
    /// Target frames per second
    #[arg(long, env = "ECS_FRAME_RATE", default_value_t = 60.0)]
    frame_rate: f64,

    /// Frames to run before exiting (0 runs forever)
    #[arg(long, env = "ECS_MAX_FRAMES", default_value_t = 600)]
    max_frames: u64,

    /// Number of entities to spawn
    #[arg(long, env = "ECS_ENTITIES", default_value_t = 1000)]
    entities: usize,

    /// Half-extent of the world cube
    #[arg(long, default_value_t = 50.0)]
    bounds: f32,

    /// Write the final world state as JSON to this path
    #[arg(long, env = "ECS_SNAPSHOT")]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ecs_app=info".parse()?))
        .init();

    let args = Args::parse();
    frame::frame_period(args.frame_rate)?;
    anyhow::ensure!(args.bounds > 0.0, "bounds must be positive");

    info!(entities = args.entities, "ecs demo starting");

    let storage = Arc::new(EntityStorage::default());
    world::populate(&storage, args.entities, args.bounds)?;

    let controller = Arc::new(
        ExecutionController::new(Arc::clone(&storage))
            .with_config(ControllerConfig::new().with_default_queue_name("frame")),
    );
    let config = FrameConfig {
        frame_rate: args.frame_rate,
        max_frames: args.max_frames,
        bounds: args.bounds,
    };
    let mut frames = FrameLoop::new(
        config,
        Arc::clone(&controller),
        vec![GroupRef::of::<Motion>(), GroupRef::of::<Census>()],
    );

    tokio::select! {
        result = frames.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping queues");
            controller.stop_all();
        }
    }

    if let Some(path) = &args.snapshot {
        let json = serde_json::to_string_pretty(&world::snapshot(&storage))?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "world snapshot written");
    }

    info!(frames = frames.frame_id(), "ecs demo shut down");
    Ok(())
}
