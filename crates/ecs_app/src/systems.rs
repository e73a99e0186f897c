//! Demo systems and the groups that schedule them.
//!
//! `Motion` integrates velocities, bounces entities off the world bounds and
//! periodically thaws frozen entities. `Census` counts moving and frozen
//! entities with an asynchronous fan-out over the filtered set.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ecs_component::ComponentFilter;
use ecs_system::{
    Execution, SingletonCache, System, SystemChain, SystemConfig, SystemContext, SystemGroup,
    SystemList,
};
use glam::Vec3;
use tracing::{debug, warn};

use crate::components::{Frozen, Position, Velocity};

/// Frozen entities are thawed every this many frames.
pub const THAW_INTERVAL: u64 = 60;

/// Caller data shared by every system of one frame.
#[derive(Debug, Default)]
pub struct FrameData {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Half-extent of the cube entities are kept inside.
    pub bounds: f32,
    /// Counters filled during the frame.
    pub stats: FrameStats,
}

impl FrameData {
    /// Frame data with zeroed stats.
    #[must_use]
    pub fn new(frame: u64, dt: f32, bounds: f32) -> Self {
        Self {
            frame,
            dt,
            bounds,
            stats: FrameStats::default(),
        }
    }
}

/// Counters filled by the census.
#[derive(Debug, Default)]
pub struct FrameStats {
    moving: AtomicUsize,
    frozen: AtomicUsize,
}

impl FrameStats {
    /// Entities counted as moving.
    #[must_use]
    pub fn moving(&self) -> usize {
        self.moving.load(Ordering::Relaxed)
    }

    /// Entities counted as frozen.
    #[must_use]
    pub fn frozen(&self) -> usize {
        self.frozen.load(Ordering::Relaxed)
    }
}

/// `position += velocity * dt` for every entity that is not frozen.
#[derive(Default)]
pub struct Integrate;

impl System for Integrate {
    type Data = FrameData;

    fn filter(&self) -> ComponentFilter {
        ComponentFilter::new()
            .with::<Position>()
            .with::<Velocity>()
            .without::<Frozen>()
    }

    fn run(&self, ctx: SystemContext<FrameData>) -> Execution {
        let dt = ctx.data().dt;
        for entity in &ctx.entities() {
            let mut entity = entity.write();
            let velocity = match entity.get_component::<Velocity>() {
                Ok(velocity) => velocity.0,
                Err(err) => return Execution::Complete(Err(err.into())),
            };
            if let Ok(position) = entity.get_component_mut::<Position>() {
                position.0 += velocity * dt;
            }
        }
        Execution::done()
    }
}

/// Reflects entities that left the bounds back inside, flipping the
/// velocity along the offending axes.
#[derive(Default)]
pub struct Bounce;

impl System for Bounce {
    type Data = FrameData;

    fn filter(&self) -> ComponentFilter {
        ComponentFilter::new().with::<Position>().with::<Velocity>()
    }

    fn run(&self, ctx: SystemContext<FrameData>) -> Execution {
        let bounds = ctx.data().bounds;
        let mut bounced = 0;
        ctx.entities().for_each(|entity, _| {
            let mut entity = entity.write();
            let Ok(position) = entity.get_component::<Position>().map(|p| p.0) else {
                return;
            };
            let outside = position.abs().cmpgt(Vec3::splat(bounds));
            if !outside.any() {
                return;
            }
            let clamped = position.clamp(Vec3::splat(-bounds), Vec3::splat(bounds));
            if let Ok(p) = entity.get_component_mut::<Position>() {
                p.0 = clamped;
            }
            if let Ok(v) = entity.get_component_mut::<Velocity>() {
                v.0 = Vec3::select(outside, -v.0, v.0);
            }
            bounced += 1;
        });
        if bounced > 0 {
            debug!(frame = ctx.data().frame, bounced, "entities bounced");
        }
        Execution::done()
    }
}

/// Disables the `Frozen` marker on every entity holding it enabled.
#[derive(Default)]
pub struct Thaw;

impl System for Thaw {
    type Data = FrameData;

    fn filter(&self) -> ComponentFilter {
        ComponentFilter::new().with::<Frozen>()
    }

    fn run(&self, ctx: SystemContext<FrameData>) -> Execution {
        let mut thawed = 0;
        for entity in &ctx.entities() {
            if let Err(err) = entity.write().disable_component::<Frozen>() {
                return Execution::Complete(Err(err.into()));
            }
            thawed += 1;
        }
        debug!(frame = ctx.data().frame, thawed, "entities thawed");
        Execution::done()
    }
}

/// Counts moving and frozen entities, visiting them concurrently.
#[derive(Default)]
pub struct CountEntities;

impl System for CountEntities {
    type Data = FrameData;

    fn filter(&self) -> ComponentFilter {
        ComponentFilter::new().with::<Position>()
    }

    fn run(&self, ctx: SystemContext<FrameData>) -> Execution {
        let entities = ctx.entities();
        Execution::pending(async move {
            let data = Arc::clone(ctx.shared_data());
            entities
                .parallel(|entity, _| {
                    let data = Arc::clone(&data);
                    async move {
                        tokio::task::yield_now().await;
                        let entity = entity.read();
                        if entity.has_component::<Frozen>() {
                            data.stats.frozen.fetch_add(1, Ordering::Relaxed);
                        } else if entity.has_component::<Velocity>() {
                            data.stats.moving.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok::<(), anyhow::Error>(())
                    }
                })
                .await
        })
    }
}

/// Movement phase: integrate, bounce, and thaw on every `THAW_INTERVAL`th
/// frame.
#[derive(Default)]
pub struct Motion;

impl SystemGroup for Motion {
    type Data = FrameData;

    fn systems(&self, data: &Arc<FrameData>, cache: &SingletonCache) -> SystemList<FrameData> {
        let mut chain = SystemChain::new();
        let thaw_due = data.frame > 0 && data.frame % THAW_INTERVAL == 0;
        let entries = [
            SystemConfig::new(cache.get::<Integrate>()).keyed("integrate"),
            SystemConfig::new(cache.get::<Bounce>()).keyed("bounce"),
            SystemConfig::new(cache.get::<Thaw>())
                .keyed("thaw")
                .run_if(move || thaw_due),
        ];
        for entry in entries {
            if let Err(err) = chain.append(entry) {
                warn!(error = %err, "motion entry rejected");
            }
        }
        chain.into()
    }
}

/// Reporting phase.
#[derive(Default)]
pub struct Census;

impl SystemGroup for Census {
    type Data = FrameData;

    fn systems(&self, _data: &Arc<FrameData>, cache: &SingletonCache) -> SystemList<FrameData> {
        let mut chain = SystemChain::new();
        if let Err(err) = chain.append(SystemConfig::new(cache.get::<CountEntities>())) {
            warn!(error = %err, "census entry rejected");
        }
        chain.into()
    }
}
