//! # KESTREL Game Loop
//!
//! Frame orchestration:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. DRAIN COMMANDS                                                   │
//! │    └─ Apply spawns/despawns/inserts queued by other threads         │
//! │                                                                     │
//! │ 2. PHYSICS TICK                                                     │
//! │    └─ Integrate every {Transform, RigidBody} entity                 │
//! │                                                                     │
//! │ 3. RENDER TICK                                                      │
//! │    └─ Rebuild the instance buffer from {Transform, Mesh} entities   │
//! │                                                                     │
//! │ 4. END FRAME                                                        │
//! │    └─ Record timing, warn on frames over budget                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All three phases run under one write lock, so readers observe either the
//! previous frame or the finished current one.

use std::path::Path;
use std::time::{Duration, Instant};

use kestrel_core::{
    CommandSender, Coordinator, EcsConfig, EcsError, EcsResult, SharedCoordinator, Signature,
};
use serde::{Deserialize, Serialize};

use crate::components::{Gravity, Mesh, RigidBody, Transform};
use crate::systems::{PhysicsSystem, RenderSystem, EARTH_GRAVITY};

/// Configuration for the game loop.
///
/// ```toml
/// target_fps = 60
/// max_delta = 0.1
/// gravity = [0.0, -9.81, 0.0]
///
/// [ecs]
/// max_entities = 5000
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// ECS sizing.
    pub ecs: EcsConfig,
    /// Target frames per second; sets the frame budget.
    pub target_fps: u32,
    /// Largest delta time handed to systems, in seconds.
    pub max_delta: f32,
    /// World gravity vector.
    pub gravity: [f32; 3],
    /// Terminal speed for rigid bodies.
    pub max_speed: f32,
    /// Log frames that exceed the budget.
    pub enable_timing_logs: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ecs: EcsConfig::default(),
            target_fps: 60,
            max_delta: 0.1,
            gravity: EARTH_GRAVITY,
            max_speed: 50.0,
            enable_timing_logs: true,
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| EcsError::InvalidConfig(format!("Failed to parse game config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] for a zero frame rate, a
    /// non-positive delta clamp or speed, or an invalid ECS section.
    pub fn validate(&self) -> EcsResult<()> {
        self.ecs.validate()?;
        if self.target_fps == 0 {
            return Err(EcsError::InvalidConfig(
                "target_fps must be greater than zero".to_string(),
            ));
        }
        if !(self.max_delta > 0.0) {
            return Err(EcsError::InvalidConfig(format!(
                "max_delta must be positive, got {}",
                self.max_delta
            )));
        }
        if !(self.max_speed > 0.0) {
            return Err(EcsError::InvalidConfig(format!(
                "max_speed must be positive, got {}",
                self.max_speed
            )));
        }
        Ok(())
    }

    /// Time budget for one frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps))
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Command drain time in microseconds.
    pub commands_us: u64,
    /// Physics tick time in microseconds.
    pub physics_us: u64,
    /// Render tick time in microseconds.
    pub render_us: u64,
    /// Frame number.
    pub frame: u64,
    /// Delta time handed to systems, after clamping.
    pub delta_time: f32,
    /// Queued commands applied this frame.
    pub commands_applied: usize,
    /// Instances collected by the render system.
    pub instances: usize,
}

/// The main game loop orchestrator.
///
/// Owns the shared world with its physics and render systems.
pub struct GameLoop {
    /// The ECS world, shareable with reader and producer threads.
    world: SharedCoordinator,
    /// Configuration.
    config: GameConfig,
    /// Frame counter.
    frame_count: u64,
    /// Last frame start time.
    last_frame_time: Instant,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a game loop with every simulation component and both systems
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: GameConfig) -> EcsResult<Self> {
        config.validate()?;

        let mut world = Coordinator::new(&config.ecs);
        let transform = world.register_component::<Transform>()?;
        let mesh = world.register_component::<Mesh>()?;
        let body = world.register_component::<RigidBody>()?;
        world.register_component::<Gravity>()?;

        world.register_system(PhysicsSystem::new(config.gravity, config.max_speed))?;
        world.set_system_signature::<PhysicsSystem>(Signature::EMPTY.with(transform).with(body))?;

        world.register_system(RenderSystem::with_capacity(config.ecs.max_entities))?;
        world.set_system_signature::<RenderSystem>(Signature::EMPTY.with(transform).with(mesh))?;

        tracing::info!(
            max_entities = config.ecs.max_entities,
            target_fps = config.target_fps,
            "game loop ready"
        );

        Ok(Self {
            world: SharedCoordinator::new(world),
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::new(),
        })
    }

    /// Runs one frame using the wall-clock time since the previous frame.
    ///
    /// # Errors
    ///
    /// See [`tick`](Self::tick).
    pub fn frame(&mut self) -> EcsResult<FrameStats> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.tick(delta.as_secs_f32())
    }

    /// Runs one frame with an explicit delta time.
    ///
    /// Delta time is clamped to `[0, max_delta]` to prevent physics
    /// explosion after a pause.
    ///
    /// # Errors
    ///
    /// Returns the first error from a queued command or a system. The frame
    /// counter does not advance on error.
    pub fn tick(&mut self, delta_time: f32) -> EcsResult<FrameStats> {
        let frame_start = Instant::now();
        let delta_time = delta_time.clamp(0.0, self.config.max_delta);

        let mut world = self.world.write();

        let start = Instant::now();
        let commands_applied = self.world.drain_locked(&mut world)?;
        let commands_us = micros(start.elapsed());

        let start = Instant::now();
        world.run_system::<PhysicsSystem>(delta_time)?;
        let physics_us = micros(start.elapsed());

        let start = Instant::now();
        world.run_system::<RenderSystem>(delta_time)?;
        let render_us = micros(start.elapsed());

        let instances = world.system::<RenderSystem>()?.instances().len();
        drop(world);

        let stats = FrameStats {
            total_us: micros(frame_start.elapsed()),
            commands_us,
            physics_us,
            render_us,
            frame: self.frame_count,
            delta_time,
            commands_applied,
            instances,
        };
        self.end_frame(stats);
        Ok(stats)
    }

    /// Records timing and prepares for the next frame.
    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        let budget_us = micros(self.config.frame_budget());
        self.stats_accumulator.record(stats, budget_us);

        if self.config.enable_timing_logs && stats.total_us > budget_us {
            tracing::warn!(
                frame = stats.frame,
                total_us = stats.total_us,
                budget_us,
                "frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The shared world. Clone it to hand reader threads access.
    #[must_use]
    pub fn world(&self) -> &SharedCoordinator {
        &self.world
    }

    /// A handle for queueing structural changes from any thread.
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        self.world.sender()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Running sum and extremes of one phase's duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Sum over all recorded frames, in microseconds.
    pub sum_us: u64,
    /// Shortest sample.
    pub min_us: u64,
    /// Longest sample.
    pub max_us: u64,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            sum_us: 0,
            min_us: u64::MAX,
            max_us: 0,
        }
    }
}

impl PhaseTiming {
    fn record(&mut self, us: u64) {
        self.sum_us = self.sum_us.saturating_add(us);
        self.min_us = self.min_us.min(us);
        self.max_us = self.max_us.max(us);
    }

    /// Mean in milliseconds over `frames` samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_ms(&self, frames: u64) -> f64 {
        if frames == 0 {
            return 0.0;
        }
        self.sum_us as f64 / frames as f64 / 1000.0
    }
}

/// Accumulated frame statistics, one [`PhaseTiming`] per phase.
#[derive(Clone, Debug, Default)]
pub struct FrameStatsAccumulator {
    /// Frames recorded.
    pub frames: u64,
    /// Whole-frame timing.
    pub total: PhaseTiming,
    /// Command drain timing.
    pub commands: PhaseTiming,
    /// Physics timing.
    pub physics: PhaseTiming,
    /// Render timing.
    pub render: PhaseTiming,
    /// Queued commands applied across all frames.
    pub commands_applied: u64,
    /// Largest instance count seen in one frame.
    pub peak_instances: usize,
    /// Frames whose total exceeded the budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame in, comparing its total against `budget_us`.
    pub fn record(&mut self, stats: FrameStats, budget_us: u64) {
        self.frames += 1;
        self.total.record(stats.total_us);
        self.commands.record(stats.commands_us);
        self.physics.record(stats.physics_us);
        self.render.record(stats.render_us);
        self.commands_applied += stats.commands_applied as u64;
        self.peak_instances = self.peak_instances.max(stats.instances);
        if stats.total_us > budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Average frames per second from the mean frame time.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.total.avg_ms(self.frames);
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Fraction of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames as f64
    }

    /// Logs one line for the whole frame and one per phase.
    pub fn log_summary(&self) {
        if self.frames == 0 {
            tracing::info!("no frames recorded");
            return;
        }
        tracing::info!(
            frames = self.frames,
            avg_fps = self.avg_fps(),
            over_budget_pct = self.over_budget_ratio() * 100.0,
            commands_applied = self.commands_applied,
            peak_instances = self.peak_instances,
            "frame summary"
        );
        for (phase, timing) in [
            ("frame", &self.total),
            ("commands", &self.commands),
            ("physics", &self.physics),
            ("render", &self.render),
        ] {
            tracing::info!(
                phase,
                avg_ms = timing.avg_ms(self.frames),
                min_us = timing.min_us,
                max_us = timing.max_us,
                "phase timing"
            );
        }
    }
}
