//! Droplet Erosion - particle-based hydraulic erosion of a heightfield
//!
//! Core modules:
//! - `sim`: Steppable simulation (heightfield, particle pool, spawners, per-tick physics)
//! - `settings`: Hot-swappable erosion parameters
//! - `error`: Error taxonomy
//!
//! Rendering, windowing and GUI live in the host application. The host reads
//! `HeightField::heights()` and `ParticleRegistry::iter()` between steps.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ErosionError, Result};
pub use settings::ErosionParams;
pub use sim::{
    EngineConfig, ErosionEngine, ErosionStats, HeightField, HeightFieldModel, Particle,
    ParticleId, ParticlePool, ParticleRegistry, SlotHandle, Spawner, WorldRect,
};

/// Simulation constants
pub mod consts {
    /// Default frame timestep used by the headless driver (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Terrain at or below this height counts as bedrock; particles landing there are culled
    pub const MIN_TERRAIN_HEIGHT: f32 = 1e-4;
    /// Gradient magnitude below which a particle is considered stuck on a plateau
    pub const MIN_GRADIENT: f32 = 1e-6;

    /// Standard deviation of the horizontal spawn velocity noise
    pub const SPAWN_VELOCITY_SIGMA: f32 = 0.05;
    /// Nominal spawn height (snapped to the surface on the first tick)
    pub const SPAWN_HEIGHT: f32 = 10.0;
    /// Fraction of each world axis covered by the box spawner, centered
    pub const SPAWN_BOX_FRACTION: f32 = 0.5;

    /// Weight of the previous estimate in the smoothed step duration
    pub const STEP_TIME_SMOOTHING: f32 = 0.95;

    /// Scale of the random erosion applied when mass transfer is disabled
    pub const SIMPLE_EROSION_SCALE: f32 = 0.01;
}
