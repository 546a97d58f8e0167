//! Erosion simulation module
//!
//! Everything that touches terrain or particles lives here. The module is pure
//! and single-threaded:
//! - Seeded RNG only
//! - Stable iteration order (by particle ID)
//! - No rendering or platform dependencies

pub mod heightfield;
pub mod model;
pub mod particle;
pub mod pool;
pub mod registry;
pub mod rng;
pub mod spawner;
pub mod state;
pub mod tick;

pub use heightfield::{HeightField, WorldRect};
pub use model::HeightFieldModel;
pub use particle::Particle;
pub use pool::{ParticlePool, SlotHandle};
pub use registry::{ParticleId, ParticleRegistry};
pub use rng::{RngState, gaussian};
pub use spawner::{SpawnContext, Spawner};
pub use state::{EngineConfig, ErosionEngine, ErosionStats, KillReason};
