//! Engine state and statistics
//!
//! The engine exclusively owns the heightfield, the particle registry and the
//! random source. Hosts read committed state between steps and change
//! parameters through [`ErosionEngine::params_mut`] or
//! [`ErosionEngine::set_params`]. The per-frame update lives in `tick.rs`.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::heightfield::{HeightField, WorldRect};
use super::model::HeightFieldModel;
use super::particle::Particle;
use super::registry::{ParticleId, ParticleRegistry};
use super::rng::RngState;
use crate::error::Result;
use crate::settings::ErosionParams;

/// Construction-time geometry and seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub rect: WorldRect,
    /// World units per cell edge
    pub cell_size: f32,
    pub seed: u64,
    pub params: ErosionParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rect: WorldRect::new(Vec2::ZERO, Vec2::new(256.0, 256.0)),
            cell_size: 1.0,
            seed: 0,
            params: ErosionParams::default(),
        }
    }
}

/// Why a droplet was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillReason {
    /// Left the world rectangle
    OutOfBounds,
    /// Reached terrain worn down to (near) zero
    BottomedOut,
    /// Sitting on a plateau with no slope to follow
    Stuck,
    /// Volume dropped below the minimum
    Evaporated,
}

/// Observability counters, updated once per running step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErosionStats {
    /// Live droplets after the last step
    pub active: usize,
    pub spawned_total: u64,
    pub killed_total: u64,
    pub killed_out_of_bounds: u64,
    pub killed_bottomed_out: u64,
    pub killed_stuck: u64,
    pub killed_evaporated: u64,
    /// Running steps since the last reset
    pub ticks: u64,
    /// Exponentially smoothed wall-clock duration of a step
    pub step_time_ms: f32,
}

impl ErosionStats {
    pub(crate) fn record_kill(&mut self, reason: KillReason) {
        self.killed_total += 1;
        match reason {
            KillReason::OutOfBounds => self.killed_out_of_bounds += 1,
            KillReason::BottomedOut => self.killed_bottomed_out += 1,
            KillReason::Stuck => self.killed_stuck += 1,
            KillReason::Evaporated => self.killed_evaporated += 1,
        }
    }
}

/// Steppable hydraulic erosion simulation
#[derive(Debug)]
pub struct ErosionEngine {
    pub(super) field: HeightField,
    pub(super) particles: ParticleRegistry,
    pub(super) rng_state: RngState,
    pub(super) rng: Pcg32,
    pub(super) params: ErosionParams,
    /// Model the field currently reflects; differs from `params.model` until the next step
    pub(super) active_model: HeightFieldModel,
    pub(super) stats: ErosionStats,
    /// Scratch: live IDs for the current pass
    pub(super) ids: Vec<ParticleId>,
    /// Scratch: droplets to remove once the pass is over
    pub(super) doomed: Vec<(ParticleId, KillReason)>,
}

impl ErosionEngine {
    /// Build the heightfield and an empty particle population
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.params.validate()?;
        let field = HeightField::new(config.params.model, config.rect, config.cell_size)?;
        log::info!(
            "Erosion engine: {}x{} cells ({} per cell), model {}, seed {}",
            field.cols(),
            field.rows(),
            field.cell_size(),
            config.params.model.as_str(),
            config.seed
        );

        let rng_state = RngState::new(config.seed);
        Ok(Self {
            field,
            particles: ParticleRegistry::new(),
            rng: rng_state.to_rng(),
            rng_state,
            active_model: config.params.model,
            params: config.params,
            stats: ErosionStats::default(),
            ids: Vec::new(),
            doomed: Vec::new(),
        })
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn particles(&self) -> &ParticleRegistry {
        &self.particles
    }

    pub fn stats(&self) -> &ErosionStats {
        &self.stats
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    pub fn params(&self) -> &ErosionParams {
        &self.params
    }

    /// Direct access for live tweaking; values are not validated
    pub fn params_mut(&mut self) -> &mut ErosionParams {
        &mut self.params
    }

    /// Replace all parameters after validating them
    pub fn set_params(&mut self, params: ErosionParams) -> Result<()> {
        if let Err(e) = params.validate() {
            log::warn!("Keeping previous erosion parameters: {e}");
            return Err(e);
        }
        self.params = params;
        Ok(())
    }

    /// Model the heightfield currently reflects
    pub fn active_model(&self) -> HeightFieldModel {
        self.active_model
    }

    /// Remap the terrain under the requested model and drop every droplet
    ///
    /// Statistics start over; particle IDs keep counting.
    pub fn reset(&mut self) {
        let model = self.params.model;
        self.field.remap(model);
        self.active_model = model;
        self.particles.clear();
        self.stats = ErosionStats::default();
        log::info!("Terrain reset to {}", model.as_str());
    }

    /// Add a host-built droplet to the population
    pub fn inject(&mut self, particle: Particle) -> Result<ParticleId> {
        let id = self.particles.insert(particle)?;
        self.stats.spawned_total += 1;
        self.stats.active = self.particles.count();
        Ok(id)
    }
}
