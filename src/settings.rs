//! Erosion parameters
//!
//! Every knob a settings panel can turn. The engine reads these once per step,
//! so any change made between steps takes effect on the next one.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErosionError, Result};
use crate::sim::{HeightFieldModel, Spawner};

/// Tunable physical and control parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    // === Spawning ===
    /// New droplets created per step
    pub spawn_per_tick: u32,
    /// Upper bound of the uniform spawn volume
    pub max_spawn_volume: f32,
    /// Active spawn strategy
    pub spawner: Spawner,

    // === Motion ===
    /// Fluid density (mass = volume * density)
    pub density: f32,
    /// Velocity damping per unit time
    pub friction: f32,
    /// Scale of the Gaussian velocity noise modelling surface roughness
    pub roughness: f32,

    // === Mass transfer ===
    /// Rate at which excess sediment settles out
    pub deposition_rate: f32,
    /// Rate at which the droplet picks up material below capacity
    pub dissolution_rate: f32,
    /// Fraction of volume lost per unit time
    pub evaporation_rate: f32,
    /// Droplets below this volume are culled
    pub min_volume: f32,
    /// Capacity-based sediment exchange; when off, droplets just scrape the terrain
    pub mass_transfer: bool,

    // === Control ===
    /// Skip physics (configuration changes still apply)
    pub paused: bool,
    /// Requested terrain shape; changing it resets the simulation
    pub model: HeightFieldModel,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            spawn_per_tick: 64,
            max_spawn_volume: 1.0,
            spawner: Spawner::WorldUniform,

            density: 1.0,
            friction: 0.5,
            roughness: 0.05,

            deposition_rate: 0.5,
            dissolution_rate: 0.5,
            evaporation_rate: 0.5,
            min_volume: 0.01,
            mass_transfer: true,

            paused: false,
            model: HeightFieldModel::Dome,
        }
    }
}

impl ErosionParams {
    /// Check every value against its physical range
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &'static str, v: f32) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(invalid(name, format!("must be positive and finite, got {v}")))
            }
        }
        fn non_negative(name: &'static str, v: f32) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(invalid(name, format!("must be non-negative and finite, got {v}")))
            }
        }

        positive("max_spawn_volume", self.max_spawn_volume)?;
        positive("density", self.density)?;
        non_negative("friction", self.friction)?;
        non_negative("roughness", self.roughness)?;
        non_negative("deposition_rate", self.deposition_rate)?;
        non_negative("dissolution_rate", self.dissolution_rate)?;
        non_negative("evaporation_rate", self.evaporation_rate)?;
        non_negative("min_volume", self.min_volume)?;
        if self.min_volume >= self.max_spawn_volume {
            return Err(invalid(
                "min_volume",
                format!(
                    "{} must be below max_spawn_volume {}",
                    self.min_volume, self.max_spawn_volume
                ),
            ));
        }
        Ok(())
    }

    /// Parse and validate parameters from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        if let Err(e) = params.validate() {
            log::warn!("Rejected erosion parameters: {e}");
            return Err(e);
        }
        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let params = Self::from_json(&json)?;
        log::info!("Loaded erosion parameters from {}", path.display());
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(name: &'static str, reason: String) -> ErosionError {
    ErosionError::InvalidParams { name, reason }
}
