//! Droplet spawn strategies

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::heightfield::WorldRect;
use super::particle::Particle;
use super::rng::{gaussian, unit_open_low};
use crate::consts::{SPAWN_BOX_FRACTION, SPAWN_HEIGHT, SPAWN_VELOCITY_SIGMA};

/// Inputs a spawner needs from the engine
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub rect: WorldRect,
    pub max_volume: f32,
}

/// Where new droplets appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Spawner {
    /// Anywhere over the whole world rectangle
    #[default]
    WorldUniform,
    /// Inside a centered box covering half of each world axis
    BoxUniform,
}

impl Spawner {
    pub const ALL: [Spawner; 2] = [Spawner::WorldUniform, Spawner::BoxUniform];

    pub fn as_str(&self) -> &'static str {
        match self {
            Spawner::WorldUniform => "World",
            Spawner::BoxUniform => "Box",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "world" | "worlduniform" => Some(Spawner::WorldUniform),
            "box" | "boxuniform" => Some(Spawner::BoxUniform),
            _ => None,
        }
    }

    /// Region this variant draws positions from
    pub fn region(&self, world: &WorldRect) -> WorldRect {
        match self {
            Spawner::WorldUniform => *world,
            Spawner::BoxUniform => world.scaled_about_center(SPAWN_BOX_FRACTION),
        }
    }

    /// Build a new droplet
    ///
    /// Volume is uniform in `(0, max_volume]`. Velocity points straight down
    /// with a little Gaussian jitter on the horizontal axes. The droplet starts
    /// at a nominal height and is snapped onto the terrain on its first tick.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R, ctx: &SpawnContext) -> Particle {
        let volume = ctx.max_volume * unit_open_low(rng);

        let jitter = Vec2::new(gaussian(rng), gaussian(rng)) * SPAWN_VELOCITY_SIGMA;
        let velocity = jitter.extend(-1.0);

        let region = self.region(&ctx.rect);
        let u = Vec2::new(rng.random::<f32>(), rng.random::<f32>());
        let ground = region.origin + u * region.extent;
        let position = Vec3::new(ground.x, ground.y, SPAWN_HEIGHT);

        Particle::new(position, velocity, volume)
    }
}
