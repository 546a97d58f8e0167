//! Fluid droplet state

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A droplet moving over the terrain
///
/// X/Y are the ground plane; Z is elevation. Ground physics only reads and
/// writes the horizontal components. Z holds the spawn height until the first
/// tick snaps the droplet onto the surface, and tracks the surface after that.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Water volume; mass is `volume * density`
    pub volume: f32,
    /// Dissolved material currently carried
    pub sediment: f32,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3, volume: f32) -> Self {
        Self {
            position,
            velocity,
            volume,
            sediment: 0.0,
        }
    }

    #[inline]
    pub fn ground_position(&self) -> Vec2 {
        self.position.truncate()
    }

    #[inline]
    pub fn ground_velocity(&self) -> Vec2 {
        self.velocity.truncate()
    }

    #[inline]
    pub fn mass(&self, density: f32) -> f32 {
        self.volume * density
    }

    /// Elevation the renderer should draw the droplet at
    #[inline]
    pub fn render_height(&self) -> f32 {
        self.position.z
    }
}
