//! Procedural terrain shapes used to (re)initialize a heightfield
//!
//! Every model is a pure function of the cell center and the world rectangle.
//! All shapes are scaled to the rectangle so the same model works for any
//! world size. Heights are never negative.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::heightfield::WorldRect;

/// Fraction of the half-extent covered by the flat top of [`HeightFieldModel::Block`]
const BLOCK_HALF_FRACTION: f32 = 0.8;

/// Initial terrain shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeightFieldModel {
    /// Spherical cap centered in the world, radius = half the shorter side
    #[default]
    Dome,
    /// Half-ellipsoid stretched to fill the world rectangle
    EllipsoidDome,
    /// Tent-shaped ridge running along Y through the center
    Ridge,
    /// Four-sided pyramid with its base on the world rectangle
    Pyramid,
    /// Flat-topped plateau with vertical walls
    Block,
}

impl HeightFieldModel {
    pub const ALL: [HeightFieldModel; 5] = [
        HeightFieldModel::Dome,
        HeightFieldModel::EllipsoidDome,
        HeightFieldModel::Ridge,
        HeightFieldModel::Pyramid,
        HeightFieldModel::Block,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeightFieldModel::Dome => "Dome",
            HeightFieldModel::EllipsoidDome => "Ellipsoid Dome",
            HeightFieldModel::Ridge => "Ridge",
            HeightFieldModel::Pyramid => "Pyramid",
            HeightFieldModel::Block => "Block",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "dome" => Some(HeightFieldModel::Dome),
            "ellipsoiddome" | "ellipsoid" => Some(HeightFieldModel::EllipsoidDome),
            "ridge" => Some(HeightFieldModel::Ridge),
            "pyramid" => Some(HeightFieldModel::Pyramid),
            "block" => Some(HeightFieldModel::Block),
            _ => None,
        }
    }

    /// Height of the terrain at world point `p`
    pub fn evaluate(&self, p: Vec2, rect: &WorldRect) -> f32 {
        let half = rect.extent * 0.5;
        let d = p - rect.center();
        let peak = half.min_element();
        if peak <= 0.0 {
            return 0.0;
        }

        match self {
            HeightFieldModel::Dome => {
                let radicand = peak * peak - d.length_squared();
                if radicand > 0.0 { radicand.sqrt() } else { 0.0 }
            }
            HeightFieldModel::EllipsoidDome => {
                let n = d / half;
                let radicand = 1.0 - n.length_squared();
                if radicand > 0.0 { peak * radicand.sqrt() } else { 0.0 }
            }
            HeightFieldModel::Ridge => {
                let across = (1.0 - d.x.abs() / half.x).max(0.0);
                // Crest sags toward both ends
                let along = 0.75 + 0.25 * (std::f32::consts::PI * d.y / half.y).cos();
                peak * across * along
            }
            HeightFieldModel::Pyramid => {
                let n = (d / half).abs();
                peak * (1.0 - n.max_element()).max(0.0)
            }
            HeightFieldModel::Block => {
                let n = (d / half).abs();
                if n.max_element() < BLOCK_HALF_FRACTION {
                    peak * 0.5
                } else {
                    0.0
                }
            }
        }
    }
}
