//! Heightfield grid over a rectangular world region
//!
//! Cells are stored row-major: `index = row * cols + col`, rows along world Y,
//! columns along world X. Grid topology is fixed at construction; only the
//! height values change afterwards.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::model::HeightFieldModel;
use crate::error::{ErosionError, Result};

/// Axis-aligned world rectangle (lower-left origin + extent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub origin: Vec2,
    pub extent: Vec2,
}

impl WorldRect {
    pub fn new(origin: Vec2, extent: Vec2) -> Self {
        Self { origin, extent }
    }

    /// Rectangle anchored at the world origin
    pub fn from_extent(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Upper-right corner (exclusive)
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.origin + self.extent
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.extent * 0.5
    }

    /// Half-open containment: lower-left edges inside, upper-right edges outside
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// Same-sized rectangle scaled about the center
    pub fn scaled_about_center(&self, fraction: f32) -> Self {
        let extent = self.extent * fraction;
        Self::new(self.center() - extent * 0.5, extent)
    }
}

/// Owned 2-D grid of terrain heights
#[derive(Debug, Clone)]
pub struct HeightField {
    rows: usize,
    cols: usize,
    cell_size: f32,
    rect: WorldRect,
    heights: Vec<f32>,
}

impl HeightField {
    /// Allocate a `rows x cols` grid over `rect` and populate it from `model`
    ///
    /// Rows and columns are `floor(extent / cell_size)`; any leftover strip on
    /// the upper/right side is not covered by a cell.
    pub fn new(model: HeightFieldModel, rect: WorldRect, cell_size: f32) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ErosionError::InvalidGeometry(format!(
                "cell size must be positive and finite, got {cell_size}"
            )));
        }
        if !rect.origin.is_finite() || !rect.extent.is_finite() {
            return Err(ErosionError::InvalidGeometry(
                "world rectangle must be finite".to_string(),
            ));
        }

        let rows = (rect.extent.y / cell_size).floor().max(0.0) as usize;
        let cols = (rect.extent.x / cell_size).floor().max(0.0) as usize;
        if rows == 0 || cols == 0 {
            return Err(ErosionError::InvalidGeometry(format!(
                "{}x{} world with cell size {} yields an empty grid",
                rect.extent.x, rect.extent.y, cell_size
            )));
        }

        let len = rows.checked_mul(cols).ok_or_else(|| {
            ErosionError::InvalidGeometry(format!("{rows}x{cols} grid overflows usize"))
        })?;

        let mut heights = Vec::new();
        heights.try_reserve_exact(len)?;
        heights.resize(len, 0.0);

        let mut field = Self {
            rows,
            cols,
            cell_size,
            rect,
            heights,
        };
        field.remap(model);
        Ok(field)
    }

    /// Re-evaluate every cell center under `model`, keeping the geometry
    pub fn remap(&mut self, model: HeightFieldModel) {
        let rect = self.rect;
        for index in 0..self.heights.len() {
            let center = self.cell_center(index);
            self.heights[index] = model.evaluate(center, &rect);
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec2 {
        self.rect.origin
    }

    pub fn rect(&self) -> &WorldRect {
        &self.rect
    }

    /// Row-major height array (for mesh generation)
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Map a world-space point to its row-major cell index
    ///
    /// Bounds are half-open: the lower-left corner maps to cell 0 and
    /// `origin + cols * cell_size` is already outside.
    pub fn cell_index_of(&self, p: Vec2) -> Option<usize> {
        let local = (p - self.rect.origin) / self.cell_size;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let col = local.x.floor() as usize;
        let row = local.y.floor() as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    /// World-space center of the cell at `index`
    pub fn cell_center(&self, index: usize) -> Vec2 {
        let row = index / self.cols;
        let col = index % self.cols;
        self.rect.origin
            + Vec2::new(
                (col as f32 + 0.5) * self.cell_size,
                (row as f32 + 0.5) * self.cell_size,
            )
    }

    /// Height at a world point; 0 outside the grid
    pub fn height_at(&self, p: Vec2) -> f32 {
        self.cell_index_of(p).map_or(0.0, |i| self.heights[i])
    }

    /// Height of a cell by index
    #[inline]
    pub fn height(&self, index: usize) -> f32 {
        self.heights[index]
    }

    /// Overwrite a cell, clamping at 0
    #[inline]
    pub fn set_height(&mut self, index: usize, height: f32) {
        self.heights[index] = height.max(0.0);
    }

    /// Remove `amount` of material from a cell (negative adds), clamping at 0
    #[inline]
    pub fn erode(&mut self, index: usize, amount: f32) {
        let h = &mut self.heights[index];
        *h = (*h - amount).max(0.0);
    }

    /// Central-difference surface gradient at `(x, y)`
    ///
    /// Neighbors outside the grid read as height 0, so the field behaves as if
    /// it were surrounded by a cliff. The vertical component is always 0.
    pub fn surface_gradient(&self, x: f32, y: f32) -> Vec3 {
        let s = self.cell_size;
        let h = |dx: f32, dy: f32| self.height_at(Vec2::new(x + dx, y + dy));
        let gx = (h(s, 0.0) - h(-s, 0.0)) / (2.0 * s);
        let gy = (h(0.0, s) - h(0.0, -s)) / (2.0 * s);
        Vec3::new(gx, gy, 0.0)
    }

    pub fn min_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Sum of all cell heights (total terrain material)
    pub fn total_height(&self) -> f64 {
        self.heights.iter().map(|&h| h as f64).sum()
    }
}
