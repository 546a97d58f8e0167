//! Per-frame erosion step
//!
//! One call runs a single physical sub-step: spawn, advance every droplet,
//! exchange material with the terrain, evaporate, then cull. Droplets don't
//! interact, so a single sub-step per frame converges to the same long-run
//! shape as several smaller ones.
//!
//! Terrain edits commit immediately, so a droplet later in the pass sees the
//! terrain already changed by earlier ones. The pass runs in ascending ID order,
//! which keeps a seeded run reproducible.

use std::time::Instant;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::heightfield::HeightField;
use super::particle::Particle;
use super::rng::gaussian;
use super::spawner::SpawnContext;
use super::state::{ErosionEngine, KillReason};
use crate::consts::*;
use crate::error::Result;
use crate::settings::ErosionParams;

impl ErosionEngine {
    /// Advance the simulation by `dt`
    ///
    /// A pending model change is applied first, even while paused. A paused
    /// engine otherwise leaves terrain, droplets and statistics untouched.
    ///
    /// Allocation failure aborts the step early; whatever was committed before
    /// the failure stays consistent.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if self.params.model != self.active_model {
            self.reset();
        }
        if self.params.paused {
            return Ok(());
        }

        let started = Instant::now();

        let spawned = self.spawn_particles()?;
        self.advance(dt)?;
        let culled = self.cull();

        self.stats.active = self.particles.count();
        self.stats.ticks += 1;
        let elapsed_ms = started.elapsed().as_secs_f32() * 1000.0;
        self.stats.step_time_ms = STEP_TIME_SMOOTHING * self.stats.step_time_ms
            + (1.0 - STEP_TIME_SMOOTHING) * elapsed_ms;

        log::debug!(
            "tick {}: +{} -{} live={} ({:.3} ms)",
            self.stats.ticks,
            spawned,
            culled,
            self.stats.active,
            self.stats.step_time_ms
        );
        Ok(())
    }

    fn spawn_particles(&mut self) -> Result<u32> {
        let ctx = SpawnContext {
            rect: *self.field.rect(),
            max_volume: self.params.max_spawn_volume,
        };
        let spawner = self.params.spawner;

        for _ in 0..self.params.spawn_per_tick {
            let (_, slot) = self.particles.spawn()?;
            *slot = spawner.spawn(&mut self.rng, &ctx);
            self.stats.spawned_total += 1;
        }
        Ok(self.params.spawn_per_tick)
    }

    /// Move every live droplet once, collecting the ones to cull
    fn advance(&mut self, dt: f32) -> Result<()> {
        self.particles.ids_into(&mut self.ids)?;
        self.doomed.clear();
        // Every droplet can die at most once per pass
        self.doomed.try_reserve(self.ids.len())?;

        for &id in &self.ids {
            let Some(particle) = self.particles.get_mut(id) else {
                continue;
            };
            if let Some(reason) =
                advance_particle(particle, &mut self.field, &mut self.rng, &self.params, dt)
            {
                self.doomed.push((id, reason));
            }
        }
        Ok(())
    }

    /// Remove the droplets marked during the pass
    fn cull(&mut self) -> usize {
        let mut culled = 0;
        for &(id, reason) in &self.doomed {
            if self.particles.remove(id).is_some() {
                self.stats.record_kill(reason);
                culled += 1;
            }
        }
        self.doomed.clear();
        culled
    }
}

/// One physical update for a single droplet
///
/// Returns the reason the droplet has to go, if it does.
fn advance_particle(
    p: &mut Particle,
    field: &mut HeightField,
    rng: &mut Pcg32,
    params: &ErosionParams,
    dt: f32,
) -> Option<KillReason> {
    let start = p.ground_position();
    let Some(source) = field.cell_index_of(start) else {
        return Some(KillReason::OutOfBounds);
    };

    let height_before = field.height(source);
    if height_before <= MIN_TERRAIN_HEIGHT {
        field.set_height(source, 0.0);
        return Some(KillReason::BottomedOut);
    }

    // Ground physics is planar: sit on the surface, no vertical motion
    p.position.z = height_before;
    p.velocity.z = 0.0;

    let gradient = field.surface_gradient(start.x, start.y).truncate();
    if gradient.length() < MIN_GRADIENT {
        return Some(KillReason::Stuck);
    }

    // Downhill acceleration plus roughness noise
    let accel = -gradient / p.mass(params.density);
    let noise = Vec2::new(gaussian(rng), gaussian(rng)) * params.roughness;
    let mut velocity = p.ground_velocity() + dt * (accel + noise);

    let position = start + dt * velocity;
    velocity *= 1.0 - dt * params.friction;
    p.position.x = position.x;
    p.position.y = position.y;
    p.velocity = velocity.extend(0.0);

    let Some(target) = field.cell_index_of(position) else {
        return Some(KillReason::OutOfBounds);
    };

    if params.mass_transfer {
        let height_after = field.height(target);
        let capacity = (p.volume * velocity.length() * (height_before - height_after)).max(0.0);
        let driving_force = capacity - p.sediment;
        let rate = if driving_force < 0.0 {
            params.deposition_rate
        } else {
            params.dissolution_rate
        };
        transfer(p, field, source, dt * rate * driving_force);
    } else {
        let scrape = rng.random::<f32>() * dt * p.volume * SIMPLE_EROSION_SCALE;
        field.erode(target, scrape);
    }
    p.position.z = field.height(target);

    p.volume *= 1.0 - dt * params.evaporation_rate;
    if p.volume < params.min_volume {
        return Some(KillReason::Evaporated);
    }
    None
}

/// Move `amount` of material from the terrain cell into the droplet
///
/// Positive amounts dissolve (terrain drops, sediment grows); negative amounts
/// deposit (sediment shrinks, terrain rises). Terrain change scales with volume.
/// The amount is limited to what the droplet carries or the cell holds, so the
/// terrain change always matches the sediment change.
fn transfer(p: &mut Particle, field: &mut HeightField, cell: usize, amount: f32) {
    let amount = if amount < 0.0 {
        amount.max(-p.sediment)
    } else {
        amount.min(field.height(cell) / p.volume)
    };
    p.sediment = (p.sediment + amount).max(0.0);
    field.erode(cell, amount * p.volume);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EngineConfig, ErosionStats, HeightFieldModel, WorldRect};
    use glam::Vec3;

    fn engine(model: HeightFieldModel, spawn_per_tick: u32) -> ErosionEngine {
        ErosionEngine::new(EngineConfig {
            rect: WorldRect::from_extent(32.0, 32.0),
            cell_size: 1.0,
            seed: 12345,
            params: ErosionParams {
                model,
                spawn_per_tick,
                ..Default::default()
            },
        })
        .unwrap()
    }

    fn small_dome() -> ErosionEngine {
        ErosionEngine::new(EngineConfig {
            rect: WorldRect::from_extent(10.0, 10.0),
            cell_size: 1.0,
            seed: 1,
            params: ErosionParams {
                spawn_per_tick: 0,
                roughness: 0.0,
                ..Default::default()
            },
        })
        .unwrap()
    }

    fn droplet(x: f32, y: f32, velocity: Vec2, volume: f32) -> Particle {
        Particle::new(Vec3::new(x, y, SPAWN_HEIGHT), velocity.extend(0.0), volume)
    }

    #[test]
    fn test_step_spawns_and_accounts() {
        let mut engine = engine(HeightFieldModel::Dome, 10);
        engine.step(FRAME_DT).unwrap();
        let stats = engine.stats().clone();
        assert_eq!(stats.spawned_total, 10);
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.active as u64 + stats.killed_total, 10);
        assert_eq!(stats.active, engine.particles().count());
        assert_eq!(
            stats.killed_total,
            stats.killed_out_of_bounds
                + stats.killed_bottomed_out
                + stats.killed_stuck
                + stats.killed_evaporated
        );
    }

    #[test]
    fn test_paused_step_is_noop() {
        let mut engine = engine(HeightFieldModel::Dome, 20);
        for _ in 0..5 {
            engine.step(0.5).unwrap();
        }
        let heights = engine.field().heights().to_vec();
        let count = engine.particles().count();
        let stats = engine.stats().clone();

        engine.params_mut().paused = true;
        for _ in 0..5 {
            engine.step(0.5).unwrap();
        }
        assert_eq!(engine.field().heights(), heights.as_slice());
        assert_eq!(engine.particles().count(), count);
        assert_eq!(engine.stats(), &stats);

        engine.params_mut().paused = false;
        engine.step(0.5).unwrap();
        assert_eq!(engine.stats().ticks, stats.ticks + 1);
    }

    #[test]
    fn test_mass_transfer_disabled_keeps_sediment_zero() {
        let mut engine = engine(HeightFieldModel::Pyramid, 50);
        engine.params_mut().mass_transfer = false;
        let before = engine.field().total_height();
        for _ in 0..40 {
            engine.step(0.5).unwrap();
            assert!(engine.particles().iter().all(|(_, p)| p.sediment == 0.0));
        }
        // Scraping only ever removes material
        assert!(engine.field().total_height() < before);
    }

    #[test]
    fn test_mass_transfer_reshapes_terrain() {
        let mut engine = engine(HeightFieldModel::Dome, 50);
        let initial = engine.field().heights().to_vec();
        for _ in 0..40 {
            engine.step(1.0).unwrap();
        }
        assert_ne!(engine.field().heights(), initial.as_slice());
        assert!(engine.field().heights().iter().all(|&h| h >= 0.0 && h.is_finite()));
    }

    #[test]
    fn test_leaving_bounds_culls_same_step() {
        let mut engine = small_dome();
        let id = engine.inject(droplet(9.5, 5.5, Vec2::new(1000.0, 0.0), 1.0)).unwrap();

        engine.step(0.1).unwrap();
        assert!(engine.particles().get(id).is_none());
        assert_eq!(engine.stats().killed_out_of_bounds, 1);
        assert_eq!(engine.stats().active, 0);
    }

    #[test]
    fn test_outside_at_start_culled() {
        let mut engine = small_dome();
        let heights = engine.field().heights().to_vec();
        engine.inject(droplet(-5.0, -5.0, Vec2::ZERO, 1.0)).unwrap();

        engine.step(0.1).unwrap();
        assert_eq!(engine.particles().count(), 0);
        assert_eq!(engine.stats().killed_out_of_bounds, 1);
        assert_eq!(engine.field().heights(), heights.as_slice());
    }

    #[test]
    fn test_bottomed_out_culled() {
        let mut engine = small_dome();
        // Dome corners are bare
        let corner = engine.field().cell_index_of(Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(engine.field().height(corner), 0.0);
        engine.inject(droplet(0.5, 0.5, Vec2::ZERO, 1.0)).unwrap();

        engine.step(0.1).unwrap();
        assert_eq!(engine.stats().killed_bottomed_out, 1);
        assert_eq!(engine.field().height(corner), 0.0);
    }

    #[test]
    fn test_plateau_droplet_is_stuck() {
        let mut engine = small_dome();
        engine.params_mut().model = HeightFieldModel::Block;
        engine.step(0.1).unwrap();
        assert_eq!(engine.active_model(), HeightFieldModel::Block);

        engine.inject(droplet(5.5, 5.5, Vec2::ZERO, 1.0)).unwrap();
        engine.step(0.1).unwrap();
        assert_eq!(engine.stats().killed_stuck, 1);
    }

    #[test]
    fn test_evaporation_culls() {
        let mut engine = small_dome();
        engine.params_mut().density = 1000.0;
        engine.params_mut().evaporation_rate = 1.9;
        let id = engine.inject(droplet(6.5, 5.5, Vec2::ZERO, 0.02)).unwrap();

        engine.step(0.5).unwrap();
        assert!(engine.particles().get(id).is_none());
        assert_eq!(engine.stats().killed_evaporated, 1);
    }

    #[test]
    fn test_survivor_is_snapped_and_evaporates() {
        let mut engine = small_dome();
        let id = engine.inject(droplet(6.5, 5.5, Vec2::ZERO, 1.0)).unwrap();

        engine.step(0.1).unwrap();
        let p = engine.particles().get(id).unwrap();
        assert!(p.volume < 1.0);
        assert_eq!(p.velocity.z, 0.0);
        assert_eq!(p.render_height(), engine.field().height_at(p.ground_position()));
        // Downhill from (6.5, 5.5) on a centered dome is +X
        assert!(p.position.x > 6.5);
    }

    #[test]
    fn test_model_change_resets() {
        let mut engine = engine(HeightFieldModel::Dome, 30);
        for _ in 0..10 {
            engine.step(0.5).unwrap();
        }
        assert!(engine.stats().ticks > 0);

        engine.params_mut().model = HeightFieldModel::Pyramid;
        engine.params_mut().paused = true;
        engine.step(0.5).unwrap();

        let rect = *engine.field().rect();
        let fresh = HeightField::new(HeightFieldModel::Pyramid, rect, 1.0).unwrap();
        assert_eq!(engine.field().heights(), fresh.heights());
        assert_eq!(engine.particles().count(), 0);
        assert_eq!(engine.stats(), &ErosionStats::default());
        assert_eq!(engine.active_model(), HeightFieldModel::Pyramid);
    }

    #[test]
    fn test_determinism() {
        let mut a = engine(HeightFieldModel::Ridge, 40);
        let mut b = engine(HeightFieldModel::Ridge, 40);
        for _ in 0..30 {
            a.step(0.5).unwrap();
            b.step(0.5).unwrap();
        }
        let bits = |e: &ErosionEngine| {
            e.field().heights().iter().map(|h| h.to_bits()).collect::<Vec<_>>()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.particles().count(), b.particles().count());
        assert_eq!(a.stats().killed_total, b.stats().killed_total);
    }

    #[test]
    fn test_transfer_signs() {
        let mut field = HeightField::new(
            HeightFieldModel::Block,
            WorldRect::from_extent(4.0, 4.0),
            1.0,
        )
        .unwrap();
        field.set_height(0, 1.0);
        let mut p = droplet(0.5, 0.5, Vec2::ZERO, 2.0);

        // Dissolve: terrain drops by amount * volume, sediment grows by amount
        transfer(&mut p, &mut field, 0, 0.1);
        assert!((field.height(0) - 0.8).abs() < 1e-6);
        assert!((p.sediment - 0.1).abs() < 1e-6);

        // Deposit: terrain rises, sediment shrinks
        transfer(&mut p, &mut field, 0, -0.05);
        assert!((field.height(0) - 0.9).abs() < 1e-6);
        assert!((p.sediment - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_transfer_limited_to_available_material() {
        let mut field = HeightField::new(
            HeightFieldModel::Block,
            WorldRect::from_extent(4.0, 4.0),
            1.0,
        )
        .unwrap();
        field.set_height(0, 1.0);

        // Deposit more than the droplet carries: only the carried sediment lands
        let mut p = droplet(0.5, 0.5, Vec2::ZERO, 2.0);
        p.sediment = 0.1;
        transfer(&mut p, &mut field, 0, -5.0);
        assert_eq!(p.sediment, 0.0);
        assert!((field.height(0) - 1.2).abs() < 1e-6);

        // Dissolve more than the cell holds: sediment grows by what was removed
        field.set_height(0, 0.1);
        transfer(&mut p, &mut field, 0, 1.0);
        assert_eq!(field.height(0), 0.0);
        assert!((p.sediment - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_fast_deposition_does_not_create_material() {
        let mut engine = small_dome();
        engine.params_mut().deposition_rate = 50.0;
        let mut carrier = droplet(6.5, 5.5, Vec2::ZERO, 1.0);
        carrier.sediment = 0.1;
        let id = engine.inject(carrier).unwrap();
        let before = engine.field().total_height();

        engine.step(0.5).unwrap();
        let gained = engine.field().total_height() - before;
        assert!(gained <= 0.1 * carrier.volume as f64 + 1e-5, "terrain gained {gained}");
        assert!(gained > 0.0);
        assert_eq!(engine.particles().get(id).unwrap().sediment, 0.0);
    }
}
