//! Droplet Erosion headless driver
//!
//! Usage: `droplet-erosion [params.json] [frames]`
//!
//! Runs the engine at a fixed frame timestep and logs statistics. Set
//! `RUST_LOG=debug` for per-tick output.

use droplet_erosion::consts::FRAME_DT;
use droplet_erosion::{EngineConfig, ErosionEngine, ErosionParams};

/// Frames simulated when no count is given
const DEFAULT_FRAMES: u64 = 600;
/// Log a summary every this many frames
const REPORT_INTERVAL: u64 = 60;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> droplet_erosion::Result<()> {
    let mut args = std::env::args().skip(1);

    let params = match args.next() {
        Some(path) => ErosionParams::load(&path)?,
        None => ErosionParams::default(),
    };
    let frames = match args.next() {
        Some(n) => n.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring frame count {n:?}, using {DEFAULT_FRAMES}");
            DEFAULT_FRAMES
        }),
        None => DEFAULT_FRAMES,
    };

    let mut engine = ErosionEngine::new(EngineConfig {
        params,
        ..Default::default()
    })?;
    let initial_material = engine.field().total_height();

    for frame in 1..=frames {
        engine.step(FRAME_DT)?;

        if frame % REPORT_INTERVAL == 0 {
            let stats = engine.stats();
            log::info!(
                "frame {frame}: live={} spawned={} killed={} (oob {}, bare {}, stuck {}, dry {}) step={:.3} ms",
                stats.active,
                stats.spawned_total,
                stats.killed_total,
                stats.killed_out_of_bounds,
                stats.killed_bottomed_out,
                stats.killed_stuck,
                stats.killed_evaporated,
                stats.step_time_ms
            );
        }
    }

    let field = engine.field();
    log::info!(
        "Done after {frames} frames: height range {:.3}..{:.3}, material {:.1} -> {:.1}, pool slots {}",
        field.min_height(),
        field.max_height(),
        initial_material,
        field.total_height(),
        engine.particles().pool().capacity()
    );
    Ok(())
}
