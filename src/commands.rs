// commands.rs
// Handles processing of SimCommand messages for the simulation

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::carrier::Species;
use crate::io::{load_state, save_state, SaveFormat};
use crate::lattice::Dopant;
use crate::simulation::Simulation;

#[derive(Clone, Debug, PartialEq)]
pub enum SimCommand {
    /// Drop a dopant at pixel `(x, y)`.
    PlaceDopant { dopant: Dopant, x: f32, y: f32 },
    /// Create a free carrier at region-normalised `(ux, uy)`.
    SpawnCarrier { species: Species, region: usize, ux: f32, uy: f32 },
    Reset,
    Resize { width: f32, height: f32 },
    StepOnce,
    SetPaused(bool),
    SaveState { path: PathBuf, format: SaveFormat, compress: bool },
    LoadState { path: PathBuf },
    Shutdown,
}

/// Apply one command. Breaks when the loop should stop.
pub fn process_command(cmd: SimCommand, simulation: &mut Simulation, paused: &AtomicBool) -> ControlFlow<()> {
    match cmd {
        SimCommand::PlaceDopant { dopant, x, y } => {
            handle_place_dopant(simulation, dopant, x, y);
        }

        SimCommand::SpawnCarrier { species, region, ux, uy } => {
            handle_spawn_carrier(simulation, species, region, ux, uy);
        }

        SimCommand::Reset => {
            simulation.reset();
        }

        SimCommand::Resize { width, height } => {
            handle_resize(simulation, width, height);
        }

        // Step manually and leave the loop paused
        SimCommand::StepOnce => {
            simulation.step();
            paused.store(true, Ordering::Relaxed);
        }

        SimCommand::SetPaused(value) => {
            paused.store(value, Ordering::Relaxed);
            debug!(paused = value, "pause state changed");
        }

        SimCommand::SaveState { path, format, compress } => {
            handle_save_state(simulation, path, format, compress);
        }

        SimCommand::LoadState { path } => {
            handle_load_state(simulation, path);
        }

        SimCommand::Shutdown => {
            info!(tick = simulation.tick, "shutdown requested");
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

fn handle_place_dopant(simulation: &mut Simulation, dopant: Dopant, x: f32, y: f32) {
    match simulation.place_dopant(dopant, x, y) {
        Some(species) => debug!(%dopant, x, y, ?species, "dopant released a carrier"),
        None => debug!(%dopant, x, y, "dopant placed without a new carrier"),
    }
}

fn handle_spawn_carrier(simulation: &mut Simulation, species: Species, region: usize, ux: f32, uy: f32) {
    if let Err(err) = simulation.spawn_carrier(species, region, ux, uy) {
        warn!(%err, ?species, "spawn rejected");
    }
}

fn handle_resize(simulation: &mut Simulation, width: f32, height: f32) {
    if let Err(err) = simulation.resize(width, height) {
        warn!(%err, width, height, "resize rejected; keeping previous layout");
    }
}

fn handle_save_state(simulation: &Simulation, path: PathBuf, format: SaveFormat, compress: bool) {
    if let Err(err) = save_state(&path, simulation, format, compress) {
        error!(%err, path = %path.display(), "failed to save state");
    }
}

fn handle_load_state(simulation: &mut Simulation, path: PathBuf) {
    let result = load_state(&path).and_then(|state| state.apply_to(simulation));
    match result {
        Ok(()) => info!(path = %path.display(), tick = simulation.tick, "state restored"),
        Err(err) => error!(%err, path = %path.display(), "failed to load state"),
    }
}
