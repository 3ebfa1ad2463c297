use crate::commands::SimCommand;
use crate::render::RenderFrame;
use crate::simulation::Simulation;
use crossbeam::channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

pub mod simulation_loop;

pub use simulation_loop::{run_simulation_loop, LoopOptions, SharedState};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to start the simulation thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("simulation thread panicked")]
    Panicked,
}

/// Owner-side handle to a simulation running on its own thread.
pub struct SimulationHandle {
    tx: Sender<SimCommand>,
    shared: SharedState,
    thread: JoinHandle<Simulation>,
}

impl SimulationHandle {
    pub fn sender(&self) -> Sender<SimCommand> {
        self.tx.clone()
    }

    /// Send a command. Returns false if the loop has already stopped.
    pub fn send(&self, cmd: SimCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    /// Copy of the most recently published frame.
    pub fn latest_frame(&self) -> RenderFrame {
        self.shared.frame.lock().clone()
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Drop this handle's sender and wait for the loop to stop. A loop without
    /// a tick limit stops once every sender is gone.
    pub fn join(self) -> Result<Simulation, AppError> {
        let Self { tx, thread, .. } = self;
        drop(tx);
        thread.join().map_err(|_| AppError::Panicked)
    }

    /// Stop the loop and hand back the simulation.
    pub fn shutdown(self) -> Result<Simulation, AppError> {
        // The loop may already have stopped; the join below still collects it.
        let _ = self.tx.send(SimCommand::Shutdown);
        self.join()
    }
}

/// Start `simulation` on a new thread with no tick limit.
pub fn spawn(simulation: Simulation) -> Result<SimulationHandle, AppError> {
    spawn_with(simulation, LoopOptions::default())
}

pub fn spawn_with(simulation: Simulation, options: LoopOptions) -> Result<SimulationHandle, AppError> {
    let (tx, rx) = unbounded();
    let shared = SharedState {
        frame: Arc::new(Mutex::new(RenderFrame::default())),
        paused: Arc::new(AtomicBool::new(false)),
    };
    let loop_shared = shared.clone();
    let thread = std::thread::Builder::new()
        .name("simulation".into())
        .spawn(move || run_simulation_loop(rx, simulation, loop_shared, options))?;
    Ok(SimulationHandle { tx, shared, thread })
}
