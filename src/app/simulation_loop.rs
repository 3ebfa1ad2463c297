use crate::commands::{self, SimCommand};
use crate::profile_scope;
use crate::render::{render_frame, RenderFrame};
use crate::simulation::Simulation;
use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How long a paused loop blocks waiting for the next command.
const PAUSED_POLL: Duration = Duration::from_millis(5);

#[derive(Clone, Copy, Debug, Default)]
pub struct LoopOptions {
    /// Stop after this many ticks.
    pub tick_limit: Option<u64>,
    /// Log a summary every this many ticks.
    pub summary_every: Option<u64>,
}

/// State shared between the loop thread and its handle.
#[derive(Clone)]
pub struct SharedState {
    pub frame: Arc<Mutex<RenderFrame>>,
    pub paused: Arc<AtomicBool>,
}

pub fn publish(simulation: &Simulation, shared: &SharedState) {
    let frame = render_frame(simulation);
    *shared.frame.lock() = frame;
}

enum Drained {
    Idle,
    Shutdown,
    Disconnected,
}

fn drain_commands(rx: &Receiver<SimCommand>, simulation: &mut Simulation, paused: &AtomicBool) -> Drained {
    loop {
        match rx.try_recv() {
            Ok(cmd) => {
                if commands::process_command(cmd, simulation, paused).is_break() {
                    return Drained::Shutdown;
                }
            }
            Err(TryRecvError::Empty) => return Drained::Idle,
            Err(TryRecvError::Disconnected) => return Drained::Disconnected,
        }
    }
}

/// Run until shutdown, the tick limit, or until every sender is gone while
/// no tick limit is set. Returns the simulation for inspection.
pub fn run_simulation_loop(
    rx: Receiver<SimCommand>,
    mut simulation: Simulation,
    shared: SharedState,
    options: LoopOptions,
) -> Simulation {
    let start_tick = simulation.tick;
    let mut connected = true;
    publish(&simulation, &shared);

    loop {
        if connected {
            match drain_commands(&rx, &mut simulation, &shared.paused) {
                Drained::Idle => {}
                Drained::Shutdown => break,
                Drained::Disconnected if options.tick_limit.is_none() => break,
                Drained::Disconnected => connected = false,
            }
        }

        let ran = simulation.tick - start_tick;
        if options.tick_limit.is_some_and(|limit| ran >= limit) {
            info!(ticks = ran, "tick limit reached");
            break;
        }

        if shared.paused.load(Ordering::Relaxed) {
            // Nobody is left to resume us.
            if !connected {
                break;
            }
            publish(&simulation, &shared);
            match rx.recv_timeout(PAUSED_POLL) {
                Ok(cmd) => {
                    if commands::process_command(cmd, &mut simulation, &shared.paused).is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => connected = false,
            }
            continue;
        }

        let repaired = simulation.sanitize();
        if repaired > 0 {
            error!(repaired, tick = simulation.tick, "found carriers with non-finite state; reset to region centre");
        }

        {
            profile_scope!("simulation_loop");
            simulation.step();
        }
        publish(&simulation, &shared);

        let ran = ran + 1;
        if let Some(every) = options.summary_every.filter(|&n| n > 0) {
            if ran % every == 0 {
                log_summary(&simulation);
            }
        }

        #[cfg(feature = "profiling")]
        {
            if ran % 600 == 0 {
                crate::PROFILER.lock().log_and_clear();
            }
        }
    }

    simulation
}

pub fn log_summary(simulation: &Simulation) {
    let s = simulation.summary();
    info!(
        tick = s.tick,
        electrons = s.electrons,
        holes = s.holes,
        mean_pair_distance = s.mean_pair_distance.map(f64::from),
        max_speed = s.max_speed,
        "summary"
    );
}
