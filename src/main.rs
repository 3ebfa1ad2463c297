//! Headless driver for the N | P | N drift simulation.
//!
//! ```bash
//! cargo run --release -- run --random-dopants 12 --ticks 1200 --save out/state.json.gz --gzip
//! cargo run --release -- inspect out/state.json.gz
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use npn_drift::app::{self, simulation_loop, LoopOptions};
use npn_drift::config::{self, SimConfig};
use npn_drift::init_config::{self, InitConfig};
use npn_drift::io::{self, SaveFormat};
use npn_drift::lattice::Dopant;
use npn_drift::render::render_frame;
use npn_drift::simulation::Simulation;

#[derive(Parser, Debug)]
#[command(name = "npn_drift")]
#[command(about = "Charge-carrier drift across an N | P | N silicon lattice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario headless
    Run(RunArgs),
    /// Load a saved state and log its summary
    Inspect {
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scenario TOML with [simulation], [[dopants]] and [[random]] tables
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Tuning TOML overriding the built-in constants
    #[arg(long, env = "NPN_DRIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for jitter and random placement
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,

    /// Drop this many random dopants, half phosphorus and half boron
    #[arg(long, default_value_t = 0)]
    random_dopants: usize,

    /// Log a summary every N ticks
    #[arg(long, default_value_t = 120)]
    summary_every: u64,

    /// Save the final state here
    #[arg(long)]
    save: Option<PathBuf>,

    /// Save as bincode instead of JSON
    #[arg(long, requires = "save")]
    binary: bool,

    /// Gzip the saved state
    #[arg(long, requires = "save")]
    gzip: bool,

    /// Write the final render frame as JSON
    #[arg(long)]
    export: Option<PathBuf>,
}

const DEFAULT_TICKS: u64 = 600;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn init_thread_pool() -> Result<()> {
    let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let threads = cores.max(config::MIN_THREADS) - config::THREADS_LEAVE_FREE;
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("failed to build the rayon thread pool")?;
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = match &args.scenario {
        Some(path) => InitConfig::load_from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => InitConfig::default(),
    };
    let settings = scenario.simulation.as_ref();

    let mut config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed.or(settings.and_then(|s| s.seed)) {
        config.seed = Some(seed);
    }
    let seed = config.seed;

    let (default_w, default_h) = settings.map(|s| s.canvas_size()).unwrap_or((
        config::DEFAULT_CANVAS_WIDTH,
        config::DEFAULT_CANVAS_HEIGHT,
    ));
    let width = args.width.unwrap_or(default_w);
    let height = args.height.unwrap_or(default_h);
    let ticks = args.ticks.or(settings.and_then(|s| s.ticks)).unwrap_or(DEFAULT_TICKS);

    let mut sim = Simulation::new(config, width, height).context("invalid config or canvas too small")?;
    scenario.apply(&mut sim, seed)?;
    if args.random_dopants > 0 {
        let mut rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed ^ 0x9e37_79b9),
            None => fastrand::Rng::new(),
        };
        let phosphorus = args.random_dopants.div_ceil(2);
        init_config::place_random(&mut sim, Dopant::Phosphorus, phosphorus, &mut rng);
        init_config::place_random(&mut sim, Dopant::Boron, args.random_dopants - phosphorus, &mut rng);
    }
    info!(
        width,
        height,
        ticks,
        seed,
        electrons = sim.electrons.len(),
        holes = sim.holes.len(),
        "starting run"
    );

    let options = LoopOptions { tick_limit: Some(ticks), summary_every: Some(args.summary_every) };
    let handle = app::spawn_with(sim, options)?;
    let sim = handle.join()?;
    simulation_loop::log_summary(&sim);

    if let Some(path) = &args.save {
        let format = if args.binary { SaveFormat::Binary } else { SaveFormat::Json };
        io::save_state(path, &sim, format, args.gzip)
            .with_context(|| format!("saving state to {}", path.display()))?;
    }
    if let Some(path) = &args.export {
        let frame = render_frame(&sim);
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &frame)?;
        info!(path = %path.display(), "render frame exported");
    }
    Ok(())
}

fn inspect(path: PathBuf) -> Result<()> {
    let state = io::load_state(&path).with_context(|| format!("loading {}", path.display()))?;
    let mut sim = Simulation::new(state.config.clone(), state.canvas_width, state.canvas_height)?;
    state.apply_to(&mut sim)?;
    info!(
        path = %path.display(),
        canvas_width = sim.layout.width,
        canvas_height = sim.layout.height,
        now_ms = sim.now_ms,
        phosphorus = sim.doping.count(npn_drift::lattice::Site::Phosphorus),
        boron = sim.doping.count(npn_drift::lattice::Site::Boron),
        "loaded state"
    );
    simulation_loop::log_summary(&sim);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    init_thread_pool()?;
    match cli.command {
        Command::Run(args) => run(args),
        Command::Inspect { path } => inspect(path),
    }
}
