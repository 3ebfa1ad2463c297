// init_config.rs
// Handles loading and applying a headless scenario from a TOML file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::lattice::{Dopant, COLS, ROWS};
use crate::simulation::Simulation;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InitConfig {
    pub simulation: Option<ScenarioSettings>,
    #[serde(default)]
    pub dopants: Vec<DopantPlacement>,
    #[serde(default)]
    pub random: Vec<RandomDopants>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScenarioSettings {
    /// Canvas width in pixels. Falls back to the default when omitted.
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub seed: Option<u64>,
    /// Number of ticks to run headless.
    pub ticks: Option<u64>,
}

impl ScenarioSettings {
    /// Canvas size, using the global defaults for missing values.
    pub fn canvas_size(&self) -> (f32, f32) {
        (
            self.width.unwrap_or(crate::config::DEFAULT_CANVAS_WIDTH),
            self.height.unwrap_or(crate::config::DEFAULT_CANVAS_HEIGHT),
        )
    }
}

/// A dopant dropped at pixel `(x, y)`.
#[derive(Debug, Deserialize, Serialize)]
pub struct DopantPlacement {
    pub x: f32,
    pub y: f32,
    pub dopant: String,
}

/// `count` dopants dropped on random lattice sites.
#[derive(Debug, Deserialize, Serialize)]
pub struct RandomDopants {
    pub count: usize,
    pub dopant: String,
}

impl DopantPlacement {
    pub fn to_dopant(&self) -> Result<Dopant, ConfigError> {
        self.dopant.parse()
    }
}

impl RandomDopants {
    pub fn to_dopant(&self) -> Result<Dopant, ConfigError> {
        self.dopant.parse()
    }
}

impl InitConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InitConfig = toml::from_str(content)?;
        // Fail on a bad dopant name before anything is placed.
        for p in &config.dopants {
            p.to_dopant()?;
        }
        for r in &config.random {
            r.to_dopant()?;
        }
        Ok(config)
    }

    /// Drop every configured dopant onto `sim`. Random placements pick sites
    /// with `fastrand`, seeded from `seed` when given. Returns the number of
    /// carriers released.
    pub fn apply(&self, sim: &mut Simulation, seed: Option<u64>) -> Result<usize, ConfigError> {
        let mut released = 0;
        for p in &self.dopants {
            if sim.place_dopant(p.to_dopant()?, p.x, p.y).is_some() {
                released += 1;
            } else {
                warn!(x = p.x, y = p.y, dopant = %p.dopant, "dopant placement released no carrier");
            }
        }

        let mut rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        for r in &self.random {
            let dopant = r.to_dopant()?;
            released += place_random(sim, dopant, r.count, &mut rng);
        }
        info!(
            explicit = self.dopants.len(),
            random = self.random.iter().map(|r| r.count).sum::<usize>(),
            released,
            "scenario applied"
        );
        Ok(released)
    }
}

/// Drop `count` dopants of one kind on random sites. Sites that already hold
/// a dopant are overwritten without releasing a carrier.
pub fn place_random(sim: &mut Simulation, dopant: Dopant, count: usize, rng: &mut fastrand::Rng) -> usize {
    let mut released = 0;
    for _ in 0..count {
        let row = rng.usize(0..ROWS);
        let col = rng.usize(0..COLS);
        let p = sim.layout.site_center(row, col);
        if sim.place_dopant(dopant, p.x, p.y).is_some() {
            released += 1;
        }
    }
    released
}
