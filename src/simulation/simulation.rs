// simulation/simulation.rs
// Contains the Simulation struct: host-owned carrier state plus the lattice it lives on.

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};
use ultraviolet::Vec2;

use super::drift::{self, Frame};
use crate::carrier::{Carrier, Species};
use crate::config::{ConfigError, SimConfig};
use crate::geometry::{GeometryError, REGION_COUNT};
use crate::lattice::{lattice_electrons, Dopant, DopingMap, LatticeElectrons, LatticeLayout};

#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("region {0} is out of range")]
    RegionOutOfRange(usize),
    #[error("spawn position ({0}, {1}) is not finite")]
    NonFinite(f32, f32),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Aggregate numbers for logging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub tick: u64,
    pub electrons: usize,
    pub holes: usize,
    /// Mean global distance from each electron to its nearest hole.
    pub mean_pair_distance: Option<f32>,
    pub max_speed: f32,
}

/// The drift simulation and the lattice it runs on. Owned by the host.
pub struct Simulation {
    pub electrons: Vec<Carrier>,
    pub holes: Vec<Carrier>,
    pub layout: LatticeLayout,
    pub doping: DopingMap,
    pub config: SimConfig,
    pub tick: u64,
    pub now_ms: f64,
    rng: StdRng,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl Simulation {
    /// Build an empty wafer. The config is validated first, so a simulation
    /// never runs with parameters that would blow up the integration.
    pub fn new(config: SimConfig, width: f32, height: f32) -> Result<Self, SetupError> {
        config.validate()?;
        let layout = LatticeLayout::compute(width, height)?;
        let rng = make_rng(config.seed);
        Ok(Self {
            electrons: Vec::new(),
            holes: Vec::new(),
            layout,
            doping: DopingMap::new(),
            config,
            tick: 0,
            now_ms: 0.0,
            rng,
        })
    }

    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Refit the lattice to a new canvas. Carriers keep their normalised
    /// coordinates; on error the previous layout stays in place.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), GeometryError> {
        let layout = LatticeLayout::compute(width, height)?;
        debug!(width, height, spacing = layout.spacing, "lattice resized");
        self.layout = layout;
        Ok(())
    }

    /// Drop a dopant at pixel `(x, y)`. Returns the species of the released carrier, if any.
    pub fn place_dopant(&mut self, dopant: Dopant, x: f32, y: f32) -> Option<Species> {
        let spawn = self.doping.place(dopant, Vec2::new(x, y), &self.layout)?;
        match self.spawn_carrier(spawn.species, spawn.region, spawn.ux, spawn.uy) {
            Ok(()) => Some(spawn.species),
            Err(err) => {
                warn!(%err, "dopant placement produced an invalid carrier");
                None
            }
        }
    }

    /// Append a carrier created now at `(ux, uy)` of `region`.
    pub fn spawn_carrier(&mut self, species: Species, region: usize, ux: f32, uy: f32) -> Result<(), SpawnError> {
        if region >= REGION_COUNT {
            return Err(SpawnError::RegionOutOfRange(region));
        }
        if !ux.is_finite() || !uy.is_finite() {
            return Err(SpawnError::NonFinite(ux, uy));
        }
        let initial_speed = self.config.species.get(species).initial_speed;
        let carrier = Carrier::spawn(region, ux, uy, initial_speed, self.now_ms, &mut self.rng);
        debug!(?species, region, ux = carrier.u.x, uy = carrier.u.y, "carrier created");
        self.population_mut(species).push(carrier);
        Ok(())
    }

    /// Remove every carrier and restore an undoped lattice.
    pub fn reset(&mut self) {
        info!(
            electrons = self.electrons.len(),
            holes = self.holes.len(),
            "resetting wafer"
        );
        self.electrons.clear();
        self.holes.clear();
        self.doping.clear();
    }

    /// Advance one frame interval.
    pub fn step(&mut self) {
        let now = self.now_ms + self.config.frame_interval_ms;
        self.step_at(now);
    }

    /// Advance one tick to host time `now`. Time never runs backwards.
    pub fn step_at(&mut self, now: f64) {
        self.now_ms = now.max(self.now_ms);
        let lattice = self.lattice_electrons();
        let frame = Frame {
            layout: self.layout.regions(),
            lattice: &lattice,
            now: self.now_ms,
        };
        drift::step(&mut self.electrons, &mut self.holes, &frame, &self.config, &mut self.rng);
        self.tick += 1;
    }

    pub fn lattice_electrons(&self) -> LatticeElectrons {
        lattice_electrons(&self.layout, &self.doping, self.now_ms)
    }

    pub fn population(&self, species: Species) -> &[Carrier] {
        match species {
            Species::Electron => &self.electrons,
            Species::Hole => &self.holes,
        }
    }

    fn population_mut(&mut self, species: Species) -> &mut Vec<Carrier> {
        match species {
            Species::Electron => &mut self.electrons,
            Species::Hole => &mut self.holes,
        }
    }

    /// Pixel positions of one population.
    pub fn positions(&self, species: Species) -> Vec<Vec2> {
        drift::query_positions(self.population(species), self.layout.regions())
    }

    /// Reset any carrier whose state went non-finite to its region centre at rest.
    /// Returns how many were repaired.
    pub fn sanitize(&mut self) -> usize {
        let mut repaired = 0;
        for c in self.electrons.iter_mut().chain(self.holes.iter_mut()) {
            if !c.is_finite() {
                c.u = Vec2::new(0.5, 0.5);
                c.vel = Vec2::zero();
                repaired += 1;
            }
        }
        repaired
    }

    pub fn summary(&self) -> Summary {
        let layout = self.layout.regions();
        let distances: Vec<f32> = self
            .electrons
            .iter()
            .filter_map(|e| {
                self.holes
                    .iter()
                    .map(|h| drift::global_distance(e, h, layout))
                    .min_by(f32::total_cmp)
            })
            .collect();
        let mean_pair_distance = if distances.is_empty() {
            None
        } else {
            Some(distances.iter().sum::<f32>() / distances.len() as f32)
        };
        let max_speed = self
            .electrons
            .iter()
            .chain(&self.holes)
            .map(|c| c.vel.mag())
            .fold(0.0_f32, f32::max);
        Summary {
            tick: self.tick,
            electrons: self.electrons.len(),
            holes: self.holes.len(),
            mean_pair_distance,
            max_speed,
        }
    }
}
