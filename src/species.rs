// species.rs
// Per-species tuning tables for the drift simulator, looked up by tag.

use palette::Srgba;
use serde::{Deserialize, Serialize};

use crate::carrier::Species;

/// Which carriers of the same species contribute to the mutual repulsion term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepulsionScope {
    /// Every carrier of the species, across all three regions.
    Global,
    /// Only carriers sharing the home region.
    Region,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProps {
    /// Gain of the softened inverse-cube same-species repulsion.
    pub repulsion_gain: f32,
    pub repulsion_scope: RepulsionScope,
    /// Gain of the softened inverse-cube attraction toward opposite carriers.
    pub coulomb_gain: f32,
    /// Gain of the linear (spring) attraction toward opposite carriers.
    pub spring_gain: f32,
    /// Coulomb scale applied when an opposite carrier is inside the proximity threshold.
    pub contact_coulomb_scale: f32,
    /// Gain of the short-range repulsion from bound lattice electrons (0 disables).
    pub lattice_repulsion_gain: f32,
    /// Half-width of the uniform per-tick velocity jitter.
    pub jitter: f32,
    /// Jitter scale while an opposite carrier is inside the proximity threshold.
    pub contact_jitter_scale: f32,
    /// Ceiling on the magnitude of the combined acceleration.
    pub max_accel: f32,
    /// Per-tick velocity decay, strictly inside (0, 1).
    pub damping: f32,
    /// Extra one-tick velocity multiplier while in contact with an opposite carrier.
    pub contact_brake: f32,
    /// Base per-component velocity ceiling.
    pub max_speed: f32,
    /// Ceiling reduction per additional carrier of the species.
    pub crowding_slowdown: f32,
    /// Velocity multiplier applied on a wall hit (negative: inelastic bounce).
    pub bounce: f32,
    /// Half-width of the uniform initial velocity given at creation.
    pub initial_speed: f32,
    /// Render radius in pixels.
    pub radius: f32,
    pub fill: [u8; 4],
    pub stroke: Option<[u8; 4]>,
}

impl SpeciesProps {
    pub fn electron() -> Self {
        Self {
            repulsion_gain: 2.0e-5,
            repulsion_scope: RepulsionScope::Global,
            coulomb_gain: 1.0e-5,
            spring_gain: 0.02,
            contact_coulomb_scale: 0.4,
            lattice_repulsion_gain: 2.0e-6,
            jitter: 0.002,
            contact_jitter_scale: 0.3,
            max_accel: 0.004,
            damping: 0.96,
            contact_brake: 0.6,
            max_speed: 0.012,
            crowding_slowdown: 0.25,
            bounce: -0.8,
            initial_speed: 0.01,
            radius: 3.0,
            fill: [255, 210, 60, 255],
            stroke: None,
        }
    }

    pub fn hole() -> Self {
        Self {
            repulsion_gain: 5.0e-6,
            repulsion_scope: RepulsionScope::Region,
            coulomb_gain: 4.0e-6,
            spring_gain: 0.008,
            contact_coulomb_scale: 0.45,
            lattice_repulsion_gain: 0.0,
            jitter: 0.0006,
            contact_jitter_scale: 0.3,
            max_accel: 0.0015,
            damping: 0.99,
            contact_brake: 0.7,
            max_speed: 0.003,
            crowding_slowdown: 0.0,
            bounce: -0.7,
            initial_speed: 0.002,
            radius: 5.0,
            fill: [0, 0, 0, 255],
            stroke: Some([255, 210, 60, 255]),
        }
    }

    /// Per-component velocity ceiling for a population of `population` carriers.
    pub fn speed_ceiling(&self, population: usize) -> f32 {
        let extra = population.saturating_sub(1) as f32;
        self.max_speed / (1.0 + self.crowding_slowdown * extra)
    }

    pub fn fill_color(&self) -> Srgba<u8> {
        let [r, g, b, a] = self.fill;
        Srgba::new(r, g, b, a)
    }

    pub fn stroke_color(&self) -> Option<Srgba<u8>> {
        self.stroke.map(|[r, g, b, a]| Srgba::new(r, g, b, a))
    }
}

/// Constant tables for both species.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    #[serde(default = "SpeciesProps::electron")]
    pub electron: SpeciesProps,
    #[serde(default = "SpeciesProps::hole")]
    pub hole: SpeciesProps,
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            electron: SpeciesProps::electron(),
            hole: SpeciesProps::hole(),
        }
    }
}

impl SpeciesTable {
    pub fn get(&self, species: Species) -> &SpeciesProps {
        match species {
            Species::Electron => &self.electron,
            Species::Hole => &self.hole,
        }
    }

    pub fn get_mut(&mut self, species: Species) -> &mut SpeciesProps {
        match species {
            Species::Electron => &mut self.electron,
            Species::Hole => &mut self.hole,
        }
    }
}
