// lattice/doping.rs
// Doping map: which lattice sites hold silicon, phosphorus or boron.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use super::layout::{LatticeLayout, COLS, ROWS};
use crate::carrier::Species;
use crate::config::{self, ConfigError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Silicon,
    Phosphorus,
    Boron,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dopant {
    /// Donor: releases a free electron.
    Phosphorus,
    /// Acceptor: leaves a hole.
    Boron,
}

impl Dopant {
    pub fn site(self) -> Site {
        match self {
            Dopant::Phosphorus => Site::Phosphorus,
            Dopant::Boron => Site::Boron,
        }
    }

    /// Carrier species released when this dopant replaces a silicon atom.
    pub fn carrier(self) -> Species {
        match self {
            Dopant::Phosphorus => Species::Electron,
            Dopant::Boron => Species::Hole,
        }
    }
}

impl FromStr for Dopant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "phosphorus" => Ok(Dopant::Phosphorus),
            "b" | "boron" => Ok(Dopant::Boron),
            _ => Err(ConfigError::UnknownDopant(s.to_string())),
        }
    }
}

impl fmt::Display for Dopant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dopant::Phosphorus => write!(f, "P"),
            Dopant::Boron => write!(f, "B"),
        }
    }
}

/// Creation event produced by a successful placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarrierSpawn {
    pub species: Species,
    pub region: usize,
    pub ux: f32,
    pub uy: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DopingMap {
    sites: Vec<Site>,
}

impl Default for DopingMap {
    fn default() -> Self {
        Self { sites: vec![Site::Silicon; ROWS * COLS] }
    }
}

impl DopingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Site {
        self.sites[row * COLS + col]
    }

    pub fn set(&mut self, row: usize, col: usize, site: Site) -> Site {
        std::mem::replace(&mut self.sites[row * COLS + col], site)
    }

    pub fn clear(&mut self) {
        self.sites.fill(Site::Silicon);
    }

    pub fn count(&self, site: Site) -> usize {
        self.sites.iter().filter(|&&s| s == site).count()
    }

    /// Iterate `(row, col, site)` over the whole grid.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Site)> + '_ {
        self.sites
            .iter()
            .enumerate()
            .map(|(i, &s)| (i / COLS, i % COLS, s))
    }

    /// Drop `dopant` at pixel `p`. Drops outside the lattice are ignored.
    /// The nearest site is overwritten; a carrier is released only when that
    /// site held silicon.
    pub fn place(&mut self, dopant: Dopant, p: Vec2, layout: &LatticeLayout) -> Option<CarrierSpawn> {
        if !layout.contains(p) {
            return None;
        }
        let (row, col) = layout.nearest_site(p);
        let prev = self.set(row, col, dopant.site());
        if prev != Site::Silicon {
            return None;
        }

        let region = layout.region_of_col(col);
        let u = layout.regions().region(region).to_local(p);
        let lo = config::SPAWN_MARGIN;
        let hi = 1.0 - config::SPAWN_MARGIN;
        Some(CarrierSpawn {
            species: dopant.carrier(),
            region,
            ux: u.x.clamp(lo, hi),
            uy: u.y.clamp(lo, hi),
        })
    }

    /// Ensure a deserialised map has the expected shape.
    pub fn is_well_formed(&self) -> bool {
        self.sites.len() == ROWS * COLS
    }
}
