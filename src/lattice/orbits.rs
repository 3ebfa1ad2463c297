// lattice/orbits.rs
// Time-phased positions of the electrons bound to lattice atoms.

use std::f32::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use ultraviolet::Vec2;

use super::doping::{DopingMap, Site};
use super::layout::LatticeLayout;
use crate::geometry::REGION_COUNT;

/// Silicon nucleus radius (px).
pub fn silicon_radius() -> f32 {
    3.0 * 28f32.cbrt()
}

pub fn phosphorus_radius() -> f32 {
    3.0 * 30f32.cbrt()
}

pub fn boron_radius() -> f32 {
    3.0 * 10f32.cbrt()
}

const SILICON_ORBIT_GAP: f32 = 10.0;
const DOPANT_ORBIT_GAP: f32 = 12.0;
const SILICON_PHASE_RATE: f32 = 0.0012;
const DOPANT_PHASE_RATE: f32 = 0.002;

/// Bound electron positions, per region, in region-local normalised coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticeElectrons {
    per_region: [Vec<Vec2>; REGION_COUNT],
}

impl LatticeElectrons {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_regions(per_region: [Vec<Vec2>; REGION_COUNT]) -> Self {
        Self { per_region }
    }

    pub fn region(&self, index: usize) -> &[Vec2] {
        &self.per_region[index]
    }

    pub fn len(&self) -> usize {
        self.per_region.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pixel positions of the electrons orbiting one atom at time `t_ms`.
///
/// Silicon carries four electrons turning clockwise; a placed phosphorus shows
/// four (its fifth is free) and boron three, both turning anticlockwise.
pub fn atom_orbit(site: Site, center: Vec2, t_ms: f64) -> SmallVec<[Vec2; 4]> {
    let (count, radius, phase, dir) = match site {
        Site::Silicon => (
            4,
            silicon_radius() + SILICON_ORBIT_GAP,
            (t_ms as f32) * SILICON_PHASE_RATE,
            1.0,
        ),
        Site::Phosphorus => (
            4,
            phosphorus_radius() + DOPANT_ORBIT_GAP,
            (t_ms as f32) * DOPANT_PHASE_RATE,
            -1.0,
        ),
        Site::Boron => (
            3,
            boron_radius() + DOPANT_ORBIT_GAP,
            (t_ms as f32) * DOPANT_PHASE_RATE,
            -1.0,
        ),
    };
    let step = if site == Site::Silicon { FRAC_PI_2 } else { TAU / count as f32 };
    (0..count)
        .map(|k| {
            let ang = dir * phase + k as f32 * step;
            center + Vec2::new(ang.cos(), ang.sin()) * radius
        })
        .collect()
}

/// All bound electrons of the lattice at time `t_ms`, grouped by region.
pub fn lattice_electrons(layout: &LatticeLayout, map: &DopingMap, t_ms: f64) -> LatticeElectrons {
    let mut per_region: [Vec<Vec2>; REGION_COUNT] = Default::default();
    for (row, col, site) in map.iter() {
        let region = layout.region_of_col(col);
        let rect = layout.regions().region(region);
        let center = layout.site_center(row, col);
        per_region[region].extend(atom_orbit(site, center, t_ms).into_iter().map(|p| rect.to_local(p)));
    }
    LatticeElectrons { per_region }
}
