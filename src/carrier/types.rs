// carrier/types.rs
// Contains the Species enum and the Carrier record.

use rand::Rng;
use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use crate::config;
use crate::geometry::REGION_COUNT;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Species {
    Electron,
    Hole,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Electron, Species::Hole];

    pub fn opposite(self) -> Self {
        match self {
            Species::Electron => Species::Hole,
            Species::Hole => Species::Electron,
        }
    }
}

/// A free electron or hole confined to one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    region: usize,
    /// Position normalised to the home region (0,0 top-left, 1,1 bottom-right).
    pub u: Vec2,
    /// Per-tick velocity in region-normalised units.
    pub vel: Vec2,
    /// Host time of creation in milliseconds.
    pub born_at: f64,
}

impl Carrier {
    /// Create a carrier with an explicit velocity. `region` must be below `REGION_COUNT`.
    pub fn new(region: usize, u: Vec2, vel: Vec2, born_at: f64) -> Self {
        debug_assert!(region < REGION_COUNT, "region {region} out of range");
        Self { region, u, vel, born_at }
    }

    /// Create a carrier from a placement event: the position is pulled in from
    /// the walls and the carrier starts with a small random velocity.
    pub fn spawn<R: Rng + ?Sized>(
        region: usize,
        ux: f32,
        uy: f32,
        initial_speed: f32,
        born_at: f64,
        rng: &mut R,
    ) -> Self {
        let lo = config::SPAWN_MARGIN;
        let hi = 1.0 - config::SPAWN_MARGIN;
        let u = Vec2::new(ux.clamp(lo, hi), uy.clamp(lo, hi));
        let vel = Vec2::new(
            (rng.random::<f32>() * 2.0 - 1.0) * initial_speed,
            (rng.random::<f32>() * 2.0 - 1.0) * initial_speed,
        );
        Self::new(region, u, vel, born_at)
    }

    pub fn region(&self) -> usize {
        self.region
    }

    pub fn is_finite(&self) -> bool {
        self.u.x.is_finite() && self.u.y.is_finite() && self.vel.x.is_finite() && self.vel.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawn_clamps_into_margin() {
        let mut rng = StdRng::seed_from_u64(7);
        let c = Carrier::spawn(2, -0.4, 1.7, 0.01, 0.0, &mut rng);
        assert_eq!(c.region(), 2);
        assert_eq!(c.u, Vec2::new(0.05, 0.95));
    }

    #[test]
    fn spawn_velocity_within_initial_speed() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let c = Carrier::spawn(0, 0.5, 0.5, 0.002, 10.0, &mut rng);
            assert!(c.vel.x.abs() <= 0.002 && c.vel.y.abs() <= 0.002);
            assert_eq!(c.born_at, 10.0);
        }
    }

    #[test]
    fn opposite_species() {
        assert_eq!(Species::Electron.opposite(), Species::Hole);
        assert_eq!(Species::Hole.opposite(), Species::Electron);
    }
}
