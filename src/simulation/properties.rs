// Property tests for the drift step: boundedness and region confinement

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ultraviolet::Vec2;

use super::drift::{self, Frame};
use crate::carrier::{Carrier, Species};
use crate::config::{self, SimConfig};
use crate::geometry::RegionLayout;
use crate::lattice::{lattice_electrons, DopingMap, LatticeLayout};

fn arb_carrier() -> impl Strategy<Value = Carrier> {
    (0usize..3, 0.0f32..1.0, 0.0f32..1.0, -0.05f32..0.05, -0.05f32..0.05, 0.0f64..6000.0)
        .prop_map(|(region, ux, uy, vx, vy, born_at)| {
            Carrier::new(region, Vec2::new(ux, uy), Vec2::new(vx, vy), born_at)
        })
}

fn arb_layout() -> impl Strategy<Value = RegionLayout> {
    (10.0f32..600.0, 10.0f32..600.0, 10.0f32..600.0, 10.0f32..400.0).prop_map(|(a, b, c, h)| {
        RegionLayout::from_boundaries([0.0, a, a + b, a + b + c], 0.0, h).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn carriers_stay_inside_margins_and_under_speed_ceiling(
        mut electrons in prop::collection::vec(arb_carrier(), 0..12),
        mut holes in prop::collection::vec(arb_carrier(), 0..12),
        layout in arb_layout(),
        ticks in 1usize..60,
        seed in any::<u64>(),
    ) {
        let cfg = SimConfig::default();
        let lattice = crate::lattice::LatticeElectrons::empty();
        let mut rng = StdRng::seed_from_u64(seed);
        let lo = config::BOUNDARY_MARGIN;
        let hi = 1.0 - config::BOUNDARY_MARGIN;
        let e_ceiling = cfg.species.get(Species::Electron).speed_ceiling(electrons.len());
        let h_ceiling = cfg.species.get(Species::Hole).speed_ceiling(holes.len());

        for t in 0..ticks {
            let now = 4000.0 + t as f64 * config::FRAME_INTERVAL_MS;
            let frame = Frame { layout: &layout, lattice: &lattice, now };
            drift::step(&mut electrons, &mut holes, &frame, &cfg, &mut rng);

            for (population, ceiling) in [(&electrons, e_ceiling), (&holes, h_ceiling)] {
                for c in population.iter() {
                    prop_assert!(c.u.x >= lo && c.u.x <= hi && c.u.y >= lo && c.u.y <= hi,
                        "position {:?} escaped", c.u);
                    prop_assert!(c.vel.x.abs() <= ceiling + 1e-7 && c.vel.y.abs() <= ceiling + 1e-7,
                        "velocity {:?} above ceiling {}", c.vel, ceiling);
                }
                for (c, p) in population.iter().zip(drift::query_positions(population, &layout)) {
                    prop_assert!(layout.region(c.region()).contains(p), "{:?} outside region {}", p, c.region());
                }
            }
        }
    }

    #[test]
    fn lattice_driven_steps_stay_finite(
        mut electrons in prop::collection::vec(arb_carrier(), 1..8),
        seed in any::<u64>(),
    ) {
        let cfg = SimConfig::default();
        let layout = LatticeLayout::compute(config::DEFAULT_CANVAS_WIDTH, config::DEFAULT_CANVAS_HEIGHT).unwrap();
        let map = DopingMap::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for t in 0..40 {
            let now = 4500.0 + t as f64 * config::FRAME_INTERVAL_MS;
            let lattice = lattice_electrons(&layout, &map, now);
            let frame = Frame { layout: layout.regions(), lattice: &lattice, now };
            drift::step(&mut electrons, &mut [], &frame, &cfg, &mut rng);
        }
        prop_assert!(electrons.iter().all(Carrier::is_finite));
    }
}
