//! Charge-carrier drift step.
//!
//! Advances electrons and holes by one tick. Pairwise terms are evaluated in
//! global normalised space (the union box of all regions mapped to the unit
//! square) from a snapshot taken before either population moves, so the
//! electron and hole passes never observe each other's same-tick updates.

use rand::Rng;
use rayon::prelude::*;
use tracing::trace;
use ultraviolet::Vec2;

use crate::carrier::{Carrier, Species};
use crate::config::{self, SimConfig};
use crate::geometry::RegionLayout;
use crate::lattice::LatticeElectrons;
use crate::profile_scope;
use crate::species::{RepulsionScope, SpeciesProps};

/// Host-supplied inputs for one tick.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub layout: &'a RegionLayout,
    pub lattice: &'a LatticeElectrons,
    /// Host time in milliseconds, non-decreasing between calls.
    pub now: f64,
}

#[derive(Clone, Copy, Debug)]
struct SnapPoint {
    region: usize,
    local: Vec2,
    global: Vec2,
}

/// Force-derived acceleration (region-normalised, before the startup ramp)
/// and the global distance to the nearest opposite carrier.
#[derive(Clone, Copy, Debug)]
struct Influence {
    acc: Vec2,
    nearest_opposite: f32,
}

fn snapshot(population: &[Carrier], layout: &RegionLayout) -> Vec<SnapPoint> {
    population
        .iter()
        .map(|c| SnapPoint {
            region: c.region(),
            local: c.u,
            global: layout.to_global(c.region(), c.u),
        })
        .collect()
}

/// Softened inverse-cube kernel: `d / (|d|² + eps)^1.5`.
#[inline]
fn softened(d: Vec2, dist_sq: f32, eps: f32) -> Vec2 {
    d / (dist_sq + eps).powf(1.5)
}

fn influences(
    props: &SpeciesProps,
    own: &[SnapPoint],
    opposite: &[SnapPoint],
    frame: &Frame<'_>,
    config: &SimConfig,
) -> Vec<Influence> {
    let eps = config.softening;
    let proximity = config.proximity_threshold;
    let cutoff_sq = config.lattice_cutoff * config.lattice_cutoff;

    (0..own.len())
        .into_par_iter()
        .map(|i| {
            let me = own[i];
            let mut acc = Vec2::zero();

            if props.repulsion_gain != 0.0 {
                for (j, other) in own.iter().enumerate() {
                    if j == i {
                        continue;
                    }
                    if props.repulsion_scope == RepulsionScope::Region && other.region != me.region {
                        continue;
                    }
                    let d = me.global - other.global;
                    acc += props.repulsion_gain * softened(d, d.mag_sq(), eps);
                }
            }

            let mut nearest_opposite = f32::INFINITY;
            for other in opposite {
                let d = other.global - me.global;
                let dist_sq = d.mag_sq();
                let dist = dist_sq.sqrt();
                nearest_opposite = nearest_opposite.min(dist);
                let mut coulomb = props.coulomb_gain * softened(d, dist_sq, eps);
                if dist < proximity {
                    coulomb *= props.contact_coulomb_scale;
                }
                acc += coulomb + props.spring_gain * d;
            }

            acc = acc * frame.layout.global_to_local_scale(me.region);

            if props.lattice_repulsion_gain != 0.0 {
                for bound in frame.lattice.region(me.region) {
                    let d = me.local - *bound;
                    let dist_sq = d.mag_sq();
                    if dist_sq < cutoff_sq {
                        acc += props.lattice_repulsion_gain
                            * softened(d, dist_sq, config.lattice_softening);
                    }
                }
            }

            Influence { acc, nearest_opposite }
        })
        .collect()
}

#[inline]
fn symmetric<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() * 2.0 - 1.0
}

fn integrate<R: Rng + ?Sized>(
    population: &mut [Carrier],
    influences: &[Influence],
    props: &SpeciesProps,
    frame: &Frame<'_>,
    config: &SimConfig,
    rng: &mut R,
) {
    let ceiling = props.speed_ceiling(population.len());
    let lo = config::BOUNDARY_MARGIN;
    let hi = 1.0 - config::BOUNDARY_MARGIN;

    for (c, inf) in population.iter_mut().zip(influences) {
        let ramp = config.ramp(c.born_at, frame.now);
        let contact = inf.nearest_opposite < config.proximity_threshold;

        let jitter_half = if contact {
            props.jitter * props.contact_jitter_scale
        } else {
            props.jitter
        };
        let jitter = if jitter_half > 0.0 {
            Vec2::new(symmetric(rng), symmetric(rng)) * jitter_half
        } else {
            Vec2::zero()
        };

        let mut acc = inf.acc * ramp + jitter;
        let mag = acc.mag();
        if mag > props.max_accel {
            acc *= props.max_accel / mag;
        }

        c.vel = (c.vel + acc) * props.damping;
        if contact {
            c.vel *= props.contact_brake;
        }
        c.vel.x = c.vel.x.clamp(-ceiling, ceiling);
        c.vel.y = c.vel.y.clamp(-ceiling, ceiling);

        c.u += c.vel;

        if c.u.x < lo {
            c.u.x = lo;
            c.vel.x *= props.bounce;
        } else if c.u.x > hi {
            c.u.x = hi;
            c.vel.x *= props.bounce;
        }
        if c.u.y < lo {
            c.u.y = lo;
            c.vel.y *= props.bounce;
        } else if c.u.y > hi {
            c.u.y = hi;
            c.vel.y *= props.bounce;
        }
    }
}

/// Advance both populations by one tick.
///
/// Every carrier's region index must be valid for `frame.layout`. Empty
/// populations are a no-op and consume no randomness.
pub fn step<R: Rng + ?Sized>(
    electrons: &mut [Carrier],
    holes: &mut [Carrier],
    frame: &Frame<'_>,
    config: &SimConfig,
    rng: &mut R,
) {
    if electrons.is_empty() && holes.is_empty() {
        return;
    }
    profile_scope!("drift_step");

    let snap_e = snapshot(electrons, frame.layout);
    let snap_h = snapshot(holes, frame.layout);

    let electron_props = config.species.get(Species::Electron);
    let hole_props = config.species.get(Species::Hole);

    let inf_e = influences(electron_props, &snap_e, &snap_h, frame, config);
    let inf_h = influences(hole_props, &snap_h, &snap_e, frame, config);

    integrate(electrons, &inf_e, electron_props, frame, config, rng);
    integrate(holes, &inf_h, hole_props, frame, config, rng);

    trace!(
        electrons = electrons.len(),
        holes = holes.len(),
        now = frame.now,
        "drift step"
    );
}

/// Pixel positions of a population inside their home regions.
pub fn query_positions(population: &[Carrier], layout: &RegionLayout) -> Vec<Vec2> {
    population
        .iter()
        .map(|c| layout.region(c.region()).to_pixel(c.u))
        .collect()
}

/// Global-normalised distance between two carriers.
pub fn global_distance(a: &Carrier, b: &Carrier, layout: &RegionLayout) -> f32 {
    (layout.to_global(a.region(), a.u) - layout.to_global(b.region(), b.u)).mag()
}
