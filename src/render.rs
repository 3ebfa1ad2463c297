// render.rs
// Flattens the simulation into plain draw primitives for a front end or an export.

use palette::Srgba;
use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use crate::carrier::Species;
use crate::geometry::REGION_COUNT;
use crate::lattice::{atom_orbit, boron_radius, phosphorus_radius, silicon_radius, Site};
use crate::simulation::Simulation;

/// Radius of a bound lattice electron in pixels.
const BOUND_ELECTRON_RADIUS: f32 = 3.0;

const SILICON_FILL: Srgba<u8> = Srgba::new(245, 245, 245, 210);
const SILICON_STROKE: Srgba<u8> = Srgba::new(230, 230, 230, 255);
const PHOSPHORUS_FILL: Srgba<u8> = Srgba::new(255, 160, 40, 255);
const BORON_FILL: Srgba<u8> = Srgba::new(255, 120, 170, 255);
const BOUND_ELECTRON_FILL: Srgba<u8> = Srgba::new(180, 180, 180, 255);

fn rgba(c: Srgba<u8>) -> [u8; 4] {
    [c.red, c.green, c.blue, c.alpha]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub pos: Vec2,
    pub radius: f32,
    pub fill: [u8; 4],
    pub stroke: Option<[u8; 4]>,
}

impl RenderPoint {
    fn new(pos: Vec2, radius: f32, fill: Srgba<u8>, stroke: Option<Srgba<u8>>) -> Self {
        Self { pos, radius, fill: rgba(fill), stroke: stroke.map(rgba) }
    }
}

/// Pixel rectangle of one region, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderRegion {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Everything needed to draw one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub tick: u64,
    pub now_ms: f64,
    pub width: f32,
    pub height: f32,
    pub regions: Vec<RenderRegion>,
    pub atoms: Vec<RenderPoint>,
    pub bound_electrons: Vec<RenderPoint>,
    pub electrons: Vec<RenderPoint>,
    pub holes: Vec<RenderPoint>,
}

fn atom_style(site: Site) -> (f32, Srgba<u8>, Option<Srgba<u8>>) {
    match site {
        Site::Silicon => (silicon_radius(), SILICON_FILL, Some(SILICON_STROKE)),
        Site::Phosphorus => (phosphorus_radius(), PHOSPHORUS_FILL, None),
        Site::Boron => (boron_radius(), BORON_FILL, None),
    }
}

fn carriers(sim: &Simulation, species: Species) -> Vec<RenderPoint> {
    let props = sim.config.species.get(species);
    sim.positions(species)
        .into_iter()
        .map(|p| RenderPoint::new(p, props.radius, props.fill_color(), props.stroke_color()))
        .collect()
}

pub fn render_frame(sim: &Simulation) -> RenderFrame {
    let layout = &sim.layout;
    let regions = (0..REGION_COUNT)
        .map(|i| {
            let r = layout.regions().region(i);
            RenderRegion { left: r.left, right: r.right, top: r.top, bottom: r.bottom }
        })
        .collect();

    let mut atoms = Vec::with_capacity(sim.doping.iter().count());
    let mut bound_electrons = Vec::new();
    for (row, col, site) in sim.doping.iter() {
        let center = layout.site_center(row, col);
        let (radius, fill, stroke) = atom_style(site);
        atoms.push(RenderPoint::new(center, radius, fill, stroke));
        bound_electrons.extend(
            atom_orbit(site, center, sim.now_ms)
                .into_iter()
                .map(|p| RenderPoint::new(p, BOUND_ELECTRON_RADIUS, BOUND_ELECTRON_FILL, None)),
        );
    }

    RenderFrame {
        tick: sim.tick,
        now_ms: sim.now_ms,
        width: layout.width,
        height: layout.height,
        regions,
        atoms,
        bound_electrons,
        electrons: carriers(sim, Species::Electron),
        holes: carriers(sim, Species::Hole),
    }
}
