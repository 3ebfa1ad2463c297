// Lattice geometry, placement and orbit tests

use super::*;
use crate::carrier::Species;
use ultraviolet::Vec2;

fn layout() -> LatticeLayout {
    LatticeLayout::compute(1280.0, 720.0).unwrap()
}

#[test]
fn layout_fits_default_canvas() {
    let l = layout();
    assert_eq!(l.spacing, 64.0);
    assert_eq!(l.start, Vec2::new(192.0, 165.0));
    assert_eq!(l.xs, [160.0, 544.0, 736.0, 1120.0]);
    assert_eq!((l.top, l.bottom), (133.0, 645.0));
    let regions = l.regions().regions();
    assert_eq!(regions[0].width(), 384.0);
    assert_eq!(regions[1].width(), 192.0);
    assert_eq!(regions[2].width(), 384.0);
}

#[test]
fn layout_rejects_canvas_too_small_for_grid() {
    assert!(LatticeLayout::compute(100.0, 100.0).is_err());
}

#[test]
fn columns_map_to_regions() {
    let l = layout();
    assert_eq!(l.region_of_col(0), 0);
    assert_eq!(l.region_of_col(5), 0);
    assert_eq!(l.region_of_col(6), 1);
    assert_eq!(l.region_of_col(8), 1);
    assert_eq!(l.region_of_col(9), 2);
    assert_eq!(l.region_of_col(14), 2);
}

#[test]
fn phosphorus_on_silicon_releases_electron() {
    let l = layout();
    let mut map = DopingMap::new();
    let center = l.site_center(3, 7);
    let spawn = map.place(Dopant::Phosphorus, center, &l).unwrap();
    assert_eq!(spawn.species, Species::Electron);
    assert_eq!(spawn.region, 1);
    assert!((spawn.ux - 0.5).abs() < 1e-6);
    assert!((spawn.uy - 0.4375).abs() < 1e-6);
    assert_eq!(map.get(3, 7), Site::Phosphorus);
}

#[test]
fn replacing_a_dopant_releases_nothing() {
    let l = layout();
    let mut map = DopingMap::new();
    let p = l.site_center(2, 2);
    assert!(map.place(Dopant::Boron, p, &l).is_some());
    assert!(map.place(Dopant::Phosphorus, p, &l).is_none());
    assert_eq!(map.get(2, 2), Site::Phosphorus);
}

#[test]
fn boron_releases_hole() {
    let l = layout();
    let mut map = DopingMap::new();
    let spawn = map.place(Dopant::Boron, l.site_center(0, 12), &l).unwrap();
    assert_eq!(spawn.species, Species::Hole);
    assert_eq!(spawn.region, 2);
}

#[test]
fn drop_outside_lattice_is_ignored() {
    let l = layout();
    let mut map = DopingMap::new();
    assert!(map.place(Dopant::Boron, Vec2::new(10.0, 10.0), &l).is_none());
    assert_eq!(map.count(Site::Silicon), layout::ROWS * layout::COLS);
}

#[test]
fn drop_near_corner_is_pulled_inside() {
    let l = layout();
    let mut map = DopingMap::new();
    let spawn = map.place(Dopant::Phosphorus, Vec2::new(161.0, 134.0), &l).unwrap();
    assert_eq!(map.get(0, 0), Site::Phosphorus);
    assert_eq!((spawn.ux, spawn.uy), (0.05, 0.05));
}

#[test]
fn clear_restores_silicon() {
    let l = layout();
    let mut map = DopingMap::new();
    map.place(Dopant::Boron, l.site_center(1, 1), &l);
    map.place(Dopant::Phosphorus, l.site_center(4, 10), &l);
    map.clear();
    assert_eq!(map.count(Site::Silicon), layout::ROWS * layout::COLS);
}

#[test]
fn dopant_names_parse() {
    assert_eq!("P".parse::<Dopant>().unwrap(), Dopant::Phosphorus);
    assert_eq!(" boron ".parse::<Dopant>().unwrap(), Dopant::Boron);
    assert!("arsenic".parse::<Dopant>().is_err());
}

#[test]
fn undoped_lattice_has_four_electrons_per_atom() {
    let l = layout();
    let map = DopingMap::new();
    let bound = lattice_electrons(&l, &map, 0.0);
    assert_eq!(bound.region(0).len(), 6 * 8 * 4);
    assert_eq!(bound.region(1).len(), 3 * 8 * 4);
    assert_eq!(bound.region(2).len(), 6 * 8 * 4);
}

#[test]
fn boron_site_shows_three_electrons() {
    let l = layout();
    let mut map = DopingMap::new();
    map.place(Dopant::Boron, l.site_center(5, 7), &l);
    let bound = lattice_electrons(&l, &map, 250.0);
    assert_eq!(bound.len(), 15 * 8 * 4 - 1);
}

#[test]
fn silicon_orbit_radius_and_phase() {
    let center = Vec2::new(100.0, 100.0);
    let r = silicon_radius() + 10.0;
    let at_zero = atom_orbit(Site::Silicon, center, 0.0);
    assert_eq!(at_zero.len(), 4);
    assert!((at_zero[0] - Vec2::new(100.0 + r, 100.0)).mag() < 1e-4);
    for e in &at_zero {
        assert!(((*e - center).mag() - r).abs() < 1e-3);
    }
    let later = atom_orbit(Site::Silicon, center, 1000.0);
    assert!((later[0] - at_zero[0]).mag() > 1.0);
}

#[test]
fn undoped_orbits_stay_inside_their_region() {
    let l = layout();
    let bound = lattice_electrons(&l, &DopingMap::new(), 0.0);
    for region in 0..3 {
        for p in bound.region(region) {
            assert!(p.x > 0.0 && p.x < 1.0 && p.y > 0.0 && p.y < 1.0, "{p:?} in region {region}");
        }
    }
}
