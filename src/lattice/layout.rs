// lattice/layout.rs
// Grid geometry for the N | P | N silicon lattice, derived from the canvas size.

use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use crate::geometry::{GeometryError, RegionLayout};

pub const COLS: usize = 15;
pub const ROWS: usize = 8;
/// Columns in the first N region and in the P region; the second N region takes the rest.
pub const N1_COLS: usize = 6;
pub const P_COLS: usize = 3;

const MARGIN: f32 = 24.0;
const MAX_SPACING: f32 = 64.0;
/// Height kept free above the grid for the dopant tray (pad + tray + gap).
const TRAY_RESERVED: f32 = 6.0 + 70.0 + 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeLayout {
    pub width: f32,
    pub height: f32,
    pub start: Vec2,
    pub spacing: f32,
    /// Vertical region boundaries, left to right.
    pub xs: [f32; 4],
    pub top: f32,
    pub bottom: f32,
    regions: RegionLayout,
}

impl LatticeLayout {
    /// Fit the lattice to a `width` × `height` canvas, centred in the area below the tray.
    pub fn compute(width: f32, height: f32) -> Result<Self, GeometryError> {
        let grid_left = MARGIN;
        let grid_right = width - MARGIN;
        let grid_top = (MARGIN + 16.0).max(TRAY_RESERVED);
        let grid_bottom = height - MARGIN;

        let avail_w = grid_right - grid_left;
        let avail_h = grid_bottom - grid_top;
        let sx = avail_w / (COLS - 1) as f32;
        let sy = avail_h / (ROWS - 1) as f32;
        let spacing = MAX_SPACING.min(sx).min(sy);

        let grid_w = spacing * (COLS - 1) as f32;
        let grid_h = spacing * (ROWS - 1) as f32;
        let start = Vec2::new(
            (grid_left + (avail_w - grid_w) / 2.0).round(),
            (grid_top + (avail_h - grid_h) / 2.0).round(),
        );

        let xs = [
            start.x - spacing * 0.5,
            start.x + (N1_COLS as f32 - 0.5) * spacing,
            start.x + ((N1_COLS + P_COLS) as f32 - 0.5) * spacing,
            start.x + (COLS as f32 - 0.5) * spacing,
        ];
        let top = start.y - spacing * 0.5;
        let bottom = start.y + (ROWS as f32 - 0.5) * spacing;
        let regions = RegionLayout::from_boundaries(xs, top, bottom)?;

        Ok(Self { width, height, start, spacing, xs, top, bottom, regions })
    }

    pub fn regions(&self) -> &RegionLayout {
        &self.regions
    }

    /// Pixel centre of the atom at (`row`, `col`).
    pub fn site_center(&self, row: usize, col: usize) -> Vec2 {
        self.start + Vec2::new(col as f32, row as f32) * self.spacing
    }

    /// Region holding lattice column `col`.
    pub fn region_of_col(&self, col: usize) -> usize {
        if col < N1_COLS {
            0
        } else if col < N1_COLS + P_COLS {
            1
        } else {
            2
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.xs[0] && p.x <= self.xs[3] && p.y >= self.top && p.y <= self.bottom
    }

    /// Nearest lattice site to `p`, clamped onto the grid.
    pub fn nearest_site(&self, p: Vec2) -> (usize, usize) {
        let col = ((p.x - self.start.x) / self.spacing).round();
        let row = ((p.y - self.start.y) / self.spacing).round();
        let col = col.clamp(0.0, (COLS - 1) as f32) as usize;
        let row = row.clamp(0.0, (ROWS - 1) as f32) as usize;
        (row, col)
    }
}
