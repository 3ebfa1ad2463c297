//! Region geometry shared by the drift simulator and its host.
//!
//! Three contiguous rectangles laid out left to right (N | P | N) that share a
//! common top and bottom edge. Carrier coordinates are stored normalised to
//! their home rectangle, so the pixel geometry can change between ticks.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ultraviolet::Vec2;

pub const REGION_COUNT: usize = 3;

/// Tolerance used when checking that neighbouring regions share an edge.
const EDGE_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("region {index} has non-positive width {width}")]
    ZeroWidth { index: usize, width: f32 },
    #[error("regions have non-positive height {height}")]
    ZeroHeight { height: f32 },
    #[error("region {index} does not start where region {prev} ends")]
    NotContiguous { index: usize, prev: usize },
    #[error("region {index} does not share the common top/bottom edges")]
    MismatchedEdges { index: usize },
    #[error("region {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Region {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Map a region-normalised coordinate to pixels.
    pub fn to_pixel(&self, u: Vec2) -> Vec2 {
        Vec2::new(self.left + u.x * self.width(), self.top + u.y * self.height())
    }

    /// Map a pixel coordinate to region-normalised space (not clamped).
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        Vec2::new((p.x - self.left) / self.width(), (p.y - self.top) / self.height())
    }
}

/// A validated set of exactly three regions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionLayout {
    regions: [Region; REGION_COUNT],
}

impl RegionLayout {
    pub fn new(regions: [Region; REGION_COUNT]) -> Result<Self, GeometryError> {
        let top = regions[0].top;
        let bottom = regions[0].bottom;
        if !(bottom - top > 0.0) {
            return Err(GeometryError::ZeroHeight { height: bottom - top });
        }
        for (index, r) in regions.iter().enumerate() {
            if ![r.left, r.right, r.top, r.bottom].iter().all(|v| v.is_finite()) {
                return Err(GeometryError::NonFinite { index });
            }
            if !(r.width() > 0.0) {
                return Err(GeometryError::ZeroWidth { index, width: r.width() });
            }
            if (r.top - top).abs() > EDGE_TOLERANCE || (r.bottom - bottom).abs() > EDGE_TOLERANCE {
                return Err(GeometryError::MismatchedEdges { index });
            }
            if index > 0 && (r.left - regions[index - 1].right).abs() > EDGE_TOLERANCE {
                return Err(GeometryError::NotContiguous { index, prev: index - 1 });
            }
        }
        Ok(Self { regions })
    }

    /// Build from the four vertical boundaries `x1 < x2 < x3 < x4` and the shared edges.
    pub fn from_boundaries(xs: [f32; 4], top: f32, bottom: f32) -> Result<Self, GeometryError> {
        let region = |i: usize| Region { left: xs[i], right: xs[i + 1], top, bottom };
        Self::new([region(0), region(1), region(2)])
    }

    /// Three equal regions of `width` × `height` starting at the origin.
    pub fn uniform(width: f32, height: f32) -> Result<Self, GeometryError> {
        Self::from_boundaries([0.0, width, 2.0 * width, 3.0 * width], 0.0, height)
    }

    pub fn regions(&self) -> &[Region; REGION_COUNT] {
        &self.regions
    }

    /// Region by index. Panics if `index >= REGION_COUNT`.
    pub fn region(&self, index: usize) -> &Region {
        &self.regions[index]
    }

    /// Union bounding box of the three regions.
    pub fn bounds(&self) -> Region {
        Region {
            left: self.regions[0].left,
            right: self.regions[REGION_COUNT - 1].right,
            top: self.regions[0].top,
            bottom: self.regions[0].bottom,
        }
    }

    /// Index of the region whose horizontal span holds `x`, if any.
    pub fn region_at(&self, x: f32) -> Option<usize> {
        let bounds = self.bounds();
        if x < bounds.left || x > bounds.right {
            return None;
        }
        self.regions
            .iter()
            .position(|r| x < r.right)
            .or(Some(REGION_COUNT - 1))
    }

    /// Convert a region-normalised coordinate to global normalised space
    /// (the union bounding box mapped to the unit square).
    pub fn to_global(&self, region: usize, u: Vec2) -> Vec2 {
        let bounds = self.bounds();
        let p = self.regions[region].to_pixel(u);
        Vec2::new(
            (p.x - bounds.left) / bounds.width(),
            (p.y - bounds.top) / bounds.height(),
        )
    }

    /// Factor converting a global-normalised vector into region-normalised units.
    pub fn global_to_local_scale(&self, region: usize) -> Vec2 {
        let bounds = self.bounds();
        let r = &self.regions[region];
        Vec2::new(bounds.width() / r.width(), bounds.height() / r.height())
    }
}
