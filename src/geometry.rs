//! Geometry domain: space-tagged points and rectangles.
//!
//! Every value carries the coordinate space it lives in as a type parameter,
//! so a global point can never be passed where a capture-pixel rect is expected.
//!
//! Spaces:
//!   - Global       : union of all displays, one shared origin, y grows upward
//!   - Local        : relative to one display's frame origin, y grows upward
//!   - CapturePixels: raw bitmap grid, top-left origin, scaled by pixel density
//!   - Normalized   : [0, 1] relative to a captured bitmap, bottom-left origin
//!
//! `to_capture_pixels` is the only function that flips the vertical axis.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Marker trait for a coordinate space.
pub trait Space: Debug + Clone + Copy + PartialEq + Default {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Global;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturePixels;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalized;

impl Space for Global {}
impl Space for Local {}
impl Space for CapturePixels {}
impl Space for Normalized {}

// ── Point ───────────────────────────────────────────────────────────

/// A real-valued coordinate in space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<S: Space> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: Space> Point<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }
}

// ── Rect ────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in space `S`.
///
/// `origin` is the corner with the smallest coordinates. Rects built by
/// `rect_from_points` always have non-negative width and height; rects
/// built by hand (e.g. OCR boxes) are taken as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Rect<S: Space> {
    pub origin: Point<S>,
    pub width: f64,
    pub height: f64,
}

impl<S: Space> Rect<S> {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Build a rect from its min/max edges.
    pub fn from_edges(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.origin.y + self.height / 2.0
    }

    pub fn center(&self) -> Point<S> {
        Point::new(self.mid_x(), self.mid_y())
    }

    /// True when the rect encloses no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: min edges inclusive, max edges exclusive.
    pub fn contains(&self, point: Point<S>) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }
}

// ── Transforms ──────────────────────────────────────────────────────

/// Convert a global point into the local space of the surface with `frame`.
pub fn to_local(global: Point<Global>, frame: &Rect<Global>) -> Point<Local> {
    Point::new(global.x - frame.origin.x, global.y - frame.origin.y)
}

/// Convert a global rect into the local space of the surface with `frame`.
pub fn to_local_rect(global: Rect<Global>, frame: &Rect<Global>) -> Rect<Local> {
    let origin = to_local(global.origin, frame);
    Rect::new(origin.x, origin.y, global.width, global.height)
}

/// Convert a local rect into the capture-pixel grid of its surface.
///
/// Flips the y-axis (local space grows upward, the bitmap grows downward)
/// and scales every component by `pixel_scale`.
pub fn to_capture_pixels(
    local: Rect<Local>,
    surface_frame_height: f64,
    pixel_scale: f64,
) -> Rect<CapturePixels> {
    Rect::new(
        local.origin.x * pixel_scale,
        (surface_frame_height - local.origin.y - local.height) * pixel_scale,
        local.width * pixel_scale,
        local.height * pixel_scale,
    )
}

// ── Rectangle algebra ───────────────────────────────────────────────

/// Normalized rect spanning two corner points, whatever the drag direction.
pub fn rect_from_points<S: Space>(a: Point<S>, b: Point<S>) -> Rect<S> {
    Rect::new(
        a.x.min(b.x),
        a.y.min(b.y),
        (a.x - b.x).abs(),
        (a.y - b.y).abs(),
    )
}

/// Overlap of two rects, or `None` when they share no area.
pub fn intersect_rect<S: Space>(a: &Rect<S>, b: &Rect<S>) -> Option<Rect<S>> {
    let min_x = a.min_x().max(b.min_x());
    let min_y = a.min_y().max(b.min_y());
    let max_x = a.max_x().min(b.max_x());
    let max_y = a.max_y().min(b.max_y());
    if max_x <= min_x || max_y <= min_y {
        return None;
    }
    Some(Rect::from_edges(min_x, min_y, max_x, max_y))
}

/// Smallest rect containing both `rect` and `point`.
pub fn union_point<S: Space>(rect: &Rect<S>, point: Point<S>) -> Rect<S> {
    Rect::from_edges(
        rect.min_x().min(point.x),
        rect.min_y().min(point.y),
        rect.max_x().max(point.x),
        rect.max_y().max(point.y),
    )
}
