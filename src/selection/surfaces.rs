//! Display surface registry.
//!
//! Holds the snapshot of display surfaces a selection session spans.
//! The snapshot is taken once at `begin()` and never mutated; a display
//! reconfiguration means the host cancels and starts a new session.

use crate::geometry::{intersect_rect, Global, Point, Rect};
use serde::{Deserialize, Serialize};

/// Host-assigned identifier of one display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// One display: its frame in global space and its pixel density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceDescriptor {
    pub id: SurfaceId,
    pub frame: Rect<Global>,
    /// Backing pixels per global unit. Always positive.
    pub pixel_scale: f64,
}

impl SurfaceDescriptor {
    pub fn new(id: u32, frame: Rect<Global>, pixel_scale: f64) -> Self {
        Self {
            id: SurfaceId(id),
            frame,
            pixel_scale,
        }
    }
}

/// Per-surface view of the live selection, sent to render listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceView {
    pub surface: SurfaceId,
    /// Part of the selection that falls on this surface (global space),
    /// `None` when the selection does not touch it.
    pub visible: Option<Rect<Global>>,
}

/// Supplies the current display list when a session starts.
pub trait SurfaceEnumerator {
    type Error: std::error::Error;

    fn surfaces(&self) -> Result<Vec<SurfaceDescriptor>, Self::Error>;
}

/// Immutable, ordered snapshot of the surfaces in one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceRegistry {
    surfaces: Vec<SurfaceDescriptor>,
}

impl SurfaceRegistry {
    pub fn new(surfaces: Vec<SurfaceDescriptor>) -> Self {
        Self { surfaces }
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfaceDescriptor> {
        self.surfaces.iter()
    }

    pub fn get(&self, id: SurfaceId) -> Option<&SurfaceDescriptor> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    /// Surface whose frame contains `point`, if any.
    pub fn surface_at(&self, point: Point<Global>) -> Option<&SurfaceDescriptor> {
        self.surfaces.iter().find(|s| s.frame.contains(point))
    }

    /// Surface to capture a finished selection from.
    ///
    /// The one containing the rect's center; falls back to the first
    /// registered surface when the center lies in a gap between displays.
    pub fn target_for(&self, rect: &Rect<Global>) -> Option<&SurfaceDescriptor> {
        self.surface_at(rect.center()).or_else(|| self.surfaces.first())
    }

    /// Clip `selection` against every surface, in registration order.
    pub fn clip_all(&self, selection: &Rect<Global>) -> Vec<SurfaceView> {
        self.surfaces
            .iter()
            .map(|s| SurfaceView {
                surface: s.id,
                visible: intersect_rect(selection, &s.frame),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Laptop panel at the origin with an external display to its left,
    /// offset upward, as arranged in a typical dual-display setup.
    fn dual_display() -> SurfaceRegistry {
        SurfaceRegistry::new(vec![
            SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 1440.0, 900.0), 2.0),
            SurfaceDescriptor::new(2, Rect::new(-1920.0, 100.0, 1920.0, 1080.0), 1.0),
        ])
    }

    #[test]
    fn surface_at_finds_containing_frame() {
        let registry = dual_display();
        assert_eq!(registry.surface_at(Point::new(10.0, 10.0)).unwrap().id, SurfaceId(1));
        assert_eq!(registry.surface_at(Point::new(-10.0, 500.0)).unwrap().id, SurfaceId(2));
        assert!(registry.surface_at(Point::new(-10.0, 50.0)).is_none());
    }

    #[test]
    fn target_falls_back_to_first_surface() {
        let registry = dual_display();
        // Center at (-10, 50) sits in the gap below the external display
        let rect = Rect::new(-20.0, 40.0, 20.0, 20.0);
        assert_eq!(registry.target_for(&rect).unwrap().id, SurfaceId(1));

        let on_external = Rect::new(-500.0, 400.0, 100.0, 100.0);
        assert_eq!(registry.target_for(&on_external).unwrap().id, SurfaceId(2));
    }

    #[test]
    fn clip_all_splits_a_straddling_selection() {
        let registry = dual_display();
        let selection = Rect::new(-100.0, 200.0, 300.0, 100.0);
        let views = registry.clip_all(&selection);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].visible, Some(Rect::new(0.0, 200.0, 200.0, 100.0)));
        assert_eq!(views[1].visible, Some(Rect::new(-100.0, 200.0, 100.0, 100.0)));
    }

    #[test]
    fn clip_all_reports_untouched_surfaces() {
        let registry = dual_display();
        let views = registry.clip_all(&Rect::new(100.0, 100.0, 50.0, 50.0));
        assert!(views[0].visible.is_some());
        assert!(views[1].visible.is_none());
    }
}
