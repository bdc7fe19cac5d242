//! World ⇄ screen coordinate transform.
//!
//! `screen = world * scale + pan` and `world = (screen - pan) / scale`.
//! Pinned nodes already store screen coordinates and must never be passed
//! through these functions.

use crate::model::{Bounds, Point};
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 3.0;

/// Map one world coordinate to screen space.
pub fn world_to_screen(p: f32, scale: f32, pan: f32) -> f32 {
    p * scale + pan
}

/// Map one screen coordinate to world space.
pub fn screen_to_world(p: f32, scale: f32, pan: f32) -> f32 {
    (p - pan) / scale
}

/// Clamp a zoom level into `[min, max]`. NaN falls back to 1; an inverted
/// range resolves to `max`.
pub fn clamp_scale_to(scale: f32, min: f32, max: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.max(min).min(max)
}

/// Pan and zoom of the infinite canvas. The camera takes its scale as
/// given; zoom limits belong to whoever builds it (see
/// `BoardConfig::clamp_scale`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Camera {
    pub fn new(scale: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(
            world_to_screen(p.x, self.scale, self.pan_x),
            world_to_screen(p.y, self.scale, self.pan_y),
        )
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new(
            screen_to_world(p.x, self.scale, self.pan_x),
            screen_to_world(p.y, self.scale, self.pan_y),
        )
    }

    pub fn world_bounds_to_screen(&self, b: &Bounds) -> Bounds {
        let origin = self.world_to_screen(Point::new(b.x, b.y));
        Bounds::new(
            origin.x,
            origin.y,
            b.width * self.scale,
            b.height * self.scale,
        )
    }

    pub fn screen_bounds_to_world(&self, b: &Bounds) -> Bounds {
        let origin = self.screen_to_world(Point::new(b.x, b.y));
        Bounds::new(
            origin.x,
            origin.y,
            b.width / self.scale,
            b.height / self.scale,
        )
    }

    /// Change the zoom while keeping the world point under `anchor`
    /// (a screen point) visually fixed. `new_scale` must already be clamped.
    pub fn zoom_at(&self, new_scale: f32, anchor: Point) -> Camera {
        let world = self.screen_to_world(anchor);
        Camera {
            scale: new_scale,
            pan_x: anchor.x - world.x * new_scale,
            pan_y: anchor.y - world.y * new_scale,
        }
    }

    /// Translate by a screen-space delta.
    pub fn panned(&self, dx: f32, dy: f32) -> Camera {
        Camera {
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
            ..*self
        }
    }

    /// Camera that shows `content` centered in a `viewport_w × viewport_h`
    /// screen with `margin` pixels on every side. The scale is not clamped;
    /// degenerate content gets `MAX_SCALE`.
    pub fn fit(content: &Bounds, viewport_w: f32, viewport_h: f32, margin: f32) -> Camera {
        let avail_w = (viewport_w - margin * 2.0).max(1.0);
        let avail_h = (viewport_h - margin * 2.0).max(1.0);
        let sx = if content.width > 0.0 {
            avail_w / content.width
        } else {
            MAX_SCALE
        };
        let sy = if content.height > 0.0 {
            avail_h / content.height
        } else {
            MAX_SCALE
        };
        let scale = sx.min(sy);
        let c = content.center();
        Camera {
            scale,
            pan_x: viewport_w / 2.0 - c.x * scale,
            pan_y: viewport_h / 2.0 - c.y * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn world_screen_roundtrip() {
        let cam = Camera::new(1.5, 40.0, -20.0);
        let world = Point::new(123.0, -45.0);
        let screen = cam.world_to_screen(world);
        assert_eq!(screen, Point::new(224.5, -87.5));
        assert!(close(cam.screen_to_world(screen), world));
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(clamp_scale_to(10.0, MIN_SCALE, MAX_SCALE), MAX_SCALE);
        assert_eq!(clamp_scale_to(0.0, MIN_SCALE, MAX_SCALE), MIN_SCALE);
        assert_eq!(clamp_scale_to(f32::NAN, MIN_SCALE, MAX_SCALE), 1.0);
        assert_eq!(clamp_scale_to(10.0, 0.05, 8.0), 8.0);
        assert_eq!(clamp_scale_to(0.06, 0.05, 8.0), 0.06);
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let cam = Camera::new(1.0, 10.0, 20.0);
        let anchor = Point::new(300.0, 200.0);
        let before = cam.screen_to_world(anchor);
        let zoomed = cam.zoom_at(2.0, anchor);
        assert_eq!(zoomed.scale, 2.0);
        assert!(close(zoomed.screen_to_world(anchor), before));
        assert!(close(zoomed.world_to_screen(before), anchor));
    }

    #[test]
    fn zoom_at_takes_scale_as_given() {
        let cam = Camera::default();
        let zoomed = cam.zoom_at(5.0, Point::new(0.0, 0.0));
        assert_eq!(zoomed.scale, 5.0);
    }

    #[test]
    fn fit_centers_content() {
        let content = Bounds::new(100.0, 100.0, 400.0, 200.0);
        let cam = Camera::fit(&content, 800.0, 600.0, 0.0);
        assert!((cam.scale - 2.0).abs() < 1e-4);
        assert!(close(
            cam.world_to_screen(content.center()),
            Point::new(400.0, 300.0)
        ));
    }
}
