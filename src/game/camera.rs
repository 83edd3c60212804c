//! Side-Scrolling Camera

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;

/// Horizontal camera that keeps its target centred inside the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Left edge of the view in world pixels
    pub x: f32,
    /// Left edge at the start of the tick
    pub prev_x: f32,
    view_width: f32,
    world_width: f32,
}

impl Camera {
    /// Camera at the world's left edge.
    pub fn new(view_width: f32, world_width: f32) -> Self {
        Self { x: 0.0, prev_x: 0.0, view_width, world_width }
    }

    /// Visible width.
    #[inline]
    pub fn view_width(&self) -> f32 {
        self.view_width
    }

    /// Centre on `target`, clamped to `[0, world_width - view_width]`.
    pub fn follow(&mut self, target: &Rect) {
        self.prev_x = self.x;
        let max_x = (self.world_width - self.view_width).max(0.0);
        self.x = (target.center_x() - self.view_width / 2.0).clamp(0.0, max_x);
    }

    /// Stay put this tick.
    #[inline]
    pub fn hold(&mut self) {
        self.prev_x = self.x;
    }

    /// Blend between the last two positions.
    #[inline]
    pub fn interpolated_x(&self, t: f32) -> f32 {
        self.prev_x + (self.x - self.prev_x) * t
    }

    /// Horizontal span visible at blend `t`.
    pub fn visible_span(&self, t: f32) -> (f32, f32) {
        let left = self.interpolated_x(t);
        (left, left + self.view_width)
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_f32(self.x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_centres_and_clamps() {
        let mut camera = Camera::new(1000.0, 6000.0);

        camera.follow(&Rect::new(100.0, 0.0, 128.0, 128.0));
        assert_eq!(camera.x, 0.0);

        camera.follow(&Rect::new(2936.0, 0.0, 128.0, 128.0));
        assert_eq!(camera.x, 2500.0);
        assert_eq!(camera.prev_x, 0.0);

        camera.follow(&Rect::new(5900.0, 0.0, 128.0, 128.0));
        assert_eq!(camera.x, 5000.0);
    }

    #[test]
    fn test_interpolation() {
        let mut camera = Camera::new(1000.0, 6000.0);
        camera.follow(&Rect::new(1436.0, 0.0, 128.0, 128.0));
        assert_eq!(camera.x, 1000.0);
        assert_eq!(camera.interpolated_x(0.25), 250.0);
        assert_eq!(camera.visible_span(1.0), (1000.0, 2000.0));

        camera.hold();
        assert_eq!(camera.interpolated_x(0.25), 1000.0);
    }
}
