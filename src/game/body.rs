//! Physical Bodies and Vertical Resolution
//!
//! Position, velocity and the platform landing test shared by the
//! player and enemies.
//!
//! Landing uses a "crossed the surface this tick" test rather than a
//! plain overlap, so a body falling fast enough to skip past a thin
//! platform within one tick still lands on it:
//!
//! ```text
//!   previous bottom  ──┐   <= platform.y + offset   (started above)
//!                      │
//!   platform.y   ══════╪══════
//!                      │
//!   current bottom   ──┘   >= platform.y            (now at or below)
//! ```

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;

/// Horizontal facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Facing negative x
    Left,
    /// Facing positive x
    #[default]
    Right,
}

impl Facing {
    /// -1 for left, +1 for right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Outcome of vertical resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landing {
    /// Standing on the platform at this index
    Platform(usize),
    /// Standing on the ground line
    Ground,
    /// Not supported
    Airborne,
}

impl Landing {
    /// Resting on any surface.
    #[inline]
    pub fn is_grounded(self) -> bool {
        !matches!(self, Landing::Airborne)
    }
}

/// Position, velocity and collision box of a gravity-bound entity.
///
/// `prev_x`/`prev_y` are written only by [`Body::snapshot`], once at the
/// start of each tick, and are read only by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Left edge at the start of the tick
    pub prev_x: f32,
    /// Top edge at the start of the tick
    pub prev_y: f32,
    /// Sprite width
    pub width: f32,
    /// Sprite height
    pub height: f32,
    /// Collision width, centred in the sprite
    pub hitbox_width: f32,
    /// Horizontal speed per tick
    pub speed_x: f32,
    /// Vertical speed per tick (positive = down)
    pub speed_y: f32,
    /// Added to `speed_y` every tick
    pub gravity: f32,
    /// How far feet sink into a surface
    pub vertical_offset: f32,
    /// Resting on a surface after the last resolution
    pub grounded: bool,
    /// Facing direction
    pub facing: Facing,
}

impl Body {
    /// Create a body at rest.
    pub fn new(x: f32, y: f32, width: f32, height: f32, hitbox_width: f32) -> Self {
        Self {
            x,
            y,
            prev_x: x,
            prev_y: y,
            width,
            height,
            hitbox_width,
            speed_x: 0.0,
            speed_y: 0.0,
            gravity: 1.0,
            vertical_offset: 10.0,
            grounded: false,
            facing: Facing::Right,
        }
    }

    /// Builder: gravity per tick.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder: foot sink depth.
    pub fn with_vertical_offset(mut self, offset: f32) -> Self {
        self.vertical_offset = offset;
        self
    }

    /// Record the interpolation snapshot. Call once, first thing in a tick.
    #[inline]
    pub fn snapshot(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
    }

    /// Inset from the sprite's left edge to the hitbox.
    #[inline]
    pub fn hitbox_offset(&self) -> f32 {
        (self.width - self.hitbox_width) / 2.0
    }

    /// Narrow collision box used for landing and combat.
    #[inline]
    pub fn hitbox(&self) -> Rect {
        Rect::new(self.x + self.hitbox_offset(), self.y, self.hitbox_width, self.height)
    }

    /// Full sprite box.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Horizontal centre.
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical centre.
    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Apply gravity, move, and land on the first surface crossed.
    ///
    /// Platforms are tested in order, then the ground line. Only a body
    /// that is falling or stationary can land.
    pub fn resolve_vertical(&mut self, platforms: &[Rect], ground_y: f32) -> Landing {
        let previous_bottom = self.y + self.height;
        self.speed_y += self.gravity;
        self.y += self.speed_y;

        let landing = if self.speed_y >= 0.0 {
            let hitbox = self.hitbox();
            platforms
                .iter()
                .position(|p| hitbox.overlaps_x(p) && self.crossed(previous_bottom, p.y))
                .map(Landing::Platform)
                .or_else(|| self.crossed(previous_bottom, ground_y).then_some(Landing::Ground))
                .unwrap_or(Landing::Airborne)
        } else {
            Landing::Airborne
        };

        match landing {
            Landing::Platform(index) => self.rest_on(platforms[index].y),
            Landing::Ground => self.rest_on(ground_y),
            Landing::Airborne => {}
        }
        self.grounded = landing.is_grounded();
        landing
    }

    #[inline]
    fn crossed(&self, previous_bottom: f32, surface_y: f32) -> bool {
        previous_bottom <= surface_y + self.vertical_offset && self.y + self.height >= surface_y
    }

    #[inline]
    fn rest_on(&mut self, surface_y: f32) {
        self.y = surface_y - self.height + self.vertical_offset;
        self.speed_y = 0.0;
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_point(self.x, self.y);
        hasher.update_point(self.speed_x, self.speed_y);
        hasher.update_bool(self.grounded);
        hasher.update_bool(self.facing == Facing::Right);
    }
}

// =============================================================================
// TESTS
// =============================================================================
