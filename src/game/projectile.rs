//! Bullets
//!
//! Straight-line projectiles. A bullet damages at most one enemy; the
//! collision pass marks it on the first hit.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::game::body::Facing;
use crate::game::config::BulletConfig;
use crate::game::state::EntityId;

/// A bullet in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Identity
    pub id: EntityId,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Left edge at the start of the tick
    pub prev_x: f32,
    /// Top edge at the start of the tick
    pub prev_y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Travel direction
    pub facing: Facing,
    /// Damage applied on hit
    pub damage: u32,
    /// Opacity, fades near the end of the range
    pub alpha: f32,
    speed_x: f32,
    start_x: f32,
    max_distance: f32,
    fade_start: f32,
    marked_for_deletion: bool,
}

impl Bullet {
    /// Fire a bullet from `(x, y)`.
    pub fn new(id: EntityId, x: f32, y: f32, facing: Facing, config: &BulletConfig) -> Self {
        Self {
            id,
            x,
            y,
            prev_x: x,
            prev_y: y,
            width: config.width,
            height: config.height,
            facing,
            damage: config.damage,
            alpha: 1.0,
            speed_x: config.speed * facing.sign(),
            start_x: x,
            max_distance: config.max_distance,
            fade_start: config.max_distance * config.fade_start,
            marked_for_deletion: false,
        }
    }

    /// Move one tick; fade and expire by distance or world bounds.
    pub fn update(&mut self, world_width: f32) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.x += self.speed_x;

        let traveled = self.distance_traveled();
        if traveled > self.fade_start {
            let fade_range = self.max_distance - self.fade_start;
            self.alpha = (1.0 - (traveled - self.fade_start) / fade_range).max(0.0);
        }

        if self.x < 0.0 || self.x > world_width || traveled >= self.max_distance {
            self.marked_for_deletion = true;
        }
    }

    /// Collision box.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Distance flown since spawn.
    pub fn distance_traveled(&self) -> f32 {
        (self.x - self.start_x).abs()
    }

    /// Flag for removal. Idempotent.
    #[inline]
    pub fn mark_for_deletion(&mut self) {
        self.marked_for_deletion = true;
    }

    /// Flagged for removal.
    #[inline]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_point(self.x, self.y);
        hasher.update_bool(self.marked_for_deletion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_at_max_distance() {
        let config = BulletConfig::default();
        let mut bullet = Bullet::new(EntityId(1), 1000.0, 300.0, Facing::Right, &config);

        // 700px at 15px per tick
        for _ in 0..46 {
            bullet.update(6000.0);
            assert!(!bullet.is_marked_for_deletion());
        }
        bullet.update(6000.0);
        assert!(bullet.is_marked_for_deletion());
        assert_eq!(bullet.alpha, 0.0);
    }

    #[test]
    fn test_fades_after_eighty_percent() {
        let config = BulletConfig::default();
        let mut bullet = Bullet::new(EntityId(1), 1000.0, 300.0, Facing::Left, &config);
        for _ in 0..37 {
            bullet.update(6000.0);
        }
        // 555px flown, fade starts at 560
        assert_eq!(bullet.alpha, 1.0);
        bullet.update(6000.0);
        assert!(bullet.alpha < 1.0 && bullet.alpha > 0.0);
    }

    #[test]
    fn test_leaving_world_deletes() {
        let config = BulletConfig::default();
        let mut bullet = Bullet::new(EntityId(1), 10.0, 300.0, Facing::Left, &config);
        bullet.update(6000.0);
        assert!(bullet.is_marked_for_deletion());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut bullet = Bullet::new(EntityId(1), 10.0, 0.0, Facing::Right, &BulletConfig::default());
        bullet.mark_for_deletion();
        bullet.mark_for_deletion();
        assert!(bullet.is_marked_for_deletion());
    }
}
