//! Particle Effects
//!
//! Short-lived visual debris spawned by combat and movement. One
//! `Particle` type covers every kind; the kind only picks the initial
//! spread and how life decays. All randomness comes from the caller's
//! deterministic RNG.

use std::f32::consts::TAU;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::game::body::Facing;

/// Particle kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Hit spray, heavy gravity
    Blood,
    /// Chest smoke, drifts up
    Smoke,
    /// Skid dust behind a slowed landing
    Dust,
    /// Footfall and landing puffs
    Footstep,
    /// Static glint around a closed chest
    Sparkle,
}

/// How a particle's life runs out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
enum Decay {
    /// Lose one unit per tick, die at zero
    PerTick,
    /// Lose `dt / divisor` per tick, die below zero
    PerMs(f32),
}

/// A single particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Kind
    pub kind: ParticleKind,
    /// Position
    pub x: f32,
    /// Position
    pub y: f32,
    /// Position at the start of the tick
    pub prev_x: f32,
    /// Position at the start of the tick
    pub prev_y: f32,
    /// Visual radius
    pub size: f32,
    speed_x: f32,
    speed_y: f32,
    gravity: f32,
    life: f32,
    max_life: f32,
    decay: Decay,
    marked_for_deletion: bool,
}

impl Particle {
    fn spawn(kind: ParticleKind, x: f32, y: f32, size: f32, decay: Decay) -> Self {
        Self {
            kind,
            x,
            y,
            prev_x: x,
            prev_y: y,
            size,
            speed_x: 0.0,
            speed_y: 0.0,
            gravity: 0.0,
            life: 1.0,
            max_life: 1.0,
            decay,
            marked_for_deletion: false,
        }
    }

    fn with_motion(mut self, speed_x: f32, speed_y: f32, gravity: f32) -> Self {
        self.speed_x = speed_x;
        self.speed_y = speed_y;
        self.gravity = gravity;
        self
    }

    fn with_life(mut self, life: f32) -> Self {
        self.life = life;
        self.max_life = life;
        self
    }

    /// Blood droplet.
    pub fn blood(x: f32, y: f32, rng: &mut DeterministicRng) -> Self {
        let size = rng.range_f32(2.0, 7.0);
        let speed_x = rng.range_f32(-3.0, 3.0);
        let speed_y = rng.range_f32(-12.0, -2.0);
        Self::spawn(ParticleKind::Blood, x, y, size, Decay::PerMs(10.0))
            .with_motion(speed_x, speed_y, 0.5)
            .with_life(100.0)
    }

    /// Smoke puff.
    pub fn smoke(x: f32, y: f32, rng: &mut DeterministicRng) -> Self {
        let size = rng.range_f32(10.0, 25.0);
        let speed_x = rng.spread_f32(1.25);
        let speed_y = rng.range_f32(-2.8, -0.8);
        let life = rng.range_f32(80.0, 180.0);
        Self::spawn(ParticleKind::Smoke, x, y, size, Decay::PerTick)
            .with_motion(speed_x, speed_y, 0.01)
            .with_life(life)
    }

    /// Skid dust kicked away from the facing direction.
    pub fn dust(x: f32, y: f32, facing: Facing, rng: &mut DeterministicRng) -> Self {
        let size = rng.range_f32(2.0, 6.0);
        let speed_x = rng.spread_f32(1.0) - facing.sign();
        let speed_y = rng.range_f32(-2.0, -0.5);
        let life = rng.range_f32(20.0, 60.0);
        Self::spawn(ParticleKind::Dust, x, y, size, Decay::PerTick)
            .with_motion(speed_x, speed_y, 0.1)
            .with_life(life)
    }

    /// Footstep puff; directional while running, symmetric on landing.
    pub fn footstep(x: f32, y: f32, facing: Option<Facing>, rng: &mut DeterministicRng) -> Self {
        let size = rng.range_f32(2.0, 6.0);
        let speed_x = match facing {
            Some(facing) => rng.spread_f32(0.5) - 1.5 * facing.sign(),
            None => rng.spread_f32(1.5),
        };
        let speed_y = rng.range_f32(-2.0, -0.5);
        let life = rng.range_f32(20.0, 60.0);
        Self::spawn(ParticleKind::Footstep, x, y, size, Decay::PerTick)
            .with_motion(speed_x, speed_y, 0.08)
            .with_life(life)
    }

    /// Motionless glint on a ring around `(cx, cy)`.
    pub fn sparkle(cx: f32, cy: f32, ring: f32, rng: &mut DeterministicRng) -> Self {
        let angle = rng.next_f32() * TAU;
        let radius = rng.next_f32() * ring + 25.0;
        let size = rng.range_f32(1.0, 3.5);
        let life = rng.range_f32(40.0, 100.0);
        Self::spawn(
            ParticleKind::Sparkle,
            cx + angle.cos() * radius,
            cy + angle.sin() * radius,
            size,
            Decay::PerTick,
        )
        .with_life(life)
    }

    /// Advance one tick.
    pub fn update(&mut self, dt_ms: f64) {
        self.prev_x = self.x;
        self.prev_y = self.y;

        match self.decay {
            Decay::PerTick => {
                self.life -= 1.0;
                if self.life <= 0.0 {
                    self.marked_for_deletion = true;
                }
            }
            Decay::PerMs(divisor) => {
                self.life -= dt_ms as f32 / divisor;
                if self.life < 0.0 {
                    self.marked_for_deletion = true;
                }
            }
        }

        self.speed_y += self.gravity;
        self.x += self.speed_x;
        self.y += self.speed_y;
    }

    /// Remaining life as a fraction of the initial life.
    pub fn alpha(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    /// Culling box.
    pub fn bounds(&self) -> Rect {
        match self.kind {
            ParticleKind::Blood => Rect::new(self.x, self.y, 5.0, 5.0),
            _ => Rect::new(self.x, self.y, self.size * 2.0, self.size * 2.0),
        }
    }

    /// Flagged for removal.
    #[inline]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.kind as u8);
        hasher.update_point(self.x, self.y);
        hasher.update_f32(self.life);
    }
}
