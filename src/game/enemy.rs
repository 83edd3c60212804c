//! Enemies
//!
//! Patrol back and forth from a spawn point, take damage, and play a
//! death sequence before being reaped. An enemy is never removed on the
//! tick its health reaches zero: it plays `Dead` to the last frame,
//! then sinks and fades for a fixed time, then marks itself.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::game::animation::{Anim, Animated, AnimationError, AnimationSet, Animator};
use crate::game::body::{Body, Facing};
use crate::game::config::EnemyConfig;
use crate::game::events::{EventQueue, GameEventData, SoundCue};
use crate::game::level::SpawnPoint;
use crate::game::state::EntityId;
use crate::game::registry::TickContext;

/// Result of applying damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target already dead, nothing changed
    Ignored,
    /// Health dropped, still alive
    Hurt,
    /// Health reached zero on this hit
    Killed,
}

/// A patrolling enemy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enemy {
    /// Identity
    pub id: EntityId,
    /// Position and motion
    pub body: Body,
    animator: Animator,
    config: EnemyConfig,
    patrol_start_x: f32,
    health: u32,
    max_health: u32,
    dead: bool,
    death_timer_ms: f64,
    corpse_y: Option<f32>,
    /// Opacity, drops to zero while the corpse sinks
    pub alpha: f32,
    marked_for_deletion: bool,
}

impl Enemy {
    /// Spawn an enemy walking left from `spawn`.
    pub fn new(
        id: EntityId,
        spawn: SpawnPoint,
        config: &EnemyConfig,
        animations: AnimationSet,
        gravity: f32,
    ) -> Result<Self, AnimationError> {
        let mut body = Body::new(spawn.x, spawn.y, config.width, config.height, config.hitbox_width)
            .with_gravity(gravity)
            .with_vertical_offset(config.vertical_offset);
        body.speed_x = -config.speed;
        body.facing = Facing::Left;

        Ok(Self {
            id,
            body,
            animator: Animator::new(animations)?,
            config: config.clone(),
            patrol_start_x: spawn.x,
            health: config.health,
            max_health: config.health,
            dead: false,
            death_timer_ms: 0.0,
            corpse_y: None,
            alpha: 1.0,
            marked_for_deletion: false,
        })
    }

    /// Current health.
    #[inline]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Starting health.
    #[inline]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Health reached zero.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Flagged for removal.
    #[inline]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Combat hitbox; `None` once dead.
    pub fn hitbox(&self) -> Option<Rect> {
        (!self.dead).then(|| self.body.hitbox())
    }

    /// Apply damage. Health clamps at zero; dead enemies ignore hits.
    pub fn take_damage(&mut self, amount: u32, events: &mut EventQueue) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.dead = true;
            self.body.speed_x = 0.0;
            self.animator.play(Anim::Dead);
            events.sound(SoundCue::EnemyDeath);
            events.emit(GameEventData::EnemyKilled { enemy: self.id });
            debug!(enemy = self.id.0, "enemy killed");
            DamageOutcome::Killed
        } else {
            events.sound(SoundCue::EnemyHit);
            events.emit(GameEventData::EnemyDamaged {
                enemy: self.id,
                amount,
                remaining: self.health,
            });
            DamageOutcome::Hurt
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, ctx: &TickContext<'_>, events: &mut EventQueue) {
        self.body.snapshot();

        if !ctx.playing {
            if self.dead {
                self.sink(ctx.dt_ms, events);
            } else {
                self.animator.play(Anim::Idle);
            }
            self.advance_animation(ctx.dt_ms);
            return;
        }

        if self.dead {
            self.sink(ctx.dt_ms, events);
        } else {
            self.patrol();
            self.body.resolve_vertical(ctx.level.platforms(), ctx.level.ground_y());
        }
        self.advance_animation(ctx.dt_ms);
    }

    fn patrol(&mut self) {
        self.body.x += self.body.speed_x;

        let turn_left_at = self.patrol_start_x - self.config.patrol_range;
        match self.body.facing {
            Facing::Left if self.body.x < turn_left_at => {
                self.body.facing = Facing::Right;
                self.body.speed_x = self.config.speed;
            }
            Facing::Right if self.body.x > self.patrol_start_x => {
                self.body.facing = Facing::Left;
                self.body.speed_x = -self.config.speed;
            }
            _ => {}
        }

        if self.body.speed_x != 0.0 {
            self.animator.play(Anim::Walk);
        } else {
            self.animator.play(Anim::Idle);
        }
    }

    /// Corpse sinks and fades once the death clip reaches its last frame.
    fn sink(&mut self, dt_ms: f64, events: &mut EventQueue) {
        if !self.animator.is_last_frame() {
            return;
        }

        let start_y = *self.corpse_y.get_or_insert(self.body.y);
        self.death_timer_ms += dt_ms;

        let progress = (self.death_timer_ms / self.config.death_sink_ms).min(1.0) as f32;
        self.alpha = 1.0 - progress;
        self.body.y = start_y + self.config.death_sink_depth * progress;

        if self.death_timer_ms > self.config.death_sink_ms && !self.marked_for_deletion {
            self.marked_for_deletion = true;
            events.emit(GameEventData::EnemyRemoved { enemy: self.id });
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        self.body.hash_into(hasher);
        self.animator.hash_into(hasher);
        hasher.update_u32(self.health);
        hasher.update_bool(self.dead);
        hasher.update_f64(self.death_timer_ms);
        hasher.update_bool(self.marked_for_deletion);
    }
}

impl Animated for Enemy {
    fn animator(&self) -> &Animator {
        &self.animator
    }

    fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    fn on_animation_complete(&mut self, _finished: Anim) {
        self.animator.play(Anim::Idle);
    }
}

// =============================================================================
// TESTS
// =============================================================================
