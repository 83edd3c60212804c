//! Player Entity
//!
//! Movement, landing, footstep feedback and the per-swing/per-shot
//! bookkeeping that combat reads. Input interpretation lives in
//! [`crate::game::controller`]; this module only exposes the actions.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::game::animation::{Anim, Animated, AnimationError, AnimationSet, Animator};
use crate::game::body::{Body, Facing};
use crate::game::config::PlayerConfig;
use crate::game::events::{EventQueue, GameEventData, LoopCue, SoundCue};
use crate::game::registry::{Spawner, TickContext};
use crate::game::state::EntityId;

/// Run frames on which a foot hits the ground.
const FOOTSTEP_FRAMES: [u32; 2] = [2, 6];

/// The player character.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Position and motion
    pub body: Body,
    animator: Animator,
    config: PlayerConfig,
    just_landed: bool,
    frozen: bool,
    attack_started_on_ground: bool,
    has_fired: bool,
    last_shot_ms: Option<f64>,
    hit_set: BTreeSet<EntityId>,
    footsteps_playing: bool,
    last_footstep_frame: Option<u32>,
}

impl Player {
    /// Player standing on the ground, centred in the first screen.
    pub fn new(
        config: &PlayerConfig,
        view_width: f32,
        ground_y: f32,
        gravity: f32,
        animations: AnimationSet,
    ) -> Result<Self, AnimationError> {
        let x = (view_width - config.width) / 2.0;
        let y = ground_y - config.height + config.vertical_offset;
        let mut body = Body::new(x, y, config.width, config.height, config.hitbox_width)
            .with_gravity(gravity)
            .with_vertical_offset(config.vertical_offset);
        body.grounded = true;

        Ok(Self {
            body,
            animator: Animator::new(animations)?,
            config: config.clone(),
            just_landed: false,
            frozen: false,
            attack_started_on_ground: false,
            has_fired: false,
            last_shot_ms: None,
            hit_set: BTreeSet::new(),
            footsteps_playing: false,
            last_footstep_frame: None,
        })
    }

    /// Tuning this player was built with.
    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Resting on a surface.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.body.grounded
    }

    /// Touched down during the last update.
    #[inline]
    pub fn just_landed(&self) -> bool {
        self.just_landed
    }

    /// Input and movement disabled.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Playing a melee or shoot clip.
    #[inline]
    pub fn is_attacking(&self) -> bool {
        self.animator.current().is_attack()
    }

    /// The current attack began on the ground.
    #[inline]
    pub fn attack_started_on_ground(&self) -> bool {
        self.attack_started_on_ground
    }

    /// Forget where the last attack started; called once it is over.
    #[inline]
    pub(crate) fn clear_attack_origin(&mut self) {
        self.attack_started_on_ground = false;
    }

    /// Bullet already spawned for the current shot.
    #[inline]
    pub fn has_fired(&self) -> bool {
        self.has_fired
    }

    #[inline]
    pub(crate) fn mark_fired(&mut self) {
        self.has_fired = true;
    }

    /// Footstep loop currently running.
    #[inline]
    pub fn footsteps_playing(&self) -> bool {
        self.footsteps_playing
    }

    /// Enemies already damaged by the current swing.
    pub fn swing_hits(&self) -> &BTreeSet<EntityId> {
        &self.hit_set
    }

    /// Record a melee hit. Returns false if the enemy was already hit
    /// during this swing.
    pub fn register_swing_hit(&mut self, enemy: EntityId) -> bool {
        self.hit_set.insert(enemy)
    }

    /// Jump, if standing on something.
    pub fn jump(&mut self, events: &mut EventQueue) {
        if !self.body.grounded {
            return;
        }
        self.body.speed_y = self.config.jump_strength;
        self.animator.play(Anim::Jump);
        events.sound(SoundCue::Jump);
    }

    /// Start a melee swing. Always clears the swing's hit set.
    pub fn melee_attack(&mut self, events: &mut EventQueue) {
        self.attack_started_on_ground = self.body.grounded;
        self.animator.play(Anim::Melee);
        self.hit_set.clear();
        events.sound(SoundCue::Melee);
    }

    /// Start a shot unless the cooldown is still running. `now_ms` is
    /// simulation time.
    pub fn shoot(&mut self, now_ms: f64, events: &mut EventQueue) -> bool {
        if let Some(last) = self.last_shot_ms {
            if now_ms - last < self.config.shoot_cooldown_ms {
                return false;
            }
        }

        self.attack_started_on_ground = self.body.grounded;
        self.last_shot_ms = Some(now_ms);
        self.animator.play(Anim::Shoot);
        events.sound(SoundCue::PistolShoot);
        self.has_fired = false;
        true
    }

    /// Stop in place, idle, and ignore input from now on.
    pub fn freeze(&mut self, events: &mut EventQueue) {
        self.frozen = true;
        self.body.speed_x = 0.0;
        self.body.speed_y = 0.0;
        self.animator.play(Anim::Idle);
        self.stop_footsteps(events);
    }

    /// Melee reach in front of the hitbox, or `None` outside a swing.
    pub fn melee_hitbox(&self, range: f32) -> Option<Rect> {
        if !self.animator.is_playing(Anim::Melee) {
            return None;
        }
        let hitbox_left = self.body.x + self.body.hitbox_offset();
        let x = match self.body.facing {
            Facing::Right => hitbox_left + self.body.hitbox_width - 10.0,
            Facing::Left => hitbox_left + 10.0 - range,
        };
        Some(Rect::new(x, self.body.y, range, self.body.height))
    }

    /// Where the muzzle sits for a bullet fired now.
    pub fn muzzle(&self) -> (f32, f32) {
        let x = match self.body.facing {
            Facing::Right => self.body.x + self.body.width - 10.0,
            Facing::Left => self.body.x - 10.0,
        };
        (x, self.body.y + self.body.height * 0.55 - 5.0)
    }

    /// Advance one tick.
    pub fn update(&mut self, ctx: &TickContext<'_>, spawner: &mut Spawner, events: &mut EventQueue) {
        self.body.snapshot();
        self.just_landed = false;
        let was_grounded = self.body.grounded;

        if !ctx.playing || self.frozen {
            self.stop_footsteps(events);
            self.advance_animation(ctx.dt_ms);
            return;
        }

        self.body.x += self.body.speed_x;
        self.body.resolve_vertical(ctx.level.platforms(), ctx.level.ground_y());

        let (foot_x, foot_y) = self.feet();
        if !was_grounded && self.body.grounded {
            self.just_landed = true;
            events.emit(GameEventData::PlayerLanded { x: foot_x, y: foot_y });
            let count = spawner.particle_config().landing_dust_count;
            spawner.spawn_footsteps(foot_x, foot_y, count, None);
        }

        let running = self.body.grounded && self.body.speed_x != 0.0;
        if running && !self.footsteps_playing {
            self.footsteps_playing = true;
            events.emit(GameEventData::LoopStarted { cue: LoopCue::Footsteps });
        } else if !running {
            self.stop_footsteps(events);
        }

        let max_x = (ctx.world_width - self.body.width).max(0.0);
        self.body.x = self.body.x.clamp(0.0, max_x);

        self.advance_animation(ctx.dt_ms);

        if self.animator.is_playing(Anim::Run) && self.body.grounded {
            let frame = self.animator.frame();
            if FOOTSTEP_FRAMES.contains(&frame) && self.last_footstep_frame != Some(frame) {
                let (foot_x, foot_y) = self.feet();
                let count = spawner.particle_config().running_dust_count;
                spawner.spawn_footsteps(foot_x, foot_y, count, Some(self.body.facing));
            }
            self.last_footstep_frame = Some(frame);
        } else {
            self.last_footstep_frame = None;
        }
    }

    fn feet(&self) -> (f32, f32) {
        (self.body.center_x(), self.body.y + self.body.height - 5.0)
    }

    fn stop_footsteps(&mut self, events: &mut EventQueue) {
        if self.footsteps_playing {
            self.footsteps_playing = false;
            events.emit(GameEventData::LoopStopped { cue: LoopCue::Footsteps });
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        self.body.hash_into(hasher);
        self.animator.hash_into(hasher);
        hasher.update_bool(self.frozen);
        hasher.update_bool(self.attack_started_on_ground);
        hasher.update_bool(self.has_fired);
        hasher.update_f64(self.last_shot_ms.unwrap_or(-1.0));
        hasher.update_u32(self.hit_set.len() as u32);
        for id in &self.hit_set {
            hasher.update_u32(id.0);
        }
    }
}

impl Animated for Player {
    fn animator(&self) -> &Animator {
        &self.animator
    }

    fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    fn on_animation_complete(&mut self, _finished: Anim) {
        let next = if self.body.grounded { Anim::Idle } else { Anim::Jump };
        self.animator.play(next);
    }
}

// =============================================================================
// TESTS
// =============================================================================
