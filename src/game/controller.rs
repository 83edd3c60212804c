//! Player Controller
//!
//! Turns the per-tick [`ActionState`] into player actions. This is the
//! attack/movement gating state machine:
//!
//! - Jump, shoot and melee fire only on the rising edge of their input.
//! - Nothing new starts while a shoot or melee clip is playing.
//! - An attack started on the ground locks horizontal movement until it
//!   ends. An attack started in the air only slows movement once the
//!   player lands, and kicks up dust while moving.
//! - Holding both directions means standing still; held long enough it
//!   plays a confused cue once.

use serde::{Serialize, Deserialize};

use crate::game::animation::{Anim, Animated};
use crate::game::events::{EventQueue, GameEventData, SoundCue};
use crate::game::input::{ActionState, EdgeTracker};
use crate::game::registry::{EntityRegistry, TickContext};

/// Shoot frame on which the bullet leaves the barrel.
const MUZZLE_FRAME: u32 = 1;

/// Per-player input state that outlives a single tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerController {
    edges: EdgeTracker,
    confusion_timer_ms: f64,
    confusion_cue_played: bool,
}

impl PlayerController {
    /// Fresh controller with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time both directions have been held.
    #[inline]
    pub fn confusion_timer_ms(&self) -> f64 {
        self.confusion_timer_ms
    }

    /// Apply one tick of input.
    ///
    /// Does nothing without a player or while the player is frozen; the
    /// edge tracker is not advanced either, so a key held through a
    /// freeze does not count as pressed afterwards.
    pub fn update(
        &mut self,
        actions: ActionState,
        registry: &mut EntityRegistry,
        ctx: &TickContext<'_>,
        events: &mut EventQueue,
    ) {
        let (player, _, chests, spawner) = registry.parts_mut();
        let Some(player) = player else {
            return;
        };
        if player.is_frozen() {
            return;
        }

        let pressed = self.edges.update(actions);
        let attacking = player.is_attacking();
        if !attacking {
            player.clear_attack_origin();
        }

        let both = actions.both_directions();
        if both {
            self.confusion_timer_ms += ctx.dt_ms;
            if self.confusion_timer_ms > player.config().confusion_threshold_ms && !self.confusion_cue_played {
                events.sound(SoundCue::WhereToGo);
                self.confusion_cue_played = true;
            }
        } else {
            self.confusion_timer_ms = 0.0;
            self.confusion_cue_played = false;
        }

        if player.just_landed() {
            if !attacking {
                player.animator_mut().play(Anim::Idle);
            }
        } else if !attacking {
            if player.is_grounded() {
                if pressed.jump {
                    player.jump(events);
                } else if pressed.shoot {
                    player.shoot(ctx.now_ms, events);
                } else if pressed.melee {
                    player.melee_attack(events);
                } else if actions.single_direction().is_some() {
                    player.animator_mut().play(Anim::Run);
                } else {
                    player.animator_mut().play(Anim::Idle);
                }
            } else if pressed.shoot {
                player.shoot(ctx.now_ms, events);
            } else if pressed.melee {
                player.melee_attack(events);
            } else {
                player.animator_mut().play(Anim::Jump);
            }
        }

        let animator = player.animator();
        if animator.is_playing(Anim::Shoot) && animator.frame() == MUZZLE_FRAME && !player.has_fired() {
            let (x, y) = player.muzzle();
            let bullet = spawner.spawn_bullet(x, y, player.body.facing);
            player.mark_fired();
            events.emit(GameEventData::BulletFired { bullet });
        }

        if actions.interact() && player.is_grounded() {
            let mut opened = false;
            for chest in chests.iter_mut().filter(|c| c.can_open()) {
                if !opened {
                    player.freeze(events);
                    opened = true;
                }
                chest.open(events, spawner);
            }
            if opened {
                return;
            }
        }

        let action_locked = attacking && player.attack_started_on_ground();
        if action_locked {
            player.body.speed_x = 0.0;
            return;
        }

        let slowed = player.is_grounded() && attacking && !player.attack_started_on_ground();
        let speed = if slowed {
            player.config().speed * player.config().attack_slowdown
        } else {
            player.config().speed
        };

        let direction = actions.single_direction();
        if slowed && direction.is_some() {
            let body = &player.body;
            let (x, y) = (body.center_x() + 5.0, body.y + body.height - 10.0);
            spawner.spawn_dust(x, y, body.facing);
        }

        match direction {
            Some(facing) => {
                player.body.speed_x = speed * facing.sign();
                player.body.facing = facing;
            }
            None => player.body.speed_x = 0.0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::body::Facing;
    use crate::game::config::GameConfig;
    use crate::game::level::{Level, LevelData};
    use crate::game::chest::ChestState;

    const STEP: f64 = 1000.0 / 60.0;

    struct Rig {
        level: Level,
        registry: EntityRegistry,
        controller: PlayerController,
        events: EventQueue,
        tick: u32,
    }

    impl Rig {
        fn new(chests: Vec<f32>) -> Self {
            let level = LevelData {
                ground_y: 525.0,
                platforms: Vec::new(),
                enemies: Vec::new(),
                chests,
                eyes: Vec::new(),
            }
            .build()
            .unwrap();
            let registry = EntityRegistry::populate(&GameConfig::default(), &level, 3).unwrap();
            Self { level, registry, controller: PlayerController::new(), events: EventQueue::new(), tick: 0 }
        }

        fn step(&mut self, actions: ActionState) {
            let ctx = TickContext {
                dt_ms: STEP,
                now_ms: self.tick as f64 * STEP,
                playing: true,
                level: &self.level,
                world_width: 6000.0,
            };
            self.controller.update(actions, &mut self.registry, &ctx, &mut self.events);
            self.registry.update(&ctx, &mut self.events);
            self.registry.cull();
            self.tick += 1;
        }

        fn player(&self) -> &crate::game::player::Player {
            self.registry.player().unwrap()
        }

        fn sounds(&mut self) -> Vec<SoundCue> {
            self.events.take().iter().filter_map(|e| e.sound_cue()).collect()
        }
    }

    fn held(flags: u8) -> ActionState {
        ActionState::from_bits(flags)
    }

    #[test]
    fn test_held_jump_fires_once() {
        let mut rig = Rig::new(Vec::new());
        for _ in 0..120 {
            rig.step(held(ActionState::JUMP));
        }
        let jumps = rig.sounds().iter().filter(|&&c| c == SoundCue::Jump).count();
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_jump_while_airborne_is_ignored() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::JUMP));
        rig.step(ActionState::new());
        assert!(!rig.player().is_grounded());

        rig.step(held(ActionState::JUMP));
        let jumps = rig.sounds().iter().filter(|&&c| c == SoundCue::Jump).count();
        assert_eq!(jumps, 1);
        assert!(rig.player().body.speed_y > -22.0);
    }

    #[test]
    fn test_press_on_landing_tick_is_not_retroactive() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::JUMP));
        rig.step(ActionState::new());
        while !rig.player().just_landed() {
            rig.step(ActionState::new());
        }

        // Rising edge lands on the tick that sees just_landed
        rig.step(held(ActionState::JUMP));
        assert!(rig.player().is_grounded());

        // Still held: not a new press
        rig.step(held(ActionState::JUMP));
        assert!(rig.player().is_grounded());
        let jumps = rig.sounds().iter().filter(|&&c| c == SoundCue::Jump).count();
        assert_eq!(jumps, 1);

        // Release and press again
        rig.step(ActionState::new());
        rig.step(held(ActionState::JUMP));
        assert!(rig.player().body.speed_y < 0.0);
    }

    #[test]
    fn test_ground_attack_locks_movement() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::MELEE));
        assert!(rig.player().animator().is_playing(Anim::Melee));

        let x = rig.player().body.x;
        for _ in 0..10 {
            rig.step(held(ActionState::MOVE_RIGHT));
            assert_eq!(rig.player().body.speed_x, 0.0);
        }
        assert_eq!(rig.player().body.x, x);
    }

    #[test]
    fn test_air_attack_slows_after_landing() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::JUMP));
        // Airborne for 43 ticks; swing near the end so it is still
        // playing on landing
        for _ in 0..38 {
            rig.step(ActionState::new());
        }
        rig.step(held(ActionState::MELEE));
        assert!(!rig.player().attack_started_on_ground());

        while !rig.player().is_grounded() {
            rig.step(held(ActionState::MOVE_RIGHT));
        }
        let particles_before = rig.registry.spawner().particles().len();
        rig.step(held(ActionState::MOVE_RIGHT));

        assert!(rig.player().animator().is_playing(Anim::Melee));
        assert!((rig.player().body.speed_x - 1.6).abs() < 1e-6);
        assert!(rig.registry.spawner().particles().len() >= particles_before + 3);
    }

    #[test]
    fn test_both_directions_stand_still_and_confuse_once() {
        let mut rig = Rig::new(Vec::new());
        let both = held(ActionState::MOVE_LEFT | ActionState::MOVE_RIGHT);
        for _ in 0..90 {
            rig.step(both);
            assert_eq!(rig.player().body.speed_x, 0.0);
        }
        assert!(rig.player().animator().is_playing(Anim::Idle));
        let cues = rig.sounds().iter().filter(|&&c| c == SoundCue::WhereToGo).count();
        assert_eq!(cues, 1);

        rig.step(ActionState::new());
        assert_eq!(rig.controller.confusion_timer_ms(), 0.0);
    }

    #[test]
    fn test_bullet_spawns_on_muzzle_frame_once() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::SHOOT));
        assert!(rig.registry.spawner().bullets().is_empty());

        let mut spawned_at = None;
        for i in 0..30 {
            rig.step(held(ActionState::SHOOT));
            if spawned_at.is_none() && !rig.registry.spawner().bullets().is_empty() {
                spawned_at = Some(i);
            }
        }
        assert!(spawned_at.is_some());
        let fired = rig
            .events
            .take()
            .iter()
            .filter(|e| matches!(e.data, GameEventData::BulletFired { .. }))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_bullet_origin_by_facing() {
        let mut rig = Rig::new(Vec::new());
        rig.step(held(ActionState::MOVE_LEFT));
        rig.step(ActionState::new());
        assert_eq!(rig.player().body.facing, Facing::Left);

        rig.step(held(ActionState::SHOOT));
        while rig.registry.spawner().bullets().is_empty() {
            rig.step(ActionState::new());
        }
        let bullet = &rig.registry.spawner().bullets()[0];
        assert_eq!(bullet.facing, Facing::Left);
        assert!(bullet.x < rig.player().body.x);
    }

    #[test]
    fn test_interact_opens_chest_in_range() {
        // Player centre 500, chest centre 564: in range
        let mut rig = Rig::new(vec![500.0]);
        rig.step(ActionState::new());
        rig.step(held(ActionState::INTERACT | ActionState::MOVE_RIGHT));

        assert_eq!(rig.registry.chests()[0].state(), ChestState::Opening);
        assert!(rig.player().is_frozen());
        assert_eq!(rig.registry.spawner().scrolls().len(), 1);

        let x = rig.player().body.x;
        for _ in 0..10 {
            rig.step(held(ActionState::MOVE_RIGHT | ActionState::JUMP));
        }
        assert_eq!(rig.player().body.x, x);
        assert!(rig.sounds().contains(&SoundCue::ChestOpen));
    }

    #[test]
    fn test_interact_out_of_range_does_nothing() {
        let mut rig = Rig::new(vec![3000.0]);
        rig.step(ActionState::new());
        rig.step(held(ActionState::INTERACT));
        assert_eq!(rig.registry.chests()[0].state(), ChestState::Closed);
        assert!(!rig.player().is_frozen());
    }
}
