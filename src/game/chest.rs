//! Treasure Chest and Scroll
//!
//! The chest sits on the ground line near the end of the level. While
//! closed it glints and reports whether the player is close enough to
//! open it. Opening spawns a scroll that scales in and signals the end
//! of the run once revealed.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::game::animation::{Anim, Animated, AnimationError, AnimationSet, Animator};
use crate::game::config::{ChestConfig, ScrollConfig};
use crate::game::events::{EventQueue, GameEventData, SoundCue};
use crate::game::registry::Spawner;
use crate::game::state::EntityId;

/// Chest lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestState {
    /// Waiting for the player
    #[default]
    Closed,
    /// Lid animation running
    Opening,
    /// Finished, inert
    Open,
}

/// An openable chest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chest {
    /// Identity
    pub id: EntityId,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Sprite width
    pub width: f32,
    /// Sprite height
    pub height: f32,
    state: ChestState,
    animator: Animator,
    player_in_range: bool,
    sparkle_timer_ms: f64,
    config: ChestConfig,
}

impl Chest {
    /// Place a chest standing on `ground_y`.
    pub fn new(
        id: EntityId,
        x: f32,
        ground_y: f32,
        config: &ChestConfig,
        animations: AnimationSet,
    ) -> Result<Self, AnimationError> {
        Ok(Self {
            id,
            x,
            y: ground_y - config.height,
            width: config.width,
            height: config.height,
            state: ChestState::Closed,
            animator: Animator::new(animations)?,
            player_in_range: false,
            sparkle_timer_ms: 0.0,
            config: config.clone(),
        })
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> ChestState {
        self.state
    }

    /// Closed and the player stood within reach at the last update.
    #[inline]
    pub fn can_open(&self) -> bool {
        self.state == ChestState::Closed && self.player_in_range
    }

    /// Sprite box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Advance one tick. `player_center` is the player's box centre, if any.
    pub fn update(&mut self, dt_ms: f64, player_center: Option<(f32, f32)>, spawner: &mut Spawner) {
        self.advance_animation(dt_ms);

        let bounds = self.bounds();
        self.player_in_range = match (self.state, player_center) {
            (ChestState::Closed, Some((px, py))) => {
                let dx = px - bounds.center_x();
                let dy = py - bounds.center_y();
                (dx * dx + dy * dy).sqrt() < self.config.interaction_range
            }
            _ => false,
        };

        if self.state == ChestState::Closed {
            self.sparkle_timer_ms += dt_ms;
            if self.sparkle_timer_ms > self.config.sparkle_interval_ms {
                self.sparkle_timer_ms = 0.0;
                spawner.spawn_sparkles(
                    bounds.center_x(),
                    bounds.center_y(),
                    self.width / 2.0 + 10.0,
                    self.config.sparkles_per_burst,
                );
            }
        }
    }

    /// Start opening. Only a closed chest opens; returns whether it did.
    ///
    /// The caller is responsible for the range check and for freezing
    /// the player.
    pub fn open(&mut self, events: &mut EventQueue, spawner: &mut Spawner) -> bool {
        if self.state != ChestState::Closed {
            return false;
        }

        self.state = ChestState::Opening;
        self.player_in_range = false;
        self.animator.play(Anim::Opening);
        events.sound(SoundCue::ChestOpen);
        events.emit(GameEventData::ChestOpened { chest: self.id });

        let bounds = self.bounds();
        spawner.spawn_smoke(bounds.center_x(), bounds.center_y());
        spawner.spawn_scroll(self.x, self.y, self.width);

        info!(chest = self.id.0, x = self.x, "chest opened");
        true
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.state as u8);
        self.animator.hash_into(hasher);
        hasher.update_f64(self.sparkle_timer_ms);
    }
}

impl Animated for Chest {
    fn animator(&self) -> &Animator {
        &self.animator
    }

    fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    fn on_animation_complete(&mut self, finished: Anim) {
        if finished == Anim::Opening {
            self.state = ChestState::Open;
            self.animator.play(Anim::IdleOpen);
        }
    }
}

// =============================================================================
// SCROLL
// =============================================================================

/// Scroll lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollState {
    /// Scaling in
    #[default]
    Appearing,
    /// Fully shown
    Revealed,
}

/// The scroll that pops out of an opened chest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scroll {
    /// Identity
    pub id: EntityId,
    /// Left edge at full size
    pub x: f32,
    /// Top edge at full size
    pub y: f32,
    /// Full width
    pub width: f32,
    /// Full height
    pub height: f32,
    /// Current draw scale in `[0, 1]`
    pub scale: f32,
    state: ScrollState,
    timer_ms: f64,
    reveal_ms: f64,
}

impl Scroll {
    /// Centre a scroll above a chest at `(chest_x, chest_y)`.
    pub fn new(id: EntityId, chest_x: f32, chest_y: f32, chest_width: f32, config: &ScrollConfig) -> Self {
        Self {
            id,
            x: chest_x + (chest_width - config.width) / 2.0,
            y: chest_y - config.height / 2.0,
            width: config.width,
            height: config.height,
            scale: 0.0,
            state: ScrollState::Appearing,
            timer_ms: 0.0,
            reveal_ms: config.reveal_ms,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Ease the scale in; emits `ScrollRevealed` exactly once.
    pub fn update(&mut self, dt_ms: f64, events: &mut EventQueue) {
        if self.state != ScrollState::Appearing {
            return;
        }

        self.timer_ms += dt_ms;
        let progress = (self.timer_ms / self.reveal_ms).min(1.0) as f32;
        self.scale = 1.0 - (1.0 - progress).powi(3);

        if self.timer_ms >= self.reveal_ms {
            self.state = ScrollState::Revealed;
            self.scale = 1.0;
            events.emit(GameEventData::ScrollRevealed { scroll: self.id });
        }
    }

    /// Full-size box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.state as u8);
        hasher.update_rect(&self.bounds());
        hasher.update_f64(self.timer_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;
    use crate::game::particle::ParticleKind;

    const STEP: f64 = 1000.0 / 60.0;

    fn chest() -> Chest {
        Chest::new(EntityId(1), 5500.0, 525.0, &ChestConfig::default(), AnimationSet::chest()).unwrap()
    }

    fn spawner() -> Spawner {
        Spawner::new(&GameConfig::default(), 7)
    }

    #[test]
    fn test_range_uses_centre_distance() {
        let mut spawner = spawner();
        let mut c = chest();
        let (cx, cy) = (c.bounds().center_x(), c.bounds().center_y());

        c.update(STEP, Some((cx - 199.0, cy)), &mut spawner);
        assert!(c.can_open());

        c.update(STEP, Some((cx - 120.0, cy - 160.0)), &mut spawner);
        assert!(!c.can_open());

        c.update(STEP, None, &mut spawner);
        assert!(!c.can_open());
    }

    #[test]
    fn test_sparkles_while_closed() {
        let mut spawner = spawner();
        let mut c = chest();

        // Interval must be strictly exceeded
        c.update(50.0, None, &mut spawner);
        c.update(50.0, None, &mut spawner);
        assert!(spawner.particles().is_empty());
        c.update(1.0, None, &mut spawner);
        assert_eq!(spawner.particles().len(), 2);
        assert!(spawner.particles().iter().all(|p| p.kind == ParticleKind::Sparkle));
    }

    #[test]
    fn test_open_once_then_settles() {
        let mut spawner = spawner();
        let mut events = EventQueue::new();
        let mut c = chest();

        assert!(c.open(&mut events, &mut spawner));
        assert!(!c.open(&mut events, &mut spawner));
        assert_eq!(c.state(), ChestState::Opening);
        assert_eq!(spawner.scrolls().len(), 1);
        assert_eq!(spawner.particles().len(), 70);

        let sounds: Vec<_> = events.take().iter().filter_map(|e| e.sound_cue()).collect();
        assert_eq!(sounds, vec![SoundCue::ChestOpen]);

        // 8 frames at 150ms, then one more step to finish
        for _ in 0..90 {
            c.update(STEP, None, &mut spawner);
        }
        assert_eq!(c.state(), ChestState::Open);
        assert!(c.animator().is_playing(Anim::IdleOpen));

        let before = spawner.particles().len();
        for _ in 0..20 {
            c.update(STEP, None, &mut spawner);
        }
        assert_eq!(spawner.particles().len(), before);
    }

    #[test]
    fn test_scroll_reveals_once() {
        let mut events = EventQueue::new();
        let mut scroll = Scroll::new(EntityId(9), 5500.0, 397.0, 128.0, &ScrollConfig::default());
        assert_eq!(scroll.x, 5514.0);
        assert_eq!(scroll.y, 347.0);

        scroll.update(400.0, &mut events);
        assert!(scroll.scale > 0.5 && scroll.scale < 1.0);
        assert_eq!(scroll.state(), ScrollState::Appearing);

        scroll.update(400.0, &mut events);
        scroll.update(400.0, &mut events);
        assert_eq!(scroll.state(), ScrollState::Revealed);
        assert_eq!(scroll.scale, 1.0);

        let revealed = events
            .take()
            .iter()
            .filter(|e| matches!(e.data, GameEventData::ScrollRevealed { .. }))
            .count();
        assert_eq!(revealed, 1);
    }
}
