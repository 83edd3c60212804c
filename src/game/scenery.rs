//! Reactive Scenery
//!
//! Pairs of glowing eyes hidden in the bushes. They blink on a random
//! schedule, follow the player with their pupils, and hide for a while
//! when an attack sweeps through them. Scaring is the only interaction
//! and it never touches health or the entity registry.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::game::config::EyesConfig;
use crate::game::events::{EventQueue, GameEventData};
use crate::game::level::SpawnPoint;

/// Eyelid cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlinkPhase {
    /// Waiting for the next blink
    #[default]
    Open,
    /// Lid coming down
    Closing,
    /// Lid shut
    Closed,
    /// Lid going up
    Opening,
}

/// Hide cycle after a scare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScarePhase {
    /// Fading to invisible
    FadingOut,
    /// Gone
    Hidden,
    /// Coming back
    FadingIn,
}

/// One pair of eyes. `(x, y)` is the midpoint between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Eyes {
    /// Midpoint x
    pub x: f32,
    /// Midpoint y
    pub y: f32,
    /// Lid openness in `[0, 1]`
    pub lid: f32,
    /// Horizontal pupil shift
    pub pupil_offset: f32,
    /// Opacity
    pub alpha: f32,
    blink: BlinkPhase,
    blink_timer_ms: f64,
    next_blink_ms: f64,
    scare: Option<ScarePhase>,
    scare_timer_ms: f64,
}

impl Eyes {
    /// Open eyes with a random first blink.
    pub fn new(spawn: SpawnPoint, config: &EyesConfig, rng: &mut DeterministicRng) -> Self {
        Self {
            x: spawn.x,
            y: spawn.y,
            lid: 1.0,
            pupil_offset: 0.0,
            alpha: config.base_alpha,
            blink: BlinkPhase::Open,
            blink_timer_ms: 0.0,
            next_blink_ms: blink_interval(config, rng),
            scare: None,
            scare_timer_ms: 0.0,
        }
    }

    /// Currently hiding.
    #[inline]
    pub fn is_scared(&self) -> bool {
        self.scare.is_some()
    }

    /// Current scare phase, if hiding.
    #[inline]
    pub fn scare_phase(&self) -> Option<ScarePhase> {
        self.scare
    }

    /// Current blink phase.
    #[inline]
    pub fn blink_phase(&self) -> BlinkPhase {
        self.blink
    }

    /// Area an attack has to touch to scare these eyes.
    pub fn scare_zone(&self, config: &EyesConfig) -> Rect {
        Rect::new(
            self.x - config.scare_half_width,
            self.y - config.scare_half_height,
            config.scare_half_width * 2.0,
            config.scare_half_height * 2.0,
        )
    }

    /// Worth drawing at all.
    pub fn is_visible(&self) -> bool {
        self.alpha > 0.01 && (self.is_scared() || self.lid > 0.05)
    }

    /// Start hiding. Ignored while already hiding; returns whether it took.
    pub fn scare_away(&mut self) -> bool {
        if self.is_scared() {
            return false;
        }
        self.scare = Some(ScarePhase::FadingOut);
        self.scare_timer_ms = 0.0;
        self.blink = BlinkPhase::Open;
        self.lid = 1.0;
        true
    }

    /// Advance one tick.
    pub fn update(
        &mut self,
        dt_ms: f64,
        player_center_x: Option<f32>,
        config: &EyesConfig,
        rng: &mut DeterministicRng,
    ) {
        if let Some(phase) = self.scare {
            self.update_scare(phase, dt_ms, config);
            return;
        }

        if let Some(px) = player_center_x {
            let target = ((px - self.x) / 50.0).clamp(-config.max_pupil_offset, config.max_pupil_offset);
            self.pupil_offset += (target - self.pupil_offset) * config.pupil_follow;
        }

        self.blink_timer_ms += dt_ms;
        let t = self.blink_timer_ms;
        match self.blink {
            BlinkPhase::Open => {
                if t >= self.next_blink_ms {
                    self.set_blink(BlinkPhase::Closing);
                }
            }
            BlinkPhase::Closing => {
                self.lid = (1.0 - t / config.closing_ms).max(0.0) as f32;
                if t >= config.closing_ms {
                    self.set_blink(BlinkPhase::Closed);
                }
            }
            BlinkPhase::Closed => {
                self.lid = 0.0;
                if t >= config.closed_ms {
                    self.set_blink(BlinkPhase::Opening);
                }
            }
            BlinkPhase::Opening => {
                self.lid = (t / config.opening_ms).min(1.0) as f32;
                if t >= config.opening_ms {
                    self.set_blink(BlinkPhase::Open);
                    self.next_blink_ms = blink_interval(config, rng);
                }
            }
        }
    }

    fn set_blink(&mut self, phase: BlinkPhase) {
        self.blink = phase;
        self.blink_timer_ms = 0.0;
    }

    fn update_scare(&mut self, phase: ScarePhase, dt_ms: f64, config: &EyesConfig) {
        self.scare_timer_ms += dt_ms;
        let t = self.scare_timer_ms;
        match phase {
            ScarePhase::FadingOut => {
                self.alpha = config.base_alpha * (1.0 - (t / config.fade_out_ms).min(1.0) as f32);
                if t >= config.fade_out_ms {
                    self.scare = Some(ScarePhase::Hidden);
                    self.scare_timer_ms = 0.0;
                }
            }
            ScarePhase::Hidden => {
                self.alpha = 0.0;
                if t >= config.hidden_ms {
                    self.scare = Some(ScarePhase::FadingIn);
                    self.scare_timer_ms = 0.0;
                }
            }
            ScarePhase::FadingIn => {
                self.alpha = config.base_alpha * (t / config.fade_in_ms).min(1.0) as f32;
                if t >= config.fade_in_ms {
                    self.scare = None;
                    self.alpha = config.base_alpha;
                }
            }
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.blink as u8);
        hasher.update_f64(self.blink_timer_ms);
        hasher.update_f64(self.next_blink_ms);
        hasher.update_u8(self.scare.map_or(0, |p| p as u8 + 1));
        hasher.update_f64(self.scare_timer_ms);
        hasher.update_f32(self.pupil_offset);
    }
}

fn blink_interval(config: &EyesConfig, rng: &mut DeterministicRng) -> f64 {
    let span = (config.blink_max_ms - config.blink_min_ms).max(0.0);
    config.blink_min_ms + rng.next_f32() as f64 * span
}

// =============================================================================
// SCENERY
// =============================================================================

/// All reactive props in the level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenery {
    eyes: Vec<Eyes>,
    config: EyesConfig,
    rng: DeterministicRng,
}

impl Scenery {
    /// Place eyes at each spawn, drawing blink timing from `rng`.
    pub fn new(spawns: &[SpawnPoint], config: &EyesConfig, mut rng: DeterministicRng) -> Self {
        let eyes = spawns.iter().map(|&s| Eyes::new(s, config, &mut rng)).collect();
        Self { eyes, config: config.clone(), rng }
    }

    /// All eyes in level order.
    pub fn eyes(&self) -> &[Eyes] {
        &self.eyes
    }

    /// Advance every prop one tick.
    pub fn update(&mut self, dt_ms: f64, player_center_x: Option<f32>) {
        for eyes in &mut self.eyes {
            eyes.update(dt_ms, player_center_x, &self.config, &mut self.rng);
        }
    }

    /// Scare every calm pair whose zone overlaps `attack`. Returns how
    /// many were scared.
    pub fn scare_overlapping(&mut self, attack: &Rect, events: &mut EventQueue) -> usize {
        let mut scared = 0;
        for (index, eyes) in self.eyes.iter_mut().enumerate() {
            if eyes.is_scared() || !eyes.scare_zone(&self.config).overlaps(attack) {
                continue;
            }
            if eyes.scare_away() {
                events.emit(GameEventData::EyesScared { index });
                scared += 1;
            }
        }
        scared
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.eyes.len() as u32);
        for eyes in &self.eyes {
            eyes.hash_into(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenery() -> Scenery {
        let spawns = [SpawnPoint::new(300.0, 480.0), SpawnPoint::new(900.0, 470.0)];
        Scenery::new(&spawns, &EyesConfig::default(), DeterministicRng::new(11))
    }

    #[test]
    fn test_scare_cycle_returns_to_calm() {
        let config = EyesConfig::default();
        let mut rng = DeterministicRng::new(1);
        let mut eyes = Eyes::new(SpawnPoint::new(0.0, 0.0), &config, &mut rng);

        assert!(eyes.scare_away());
        assert!(!eyes.scare_away());

        eyes.update(500.0, None, &config, &mut rng);
        assert_eq!(eyes.scare_phase(), Some(ScarePhase::FadingOut));
        assert!((eyes.alpha - 0.425).abs() < 1e-5);

        eyes.update(500.0, None, &config, &mut rng);
        assert_eq!(eyes.scare_phase(), Some(ScarePhase::Hidden));

        eyes.update(5000.0, None, &config, &mut rng);
        assert_eq!(eyes.alpha, 0.0);
        assert_eq!(eyes.scare_phase(), Some(ScarePhase::FadingIn));

        eyes.update(1000.0, None, &config, &mut rng);
        assert!(!eyes.is_scared());
        assert_eq!(eyes.alpha, config.base_alpha);
    }

    #[test]
    fn test_blink_cycle() {
        let config = EyesConfig::default();
        let mut rng = DeterministicRng::new(2);
        let mut eyes = Eyes::new(SpawnPoint::new(0.0, 0.0), &config, &mut rng);

        eyes.update(6000.0, None, &config, &mut rng);
        assert_eq!(eyes.blink_phase(), BlinkPhase::Closing);

        eyes.update(30.0, None, &config, &mut rng);
        assert!((eyes.lid - 0.5).abs() < 1e-5);

        eyes.update(30.0, None, &config, &mut rng);
        assert_eq!(eyes.blink_phase(), BlinkPhase::Closed);

        eyes.update(120.0, None, &config, &mut rng);
        assert_eq!(eyes.blink_phase(), BlinkPhase::Opening);
        assert!(!eyes.is_visible());

        eyes.update(80.0, None, &config, &mut rng);
        assert_eq!(eyes.blink_phase(), BlinkPhase::Open);
        assert_eq!(eyes.lid, 1.0);
    }

    #[test]
    fn test_pupils_follow_player() {
        let config = EyesConfig::default();
        let mut rng = DeterministicRng::new(3);
        let mut eyes = Eyes::new(SpawnPoint::new(100.0, 0.0), &config, &mut rng);

        for _ in 0..200 {
            eyes.update(1.0, Some(1000.0), &config, &mut rng);
        }
        assert!(eyes.pupil_offset > 2.4 && eyes.pupil_offset <= 2.5);
    }

    #[test]
    fn test_only_overlapping_calm_eyes_react() {
        let mut scenery = scenery();
        let mut events = EventQueue::new();

        let swing = Rect::new(290.0, 450.0, 80.0, 100.0);
        assert_eq!(scenery.scare_overlapping(&swing, &mut events), 1);
        assert!(scenery.eyes()[0].is_scared());
        assert!(!scenery.eyes()[1].is_scared());

        // Already hiding
        assert_eq!(scenery.scare_overlapping(&swing, &mut events), 0);

        let scared: Vec<_> = events
            .take()
            .into_iter()
            .filter_map(|e| match e.data {
                GameEventData::EyesScared { index } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(scared, vec![0]);
    }

    #[test]
    fn test_same_seed_same_blinks() {
        let mut a = scenery();
        let mut b = scenery();
        for _ in 0..1000 {
            a.update(1000.0 / 60.0, Some(500.0));
            b.update(1000.0 / 60.0, Some(500.0));
        }
        assert_eq!(a.eyes(), b.eyes());
    }
}
