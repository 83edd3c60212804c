//! Animation State Machine
//!
//! Advances a named, frame-indexed sequence in fixed ticks. The animator
//! owns only loop/one-shot policy and the terminal `Dead` hold; what to
//! play after a one-shot finishes is decided by the owning entity
//! through the [`Animated`] capability.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;

/// Errors raised while building animation tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    /// A clip with no frames can never be displayed
    #[error("animation {0:?} has zero frames")]
    ZeroFrames(Anim),

    /// Frame duration must be positive and finite
    #[error("animation {anim:?} has invalid speed {speed_ms}")]
    InvalidSpeed {
        /// Offending clip
        anim: Anim,
        /// Configured ms per frame
        speed_ms: f64,
    },

    /// The initial clip is not part of the set
    #[error("initial animation {0:?} is not defined")]
    MissingInitial(Anim),
}

// =============================================================================
// ANIMATION NAMES
// =============================================================================

/// Animation names shared by every animated entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anim {
    /// Standing still
    Idle,
    /// Player running
    Run,
    /// Player airborne
    Jump,
    /// Player firing
    Shoot,
    /// Player swinging
    Melee,
    /// Enemy patrolling
    Walk,
    /// Enemy attacking
    Attack,
    /// Enemy death pose (terminal)
    Dead,
    /// Chest resting closed
    IdleClosed,
    /// Chest lid opening
    Opening,
    /// Chest resting open
    IdleOpen,
}

impl Anim {
    /// Terminal clips hold their last frame forever.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Anim::Dead)
    }

    /// Player attack clips.
    #[inline]
    pub fn is_attack(self) -> bool {
        matches!(self, Anim::Melee | Anim::Shoot)
    }
}

// =============================================================================
// CLIPS AND SETS
// =============================================================================

/// Timing of one animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Number of frames (at least 1)
    pub frames: u32,
    /// Milliseconds per frame
    pub speed_ms: f64,
    /// Wrap around instead of completing
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl AnimationClip {
    /// Looping clip.
    pub const fn looping(frames: u32, speed_ms: f64) -> Self {
        Self { frames, speed_ms, looping: true }
    }

    /// One-shot clip.
    pub const fn once(frames: u32, speed_ms: f64) -> Self {
        Self { frames, speed_ms, looping: false }
    }

    fn validate(&self, anim: Anim) -> Result<(), AnimationError> {
        if self.frames == 0 {
            return Err(AnimationError::ZeroFrames(anim));
        }
        if !self.speed_ms.is_finite() || self.speed_ms <= 0.0 {
            return Err(AnimationError::InvalidSpeed { anim, speed_ms: self.speed_ms });
        }
        Ok(())
    }
}

/// All clips available to one entity kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    /// Clip played on construction
    pub initial: Anim,
    /// Clips by name
    pub clips: BTreeMap<Anim, AnimationClip>,
}

impl AnimationSet {
    /// Build and validate a set.
    pub fn new(
        initial: Anim,
        clips: impl IntoIterator<Item = (Anim, AnimationClip)>,
    ) -> Result<Self, AnimationError> {
        let set = Self {
            initial,
            clips: clips.into_iter().collect(),
        };
        set.validate()?;
        Ok(set)
    }

    /// Reject zero-frame clips, bad speeds and a missing initial clip.
    pub fn validate(&self) -> Result<(), AnimationError> {
        for (anim, clip) in &self.clips {
            clip.validate(*anim)?;
        }
        if !self.clips.contains_key(&self.initial) {
            return Err(AnimationError::MissingInitial(self.initial));
        }
        Ok(())
    }

    /// Look up a clip.
    pub fn get(&self, anim: Anim) -> Option<&AnimationClip> {
        self.clips.get(&anim)
    }

    /// Player clips.
    pub fn player() -> Self {
        Self {
            initial: Anim::Idle,
            clips: BTreeMap::from([
                (Anim::Idle, AnimationClip::looping(11, 200.0)),
                (Anim::Run, AnimationClip::looping(9, 100.0)),
                (Anim::Jump, AnimationClip::once(11, 80.0)),
                (Anim::Shoot, AnimationClip::once(4, 100.0)),
                (Anim::Melee, AnimationClip::once(8, 90.0)),
            ]),
        }
    }

    /// Enemy clips.
    pub fn enemy() -> Self {
        Self {
            initial: Anim::Idle,
            clips: BTreeMap::from([
                (Anim::Idle, AnimationClip::looping(16, 250.0)),
                (Anim::Walk, AnimationClip::looping(11, 150.0)),
                (Anim::Attack, AnimationClip::once(9, 100.0)),
                (Anim::Dead, AnimationClip::once(13, 120.0)),
            ]),
        }
    }

    /// Treasure chest clips.
    pub fn chest() -> Self {
        Self {
            initial: Anim::IdleClosed,
            clips: BTreeMap::from([
                (Anim::IdleClosed, AnimationClip::looping(1, 200.0)),
                (Anim::Opening, AnimationClip::once(8, 150.0)),
                (Anim::IdleOpen, AnimationClip::looping(1, 250.0)),
            ]),
        }
    }
}

// =============================================================================
// ANIMATOR
// =============================================================================

/// Result of advancing an animator by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Timer accumulated, frame unchanged
    Waiting,
    /// Moved to the next frame (or wrapped)
    Frame,
    /// A one-shot passed its last frame
    Finished(Anim),
    /// Terminal clip holding its last frame
    Holding,
}

/// Per-entity animation state.
///
/// `0 <= frame < frames` holds at all times.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Animator {
    set: AnimationSet,
    current: Anim,
    clip: AnimationClip,
    frame: u32,
    frame_timer: f64,
}

impl Animator {
    /// Create an animator playing the set's initial clip.
    pub fn new(set: AnimationSet) -> Result<Self, AnimationError> {
        set.validate()?;
        let clip = *set.get(set.initial).ok_or(AnimationError::MissingInitial(set.initial))?;
        Ok(Self {
            current: set.initial,
            clip,
            frame: 0,
            frame_timer: 0.0,
            set,
        })
    }

    /// Switch clips.
    ///
    /// Requesting the clip already playing, or one the set does not
    /// define, is a no-op. Returns whether a switch happened.
    pub fn play(&mut self, anim: Anim) -> bool {
        if anim == self.current {
            return false;
        }
        let Some(clip) = self.set.get(anim).copied() else {
            return false;
        };

        self.current = anim;
        self.clip = clip;
        self.frame = 0;
        self.frame_timer = 0.0;
        true
    }

    /// Add `dt_ms` and step the frame once the clip's speed is exceeded.
    pub fn advance(&mut self, dt_ms: f64) -> Advance {
        self.frame_timer += dt_ms;
        if self.frame_timer <= self.clip.speed_ms {
            return Advance::Waiting;
        }
        self.frame_timer = 0.0;

        if self.clip.looping {
            self.frame = (self.frame + 1) % self.clip.frames;
            Advance::Frame
        } else if !self.is_last_frame() {
            self.frame += 1;
            Advance::Frame
        } else if self.current.is_terminal() {
            Advance::Holding
        } else {
            Advance::Finished(self.current)
        }
    }

    /// Clip currently playing.
    #[inline]
    pub fn current(&self) -> Anim {
        self.current
    }

    /// Whether `anim` is the clip currently playing.
    #[inline]
    pub fn is_playing(&self, anim: Anim) -> bool {
        self.current == anim
    }

    /// Current frame index.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Frame count of the current clip.
    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.clip.frames
    }

    /// Time accumulated toward the next frame.
    #[inline]
    pub fn frame_timer(&self) -> f64 {
        self.frame_timer
    }

    /// On the final frame of the current clip.
    #[inline]
    pub fn is_last_frame(&self) -> bool {
        self.frame + 1 >= self.clip.frames
    }

    /// The clips this animator can play.
    pub fn set(&self) -> &AnimationSet {
        &self.set
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.current as u8);
        hasher.update_u32(self.frame);
        hasher.update_f64(self.frame_timer);
    }
}

// =============================================================================
// ANIMATED CAPABILITY
// =============================================================================

/// Entities that own an [`Animator`] and decide what follows a one-shot.
pub trait Animated {
    /// Borrow the animator.
    fn animator(&self) -> &Animator;

    /// Borrow the animator mutably.
    fn animator_mut(&mut self) -> &mut Animator;

    /// Called when a one-shot clip finished.
    fn on_animation_complete(&mut self, finished: Anim);

    /// Advance the animator and apply the completion policy.
    fn advance_animation(&mut self, dt_ms: f64) -> Advance {
        let outcome = self.animator_mut().advance(dt_ms);
        if let Advance::Finished(anim) = outcome {
            self.on_animation_complete(anim);
        }
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEP: f64 = 1000.0 / 60.0;

    fn player_animator() -> Animator {
        Animator::new(AnimationSet::player()).unwrap()
    }

    #[test]
    fn test_default_sets_are_valid() {
        assert!(AnimationSet::player().validate().is_ok());
        assert!(AnimationSet::enemy().validate().is_ok());
        assert!(AnimationSet::chest().validate().is_ok());
    }

    #[test]
    fn test_zero_frame_clip_rejected() {
        let result = AnimationSet::new(
            Anim::Idle,
            [
                (Anim::Idle, AnimationClip::looping(4, 100.0)),
                (Anim::Shoot, AnimationClip::once(0, 100.0)),
            ],
        );
        assert_eq!(result.unwrap_err(), AnimationError::ZeroFrames(Anim::Shoot));
    }

    #[test]
    fn test_missing_initial_rejected() {
        let result = AnimationSet::new(Anim::Walk, [(Anim::Idle, AnimationClip::looping(4, 100.0))]);
        assert_eq!(result.unwrap_err(), AnimationError::MissingInitial(Anim::Walk));
    }

    #[test]
    fn test_frame_advances_only_past_speed() {
        let mut anim = player_animator();
        // Idle: 200ms per frame, strictly greater is required
        assert_eq!(anim.advance(100.0), Advance::Waiting);
        assert_eq!(anim.advance(100.0), Advance::Waiting);
        assert_eq!(anim.frame(), 0);
        assert_eq!(anim.advance(0.5), Advance::Frame);
        assert_eq!(anim.frame(), 1);
        assert_eq!(anim.frame_timer(), 0.0);
    }

    #[test]
    fn test_loop_wraps() {
        let mut anim = player_animator();
        anim.play(Anim::Run);
        for _ in 0..9 {
            anim.advance(101.0);
        }
        assert_eq!(anim.frame(), 0);
        assert!(anim.is_playing(Anim::Run));
    }

    #[test]
    fn test_one_shot_signals_completion() {
        let mut anim = player_animator();
        anim.play(Anim::Shoot);
        for expected in 1..4 {
            assert_eq!(anim.advance(101.0), Advance::Frame);
            assert_eq!(anim.frame(), expected);
        }
        assert_eq!(anim.advance(101.0), Advance::Finished(Anim::Shoot));
        assert_eq!(anim.frame(), 3);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut anim = Animator::new(AnimationSet::enemy()).unwrap();
        anim.play(Anim::Dead);
        for _ in 0..12 {
            anim.advance(121.0);
        }
        assert_eq!(anim.frame(), 12);
        for _ in 0..50 {
            assert_eq!(anim.advance(121.0), Advance::Holding);
        }
        assert_eq!(anim.frame(), 12);
        assert!(anim.is_playing(Anim::Dead));
    }

    #[test]
    fn test_play_same_is_noop() {
        let mut anim = player_animator();
        anim.play(Anim::Run);
        anim.advance(101.0);
        anim.advance(50.0);
        assert!(!anim.play(Anim::Run));
        assert_eq!(anim.frame(), 1);
        assert_eq!(anim.frame_timer(), 50.0);
    }

    #[test]
    fn test_switch_resets_frame_and_timer() {
        let mut anim = player_animator();
        anim.play(Anim::Run);
        anim.advance(101.0);
        anim.advance(50.0);
        assert!(anim.play(Anim::Idle));
        assert_eq!(anim.frame(), 0);
        assert_eq!(anim.frame_timer(), 0.0);
    }

    #[test]
    fn test_unknown_clip_is_noop() {
        let mut anim = player_animator();
        assert!(!anim.play(Anim::Dead));
        assert!(anim.is_playing(Anim::Idle));
    }

    struct Dummy {
        animator: Animator,
        completions: u32,
    }

    impl Animated for Dummy {
        fn animator(&self) -> &Animator {
            &self.animator
        }
        fn animator_mut(&mut self) -> &mut Animator {
            &mut self.animator
        }
        fn on_animation_complete(&mut self, _finished: Anim) {
            self.completions += 1;
            self.animator.play(Anim::Idle);
        }
    }

    #[test]
    fn test_completion_policy_runs_once() {
        let mut dummy = Dummy { animator: player_animator(), completions: 0 };
        dummy.animator.play(Anim::Melee);
        for _ in 0..200 {
            dummy.advance_animation(STEP);
        }
        assert_eq!(dummy.completions, 1);
        assert!(dummy.animator().is_playing(Anim::Idle));
    }

    #[test]
    fn test_clip_json_uses_loop_key() {
        let json = serde_json::to_string(&AnimationClip::once(3, 90.0)).unwrap();
        assert!(json.contains("\"loop\":false"));
    }

    fn any_anim() -> impl Strategy<Value = Anim> {
        prop_oneof![
            Just(Anim::Idle),
            Just(Anim::Run),
            Just(Anim::Jump),
            Just(Anim::Shoot),
            Just(Anim::Melee),
            Just(Anim::Dead),
        ]
    }

    proptest! {
        #[test]
        fn prop_frame_always_in_bounds(
            ops in proptest::collection::vec((any_anim(), 0.0f64..300.0, any::<bool>()), 1..300)
        ) {
            let mut anim = player_animator();
            for (request, dt, switch) in ops {
                if switch {
                    anim.play(request);
                }
                anim.advance(dt);
                prop_assert!(anim.frame() < anim.frame_count());
            }
        }
    }
}
