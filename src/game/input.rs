//! Input Actions and Recording
//!
//! The core never sees keys or touch buttons. It receives a flat set of
//! boolean action signals once per tick, treats them as level-triggered,
//! and derives rising edges only for jump, shoot and melee.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::body::Facing;
use crate::game::state::GamePhase;

// =============================================================================
// ACTION STATE
// =============================================================================

/// Action signals sampled for a single tick.
///
/// Packed into one byte so recordings stay small.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionState {
    flags: u8,
}

impl ActionState {
    /// Move left held
    pub const MOVE_LEFT: u8 = 0x01;
    /// Move right held
    pub const MOVE_RIGHT: u8 = 0x02;
    /// Jump held
    pub const JUMP: u8 = 0x04;
    /// Shoot held
    pub const SHOOT: u8 = 0x08;
    /// Melee held
    pub const MELEE: u8 = 0x10;
    /// Interact (open chest) held
    pub const INTERACT: u8 = 0x20;

    const ALL: u8 = 0x3F;

    /// No actions held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Build from raw flag bits. Unknown bits are dropped.
    pub const fn from_bits(flags: u8) -> Self {
        Self { flags: flags & Self::ALL }
    }

    /// Raw flag bits.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.flags
    }

    /// Builder: same state with `flag` held.
    #[inline]
    pub const fn with(self, flag: u8) -> Self {
        Self::from_bits(self.flags | flag)
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag & Self::ALL;
        } else {
            self.flags &= !flag;
        }
    }

    /// Check whether a flag is held.
    #[inline]
    pub fn held(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Move left held.
    #[inline]
    pub fn move_left(&self) -> bool {
        self.held(Self::MOVE_LEFT)
    }

    /// Move right held.
    #[inline]
    pub fn move_right(&self) -> bool {
        self.held(Self::MOVE_RIGHT)
    }

    /// Jump held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.held(Self::JUMP)
    }

    /// Shoot held.
    #[inline]
    pub fn shoot(&self) -> bool {
        self.held(Self::SHOOT)
    }

    /// Melee held.
    #[inline]
    pub fn melee(&self) -> bool {
        self.held(Self::MELEE)
    }

    /// Interact held.
    #[inline]
    pub fn interact(&self) -> bool {
        self.held(Self::INTERACT)
    }

    /// Both horizontal directions held at once.
    #[inline]
    pub fn both_directions(&self) -> bool {
        self.move_left() && self.move_right()
    }

    /// The one horizontal direction held, if exactly one is.
    #[inline]
    pub fn single_direction(&self) -> Option<Facing> {
        match (self.move_left(), self.move_right()) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            _ => None,
        }
    }

    /// Nothing held.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }
}

// =============================================================================
// RISING EDGES
// =============================================================================

/// Actions that fired this tick (previously released, now held).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pressed {
    /// Jump pressed
    pub jump: bool,
    /// Shoot pressed
    pub shoot: bool,
    /// Melee pressed
    pub melee: bool,
}

/// Remembers last tick's jump/shoot/melee signals.
///
/// The previous state is updated every tick whether or not the press
/// was acted on, so a held key never repeats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTracker {
    previous: ActionState,
}

impl EdgeTracker {
    const EDGE_MASK: u8 = ActionState::JUMP | ActionState::SHOOT | ActionState::MELEE;

    /// Create a tracker with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute rising edges for `current` and remember it.
    pub fn update(&mut self, current: ActionState) -> Pressed {
        let rising = current.bits() & !self.previous.bits() & Self::EDGE_MASK;
        self.previous = ActionState::from_bits(current.bits() & Self::EDGE_MASK);

        Pressed {
            jump: rising & ActionState::JUMP != 0,
            shoot: rising & ActionState::SHOOT != 0,
            melee: rising & ActionState::MELEE != 0,
        }
    }

    /// Signals remembered from the last update.
    pub fn previous(&self) -> ActionState {
        self.previous
    }
}

// =============================================================================
// INPUT SOURCES
// =============================================================================

/// Supplies one `ActionState` per simulation tick.
pub trait InputSource {
    /// Sample the actions for `tick`.
    fn sample(&mut self, tick: u32) -> ActionState;
}

/// Input source backed by a closure. Used by demos and tests.
pub struct ScriptedInput<F> {
    script: F,
}

impl<F> ScriptedInput<F>
where
    F: FnMut(u32) -> ActionState,
{
    /// Wrap a `tick -> actions` closure.
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

impl<F> InputSource for ScriptedInput<F>
where
    F: FnMut(u32) -> ActionState,
{
    fn sample(&mut self, tick: u32) -> ActionState {
        (self.script)(tick)
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// One change in the held actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this state began
    pub tick: u32,
    /// The new action state
    pub actions: ActionState,
}

/// A phase transition made from outside the tick, e.g. opening a dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// Tick the change was applied before
    pub tick: u32,
    /// Phase entered
    pub phase: GamePhase,
}

/// Per-tick actions of one session, delta-compressed.
///
/// Only ticks where the actions CHANGE are stored, along with every
/// phase change made between ticks. Replaying a recording with the same
/// seed and config reproduces the session bit-exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecording {
    /// World seed the session ran with
    pub seed: u64,

    /// First recorded tick
    pub start_tick: u32,

    /// One past the last recorded tick; equals `start_tick` when empty
    pub end_tick: u32,

    deltas: Vec<InputDelta>,

    phases: Vec<PhaseChange>,

    #[serde(skip)]
    last: ActionState,
}

impl InputRecording {
    /// Start an empty recording at tick 0.
    pub fn new(seed: u64) -> Self {
        Self::starting_at(seed, 0)
    }

    /// Start an empty recording whose first tick will be `tick`.
    pub fn starting_at(seed: u64, tick: u32) -> Self {
        Self {
            seed,
            start_tick: tick,
            end_tick: tick,
            deltas: Vec::with_capacity(256),
            phases: Vec::new(),
            last: ActionState::new(),
        }
    }

    /// Record the actions applied on `tick`.
    pub fn record(&mut self, tick: u32, actions: ActionState) {
        self.end_tick = self.end_tick.max(tick + 1);

        if actions != self.last {
            self.deltas.push(InputDelta { tick, actions });
            self.last = actions;
        }
    }

    /// Record a phase change applied before `tick` runs.
    pub fn record_phase(&mut self, tick: u32, phase: GamePhase) {
        self.phases.push(PhaseChange { tick, phase });
    }

    /// Phase changes in the order they were made.
    pub fn phase_changes(&self) -> &[PhaseChange] {
        &self.phases
    }

    /// Number of recorded ticks.
    pub fn tick_count(&self) -> u32 {
        self.end_tick.saturating_sub(self.start_tick)
    }

    /// Actions in effect at `tick`.
    pub fn get_input_at(&self, tick: u32) -> ActionState {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            ActionState::new()
        } else {
            self.deltas[idx - 1].actions
        }
    }

    /// All stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Close the recording at `end_tick` (exclusive).
    pub fn finalize(&mut self, end_tick: u32) {
        self.end_tick = end_tick;
    }

    /// Serialize with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a recording produced by [`InputRecording::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let mut recording: Self = bincode::deserialize(bytes)?;
        recording.last = recording.deltas.last().map(|d| d.actions).unwrap_or_default();
        Ok(recording)
    }

    /// Content hash of the recording.
    pub fn hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_recording();
        hasher.update_u64(self.seed);
        hasher.update_u32(self.start_tick);
        hasher.update_u32(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_u8(delta.actions.bits());
        }
        hasher.update_u32(self.phases.len() as u32);
        for change in &self.phases {
            hasher.update_u32(change.tick);
            hasher.update_u8(change.phase as u8);
        }
        hasher.finalize()
    }

    /// Tick-by-tick playback.
    pub fn playback(&self) -> Playback<'_> {
        Playback {
            recording: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current: ActionState::new(),
        }
    }
}

/// Replays a recording. Usable both as an iterator and as an
/// [`InputSource`].
pub struct Playback<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current: ActionState,
}

impl Iterator for Playback<'_> {
    type Item = (u32, ActionState);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick >= self.recording.end_tick {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current = delta.actions;
            self.delta_idx += 1;
        }

        let item = (self.current_tick, self.current);
        self.current_tick += 1;
        Some(item)
    }
}

impl InputSource for Playback<'_> {
    fn sample(&mut self, tick: u32) -> ActionState {
        self.recording.get_input_at(tick)
    }
}

// =============================================================================
// TESTS
// =============================================================================
