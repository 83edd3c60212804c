//! Game Events
//!
//! Fire-and-forget signals for the audio/effect collaborator, plus
//! lifecycle notifications for logging and replay verification. The
//! simulation never waits on or reads back an event.

use serde::{Serialize, Deserialize};

use crate::game::state::{EntityId, GamePhase};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Phase changes first
    Phase = 0,
    /// Damage and deaths
    Combat = 1,
    /// Chest and scroll
    Progress = 2,
    /// Sounds and loops
    Feedback = 3,
    /// Lowest priority
    Other = 255,
}

/// One-shot sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Player left the ground
    Jump,
    /// Player started a swing
    Melee,
    /// Player fired
    PistolShoot,
    /// Enemy survived a hit
    EnemyHit,
    /// Enemy health reached zero
    EnemyDeath,
    /// Chest lid started opening
    ChestOpen,
    /// Both directions held past the threshold
    WhereToGo,
}

/// Looping sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCue {
    /// Running on the ground
    Footsteps,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Play a one-shot sound
    Sound {
        /// Cue to play
        cue: SoundCue,
    },

    /// Start a looping sound
    LoopStarted {
        /// Cue to loop
        cue: LoopCue,
    },

    /// Stop a looping sound
    LoopStopped {
        /// Cue to stop
        cue: LoopCue,
    },

    /// Player touched down after being airborne
    PlayerLanded {
        /// Landing x (feet centre)
        x: f32,
        /// Landing y (feet)
        y: f32,
    },

    /// A bullet left the barrel
    BulletFired {
        /// New bullet
        bullet: EntityId,
    },

    /// Enemy lost health but survived
    EnemyDamaged {
        /// Target
        enemy: EntityId,
        /// Damage applied
        amount: u32,
        /// Health left
        remaining: u32,
    },

    /// Enemy health reached zero
    EnemyKilled {
        /// Target
        enemy: EntityId,
    },

    /// A corpse finished sinking and will be reaped
    EnemyRemoved {
        /// Removed enemy
        enemy: EntityId,
    },

    /// Chest started opening
    ChestOpened {
        /// Chest
        chest: EntityId,
    },

    /// Scroll finished its reveal animation
    ScrollRevealed {
        /// Scroll
        scroll: EntityId,
    },

    /// A pair of eyes was scared into hiding
    EyesScared {
        /// Index in the scenery list
        index: usize,
    },

    /// Game phase changed
    PhaseChanged {
        /// Previous phase
        old_phase: GamePhase,
        /// New phase
        new_phase: GamePhase,
    },
}

impl GameEventData {
    /// Default priority for this kind of event.
    pub fn priority(&self) -> EventPriority {
        match self {
            GameEventData::PhaseChanged { .. } => EventPriority::Phase,
            GameEventData::EnemyDamaged { .. }
            | GameEventData::EnemyKilled { .. }
            | GameEventData::EnemyRemoved { .. } => EventPriority::Combat,
            GameEventData::ChestOpened { .. } | GameEventData::ScrollRevealed { .. } => {
                EventPriority::Progress
            }
            GameEventData::Sound { .. }
            | GameEventData::LoopStarted { .. }
            | GameEventData::LoopStopped { .. } => EventPriority::Feedback,
            _ => EventPriority::Other,
        }
    }
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Emission order within the tick
    pub seq: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, seq: u32, data: GameEventData) -> Self {
        Self {
            tick,
            priority: data.priority(),
            seq,
            data,
        }
    }

    /// Whether this is a sound cue.
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self.data {
            GameEventData::Sound { cue } => Some(cue),
            _ => None,
        }
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then emission order
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.seq.cmp(&other.seq))
    }
}

// =============================================================================
// EVENT QUEUE
// =============================================================================

/// Events generated during the current tick.
///
/// Entities push into the queue while updating; the orchestrator drains
/// it once per tick.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    tick: u32,
    seq: u32,
    pending: Vec<GameEvent>,
}

impl EventQueue {
    /// Empty queue at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent events with `tick`.
    pub fn begin_tick(&mut self, tick: u32) {
        self.tick = tick;
        self.seq = 0;
    }

    /// Push an event.
    pub fn emit(&mut self, data: GameEventData) {
        self.pending.push(GameEvent::new(self.tick, self.seq, data));
        self.seq += 1;
    }

    /// Push a one-shot sound.
    pub fn sound(&mut self, cue: SoundCue) {
        self.emit(GameEventData::Sound { cue });
    }

    /// Pending events, oldest first.
    pub fn pending(&self) -> &[GameEvent] {
        &self.pending
    }

    /// Take pending events (consumes them).
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let killed = GameEvent::new(10, 1, GameEventData::EnemyKilled { enemy: EntityId(3) });
        let sound = GameEvent::new(10, 0, GameEventData::Sound { cue: SoundCue::EnemyDeath });
        let later = GameEvent::new(11, 0, GameEventData::EnemyKilled { enemy: EntityId(4) });

        // Same tick, combat before feedback regardless of emission order
        assert!(killed < sound);
        assert!(sound < later);
    }

    #[test]
    fn test_queue_stamps_tick_and_sequence() {
        let mut queue = EventQueue::new();
        queue.begin_tick(7);
        queue.sound(SoundCue::Jump);
        queue.emit(GameEventData::PlayerLanded { x: 1.0, y: 2.0 });

        let events = queue.take();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.tick == 7));
        assert_eq!(events[0].seq, 0);
        assert_eq!(events[1].seq, 1);
        assert_eq!(events[0].sound_cue(), Some(SoundCue::Jump));
        assert!(queue.pending().is_empty());
    }
}
