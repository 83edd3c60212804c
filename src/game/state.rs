//! World State
//!
//! The aggregate the orchestrator mutates each tick: phase, level,
//! entities, scenery, camera and the pending event queue. Everything
//! that influences future ticks is hashed by [`World::compute_hash`].

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::animation::AnimationError;
use crate::game::camera::Camera;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::controller::PlayerController;
use crate::game::events::{EventQueue, GameEvent, GameEventData};
use crate::game::level::{Level, LevelData, LevelError};
use crate::game::registry::EntityRegistry;
use crate::game::scenery::Scenery;

// =============================================================================
// ENTITY ID
// =============================================================================

/// Identity handed out by the registry.
///
/// Implements Ord so hit sets iterate in a fixed order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

// =============================================================================
// GAME PHASE
// =============================================================================

/// Coarse game flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GamePhase {
    /// Assets still arriving
    #[default]
    Loading = 0,
    /// Title screen
    Menu = 1,
    /// Story text over a live world
    Dialogue = 2,
    /// Active gameplay
    Playing = 3,
    /// Scroll revealed, run over
    GameOver = 4,
}

impl GamePhase {
    /// Entities, camera and scenery stand still.
    #[inline]
    pub fn is_paused(self) -> bool {
        matches!(self, GamePhase::Loading | GamePhase::Menu)
    }

    /// Input, movement and combat are live.
    #[inline]
    pub fn is_playing(self) -> bool {
        self == GamePhase::Playing
    }
}

// =============================================================================
// BUILD ERRORS
// =============================================================================

/// Why a world could not be built.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Level data rejected
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),

    /// An animation table rejected
    #[error("invalid animation table: {0}")]
    Animation(#[from] AnimationError),

    /// Tunables rejected
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// WORLD
// =============================================================================

/// Complete simulation state.
#[derive(Clone, Debug)]
pub struct World {
    /// Ticks simulated so far
    pub tick: u32,
    /// Seed every RNG stream derives from
    pub seed: u64,
    pub(crate) step_ms: f64,
    pub(crate) phase: GamePhase,
    pub(crate) config: GameConfig,
    pub(crate) level: Level,
    pub(crate) registry: EntityRegistry,
    pub(crate) controller: PlayerController,
    pub(crate) scenery: Scenery,
    pub(crate) camera: Camera,
    pub(crate) events: EventQueue,
}

impl World {
    /// Validate inputs and build a world waiting at the menu.
    pub fn new(config: GameConfig, level: LevelData, seed: u64) -> Result<Self, BuildError> {
        config.validate()?;
        let level = level.build()?;

        let registry = EntityRegistry::populate(&config, &level, seed)?;
        let scenery = Scenery::new(
            level.eye_spawns(),
            &config.eyes,
            DeterministicRng::for_stream(seed, b"scenery"),
        );
        let mut camera = Camera::new(config.game.view_width, config.game.world_width());
        if let Some(player) = registry.player() {
            camera.follow(&player.body.bounds());
            camera.prev_x = camera.x;
        }

        info!(
            seed,
            enemies = registry.enemies().len(),
            platforms = level.platforms().len(),
            "world built"
        );

        let mut world = Self {
            tick: 0,
            seed,
            step_ms: config.game.step_ms(),
            phase: GamePhase::Loading,
            config,
            level,
            registry,
            controller: PlayerController::new(),
            scenery,
            camera,
            events: EventQueue::new(),
        };
        world.set_phase(GamePhase::Menu);
        Ok(world)
    }

    /// Default tunables and the built-in level.
    pub fn with_defaults(seed: u64) -> Result<Self, BuildError> {
        Self::new(GameConfig::default(), LevelData::default_level(), seed)
    }

    /// Leave the menu and start playing.
    pub fn start(&mut self) {
        self.set_phase(GamePhase::Playing);
    }

    /// Move to `phase`. Setting the current phase again is a no-op.
    pub fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        let old_phase = self.phase;
        self.phase = phase;
        self.events.emit(GameEventData::PhaseChanged { old_phase, new_phase: phase });
        info!(tick = self.tick, ?old_phase, new_phase = ?phase, "phase changed");
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Fixed step in ms.
    #[inline]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Simulation time elapsed, in ms.
    #[inline]
    pub fn time_ms(&self) -> f64 {
        self.tick as f64 * self.step_ms
    }

    /// Tunables.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Platforms and ground.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Live entities.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Live entities, mutably.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Reactive props.
    pub fn scenery(&self) -> &Scenery {
        &self.scenery
    }

    /// Camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Input state carried between ticks.
    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    /// Events not yet taken.
    pub fn pending_events(&self) -> &[GameEvent] {
        self.events.pending()
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.events.take()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            hasher.update_u8(self.phase as u8);
            self.registry.hash_into(hasher);
            self.scenery.hash_into(hasher);
            self.camera.hash_into(hasher);
            hasher.update_f64(self.controller.confusion_timer_ms());
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
