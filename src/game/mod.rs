//! Game Logic Module
//!
//! All game simulation code. Deterministic given config, level, seed
//! and per-tick actions.
//!
//! ## Module Structure
//!
//! - `config`: Tunables, JSON loadable
//! - `level`: Platforms and spawn points
//! - `input`: Action signals, rising edges, recordings
//! - `animation`: Frame-indexed clips with loop/one-shot policy
//! - `body`: Gravity and platform landing
//! - `player`, `controller`: The player and its action gating
//! - `enemy`, `projectile`, `particle`, `chest`, `scenery`: Entity kinds
//! - `registry`: Entity ownership, update and cull
//! - `collision`: Combat hit detection
//! - `camera`, `render`: What the renderer receives
//! - `events`: Fire-and-forget audio/effect signals
//! - `state`: World aggregate and state hash
//! - `tick`: Per-tick call order, frame driver, replay

pub mod config;
pub mod level;
pub mod input;
pub mod animation;
pub mod body;
pub mod player;
pub mod controller;
pub mod enemy;
pub mod projectile;
pub mod particle;
pub mod chest;
pub mod scenery;
pub mod camera;
pub mod events;
pub mod registry;
pub mod collision;
pub mod render;
pub mod state;
pub mod tick;

// Re-export key types
pub use config::{ConfigError, GameConfig};
pub use level::{Level, LevelData, LevelError, SpawnPoint};
pub use input::{ActionState, InputRecording, InputSource, PhaseChange, ScriptedInput};
pub use animation::{Anim, AnimationError, AnimationSet, Animator};
pub use events::{GameEvent, GameEventData, SoundCue};
pub use registry::EntityRegistry;
pub use render::{AllLoaded, RenderFrame, Renderer, SpriteKind, SpriteView, VisualSource};
pub use state::{BuildError, EntityId, GamePhase, World};
pub use tick::{replay, tick, Game, TickResult};
