//! # Grimwood
//!
//! Deterministic fixed-timestep simulation core for the Grimwood
//! side-scroller.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        GRIMWOOD                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rect.rs     - Axis-aligned rectangles                   │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  ├── hash.rs     - State hashing for verification            │
//! │  └── clock.rs    - Fixed-step accumulator clock              │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── animation.rs- Clip state machine                        │
//! │  ├── body.rs     - Gravity and platform landing              │
//! │  ├── player.rs   - Player and its controller                 │
//! │  ├── enemy.rs    - Patrol, damage, death sequence            │
//! │  ├── registry.rs - Entity ownership, update, cull            │
//! │  ├── collision.rs- Bullet and melee hit detection            │
//! │  ├── render.rs   - Interpolated render frames                │
//! │  └── tick.rs     - Per-tick call order, replay               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Every tick receives exactly one fixed step, whatever the display
//! rate. Given identical config, level, seed and per-tick actions the
//! simulation produces **identical state hashes**:
//! - No wall-clock reads inside the simulation
//! - Entities update in registry order, never hash-map order
//! - All randomness from seeded Xorshift128+ streams

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::clock::{FixedStepClock, FrameReport};
pub use core::rect::Rect;
pub use core::rng::DeterministicRng;
pub use game::config::GameConfig;
pub use game::input::{ActionState, InputRecording};
pub use game::state::{GamePhase, World};
pub use game::tick::{tick, Game};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Simulation step (ms)
pub const STEP_MS: f64 = 1000.0 / TICK_RATE as f64;
