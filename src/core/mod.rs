//! Core deterministic primitives.
//!
//! Shapes, randomness, hashing and the fixed-step clock. Nothing in
//! here knows about players or enemies.

pub mod rect;
pub mod rng;
pub mod hash;
pub mod clock;

// Re-export core types
pub use rect::Rect;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
pub use clock::{FixedStepClock, FrameReport};
