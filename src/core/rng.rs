//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ algorithm for fast, high-quality, deterministic randomness.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! Particle spreads and blink schedules draw from here instead of a
//! thread-local RNG so that two runs with the same seed and inputs
//! produce the same world hash.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use grimwood::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an independent stream for a named subsystem.
    pub fn for_stream(world_seed: u64, stream: &[u8]) -> Self {
        Self::new(derive_stream_seed(world_seed, stream))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random f32 in [0, 1).
    ///
    /// Uses the upper 24 bits so every value is exactly representable.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        let bits = (self.next_u64() >> 40) as u32;
        bits as f32 / (1u32 << 24) as f32
    }

    /// Generate a random f32 in [min, max).
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        min + self.next_f32() * (max - min)
    }

    /// Generate a random f32 in [-half_width, half_width).
    #[inline]
    pub fn spread_f32(&mut self, half_width: f32) -> f32 {
        self.range_f32(-half_width, half_width)
    }

    /// Current state, folded into the world hash.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a per-subsystem seed from the world seed.
///
/// Particles and scenery draw from separate streams so that adding a
/// blink never shifts the particle sequence.
pub fn derive_stream_seed(world_seed: u64, stream: &[u8]) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(b"GRIMWOOD_SEED_V1");
    hasher.update(world_seed.to_le_bytes());
    hasher.update(stream);

    let hash = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_spread_is_symmetric_range() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            let v = rng.spread_f32(2.5);
            assert!((-2.5..2.5).contains(&v));
        }
        assert_eq!(rng.spread_f32(0.0), 0.0);
    }

    #[test]
    fn test_next_f32_unit_interval() {
        let mut rng = DeterministicRng::new(9999);

        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "{} outside [0, 1)", v);
        }
    }

    #[test]
    fn test_range_f32() {
        let mut rng = DeterministicRng::new(5678);

        for _ in 0..1000 {
            let v = rng.range_f32(-3.0, 3.0);
            assert!((-3.0..3.0).contains(&v));
        }

        // Empty range collapses to min
        assert_eq!(rng.range_f32(5.0, 5.0), 5.0);
        assert_eq!(rng.range_f32(7.0, 2.0), 7.0);
    }

    #[test]
    fn test_stream_seeds_differ() {
        let particles = derive_stream_seed(42, b"particles");
        let scenery = derive_stream_seed(42, b"scenery");
        assert_ne!(particles, scenery);
        assert_eq!(particles, derive_stream_seed(42, b"particles"));
    }

    #[test]
    fn test_clone_continues_same_sequence() {
        let mut rng = DeterministicRng::new(5555);
        for _ in 0..50 {
            rng.next_u64();
        }

        let mut copy = rng.clone();
        assert_eq!(copy.state(), rng.state());
        for _ in 0..10 {
            assert_eq!(copy.range_f32(0.0, 10.0), rng.range_f32(0.0, 10.0));
        }
    }
}
