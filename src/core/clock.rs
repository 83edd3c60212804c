//! Fixed-Step Simulation Clock
//!
//! Decouples simulation rate from display refresh rate.
//!
//! ```text
//! render callback ──► frame_time = min(now - last, CAP)
//!                     accumulator += frame_time
//!                     while accumulator >= STEP { tick(STEP); accumulator -= STEP }
//!                     interpolation = accumulator / STEP      ∈ [0, 1)
//! ```
//!
//! Every tick receives exactly `STEP`; zero, one or several ticks may run
//! per callback. The cap bounds catch-up work after a stall.

use serde::{Serialize, Deserialize};

/// Default simulation step: 1000/60 ms.
pub const DEFAULT_STEP_MS: f64 = 1000.0 / 60.0;

/// Default cap on a single callback's elapsed time.
pub const DEFAULT_MAX_FRAME_MS: f64 = 250.0;

/// What a single render callback did.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Simulation ticks executed during this callback
    pub ticks: u32,
    /// Blend factor between the last two tick snapshots, in [0, 1)
    pub interpolation: f64,
    /// Elapsed time actually consumed (after the cap)
    pub frame_time_ms: f64,
}

/// Fixed-step accumulator clock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixedStepClock {
    step_ms: f64,
    max_frame_ms: f64,
    last_timestamp: Option<f64>,
    accumulator: f64,
    total_ticks: u64,
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_MS, DEFAULT_MAX_FRAME_MS)
    }
}

impl FixedStepClock {
    /// Create a clock with an explicit step and cap (both in ms).
    ///
    /// Non-positive or non-finite values fall back to the defaults.
    pub fn new(step_ms: f64, max_frame_ms: f64) -> Self {
        let step_ms = if step_ms.is_finite() && step_ms > 0.0 { step_ms } else { DEFAULT_STEP_MS };
        let max_frame_ms = if max_frame_ms.is_finite() && max_frame_ms > 0.0 {
            max_frame_ms
        } else {
            DEFAULT_MAX_FRAME_MS
        };

        Self {
            step_ms,
            max_frame_ms,
            last_timestamp: None,
            accumulator: 0.0,
            total_ticks: 0,
        }
    }

    /// Fixed step in milliseconds.
    #[inline]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Total ticks executed since creation.
    #[inline]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Unconsumed time carried into the next callback.
    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Current interpolation fraction.
    #[inline]
    pub fn interpolation(&self) -> f64 {
        self.accumulator / self.step_ms
    }

    /// Process a render callback at wall-clock timestamp `now_ms`.
    ///
    /// The first callback only establishes the baseline. Timestamps
    /// that go backwards count as zero elapsed time.
    pub fn advance<F>(&mut self, now_ms: f64, on_tick: F) -> FrameReport
    where
        F: FnMut(f64),
    {
        let elapsed = match self.last_timestamp {
            Some(last) => now_ms - last,
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);
        self.advance_by(elapsed, on_tick)
    }

    /// Process an already-measured elapsed time.
    pub fn advance_by<F>(&mut self, elapsed_ms: f64, mut on_tick: F) -> FrameReport
    where
        F: FnMut(f64),
    {
        let frame_time_ms = if elapsed_ms.is_finite() {
            elapsed_ms.clamp(0.0, self.max_frame_ms)
        } else {
            0.0
        };

        self.accumulator += frame_time_ms;

        let mut ticks = 0;
        while self.accumulator >= self.step_ms {
            on_tick(self.step_ms);
            self.accumulator -= self.step_ms;
            ticks += 1;
        }
        self.total_ticks += ticks as u64;

        FrameReport {
            ticks,
            interpolation: self.interpolation(),
            frame_time_ms,
        }
    }

    /// Forget the last timestamp, e.g. after the page was hidden.
    pub fn reset_baseline(&mut self) {
        self.last_timestamp = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_callback_is_baseline() {
        let mut clock = FixedStepClock::default();
        let report = clock.advance(10_000.0, |_| panic!("no tick on baseline"));
        assert_eq!(report.ticks, 0);
        assert_eq!(report.interpolation, 0.0);
    }

    #[test]
    fn test_ticks_receive_constant_step() {
        let mut clock = FixedStepClock::default();
        clock.advance(0.0, |_| {});

        let mut steps = Vec::new();
        clock.advance(110.0, |dt| steps.push(dt));

        assert_eq!(steps.len(), 6);
        assert!(steps.iter().all(|dt| *dt == DEFAULT_STEP_MS));
    }

    #[test]
    fn test_spiral_of_death_cap() {
        let mut clock = FixedStepClock::default();
        clock.advance(0.0, |_| {});

        // Ten second stall only yields 250ms of catch-up
        let report = clock.advance(10_000.0, |_| {});
        assert_eq!(report.frame_time_ms, DEFAULT_MAX_FRAME_MS);
        assert!((14..=15).contains(&report.ticks));
    }

    #[test]
    fn test_short_callbacks_accumulate() {
        let mut clock = FixedStepClock::default();
        clock.advance(0.0, |_| {});

        // 144Hz display: ~6.94ms per callback
        let mut total = 0;
        let mut t = 0.0;
        for _ in 0..3 {
            t += 1000.0 / 144.0;
            total += clock.advance(t, |_| {}).ticks;
        }
        assert_eq!(total, 1);
    }

    #[test]
    fn test_backwards_timestamp_is_ignored() {
        let mut clock = FixedStepClock::default();
        clock.advance(500.0, |_| {});
        let report = clock.advance(400.0, |_| {});
        assert_eq!(report.ticks, 0);
        assert_eq!(report.frame_time_ms, 0.0);
    }

    #[test]
    fn test_interpolation_in_unit_interval() {
        let mut clock = FixedStepClock::default();
        clock.advance(0.0, |_| {});
        let report = clock.advance(25.0, |_| {});
        assert_eq!(report.ticks, 1);
        assert!(report.interpolation >= 0.0 && report.interpolation < 1.0);
        assert!((report.interpolation - (25.0 - DEFAULT_STEP_MS) / DEFAULT_STEP_MS).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_parameters_fall_back() {
        let clock = FixedStepClock::new(0.0, f64::NAN);
        assert_eq!(clock.step_ms(), DEFAULT_STEP_MS);
    }

    proptest! {
        #[test]
        fn prop_tick_count_independent_of_division(
            frames in proptest::collection::vec(0.0f64..250.0, 1..200)
        ) {
            let mut split = FixedStepClock::default();
            let mut split_ticks = 0u64;
            for dt in &frames {
                split_ticks += split.advance_by(*dt, |_| {}).ticks as u64;
            }

            let total: f64 = frames.iter().sum();
            let expected = (total / DEFAULT_STEP_MS).floor() as i64;
            prop_assert!((split_ticks as i64 - expected).abs() <= 1,
                "ticks {} vs floor {}", split_ticks, expected);

            let interp = split.interpolation();
            prop_assert!((0.0..1.0).contains(&interp));
        }

        #[test]
        fn prop_coalescing_pairs_matches(
            pairs in proptest::collection::vec((0.0f64..125.0, 0.0f64..125.0), 1..100)
        ) {
            let mut split = FixedStepClock::default();
            let mut merged = FixedStepClock::default();
            let mut split_ticks = 0i64;
            let mut merged_ticks = 0i64;

            for (a, b) in &pairs {
                split_ticks += split.advance_by(*a, |_| {}).ticks as i64;
                split_ticks += split.advance_by(*b, |_| {}).ticks as i64;
                merged_ticks += merged.advance_by(a + b, |_| {}).ticks as i64;
            }

            prop_assert!((split_ticks - merged_ticks).abs() <= 1);
        }
    }
}
