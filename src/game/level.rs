//! Level Layout
//!
//! Platforms, spawn points and the ground line, consumed once when the
//! world is built. `LevelData` is the raw (serde) form; `Level` is the
//! validated, read-only form the simulation holds.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;

/// Errors raised while validating level data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LevelError {
    /// Platform with zero area or non-finite components
    #[error("platform {index} is degenerate: {rect:?}")]
    DegeneratePlatform {
        /// Position in the platform list
        index: usize,
        /// The offending rectangle
        rect: Rect,
    },

    /// Ground line must be finite
    #[error("ground line {0} is not finite")]
    InvalidGround(f32),

    /// A spawn point has non-finite coordinates
    #[error("{kind} spawn {index} is not finite")]
    InvalidSpawn {
        /// Spawn list name
        kind: &'static str,
        /// Position in that list
        index: usize,
    },
}

/// Standard platform footprint (three 128px tiles, one tile tall).
pub const PLATFORM_WIDTH: f32 = 384.0;
/// Standard platform height.
pub const PLATFORM_HEIGHT: f32 = 64.0;

/// Spawn coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Left edge (or centre for eyes)
    pub x: f32,
    /// Top edge (or centre for eyes)
    pub y: f32,
}

impl SpawnPoint {
    /// Create a spawn point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Raw level layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Y of the ground surface
    pub ground_y: f32,
    /// Solid platforms, in collision priority order
    pub platforms: Vec<Rect>,
    /// Enemy spawns (they fall to the nearest surface)
    pub enemies: Vec<SpawnPoint>,
    /// Chest positions (x only matters, chests rest on the ground)
    #[serde(default)]
    pub chests: Vec<f32>,
    /// Blinking eyes, by centre point
    #[serde(default)]
    pub eyes: Vec<SpawnPoint>,
}

impl LevelData {
    /// The shipped level.
    pub fn default_level() -> Self {
        let platform = |x: f32, y: f32| Rect::new(x, y, PLATFORM_WIDTH, PLATFORM_HEIGHT);

        Self {
            ground_y: 600.0 * 0.875,
            platforms: vec![
                platform(750.0, 300.0),
                platform(1600.0, 350.0),
                platform(2900.0, 300.0),
                platform(3400.0, 150.0),
                platform(4050.0, 200.0),
                platform(5500.0, 250.0),
            ],
            enemies: [1100.0, 2200.0, 2700.0, 3900.0, 4800.0, 5700.0]
                .into_iter()
                .map(|x| SpawnPoint::new(x, 0.0))
                .collect(),
            chests: vec![5500.0],
            eyes: vec![
                SpawnPoint::new(1040.0, 470.0),
                SpawnPoint::new(2490.0, 490.0),
                SpawnPoint::new(4040.0, 470.0),
                SpawnPoint::new(5050.0, 480.0),
            ],
        }
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<Level, LevelError> {
        if !self.ground_y.is_finite() {
            return Err(LevelError::InvalidGround(self.ground_y));
        }
        for (index, rect) in self.platforms.iter().enumerate() {
            if rect.is_degenerate() {
                return Err(LevelError::DegeneratePlatform { index, rect: *rect });
            }
        }
        for (index, spawn) in self.enemies.iter().enumerate() {
            if !spawn.is_finite() {
                return Err(LevelError::InvalidSpawn { kind: "enemy", index });
            }
        }
        for (index, spawn) in self.eyes.iter().enumerate() {
            if !spawn.is_finite() {
                return Err(LevelError::InvalidSpawn { kind: "eyes", index });
            }
        }
        if let Some(index) = self.chests.iter().position(|x| !x.is_finite()) {
            return Err(LevelError::InvalidSpawn { kind: "chest", index });
        }

        Ok(Level { data: self })
    }
}

impl Default for LevelData {
    fn default() -> Self {
        Self::default_level()
    }
}

/// Validated, immutable level.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    data: LevelData,
}

impl Level {
    /// Ground surface.
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.data.ground_y
    }

    /// Platforms in collision priority order.
    #[inline]
    pub fn platforms(&self) -> &[Rect] {
        &self.data.platforms
    }

    /// Enemy spawns.
    pub fn enemy_spawns(&self) -> &[SpawnPoint] {
        &self.data.enemies
    }

    /// Chest x positions.
    pub fn chest_spawns(&self) -> &[f32] {
        &self.data.chests
    }

    /// Eye positions.
    pub fn eye_spawns(&self) -> &[SpawnPoint] {
        &self.data.eyes
    }
}
