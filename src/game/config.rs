//! Game Tunables
//!
//! Every gameplay constant lives here. Defaults reproduce the shipped
//! game; any subset can be overridden from JSON because every section
//! and field falls back to its default.

use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::game::animation::{AnimationError, AnimationSet};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `GameConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// An animation table is malformed
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

// =============================================================================
// SECTIONS
// =============================================================================

/// View, world and physics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSection {
    /// Viewport width in pixels
    pub view_width: f32,
    /// Viewport height in pixels
    pub view_height: f32,
    /// World width as a multiple of the viewport
    pub world_width_multiplier: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Simulation rate
    pub tick_rate: u32,
    /// Cap on one render callback's elapsed time (ms)
    pub max_frame_ms: f64,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            view_width: 1000.0,
            view_height: 600.0,
            world_width_multiplier: 6.0,
            gravity: 1.0,
            tick_rate: 60,
            max_frame_ms: 250.0,
        }
    }
}

impl GameSection {
    /// Total scrollable width.
    pub fn world_width(&self) -> f32 {
        self.view_width * self.world_width_multiplier
    }

    /// Fixed step in ms.
    pub fn step_ms(&self) -> f64 {
        1000.0 / self.tick_rate.max(1) as f64
    }
}

/// Player body and movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Sprite width
    pub width: f32,
    /// Sprite height
    pub height: f32,
    /// Collision box width, centred in the sprite
    pub hitbox_width: f32,
    /// Initial upward speed of a jump (negative = up)
    pub jump_strength: f32,
    /// Horizontal speed per tick
    pub speed: f32,
    /// Minimum time between shots (ms of simulation time)
    pub shoot_cooldown_ms: f64,
    /// Speed multiplier while landing out of an airborne attack
    pub attack_slowdown: f32,
    /// How far feet sink into a surface
    pub vertical_offset: f32,
    /// Both-directions hold time before the confusion cue (ms)
    pub confusion_threshold_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 128.0,
            height: 128.0,
            hitbox_width: 40.0,
            jump_strength: -22.0,
            speed: 4.0,
            shoot_cooldown_ms: 500.0,
            attack_slowdown: 0.4,
            vertical_offset: 10.0,
            confusion_threshold_ms: 500.0,
        }
    }
}

/// Enemy body, patrol and death.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Sprite width
    pub width: f32,
    /// Sprite height
    pub height: f32,
    /// Hitbox width, centred in the sprite
    pub hitbox_width: f32,
    /// Patrol speed per tick
    pub speed: f32,
    /// How far left of its spawn an enemy walks
    pub patrol_range: f32,
    /// Starting health
    pub health: u32,
    /// Corpse sink duration (ms)
    pub death_sink_ms: f64,
    /// Corpse sink depth (px)
    pub death_sink_depth: f32,
    /// How far feet sink into a surface
    pub vertical_offset: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            width: 128.0,
            height: 128.0,
            hitbox_width: 40.0,
            speed: 1.0,
            patrol_range: 150.0,
            health: 100,
            death_sink_ms: 500.0,
            death_sink_depth: 40.0,
            vertical_offset: 10.0,
        }
    }
}

/// Projectile tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Speed per tick
    pub speed: f32,
    /// Damage on hit
    pub damage: u32,
    /// Travel distance before despawn
    pub max_distance: f32,
    /// Fraction of `max_distance` after which the bullet fades
    pub fade_start: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            width: 15.0,
            height: 5.0,
            speed: 15.0,
            damage: 20,
            max_distance: 700.0,
            fade_start: 0.8,
        }
    }
}

/// Melee swing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Damage per enemy per swing
    pub damage: u32,
    /// Reach from the hitbox edge
    pub range: f32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self { damage: 25, range: 80.0 }
    }
}

/// Particle burst sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Blood per hit
    pub blood_count: u32,
    /// Smoke when a chest opens
    pub smoke_count: u32,
    /// Dust per tick while slowed
    pub dust_count: u32,
    /// Dust on landing
    pub landing_dust_count: u32,
    /// Dust per footstep
    pub running_dust_count: u32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            blood_count: 15,
            smoke_count: 70,
            dust_count: 3,
            landing_dust_count: 8,
            running_dust_count: 2,
        }
    }
}

/// Treasure chest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChestConfig {
    /// Sprite width
    pub width: f32,
    /// Sprite height
    pub height: f32,
    /// Centre distance under which the player may open it
    pub interaction_range: f32,
    /// Time between sparkle bursts while closed (ms)
    pub sparkle_interval_ms: f64,
    /// Sparkles per burst
    pub sparkles_per_burst: u32,
}

impl Default for ChestConfig {
    fn default() -> Self {
        Self {
            width: 128.0,
            height: 128.0,
            interaction_range: 200.0,
            sparkle_interval_ms: 100.0,
            sparkles_per_burst: 2,
        }
    }
}

/// Scroll revealed by the chest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Final width
    pub width: f32,
    /// Final height
    pub height: f32,
    /// Scale-in duration (ms)
    pub reveal_ms: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { width: 100.0, height: 100.0, reveal_ms: 800.0 }
    }
}

/// Blinking eyes in the scenery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyesConfig {
    /// Shortest wait between blinks (ms)
    pub blink_min_ms: f64,
    /// Longest wait between blinks (ms)
    pub blink_max_ms: f64,
    /// Lid closing time (ms)
    pub closing_ms: f64,
    /// Lid closed time (ms)
    pub closed_ms: f64,
    /// Lid opening time (ms)
    pub opening_ms: f64,
    /// Fade out after a scare (ms)
    pub fade_out_ms: f64,
    /// Time hidden after a scare (ms)
    pub hidden_ms: f64,
    /// Fade back in (ms)
    pub fade_in_ms: f64,
    /// Resting opacity
    pub base_alpha: f32,
    /// Half-width of the scare zone around the eyes
    pub scare_half_width: f32,
    /// Half-height of the scare zone around the eyes
    pub scare_half_height: f32,
    /// Maximum pupil displacement (px)
    pub max_pupil_offset: f32,
    /// Fraction of the remaining pupil offset closed per tick
    pub pupil_follow: f32,
}

impl Default for EyesConfig {
    fn default() -> Self {
        Self {
            blink_min_ms: 2000.0,
            blink_max_ms: 6000.0,
            closing_ms: 60.0,
            closed_ms: 120.0,
            opening_ms: 80.0,
            fade_out_ms: 1000.0,
            hidden_ms: 5000.0,
            fade_in_ms: 1000.0,
            base_alpha: 0.85,
            scare_half_width: 20.0,
            scare_half_height: 40.0,
            max_pupil_offset: 2.5,
            pupil_follow: 0.08,
        }
    }
}

/// Animation tables per entity kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTables {
    /// Player clips
    pub player: AnimationSet,
    /// Enemy clips
    pub enemy: AnimationSet,
    /// Chest clips
    pub chest: AnimationSet,
}

impl Default for AnimationTables {
    fn default() -> Self {
        Self {
            player: AnimationSet::player(),
            enemy: AnimationSet::enemy(),
            chest: AnimationSet::chest(),
        }
    }
}

// =============================================================================
// GAME CONFIG
// =============================================================================

/// All tunables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// View, world and physics
    pub game: GameSection,
    /// Player
    pub player: PlayerConfig,
    /// Enemies
    pub enemy: EnemyConfig,
    /// Bullets
    pub bullet: BulletConfig,
    /// Melee
    pub melee: MeleeConfig,
    /// Particle bursts
    pub particles: ParticleConfig,
    /// Treasure chest
    pub chest: ChestConfig,
    /// Revealed scroll
    pub scroll: ScrollConfig,
    /// Blinking eyes
    pub eyes: EyesConfig,
    /// Animation tables
    pub animations: AnimationTables,
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loading game config");
        Self::from_json_str(&json)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool, &'static str); 14] = [
            ("game.view_width", positive(self.game.view_width), "must be positive"),
            ("game.world_width_multiplier", self.game.world_width_multiplier >= 1.0, "must be at least 1"),
            ("game.gravity", self.game.gravity.is_finite(), "must be finite"),
            ("game.tick_rate", self.game.tick_rate > 0, "must be positive"),
            ("game.max_frame_ms", self.game.max_frame_ms > 0.0, "must be positive"),
            ("player.width", positive(self.player.width) && positive(self.player.height), "must be positive"),
            ("player.hitbox_width", positive(self.player.hitbox_width) && self.player.hitbox_width <= self.player.width, "must be in (0, width]"),
            ("player.speed", self.player.speed.is_finite() && self.player.speed >= 0.0, "must be non-negative"),
            ("player.attack_slowdown", (0.0..=1.0).contains(&self.player.attack_slowdown), "must be in [0, 1]"),
            ("enemy.width", positive(self.enemy.width) && positive(self.enemy.height), "must be positive"),
            ("enemy.hitbox_width", positive(self.enemy.hitbox_width) && self.enemy.hitbox_width <= self.enemy.width, "must be in (0, width]"),
            ("enemy.death_sink_ms", self.enemy.death_sink_ms > 0.0, "must be positive"),
            ("bullet.max_distance", positive(self.bullet.max_distance) && (0.0..1.0).contains(&self.bullet.fade_start), "must be positive with fade_start in [0, 1)"),
            ("eyes.blink_max_ms", self.eyes.blink_min_ms >= 0.0 && self.eyes.blink_max_ms >= self.eyes.blink_min_ms, "must be at least blink_min_ms"),
        ];

        for (field, ok, reason) in checks {
            if !ok {
                warn!(field, reason, "rejected game config");
                return Err(ConfigError::Invalid { field, reason });
            }
        }

        self.animations.player.validate()?;
        self.animations.enemy.validate()?;
        self.animations.chest.validate()?;
        Ok(())
    }
}

#[inline]
fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.world_width(), 6000.0);
        assert_eq!(config.bullet.damage, 20);
        assert_eq!(config.melee.damage, 25);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "player": { "speed": 6.0 }, "melee": { "range": 120.0 } }"#)
            .unwrap();
        assert_eq!(config.player.speed, 6.0);
        assert_eq!(config.player.jump_strength, -22.0);
        assert_eq!(config.melee.range, 120.0);
        assert_eq!(config.melee.damage, 25);
        assert_eq!(config.enemy, EnemyConfig::default());
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = GameConfig::from_json_str(r#"{ "player": { "hitbox_width": 500.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "player.hitbox_width", .. }));
    }

    #[test]
    fn test_zero_frame_animation_rejected() {
        let json = r#"{
            "animations": {
                "player": {
                    "initial": "idle",
                    "clips": { "idle": { "frames": 0, "speed_ms": 100.0, "loop": true } }
                }
            }
        }"#;
        let err = GameConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Animation(AnimationError::ZeroFrames(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(GameConfig::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let json = serde_json::to_string(&GameConfig::default()).unwrap();
        let parsed = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, GameConfig::default());
    }
}
