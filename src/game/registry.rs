//! Entity Registry
//!
//! Sole owner of every live entity. Each tick the registry updates all
//! entities in a fixed order, then a separate [`EntityRegistry::cull`]
//! pass reaps whatever was marked for deletion. Nothing is removed
//! mid-update.
//!
//! Spawning goes through [`Spawner`], which is kept as its own field so
//! entity updates can borrow it mutably while the entity collections
//! are being iterated.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::animation::AnimationError;
use crate::game::body::Facing;
use crate::game::chest::{Chest, Scroll};
use crate::game::config::{BulletConfig, ChestConfig, EnemyConfig, GameConfig, ParticleConfig, ScrollConfig};
use crate::game::animation::AnimationSet;
use crate::game::enemy::Enemy;
use crate::game::events::EventQueue;
use crate::game::level::{Level, SpawnPoint};
use crate::game::particle::Particle;
use crate::game::player::Player;
use crate::game::projectile::Bullet;
use crate::game::state::EntityId;

/// Read-only inputs shared by every entity update in one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Fixed step in ms
    pub dt_ms: f64,
    /// Simulation time at the start of the tick (ms)
    pub now_ms: f64,
    /// Gameplay is live (movement, AI, collisions)
    pub playing: bool,
    /// Platforms and ground
    pub level: &'a Level,
    /// Total world width
    pub world_width: f32,
}

// =============================================================================
// SPAWNER
// =============================================================================

/// Creates transient entities: bullets, particles and scrolls.
///
/// Spawns are one-way. Particle spreads draw from the spawner's own
/// RNG stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spawner {
    pub(crate) bullets: Vec<Bullet>,
    pub(crate) particles: Vec<Particle>,
    pub(crate) scrolls: Vec<Scroll>,
    rng: DeterministicRng,
    next_id: u32,
    bullet_config: BulletConfig,
    particle_config: ParticleConfig,
    scroll_config: ScrollConfig,
}

impl Spawner {
    /// Empty spawner seeded from the world seed.
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            bullets: Vec::new(),
            particles: Vec::new(),
            scrolls: Vec::new(),
            rng: DeterministicRng::for_stream(seed, b"particles"),
            next_id: 1,
            bullet_config: config.bullet.clone(),
            particle_config: config.particles.clone(),
            scroll_config: config.scroll.clone(),
        }
    }

    /// Hand out the next entity identity.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Burst sizes.
    #[inline]
    pub fn particle_config(&self) -> &ParticleConfig {
        &self.particle_config
    }

    /// Live bullets.
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Live particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Live scrolls.
    pub fn scrolls(&self) -> &[Scroll] {
        &self.scrolls
    }

    /// Fire a bullet.
    pub fn spawn_bullet(&mut self, x: f32, y: f32, facing: Facing) -> EntityId {
        let id = self.allocate_id();
        self.bullets.push(Bullet::new(id, x, y, facing, &self.bullet_config));
        id
    }

    /// Hit spray.
    pub fn spawn_blood(&mut self, x: f32, y: f32) {
        for _ in 0..self.particle_config.blood_count {
            self.particles.push(Particle::blood(x, y, &mut self.rng));
        }
    }

    /// Chest smoke.
    pub fn spawn_smoke(&mut self, x: f32, y: f32) {
        for _ in 0..self.particle_config.smoke_count {
            self.particles.push(Particle::smoke(x, y, &mut self.rng));
        }
    }

    /// Skid dust behind a slowed player.
    pub fn spawn_dust(&mut self, x: f32, y: f32, facing: Facing) {
        for _ in 0..self.particle_config.dust_count {
            self.particles.push(Particle::dust(x, y, facing, &mut self.rng));
        }
    }

    /// Footstep or landing puffs.
    pub fn spawn_footsteps(&mut self, x: f32, y: f32, count: u32, facing: Option<Facing>) {
        for _ in 0..count {
            self.particles.push(Particle::footstep(x, y, facing, &mut self.rng));
        }
    }

    /// Glints on a ring of radius up to `ring` around `(cx, cy)`.
    pub fn spawn_sparkles(&mut self, cx: f32, cy: f32, ring: f32, count: u32) {
        for _ in 0..count {
            self.particles.push(Particle::sparkle(cx, cy, ring, &mut self.rng));
        }
    }

    /// Scroll rising out of a chest at `(chest_x, chest_y)`.
    pub fn spawn_scroll(&mut self, chest_x: f32, chest_y: f32, chest_width: f32) -> EntityId {
        let id = self.allocate_id();
        self.scrolls.push(Scroll::new(id, chest_x, chest_y, chest_width, &self.scroll_config));
        id
    }

    fn update(&mut self, ctx: &TickContext<'_>, events: &mut EventQueue) {
        for scroll in &mut self.scrolls {
            scroll.update(ctx.dt_ms, events);
        }
        for bullet in &mut self.bullets {
            bullet.update(ctx.world_width);
        }
        for particle in &mut self.particles {
            particle.update(ctx.dt_ms);
        }
    }

    fn cull(&mut self) -> usize {
        let before = self.bullets.len() + self.particles.len();
        self.bullets.retain(|b| !b.is_marked_for_deletion());
        self.particles.retain(|p| !p.is_marked_for_deletion());
        before - self.bullets.len() - self.particles.len()
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.next_id);
        let [s0, s1] = self.rng.state();
        hasher.update_u64(s0);
        hasher.update_u64(s1);

        hasher.update_u32(self.bullets.len() as u32);
        for bullet in &self.bullets {
            bullet.hash_into(hasher);
        }
        hasher.update_u32(self.particles.len() as u32);
        for particle in &self.particles {
            particle.hash_into(hasher);
        }
        for scroll in &self.scrolls {
            scroll.hash_into(hasher);
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Every live entity in the world.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRegistry {
    player: Option<Player>,
    enemies: Vec<Enemy>,
    chests: Vec<Chest>,
    spawner: Spawner,
    enemy_config: EnemyConfig,
    chest_config: ChestConfig,
    enemy_animations: AnimationSet,
    chest_animations: AnimationSet,
    gravity: f32,
}

impl EntityRegistry {
    /// Registry with no entities.
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            player: None,
            enemies: Vec::new(),
            chests: Vec::new(),
            spawner: Spawner::new(config, seed),
            enemy_config: config.enemy.clone(),
            chest_config: config.chest.clone(),
            enemy_animations: config.animations.enemy.clone(),
            chest_animations: config.animations.chest.clone(),
            gravity: config.game.gravity,
        }
    }

    /// Registry holding the player plus every enemy and chest the level
    /// places.
    pub fn populate(config: &GameConfig, level: &Level, seed: u64) -> Result<Self, AnimationError> {
        let mut registry = Self::new(config, seed);
        registry.player = Some(Player::new(
            &config.player,
            config.game.view_width,
            level.ground_y(),
            config.game.gravity,
            config.animations.player.clone(),
        )?);
        for &spawn in level.enemy_spawns() {
            registry.spawn_enemy(spawn)?;
        }
        for &x in level.chest_spawns() {
            registry.spawn_chest(x, level.ground_y())?;
        }
        debug!(
            enemies = registry.enemies.len(),
            chests = registry.chests.len(),
            "registry populated"
        );
        Ok(registry)
    }

    /// Add an enemy.
    pub fn spawn_enemy(&mut self, spawn: SpawnPoint) -> Result<EntityId, AnimationError> {
        let id = self.spawner.allocate_id();
        let enemy = Enemy::new(id, spawn, &self.enemy_config, self.enemy_animations.clone(), self.gravity)?;
        self.enemies.push(enemy);
        Ok(id)
    }

    /// Add a chest standing on `ground_y`.
    pub fn spawn_chest(&mut self, x: f32, ground_y: f32) -> Result<EntityId, AnimationError> {
        let id = self.spawner.allocate_id();
        let chest = Chest::new(id, x, ground_y, &self.chest_config, self.chest_animations.clone())?;
        self.chests.push(chest);
        Ok(id)
    }

    /// The player, if spawned.
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// The player, mutably.
    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Enemies in spawn order.
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Look up an enemy.
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Chests in spawn order.
    pub fn chests(&self) -> &[Chest] {
        &self.chests
    }

    /// Transient entities.
    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// Transient entities, mutably.
    pub fn spawner_mut(&mut self) -> &mut Spawner {
        &mut self.spawner
    }

    /// Borrow every collection at once.
    pub(crate) fn parts_mut(&mut self) -> (Option<&mut Player>, &mut [Enemy], &mut [Chest], &mut Spawner) {
        (self.player.as_mut(), &mut self.enemies, &mut self.chests, &mut self.spawner)
    }

    /// Total live entities, particles included.
    pub fn entity_count(&self) -> usize {
        usize::from(self.player.is_some())
            + self.enemies.len()
            + self.chests.len()
            + self.spawner.bullets.len()
            + self.spawner.particles.len()
            + self.spawner.scrolls.len()
    }

    /// Update every entity once, in registry order.
    pub fn update(&mut self, ctx: &TickContext<'_>, events: &mut EventQueue) {
        if let Some(player) = &mut self.player {
            player.update(ctx, &mut self.spawner, events);
        }
        for enemy in &mut self.enemies {
            enemy.update(ctx, events);
        }

        let player_center = self.player.as_ref().map(|p| (p.body.center_x(), p.body.center_y()));
        for chest in &mut self.chests {
            chest.update(ctx.dt_ms, player_center, &mut self.spawner);
        }

        self.spawner.update(ctx, events);
    }

    /// Paused tick: make every interpolation snapshot equal the current
    /// position so frames drawn while frozen do not blend stale motion.
    pub fn hold_still(&mut self) {
        if let Some(player) = &mut self.player {
            player.body.snapshot();
        }
        for enemy in &mut self.enemies {
            enemy.body.snapshot();
        }
        for bullet in &mut self.spawner.bullets {
            bullet.prev_x = bullet.x;
            bullet.prev_y = bullet.y;
        }
        for particle in &mut self.spawner.particles {
            particle.prev_x = particle.x;
            particle.prev_y = particle.y;
        }
    }

    /// Remove everything marked for deletion. Returns how many went.
    pub fn cull(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| !e.is_marked_for_deletion());
        (before - self.enemies.len()) + self.spawner.cull()
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_bool(self.player.is_some());
        if let Some(player) = &self.player {
            player.hash_into(hasher);
        }
        hasher.update_u32(self.enemies.len() as u32);
        for enemy in &self.enemies {
            enemy.hash_into(hasher);
        }
        for chest in &self.chests {
            chest.hash_into(hasher);
        }
        self.spawner.hash_into(hasher);
    }
}
