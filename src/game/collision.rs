//! Combat Hit Detection
//!
//! Runs after every entity has moved and before the next tick's cull, so
//! it sees post-movement positions and anything it kills is still around
//! for its death sequence.
//!
//! Two damage paths, both against enemy hitboxes in registry order:
//!
//! - **Bullets** hit at most one enemy. The first overlap takes the
//!   damage and the bullet is marked. A bullet that hit nothing may
//!   still scare scenery it passes through.
//! - **Melee** is live only while the swing clip plays. Each enemy is
//!   damaged at most once per swing via the player's hit set.
//!
//! Scaring scenery never costs health and never consumes a bullet.

use serde::{Serialize, Deserialize};

use crate::game::config::MeleeConfig;
use crate::game::enemy::Enemy;
use crate::game::events::EventQueue;
use crate::game::player::Player;
use crate::game::registry::{EntityRegistry, Spawner};
use crate::game::scenery::Scenery;

/// What the combat pass did this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    /// Enemies damaged by bullets
    pub bullet_hits: u32,
    /// Enemies damaged by the melee swing
    pub melee_hits: u32,
    /// Scenery props scared
    pub scares: u32,
}

/// Resolve every bullet and the current swing.
pub fn resolve_combat(
    registry: &mut EntityRegistry,
    scenery: &mut Scenery,
    melee: &MeleeConfig,
    events: &mut EventQueue,
) -> CombatReport {
    let (player, enemies, _, spawner) = registry.parts_mut();
    let mut report = resolve_bullets(enemies, spawner, scenery, events);
    if let Some(player) = player {
        let swing = resolve_melee(player, enemies, spawner, scenery, melee, events);
        report.melee_hits = swing.melee_hits;
        report.scares += swing.scares;
    }
    report
}

/// Bullets against enemies, then against scenery for bullets that missed.
pub fn resolve_bullets(
    enemies: &mut [Enemy],
    spawner: &mut Spawner,
    scenery: &mut Scenery,
    events: &mut EventQueue,
) -> CombatReport {
    let mut report = CombatReport::default();

    // Indexed so blood can be spawned while bullets are borrowed
    for i in 0..spawner.bullets.len() {
        let bullet = &spawner.bullets[i];
        if bullet.is_marked_for_deletion() {
            continue;
        }
        let rect = bullet.rect();
        let damage = bullet.damage;

        let target = enemies
            .iter_mut()
            .find(|e| e.hitbox().is_some_and(|hitbox| rect.overlaps(&hitbox)));

        match target {
            Some(enemy) => {
                enemy.take_damage(damage, events);
                spawner.bullets[i].mark_for_deletion();
                spawner.spawn_blood(rect.x, rect.center_y());
                report.bullet_hits += 1;
            }
            None => {
                report.scares += scenery.scare_overlapping(&rect, events) as u32;
            }
        }
    }

    report
}

/// The player's swing against enemies and scenery.
pub fn resolve_melee(
    player: &mut Player,
    enemies: &mut [Enemy],
    spawner: &mut Spawner,
    scenery: &mut Scenery,
    melee: &MeleeConfig,
    events: &mut EventQueue,
) -> CombatReport {
    let mut report = CombatReport::default();
    let Some(attack) = player.melee_hitbox(melee.range) else {
        return report;
    };

    for enemy in enemies.iter_mut() {
        let Some(hitbox) = enemy.hitbox() else {
            continue;
        };
        if player.swing_hits().contains(&enemy.id) || !attack.overlaps(&hitbox) {
            continue;
        }
        enemy.take_damage(melee.damage, events);
        player.register_swing_hit(enemy.id);
        spawner.spawn_blood(enemy.body.center_x(), enemy.body.center_y());
        report.melee_hits += 1;
    }

    report.scares = scenery.scare_overlapping(&attack, events) as u32;
    report
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::body::Facing;
    use crate::game::config::{EyesConfig, GameConfig};
    use crate::game::events::GameEventData;
    use crate::game::level::{LevelData, SpawnPoint};
    use crate::game::state::EntityId;

    fn registry(enemy_xs: &[f32]) -> EntityRegistry {
        let level = LevelData {
            ground_y: 525.0,
            platforms: Vec::new(),
            enemies: enemy_xs.iter().map(|&x| SpawnPoint::new(x, 407.0)).collect(),
            chests: Vec::new(),
            eyes: Vec::new(),
        }
        .build()
        .unwrap();
        EntityRegistry::populate(&GameConfig::default(), &level, 5).unwrap()
    }

    fn scenery(eyes: &[SpawnPoint]) -> Scenery {
        Scenery::new(eyes, &EyesConfig::default(), DeterministicRng::new(1))
    }

    fn health(registry: &EntityRegistry) -> Vec<u32> {
        registry.enemies().iter().map(|e| e.health()).collect()
    }

    #[test]
    fn test_bullet_hits_only_first_enemy() {
        // Both hitboxes cover x 1044..1084
        let mut registry = registry(&[1000.0, 1000.0]);
        let mut scenery = scenery(&[]);
        let mut events = EventQueue::new();
        registry.spawner_mut().spawn_bullet(1050.0, 450.0, Facing::Right);

        let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);

        assert_eq!(report.bullet_hits, 1);
        assert_eq!(health(&registry), vec![80, 100]);
        assert!(registry.spawner().bullets()[0].is_marked_for_deletion());
        assert_eq!(registry.spawner().particles().len(), 15);

        // A marked bullet is not tested again
        let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
        assert_eq!(report.bullet_hits, 0);
        assert_eq!(health(&registry), vec![80, 100]);
    }

    #[test]
    fn test_bullet_skips_dead_enemy() {
        let mut registry = registry(&[1000.0, 1000.0]);
        let mut scenery = scenery(&[]);
        let mut events = EventQueue::new();
        let (_, enemies, _, _) = registry.parts_mut();
        enemies[0].take_damage(100, &mut events);

        registry.spawner_mut().spawn_bullet(1050.0, 450.0, Facing::Right);
        resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
        assert_eq!(health(&registry), vec![0, 80]);
    }

    #[test]
    fn test_missed_bullet_scares_eyes_hit_bullet_does_not() {
        let mut registry = registry(&[2000.0]);
        let mut scenery = scenery(&[SpawnPoint::new(1500.0, 450.0), SpawnPoint::new(2064.0, 450.0)]);
        let mut events = EventQueue::new();

        registry.spawner_mut().spawn_bullet(1495.0, 448.0, Facing::Right);
        registry.spawner_mut().spawn_bullet(2060.0, 448.0, Facing::Right);
        let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);

        assert_eq!(report.bullet_hits, 1);
        assert_eq!(report.scares, 1);
        assert!(scenery.eyes()[0].is_scared());
        assert!(!scenery.eyes()[1].is_scared());
        // Scaring does not consume the bullet
        assert!(!registry.spawner().bullets()[0].is_marked_for_deletion());
    }

    #[test]
    fn test_swing_hits_each_enemy_once_over_many_ticks() {
        // Player hitbox 480..520 facing right: swing covers 510..590
        let mut registry = registry(&[460.0, 500.0, 520.0, 900.0]);
        let mut scenery = scenery(&[]);
        let mut events = EventQueue::new();
        registry.player_mut().unwrap().melee_attack(&mut events);

        let mut total = 0;
        for _ in 0..10 {
            let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
            total += report.melee_hits;
        }

        assert_eq!(total, 3);
        assert_eq!(health(&registry), vec![75, 75, 75, 100]);
        let hit: Vec<_> = registry.player().unwrap().swing_hits().iter().copied().collect();
        assert_eq!(hit.len(), 3);
        assert!(!hit.contains(&registry.enemies()[3].id));
    }

    #[test]
    fn test_new_swing_can_hit_again() {
        let mut registry = registry(&[500.0]);
        let mut scenery = scenery(&[]);
        let mut events = EventQueue::new();

        registry.player_mut().unwrap().melee_attack(&mut events);
        resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
        registry.player_mut().unwrap().melee_attack(&mut events);
        resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);

        assert_eq!(health(&registry), vec![50]);
    }

    #[test]
    fn test_no_swing_no_hits() {
        let mut registry = registry(&[500.0]);
        let mut scenery = scenery(&[SpawnPoint::new(550.0, 470.0)]);
        let mut events = EventQueue::new();

        let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
        assert_eq!(report, CombatReport::default());
        assert!(events.pending().is_empty());
    }

    #[test]
    fn test_swing_scares_eyes_and_kills_emit_events() {
        let mut registry = registry(&[500.0]);
        let mut scenery = scenery(&[SpawnPoint::new(550.0, 470.0)]);
        let mut events = EventQueue::new();
        let (_, enemies, _, _) = registry.parts_mut();
        enemies[0].take_damage(80, &mut events);
        events.take();

        registry.player_mut().unwrap().melee_attack(&mut events);
        let report = resolve_combat(&mut registry, &mut scenery, &MeleeConfig::default(), &mut events);
        assert_eq!(report.melee_hits, 1);
        assert_eq!(report.scares, 1);

        let events = events.take();
        assert!(events
            .iter()
            .any(|e| e.data == GameEventData::EnemyKilled { enemy: EntityId(1) }));
        assert!(events.iter().any(|e| matches!(e.data, GameEventData::EyesScared { index: 0 })));
    }
}
