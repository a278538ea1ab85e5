use super::*;

use super::utils::pick_enemy_type;
use crate::types::EnemyType;

impl Encounter {
    pub(super) fn spawn_initial_enemies(&mut self, count: usize) {
        let min_x = 400.0_f32.min(self.world_width as f32);
        let max_x = (self.world_width as f32 - 200.0).max(min_x);
        for _ in 0..count {
            let x = self.rng.range_f32(min_x, max_x);
            let y = self.rng.range_f32(WALK_MIN_Y, WALK_MAX_Y);
            self.spawn_enemy(Vec2::new(x, y));
        }
        if count > 0 {
            self.events.push(RuntimeEvent::EnemiesSpawned { count });
        }
    }

    /// Drops a batch of enemies just inside the new frontier after an extension.
    pub(super) fn spawn_reinforcements(&mut self, count: usize) {
        let frontier = self.world_width as f32;
        let min_x = (frontier - self.frontier_rules.trigger_margin as f32).max(0.0);
        for _ in 0..count {
            let x = self.rng.range_f32(min_x, frontier);
            let y = self.rng.range_f32(WALK_MIN_Y, WALK_MAX_Y);
            self.spawn_enemy(Vec2::new(x, y));
        }
        if count > 0 {
            self.events.push(RuntimeEvent::EnemiesSpawned { count });
        }
    }

    pub(super) fn spawn_enemy(&mut self, at: Vec2) -> String {
        let enemy_type = pick_enemy_type(self.tuning.enemy_fast_chance, &mut self.rng);
        let speed = match enemy_type {
            EnemyType::Fast => self.tuning.enemy_fast_speed,
            EnemyType::Standard => self.tuning.enemy_standard_speed,
        };
        let id = self.make_id("enemy");
        let at = clamp_to_walk_band(at, self.world_width);
        self.enemies.push(EnemyInternal {
            view: EnemyView {
                id: id.clone(),
                x: at.x,
                y: at.y,
                facing: Facing::toward(at.x, self.player.view.x),
                health: self.tuning.enemy_health,
                enemy_type,
                hit_recently: false,
                alive: true,
                visual: VisualState::Idle,
            },
            speed,
            moving: false,
            knockback: None,
        });
        id
    }

    /// Spawns the level boss ahead of the player, or behind when the
    /// frontier leaves more room there, and locks the world.
    /// Returns false when a boss was already spawned this encounter.
    pub fn spawn_boss(&mut self) -> bool {
        if self.boss_spawned || self.boss_defeated {
            return false;
        }
        let world_max = self.world_width as f32;
        let player_x = self.player.view.x;
        let offset = self.tuning.boss_spawn_offset;
        let ahead = (player_x + offset).min(world_max);
        let behind = (player_x - offset).max(0.0);
        let x = if ahead - player_x >= player_x - behind {
            ahead
        } else {
            behind
        };
        let y = self.player.view.y;
        let half = self.tuning.boss_patrol_half_width;
        let brain = BossBrain::new((x - half).max(0.0), (x + half).min(world_max));
        let max_health = get_boss_max_health(self.level);
        let id = self.make_id("boss");

        self.boss = Some(BossInternal {
            view: BossView {
                id: id.clone(),
                x,
                y,
                facing: Facing::toward(x, self.player.view.x),
                health: max_health,
                max_health,
                state: brain.state,
                patrol: brain.patrol,
                last_attack_at: None,
                engaged: false,
                hit_recently: false,
                visual: VisualState::Walk,
            },
            brain,
            knockback: None,
        });
        self.boss_spawned = true;
        self.events.push(RuntimeEvent::BossSpawned { boss_id: id });
        self.events
            .push(RuntimeEvent::BossHealthChanged { pct: 100.0 });
        if !self.world_locked {
            self.world_locked = true;
            self.events.push(RuntimeEvent::WorldLocked);
        }
        true
    }

    pub(super) fn spawn_portal(&mut self, at: Vec2) {
        if self.portal_spawned {
            return;
        }
        let at = clamp_to_walk_band(at, self.world_width);
        self.portal = Some(at);
        self.portal_spawned = true;
        self.events.push(RuntimeEvent::PortalSpawned { x: at.x, y: at.y });
    }
}
