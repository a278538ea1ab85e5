use std::collections::HashSet;

use crate::boss_ai::{BossBrain, BossRules};
use crate::config::{AttackProfile, EncounterOptions, Tuning};
use crate::constants::{
    get_boss_max_health, get_character_profile, get_initial_enemy_count, ENEMY_HOLD_DISTANCE,
    PLAYER_SPAWN_X, WALK_MAX_Y, WALK_MIN_Y,
};
use crate::frontier::FrontierRules;
use crate::input::InputIntent;
use crate::knockback::Knockback;
use crate::rng::Rng;
use crate::timers::TimerRegistry;
use crate::types::{
    AttackKind, AttackState, BossState, BossView, EncounterOutcome, EncounterSummary, EnemyView,
    Facing, HitboxView, HudView, PlayerView, PortalView, ProjectileView, Rect, RuntimeEvent,
    Snapshot, Vec2, VisualState,
};

mod boss_system;
mod combat;
mod director;
mod spawn_system;
mod timer_system;
mod utils;

use self::utils::{clamp_to_walk_band, move_toward};

pub const PLAYER_ID: &str = "player";

#[derive(Clone, Debug, PartialEq, Eq)]
enum TimerAction {
    AttackActive,
    AttackRecover { hitbox_id: String },
    AttackReady,
    DamageWindowEnd,
    KnockbackEnd,
    HitFlashEnd,
    ProjectileExpire,
}

#[derive(Clone, Debug, Default)]
struct EncounterStats {
    enemies_defeated: i32,
    damage_taken: i32,
    extensions: i32,
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    view: PlayerView,
    speed: f32,
    moving: bool,
    knockback: Option<Knockback>,
}

#[derive(Clone, Debug)]
struct EnemyInternal {
    view: EnemyView,
    speed: f32,
    moving: bool,
    knockback: Option<Knockback>,
}

#[derive(Clone, Debug)]
struct BossInternal {
    view: BossView,
    brain: BossBrain,
    knockback: Option<Knockback>,
}

#[derive(Clone, Debug)]
struct ProjectileInternal {
    view: ProjectileView,
}

/// Transient attack region. `already_hit` lives exactly as long as the hitbox.
#[derive(Clone, Debug)]
struct Hitbox {
    id: String,
    owner: String,
    kind: AttackKind,
    rect: Rect,
    profile: AttackProfile,
    active_from: u64,
    active_until: u64,
    already_hit: HashSet<String>,
}

impl Hitbox {
    fn is_active(&self, now_ms: u64) -> bool {
        now_ms >= self.active_from && now_ms < self.active_until
    }
}

/// One playthrough of a level: the single mutable state shared by every
/// system of the tick. Built at encounter start, dropped at its end.
#[derive(Clone, Debug)]
pub struct Encounter {
    pub level: u32,
    pub tuning: Tuning,

    boss_rules: BossRules,
    frontier_rules: FrontierRules,
    rng: Rng,
    player: PlayerInternal,
    enemies: Vec<EnemyInternal>,
    boss: Option<BossInternal>,
    projectiles: Vec<ProjectileInternal>,
    hitboxes: Vec<Hitbox>,
    portal: Option<Vec2>,
    last_boss_position: Option<Vec2>,
    timers: TimerRegistry<TimerAction>,
    events: Vec<RuntimeEvent>,

    world_width: i32,
    world_locked: bool,
    boss_spawned: bool,
    boss_defeated: bool,
    portal_spawned: bool,
    score: i32,
    elapsed_ms: u64,
    tick_counter: u64,
    outcome: Option<EncounterOutcome>,
    stats: EncounterStats,
    next_id_counter: u64,
}

impl Encounter {
    pub fn new(options: EncounterOptions) -> Self {
        let (tuning, _) = options.tuning.sanitized();
        let level = options.level.max(1);
        let (max_health, speed_multiplier) = get_character_profile(options.character);

        let player = PlayerInternal {
            view: PlayerView {
                id: PLAYER_ID.to_string(),
                x: PLAYER_SPAWN_X,
                y: (WALK_MIN_Y + WALK_MAX_Y) / 2.0,
                facing: Facing::Right,
                health: max_health,
                max_health,
                attack_state: AttackState::Idle,
                can_attack: true,
                invulnerable_until: None,
                can_take_damage: true,
                visual: VisualState::Idle,
            },
            speed: tuning.player_speed * speed_multiplier,
            moving: false,
            knockback: None,
        };

        let mut encounter = Self {
            level,
            boss_rules: BossRules::from_tuning(&tuning),
            frontier_rules: FrontierRules::from_tuning(&tuning),
            world_width: tuning.initial_world_width,
            tuning,
            rng: Rng::new(options.seed),
            player,
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            hitboxes: Vec::new(),
            portal: None,
            last_boss_position: None,
            timers: TimerRegistry::new(),
            events: Vec::new(),
            world_locked: false,
            boss_spawned: false,
            boss_defeated: false,
            portal_spawned: false,
            score: options.starting_score,
            elapsed_ms: 0,
            tick_counter: 0,
            outcome: None,
            stats: EncounterStats::default(),
            next_id_counter: 1,
        };
        encounter.spawn_initial_enemies(get_initial_enemy_count(level));
        encounter
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn world_width(&self) -> i32 {
        self.world_width
    }

    pub fn world_locked(&self) -> bool {
        self.world_locked
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn player_position(&self) -> Vec2 {
        Vec2::new(self.player.view.x, self.player.view.y)
    }

    pub fn player_health(&self) -> i32 {
        self.player.view.health
    }

    pub fn player_facing(&self) -> Facing {
        self.player.view.facing
    }

    pub fn enemy_positions(&self) -> Vec<Vec2> {
        self.enemies
            .iter()
            .map(|enemy| Vec2::new(enemy.view.x, enemy.view.y))
            .collect()
    }

    pub fn boss_position(&self) -> Option<Vec2> {
        self.boss
            .as_ref()
            .map(|boss| Vec2::new(boss.view.x, boss.view.y))
    }

    pub fn boss_state(&self) -> Option<BossState> {
        self.boss.as_ref().map(|boss| boss.brain.state)
    }

    pub fn portal_position(&self) -> Option<Vec2> {
        self.portal
    }

    /// Advances the encounter by one tick.
    ///
    /// Order is fixed: timers, movement, new attacks, combat, boss AI,
    /// director, world extension.
    pub fn step(&mut self, dt_ms: u64, intent: &InputIntent) {
        if self.is_ended() {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let dt_sec = dt_ms as f32 / 1000.0;

        self.fire_due_timers();

        self.update_player(dt_sec, intent);
        self.update_enemies(dt_sec);
        self.update_boss_movement(dt_sec);
        self.update_projectiles(dt_sec);

        if let Some(kind) = intent.attack() {
            self.begin_attack(kind);
        }

        self.resolve_hitboxes();
        self.resolve_contact_damage();

        self.update_boss_ai();
        self.run_director();
        self.update_frontier();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let player = {
            let mut view = self.player.view.clone();
            view.visual = self.player_visual();
            view
        };
        let enemies = self
            .enemies
            .iter()
            .map(|enemy| {
                let mut view = enemy.view.clone();
                view.visual = if enemy.knockback.is_some() || enemy.view.hit_recently {
                    VisualState::Hit
                } else if enemy.moving {
                    VisualState::Walk
                } else {
                    VisualState::Idle
                };
                view
            })
            .collect();
        let boss = self.boss.as_ref().map(|boss| {
            let mut view = boss.view.clone();
            view.state = boss.brain.state;
            view.patrol = boss.brain.patrol;
            view.engaged = boss.brain.engaged;
            view.last_attack_at = boss.brain.last_attack_at;
            view.visual = if boss.knockback.is_some() || boss.view.hit_recently {
                VisualState::Hit
            } else if boss.brain.is_attacking() {
                VisualState::Attack
            } else if boss.brain.state == BossState::Attack {
                VisualState::Idle
            } else {
                VisualState::Walk
            };
            view
        });

        let snapshot = Snapshot {
            tick: self.tick_counter,
            now_ms: self.elapsed_ms,
            level: self.level,
            world_width: self.world_width,
            world_locked: self.world_locked,
            player,
            enemies,
            boss,
            projectiles: self.projectiles.iter().map(|p| p.view.clone()).collect(),
            hitboxes: self
                .hitboxes
                .iter()
                .filter(|hitbox| hitbox.is_active(self.elapsed_ms))
                .map(|hitbox| HitboxView {
                    id: hitbox.id.clone(),
                    owner: hitbox.owner.clone(),
                    kind: hitbox.kind,
                    rect: hitbox.rect,
                })
                .collect(),
            portal: self.portal.map(|pos| PortalView { x: pos.x, y: pos.y }),
            hud: self.hud(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> EncounterSummary {
        EncounterSummary {
            level: self.level,
            outcome: self.outcome,
            duration_ms: self.elapsed_ms,
            score: self.score,
            enemies_defeated: self.stats.enemies_defeated,
            boss_defeated: self.boss_defeated,
            damage_taken: self.stats.damage_taken,
            extensions: self.stats.extensions,
        }
    }

    pub fn hud(&self) -> HudView {
        HudView {
            health: self.player.view.health,
            max_health: self.player.view.max_health,
            score: self.score,
            boss_health_pct: self.boss.as_ref().map(|boss| boss_health_pct(&boss.view)),
        }
    }

    fn player_visual(&self) -> VisualState {
        if self.player.view.health <= 0 {
            VisualState::Defeated
        } else if self.player.knockback.is_some() {
            VisualState::Hit
        } else if self.player.view.attack_state != AttackState::Idle {
            VisualState::Attack
        } else if self.player.moving {
            VisualState::Walk
        } else {
            VisualState::Idle
        }
    }

    fn update_player(&mut self, dt_sec: f32, intent: &InputIntent) {
        if let Some(knockback) = self.player.knockback {
            let pos = knockback.position_at(self.elapsed_ms);
            self.player.view.x = pos.x;
            self.player.view.y = pos.y;
            self.player.moving = false;
            return;
        }

        let (ax, ay) = intent.axes();
        self.player.moving = intent.is_moving();
        if !self.player.moving {
            return;
        }
        let norm = (ax * ax + ay * ay).sqrt();
        let travel = self.player.speed * dt_sec;
        let pos = clamp_to_walk_band(
            Vec2::new(
                self.player.view.x + ax / norm * travel,
                self.player.view.y + ay / norm * travel,
            ),
            self.world_width,
        );
        self.player.view.x = pos.x;
        self.player.view.y = pos.y;
        if ax != 0.0 && self.player.view.attack_state == AttackState::Idle {
            self.player.view.facing = if ax < 0.0 { Facing::Left } else { Facing::Right };
        }
    }

    fn update_enemies(&mut self, dt_sec: f32) {
        let target = self.player_position();
        let hold = ENEMY_HOLD_DISTANCE;
        for idx in 0..self.enemies.len() {
            if let Some(knockback) = self.enemies[idx].knockback {
                let pos = knockback.position_at(self.elapsed_ms);
                self.enemies[idx].view.x = pos.x;
                self.enemies[idx].view.y = pos.y;
                self.enemies[idx].moving = false;
                continue;
            }
            let current = Vec2::new(self.enemies[idx].view.x, self.enemies[idx].view.y);
            let next = move_toward(current, target, self.enemies[idx].speed * dt_sec, hold);
            let next = clamp_to_walk_band(next, self.world_width);
            self.enemies[idx].moving = next != current;
            self.enemies[idx].view.x = next.x;
            self.enemies[idx].view.y = next.y;
            self.enemies[idx].view.facing = Facing::toward(next.x, target.x);
        }
    }

    fn update_projectiles(&mut self, dt_sec: f32) {
        let world_width = self.world_width as f32;
        let mut out_of_bounds = Vec::new();
        for projectile in &mut self.projectiles {
            projectile.view.x += projectile.view.vx * dt_sec;
            projectile.view.y += projectile.view.vy * dt_sec;
            if projectile.view.x < 0.0 || projectile.view.x > world_width {
                out_of_bounds.push(projectile.view.id.clone());
            }
        }
        for id in out_of_bounds {
            self.destroy_projectile(&id);
        }
    }

    fn destroy_projectile(&mut self, projectile_id: &str) {
        self.timers.cancel_owner(projectile_id);
        self.projectiles
            .retain(|projectile| projectile.view.id != projectile_id);
    }

    fn add_score(&mut self, delta: i32) {
        if delta == 0 {
            return;
        }
        self.score = self.score.saturating_add(delta);
        self.events.push(RuntimeEvent::ScoreChanged { score: self.score });
    }

    #[cfg(test)]
    pub(crate) fn force_end(&mut self, outcome: EncounterOutcome) {
        self.end(outcome);
    }

    fn end(&mut self, outcome: EncounterOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.events.push(RuntimeEvent::EncounterEnded { outcome });
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

fn boss_health_pct(view: &BossView) -> f32 {
    if view.max_health <= 0 {
        return 0.0;
    }
    (view.health.max(0) as f32 / view.max_health as f32) * 100.0
}

#[cfg(test)]
mod tests {
    use crate::config::{EncounterOptions, Tuning};
    use crate::constants::{MAX_LEVEL, TICK_MS};
    use crate::engine::{Encounter, PLAYER_ID};
    use crate::input::InputIntent;
    use crate::types::{
        AttackKind, AttackState, BossState, Character, EncounterOutcome, RuntimeEvent, Vec2,
    };

    fn make_encounter(seed: u64) -> Encounter {
        Encounter::new(EncounterOptions {
            seed,
            ..EncounterOptions::default()
        })
    }

    fn idle() -> InputIntent {
        InputIntent::default()
    }

    fn walk_right() -> InputIntent {
        InputIntent {
            right: true,
            ..InputIntent::default()
        }
    }

    #[test]
    fn same_seed_and_input_produce_same_progression() {
        let mut a = make_encounter(424_242);
        let mut b = make_encounter(424_242);

        for tick in 0..600u64 {
            let intent = InputIntent {
                right: tick % 90 < 60,
                punch: tick % 20 == 0,
                kick: tick % 35 == 0,
                ..InputIntent::default()
            };
            a.step(TICK_MS, &intent);
            b.step(TICK_MS, &intent);
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);

            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.health, sb.player.health);
            assert_eq!(sa.hud.score, sb.hud.score);
            assert_eq!(sa.enemies.len(), sb.enemies.len());
            for (ea, eb) in sa.enemies.iter().zip(sb.enemies.iter()) {
                assert_eq!(ea.id, eb.id);
                assert_eq!(ea.x.to_bits(), eb.x.to_bits());
                assert_eq!(ea.health, eb.health);
            }
            assert_eq!(sa.events, sb.events);
            if a.is_ended() || b.is_ended() {
                assert_eq!(a.outcome(), b.outcome());
                break;
            }
        }
    }

    #[test]
    fn initial_wave_scales_with_level_and_character_sets_health() {
        let level_one = make_encounter(1);
        assert_eq!(level_one.live_enemy_count(), 4);

        let tank_level_three = Encounter::new(EncounterOptions {
            level: 3,
            character: Character::Tank,
            ..EncounterOptions::default()
        });
        assert_eq!(tank_level_three.live_enemy_count(), 6);
        assert_eq!(tank_level_three.player.view.max_health, 140);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = make_encounter(333);
        let first = engine.build_snapshot(true);
        assert!(first
            .events
            .contains(&RuntimeEvent::EnemiesSpawned { count: 4 }));

        engine.events.push(RuntimeEvent::WorldLocked);
        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let second = engine.build_snapshot(true);
        let third = engine.build_snapshot(true);
        assert_eq!(second.events, vec![RuntimeEvent::WorldLocked]);
        assert!(third.events.is_empty());
    }

    #[test]
    fn player_stays_inside_world_and_walk_band() {
        let mut engine = make_encounter(5);
        engine.enemies.clear();
        engine.boss_spawned = true;
        let up_left = InputIntent {
            up: true,
            left: true,
            ..InputIntent::default()
        };
        for _ in 0..300 {
            engine.step(TICK_MS, &up_left);
        }
        let pos = engine.player_position();
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, crate::constants::WALK_MIN_Y);
    }

    #[test]
    fn facing_follows_horizontal_input_only_while_idle() {
        let mut engine = make_encounter(6);
        engine.enemies.clear();
        engine.boss_spawned = true;
        let left = InputIntent {
            left: true,
            ..InputIntent::default()
        };
        engine.step(TICK_MS, &left);
        assert_eq!(engine.player.view.facing, crate::types::Facing::Left);

        engine.step(
            TICK_MS,
            &InputIntent {
                punch: true,
                ..InputIntent::default()
            },
        );
        engine.step(TICK_MS, &walk_right());
        assert_eq!(engine.player.view.facing, crate::types::Facing::Left);
    }

    #[test]
    fn loss_ends_encounter_and_freezes_it() {
        let mut engine = make_encounter(7);
        engine.player.view.health = 5;
        let enemy_pos = engine.player_position();
        engine.enemies[0].view.x = enemy_pos.x + 10.0;
        engine.enemies[0].view.y = enemy_pos.y;

        engine.step(TICK_MS, &idle());
        assert_eq!(engine.player_health(), 0);
        assert_eq!(engine.outcome(), Some(EncounterOutcome::Loss));

        let frozen_at = engine.now_ms();
        engine.step(TICK_MS, &walk_right());
        assert_eq!(engine.now_ms(), frozen_at);
    }

    #[test]
    fn portal_contact_advances_level_or_wins_on_last_level() {
        let mut engine = make_encounter(8);
        engine.enemies.clear();
        engine.boss_spawned = true;
        engine.boss_defeated = true;
        engine.last_boss_position = Some(Vec2::new(1_000.0, 450.0));
        engine.step(TICK_MS, &idle());
        let portal = engine.portal_position().expect("portal spawned");
        assert_eq!(engine.outcome(), None);

        engine.player.view.x = portal.x;
        engine.player.view.y = portal.y;
        engine.step(TICK_MS, &idle());
        assert_eq!(
            engine.outcome(),
            Some(EncounterOutcome::AdvanceLevel { next_level: 2 })
        );

        let mut last = Encounter::new(EncounterOptions {
            level: MAX_LEVEL,
            ..EncounterOptions::default()
        });
        last.enemies.clear();
        last.boss_spawned = true;
        last.boss_defeated = true;
        last.last_boss_position = Some(Vec2::new(1_000.0, 450.0));
        last.step(TICK_MS, &idle());
        let portal = last.portal_position().expect("portal spawned");
        last.player.view.x = portal.x;
        last.player.view.y = portal.y;
        last.step(TICK_MS, &idle());
        assert_eq!(last.outcome(), Some(EncounterOutcome::Win));
    }

    #[test]
    fn attack_window_resets_to_idle_after_duration() {
        let mut engine = make_encounter(9);
        engine.enemies.clear();
        engine.boss_spawned = true;
        let tuning = Tuning::default();

        engine.step(
            TICK_MS,
            &InputIntent {
                kick: true,
                ..InputIntent::default()
            },
        );
        assert_eq!(engine.player.view.attack_state, AttackState::Active);
        assert!(!engine.player.view.can_attack);
        assert_eq!(engine.hitboxes.len(), 1);
        assert_eq!(engine.hitboxes[0].kind, AttackKind::Kick);
        assert_eq!(engine.timers.pending_for(PLAYER_ID), 2);

        let total = tuning.attack_active_ms + tuning.attack_recovery_ms;
        let mut elapsed = 0;
        while elapsed < total {
            engine.step(TICK_MS, &idle());
            elapsed += TICK_MS;
        }
        assert_eq!(engine.player.view.attack_state, AttackState::Idle);
        assert!(engine.player.view.can_attack);
        assert!(engine.hitboxes.is_empty());
    }

    #[test]
    fn projectile_leaving_the_world_is_destroyed() {
        let mut engine = make_encounter(11);
        engine.enemies.clear();
        engine.boss_spawned = true;
        let edge = Vec2::new(engine.world_width() as f32 - 5.0, 450.0);
        engine.release_projectile(edge, Vec2::new(edge.x + 100.0, edge.y));
        let id = engine.projectiles[0].view.id.clone();
        assert!(engine.projectiles[0].view.vx > 0.0);

        for _ in 0..5 {
            engine.step(TICK_MS, &idle());
        }
        assert!(engine.projectiles.is_empty());
        assert_eq!(engine.timers.pending_for(&id), 0);
        assert_eq!(engine.player_health(), engine.player.view.max_health);
    }

    #[test]
    fn boss_state_is_reported_while_present() {
        let mut engine = make_encounter(10);
        assert_eq!(engine.boss_state(), None);
        engine.enemies.clear();
        engine.step(TICK_MS, &idle());
        assert_eq!(engine.boss_state(), Some(BossState::Patrol));
        let snapshot = engine.build_snapshot(false);
        let boss = snapshot.boss.expect("boss view");
        assert_eq!(snapshot.hud.boss_health_pct, Some(100.0));
        assert_eq!(boss.state, BossState::Patrol);
    }
}
