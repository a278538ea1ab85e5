use super::*;

use super::utils::{attack_rect, hurtbox_rect, walk_band_max, walk_band_min};
use crate::constants::{BOSS_HURTBOX, ENEMY_HURTBOX, PROJECTILE_HIT_RANGE};

impl Encounter {
    /// Starts a punch or kick. Ignored unless the player is idle and allowed
    /// to attack; nothing is queued.
    pub fn begin_attack(&mut self, kind: AttackKind) -> bool {
        if self.is_ended() || self.player.view.health <= 0 {
            return false;
        }
        if self.player.view.attack_state != AttackState::Idle || !self.player.view.can_attack {
            return false;
        }

        let now = self.elapsed_ms;
        let profile = self.tuning.attack_profile(kind);
        let active_from = now.saturating_add(profile.windup_ms);
        let active_until = active_from.saturating_add(profile.active_ms);
        let id = self.make_id("hitbox");
        self.hitboxes.push(Hitbox {
            id: id.clone(),
            owner: PLAYER_ID.to_string(),
            kind,
            rect: attack_rect(
                self.player_position(),
                self.player.view.facing,
                profile.reach,
                profile.height,
            ),
            profile,
            active_from,
            active_until,
            already_hit: HashSet::new(),
        });

        if profile.windup_ms > 0 {
            self.player.view.attack_state = AttackState::Windup;
            self.timers
                .schedule(PLAYER_ID, active_from, TimerAction::AttackActive);
        } else {
            self.player.view.attack_state = AttackState::Active;
        }
        self.player.view.can_attack = false;
        self.timers.schedule(
            PLAYER_ID,
            active_until,
            TimerAction::AttackRecover { hitbox_id: id },
        );
        self.timers.schedule(
            PLAYER_ID,
            active_until.saturating_add(profile.recovery_ms),
            TimerAction::AttackReady,
        );
        self.events.push(RuntimeEvent::AttackStarted { kind });
        true
    }

    /// Tests every live hitbox against enemies, then the boss.
    pub(super) fn resolve_hitboxes(&mut self) {
        let now = self.elapsed_ms;
        let origin = self.player_position();
        let facing = self.player.view.facing;

        for h_idx in 0..self.hitboxes.len() {
            if !self.hitboxes[h_idx].is_active(now) {
                continue;
            }
            // The hitbox follows its owner while active.
            let profile = self.hitboxes[h_idx].profile;
            let rect = attack_rect(origin, facing, profile.reach, profile.height);
            self.hitboxes[h_idx].rect = rect;

            let mut e_idx = 0;
            while e_idx < self.enemies.len() {
                let enemy = &self.enemies[e_idx];
                let hurtbox = hurtbox_rect(Vec2::new(enemy.view.x, enemy.view.y), ENEMY_HURTBOX);
                let fresh = enemy.view.alive
                    && enemy.view.health > 0
                    && !self.hitboxes[h_idx].already_hit.contains(&enemy.view.id);
                if fresh && rect.overlaps(&hurtbox) && self.hit_enemy(h_idx, e_idx) {
                    continue;
                }
                e_idx += 1;
            }

            let boss_hittable = self.boss.as_ref().is_some_and(|boss| {
                let hurtbox = hurtbox_rect(Vec2::new(boss.view.x, boss.view.y), BOSS_HURTBOX);
                boss.view.health > 0
                    && boss.brain.state != BossState::Defeated
                    && !self.hitboxes[h_idx].already_hit.contains(&boss.view.id)
                    && rect.overlaps(&hurtbox)
            });
            if boss_hittable {
                self.hit_boss(h_idx);
            }
        }
    }

    /// Applies one hit to an enemy. Returns true when the enemy was destroyed.
    fn hit_enemy(&mut self, h_idx: usize, e_idx: usize) -> bool {
        let now = self.elapsed_ms;
        let profile = self.hitboxes[h_idx].profile;
        let source = self.player_position();
        let enemy_id = self.enemies[e_idx].view.id.clone();
        self.hitboxes[h_idx].already_hit.insert(enemy_id.clone());

        let enemy = &mut self.enemies[e_idx];
        enemy.view.health = (enemy.view.health - profile.damage).max(0);
        enemy.view.hit_recently = true;
        let knockback = Knockback::compute(
            source,
            Vec2::new(enemy.view.x, enemy.view.y),
            self.tuning.target_knockback_distance,
            now,
            self.tuning.knockback_duration_ms,
        )
        .clamped(walk_band_min(), walk_band_max(self.world_width));
        enemy.knockback = Some(knockback);
        let health = enemy.view.health;

        self.reschedule(
            &enemy_id,
            now.saturating_add(self.tuning.hit_flash_ms),
            TimerAction::HitFlashEnd,
        );
        self.reschedule(&enemy_id, knockback.ends_at(), TimerAction::KnockbackEnd);
        self.events.push(RuntimeEvent::EnemyHit {
            enemy_id,
            damage: profile.damage,
            health,
        });
        self.add_score(profile.score);

        if health <= 0 {
            self.destroy_enemy(e_idx);
            return true;
        }
        false
    }

    fn hit_boss(&mut self, h_idx: usize) {
        let now = self.elapsed_ms;
        let profile = self.hitboxes[h_idx].profile;
        let source = self.player_position();
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let boss_id = boss.view.id.clone();
        self.hitboxes[h_idx].already_hit.insert(boss_id.clone());

        boss.view.health = (boss.view.health - profile.damage).max(0);
        boss.view.hit_recently = true;
        let knockback = Knockback::compute(
            source,
            Vec2::new(boss.view.x, boss.view.y),
            self.tuning.boss_knockback_distance,
            now,
            self.tuning.knockback_duration_ms,
        )
        .clamped(walk_band_min(), walk_band_max(self.world_width));
        boss.knockback = Some(knockback);
        let health = boss.view.health;
        let pct = boss_health_pct(&boss.view);

        self.reschedule(
            &boss_id,
            now.saturating_add(self.tuning.hit_flash_ms),
            TimerAction::HitFlashEnd,
        );
        self.reschedule(&boss_id, knockback.ends_at(), TimerAction::KnockbackEnd);
        self.events.push(RuntimeEvent::BossHit {
            damage: profile.damage,
            health,
        });
        self.events.push(RuntimeEvent::BossHealthChanged { pct });
        self.add_score(profile.score);
        if health <= 0 {
            self.add_score(self.tuning.boss_kill_bonus);
        }
    }

    pub(super) fn destroy_enemy(&mut self, e_idx: usize) {
        if e_idx >= self.enemies.len() {
            return;
        }
        let enemy = self.enemies.remove(e_idx);
        self.timers.cancel_owner(&enemy.view.id);
        self.stats.enemies_defeated += 1;
        self.events.push(RuntimeEvent::EnemyDefeated {
            enemy_id: enemy.view.id,
        });
        self.add_score(self.tuning.enemy_kill_bonus);
    }

    /// Contact damage from enemies, the boss and projectiles, in that order.
    pub(super) fn resolve_contact_damage(&mut self) {
        if self.player.view.health <= 0 {
            return;
        }
        let player = self.player_position();

        for idx in 0..self.enemies.len() {
            let enemy = &self.enemies[idx];
            let pos = Vec2::new(enemy.view.x, enemy.view.y);
            if pos.distance(player) <= self.tuning.enemy_contact_range {
                let source_id = enemy.view.id.clone();
                self.apply_contact_damage(&source_id, pos, self.tuning.enemy_contact_damage);
            }
        }

        let boss_contact = self.boss.as_ref().and_then(|boss| {
            let pos = Vec2::new(boss.view.x, boss.view.y);
            let live = boss.view.health > 0 && boss.brain.state != BossState::Defeated;
            (live && pos.distance(player) <= self.tuning.boss_contact_range)
                .then(|| (boss.view.id.clone(), pos))
        });
        if let Some((source_id, pos)) = boss_contact {
            self.apply_contact_damage(&source_id, pos, self.tuning.boss_contact_damage);
        }

        let struck: Vec<(String, Vec2)> = self
            .projectiles
            .iter()
            .map(|projectile| {
                (
                    projectile.view.id.clone(),
                    Vec2::new(projectile.view.x, projectile.view.y),
                )
            })
            .filter(|(_, pos)| pos.distance(player) <= PROJECTILE_HIT_RANGE)
            .collect();
        for (projectile_id, pos) in struck {
            self.apply_contact_damage(&projectile_id, pos, self.tuning.projectile_damage);
            self.destroy_projectile(&projectile_id);
        }
    }

    /// Damages the player unless the invulnerability window is open.
    /// Returns true when damage was applied.
    pub fn apply_contact_damage(&mut self, source_id: &str, source: Vec2, damage: i32) -> bool {
        if self.is_ended() || !self.player.view.can_take_damage || self.player.view.health <= 0 {
            return false;
        }
        let now = self.elapsed_ms;
        let before = self.player.view.health;
        self.player.view.health = (before - damage.max(0)).max(0);
        self.stats.damage_taken += before - self.player.view.health;

        let until = now.saturating_add(self.tuning.invulnerability_ms);
        self.player.view.can_take_damage = false;
        self.player.view.invulnerable_until = Some(until);
        self.reschedule(PLAYER_ID, until, TimerAction::DamageWindowEnd);

        let knockback = Knockback::compute(
            source,
            self.player_position(),
            self.tuning.player_knockback_distance,
            now,
            self.tuning.knockback_duration_ms,
        )
        .clamped(walk_band_min(), walk_band_max(self.world_width));
        self.player.knockback = Some(knockback);
        self.reschedule(PLAYER_ID, knockback.ends_at(), TimerAction::KnockbackEnd);

        self.events.push(RuntimeEvent::PlayerDamaged {
            damage: before - self.player.view.health,
            health: self.player.view.health,
            source_id: source_id.to_string(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EncounterOptions, Tuning};
    use crate::constants::TICK_MS;
    use crate::engine::Encounter;
    use crate::input::InputIntent;
    use crate::types::{AttackKind, AttackState, BossState, RuntimeEvent, Vec2};

    /// Encounter with one enemy parked in front of the player and the boss
    /// held back.
    fn duel(enemy_health: i32) -> Encounter {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.truncate(1);
        let player = engine.player_position();
        engine.enemies[0].view.x = player.x + 50.0;
        engine.enemies[0].view.y = player.y;
        engine.enemies[0].view.health = enemy_health;
        engine.enemies[0].speed = 0.0;
        engine
    }

    fn kick() -> InputIntent {
        InputIntent {
            kick: true,
            ..InputIntent::default()
        }
    }

    fn step_until_idle(engine: &mut Encounter) {
        for _ in 0..60 {
            if engine.player.view.attack_state == AttackState::Idle {
                return;
            }
            engine.step(TICK_MS, &InputIntent::default());
        }
    }

    #[test]
    fn one_activation_damages_a_target_at_most_once() {
        let mut engine = duel(1_000);
        engine.step(TICK_MS, &kick());
        for _ in 0..10 {
            engine.step(TICK_MS, &InputIntent::default());
        }
        assert_eq!(engine.enemies[0].view.health, 975);

        step_until_idle(&mut engine);
        let player = engine.player_position();
        engine.enemies[0].view.x = player.x + 50.0;
        engine.enemies[0].view.y = player.y;
        engine.enemies[0].knockback = None;
        engine.step(TICK_MS, &kick());
        assert_eq!(engine.enemies[0].view.health, 950);
    }

    #[test]
    fn windup_delays_the_hit_until_the_active_window() {
        let tuning = Tuning {
            kick_windup_ms: 100,
            ..Tuning::default()
        };
        let mut engine = Encounter::new(EncounterOptions {
            tuning: tuning.clone(),
            ..EncounterOptions::default()
        });
        engine.enemies.truncate(1);
        let player = engine.player_position();
        engine.enemies[0].view.x = player.x + 50.0;
        engine.enemies[0].view.y = player.y;
        engine.enemies[0].view.health = 1_000;
        engine.enemies[0].speed = 0.0;
        engine.player.view.can_take_damage = false;
        engine.player.view.invulnerable_until = Some(u64::MAX);

        engine.step(TICK_MS, &kick());
        let started_at = engine.now_ms();
        let mut states = vec![engine.player.view.attack_state];
        let mut first_hit_at = None;
        for _ in 0..60 {
            engine.step(TICK_MS, &InputIntent::default());
            let state = engine.player.view.attack_state;
            if states.last() != Some(&state) {
                states.push(state);
            }
            if first_hit_at.is_none() && engine.enemies[0].view.health < 1_000 {
                first_hit_at = Some(engine.now_ms());
            }
            if state == AttackState::Idle {
                break;
            }
        }

        assert_eq!(
            states,
            vec![
                AttackState::Windup,
                AttackState::Active,
                AttackState::Recovery,
                AttackState::Idle
            ]
        );
        let first_hit_at = first_hit_at.expect("kick landed");
        assert!(first_hit_at >= started_at + tuning.kick_windup_ms);
        assert_eq!(engine.enemies[0].view.health, 1_000 - tuning.kick_damage);
        assert!(engine.player.view.can_attack);
    }

    #[test]
    fn boss_contact_damages_the_player_during_a_step() {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.clear();
        engine.step(TICK_MS, &InputIntent::default());
        let boss_id = engine.boss.as_ref().expect("boss spawned").view.id.clone();
        let boss = engine.boss_position().expect("boss spawned");
        engine.player.view.x = boss.x - 40.0;
        engine.player.view.y = boss.y;
        engine.build_snapshot(true);

        engine.step(TICK_MS, &InputIntent::default());
        let tuning = Tuning::default();
        assert_eq!(
            engine.player_health(),
            engine.player.view.max_health - tuning.boss_contact_damage
        );
        assert!(!engine.player.view.can_take_damage);
        let events = engine.build_snapshot(true).events;
        assert!(events.iter().any(|event| matches!(
            event,
            RuntimeEvent::PlayerDamaged { source_id, .. } if *source_id == boss_id
        )));
    }

    #[test]
    fn attack_while_busy_is_ignored() {
        let mut engine = duel(1_000);
        assert!(engine.begin_attack(AttackKind::Punch));
        assert!(!engine.begin_attack(AttackKind::Kick));
        assert_eq!(engine.hitboxes.len(), 1);
        assert_eq!(engine.hitboxes[0].kind, AttackKind::Punch);
    }

    #[test]
    fn single_kick_kills_enemy_at_or_below_kick_damage() {
        let mut engine = duel(25);
        let enemy_id = engine.enemies[0].view.id.clone();
        engine.build_snapshot(true);
        engine.step(TICK_MS, &kick());

        assert!(engine.enemies.iter().all(|enemy| enemy.view.id != enemy_id));
        assert_eq!(engine.timers.pending_for(&enemy_id), 0);
        let tuning = Tuning::default();
        assert_eq!(engine.score(), tuning.kick_score + tuning.enemy_kill_bonus);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::EnemyDefeated { enemy_id }));
    }

    #[test]
    fn contact_damage_respects_invulnerability_window() {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.clear();
        engine.boss_spawned = true;
        let source = Vec2::new(engine.player_position().x + 30.0, engine.player_position().y);

        assert!(engine.apply_contact_damage("boss_1", source, 10));
        assert_eq!(engine.player_health(), 90);
        assert!(!engine.player.view.can_take_damage);
        assert!(!engine.apply_contact_damage("boss_1", source, 10));
        assert_eq!(engine.player_health(), 90);

        let window = Tuning::default().invulnerability_ms;
        let mut elapsed = 0;
        while elapsed < window {
            engine.step(TICK_MS, &InputIntent::default());
            elapsed += TICK_MS;
            if elapsed < window {
                assert!(!engine.player.view.can_take_damage);
            }
        }
        assert!(engine.player.view.can_take_damage);
        assert!(engine.apply_contact_damage("boss_1", source, 10));
        assert_eq!(engine.player_health(), 80);
    }

    #[test]
    fn contact_pushes_player_away_from_source() {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.clear();
        engine.boss_spawned = true;
        let start = engine.player_position();
        engine.apply_contact_damage("enemy_1", Vec2::new(start.x + 20.0, start.y), 5);
        for _ in 0..30 {
            engine.step(TICK_MS, &InputIntent::default());
        }
        assert!(engine.player.knockback.is_none());
        assert!(engine.player_position().x < start.x);
    }

    #[test]
    fn four_kicks_defeat_the_boss_exactly_once() {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.clear();
        engine.step(TICK_MS, &InputIntent::default());
        assert!(engine.boss.is_some());
        engine.player.view.can_take_damage = false;
        engine.player.view.invulnerable_until = Some(u64::MAX);
        engine.build_snapshot(true);
        let score_before = engine.score();

        let mut events = Vec::new();
        for _ in 0..4 {
            let Some(boss) = engine.boss_position() else {
                break;
            };
            engine.player.knockback = None;
            engine.player.view.x = boss.x - 60.0;
            engine.player.view.y = boss.y;
            engine.step(TICK_MS, &kick());
            step_until_idle(&mut engine);
            events.extend(engine.build_snapshot(true).events);
        }

        let defeated = events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::BossDefeated { .. }))
            .count();
        let to_defeated = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    RuntimeEvent::BossStateChanged {
                        to: BossState::Defeated,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(defeated, 1);
        assert_eq!(to_defeated, 1);
        assert!(engine.boss.is_none());
        assert!(engine.boss_defeated);
        assert!(engine.portal_position().is_some());

        let tuning = Tuning::default();
        assert_eq!(
            engine.score() - score_before,
            4 * tuning.kick_score + tuning.boss_kill_bonus
        );
    }

    #[test]
    fn projectile_hits_are_consumed_even_while_invulnerable() {
        let mut engine = Encounter::new(EncounterOptions::default());
        engine.enemies.clear();
        engine.boss_spawned = true;
        engine.player.view.can_take_damage = false;
        engine.player.view.invulnerable_until = Some(u64::MAX);
        let player = engine.player_position();
        engine.release_projectile(Vec2::new(player.x + 10.0, player.y), player);
        assert_eq!(engine.projectiles.len(), 1);

        engine.step(TICK_MS, &InputIntent::default());
        assert!(engine.projectiles.is_empty());
        assert_eq!(engine.player_health(), engine.player.view.max_health);
    }
}
