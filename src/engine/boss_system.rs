use super::*;

use crate::boss_ai::AttackCommand;

impl Encounter {
    pub(super) fn update_boss_movement(&mut self, dt_sec: f32) {
        let now = self.elapsed_ms;
        let player = self.player_position();
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let current = Vec2::new(boss.view.x, boss.view.y);
        let next = match boss.knockback {
            Some(knockback) => knockback.position_at(now),
            None => boss
                .brain
                .movement(current, player, &self.boss_rules, dt_sec),
        };
        let next = clamp_to_walk_band(next, self.world_width);
        boss.view.x = next.x;
        boss.view.y = next.y;
        boss.view.facing = match boss.brain.state {
            BossState::Patrol => Facing::toward(next.x, boss.brain.patrol.target),
            _ => Facing::toward(next.x, player.x),
        };
    }

    /// Runs one transition evaluation and the attack cooldown for the boss.
    pub(super) fn update_boss_ai(&mut self) {
        let now = self.elapsed_ms;
        let player = self.player_position();
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let position = Vec2::new(boss.view.x, boss.view.y);
        let transition =
            boss.brain
                .evaluate(boss.view.health, position.distance(player), &self.boss_rules);
        let command = boss.brain.update_attack(now, &self.boss_rules);

        if let Some((from, to)) = transition {
            self.events.push(RuntimeEvent::BossStateChanged { from, to });
            if to == BossState::Defeated {
                self.finish_boss();
                return;
            }
        }
        match command {
            Some(AttackCommand::Start) => self.events.push(RuntimeEvent::BossAttackStarted),
            Some(AttackCommand::Release) => self.release_projectile(position, player),
            None => {}
        }
    }

    /// Fires a projectile toward the side of the boss the player is on now.
    pub(super) fn release_projectile(&mut self, from: Vec2, player: Vec2) {
        let side = Facing::toward(from.x, player.x);
        if let Some(boss) = self.boss.as_mut() {
            boss.view.facing = side;
        }
        let id = self.make_id("projectile");
        let expires_at = self
            .elapsed_ms
            .saturating_add(self.tuning.projectile_ttl_ms);
        self.projectiles.push(ProjectileInternal {
            view: ProjectileView {
                id: id.clone(),
                x: from.x,
                y: from.y,
                vx: side.sign() * self.tuning.projectile_speed,
                vy: 0.0,
                expires_at,
            },
        });
        self.timers
            .schedule(&id, expires_at, TimerAction::ProjectileExpire);
        self.events.push(RuntimeEvent::ProjectileSpawned { projectile_id: id });
    }

    /// Releases a defeated boss. In-flight projectiles keep flying.
    fn finish_boss(&mut self) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        self.timers.cancel_owner(&boss.view.id);
        self.last_boss_position = Some(Vec2::new(boss.view.x, boss.view.y));
        self.boss_defeated = true;
        self.events.push(RuntimeEvent::BossDefeated {
            boss_id: boss.view.id,
        });
    }
}
