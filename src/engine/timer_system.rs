use super::*;

impl Encounter {
    /// Fires every timer due at the current clock, in schedule order.
    /// Actions whose owner no longer exists are dropped silently.
    pub(super) fn fire_due_timers(&mut self) {
        let due = self.timers.poll_due(self.elapsed_ms);
        for timer in due {
            match timer.action {
                TimerAction::AttackActive => self.on_attack_active(),
                TimerAction::AttackRecover { hitbox_id } => self.on_attack_recover(&hitbox_id),
                TimerAction::AttackReady => self.on_attack_ready(),
                TimerAction::DamageWindowEnd => self.on_damage_window_end(),
                TimerAction::KnockbackEnd => self.on_knockback_end(&timer.owner),
                TimerAction::HitFlashEnd => self.on_hit_flash_end(&timer.owner),
                TimerAction::ProjectileExpire => self.destroy_projectile(&timer.owner),
            }
        }
    }

    fn on_attack_active(&mut self) {
        if self.player.view.attack_state == AttackState::Windup {
            self.player.view.attack_state = AttackState::Active;
        }
    }

    fn on_attack_recover(&mut self, hitbox_id: &str) {
        self.hitboxes.retain(|hitbox| hitbox.id != hitbox_id);
        if self.player.view.attack_state == AttackState::Active {
            self.player.view.attack_state = AttackState::Recovery;
        }
    }

    fn on_attack_ready(&mut self) {
        self.player.view.attack_state = AttackState::Idle;
        self.player.view.can_attack = true;
    }

    fn on_damage_window_end(&mut self) {
        let expired = self
            .player
            .view
            .invulnerable_until
            .map(|until| self.elapsed_ms >= until)
            .unwrap_or(true);
        if expired {
            self.player.view.invulnerable_until = None;
            self.player.view.can_take_damage = true;
        }
    }

    /// Settles a finished knockback at its end point. A knockback that is
    /// still running stays in place.
    fn on_knockback_end(&mut self, owner: &str) {
        let now = self.elapsed_ms;
        let finished = |slot: &mut Option<Knockback>| match *slot {
            Some(knockback) if knockback.is_finished(now) => slot.take(),
            _ => None,
        };
        if owner == PLAYER_ID {
            if let Some(knockback) = finished(&mut self.player.knockback) {
                let end = knockback.position_at(now);
                self.player.view.x = end.x;
                self.player.view.y = end.y;
            }
            return;
        }
        if let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.view.id == owner) {
            if let Some(knockback) = finished(&mut enemy.knockback) {
                let end = knockback.position_at(now);
                enemy.view.x = end.x;
                enemy.view.y = end.y;
            }
            return;
        }
        if let Some(boss) = self.boss.as_mut().filter(|boss| boss.view.id == owner) {
            if let Some(knockback) = finished(&mut boss.knockback) {
                let end = knockback.position_at(now);
                boss.view.x = end.x;
                boss.view.y = end.y;
            }
        }
    }

    fn on_hit_flash_end(&mut self, owner: &str) {
        if let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.view.id == owner) {
            enemy.view.hit_recently = false;
            return;
        }
        if let Some(boss) = self.boss.as_mut().filter(|boss| boss.view.id == owner) {
            boss.view.hit_recently = false;
        }
    }

    /// Replaces any pending timer of the same kind for `owner`.
    pub(super) fn reschedule(&mut self, owner: &str, fire_at: u64, action: TimerAction) {
        let kind = std::mem::discriminant(&action);
        self.timers
            .cancel_where(owner, |pending| std::mem::discriminant(pending) == kind);
        self.timers.schedule(owner, fire_at, action);
    }
}
