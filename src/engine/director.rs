use super::*;

use crate::constants::{MAX_LEVEL, PORTAL_RANGE};

impl Encounter {
    /// Evaluates the end-of-encounter predicates and the boss/portal gates.
    /// Safe to run any number of times per tick.
    pub(super) fn run_director(&mut self) {
        if self.is_ended() {
            return;
        }
        if self.player.view.health <= 0 {
            self.end(EncounterOutcome::Loss);
            return;
        }

        if self.enemies.is_empty() && !self.boss_spawned && !self.boss_defeated {
            self.spawn_boss();
        }
        if self.enemies.is_empty() && self.boss_defeated && !self.portal_spawned {
            let at = self
                .last_boss_position
                .unwrap_or_else(|| self.player_position());
            self.spawn_portal(at);
        }

        let Some(portal) = self.portal else {
            return;
        };
        if self.player_position().distance(portal) <= PORTAL_RANGE {
            let outcome = if self.level < MAX_LEVEL {
                EncounterOutcome::AdvanceLevel {
                    next_level: self.level + 1,
                }
            } else {
                EncounterOutcome::Win
            };
            self.end(outcome);
        }
    }

    pub(super) fn update_frontier(&mut self) {
        if self.is_ended() {
            return;
        }
        let Some(width) = self.frontier_rules.maybe_extend(
            self.player.view.x,
            self.world_width,
            self.tuning.max_world_width,
            self.world_locked,
        ) else {
            return;
        };
        self.world_width = width;
        self.stats.extensions += 1;
        self.events.push(RuntimeEvent::WorldExtended { width });
        self.spawn_reinforcements(self.tuning.reinforcement_batch);
    }
}
