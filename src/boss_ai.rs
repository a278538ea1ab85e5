//! Boss behavior: patrol / approach / attack driven by a distance hysteresis
//! band and an attack cooldown.
//!
//! `BossBrain` is pure state: the encounter feeds it positions, health and the
//! game clock, and applies whatever movement and attack commands it returns.

use crate::config::Tuning;
use crate::types::{BossState, PatrolBounds, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossRules {
    pub enter_threshold: f32,
    pub exit_threshold: f32,
    pub close_threshold: f32,
    pub patrol_step: f32,
    pub approach_speed: f32,
    pub vertical_track_speed: f32,
    pub attack_cooldown_ms: u64,
    pub attack_windup_ms: u64,
}

impl BossRules {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            enter_threshold: tuning.boss_enter_threshold,
            exit_threshold: tuning.boss_exit_threshold,
            close_threshold: tuning.boss_close_threshold,
            patrol_step: tuning.boss_patrol_step,
            approach_speed: tuning.boss_approach_speed,
            vertical_track_speed: tuning.boss_vertical_track_speed,
            attack_cooldown_ms: tuning.boss_attack_cooldown_ms,
            attack_windup_ms: tuning.boss_attack_windup_ms,
        }
    }
}

impl Default for BossRules {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackCommand {
    /// Windup begins; the animation collaborator plays the attack.
    Start,
    /// Windup elapsed; a projectile should be released now.
    Release,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BossBrain {
    pub state: BossState,
    pub engaged: bool,
    pub patrol: PatrolBounds,
    pub last_attack_at: Option<u64>,
    pub attack_started_at: Option<u64>,
}

impl BossBrain {
    pub fn new(patrol_min: f32, patrol_max: f32) -> Self {
        let (min, max) = if patrol_min <= patrol_max {
            (patrol_min, patrol_max)
        } else {
            (patrol_max, patrol_min)
        };
        Self {
            state: BossState::Patrol,
            engaged: false,
            patrol: PatrolBounds {
                min,
                max,
                target: max,
            },
            last_attack_at: None,
            attack_started_at: None,
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.attack_started_at.is_some()
    }

    /// One fixed patrol step toward the current target, flipping at the bounds.
    /// A boss displaced outside the bounds walks back toward the target first.
    pub fn patrol_step(&mut self, x: f32, step: f32) -> f32 {
        let target = self.patrol.target;
        if (target - x).abs() <= step {
            self.patrol.target = if target >= self.patrol.max {
                self.patrol.min
            } else {
                self.patrol.max
            };
            return target;
        }
        x + step * (target - x).signum()
    }

    /// Position after this tick's movement for the current state.
    pub fn movement(&mut self, boss: Vec2, player: Vec2, rules: &BossRules, dt_sec: f32) -> Vec2 {
        match self.state {
            BossState::Patrol => Vec2::new(self.patrol_step(boss.x, rules.patrol_step), boss.y),
            BossState::Approach => {
                let distance = boss.distance(player);
                if distance <= rules.close_threshold || distance <= f32::EPSILON {
                    return boss;
                }
                let travel = (rules.approach_speed * dt_sec).min(distance - rules.close_threshold);
                Vec2::new(
                    boss.x + (player.x - boss.x) / distance * travel,
                    boss.y + (player.y - boss.y) / distance * travel,
                )
            }
            BossState::Attack => {
                let dy = player.y - boss.y;
                let travel = (rules.vertical_track_speed * dt_sec).min(dy.abs());
                Vec2::new(boss.x, boss.y + travel * dy.signum())
            }
            BossState::Defeated => boss,
        }
    }

    /// Applies at most one transition and returns it as `(from, to)`.
    ///
    /// Check order: defeat, hysteresis exit, engage, approach to attack,
    /// attack back to approach. Patrol never reaches Attack in one call.
    pub fn evaluate(
        &mut self,
        health: i32,
        distance: f32,
        rules: &BossRules,
    ) -> Option<(BossState, BossState)> {
        let from = self.state;
        if from == BossState::Defeated {
            return None;
        }

        let to = if health <= 0 {
            BossState::Defeated
        } else if self.engaged && distance > rules.exit_threshold {
            self.engaged = false;
            BossState::Patrol
        } else if !self.engaged && distance <= rules.enter_threshold {
            self.engaged = true;
            BossState::Approach
        } else if from == BossState::Approach && distance <= rules.close_threshold {
            BossState::Attack
        } else if from == BossState::Attack && distance > rules.close_threshold {
            BossState::Approach
        } else {
            return None;
        };

        if to == from {
            return None;
        }
        if from == BossState::Attack {
            self.attack_started_at = None;
        }
        self.state = to;
        Some((from, to))
    }

    /// Cooldown-gated attack progression; only acts while in `Attack`.
    /// Completion is decided solely by elapsed windup time.
    pub fn update_attack(&mut self, now_ms: u64, rules: &BossRules) -> Option<AttackCommand> {
        if self.state != BossState::Attack {
            return None;
        }
        if let Some(started_at) = self.attack_started_at {
            if now_ms >= started_at.saturating_add(rules.attack_windup_ms) {
                self.attack_started_at = None;
                self.last_attack_at = Some(now_ms);
                return Some(AttackCommand::Release);
            }
            return None;
        }
        let ready = self
            .last_attack_at
            .map(|at| now_ms.saturating_sub(at) >= rules.attack_cooldown_ms)
            .unwrap_or(true);
        if ready {
            self.attack_started_at = Some(now_ms);
            return Some(AttackCommand::Start);
        }
        None
    }
}
