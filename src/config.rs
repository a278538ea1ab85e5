use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::constants::*;
use crate::types::{AttackKind, Character};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Every numeric policy knob of the combat and encounter engine.
///
/// Missing fields in a tuning file keep their default value.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    pub player_speed: f32,
    pub punch_damage: i32,
    pub kick_damage: i32,
    pub punch_score: i32,
    pub kick_score: i32,
    pub punch_reach: f32,
    pub kick_reach: f32,
    pub attack_height: f32,
    pub punch_windup_ms: u64,
    pub kick_windup_ms: u64,
    pub attack_active_ms: u64,
    pub attack_recovery_ms: u64,
    pub hit_flash_ms: u64,
    pub enemy_kill_bonus: i32,
    pub boss_kill_bonus: i32,

    pub enemy_health: i32,
    pub enemy_standard_speed: f32,
    pub enemy_fast_speed: f32,
    pub enemy_fast_chance: f32,
    pub enemy_contact_damage: i32,
    pub enemy_contact_range: f32,

    pub boss_contact_damage: i32,
    pub boss_contact_range: f32,
    pub boss_patrol_step: f32,
    pub boss_patrol_half_width: f32,
    pub boss_approach_speed: f32,
    pub boss_vertical_track_speed: f32,
    pub boss_enter_threshold: f32,
    pub boss_exit_threshold: f32,
    pub boss_close_threshold: f32,
    pub boss_attack_cooldown_ms: u64,
    pub boss_attack_windup_ms: u64,
    pub boss_spawn_offset: f32,

    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub projectile_ttl_ms: u64,

    pub invulnerability_ms: u64,
    pub player_knockback_distance: f32,
    pub target_knockback_distance: f32,
    pub boss_knockback_distance: f32,
    pub knockback_duration_ms: u64,

    pub initial_world_width: i32,
    pub max_world_width: i32,
    pub world_extension_step: i32,
    pub extension_trigger_margin: i32,
    pub reinforcement_batch: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            punch_damage: PUNCH_DAMAGE,
            kick_damage: KICK_DAMAGE,
            punch_score: PUNCH_SCORE,
            kick_score: KICK_SCORE,
            punch_reach: PUNCH_REACH,
            kick_reach: KICK_REACH,
            attack_height: ATTACK_HEIGHT,
            punch_windup_ms: PUNCH_WINDUP_MS,
            kick_windup_ms: KICK_WINDUP_MS,
            attack_active_ms: ATTACK_ACTIVE_MS,
            attack_recovery_ms: ATTACK_RECOVERY_MS,
            hit_flash_ms: HIT_FLASH_MS,
            enemy_kill_bonus: ENEMY_KILL_BONUS,
            boss_kill_bonus: BOSS_KILL_BONUS,
            enemy_health: ENEMY_HEALTH,
            enemy_standard_speed: ENEMY_STANDARD_SPEED,
            enemy_fast_speed: ENEMY_FAST_SPEED,
            enemy_fast_chance: ENEMY_FAST_CHANCE,
            enemy_contact_damage: ENEMY_CONTACT_DAMAGE,
            enemy_contact_range: ENEMY_CONTACT_RANGE,
            boss_contact_damage: BOSS_CONTACT_DAMAGE,
            boss_contact_range: BOSS_CONTACT_RANGE,
            boss_patrol_step: BOSS_PATROL_STEP,
            boss_patrol_half_width: BOSS_PATROL_HALF_WIDTH,
            boss_approach_speed: BOSS_APPROACH_SPEED,
            boss_vertical_track_speed: BOSS_VERTICAL_TRACK_SPEED,
            boss_enter_threshold: BOSS_ENTER_THRESHOLD,
            boss_exit_threshold: BOSS_EXIT_THRESHOLD,
            boss_close_threshold: BOSS_CLOSE_THRESHOLD,
            boss_attack_cooldown_ms: BOSS_ATTACK_COOLDOWN_MS,
            boss_attack_windup_ms: BOSS_ATTACK_WINDUP_MS,
            boss_spawn_offset: BOSS_SPAWN_OFFSET,
            projectile_speed: PROJECTILE_SPEED,
            projectile_damage: PROJECTILE_DAMAGE,
            projectile_ttl_ms: PROJECTILE_TTL_MS,
            invulnerability_ms: INVULNERABILITY_MS,
            player_knockback_distance: PLAYER_KNOCKBACK_DISTANCE,
            target_knockback_distance: TARGET_KNOCKBACK_DISTANCE,
            boss_knockback_distance: BOSS_KNOCKBACK_DISTANCE,
            knockback_duration_ms: KNOCKBACK_DURATION_MS,
            initial_world_width: INITIAL_WORLD_WIDTH,
            max_world_width: MAX_WORLD_WIDTH,
            world_extension_step: WORLD_EXTENSION_STEP,
            extension_trigger_margin: EXTENSION_TRIGGER_MARGIN,
            reinforcement_batch: REINFORCEMENT_BATCH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackProfile {
    pub damage: i32,
    pub score: i32,
    pub reach: f32,
    pub height: f32,
    pub windup_ms: u64,
    pub active_ms: u64,
    pub recovery_ms: u64,
}

impl Tuning {
    pub fn attack_profile(&self, kind: AttackKind) -> AttackProfile {
        let (damage, score, reach, windup_ms) = match kind {
            AttackKind::Punch => (
                self.punch_damage,
                self.punch_score,
                self.punch_reach,
                self.punch_windup_ms,
            ),
            AttackKind::Kick => (
                self.kick_damage,
                self.kick_score,
                self.kick_reach,
                self.kick_windup_ms,
            ),
        };
        AttackProfile {
            damage,
            score,
            reach,
            height: self.attack_height,
            windup_ms,
            active_ms: self.attack_active_ms,
            recovery_ms: self.attack_recovery_ms,
        }
    }

    /// Replaces values that would break engine invariants with their defaults.
    /// Returns the names of the corrected fields.
    pub fn sanitized(mut self) -> (Self, Vec<&'static str>) {
        let defaults = Tuning::default();
        let mut corrected = Vec::new();

        let band_ok = self.boss_close_threshold > 0.0
            && self.boss_close_threshold < self.boss_enter_threshold
            && self.boss_enter_threshold < self.boss_exit_threshold;
        if !band_ok {
            self.boss_close_threshold = defaults.boss_close_threshold;
            self.boss_enter_threshold = defaults.boss_enter_threshold;
            self.boss_exit_threshold = defaults.boss_exit_threshold;
            corrected.push("bossThresholds");
        }
        if self.punch_damage <= 0 || self.kick_damage <= self.punch_damage {
            self.punch_damage = defaults.punch_damage;
            self.kick_damage = defaults.kick_damage;
            corrected.push("attackDamage");
        }
        if self.boss_patrol_step <= 0.0 {
            self.boss_patrol_step = defaults.boss_patrol_step;
            corrected.push("bossPatrolStep");
        }
        if self.attack_active_ms == 0 {
            self.attack_active_ms = defaults.attack_active_ms;
            corrected.push("attackActiveMs");
        }
        if self.knockback_duration_ms == 0 {
            self.knockback_duration_ms = defaults.knockback_duration_ms;
            corrected.push("knockbackDurationMs");
        }
        if self.projectile_ttl_ms == 0 {
            self.projectile_ttl_ms = defaults.projectile_ttl_ms;
            corrected.push("projectileTtlMs");
        }
        if self.enemy_health <= 0 {
            self.enemy_health = defaults.enemy_health;
            corrected.push("enemyHealth");
        }
        if self.world_extension_step <= 0 {
            self.world_extension_step = defaults.world_extension_step;
            corrected.push("worldExtensionStep");
        }
        if self.initial_world_width <= self.extension_trigger_margin {
            self.initial_world_width = defaults.initial_world_width;
            self.extension_trigger_margin = defaults.extension_trigger_margin;
            corrected.push("initialWorldWidth");
        }
        if self.max_world_width < self.initial_world_width {
            self.max_world_width = self.initial_world_width;
            corrected.push("maxWorldWidth");
        }
        (self, corrected)
    }
}

pub fn load_tuning(path: &Path) -> Result<Tuning, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Tuning ready for use, plus what went wrong getting there.
#[derive(Debug)]
pub struct ResolvedTuning {
    pub tuning: Tuning,
    pub load_error: Option<ConfigError>,
    pub corrected: Vec<&'static str>,
}

/// Loads an optional tuning file and sanitizes the result. A file that cannot
/// be read or parsed falls back to the defaults.
pub fn resolve_tuning(path: Option<&Path>) -> ResolvedTuning {
    let (tuning, load_error) = match path.map(load_tuning) {
        None => (Tuning::default(), None),
        Some(Ok(tuning)) => (tuning, None),
        Some(Err(error)) => (Tuning::default(), Some(error)),
    };
    let (tuning, corrected) = tuning.sanitized();
    ResolvedTuning {
        tuning,
        load_error,
        corrected,
    }
}

#[derive(Clone, Debug)]
pub struct EncounterOptions {
    pub level: u32,
    pub seed: u64,
    pub character: Character,
    pub starting_score: i32,
    pub tuning: Tuning,
}

impl Default for EncounterOptions {
    fn default() -> Self {
        Self {
            level: 1,
            seed: 1,
            character: Character::default(),
            starting_score: 0,
            tuning: Tuning::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tuning_file_keeps_defaults_for_missing_fields() {
        let tuning: Tuning =
            serde_json::from_str(r#"{"kickDamage":40,"bossExitThreshold":600.0}"#)
                .expect("partial tuning should parse");
        assert_eq!(tuning.kick_damage, 40);
        assert_eq!(tuning.boss_exit_threshold, 600.0);
        assert_eq!(tuning.punch_damage, PUNCH_DAMAGE);
        assert_eq!(tuning.max_world_width, MAX_WORLD_WIDTH);
    }

    #[test]
    fn inverted_hysteresis_band_is_restored() {
        let tuning = Tuning {
            boss_enter_threshold: 600.0,
            boss_exit_threshold: 500.0,
            ..Tuning::default()
        };
        let (fixed, corrected) = tuning.sanitized();
        assert_eq!(corrected, vec!["bossThresholds"]);
        assert!(fixed.boss_enter_threshold < fixed.boss_exit_threshold);
        assert!(fixed.boss_close_threshold < fixed.boss_enter_threshold);
    }

    #[test]
    fn healing_attacks_and_stalled_patrol_are_restored() {
        let tuning = Tuning {
            punch_damage: -5,
            boss_patrol_step: 0.0,
            ..Tuning::default()
        };
        let (fixed, corrected) = tuning.sanitized();
        assert_eq!(corrected, vec!["attackDamage", "bossPatrolStep"]);
        assert_eq!(fixed.punch_damage, PUNCH_DAMAGE);
        assert_eq!(fixed.kick_damage, KICK_DAMAGE);
        assert_eq!(fixed.boss_patrol_step, BOSS_PATROL_STEP);

        let (fixed, corrected) = Tuning {
            punch_damage: 30,
            kick_damage: 30,
            ..Tuning::default()
        }
        .sanitized();
        assert_eq!(corrected, vec!["attackDamage"]);
        assert!(fixed.kick_damage > fixed.punch_damage);
    }

    #[test]
    fn default_tuning_needs_no_correction() {
        let (fixed, corrected) = Tuning::default().sanitized();
        assert!(corrected.is_empty());
        assert_eq!(fixed, Tuning::default());
    }

    #[test]
    fn kick_outdamages_punch_by_default() {
        let tuning = Tuning::default();
        let punch = tuning.attack_profile(AttackKind::Punch);
        let kick = tuning.attack_profile(AttackKind::Kick);
        assert!(kick.damage > punch.damage);
        assert!(kick.reach > punch.reach);
    }

    #[test]
    fn missing_tuning_file_reports_io_error() {
        let path = std::env::temp_dir()
            .join("brawler-engine-missing-dir")
            .join("tuning.json");
        let result = load_tuning(&path);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn unreadable_tuning_resolves_to_defaults_with_error() {
        let path = std::env::temp_dir()
            .join("brawler-engine-missing-dir")
            .join("tuning.json");
        let resolved = resolve_tuning(Some(&path));
        assert_eq!(resolved.tuning, Tuning::default());
        assert!(resolved.load_error.is_some());
        assert!(resolved.corrected.is_empty());

        let resolved = resolve_tuning(None);
        assert!(resolved.load_error.is_none());
    }

    #[test]
    fn unknown_character_falls_back_to_default() {
        assert_eq!(Character::parse_or_default("ninja"), Character::Brawler);
        assert_eq!(Character::parse_or_default(" tank "), Character::Tank);
    }
}
