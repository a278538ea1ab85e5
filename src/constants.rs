use crate::types::Character;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAX_LEVEL: u32 = 3;

pub const PLAYER_MAX_HEALTH: i32 = 100;
pub const PLAYER_SPEED: f32 = 240.0;
pub const WALK_MIN_Y: f32 = 380.0;
pub const WALK_MAX_Y: f32 = 560.0;
pub const PLAYER_SPAWN_X: f32 = 120.0;
pub const PLAYER_HURTBOX: (f32, f32) = (50.0, 60.0);
pub const ENEMY_HURTBOX: (f32, f32) = (50.0, 60.0);
pub const BOSS_HURTBOX: (f32, f32) = (90.0, 80.0);

pub const PUNCH_DAMAGE: i32 = 20;
pub const KICK_DAMAGE: i32 = 25;
pub const PUNCH_SCORE: i32 = 10;
pub const KICK_SCORE: i32 = 15;
pub const ENEMY_KILL_BONUS: i32 = 100;
pub const BOSS_KILL_BONUS: i32 = 1_000;
pub const PUNCH_REACH: f32 = 70.0;
pub const KICK_REACH: f32 = 90.0;
pub const ATTACK_HEIGHT: f32 = 60.0;
pub const PUNCH_WINDUP_MS: u64 = 0;
pub const KICK_WINDUP_MS: u64 = 0;
pub const ATTACK_ACTIVE_MS: u64 = 200;
pub const ATTACK_RECOVERY_MS: u64 = 120;
pub const HIT_FLASH_MS: u64 = 200;

pub const ENEMY_HEALTH: i32 = 40;
pub const ENEMY_STANDARD_SPEED: f32 = 90.0;
pub const ENEMY_FAST_SPEED: f32 = 150.0;
pub const ENEMY_FAST_CHANCE: f32 = 0.3;
pub const ENEMY_CONTACT_DAMAGE: i32 = 5;
pub const ENEMY_CONTACT_RANGE: f32 = 40.0;
pub const ENEMY_HOLD_DISTANCE: f32 = 30.0;

pub const BOSS_CONTACT_DAMAGE: i32 = 10;
pub const BOSS_CONTACT_RANGE: f32 = 70.0;
pub const BOSS_PATROL_STEP: f32 = 1.5;
pub const BOSS_PATROL_HALF_WIDTH: f32 = 250.0;
pub const BOSS_APPROACH_SPEED: f32 = 110.0;
pub const BOSS_VERTICAL_TRACK_SPEED: f32 = 40.0;
pub const BOSS_ENTER_THRESHOLD: f32 = 500.0;
pub const BOSS_EXIT_THRESHOLD: f32 = 550.0;
pub const BOSS_CLOSE_THRESHOLD: f32 = 300.0;
pub const BOSS_ATTACK_COOLDOWN_MS: u64 = 2_000;
pub const BOSS_ATTACK_WINDUP_MS: u64 = 450;
pub const BOSS_SPAWN_OFFSET: f32 = 700.0;

pub const PROJECTILE_SPEED: f32 = 320.0;
pub const PROJECTILE_DAMAGE: i32 = 10;
pub const PROJECTILE_TTL_MS: u64 = 3_000;
pub const PROJECTILE_HIT_RANGE: f32 = 28.0;

pub const INVULNERABILITY_MS: u64 = 1_000;
pub const PLAYER_KNOCKBACK_DISTANCE: f32 = 80.0;
pub const TARGET_KNOCKBACK_DISTANCE: f32 = 40.0;
pub const BOSS_KNOCKBACK_DISTANCE: f32 = 20.0;
pub const KNOCKBACK_DURATION_MS: u64 = 250;

pub const INITIAL_WORLD_WIDTH: i32 = 2_400;
pub const MAX_WORLD_WIDTH: i32 = 6_000;
pub const WORLD_EXTENSION_STEP: i32 = 1_200;
pub const EXTENSION_TRIGGER_MARGIN: i32 = 600;
pub const REINFORCEMENT_BATCH: usize = 2;
pub const PORTAL_RANGE: f32 = 60.0;

pub fn get_initial_enemy_count(level: u32) -> usize {
    3 + level.max(1) as usize
}

pub fn get_boss_max_health(level: u32) -> i32 {
    100 + 50 * (level.max(1) as i32 - 1)
}

/// Max health and speed multiplier per selectable character.
pub fn get_character_profile(character: Character) -> (i32, f32) {
    match character {
        Character::Brawler => (PLAYER_MAX_HEALTH, 1.0),
        Character::Striker => (80, 1.2),
        Character::Tank => (140, 0.8),
    }
}
