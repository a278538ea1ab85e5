use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self {
            x: center.x - w / 2.0,
            y: center.y - h / 2.0,
            w,
            h,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Punch,
    Kick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackState {
    Idle,
    Windup,
    Active,
    Recovery,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Fast,
    Standard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BossState {
    Patrol,
    Approach,
    Attack,
    Defeated,
}

/// What the animation collaborator should show for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    Idle,
    Walk,
    Attack,
    Hit,
    Defeated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    #[default]
    Brawler,
    Striker,
    Tank,
}

impl Character {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brawler" => Some(Self::Brawler),
            "striker" => Some(Self::Striker),
            "tank" => Some(Self::Tank),
            _ => None,
        }
    }

    /// Unrecognized selections fall back to the default character.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value.trim()).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterOutcome {
    AdvanceLevel {
        #[serde(rename = "nextLevel")]
        next_level: u32,
    },
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PatrolBounds {
    pub min: f32,
    pub max: f32,
    pub target: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub health: i32,
    #[serde(rename = "maxHealth")]
    pub max_health: i32,
    #[serde(rename = "attackState")]
    pub attack_state: AttackState,
    #[serde(rename = "canAttack")]
    pub can_attack: bool,
    #[serde(rename = "invulnerableUntil")]
    pub invulnerable_until: Option<u64>,
    #[serde(rename = "canTakeDamage")]
    pub can_take_damage: bool,
    pub visual: VisualState,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnemyView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub health: i32,
    #[serde(rename = "type")]
    pub enemy_type: EnemyType,
    #[serde(rename = "hitRecently")]
    pub hit_recently: bool,
    pub alive: bool,
    pub visual: VisualState,
}

#[derive(Clone, Debug, Serialize)]
pub struct BossView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub health: i32,
    #[serde(rename = "maxHealth")]
    pub max_health: i32,
    pub state: BossState,
    pub patrol: PatrolBounds,
    #[serde(rename = "lastAttackAt")]
    pub last_attack_at: Option<u64>,
    pub engaged: bool,
    #[serde(rename = "hitRecently")]
    pub hit_recently: bool,
    pub visual: VisualState,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjectileView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(rename = "expiresAt")]
    pub expires_at: u64,
}

/// Live attack region, exposed for debug overlays.
#[derive(Clone, Debug, Serialize)]
pub struct HitboxView {
    pub id: String,
    pub owner: String,
    pub kind: AttackKind,
    pub rect: Rect,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PortalView {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HudView {
    pub health: i32,
    #[serde(rename = "maxHealth")]
    pub max_health: i32,
    pub score: i32,
    #[serde(rename = "bossHealthPct")]
    pub boss_health_pct: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    AttackStarted {
        kind: AttackKind,
    },
    EnemyHit {
        #[serde(rename = "enemyId")]
        enemy_id: String,
        damage: i32,
        health: i32,
    },
    EnemyDefeated {
        #[serde(rename = "enemyId")]
        enemy_id: String,
    },
    EnemiesSpawned {
        count: usize,
    },
    BossSpawned {
        #[serde(rename = "bossId")]
        boss_id: String,
    },
    BossHit {
        damage: i32,
        health: i32,
    },
    BossHealthChanged {
        pct: f32,
    },
    BossStateChanged {
        from: BossState,
        to: BossState,
    },
    BossAttackStarted,
    ProjectileSpawned {
        #[serde(rename = "projectileId")]
        projectile_id: String,
    },
    BossDefeated {
        #[serde(rename = "bossId")]
        boss_id: String,
    },
    PlayerDamaged {
        damage: i32,
        health: i32,
        #[serde(rename = "sourceId")]
        source_id: String,
    },
    ScoreChanged {
        score: i32,
    },
    WorldExtended {
        width: i32,
    },
    WorldLocked,
    PortalSpawned {
        x: f32,
        y: f32,
    },
    EncounterEnded {
        outcome: EncounterOutcome,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub level: u32,
    #[serde(rename = "worldWidth")]
    pub world_width: i32,
    #[serde(rename = "worldLocked")]
    pub world_locked: bool,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub boss: Option<BossView>,
    pub projectiles: Vec<ProjectileView>,
    pub hitboxes: Vec<HitboxView>,
    pub portal: Option<PortalView>,
    pub hud: HudView,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EncounterSummary {
    pub level: u32,
    pub outcome: Option<EncounterOutcome>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub score: i32,
    #[serde(rename = "enemiesDefeated")]
    pub enemies_defeated: i32,
    #[serde(rename = "bossDefeated")]
    pub boss_defeated: bool,
    #[serde(rename = "damageTaken")]
    pub damage_taken: i32,
    pub extensions: i32,
}
