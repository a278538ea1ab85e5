use brawler_engine::config::{resolve_tuning, EncounterOptions, Tuning};
use brawler_engine::constants::{MAX_LEVEL, TICK_MS, TICK_RATE};
use brawler_engine::engine::Encounter;
use brawler_engine::input::{InputAdapter, InputIntent};
use brawler_engine::logging::StructuredLogLine;
use brawler_engine::session::{GameSession, SceneFlow, SessionStatus};
use brawler_engine::types::{
    Character, EncounterOutcome, EncounterSummary, Facing, RuntimeEvent, Snapshot, Vec2,
};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

const ENGAGE_DISTANCE: f32 = 55.0;
const LANE_TOLERANCE: f32 = 12.0;
const ATTACK_INTERVAL_TICKS: u64 = 8;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    character: Option<String>,
    #[arg(long)]
    level: Option<u32>,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    tuning: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u64,
    character: Character,
    #[serde(rename = "startLevel")]
    start_level: u32,
    minutes: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    character: Character,
    #[serde(rename = "startLevel")]
    start_level: u32,
    outcome: String,
    #[serde(rename = "levelReached")]
    level_reached: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: i32,
    hits: i32,
    kills: i32,
    #[serde(rename = "damageTaken")]
    damage_taken: i32,
    extensions: i32,
    #[serde(rename = "bossSpawns")]
    boss_spawns: i32,
    #[serde(rename = "bossDefeats")]
    boss_defeats: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Walks right, lines up with the nearest target, alternates punch and kick,
/// and heads for the portal once it appears.
#[derive(Debug, Default)]
struct Autopilot {
    tick: u64,
    next_kick: bool,
}

impl InputAdapter for Autopilot {
    fn poll(&mut self, encounter: &Encounter) -> InputIntent {
        self.tick += 1;
        let player = encounter.player_position();
        let mut intent = InputIntent::default();

        if let Some(portal) = encounter.portal_position() {
            steer(&mut intent, player, portal, 0.0, LANE_TOLERANCE / 2.0);
            return intent;
        }
        let Some(target) = nearest_target(encounter, player) else {
            intent.right = true;
            return intent;
        };

        steer(&mut intent, player, target, ENGAGE_DISTANCE, LANE_TOLERANCE);
        let wanted = Facing::toward(player.x, target.x);
        if encounter.player_facing() != wanted && !intent.left && !intent.right {
            match wanted {
                Facing::Left => intent.left = true,
                Facing::Right => intent.right = true,
            }
        }

        let in_reach = (target.x - player.x).abs() <= ENGAGE_DISTANCE + 10.0
            && (target.y - player.y).abs() <= LANE_TOLERANCE * 2.0;
        if in_reach && self.tick % ATTACK_INTERVAL_TICKS == 0 {
            if self.next_kick {
                intent.kick = true;
            } else {
                intent.punch = true;
            }
            self.next_kick = !self.next_kick;
        }
        intent
    }
}

fn steer(intent: &mut InputIntent, from: Vec2, to: Vec2, hold_x: f32, lane: f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > hold_x.max(1.0) {
        intent.right = dx > 0.0;
        intent.left = dx < 0.0;
    }
    if dy.abs() > lane {
        intent.down = dy > 0.0;
        intent.up = dy < 0.0;
    }
}

fn nearest_target(encounter: &Encounter, player: Vec2) -> Option<Vec2> {
    encounter
        .enemy_positions()
        .into_iter()
        .chain(encounter.boss_position())
        .min_by(|a, b| a.distance(player).total_cmp(&b.distance(player)))
}

#[derive(Debug, Default)]
struct SimFlow {
    levels_cleared: u32,
}

impl SceneFlow for SimFlow {
    fn advance_level(&mut self, _next_level: u32, _summary: &EncounterSummary) {
        self.levels_cleared += 1;
    }

    fn signal_win(&mut self, _summary: &EncounterSummary) {
        self.levels_cleared += 1;
    }

    fn signal_loss(&mut self, _summary: &EncounterSummary) {}
}

/// Per-level invariant checks over consecutive snapshots.
#[derive(Debug)]
struct AnomalyTracker {
    max_world_width: i32,
    level: u32,
    last_width: Option<i32>,
    boss_seen: bool,
    boss_spawns: u32,
}

impl AnomalyTracker {
    fn new(max_world_width: i32) -> Self {
        Self {
            max_world_width,
            level: 0,
            last_width: None,
            boss_seen: false,
            boss_spawns: 0,
        }
    }

    fn check(&mut self, snapshot: &Snapshot) -> Vec<String> {
        if snapshot.level != self.level {
            self.level = snapshot.level;
            self.last_width = None;
            self.boss_seen = false;
            self.boss_spawns = 0;
        }
        let mut anomalies = Vec::new();

        if let Some(last) = self.last_width {
            if snapshot.world_width < last {
                anomalies.push(format!(
                    "world width decreased: {last} -> {}",
                    snapshot.world_width
                ));
            }
        }
        if snapshot.world_width > self.max_world_width {
            anomalies.push(format!(
                "world width above max: {} > {}",
                snapshot.world_width, self.max_world_width
            ));
        }
        self.last_width = Some(snapshot.world_width);

        for event in &snapshot.events {
            if matches!(event, RuntimeEvent::BossSpawned { .. }) {
                self.boss_spawns += 1;
                self.boss_seen = true;
            }
        }
        if snapshot.boss.is_some() {
            self.boss_seen = true;
        }
        if self.boss_spawns > 1 {
            anomalies.push(format!(
                "boss spawned {} times in level {}",
                self.boss_spawns, self.level
            ));
        }
        if self.boss_seen && !snapshot.world_locked {
            anomalies.push("world unlocked after boss spawn".to_string());
        }

        let player = &snapshot.player;
        if player.health < 0 || player.health > player.max_health {
            anomalies.push(format!(
                "player health out of range: {}/{}",
                player.health, player.max_health
            ));
        }
        if let Some(boss) = &snapshot.boss {
            if boss.health < 0 || boss.health > boss.max_health {
                anomalies.push(format!(
                    "boss health out of range: {} {}/{}",
                    boss.id, boss.health, boss.max_health
                ));
            }
        }
        anomalies
    }
}

fn main() {
    let cli = Cli::parse();
    let started_at = Utc::now();
    let scenarios = resolve_scenarios(&cli);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, started_at.timestamp_millis()));
    let tuning = resolve_run_tuning(cli.tuning.as_deref(), &run_id);

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        StructuredLogLine::new(
            "info",
            "scenario_started",
            &run_id,
            json!({
                "character": scenario.character,
                "startLevel": scenario.start_level,
                "minutes": scenario.minutes,
            }),
        )
        .scenario(&scenario.name, scenario.seed)
        .emit();
        let scenario_run = run_scenario(&scenario, &tuning);

        for anomaly in &scenario_run.anomaly_records {
            StructuredLogLine::new(
                "warn",
                "anomaly_detected",
                &run_id,
                json!({
                    "message": anomaly.message,
                }),
            )
            .scenario(&scenario.name, scenario.seed)
            .tick(anomaly.tick)
            .emit();
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *outcome_counts
            .entry(scenario_run.result.outcome.clone())
            .or_insert(0) += 1;

        StructuredLogLine::new(
            "info",
            "scenario_finished",
            &run_id,
            json!({
                "outcome": scenario_run.result.outcome,
                "levelReached": scenario_run.result.level_reached,
                "durationMs": scenario_run.result.duration_ms,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        )
        .scenario(&scenario.name, scenario.seed)
        .tick(scenario_run.finished_tick)
        .emit();

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_error(
                &run_id,
                "result_serialize_failed",
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_error(
                &run_id,
                "summary_write_failed",
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    StructuredLogLine::new(
        "info",
        "run_finished",
        &run_id,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    )
    .emit();

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_run_tuning(path: Option<&Path>, run_id: &str) -> Tuning {
    let resolved = resolve_tuning(path);
    if let Some(error) = &resolved.load_error {
        StructuredLogLine::new(
            "warn",
            "tuning_load_failed",
            run_id,
            json!({ "error": error.to_string() }),
        )
        .emit();
    }
    if !resolved.corrected.is_empty() {
        StructuredLogLine::new(
            "warn",
            "tuning_sanitized",
            run_id,
            json!({ "corrected": resolved.corrected }),
        )
        .emit();
    }
    resolved.tuning
}

fn run_scenario(scenario: &Scenario, tuning: &Tuning) -> ScenarioRunResult {
    let options = EncounterOptions {
        level: scenario.start_level,
        seed: scenario.seed,
        character: scenario.character,
        starting_score: 0,
        tuning: tuning.clone(),
    };
    let mut session = GameSession::new(Autopilot::default(), SimFlow::default(), options);
    let mut tracker = AnomalyTracker::new(tuning.max_world_width);

    let mut hits = 0;
    let mut kills = 0;
    let mut damage_taken = 0;
    let mut extensions = 0;
    let mut boss_spawns = 0;
    let mut boss_defeats = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let max_ticks = u64::from(scenario.minutes) * 60 * u64::from(TICK_RATE);
    let mut tick = 0u64;
    let mut outcome = None;

    while tick < max_ticks {
        let status = session.tick(TICK_MS);
        tick += 1;
        let snapshot = session.snapshot();
        for message in tracker.check(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::EnemyHit { .. } | RuntimeEvent::BossHit { .. } => hits += 1,
                RuntimeEvent::EnemyDefeated { .. } => kills += 1,
                RuntimeEvent::PlayerDamaged { damage, .. } => damage_taken += damage,
                RuntimeEvent::WorldExtended { .. } => extensions += 1,
                RuntimeEvent::BossSpawned { .. } => boss_spawns += 1,
                RuntimeEvent::BossDefeated { .. } => boss_defeats += 1,
                _ => {}
            }
        }

        if let SessionStatus::Finished(finished) = status {
            outcome = Some(finished);
            break;
        }
    }

    let mut duration_ms: u64 = session
        .summaries()
        .iter()
        .map(|summary| summary.duration_ms)
        .sum();
    if outcome.is_none() {
        duration_ms += session.encounter().now_ms();
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            character: scenario.character,
            start_level: scenario.start_level,
            outcome: outcome_key(outcome),
            level_reached: session.level(),
            levels_cleared: session.flow().levels_cleared,
            duration_ms,
            score: session.encounter().score(),
            hits,
            kills,
            damage_taken,
            extensions,
            boss_spawns,
            boss_defeats,
            anomalies,
        },
        anomaly_records,
        finished_tick: tick,
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);
    let minutes = cli.minutes.unwrap_or(5).clamp(1, 30);

    if cli.single || cli.character.is_some() || cli.level.is_some() {
        let character = cli
            .character
            .as_deref()
            .map(Character::parse_or_default)
            .unwrap_or_default();
        let start_level = cli.level.unwrap_or(1).clamp(1, MAX_LEVEL);
        return vec![Scenario {
            name: format!("custom-level{start_level}"),
            seed,
            character,
            start_level,
            minutes,
        }];
    }

    vec![
        Scenario {
            name: "full-run-brawler".to_string(),
            seed,
            character: Character::Brawler,
            start_level: 1,
            minutes,
        },
        Scenario {
            name: "full-run-striker".to_string(),
            seed: seed.wrapping_add(1),
            character: Character::Striker,
            start_level: 1,
            minutes,
        },
        Scenario {
            name: "final-level-tank".to_string(),
            seed: seed.wrapping_add(2),
            character: Character::Tank,
            start_level: MAX_LEVEL,
            minutes,
        },
    ]
}

fn outcome_key(outcome: Option<EncounterOutcome>) -> String {
    match outcome {
        Some(EncounterOutcome::Win) => "win",
        Some(EncounterOutcome::Loss) => "loss",
        Some(EncounterOutcome::AdvanceLevel { .. }) => "advance_level",
        None => "timeout",
    }
    .to_string()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        scenarios,
    }
}

fn emit_error(run_id: &str, event: &str, details: Value) {
    StructuredLogLine::new("error", event, run_id, details).emit();
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(outcome: &str, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            character: Character::Brawler,
            start_level: 1,
            outcome: outcome.to_string(),
            level_reached: 1,
            levels_cleared: 0,
            duration_ms,
            score: 0,
            hits: 0,
            kills: 0,
            damage_taken: 0,
            extensions: 0,
            boss_spawns: 0,
            boss_defeats: 0,
            anomalies: Vec::new(),
        }
    }

    fn snapshot_at(level: u32) -> Snapshot {
        let mut encounter = Encounter::new(EncounterOptions {
            level,
            ..EncounterOptions::default()
        });
        encounter.build_snapshot(true)
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![
                make_scenario_result("loss", 60_000),
                make_scenario_result("win", 90_000),
            ],
            BTreeMap::from([("loss".to_string(), 1usize), ("win".to_string(), 1usize)]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("brawler-sim-missing-{}", Utc::now().timestamp_millis()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            "a".to_string(),
            "b".to_string(),
            vec![make_scenario_result("timeout", 60_000)],
            BTreeMap::from([("timeout".to_string(), 1usize)]),
            0,
            60_000,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn tracker_flags_shrinking_world_and_duplicate_boss() {
        let mut tracker = AnomalyTracker::new(6_000);
        let mut snapshot = snapshot_at(1);
        assert!(tracker.check(&snapshot).is_empty());

        snapshot.world_width -= 100;
        snapshot.events.clear();
        let found = tracker.check(&snapshot);
        assert!(found.iter().any(|message| message.contains("decreased")));

        snapshot.world_locked = true;
        snapshot.events = vec![
            RuntimeEvent::BossSpawned {
                boss_id: "boss_1".to_string(),
            },
            RuntimeEvent::BossSpawned {
                boss_id: "boss_2".to_string(),
            },
        ];
        let found = tracker.check(&snapshot);
        assert!(found.iter().any(|message| message.contains("boss spawned 2")));

        let fresh_level = snapshot_at(2);
        assert!(tracker.check(&fresh_level).is_empty());
    }

    #[test]
    fn autopilot_moves_toward_the_first_wave() {
        let mut autopilot = Autopilot::default();
        let encounter = Encounter::new(EncounterOptions::default());
        let intent = autopilot.poll(&encounter);
        assert!(intent.right);
        assert!(!intent.punch && !intent.kick);
    }

    #[test]
    fn outcome_keys_cover_timeouts() {
        assert_eq!(outcome_key(None), "timeout");
        assert_eq!(outcome_key(Some(EncounterOutcome::Win)), "win");
    }
}
