use brawler_engine::config::{resolve_tuning, EncounterOptions};
use brawler_engine::constants::{MAX_LEVEL, TICK_MS};
use brawler_engine::engine::Encounter;
use brawler_engine::input::{InputAdapter, InputIntent, IntentTranslator, RawInputState};
use brawler_engine::logging::{emit_log, StructuredLogLine};
use brawler_engine::session::{GameSession, SceneFlow, SessionStatus};
use brawler_engine::types::{Character, EncounterSummary};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 1)]
    level: u32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "brawler")]
    character: String,
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Print a snapshot every N ticks; ticks with events are always printed.
    #[arg(long, default_value_t = 1)]
    snapshot_every: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputCommand {
    Hold(RawInputState),
    Quit,
}

/// Held buttons come from stdin; presses become one-tick edges.
#[derive(Debug, Default)]
struct ChannelInput {
    raw: RawInputState,
    translator: IntentTranslator,
}

impl InputAdapter for ChannelInput {
    fn poll(&mut self, _encounter: &Encounter) -> InputIntent {
        self.translator.translate(self.raw)
    }
}

struct LogFlow {
    run_id: String,
}

impl SceneFlow for LogFlow {
    fn advance_level(&mut self, next_level: u32, summary: &EncounterSummary) {
        emit_log(
            "info",
            "level_cleared",
            &self.run_id,
            json!({ "nextLevel": next_level, "summary": summary }),
        );
    }

    fn signal_win(&mut self, summary: &EncounterSummary) {
        emit_log("info", "game_won", &self.run_id, json!({ "summary": summary }));
    }

    fn signal_loss(&mut self, summary: &EncounterSummary) {
        emit_log("info", "game_lost", &self.run_id, json!({ "summary": summary }));
    }

    fn pause(&mut self) {
        emit_log("info", "paused", &self.run_id, json!({}));
    }

    fn resume(&mut self) {
        emit_log("info", "resumed", &self.run_id, json!({}));
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);
    let run_id = format!("play-{seed}");

    let resolved = resolve_tuning(cli.tuning.as_deref());
    if let Some(error) = &resolved.load_error {
        emit_log(
            "warn",
            "tuning_load_failed",
            &run_id,
            json!({ "error": error.to_string() }),
        );
    }
    if !resolved.corrected.is_empty() {
        emit_log(
            "warn",
            "tuning_sanitized",
            &run_id,
            json!({ "corrected": resolved.corrected }),
        );
    }

    let options = EncounterOptions {
        level: cli.level.clamp(1, MAX_LEVEL),
        seed,
        character: Character::parse_or_default(&cli.character),
        starting_score: 0,
        tuning: resolved.tuning,
    };
    emit_log(
        "info",
        "session_started",
        &run_id,
        json!({ "level": options.level, "character": options.character }),
    );

    let (tx, mut rx) = mpsc::channel::<InputCommand>(64);
    tokio::spawn(read_commands(tx));

    let mut session = GameSession::new(
        ChannelInput::default(),
        LogFlow {
            run_id: run_id.clone(),
        },
        options,
    );
    let snapshot_every = cli.snapshot_every.max(1);
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    let mut ticks = 0u64;

    'game: loop {
        interval.tick().await;
        while let Ok(command) = rx.try_recv() {
            match command {
                InputCommand::Hold(raw) => session.input_mut().raw = raw,
                InputCommand::Quit => break 'game,
            }
        }

        let status = session.tick(TICK_MS);
        ticks += 1;
        let snapshot = session.snapshot();
        if status != SessionStatus::Paused
            && (ticks % snapshot_every == 0 || !snapshot.events.is_empty())
        {
            match serde_json::to_string(&snapshot) {
                Ok(line) => println!("{line}"),
                Err(error) => emit_log(
                    "error",
                    "snapshot_serialize_failed",
                    &run_id,
                    json!({ "error": error.to_string() }),
                ),
            }
        }
        if let SessionStatus::Finished(outcome) = status {
            StructuredLogLine::new(
                "info",
                "session_finished",
                &run_id,
                json!({ "outcome": outcome, "score": session.encounter().score() }),
            )
            .tick(ticks)
            .emit();
            break;
        }
    }
}

async fn read_commands(tx: mpsc::Sender<InputCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(parse_command(&line)).await.is_err() {
            return;
        }
    }
    let _ = tx.send(InputCommand::Quit).await;
}

/// One line lists every button currently held, e.g. `right punch`.
/// An empty line releases everything.
fn parse_command(line: &str) -> InputCommand {
    let mut raw = RawInputState::default();
    for token in line.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "quit" | "exit" => return InputCommand::Quit,
            "up" | "w" => raw.up = true,
            "down" | "s" => raw.down = true,
            "left" | "a" => raw.left = true,
            "right" | "d" => raw.right = true,
            "punch" | "j" => raw.punch = true,
            "kick" | "k" => raw.kick = true,
            "pause" | "p" => raw.pause = true,
            _ => {}
        }
    }
    InputCommand::Hold(raw)
}
