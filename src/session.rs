//! Level-to-level flow around one [`Encounter`] at a time.
//!
//! Platform differences live entirely in the injected [`InputAdapter`]; scene
//! changes are reported to the [`SceneFlow`] collaborator.

use crate::config::EncounterOptions;
use crate::engine::Encounter;
use crate::input::{InputAdapter, InputIntent};
use crate::types::{EncounterOutcome, EncounterSummary, RuntimeEvent, Snapshot};

pub trait SceneFlow {
    fn advance_level(&mut self, next_level: u32, summary: &EncounterSummary);
    fn signal_win(&mut self, summary: &EncounterSummary);
    fn signal_loss(&mut self, summary: &EncounterSummary);
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionStatus {
    Running,
    Paused,
    LevelAdvanced { next_level: u32 },
    Finished(EncounterOutcome),
}

pub struct GameSession<I: InputAdapter, F: SceneFlow> {
    input: I,
    flow: F,
    options: EncounterOptions,
    encounter: Encounter,
    paused: bool,
    finished: Option<EncounterOutcome>,
    summaries: Vec<EncounterSummary>,
    carried_events: Vec<RuntimeEvent>,
}

impl<I: InputAdapter, F: SceneFlow> GameSession<I, F> {
    pub fn new(input: I, flow: F, options: EncounterOptions) -> Self {
        let encounter = Encounter::new(options.clone());
        Self {
            input,
            flow,
            options,
            encounter,
            paused: false,
            finished: None,
            summaries: Vec::new(),
            carried_events: Vec::new(),
        }
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn finished(&self) -> Option<EncounterOutcome> {
        self.finished
    }

    pub fn level(&self) -> u32 {
        self.encounter.level
    }

    /// Summaries of every encounter that has ended, in play order.
    pub fn summaries(&self) -> &[EncounterSummary] {
        &self.summaries
    }

    pub fn tick(&mut self, dt_ms: u64) -> SessionStatus {
        let intent = self.input.poll(&self.encounter);
        self.tick_with(dt_ms, intent)
    }

    /// Pause toggles on the pause edge; a paused session does not advance the
    /// game clock.
    pub fn tick_with(&mut self, dt_ms: u64, intent: InputIntent) -> SessionStatus {
        if let Some(outcome) = self.finished {
            return SessionStatus::Finished(outcome);
        }
        if intent.pause {
            self.paused = !self.paused;
            if self.paused {
                self.flow.pause();
            } else {
                self.flow.resume();
            }
        }
        if self.paused {
            return SessionStatus::Paused;
        }

        self.encounter.step(dt_ms, &intent);
        let Some(outcome) = self.encounter.outcome() else {
            return SessionStatus::Running;
        };

        let summary = self.encounter.build_summary();
        self.summaries.push(summary.clone());
        match outcome {
            EncounterOutcome::AdvanceLevel { next_level } => {
                self.carried_events = self.encounter.build_snapshot(true).events;
                self.flow.advance_level(next_level, &summary);
                self.options.level = next_level;
                self.options.starting_score = summary.score;
                self.options.seed = self.options.seed.wrapping_add(u64::from(next_level));
                self.encounter = Encounter::new(self.options.clone());
                SessionStatus::LevelAdvanced { next_level }
            }
            EncounterOutcome::Win => {
                self.flow.signal_win(&summary);
                self.finished = Some(outcome);
                SessionStatus::Finished(outcome)
            }
            EncounterOutcome::Loss => {
                self.flow.signal_loss(&summary);
                self.finished = Some(outcome);
                SessionStatus::Finished(outcome)
            }
        }
    }

    /// Snapshot of the current encounter. Events left over from a level that
    /// just ended come first.
    pub fn snapshot(&mut self) -> Snapshot {
        let mut snapshot = self.encounter.build_snapshot(true);
        if !self.carried_events.is_empty() {
            let mut events = std::mem::take(&mut self.carried_events);
            events.append(&mut snapshot.events);
            snapshot.events = events;
        }
        snapshot
    }
}
