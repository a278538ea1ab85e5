//! One-line JSON log records for the binaries. The engine itself does not log.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: String,
    pub event: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: &str, event: &str, run_id: &str, details: Value) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.to_string(),
            event: event.to_string(),
            run_id: run_id.to_string(),
            scenario: None,
            seed: None,
            tick: None,
            details,
        }
    }

    pub fn scenario(mut self, scenario: &str, seed: u64) -> Self {
        self.scenario = Some(scenario.to_string());
        self.seed = Some(seed);
        self
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(line) => eprintln!("{line}"),
            Err(error) => eprintln!("[log] failed to serialize {}: {error}", self.event),
        }
    }
}

pub fn emit_log(level: &str, event: &str, run_id: &str, details: Value) {
    StructuredLogLine::new(level, event, run_id, details).emit();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let line = StructuredLogLine::new("info", "run_finished", "sim-1", json!({"count": 2}));
        let value = serde_json::to_value(&line).expect("log line should serialize");
        assert_eq!(value["runId"], "sim-1");
        assert_eq!(value["details"]["count"], 2);
        assert!(value.get("scenario").is_none());
        assert!(value.get("tick").is_none());
    }

    #[test]
    fn scenario_and_tick_are_attached() {
        let line = StructuredLogLine::new("warn", "anomaly_detected", "sim-1", Value::Null)
            .scenario("full-run", 7)
            .tick(42);
        let value = serde_json::to_value(&line).expect("log line should serialize");
        assert_eq!(value["scenario"], "full-run");
        assert_eq!(value["seed"], 7);
        assert_eq!(value["tick"], 42);
        assert!(value["timestamp"]
            .as_str()
            .is_some_and(|stamp| stamp.ends_with('Z')));
    }
}
