//! Learner-facing bookkeeping: progress, completion status and submitted responses.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use quest_script::Position;

use crate::registry::InteractionGrade;

/// Quest completion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    #[default]
    Incomplete,
    /// The final step has been reached at least once.
    Completed,
}

/// Scene-based progress through the quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub scene_index: usize,
    pub scene_count: usize,
    /// Rounded `(scene_index + 1) / scene_count` in percent.
    pub percent: u8,
}

impl Progress {
    pub(crate) fn at(position: Position, scene_count: usize) -> Self {
        let scenes_seen = (position.scene_index + 1).min(scene_count);
        let percent = if scene_count == 0 {
            0
        } else {
            ((scenes_seen as f64 / scene_count as f64) * 100.0).round() as u8
        };
        Self {
            scene_index: position.scene_index,
            scene_count,
            percent,
        }
    }
}

/// Latest submission for one interaction on one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseRecord {
    pub position: Position,
    pub interaction_index: usize,
    pub interaction: String,
    pub grade: InteractionGrade,
    /// Set once a correct answer has been submitted.
    pub is_submitted: bool,
    pub attempts: u32,
}

/// Submitted responses keyed `"{scene}_{dialog}_{interaction}"`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseLog(BTreeMap<String, ResponseRecord>);

impl ResponseLog {
    pub fn key(position: Position, interaction_index: usize) -> String {
        format!("{}_{}", position, interaction_index)
    }

    pub(crate) fn record(
        &mut self,
        position: Position,
        interaction_index: usize,
        interaction: &str,
        grade: InteractionGrade,
    ) {
        let record = self
            .0
            .entry(Self::key(position, interaction_index))
            .or_insert_with(|| ResponseRecord {
                position,
                interaction_index,
                interaction: interaction.to_string(),
                grade,
                is_submitted: false,
                attempts: 0,
            });
        record.grade = grade;
        record.attempts += 1;
        record.is_submitted |= grade.is_correct;
    }

    pub fn get(&self, position: Position, interaction_index: usize) -> Option<&ResponseRecord> {
        self.0.get(&Self::key(position, interaction_index))
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.0.values()
    }
}

/// State published by state-exchanging widgets, merged per step and keyed
/// `"{scene}_{dialog}"`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedStateLog(BTreeMap<String, Map<String, Value>>);

impl SharedStateLog {
    /// Merge `state` into the step's entry. Returns whether any value changed.
    pub(crate) fn merge(&mut self, position: Position, state: &Map<String, Value>) -> bool {
        let entry = self.0.entry(position.to_string()).or_default();
        let mut changed = false;
        for (key, value) in state {
            if entry.get(key) != Some(value) {
                entry.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn get(&self, position: Position) -> Option<&Map<String, Value>> {
        self.0.get(&position.to_string())
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::at(Position::new(0, 3), 4).percent, 25);
        assert_eq!(Progress::at(Position::new(1, 0), 3).percent, 67);
        assert_eq!(Progress::at(Position::new(2, 0), 3).percent, 100);
    }

    #[test]
    fn test_shared_state_merges_per_step() {
        let mut log = SharedStateLog::default();
        let position = Position::new(1, 2);
        let state = |value: serde_json::Value| value.as_object().cloned().unwrap();

        assert!(log.merge(position, &state(serde_json::json!({ "angle": 30, "locked": false }))));
        assert!(!log.merge(position, &state(serde_json::json!({ "angle": 30 }))));
        assert!(log.merge(position, &state(serde_json::json!({ "angle": 45 }))));

        let merged = log.get(position).unwrap();
        assert_eq!(merged.get("angle"), Some(&serde_json::json!(45)));
        assert_eq!(merged.get("locked"), Some(&serde_json::json!(false)));
        assert!(log.get(Position::origin()).is_none());
    }

    #[test]
    fn test_response_log_tracks_attempts() {
        let mut log = ResponseLog::default();
        let position = Position::new(2, 1);

        log.record(position, 0, "quiz", InteractionGrade::incorrect());
        log.record(position, 0, "quiz", InteractionGrade::correct());
        log.record(position, 0, "quiz", InteractionGrade::incorrect());

        let record = log.get(position, 0).unwrap();
        assert_eq!(record.attempts, 3);
        assert!(record.is_submitted);
        assert_eq!(record.grade, InteractionGrade::incorrect());
        assert_eq!(ResponseLog::key(position, 0), "2_1_0");
    }
}
