//! Cursor - the session's position plus what it has observed on the way.

use serde::Serialize;
use std::collections::BTreeMap;

use quest_script::{Direction, Position, Quest};

use crate::error::EngineError;

/// Gate conditions seen satisfied during this session, with the step where
/// each was first passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CompletionLog(BTreeMap<String, Position>);

impl CompletionLog {
    pub(crate) fn record(&mut self, condition: &str, position: Position) {
        self.0.entry(condition.to_string()).or_insert(position);
    }

    pub fn contains(&self, condition: &str) -> bool {
        self.0.contains_key(condition)
    }

    /// Step where the condition was first passed.
    pub fn first_passed_at(&self, condition: &str) -> Option<Position> {
        self.0.get(condition).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Current position, last move direction, completion log and move history.
///
/// Always addresses an existing step: construction outside the quest fails.
#[derive(Debug, Clone, Serialize)]
pub struct Cursor {
    position: Position,
    direction: Direction,
    completion_log: CompletionLog,
    #[serde(skip)]
    history: Vec<Position>,
}

impl Cursor {
    /// Place a cursor at `position`, failing fast when it is out of range.
    pub fn new(quest: &Quest, position: Position) -> Result<Self, EngineError> {
        if !quest.position_is_valid(position) {
            return Err(EngineError::PositionOutOfRange {
                slug: quest.slug.to_string(),
                position,
            });
        }
        Ok(Self {
            position,
            direction: Direction::Forward,
            completion_log: CompletionLog::default(),
            history: Vec::new(),
        })
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn completion_log(&self) -> &CompletionLog {
        &self.completion_log
    }

    /// Number of recorded moves `back` can unwind.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn move_to(&mut self, position: Position, direction: Direction) {
        self.position = position;
        self.direction = direction;
    }

    pub(crate) fn push_history(&mut self, position: Position) {
        self.history.push(position);
    }

    pub(crate) fn pop_history(&mut self) -> Option<Position> {
        self.history.pop()
    }

    /// Back to the origin with an empty log and history.
    pub(crate) fn reset(&mut self) {
        self.position = Position::origin();
        self.direction = Direction::Forward;
        self.completion_log = CompletionLog::default();
        self.history.clear();
    }

    pub(crate) fn record_passed(&mut self, condition: &str) {
        self.completion_log.record(condition, self.position);
    }
}

/// Next position in reading order, crossing scene boundaries.
fn successor(quest: &Quest, position: Position) -> Option<Position> {
    let scene = quest.scene(position.scene_index)?;
    if position.dialog_index + 1 < scene.len() {
        Some(Position::new(position.scene_index, position.dialog_index + 1))
    } else if position.scene_index + 1 < quest.scene_count() {
        Some(Position::new(position.scene_index + 1, 0))
    } else {
        None
    }
}

/// Previous position in reading order, crossing scene boundaries.
fn predecessor(quest: &Quest, position: Position) -> Option<Position> {
    if position.dialog_index > 0 {
        return Some(Position::new(position.scene_index, position.dialog_index - 1));
    }
    let scene_index = position.scene_index.checked_sub(1)?;
    let last = quest.scene(scene_index)?.len().checked_sub(1)?;
    Some(Position::new(scene_index, last))
}

/// Find the next position a cursor may rest on, walking in `direction`.
///
/// With `honor_skip` set, steps marked `skipNavigation` are stepped over.
pub(crate) fn seek(
    quest: &Quest,
    from: Position,
    direction: Direction,
    honor_skip: bool,
) -> Option<Position> {
    let advance = |position| match direction {
        Direction::Forward => successor(quest, position),
        Direction::Backward => predecessor(quest, position),
    };

    let mut candidate = advance(from)?;
    loop {
        let skipped = honor_skip
            && quest
                .step(candidate)
                .map(|step| step.skip_navigation)
                .unwrap_or(false);
        if !skipped {
            return Some(candidate);
        }
        candidate = advance(candidate)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::linear_quest;
    use quest_script::{DialogStep, Scene, SceneKind};

    #[test]
    fn test_cursor_rejects_out_of_range() {
        let quest = linear_quest(&[2, 1]);

        assert!(Cursor::new(&quest, Position::new(1, 0)).is_ok());
        assert!(matches!(
            Cursor::new(&quest, Position::new(1, 1)),
            Err(EngineError::PositionOutOfRange { .. })
        ));
        assert!(matches!(
            Cursor::new(&quest, Position::new(2, 0)),
            Err(EngineError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_seek_crosses_scenes() {
        let quest = linear_quest(&[2, 1, 3]);

        assert_eq!(
            seek(&quest, Position::new(0, 1), Direction::Forward, true),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            seek(&quest, Position::new(2, 0), Direction::Backward, true),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            seek(&quest, Position::new(1, 0), Direction::Backward, true),
            Some(Position::new(0, 1))
        );
        assert_eq!(seek(&quest, Position::new(2, 2), Direction::Forward, true), None);
        assert_eq!(seek(&quest, Position::new(0, 0), Direction::Backward, true), None);
    }

    #[test]
    fn test_seek_skips_static_steps() {
        let quest = linear_quest(&[1]).with_scene(
            Scene::new(SceneKind::SplitScreenChat)
                .with_step(DialogStep::new().with_skip_navigation())
                .with_step(DialogStep::new()),
        );

        assert_eq!(
            seek(&quest, Position::new(0, 0), Direction::Forward, true),
            Some(Position::new(1, 1))
        );
        assert_eq!(
            seek(&quest, Position::new(1, 1), Direction::Backward, true),
            Some(Position::new(0, 0))
        );
        assert_eq!(
            seek(&quest, Position::new(0, 0), Direction::Forward, false),
            Some(Position::new(1, 0))
        );
    }

    #[test]
    fn test_completion_log_keeps_first_position() {
        let quest = linear_quest(&[3]);
        let mut cursor = Cursor::new(&quest, Position::origin()).unwrap();

        cursor.record_passed("slider-moved");
        cursor.move_to(Position::new(0, 2), Direction::Forward);
        cursor.record_passed("slider-moved");

        assert!(cursor.completion_log().contains("slider-moved"));
        assert_eq!(
            cursor.completion_log().first_passed_at("slider-moved"),
            Some(Position::origin())
        );
        assert_eq!(cursor.completion_log().len(), 1);
    }
}
