//! Navigation Controller - owns the cursor and walks the learner through a quest.
//!
//! Every command is one synchronous call. A forward move either commits fully
//! (events dispatched, cursor moved) or is rejected with nothing changed:
//! gates are evaluated before any `on-next` event fires, so a blocked `next`
//! leaves every widget exactly as it was.
//!
//! ## Moves
//!
//! 1. **next**: gate check, `on-next` dispatch on the step being left, commit
//! 2. **back**: `on-back` dispatch on the step being left, commit; never gated
//! 3. **submit**: `on-submit` dispatch, then read grades; the cursor stays
//! 4. **jump_to**: validated exact move, recorded so `back` can undo it
//!
//! Leaving the last step of a branch routes to the next unfinished sibling
//! branch, or past the furthest branch once all of them are finished.

mod branching;
mod cursor;
mod progress;

pub use branching::*;
pub use cursor::*;
pub use progress::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use quest_script::{
    DialogStep, Direction, EngineConfig, NavigationConfig, Position, Quest, Scene, Trigger,
};

use crate::dispatcher::EventDispatcher;
use crate::error::EngineError;
use crate::gate::GateEvaluator;
use crate::registry::InteractionRegistry;

/// Unique identifier for a quest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Position,
    pub to: Position,
    pub scene_changed: bool,
    /// The destination scene has a different presentation kind; the host should
    /// hide content until the new layout has mounted.
    pub kind_changed: bool,
}

/// Result of [`QuestSession::next`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextOutcome {
    pub moved: bool,
    /// The cursor rests on the final step.
    pub complete: bool,
    /// Condition that rejected the move.
    pub blocked_by: Option<String>,
    pub transition: Option<Transition>,
    /// Scenes of sibling branches jumped over by this move.
    pub skipped_scenes: usize,
}

/// Result of [`QuestSession::back`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackOutcome {
    pub moved: bool,
    pub transition: Option<Transition>,
}

/// Result of [`QuestSession::submit`]. Both fields are `None` when the step
/// has no registered graded interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub is_correct: Option<bool>,
    pub is_empty: Option<bool>,
}

/// One active walk through a quest.
#[derive(Debug)]
pub struct QuestSession {
    id: SessionId,
    quest: Quest,
    config: NavigationConfig,
    cursor: Cursor,
    registry: InteractionRegistry,
    responses: ResponseLog,
    shared_state: SharedStateLog,
    branches: BranchTracker,
    status: QuestStatus,
}

impl QuestSession {
    /// Start a session at the first step of the first scene.
    pub fn start(quest: Quest, config: &EngineConfig) -> Result<Self, EngineError> {
        Self::start_at(quest, config, Position::origin())
    }

    /// Start a session with the default configuration.
    pub fn with_defaults(quest: Quest) -> Result<Self, EngineError> {
        Self::start(quest, &EngineConfig::default())
    }

    /// Start a session at an explicit position, e.g. a deep link.
    pub fn start_at(
        quest: Quest,
        config: &EngineConfig,
        position: Position,
    ) -> Result<Self, EngineError> {
        quest.validate()?;
        let cursor = Cursor::new(&quest, position)?;
        let branches = BranchTracker::new(&quest);

        let session = Self {
            id: SessionId::new(),
            quest,
            config: config.navigation.clone(),
            cursor,
            registry: InteractionRegistry::new(),
            responses: ResponseLog::default(),
            shared_state: SharedStateLog::default(),
            branches,
            status: QuestStatus::Incomplete,
        };
        tracing::info!(
            session = %session.id,
            quest = %session.quest.slug,
            position = %position,
            "Started quest session"
        );
        Ok(session)
    }

    /// Try to advance one navigable step.
    pub fn next(&mut self) -> NextOutcome {
        let from = self.cursor.position();
        let Some(linear) = self.seek(from, Direction::Forward) else {
            self.mark_completed();
            return NextOutcome {
                moved: false,
                complete: true,
                blocked_by: None,
                transition: None,
                skipped_scenes: 0,
            };
        };

        let report = GateEvaluator::evaluate_step(self.current_step(), &self.registry);
        if let Some(gate) = report.blocking() {
            tracing::debug!(
                session = %self.id,
                position = %from,
                condition = %gate.condition,
                "Forward navigation blocked"
            );
            return NextOutcome {
                moved: false,
                complete: false,
                blocked_by: Some(gate.condition.clone()),
                transition: None,
                skipped_scenes: 0,
            };
        }

        for condition in report.satisfied_conditions() {
            self.cursor.record_passed(condition);
        }
        EventDispatcher::dispatch(self.current_step(), Trigger::OnNext, &self.registry);

        let BranchRoute { to, skipped_scenes } = self.route_forward(from, linear);
        if self.config.track_history {
            self.cursor.push_history(from);
        }
        let transition = self.commit(to, Direction::Forward);

        let complete = self.seek(to, Direction::Forward).is_none();
        if complete {
            self.mark_completed();
        }

        NextOutcome {
            moved: true,
            complete,
            blocked_by: None,
            transition: Some(transition),
            skipped_scenes,
        }
    }

    /// Move back one navigable step, or undo the last recorded move.
    pub fn back(&mut self) -> BackOutcome {
        let from = self.cursor.position();
        if from.is_origin() {
            return BackOutcome {
                moved: false,
                transition: None,
            };
        }

        EventDispatcher::dispatch(self.current_step(), Trigger::OnBack, &self.registry);

        let to = self
            .cursor
            .pop_history()
            .or_else(|| self.seek(from, Direction::Backward))
            .unwrap_or_else(Position::origin);
        let transition = self.commit(to, Direction::Backward);

        BackOutcome {
            moved: true,
            transition: Some(transition),
        }
    }

    /// Fire `on-submit` events and grade the step's interactions.
    pub fn submit(&mut self) -> SubmitOutcome {
        let position = self.cursor.position();
        let step = &self.quest.scenes[position.scene_index].steps[position.dialog_index];

        EventDispatcher::dispatch(step, Trigger::OnSubmit, &self.registry);

        let mut outcome = SubmitOutcome::default();
        for (index, interaction) in step.interactions.iter().enumerate() {
            let Some(grade) = self.registry.grade(&interaction.name) else {
                continue;
            };
            self.responses.record(position, index, &interaction.name, grade);
            outcome.is_correct = Some(outcome.is_correct.unwrap_or(true) && grade.is_correct);
            outcome.is_empty = Some(outcome.is_empty.unwrap_or(false) || grade.is_empty);
        }

        tracing::debug!(
            session = %self.id,
            position = %position,
            is_correct = ?outcome.is_correct,
            is_empty = ?outcome.is_empty,
            "Submitted step"
        );
        outcome
    }

    /// Return to the first step and forget everything observed so far.
    pub fn restart(&mut self) {
        self.cursor.reset();
        self.responses.clear();
        self.shared_state.clear();
        self.branches.reset();
        self.status = QuestStatus::Incomplete;
        tracing::info!(session = %self.id, quest = %self.quest.slug, "Restarted quest session");
    }

    /// Move directly to `position`, e.g. into a branch picked by the learner.
    pub fn jump_to(&mut self, position: Position) -> Result<Transition, EngineError> {
        if !self.quest.position_is_valid(position) {
            return Err(EngineError::PositionOutOfRange {
                slug: self.quest.slug.to_string(),
                position,
            });
        }

        let from = self.cursor.position();
        if self.config.track_history && position != from {
            self.cursor.push_history(from);
        }
        let direction = if position >= from {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let transition = self.commit(position, direction);

        if self.seek(position, Direction::Forward).is_none() {
            self.mark_completed();
        }
        Ok(transition)
    }

    /// Merge state published by a widget on the current step.
    ///
    /// Only interactions declared with `enableStateExchange` may publish.
    /// Returns whether the shared state changed.
    pub fn exchange_state(&mut self, interaction: &str, state: &Map<String, Value>) -> bool {
        let position = self.cursor.position();
        let allowed = self
            .current_step()
            .interactions
            .iter()
            .any(|i| i.name == interaction && i.enable_state_exchange);
        if !allowed {
            tracing::trace!(
                session = %self.id,
                interaction = %interaction,
                position = %position,
                "Ignored state from interaction without state exchange"
            );
            return false;
        }
        self.shared_state.merge(position, state)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    pub fn current_position(&self) -> Position {
        self.cursor.position()
    }

    /// The step under the cursor.
    pub fn current_step(&self) -> &DialogStep {
        let position = self.cursor.position();
        &self.quest.scenes[position.scene_index].steps[position.dialog_index]
    }

    /// The scene under the cursor.
    pub fn current_scene(&self) -> &Scene {
        &self.quest.scenes[self.cursor.position().scene_index]
    }

    pub fn last_direction(&self) -> Direction {
        self.cursor.direction()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn completion_log(&self) -> &CompletionLog {
        self.cursor.completion_log()
    }

    pub fn progress(&self) -> Progress {
        Progress::at(self.cursor.position(), self.quest.scene_count())
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn responses(&self) -> &ResponseLog {
        &self.responses
    }

    pub fn shared_state(&self) -> &SharedStateLog {
        &self.shared_state
    }

    pub fn branches(&self) -> &BranchTracker {
        &self.branches
    }

    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    /// Mutable registry access for widget mount/unmount.
    pub fn registry_mut(&mut self) -> &mut InteractionRegistry {
        &mut self.registry
    }

    fn seek(&self, from: Position, direction: Direction) -> Option<Position> {
        cursor::seek(
            &self.quest,
            from,
            direction,
            self.config.honor_skip_navigation,
        )
    }

    /// Redirect a forward move that leaves the last step of a branch.
    fn route_forward(&mut self, from: Position, linear: Position) -> BranchRoute {
        let direct = BranchRoute {
            to: linear,
            skipped_scenes: 0,
        };
        let Some((branch, replayed)) = self.branches.complete_at(from) else {
            return direct;
        };

        if let Some(start) = self.branches.next_open(branch.point).map(|path| path.start) {
            tracing::debug!(session = %self.id, from = %from, to = %start, "Entering next branch");
            return BranchRoute {
                to: start,
                skipped_scenes: 0,
            };
        }

        let Some(highest) = self.branches.map().highest_end(branch.point) else {
            return direct;
        };
        match self.seek(highest, Direction::Forward) {
            Some(after) => {
                let skipped_scenes = if replayed {
                    self.branches.map().sibling_scene_count(branch)
                } else {
                    0
                };
                tracing::debug!(
                    session = %self.id,
                    from = %from,
                    to = %after,
                    skipped_scenes,
                    "All branches finished"
                );
                BranchRoute {
                    to: after,
                    skipped_scenes,
                }
            }
            None => BranchRoute {
                to: highest,
                skipped_scenes: 0,
            },
        }
    }

    fn commit(&mut self, to: Position, direction: Direction) -> Transition {
        let from = self.cursor.position();
        let scene_changed = from.scene_index != to.scene_index;
        let kind_changed = self.quest.scenes[from.scene_index].kind
            != self.quest.scenes[to.scene_index].kind;

        self.cursor.move_to(to, direction);
        tracing::debug!(
            session = %self.id,
            from = %from,
            to = %to,
            ?direction,
            "Moved cursor"
        );

        Transition {
            from,
            to,
            scene_changed,
            kind_changed,
        }
    }

    fn mark_completed(&mut self) {
        if self.status != QuestStatus::Completed {
            self.status = QuestStatus::Completed;
            tracing::info!(session = %self.id, quest = %self.quest.slug, "Quest completed");
        }
    }
}
