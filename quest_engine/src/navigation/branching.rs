//! Branch tracking - which branches of each choice the learner has finished.

use serde::Serialize;
use std::collections::BTreeSet;

use quest_script::{BranchMap, BranchPath, BranchRef, Position, Quest};

/// Where a forward move leaving a step goes once branches are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRoute {
    pub to: Position,
    /// Scenes of sibling branches jumped over when leaving a replayed branch.
    pub skipped_scenes: usize,
}

/// The quest's branch map plus per-session completion.
#[derive(Debug, Clone, Default)]
pub struct BranchTracker {
    map: BranchMap,
    completed: BTreeSet<BranchRef>,
}

impl BranchTracker {
    pub(crate) fn new(quest: &Quest) -> Self {
        Self {
            map: BranchMap::from_quest(quest),
            completed: BTreeSet::new(),
        }
    }

    pub fn map(&self) -> &BranchMap {
        &self.map
    }

    pub fn is_completed(&self, branch: BranchRef) -> bool {
        self.completed.contains(&branch)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// First unfinished branch of a choice, in declaration order.
    pub fn next_open(&self, point: usize) -> Option<&BranchPath> {
        self.map
            .point(point)?
            .branches
            .iter()
            .enumerate()
            .find(|(branch, _)| {
                !self.is_completed(BranchRef {
                    point,
                    branch: *branch,
                })
            })
            .map(|(_, path)| path)
    }

    /// Mark the branch ending at `position` finished.
    ///
    /// Returns the branch and whether it had been finished before.
    pub(crate) fn complete_at(&mut self, position: Position) -> Option<(BranchRef, bool)> {
        let branch = self.map.ending_at(position)?;
        let newly = self.completed.insert(branch);
        Some((branch, !newly))
    }

    pub(crate) fn reset(&mut self) {
        self.completed.clear();
    }
}
