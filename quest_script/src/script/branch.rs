//! Branches - alternative step ranges offered by a choice step.
//!
//! A choice step declares its branches as inclusive `"{start},{end}"` ranges,
//! e.g. `"1_0,2_3"`. The learner walks every branch of a choice before the
//! quest continues after the furthest of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Quest;
use crate::error::ScriptError;
use crate::position::Position;

/// An inclusive range of steps forming one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchPath {
    pub start: Position,
    pub end: Position,
}

impl BranchPath {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Number of scenes the branch touches.
    pub fn scene_span(&self) -> usize {
        self.end.scene_index.saturating_sub(self.start.scene_index) + 1
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

impl FromStr for BranchPath {
    type Err = ScriptError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let (start, end) = path
            .split_once(',')
            .ok_or_else(|| ScriptError::InvalidPosition {
                key: path.to_string(),
            })?;
        Ok(Self::new(start.parse::<Position>()?, end.parse::<Position>()?))
    }
}

impl TryFrom<String> for BranchPath {
    type Error = ScriptError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        path.parse()
    }
}

impl From<BranchPath> for String {
    fn from(path: BranchPath) -> Self {
        path.to_string()
    }
}

/// A choice step and the branches it offers, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPoint {
    pub root: Position,
    pub branches: Vec<BranchPath>,
}

/// Address of one branch inside a [`BranchMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchRef {
    pub point: usize,
    pub branch: usize,
}

/// Every branch point of a quest plus the branch each step belongs to.
///
/// When branches overlap, the one declared last claims the shared steps.
#[derive(Debug, Clone, Default)]
pub struct BranchMap {
    points: Vec<BranchPoint>,
    members: BTreeMap<Position, BranchRef>,
}

impl BranchMap {
    /// Collect the branch points declared on the quest's steps.
    pub fn from_quest(quest: &Quest) -> Self {
        let mut map = Self::default();

        for (scene_index, scene) in quest.scenes.iter().enumerate() {
            for (dialog_index, step) in scene.steps.iter().enumerate() {
                if step.branches.is_empty() {
                    continue;
                }

                let mut branches: Vec<BranchPath> = Vec::new();
                for path in &step.branches {
                    if !branches.contains(path) {
                        branches.push(*path);
                    }
                }

                let point = map.points.len();
                for (branch, path) in branches.iter().enumerate() {
                    for position in steps_between(quest, path) {
                        map.members.insert(position, BranchRef { point, branch });
                    }
                }
                map.points.push(BranchPoint {
                    root: Position::new(scene_index, dialog_index),
                    branches,
                });
            }
        }

        map
    }

    pub fn points(&self) -> &[BranchPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&BranchPoint> {
        self.points.get(index)
    }

    pub fn path(&self, branch: BranchRef) -> Option<&BranchPath> {
        self.points.get(branch.point)?.branches.get(branch.branch)
    }

    /// The branch a step belongs to.
    pub fn locate(&self, position: Position) -> Option<BranchRef> {
        self.members.get(&position).copied()
    }

    /// The branch whose last step is `position`.
    pub fn ending_at(&self, position: Position) -> Option<BranchRef> {
        let branch = self.locate(position)?;
        (self.path(branch)?.end == position).then_some(branch)
    }

    /// The furthest end among a point's branches.
    pub fn highest_end(&self, point: usize) -> Option<Position> {
        self.points
            .get(point)?
            .branches
            .iter()
            .map(|path| path.end)
            .max()
    }

    /// Scenes spanned by the sibling branches of `branch`.
    pub fn sibling_scene_count(&self, branch: BranchRef) -> usize {
        self.points
            .get(branch.point)
            .map(|point| {
                point
                    .branches
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != branch.branch)
                    .map(|(_, path)| path.scene_span())
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// Steps covered by `path`, in reading order. Missing scenes are skipped.
fn steps_between(quest: &Quest, path: &BranchPath) -> Vec<Position> {
    let mut positions = Vec::new();
    for scene_index in path.start.scene_index..=path.end.scene_index {
        let Some(last) = quest
            .scene(scene_index)
            .and_then(|scene| scene.len().checked_sub(1))
        else {
            continue;
        };
        let first = if scene_index == path.start.scene_index {
            path.start.dialog_index
        } else {
            0
        };
        let last = if scene_index == path.end.scene_index {
            path.end.dialog_index.min(last)
        } else {
            last
        };
        positions.extend((first..=last).map(|dialog| Position::new(scene_index, dialog)));
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{DialogStep, Scene, SceneKind};

    fn choice_quest() -> Quest {
        let scene = |steps: usize| {
            (0..steps).fold(Scene::new(SceneKind::OneAtATime), |scene, _| {
                scene.with_step(DialogStep::new())
            })
        };
        Quest::new("choice")
            .with_scene(
                Scene::new(SceneKind::OneAtATime).with_step(
                    DialogStep::new()
                        .with_branch(BranchPath::new(Position::new(1, 0), Position::new(1, 1)))
                        .with_branch(BranchPath::new(Position::new(2, 0), Position::new(3, 0)))
                        .with_branch(BranchPath::new(Position::new(1, 0), Position::new(1, 1))),
                ),
            )
            .with_scene(scene(2))
            .with_scene(scene(1))
            .with_scene(scene(1))
            .with_scene(scene(1))
    }

    #[test]
    fn test_parse_branch_path() {
        let path: BranchPath = "1_0,2_3".parse().unwrap();
        assert_eq!(path, BranchPath::new(Position::new(1, 0), Position::new(2, 3)));
        assert_eq!(path.to_string(), "1_0,2_3");
        assert_eq!(path.scene_span(), 2);
        assert!("1_0".parse::<BranchPath>().is_err());
        assert!("1_0,two".parse::<BranchPath>().is_err());
    }

    #[test]
    fn test_map_locates_branch_members() {
        let map = BranchMap::from_quest(&choice_quest());

        assert_eq!(map.points().len(), 1);
        assert_eq!(map.points()[0].root, Position::origin());
        assert_eq!(map.points()[0].branches.len(), 2);

        let second = BranchRef { point: 0, branch: 1 };
        let first = BranchRef { point: 0, branch: 0 };
        assert_eq!(map.locate(Position::new(1, 1)), Some(first));
        assert_eq!(map.locate(Position::new(2, 0)), Some(second));
        assert_eq!(map.locate(Position::new(3, 0)), Some(second));
        assert_eq!(map.locate(Position::new(4, 0)), None);
        assert_eq!(map.locate(Position::origin()), None);
    }

    #[test]
    fn test_branch_ends_and_spans() {
        let map = BranchMap::from_quest(&choice_quest());
        let first = BranchRef { point: 0, branch: 0 };

        assert_eq!(map.ending_at(Position::new(1, 0)), None);
        assert_eq!(map.ending_at(Position::new(1, 1)), Some(first));
        assert_eq!(map.highest_end(0), Some(Position::new(3, 0)));
        assert_eq!(map.sibling_scene_count(first), 2);
        assert_eq!(map.highest_end(1), None);
    }

    #[test]
    fn test_quest_without_branches() {
        let quest = Quest::new("plain")
            .with_scene(Scene::new(SceneKind::OneAtATime).with_step(DialogStep::new()));
        assert!(BranchMap::from_quest(&quest).is_empty());
    }
}
