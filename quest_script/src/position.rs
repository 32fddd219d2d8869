//! Addressing within a quest: scene/dialog positions and movement direction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ScriptError;

/// A (scene index, dialog index) pair addressing one dialog step.
///
/// Displays as `"{scene}_{dialog}"`, the key used for per-step bookkeeping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub scene_index: usize,
    pub dialog_index: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(scene_index: usize, dialog_index: usize) -> Self {
        Self {
            scene_index,
            dialog_index,
        }
    }

    /// The first step of the first scene.
    pub fn origin() -> Self {
        Self::default()
    }

    /// Check if this is the first step of the first scene.
    pub fn is_origin(&self) -> bool {
        self.scene_index == 0 && self.dialog_index == 0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.scene_index, self.dialog_index)
    }
}

impl FromStr for Position {
    type Err = ScriptError;

    /// Parse a `"{scene}_{dialog}"` key.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || ScriptError::InvalidPosition {
            key: key.to_string(),
        };
        let (scene, dialog) = key.trim().split_once('_').ok_or_else(invalid)?;
        Ok(Self::new(
            scene.parse().map_err(|_| invalid())?,
            dialog.parse().map_err(|_| invalid())?,
        ))
    }
}

impl From<(usize, usize)> for Position {
    fn from((scene_index, dialog_index): (usize, usize)) -> Self {
        Self::new(scene_index, dialog_index)
    }
}

/// Direction of a cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key() {
        assert_eq!(Position::new(3, 1).to_string(), "3_1");
        assert_eq!(Position::new(0, 12).to_string(), "0_12");
    }

    #[test]
    fn test_parse_position_key() {
        assert_eq!("3_1".parse::<Position>().unwrap(), Position::new(3, 1));
        assert_eq!(" 0_12".parse::<Position>().unwrap(), Position::new(0, 12));
        assert!(matches!(
            "3-1".parse::<Position>(),
            Err(ScriptError::InvalidPosition { .. })
        ));
        assert!("3_x".parse::<Position>().is_err());
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(2, 1) > Position::new(2, 0));
        assert!(Position::origin().is_origin());
        assert!(!Position::new(0, 1).is_origin());
    }
}
