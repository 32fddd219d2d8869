//! Scene Script - the quest, its scenes and their dialog steps.
//!
//! A script is pure data produced by content authors. The engine consumes it
//! read-only; nothing here knows about widgets or navigation state.

mod branch;
mod event;
mod step;

pub use branch::*;
pub use event::*;
pub use step::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ScriptError;
use crate::position::Position;

/// Quest identity, e.g. `"similar-triangles"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestSlug(pub String);

impl QuestSlug {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuestSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation kind of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    /// Single speaker, one step at a time.
    #[default]
    OneAtATime,
    /// Two panes with an embedded interactive.
    SplitScreenChat,
    /// Turn-based two-party chat.
    TurnBasedChat,
    /// Terminal screen.
    EndScreen,
}

/// A scene: an ordered list of dialog steps sharing one presentation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: SceneKind,

    #[serde(rename = "dialogs")]
    pub steps: Vec<DialogStep>,
}

impl Scene {
    /// Create an empty scene of the given kind.
    pub fn new(kind: SceneKind) -> Self {
        Self {
            name: None,
            kind,
            steps: Vec::new(),
        }
    }

    /// Set the scene name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a dialog step.
    pub fn with_step(mut self, step: DialogStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Number of dialog steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Object form of a quest file. The other accepted form is a bare scene array.
#[derive(Deserialize)]
struct QuestDocument {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    title: Option<String>,
    scenes: Vec<Scene>,
}

/// A complete quest: an ordered, named sequence of scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub slug: QuestSlug,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub scenes: Vec<Scene>,
}

impl Quest {
    /// Create an empty quest.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: QuestSlug::new(slug),
            title: None,
            scenes: Vec::new(),
        }
    }

    /// Set the quest title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a scene.
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Parse a quest from JSON.
    ///
    /// `default_slug` is used when the document does not name itself. The
    /// result is validated before it is returned.
    pub fn from_json_str(default_slug: &str, json: &str) -> Result<Self, ScriptError> {
        // Pick the shape first so a bad scene reports its own error.
        let quest = match serde_json::from_str::<Value>(json)? {
            Value::Array(scenes) => Self {
                slug: QuestSlug::new(default_slug),
                title: None,
                scenes: serde_json::from_value(Value::Array(scenes))?,
            },
            document @ Value::Object(_) => {
                let QuestDocument {
                    slug,
                    title,
                    scenes,
                } = serde_json::from_value(document)?;
                Self {
                    slug: QuestSlug::new(slug.unwrap_or_else(|| default_slug.to_string())),
                    title,
                    scenes,
                }
            }
            other => {
                return Err(ScriptError::InvalidDocument {
                    found: json_kind(&other),
                })
            }
        };
        quest.validate()?;
        tracing::debug!(
            slug = %quest.slug,
            scenes = quest.scenes.len(),
            steps = quest.total_steps(),
            "Loaded scene script"
        );
        Ok(quest)
    }

    /// Read and parse a quest file; the slug defaults to the file stem.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::from_json_str(stem, &json)
    }

    /// Reject scripts the engine cannot walk.
    pub fn validate(&self) -> Result<(), ScriptError> {
        let result = self.check();
        if let Err(err) = &result {
            tracing::warn!(slug = %self.slug, error = %err, "Rejected scene script");
        }
        result
    }

    fn check(&self) -> Result<(), ScriptError> {
        if self.slug.as_str().is_empty() {
            return Err(ScriptError::EmptySlug);
        }
        if self.scenes.is_empty() {
            return Err(ScriptError::EmptyQuest {
                slug: self.slug.to_string(),
            });
        }

        for (scene_index, scene) in self.scenes.iter().enumerate() {
            if scene.is_empty() {
                return Err(ScriptError::EmptyScene {
                    slug: self.slug.to_string(),
                    scene_index,
                });
            }

            let mut skip_sides = HashSet::new();
            for (dialog_index, step) in scene.steps.iter().enumerate() {
                if step.skip_navigation && !skip_sides.insert(step.side) {
                    let side = match step.side {
                        Some(Side::Left) => "left",
                        Some(Side::Right) => "right",
                        None => "none",
                    };
                    return Err(ScriptError::DuplicateSkipNavigation {
                        scene_index,
                        side: side.to_string(),
                    });
                }

                let root = Position::new(scene_index, dialog_index);
                if let Some(path) = step.branches.iter().find(|path| {
                    path.start > path.end
                        || !self.position_is_valid(path.start)
                        || !self.position_is_valid(path.end)
                }) {
                    return Err(ScriptError::InvalidBranch {
                        root: root.to_string(),
                        path: path.to_string(),
                    });
                }

                if let Some(event_index) = step
                    .events
                    .iter()
                    .position(|e| e.payload.target.trim().is_empty())
                {
                    return Err(ScriptError::EmptyEventTarget {
                        position: root.to_string(),
                        event_index,
                    });
                }
            }
        }

        Ok(())
    }

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Number of dialog steps across all scenes.
    pub fn total_steps(&self) -> usize {
        self.scenes.iter().map(Scene::len).sum()
    }

    /// Get a scene by index.
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Get the step at a position.
    pub fn step(&self, position: Position) -> Option<&DialogStep> {
        self.scenes
            .get(position.scene_index)
            .and_then(|scene| scene.steps.get(position.dialog_index))
    }

    /// Check whether a position addresses an existing step.
    pub fn position_is_valid(&self, position: Position) -> bool {
        self.step(position).is_some()
    }

    /// Last step of the last scene, if the quest has any steps.
    pub fn last_position(&self) -> Option<Position> {
        let scene_index = self.scenes.len().checked_sub(1)?;
        let dialog_index = self.scenes[scene_index].steps.len().checked_sub(1)?;
        Some(Position::new(scene_index, dialog_index))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
