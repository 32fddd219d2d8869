//! Errors raised while loading or validating a Scene Script.

use thiserror::Error;

/// A Scene Script could not be loaded or is malformed.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read scene script: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scene script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("quest slug must not be empty")]
    EmptySlug,

    #[error("quest '{slug}' has no scenes")]
    EmptyQuest { slug: String },

    #[error("scene {scene_index} of quest '{slug}' has no dialog steps")]
    EmptyScene { slug: String, scene_index: usize },

    #[error("event {event_index} on step {position} has an empty target")]
    EmptyEventTarget { position: String, event_index: usize },

    #[error("scene script must be a scene array or a quest object, found {found}")]
    InvalidDocument { found: &'static str },

    #[error("'{key}' is not a scene_dialog position")]
    InvalidPosition { key: String },

    /// A branch path that is reversed or leaves the quest.
    #[error("branch '{path}' declared on step {root} is out of range")]
    InvalidBranch { root: String, path: String },

    /// More than one `skipNavigation` step shares a side within one scene.
    #[error("scene {scene_index} has more than one skipNavigation step on side {side}")]
    DuplicateSkipNavigation { scene_index: usize, side: String },
}
