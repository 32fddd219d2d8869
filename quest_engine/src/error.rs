//! Engine error types.
//!
//! Only fatal conditions live here. Blocked navigation and absorbed events are
//! ordinary outcomes and never surface as errors.

use quest_script::{Position, ScriptError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The quest cannot be walked: no scenes, an empty scene, and so on.
    #[error("malformed scene script: {0}")]
    MalformedScript(#[from] ScriptError),

    /// A cursor was requested outside the quest's bounds.
    #[error("position {position} is outside quest '{slug}'")]
    PositionOutOfRange { slug: String, position: Position },
}
