//! # Quest Engine
//!
//! Runtime side of a quest: walks a learner through the scenes of a
//! [`quest_script::Quest`], fires declared events at embedded widgets and
//! blocks forward navigation until those widgets report the conditions a step
//! is gated on.
//!
//! ## Core Components
//!
//! - **registry**: name-keyed, non-owning handles to live interactive widgets
//! - **dispatcher**: delivers a step's declared events for one trigger
//! - **gate**: fail-closed evaluation of `disabled` conditions
//! - **navigation**: the session, its cursor and learner-facing bookkeeping
//!
//! The engine never owns a widget. The presentation layer keeps the strong
//! handle, registers it on mount and unregisters it on teardown.

pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod navigation;
pub mod registry;

#[cfg(test)]
mod testing;

pub use dispatcher::*;
pub use error::*;
pub use gate::*;
pub use navigation::*;
pub use registry::*;
