//! Interaction Registry - name-keyed, non-owning handles to live widgets.
//!
//! Widgets belong to the presentation layer. The registry only keeps `Weak`
//! references, so a widget that is dropped without unregistering simply stops
//! resolving: events to it are absorbed and its gates stay closed.

mod flags;

pub use flags::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use quest_script::EventPayload;

/// Contract every embedded widget exposes to the engine.
pub trait Interaction {
    /// Apply a declared event payload.
    ///
    /// Must be idempotent under repeated identical payloads: events are re-fired
    /// whenever the learner crosses a step again. Unknown keys are ignored.
    fn apply_event(&mut self, payload: &EventPayload);

    /// Self-reported condition flags. A flag that became true must stay true
    /// until the widget is reset.
    fn completion_flags(&self) -> CompletionFlags;

    /// Grading state for quiz-like widgets. Ungraded widgets return `None`.
    fn grade(&self) -> Option<InteractionGrade> {
        None
    }
}

/// Shared handle the presentation layer owns.
pub type InteractionHandle = Rc<RefCell<dyn Interaction>>;

/// Lookup table of live interactions by declared name.
#[derive(Default)]
pub struct InteractionRegistry {
    entries: HashMap<String, Weak<RefCell<dyn Interaction>>>,
}

impl InteractionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mounted widget, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, handle: &InteractionHandle) {
        let name = name.into();
        tracing::debug!(interaction = %name, "Registered interaction");
        self.entries.insert(name, Rc::downgrade(handle));
    }

    /// Remove a registration. Returns whether the name was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.entries.remove(name).is_some();
        if removed {
            tracing::debug!(interaction = %name, "Unregistered interaction");
        }
        removed
    }

    /// Check if a live widget is registered under the name.
    pub fn is_registered(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Forward a payload to the named widget.
    ///
    /// Returns `false` when nothing live is registered under the name, or the
    /// widget is already borrowed (re-entrant dispatch from inside a widget).
    pub fn apply_event(&self, name: &str, payload: &EventPayload) -> bool {
        let Some(handle) = self.resolve(name) else {
            return false;
        };
        let Ok(mut widget) = handle.try_borrow_mut() else {
            tracing::warn!(interaction = %name, "Interaction busy, event dropped");
            return false;
        };
        widget.apply_event(payload);
        true
    }

    /// Read the named widget's flags. `None` when it cannot be resolved.
    pub fn read_completion_flags(&self, name: &str) -> Option<CompletionFlags> {
        let handle = self.resolve(name)?;
        let widget = handle.try_borrow().ok()?;
        Some(widget.completion_flags())
    }

    /// Read the named widget's grade, if it is graded and resolvable.
    pub fn grade(&self, name: &str) -> Option<InteractionGrade> {
        let handle = self.resolve(name)?;
        let widget = handle.try_borrow().ok()?;
        widget.grade()
    }

    /// Names of all registrations that still resolve, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    fn resolve(&self, name: &str) -> Option<InteractionHandle> {
        self.entries.get(name).and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for InteractionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRegistry")
            .field("registered", &self.registered_names())
            .finish()
    }
}
