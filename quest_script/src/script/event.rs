//! Declarative event wiring attached to dialog steps.
//!
//! Events are plain records (target, payload, triggers) rather than callbacks,
//! so scripts stay serializable and the engine interprets them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Navigation actions that can fire a declared event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    #[serde(rename = "on-next")]
    OnNext,
    #[serde(rename = "on-back")]
    OnBack,
    #[serde(rename = "on-submit")]
    OnSubmit,
}

impl Trigger {
    /// Script spelling of the trigger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::OnNext => "on-next",
            Trigger::OnBack => "on-back",
            Trigger::OnSubmit => "on-submit",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload forwarded to the target interaction.
///
/// Only `target` and `disabled` mean anything to the engine; every other key
/// is carried through untouched for the widget to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Name of the interaction that receives this payload.
    pub target: String,

    /// Condition that must be satisfied before leaving the step forward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventPayload {
    /// Create a payload for the given target with no extra fields.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            disabled: None,
            fields: Map::new(),
        }
    }

    /// Attach a gate condition.
    pub fn with_disabled(mut self, condition: impl Into<String>) -> Self {
        self.disabled = Some(condition.into());
        self
    }

    /// Add an arbitrary field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up an arbitrary field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// An event declaration: a payload and the triggers that fire it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecl {
    pub payload: EventPayload,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl EventDecl {
    /// Create an event declaration.
    pub fn new(payload: EventPayload, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        Self {
            payload,
            triggers: triggers.into_iter().collect(),
        }
    }

    /// Whether this event fires on the given trigger.
    pub fn fires_on(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }

    /// Name of the interaction this event steers.
    pub fn target(&self) -> &str {
        &self.payload.target
    }
}
