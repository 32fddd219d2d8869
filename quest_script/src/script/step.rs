//! Dialog steps - the smallest navigable unit of a quest.

use serde::{Deserialize, Serialize};

use super::{BranchPath, EventDecl, Trigger};

/// Reference to a named interactive widget and its configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRef {
    pub name: String,
    pub config: String,
    #[serde(default)]
    pub enable_state_exchange: bool,
}

impl InteractionRef {
    pub fn new(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            enable_state_exchange: false,
        }
    }

    /// Let the widget publish its state to the session.
    pub fn with_state_exchange(mut self) -> Self {
        self.enable_state_exchange = true;
        self
    }
}

/// Controls a learner may invoke on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Start,
    Back,
    Next,
    Submit,
}

/// A control declaration; `text` is a translation key for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    #[serde(rename = "type")]
    pub kind: ControlKind,
    #[serde(default)]
    pub text: Option<String>,
}

impl Control {
    pub fn new(kind: ControlKind) -> Self {
        Self { kind, text: None }
    }
}

/// Pane a step belongs to in split-screen scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A completion gate: a symbolic condition scoped to one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGate {
    pub condition: String,
    /// Interaction whose flags decide the condition. `None` never resolves.
    pub target: Option<String>,
}

/// A single dialog step inside a scene.
///
/// Presentation-only fields of the script (heading, body, avatar, audio...)
/// are ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DialogStep {
    #[serde(default)]
    pub interactions: Vec<InteractionRef>,

    #[serde(default)]
    pub events: Vec<EventDecl>,

    #[serde(default)]
    pub controls: Vec<Control>,

    /// Step is shown statically and never becomes the cursor position.
    #[serde(default)]
    pub skip_navigation: bool,

    /// Step-level gate condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,

    /// Branches this step offers as a choice, as `"{start},{end}"` ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchPath>,
}

impl DialogStep {
    /// Create an empty step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interaction reference.
    pub fn with_interaction(mut self, interaction: InteractionRef) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// Add an event declaration.
    pub fn with_event(mut self, event: EventDecl) -> Self {
        self.events.push(event);
        self
    }

    /// Add a control.
    pub fn with_control(mut self, kind: ControlKind) -> Self {
        self.controls.push(Control::new(kind));
        self
    }

    /// Set a step-level gate condition.
    pub fn with_disabled(mut self, condition: impl Into<String>) -> Self {
        self.disabled = Some(condition.into());
        self
    }

    /// Mark the step as skipped by navigation.
    pub fn with_skip_navigation(mut self) -> Self {
        self.skip_navigation = true;
        self
    }

    /// Place the step on a split-screen side.
    pub fn with_branch(mut self, path: BranchPath) -> Self {
        self.branches.push(path);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Events that fire on the given trigger, in declaration order.
    pub fn events_for(&self, trigger: Trigger) -> impl Iterator<Item = &EventDecl> {
        self.events.iter().filter(move |e| e.fires_on(trigger))
    }

    /// Whether the learner may invoke the given control here.
    ///
    /// A step without control declarations offers back and next.
    pub fn allows(&self, kind: ControlKind) -> bool {
        if self.controls.is_empty() {
            return matches!(kind, ControlKind::Back | ControlKind::Next);
        }
        self.controls.iter().any(|c| c.kind == kind)
    }

    /// Gates that must all be satisfied before moving forward past this step.
    ///
    /// Event-level gates come from events fired on `on-next` whose payload
    /// carries `disabled`; they are scoped to that event's target. A step-level
    /// `disabled` is scoped to the first event target, falling back to the first
    /// interaction.
    pub fn gates(&self) -> Vec<StepGate> {
        let mut gates: Vec<StepGate> = self
            .events_for(Trigger::OnNext)
            .filter_map(|event| {
                event.payload.disabled.as_ref().map(|condition| StepGate {
                    condition: condition.clone(),
                    target: Some(event.payload.target.clone()),
                })
            })
            .collect();

        if let Some(condition) = &self.disabled {
            let target = self
                .events
                .first()
                .map(|e| e.payload.target.clone())
                .or_else(|| self.interactions.first().map(|i| i.name.clone()));
            gates.push(StepGate {
                condition: condition.clone(),
                target,
            });
        }

        gates
    }

    /// Whether any gate is declared on this step.
    pub fn is_gated(&self) -> bool {
        self.disabled.is_some()
            || self
                .events_for(Trigger::OnNext)
                .any(|e| e.payload.disabled.is_some())
    }
}
