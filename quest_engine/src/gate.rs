//! Gate Evaluator - decides whether a step may be left forward.
//!
//! Gates fail closed: a condition only opens once the widget it is scoped to
//! is registered and reports the flag as true. A widget that never mounts can
//! never unblock a quest.

use quest_script::{DialogStep, StepGate};
use serde::Serialize;

use crate::registry::InteractionRegistry;

/// Result of evaluating one gate condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateState {
    /// No condition, or the widget reports it true.
    Satisfied,
    /// The widget is live but has not reported the condition as true.
    Unsatisfied,
    /// No widget to ask. Treated as unsatisfied.
    Unresolved,
}

impl GateState {
    /// Whether forward navigation is permitted.
    pub fn is_open(&self) -> bool {
        matches!(self, GateState::Satisfied)
    }
}

/// Every gate of one step with its state.
#[derive(Debug, Clone, Default)]
pub struct StepGateReport {
    pub gates: Vec<(StepGate, GateState)>,
}

impl StepGateReport {
    /// Open only when every gate is satisfied. A step without gates is open.
    pub fn is_open(&self) -> bool {
        self.gates.iter().all(|(_, state)| state.is_open())
    }

    /// The first gate keeping the step closed.
    pub fn blocking(&self) -> Option<&StepGate> {
        self.gates
            .iter()
            .find(|(_, state)| !state.is_open())
            .map(|(gate, _)| gate)
    }

    /// Conditions that evaluated as satisfied.
    pub fn satisfied_conditions(&self) -> impl Iterator<Item = &str> {
        self.gates
            .iter()
            .filter(|(_, state)| state.is_open())
            .map(|(gate, _)| gate.condition.as_str())
    }
}

/// Stateless evaluator reading through the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateEvaluator;

impl GateEvaluator {
    /// Evaluate a condition scoped to the `target` interaction.
    pub fn evaluate(
        condition: Option<&str>,
        target: Option<&str>,
        registry: &InteractionRegistry,
    ) -> GateState {
        let Some(condition) = condition else {
            return GateState::Satisfied;
        };
        let Some(flags) = target.and_then(|name| registry.read_completion_flags(name)) else {
            return GateState::Unresolved;
        };

        if flags.is_set(condition) {
            GateState::Satisfied
        } else {
            GateState::Unsatisfied
        }
    }

    /// Boolean form of [`GateEvaluator::evaluate`].
    pub fn is_satisfied(
        condition: Option<&str>,
        target: Option<&str>,
        registry: &InteractionRegistry,
    ) -> bool {
        Self::evaluate(condition, target, registry).is_open()
    }

    /// Evaluate every gate declared on a step.
    pub fn evaluate_step(step: &DialogStep, registry: &InteractionRegistry) -> StepGateReport {
        let gates = step
            .gates()
            .into_iter()
            .map(|gate| {
                let state =
                    Self::evaluate(Some(&gate.condition), gate.target.as_deref(), registry);
                (gate, state)
            })
            .collect();

        StepGateReport { gates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InteractionHandle;
    use crate::testing::RecordingInteraction;
    use quest_script::{EventDecl, EventPayload, Trigger};

    fn gated_step(condition: &str, target: &str) -> DialogStep {
        DialogStep::new().with_event(EventDecl::new(
            EventPayload::new(target).with_disabled(condition),
            [Trigger::OnNext],
        ))
    }

    #[test]
    fn test_no_condition_is_satisfied() {
        let registry = InteractionRegistry::new();
        assert_eq!(GateEvaluator::evaluate(None, None, &registry), GateState::Satisfied);
        assert!(GateEvaluator::is_satisfied(None, Some("sim"), &registry));
    }

    #[test]
    fn test_unregistered_target_fails_closed() {
        let registry = InteractionRegistry::new();

        let state = GateEvaluator::evaluate(Some("slider-moved"), Some("sim"), &registry);
        assert_eq!(state, GateState::Unresolved);
        assert!(!GateEvaluator::is_satisfied(Some("slider-moved"), Some("sim"), &registry));
    }

    #[test]
    fn test_missing_target_fails_closed() {
        let registry = InteractionRegistry::new();
        assert_eq!(
            GateEvaluator::evaluate(Some("slider-moved"), None, &registry),
            GateState::Unresolved
        );
    }

    #[test]
    fn test_unreported_flag_is_unsatisfied() {
        let mut registry = InteractionRegistry::new();
        let sim = RecordingInteraction::shared();
        let handle: InteractionHandle = sim.clone();
        registry.register("sim", &handle);

        assert_eq!(
            GateEvaluator::evaluate(Some("slider-moved"), Some("sim"), &registry),
            GateState::Unsatisfied
        );

        sim.borrow_mut().flags.set("slider-moved", false);
        assert_eq!(
            GateEvaluator::evaluate(Some("slider-moved"), Some("sim"), &registry),
            GateState::Unsatisfied
        );

        sim.borrow_mut().flags.set("slider-moved", true);
        assert_eq!(
            GateEvaluator::evaluate(Some("slider-moved"), Some("sim"), &registry),
            GateState::Satisfied
        );
    }

    #[test]
    fn test_flag_on_other_widget_does_not_count() {
        let mut registry = InteractionRegistry::new();
        let other = RecordingInteraction::shared();
        other.borrow_mut().flags.set("slider-moved", true);
        let handle: InteractionHandle = other.clone();
        registry.register("other", &handle);

        let report = GateEvaluator::evaluate_step(&gated_step("slider-moved", "sim"), &registry);
        assert!(!report.is_open());
        assert_eq!(report.gates[0].1, GateState::Unresolved);
    }

    #[test]
    fn test_step_report() {
        let mut registry = InteractionRegistry::new();
        let sim = RecordingInteraction::shared();
        let handle: InteractionHandle = sim.clone();
        registry.register("sim", &handle);

        let step = gated_step("slider-moved", "sim").with_disabled("angle-set");

        let report = GateEvaluator::evaluate_step(&step, &registry);
        assert!(!report.is_open());
        assert_eq!(report.blocking().unwrap().condition, "slider-moved");

        sim.borrow_mut().flags.set("slider-moved", true);
        let report = GateEvaluator::evaluate_step(&step, &registry);
        assert_eq!(report.blocking().unwrap().condition, "angle-set");
        assert_eq!(report.satisfied_conditions().collect::<Vec<_>>(), vec!["slider-moved"]);

        sim.borrow_mut().flags.set("angle-set", true);
        assert!(GateEvaluator::evaluate_step(&step, &registry).is_open());
    }

    #[test]
    fn test_ungated_step_is_open() {
        let registry = InteractionRegistry::new();
        let report = GateEvaluator::evaluate_step(&DialogStep::new(), &registry);
        assert!(report.is_open());
        assert!(report.blocking().is_none());
    }
}
