//! Event Dispatcher - forwards a step's declared events to their targets.

use quest_script::{DialogStep, Trigger};
use serde::Serialize;

use crate::registry::InteractionRegistry;

/// What happened to the events matched by one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct DispatchReport {
    /// Payloads handed to a live interaction.
    pub delivered: usize,
    /// Payloads whose target was not registered.
    pub absorbed: usize,
}

/// Stateless dispatcher for declared step events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher;

impl EventDispatcher {
    /// Fire every event on `step` whose trigger set contains `trigger`.
    ///
    /// Events aimed at an unregistered interaction are dropped: the widget may
    /// belong to a scene that is not mounted right now.
    pub fn dispatch(
        step: &DialogStep,
        trigger: Trigger,
        registry: &InteractionRegistry,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for event in step.events_for(trigger) {
            if registry.apply_event(event.target(), &event.payload) {
                report.delivered += 1;
            } else {
                tracing::trace!(
                    target_interaction = %event.target(),
                    %trigger,
                    "Absorbed event for unregistered interaction"
                );
                report.absorbed += 1;
            }
        }

        report
    }
}
