//! Test doubles and script fixtures shared by the engine's unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use quest_script::{DialogStep, EventPayload, Quest, Scene, SceneKind};
use serde_json::{Map, Value};

use crate::registry::{CompletionFlags, Interaction, InteractionGrade};

/// Widget fake that records every payload it receives.
///
/// Payload fields are merged into `state` (set, never accumulate). A payload
/// carrying `"setFlag": "<condition>"` raises that flag.
#[derive(Debug, Default)]
pub struct RecordingInteraction {
    pub payloads: Vec<EventPayload>,
    pub state: Map<String, Value>,
    pub flags: CompletionFlags,
    pub grade: Option<InteractionGrade>,
}

impl RecordingInteraction {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }
}

impl Interaction for RecordingInteraction {
    fn apply_event(&mut self, payload: &EventPayload) {
        self.payloads.push(payload.clone());
        for (key, value) in &payload.fields {
            self.state.insert(key.clone(), value.clone());
        }
        if let Some(Value::String(condition)) = payload.field("setFlag") {
            self.flags.set(condition.clone(), true);
        }
    }

    fn completion_flags(&self) -> CompletionFlags {
        self.flags.clone()
    }

    fn grade(&self) -> Option<InteractionGrade> {
        self.grade
    }
}

/// A quest of plain, ungated scenes with the given step counts.
pub fn linear_quest(steps_per_scene: &[usize]) -> Quest {
    steps_per_scene
        .iter()
        .fold(Quest::new("linear"), |quest, &count| {
            let scene = (0..count).fold(Scene::new(SceneKind::OneAtATime), |scene, _| {
                scene.with_step(DialogStep::new())
            });
            quest.with_scene(scene)
        })
}
