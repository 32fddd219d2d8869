//! Values widgets report back to the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition name -> satisfied, as reported by one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompletionFlags(BTreeMap<String, bool>);

impl CompletionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag.
    pub fn set(&mut self, condition: impl Into<String>, value: bool) {
        self.0.insert(condition.into(), value);
    }

    /// Builder form of [`CompletionFlags::set`].
    pub fn with(mut self, condition: impl Into<String>, value: bool) -> Self {
        self.set(condition, value);
        self
    }

    /// Reported value, `None` if the widget has not reported it.
    pub fn get(&self, condition: &str) -> Option<bool> {
        self.0.get(condition).copied()
    }

    /// Whether the condition is reported and true.
    pub fn is_set(&self, condition: &str) -> bool {
        self.get(condition).unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for CompletionFlags {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Grading state of a quiz-like widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InteractionGrade {
    pub is_correct: bool,
    pub is_empty: bool,
}

impl InteractionGrade {
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            is_empty: false,
        }
    }

    pub fn incorrect() -> Self {
        Self {
            is_correct: false,
            is_empty: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            is_correct: false,
            is_empty: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_lookup() {
        let flags: CompletionFlags = [("slider-moved", true), ("angle-set", false)]
            .into_iter()
            .collect();

        assert_eq!(flags.get("slider-moved"), Some(true));
        assert_eq!(flags.get("angle-set"), Some(false));
        assert_eq!(flags.get("unknown"), None);
        assert!(flags.is_set("slider-moved"));
        assert!(!flags.is_set("angle-set"));
        assert!(!flags.is_set("unknown"));
    }
}
