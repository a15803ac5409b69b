//! Explainability trace — the ordered step record returned with each turn.
//!
//! The trace is rebuilt from scratch every turn and never persisted; it
//! exists so the caller can show why the engine did what it did.

use serde::{Deserialize, Serialize};

/// Kind of a trace step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Thought,
    Action,
    ToolCall,
    Validation,
}

/// One step in the turn's reasoning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub content: String,
}

impl TraceStep {
    pub fn thought(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Thought,
            content: content.into(),
        }
    }

    pub fn action(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Action,
            content: content.into(),
        }
    }

    pub fn tool_call(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::ToolCall,
            content: content.into(),
        }
    }

    pub fn validation(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Validation,
            content: content.into(),
        }
    }
}

/// Ordered trace for a single turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTrace {
    pub steps: Vec<TraceStep>,
}

impl TurnTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = TraceStep>) {
        self.steps.extend(steps);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps of a given kind, in order.
    pub fn of_kind(&self, kind: StepKind) -> impl Iterator<Item = &TraceStep> {
        self.steps.iter().filter(move |s| s.kind == kind)
    }

    /// Whether any step's content contains the given fragment. Test helper
    /// shape, but also used by the CLI's verbose output filter.
    pub fn mentions(&self, fragment: &str) -> bool {
        self.steps.iter().any(|s| s.content.contains(fragment))
    }
}
