//! Reasoning trace: the Thought / Action / Observation record of one repair run.
//!
//! Kept alongside the conversation so callers can inspect what the agent did
//! without re-parsing the transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub iteration: usize,
    pub kind: TraceKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of reasoning trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Raw backend reply.
    Thought,
    /// Tool invocation, rendered as `name(arguments)`.
    Action,
    /// Tool output or error.
    Observation,
    /// Feedback sent after an unusable reply.
    Correction,
}

/// Ordered trace entries plus the iteration counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub entries: Vec<TraceEntry>,
    pub iterations: usize,
    pub max_iterations: usize,
}

impl ReasoningTrace {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            entries: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    /// Advance the iteration counter. Returns `false` once the cap is reached.
    pub fn tick(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    pub fn add_thought(&mut self, thought: &str) {
        self.push(TraceKind::Thought, thought);
    }

    pub fn add_action(&mut self, action: &str) {
        self.push(TraceKind::Action, action);
    }

    pub fn add_observation(&mut self, observation: &str) {
        self.push(TraceKind::Observation, observation);
    }

    pub fn add_correction(&mut self, correction: &str) {
        self.push(TraceKind::Correction, correction);
    }

    fn push(&mut self, kind: TraceKind, content: &str) {
        self.entries.push(TraceEntry {
            iteration: self.iterations,
            kind,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn count(&self, kind: TraceKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}
