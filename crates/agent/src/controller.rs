//! Iterative repair controller: a bounded Thought → Action → Observation loop.
//!
//! The controller owns, per run:
//! - the conversation sent to the backend (append-only),
//! - the current best forest, replaced wholesale when a tool returns a new one,
//! - the reasoning trace and iteration counter.
//!
//! Each iteration makes exactly one backend call. The loop ends when a
//! `Final Answer` passes validation, or when the iteration cap is hit, in which
//! case the current best forest is returned marked [`RepairStatus::Exhausted`].
//! Backend errors are not retried here (see `catalogist_providers::RetryingProvider`)
//! and abort the run.

use catalogist_core::catalog::Forest;
use catalogist_core::message::{Conversation, Message};
use catalogist_core::provider::{Provider, ProviderRequest};
use catalogist_core::tool::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::parser::{self, Directive, Malformed};
use crate::prompt;
use crate::trace::ReasoningTrace;
use crate::transcript::{Transcript, truncate_chars};
use crate::validator;

/// Observation text shown in the transcript is cut to this many characters.
const TRANSCRIPT_OBSERVATION_CHARS: usize = 200;

/// How a repair run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStatus {
    /// A Final Answer passed validation.
    Completed,
    /// The iteration cap was reached; the structure is the last known best.
    Exhausted,
}

/// The result of a repair run.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub status: RepairStatus,
    pub structure: Forest,
    /// Backend calls made.
    pub iterations: usize,
    pub trace: ReasoningTrace,
    pub conversation: Conversation,
}

impl RepairOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RepairStatus::Completed
    }
}

/// Drives the backend through the repair loop.
pub struct RepairController {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: usize,
}

impl RepairController {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: 10,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set max iterations (at least one).
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run the loop on `input`.
    pub async fn run(
        &self,
        input: &Forest,
        transcript: &Transcript,
    ) -> Result<RepairOutcome, catalogist_core::Error> {
        let mut trace = ReasoningTrace::new(self.max_iterations);
        let mut conversation = Conversation::new();
        let mut current: Forest = input.clone();

        let extraction_json = serde_json::to_string_pretty(input)?;
        conversation.push(Message::system(prompt::system_prompt(&self.tools.definitions())));
        conversation.push(Message::user(prompt::task_message(&extraction_json)));

        info!(
            model = %self.model,
            max_iter = self.max_iterations,
            nodes = input.len(),
            "Repair loop starting"
        );
        transcript.line("=".repeat(60));
        transcript.line("Repair loop");
        transcript.line("=".repeat(60));

        while trace.tick() {
            let iteration = trace.iterations;
            debug!(iteration, "Repair iteration");
            transcript.line(format!("\n[iteration {iteration}]"));
            transcript.line("-".repeat(60));

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };
            let response = self.provider.complete(request).await?;
            let text = response.message.content;

            transcript.line(&text);
            trace.add_thought(&text);
            conversation.push(Message::assistant(text.as_str()));

            let follow_up = match parser::parse(&text) {
                Directive::FinalAnswer(nodes) => match accept_final_answer(nodes) {
                    Ok(structure) => {
                        info!(iterations = iteration, nodes = structure.len(), "Repair loop completed");
                        transcript.line(format!("\nFinal Answer accepted (iteration {iteration})"));
                        return Ok(RepairOutcome {
                            status: RepairStatus::Completed,
                            structure,
                            iterations: iteration,
                            trace,
                            conversation,
                        });
                    }
                    Err(errors) => {
                        warn!(iteration, errors = errors.len(), "Final Answer failed validation");
                        transcript.line(format!("Final Answer failed validation:\n{}", errors.join("\n")));
                        let feedback = prompt::validation_feedback(&errors);
                        trace.add_correction(&feedback);
                        feedback
                    }
                },
                Directive::Malformed(Malformed::FinalAnswer { reason }) => {
                    warn!(iteration, %reason, "Final Answer could not be parsed");
                    transcript.line(format!("Final Answer could not be parsed: {reason}"));
                    let feedback = prompt::final_answer_parse_feedback(&reason);
                    trace.add_correction(&feedback);
                    feedback
                }
                Directive::Malformed(Malformed::ActionInput { tool, reason }) => {
                    warn!(iteration, tool = %tool, %reason, "Action Input could not be parsed");
                    transcript.line(format!("Action Input for {tool} could not be parsed: {reason}"));
                    let feedback = prompt::action_input_feedback(&tool, &reason);
                    trace.add_correction(&feedback);
                    feedback
                }
                Directive::Malformed(Malformed::NoDirective) => {
                    warn!(iteration, "Reply had neither an Action nor a Final Answer");
                    transcript.line("No Action found, asking to continue");
                    trace.add_correction(prompt::CONTINUE_MESSAGE);
                    prompt::CONTINUE_MESSAGE.to_string()
                }
                Directive::ToolCall(call) => {
                    let arguments = call.arguments.to_string();
                    transcript.line(format!("\n-> tool: {}", call.name));
                    transcript.line(format!("   input: {arguments}"));
                    trace.add_action(&format!("{}({})", call.name, arguments));

                    let observation = match self.tools.execute(&call, &current).await {
                        Ok(result) => {
                            if let Some(updated) = result.updated_structure {
                                current = updated;
                            }
                            result.output
                        }
                        Err(e) => {
                            debug!(tool = %call.name, error = %e, "Tool call failed");
                            format!("Error: {e}")
                        }
                    };

                    transcript.line(format!(
                        "   result: {}",
                        truncate_chars(&observation, TRANSCRIPT_OBSERVATION_CHARS)
                    ));
                    trace.add_observation(&observation);
                    prompt::observation(&observation)
                }
            };

            conversation.push(Message::user(follow_up));
        }

        warn!(max_iter = self.max_iterations, "Repair loop hit the iteration cap, keeping current structure");
        transcript.line(format!(
            "\nIteration cap ({}) reached, keeping current structure",
            self.max_iterations
        ));

        Ok(RepairOutcome {
            status: RepairStatus::Exhausted,
            structure: current,
            iterations: trace.iterations,
            trace,
            conversation,
        })
    }
}

/// Validate a Final Answer candidate and convert it into typed nodes.
fn accept_final_answer(nodes: Vec<Value>) -> Result<Forest, Vec<String>> {
    let errors = validator::validate_nodes(&nodes);
    if !errors.is_empty() {
        return Err(errors);
    }
    serde_json::from_value(Value::Array(nodes)).map_err(|e| vec![format!("root: {e}")])
}
