//! Compensation orchestrator: chooses between the default-template fallback
//! and the repair loop.
//!
//! An unusable extraction (absent, not a list, empty, or not readable as
//! catalog nodes) is answered with the three default module templates without
//! contacting the backend. Anything else goes through [`RepairController`].

use catalogist_config::AppConfig;
use catalogist_core::catalog::{Forest, ModuleType, count_nodes};
use catalogist_core::provider::Provider;
use catalogist_core::tool::ToolRegistry;
use catalogist_tools::{DefaultTemplateProvider, TemplateLibrary, default_registry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::controller::{RepairController, RepairStatus};
use crate::transcript::Transcript;

/// Where the compensated structure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationSource {
    DefaultTemplate,
    Agent,
}

impl CompensationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationSource::DefaultTemplate => "default_template",
            CompensationSource::Agent => "agent",
        }
    }
}

impl std::fmt::Display for CompensationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompensationResult {
    pub compensated_structure: Forest,
    pub source: CompensationSource,
    /// `false` when the repair loop hit its iteration cap.
    pub complete: bool,
    /// Backend calls made; 0 for the default-template path.
    pub iterations: usize,
    pub log: Vec<String>,
}

/// Model parameters for the repair loop.
#[derive(Debug, Clone)]
pub struct CompensationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_iterations: usize,
}

impl Default for CompensationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: 10,
        }
    }
}

impl CompensationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            max_iterations: config.compensation.max_iterations,
        }
    }
}

pub struct CompensationOrchestrator {
    controller: RepairController,
    templates: DefaultTemplateProvider,
}

impl CompensationOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        templates: DefaultTemplateProvider,
        settings: &CompensationSettings,
    ) -> Self {
        let controller = RepairController::new(provider, tools, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_max_iterations(settings.max_iterations);
        Self {
            controller,
            templates,
        }
    }

    /// Wire the standard tool registry over a shared template library.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>, library: Arc<TemplateLibrary>) -> Self {
        let tools = Arc::new(default_registry(library.clone()));
        Self::new(
            provider,
            tools,
            DefaultTemplateProvider::new(library),
            &CompensationSettings::from_config(config),
        )
    }

    pub async fn run(
        &self,
        extraction: Option<&Value>,
        transcript: &Transcript,
    ) -> Result<CompensationResult, catalogist_core::Error> {
        let mut log = Vec::new();

        let forest = match read_extraction(extraction) {
            Ok(forest) => forest,
            Err(reason) => {
                warn!(%reason, "Extraction unusable, falling back to default templates");
                log.push(format!("{reason}, using default templates"));
                transcript.line(format!("{reason}, using default templates"));
                return Ok(self.default_result(log));
            }
        };

        info!(
            top_level = forest.len(),
            total = count_nodes(&forest),
            "Compensating extracted catalog"
        );
        log.push(format!(
            "extraction has {} top-level nodes ({} total), starting repair loop",
            forest.len(),
            count_nodes(&forest)
        ));

        let outcome = self.controller.run(&forest, transcript).await?;
        let complete = outcome.status == RepairStatus::Completed;
        log.push(match outcome.status {
            RepairStatus::Completed => format!("repair completed after {} iterations", outcome.iterations),
            RepairStatus::Exhausted => format!(
                "iteration cap of {} reached, keeping the last good structure",
                self.controller.max_iterations()
            ),
        });
        log.push(format!(
            "{} tool calls, {} corrections",
            outcome.trace.count(crate::trace::TraceKind::Action),
            outcome.trace.count(crate::trace::TraceKind::Correction)
        ));

        Ok(CompensationResult {
            compensated_structure: outcome.structure,
            source: CompensationSource::Agent,
            complete,
            iterations: outcome.iterations,
            log,
        })
    }

    fn default_result(&self, mut log: Vec<String>) -> CompensationResult {
        let structure: Forest = ModuleType::ALL
            .iter()
            .map(|module| self.templates.template_for(*module).template)
            .collect();
        log.push(format!("added {} default module templates", structure.len()));
        info!(modules = structure.len(), "Using default templates");

        CompensationResult {
            compensated_structure: structure,
            source: CompensationSource::DefaultTemplate,
            complete: true,
            iterations: 0,
            log,
        }
    }
}

fn read_extraction(extraction: Option<&Value>) -> Result<Forest, String> {
    let Some(value) = extraction else {
        return Err("no extraction result".into());
    };
    let Some(nodes) = value.as_array() else {
        return Err("extraction result is not a list".into());
    };
    if nodes.is_empty() {
        return Err("extraction result is empty".into());
    }
    serde_json::from_value(value.clone()).map_err(|e| format!("extraction result is unreadable ({e})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use catalogist_core::catalog::Category;
    use serde_json::json;

    fn orchestrator(provider: Arc<SequentialMockProvider>) -> CompensationOrchestrator {
        let library = Arc::new(TemplateLibrary::builtin().unwrap());
        CompensationOrchestrator::from_config(&AppConfig::default(), provider, library)
    }

    #[tokio::test]
    async fn empty_extraction_uses_default_templates() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[]));
        let result = orchestrator(provider.clone())
            .run(Some(&json!([])), &Transcript::none())
            .await
            .unwrap();

        assert_eq!(result.source, CompensationSource::DefaultTemplate);
        assert!(result.complete);
        assert_eq!(result.iterations, 0);
        let names: Vec<&str> = result.compensated_structure.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["商务标", "技术标", "报价表"]);
        assert_eq!(result.compensated_structure[2].category, Category::Pricing);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn unusable_extractions_fall_back() {
        for extraction in [None, Some(json!({"name": "x"})), Some(json!([1, 2])), Some(json!("text"))] {
            let provider = Arc::new(SequentialMockProvider::from_texts(&[]));
            let result = orchestrator(provider.clone())
                .run(extraction.as_ref(), &Transcript::none())
                .await
                .unwrap();
            assert_eq!(result.source, CompensationSource::DefaultTemplate);
            assert_eq!(result.compensated_structure.len(), 3);
            assert_eq!(provider.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn immediate_final_answer_is_agent_result() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "Final Answer: [{\"name\":\"Root\"}]",
        ]));
        let result = orchestrator(provider)
            .run(Some(&json!([{"name": "商务标"}])), &Transcript::none())
            .await
            .unwrap();

        assert_eq!(result.source, CompensationSource::Agent);
        assert_eq!(result.source.to_string(), "agent");
        assert!(result.complete);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.compensated_structure.len(), 1);
        assert_eq!(result.compensated_structure[0].name, "Root");
    }

    #[tokio::test]
    async fn tool_call_then_final_answer() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "Thought: 商务标 is business.\nAction: update_node_category\nAction Input: {\"node_path\": \"root/商务标\", \"category\": \"business\"}",
            "Thought: done.\nFinal Answer: [{\"name\": \"商务标\", \"category\": \"business\", \"children\": [{\"name\": \"投标函\", \"category\": \"business\"}]}]",
        ]));
        let extraction = json!([{"name": "商务标", "children": [{"name": "投标函"}]}]);
        let result = orchestrator(provider.clone())
            .run(Some(&extraction), &Transcript::none())
            .await
            .unwrap();

        assert!(result.complete);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.compensated_structure[0].children[0].category, Category::Business);
        let requests = provider.requests();
        let observation = &requests[1].messages.last().unwrap().content;
        assert!(observation.contains("Marked node '商务标' and its children as business"));
        assert!(result.log.iter().any(|l| l == "1 tool calls, 0 corrections"));
    }

    #[tokio::test]
    async fn exhausted_run_is_incomplete() {
        let replies = vec!["I am not sure."; 10];
        let provider = Arc::new(SequentialMockProvider::from_texts(&replies));
        let extraction = json!([{"name": "技术标", "content_description": "方案", "id": 7}]);
        let result = orchestrator(provider)
            .run(Some(&extraction), &Transcript::none())
            .await
            .unwrap();

        assert_eq!(result.source, CompensationSource::Agent);
        assert!(!result.complete);
        assert_eq!(result.iterations, 10);
        let unchanged: Forest = serde_json::from_value(extraction).unwrap();
        assert_eq!(result.compensated_structure, unchanged);
        assert_eq!(result.compensated_structure[0].extra["id"], json!(7));
    }

    #[test]
    fn result_serializes_source_snake_case() {
        let result = CompensationResult {
            compensated_structure: Vec::new(),
            source: CompensationSource::DefaultTemplate,
            complete: true,
            iterations: 0,
            log: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "default_template");
        assert_eq!(json["compensated_structure"], json!([]));
    }
}
