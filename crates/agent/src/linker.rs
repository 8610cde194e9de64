//! Template linker: attaches library templates to catalog leaves.
//!
//! Leaves are visited in pre-order. For each one the backend sees the
//! templates still available plus the leaf's name and description, and
//! answers with the ids that fit. A template links to at most one leaf: once
//! matched it leaves the pool.

use catalogist_core::catalog::{Forest, leaf_paths, node_at_mut};
use catalogist_core::message::Message;
use catalogist_core::provider::{Provider, ProviderRequest};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::transcript::Transcript;

/// Auxiliary node field holding the matched ids.
pub const LINKED_TEMPLATE_IDS: &str = "linked_template_ids";

const LINKER_SYSTEM_PROMPT: &str = "You match entries of a tender response outline to document templates.\n\
     You receive a template library, one `id: name` per line, and a single outline entry.\n\
     Reply with a JSON array of the ids of every template that fits the entry, e.g. [\"12\", \"15\"].\n\
     Reply with N/A when none fits. Reply with nothing else.";

/// One entry of the template library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTemplate {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "template id must be a string or number, found {other}"
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub leaves_visited: usize,
    /// Leaves that received at least one id.
    pub leaves_linked: usize,
    pub templates_remaining: usize,
}

pub struct TemplateLinker {
    provider: Arc<dyn Provider>,
    model: String,
}

impl TemplateLinker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Link every leaf of `forest` in place.
    pub async fn link(
        &self,
        forest: &mut Forest,
        templates: &[LinkTemplate],
        transcript: &Transcript,
    ) -> Result<LinkReport, catalogist_core::Error> {
        let mut pool: Vec<LinkTemplate> = templates.to_vec();
        let mut report = LinkReport::default();

        info!(templates = pool.len(), "Linking templates to catalog leaves");

        for path in leaf_paths(forest) {
            let Some(leaf) = node_at_mut(forest, &path) else {
                continue;
            };
            report.leaves_visited += 1;
            transcript.line(format!("linking: {}", leaf.name));

            let matched = if pool.is_empty() {
                Vec::new()
            } else {
                let request = ProviderRequest {
                    model: self.model.clone(),
                    messages: vec![
                        Message::system(LINKER_SYSTEM_PROMPT),
                        Message::user(leaf_prompt(
                            &pool,
                            &leaf.name,
                            leaf.content_description.as_deref().unwrap_or_default(),
                        )),
                    ],
                    temperature: 0.0,
                    max_tokens: None,
                };
                let reply = self.provider.complete(request).await?.message.content;
                let matched: Vec<String> = parse_reply(&reply)
                    .into_iter()
                    .filter(|id| pool.iter().any(|t| &t.id == id))
                    .fold(Vec::new(), |mut acc, id| {
                        if !acc.contains(&id) {
                            acc.push(id);
                        }
                        acc
                    });
                pool.retain(|t| !matched.contains(&t.id));
                matched
            };

            debug!(leaf = %leaf.name, matched = ?matched, "Leaf linked");
            transcript.line(format!(
                "  -> {}",
                if matched.is_empty() { "none".to_string() } else { matched.join(", ") }
            ));
            if !matched.is_empty() {
                report.leaves_linked += 1;
            }
            leaf.extra.insert(
                LINKED_TEMPLATE_IDS.to_string(),
                Value::Array(matched.into_iter().map(Value::String).collect()),
            );
        }

        report.templates_remaining = pool.len();
        info!(
            visited = report.leaves_visited,
            linked = report.leaves_linked,
            remaining = report.templates_remaining,
            "Template linking finished"
        );
        Ok(report)
    }
}

fn leaf_prompt(pool: &[LinkTemplate], name: &str, description: &str) -> String {
    let library = pool
        .iter()
        .map(|t| format!("{}: {}", t.id, t.name))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Template library:\n---\n{library}\n---\n\n\
         Outline entry:\n---\nname: {name}\ndescription: {description}\n---"
    )
}

/// Ids named by a backend reply, before pool filtering.
fn parse_reply(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(reply) {
        return items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
            .collect();
    }
    if reply.is_empty() || reply.contains("N/A") {
        return Vec::new();
    }
    vec![reply.to_string()]
}
