//! Shared test helpers for controller and orchestrator tests.

use catalogist_core::catalog::{CatalogNode, Forest};
use catalogist_core::error::ProviderError;
use catalogist_core::message::Message;
use catalogist_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Vec<Result<ProviderResponse, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// One text reply per call, in order.
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    /// A provider whose first call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();

        if count >= self.responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                self.responses.len()
            );
        }

        requests.push(request);
        self.responses[count].clone()
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Business and technical modules present, pricing missing.
pub fn sample_forest() -> Forest {
    vec![
        CatalogNode::new("商务标").with_children(vec![
            CatalogNode::new("投标函"),
            CatalogNode::new("法定代表人身份证明"),
        ]),
        CatalogNode::new("技术标").with_children(vec![CatalogNode::new("施工方案")]),
    ]
}
