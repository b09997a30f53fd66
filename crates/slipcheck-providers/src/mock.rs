//! Mock judge for tests and offline demos.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use slipcheck_core::traits::{
    GenerateRequest, GenerateResponse, JudgeVerdict, LlmProvider, ModelInfo, TokenUsage,
};

/// Reply used when nothing else is configured: every escalation is a misconception.
pub const DEFAULT_VERDICT: &str = r#"{"equivalent": false, "error_class": "misconception", "slip_type": null, "explanation": "The method needs another look."}"#;

/// A mock judge that answers without any network access.
///
/// Replies are matched on a substring of the prompt; the first rule that
/// matches wins, in insertion order.
pub struct MockProvider {
    rules: Vec<(String, String)>,
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with `(prompt substring, reply)` rules.
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self {
            rules,
            default_response: DEFAULT_VERDICT.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same raw reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(vec![])
        }
    }

    /// Create a mock that always returns `verdict` as JSON.
    pub fn with_verdict(verdict: &JudgeVerdict) -> anyhow::Result<Self> {
        Ok(Self::with_fixed_response(&serde_json::to_string(verdict)?))
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        let content = self
            .rules
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate: four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
                estimated_cost_usd: 0.0,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-judge".into(),
            name: "Mock Judge".into(),
            provider: "mock".into(),
            max_context: 100_000,
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
        }]
    }
}
