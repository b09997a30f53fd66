//! The AI judge contract.
//!
//! When the rule-based classifier can't explain a wrong answer, the engine
//! asks an LLM whether the answer is mathematically equivalent and, if not,
//! whether the mistake is a slip or a misconception. This module defines the
//! provider trait (implemented in `slipcheck-providers`), the prompt the
//! engine sends, and how the reply is read back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::coach::combined_reasoning;
use crate::error::ProviderError;
use crate::model::{Attempt, ErrorClass, SlipType};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that judge escalated answers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send a prompt and return the raw completion.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "claude-haiku-4-5-20251001").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// System prompt; providers fall back to [`JUDGE_SYSTEM_PROMPT`].
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Stop sequences.
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually produced the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub estimated_cost_usd: f64,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
    /// Cost per 1K input tokens in USD.
    pub cost_per_1k_input: f64,
    /// Cost per 1K output tokens in USD.
    pub cost_per_1k_output: f64,
}

// ---------------------------------------------------------------------------
// Judge prompt
// ---------------------------------------------------------------------------

/// System prompt for the answer judge.
pub const JUDGE_SYSTEM_PROMPT: &str = r#"You are a careful math teacher checking one student answer. Decide whether the student's answer is mathematically equivalent to the answer key. If it is not, decide whether the mistake is a superficial slip (the method was right but the final answer was mistyped or miscalculated) or a misconception (the method itself was wrong). Respond ONLY with a JSON object of the form {"equivalent": bool, "error_class": "review_error" | "misconception" | null, "slip_type": "format_typo" | "extra_digit" | "missing_digit" | "extra_zero" | "sign_slip" | "decimal_slip" | "transposed_digits" | "arithmetic_slip" | null, "explanation": string}. The explanation is shown to the student and must not state the correct answer."#;

/// Render the user prompt for one escalated attempt.
pub fn build_judge_prompt(attempt: &Attempt) -> String {
    let mut prompt = format!(
        "Question: {}\nAnswer key: {}\nStudent answer: {}\n",
        attempt.question_prompt.trim(),
        attempt.correct_answer.trim(),
        attempt.student_answer.trim(),
    );
    let reasoning = combined_reasoning(
        attempt.student_explanation.as_deref(),
        &attempt.thinking_log,
    );
    if !reasoning.trim().is_empty() {
        prompt.push_str("Student reasoning:\n");
        prompt.push_str(reasoning.trim());
        prompt.push('\n');
    }
    prompt
}

/// Build the full request the engine hands to a provider.
pub fn build_judge_request(
    attempt: &Attempt,
    model: &str,
    max_tokens: u32,
    temperature: f64,
) -> GenerateRequest {
    GenerateRequest {
        model: model.to_string(),
        prompt: build_judge_prompt(attempt),
        system_prompt: Some(JUDGE_SYSTEM_PROMPT.to_string()),
        max_tokens,
        temperature,
        stop_sequences: vec![],
    }
}

// ---------------------------------------------------------------------------
// Verdict parsing
// ---------------------------------------------------------------------------

/// What the AI judge decided about an escalated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// The answer is mathematically the same as the key (e.g. `0.5` vs `1/2`).
    pub equivalent: bool,
    #[serde(default)]
    pub error_class: Option<ErrorClass>,
    #[serde(default)]
    pub slip_type: Option<SlipType>,
    /// Student-facing explanation.
    #[serde(default)]
    pub explanation: String,
}

/// Pull the JSON object out of an LLM reply.
///
/// Handles:
/// - ```json``` blocks (preferred)
/// - Generic ``` blocks
/// - Bare JSON surrounded by prose (first `{` to last `}`)
pub fn extract_json_block(response: &str) -> Option<String> {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    if let Some(block) = json_blocks.into_iter().chain(generic_blocks).next() {
        return Some(block);
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| response[start..=end].to_string())
}

/// Parse a judge reply into a [`JudgeVerdict`].
pub fn parse_judge_verdict(response: &str) -> Result<JudgeVerdict, ProviderError> {
    let json = extract_json_block(response)
        .ok_or_else(|| ProviderError::MalformedVerdict("no JSON object in reply".into()))?;
    serde_json::from_str(&json).map_err(|e| ProviderError::MalformedVerdict(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ThinkingEntry, ThinkingKind};

    fn attempt() -> Attempt {
        Attempt {
            question_prompt: "What is 1/2 + 1/4?".into(),
            correct_answer: "3/4".into(),
            student_answer: "2/6".into(),
            student_explanation: Some("I added the tops and the bottoms".into()),
            thinking_log: vec![],
        }
    }

    #[test]
    fn prompt_carries_all_fields() {
        let prompt = build_judge_prompt(&attempt());
        assert!(prompt.contains("Question: What is 1/2 + 1/4?"));
        assert!(prompt.contains("Answer key: 3/4"));
        assert!(prompt.contains("Student answer: 2/6"));
        assert!(prompt.contains("I added the tops"));
    }

    #[test]
    fn prompt_prefers_thinking_log() {
        let mut a = attempt();
        a.thinking_log = vec![ThinkingEntry {
            kind: ThinkingKind::Teachback,
            text: "you add across".into(),
            timestamp: 0,
        }];
        let prompt = build_judge_prompt(&a);
        assert!(prompt.contains("Teach-back: you add across"));
        assert!(!prompt.contains("tops and the bottoms"));
    }

    #[test]
    fn prompt_omits_empty_reasoning() {
        let mut a = attempt();
        a.student_explanation = None;
        assert!(!build_judge_prompt(&a).contains("Student reasoning"));
    }

    #[test]
    fn request_uses_judge_system_prompt() {
        let req = build_judge_request(&attempt(), "judge-model", 256, 0.0);
        assert_eq!(req.model, "judge-model");
        assert_eq!(req.system_prompt.as_deref(), Some(JUDGE_SYSTEM_PROMPT));
        assert_eq!(req.max_tokens, 256);
    }

    #[test]
    fn parse_bare_json() {
        let v = parse_judge_verdict(
            r#"{"equivalent": false, "error_class": "misconception", "slip_type": null, "explanation": "Adding across doesn't work."}"#,
        )
        .unwrap();
        assert!(!v.equivalent);
        assert_eq!(v.error_class, Some(ErrorClass::Misconception));
        assert_eq!(v.slip_type, None);
    }

    #[test]
    fn parse_fenced_json_with_prose() {
        let reply = "Here is my verdict:\n\n```json\n{\"equivalent\": true}\n```\nThanks!";
        let v = parse_judge_verdict(reply).unwrap();
        assert!(v.equivalent);
        assert!(v.explanation.is_empty());
    }

    #[test]
    fn parse_prefers_json_over_generic_block() {
        let reply = "```\nnot json\n```\n\n```json\n{\"equivalent\": false, \"error_class\": \"review_error\", \"slip_type\": \"arithmetic_slip\"}\n```";
        let v = parse_judge_verdict(reply).unwrap();
        assert_eq!(v.slip_type, Some(SlipType::ArithmeticSlip));
    }

    #[test]
    fn parse_json_embedded_in_prose() {
        let reply = "Verdict {\"equivalent\": true, \"explanation\": \"same value\"} done";
        assert!(parse_judge_verdict(reply).unwrap().equivalent);
    }

    #[test]
    fn parse_garbage_is_malformed() {
        let err = parse_judge_verdict("I think the student is right.").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedVerdict(_)));

        let err = parse_judge_verdict("{\"equivalent\": \"maybe\"}").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedVerdict(_)));
    }
}
