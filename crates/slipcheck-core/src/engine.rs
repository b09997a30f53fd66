//! Assessment pipeline and batch orchestrator.
//!
//! Each submission goes through the deterministic layer first (exact match,
//! then the slip classifier). Anything the rules can't explain is escalated
//! to the AI judge, with bounded parallelism and retries on transient
//! provider errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::classifier::{classify_answer, slip_message};
use crate::coach::build_coach_note;
use crate::error::ProviderError;
use crate::focus::FocusConfig;
use crate::model::{Attempt, CoachNote, ErrorClass, PracticeSet, SlipVerdict};
use crate::normalize::same_answer;
use crate::report::{compute_session_summary, AssessmentReport, PracticeSetSummary};
use crate::traits::{
    build_judge_request, parse_judge_verdict, JudgeVerdict, LlmProvider, TokenUsage,
};

/// Slip message used when the judge calls a review error without naming the kind.
const UNTYPED_SLIP_MESSAGE: &str = "The method looks right, but the final answer has a slip.";

/// Longest backoff between retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the assessment engine.
#[derive(Debug, Clone)]
pub struct AssessmentEngineConfig {
    /// Maximum concurrent escalations.
    pub parallelism: usize,
    /// Retries on provider errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_delay: Duration,
    /// Judge model identifier.
    pub model: String,
    /// Temperature for the judge.
    pub temperature: f64,
    /// Max tokens for the judge's reply.
    pub max_tokens: u32,
    /// Target times used for the session summary.
    pub focus: FocusConfig,
}

impl Default for AssessmentEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            model: "claude-haiku-4-5-20251001".to_string(),
            temperature: 0.0,
            max_tokens: 512,
            focus: FocusConfig::default(),
        }
    }
}

/// Result of the deterministic layer alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAssessment {
    /// Same answer modulo case and whitespace.
    Correct,
    /// A recognised superficial slip.
    Slip(SlipVerdict),
    /// Needs a judgement the rules can't make.
    Escalate,
}

/// Run the exact-match check and the slip classifier.
pub fn assess_locally(attempt: &Attempt) -> LocalAssessment {
    if same_answer(&attempt.student_answer, &attempt.correct_answer) {
        return LocalAssessment::Correct;
    }
    let verdict = classify_answer(&attempt.student_answer, &attempt.correct_answer);
    if verdict.is_slip {
        LocalAssessment::Slip(verdict)
    } else {
        LocalAssessment::Escalate
    }
}

/// Who decided an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    ExactMatch,
    Rule,
    Ai,
    /// Escalation was needed but no judge answered.
    Unresolved,
}

impl std::fmt::Display for VerdictSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerdictSource::ExactMatch => "exact_match",
            VerdictSource::Rule => "rule",
            VerdictSource::Ai => "ai",
            VerdictSource::Unresolved => "unresolved",
        };
        f.write_str(s)
    }
}

/// One submission to assess.
#[derive(Debug, Clone)]
pub struct AssessmentItem {
    /// Position of the submission in its practice set.
    pub submission_index: usize,
    pub question_id: String,
    pub attempt: Attempt,
}

impl AssessmentItem {
    /// Join every submission in a set to its question.
    ///
    /// Submissions that reference an unknown question are skipped with a warning.
    pub fn from_practice_set(set: &PracticeSet) -> Vec<AssessmentItem> {
        set.submissions
            .iter()
            .enumerate()
            .filter_map(|(index, submission)| {
                let Some(question) = set.question(&submission.question_id) else {
                    tracing::warn!(
                        question_id = %submission.question_id,
                        index,
                        "submission references unknown question, skipping"
                    );
                    return None;
                };
                Some(AssessmentItem {
                    submission_index: index,
                    question_id: question.id.clone(),
                    attempt: Attempt {
                        question_prompt: question.prompt.clone(),
                        correct_answer: question.correct_answer.clone(),
                        student_answer: submission.answer.clone(),
                        student_explanation: submission.explanation.clone(),
                        thinking_log: submission.thinking_log.clone(),
                    },
                })
            })
            .collect()
    }
}

/// The assessed result of a single submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub question_id: String,
    pub submission_index: usize,
    pub source: VerdictSource,
    pub is_correct: bool,
    /// `None` when correct, or when no judge was available.
    pub error_class: Option<ErrorClass>,
    pub slip: SlipVerdict,
    pub coach_note: CoachNote,
    /// The judge's own student-facing explanation, when one answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl AssessmentOutcome {
    /// Short label for tables: `correct`, `review_error`, `misconception` or `pending`.
    pub fn result_label(&self) -> &'static str {
        match (self.is_correct, self.error_class) {
            (true, _) => "correct",
            (false, Some(ErrorClass::ReviewError)) => "review_error",
            (false, Some(ErrorClass::Misconception)) => "misconception",
            (false, None) => "pending",
        }
    }

    fn new(item: &AssessmentItem, source: VerdictSource) -> Self {
        Self {
            question_id: item.question_id.clone(),
            submission_index: item.submission_index,
            source,
            is_correct: false,
            error_class: None,
            slip: SlipVerdict::not_slip(),
            coach_note: CoachNote::default(),
            judge_explanation: None,
            token_usage: None,
        }
    }

    /// Fill in the coach note from the verdict already recorded.
    fn with_coach_note(mut self, attempt: &Attempt) -> Self {
        self.coach_note = build_coach_note(
            attempt.student_explanation.as_deref(),
            &attempt.thinking_log,
            self.is_correct,
            self.error_class,
            self.slip.slip_type,
        );
        self
    }

    fn correct(item: &AssessmentItem) -> Self {
        Self {
            is_correct: true,
            ..Self::new(item, VerdictSource::ExactMatch)
        }
        .with_coach_note(&item.attempt)
    }

    fn slip(item: &AssessmentItem, verdict: SlipVerdict) -> Self {
        Self {
            error_class: Some(ErrorClass::ReviewError),
            slip: verdict,
            ..Self::new(item, VerdictSource::Rule)
        }
        .with_coach_note(&item.attempt)
    }

    /// No judge answered; the coach note treats the answer as a misconception.
    pub fn unresolved(item: &AssessmentItem) -> Self {
        Self::new(item, VerdictSource::Unresolved).with_coach_note(&item.attempt)
    }

    fn judged(item: &AssessmentItem, verdict: JudgeVerdict, usage: TokenUsage) -> Self {
        let mut outcome = Self::new(item, VerdictSource::Ai);
        outcome.token_usage = Some(usage);
        if !verdict.explanation.trim().is_empty() {
            outcome.judge_explanation = Some(verdict.explanation);
        }

        if verdict.equivalent {
            outcome.is_correct = true;
        } else {
            let class = verdict.error_class.unwrap_or(ErrorClass::Misconception);
            outcome.error_class = Some(class);
            if class == ErrorClass::ReviewError {
                outcome.slip = SlipVerdict {
                    is_slip: true,
                    slip_type: verdict.slip_type,
                    message: Some(
                        verdict
                            .slip_type
                            .map(slip_message)
                            .unwrap_or(UNTYPED_SLIP_MESSAGE)
                            .to_string(),
                    ),
                };
            }
        }
        outcome.with_coach_note(&item.attempt)
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_escalate(&self, question_id: &str, attempt: u32);
    fn on_outcome(&self, outcome: &AssessmentOutcome);
    fn on_error(&self, question_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, escalated: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_escalate(&self, _: &str, _: u32) {}
    fn on_outcome(&self, _: &AssessmentOutcome) {}
    fn on_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The assessment engine.
pub struct AssessmentEngine {
    provider: Option<Arc<dyn LlmProvider>>,
    config: AssessmentEngineConfig,
}

impl AssessmentEngine {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: AssessmentEngineConfig) -> Self {
        Self { provider, config }
    }

    /// An engine that never escalates; unexplained answers stay unresolved.
    pub fn offline(config: AssessmentEngineConfig) -> Self {
        Self::new(None, config)
    }

    pub fn config(&self) -> &AssessmentEngineConfig {
        &self.config
    }

    /// Assess one submission, escalating if the rules can't decide.
    pub async fn assess(
        &self,
        item: &AssessmentItem,
        progress: &dyn ProgressReporter,
    ) -> Result<AssessmentOutcome> {
        match assess_locally(&item.attempt) {
            LocalAssessment::Correct => Ok(AssessmentOutcome::correct(item)),
            LocalAssessment::Slip(verdict) => Ok(AssessmentOutcome::slip(item, verdict)),
            LocalAssessment::Escalate => match &self.provider {
                Some(provider) => escalate(provider.as_ref(), &self.config, item, progress).await,
                None => {
                    tracing::debug!(question_id = %item.question_id, "no judge configured");
                    Ok(AssessmentOutcome::unresolved(item))
                }
            },
        }
    }

    /// Assess many submissions with bounded parallelism.
    ///
    /// Outcomes come back in submission order. A submission whose escalation
    /// fails is recorded as unresolved.
    pub async fn assess_batch(
        &self,
        items: &[AssessmentItem],
        progress: &dyn ProgressReporter,
    ) -> Vec<AssessmentOutcome> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for item in items {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => self.assess(item, progress).await,
                    Err(_) => Err(anyhow::anyhow!("semaphore closed")),
                };
                (item, result)
            });
        }

        let mut outcomes = Vec::with_capacity(items.len());
        let mut failed = 0usize;
        while let Some((item, result)) = futures.next().await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("assessment failed for {}: {e:#}", item.question_id);
                    progress.on_error(&item.question_id, &e.to_string());
                    failed += 1;
                    AssessmentOutcome::unresolved(item)
                }
            };
            progress.on_outcome(&outcome);
            outcomes.push(outcome);
        }

        outcomes.sort_by_key(|o| o.submission_index);
        let escalated = outcomes
            .iter()
            .filter(|o| matches!(o.source, VerdictSource::Ai | VerdictSource::Unresolved))
            .count();
        progress.on_batch_complete(items.len(), escalated, failed, start.elapsed());
        outcomes
    }

    /// Assess every submission in a practice set and summarise the session.
    pub async fn run(
        &self,
        set: &PracticeSet,
        progress: &dyn ProgressReporter,
    ) -> Result<AssessmentReport> {
        let start = Instant::now();
        let items = AssessmentItem::from_practice_set(set);
        tracing::info!(
            set = %set.id,
            submissions = items.len(),
            judge = self.provider.as_ref().map(|p| p.name()).unwrap_or("none"),
            "assessing practice set"
        );

        let outcomes = self.assess_batch(&items, progress).await;
        let session = compute_session_summary(set, &outcomes, &self.config.focus);

        Ok(AssessmentReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            practice_set: PracticeSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                question_count: set.questions.len(),
                submission_count: set.submissions.len(),
            },
            judge: self
                .provider
                .as_ref()
                .map(|p| format!("{}/{}", p.name(), self.config.model)),
            outcomes,
            session,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Ask the judge, retrying transient failures with exponential backoff.
async fn escalate(
    provider: &dyn LlmProvider,
    config: &AssessmentEngineConfig,
    item: &AssessmentItem,
    progress: &dyn ProgressReporter,
) -> Result<AssessmentOutcome> {
    let request = build_judge_request(
        &item.attempt,
        &config.model,
        config.max_tokens,
        config.temperature,
    );

    let mut last_error = None;
    let mut retry_delay = config.retry_delay;
    for retry in 0..=config.max_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
        progress.on_escalate(&item.question_id, retry + 1);

        let result = match provider.generate(&request).await {
            Ok(response) => parse_judge_verdict(&response.content)
                .map(|verdict| (verdict, response.token_usage))
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match result {
            Ok((verdict, usage)) => {
                tracing::info!(
                    question_id = %item.question_id,
                    equivalent = verdict.equivalent,
                    error_class = ?verdict.error_class,
                    "judge verdict"
                );
                return Ok(AssessmentOutcome::judged(item, verdict, usage));
            }
            Err(e) => {
                if let Some(provider_err) = e.downcast_ref::<ProviderError>() {
                    if provider_err.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_err.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms);
                    }
                }
                tracing::warn!(
                    question_id = %item.question_id,
                    retry,
                    "judge request failed: {e:#}"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}
