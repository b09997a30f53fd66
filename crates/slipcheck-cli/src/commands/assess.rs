//! The `slipcheck assess` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use slipcheck_core::engine::{AssessmentEngine, AssessmentOutcome, ProgressReporter};
use slipcheck_core::parser;
use slipcheck_core::report::AssessmentReport;
use slipcheck_core::traits::LlmProvider;
use slipcheck_providers::config::{load_config_from, SlipcheckConfig};
use slipcheck_providers::create_provider;

use crate::OutputFormat;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_escalate(&self, question_id: &str, attempt: u32) {
        eprintln!("  Escalating: {question_id} (attempt {attempt})");
    }

    fn on_outcome(&self, outcome: &AssessmentOutcome) {
        eprintln!(
            "  Done: #{} {} [{}] {}",
            outcome.submission_index + 1,
            outcome.question_id,
            outcome.source,
            outcome.result_label(),
        );
    }

    fn on_error(&self, question_id: &str, error: &str) {
        eprintln!("  ERROR: {question_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, escalated: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {total} submissions, {escalated} escalated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    practice_set_path: PathBuf,
    provider_name: Option<String>,
    model: Option<String>,
    offline: bool,
    output: Option<PathBuf>,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let sets = parser::load_practice_sets(&practice_set_path)?;

    let model = model.unwrap_or_else(|| config.default_model.clone());
    let provider = if offline {
        None
    } else {
        select_provider(&config, provider_name.as_deref())?
    };
    let engine = AssessmentEngine::new(provider, config.engine_config(&model));
    let reporter = ConsoleReporter;
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    for set in &sets {
        eprintln!(
            "slipcheck v{}: assessing {} submissions against {} questions",
            env!("CARGO_PKG_VERSION"),
            set.submissions.len(),
            set.questions.len()
        );
        eprintln!();

        let report = engine.run(set, &reporter).await?;

        print_summary(&report);

        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("report-{}-{timestamp}.json", set.id));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Markdown => println!("{}", report.to_markdown()),
            OutputFormat::Text => print_outcomes(&report),
        }
    }

    Ok(())
}

/// Pick the judge provider.
///
/// An explicit `--provider` must exist in the config. Without one, a missing
/// or unusable default provider falls back to offline assessment.
fn select_provider(
    config: &SlipcheckConfig,
    requested: Option<&str>,
) -> Result<Option<Arc<dyn LlmProvider>>> {
    let name = requested.unwrap_or(config.default_provider.as_str());

    let Some(provider_config) = config.providers.get(name) else {
        if requested.is_some() {
            anyhow::bail!(
                "provider '{name}' not found in config. Available: {:?}",
                config.providers.keys().collect::<Vec<_>>()
            );
        }
        tracing::warn!(provider = name, "default provider not configured, assessing offline");
        return Ok(None);
    };

    match create_provider(name, provider_config) {
        Ok(provider) => Ok(Some(Arc::from(provider))),
        Err(e) if requested.is_none() => {
            tracing::warn!("{e:#}; assessing offline");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn print_summary(report: &AssessmentReport) {
    use comfy_table::{Cell, Table};

    let tally = report.tally();
    let focus = &report.session.focus;

    let mut table = Table::new();
    table.set_header(vec![
        "Set",
        "Correct",
        "Review",
        "Misconception",
        "Pending",
        "Accuracy",
        "Rating",
    ]);
    table.add_row(vec![
        Cell::new(&report.practice_set.name),
        Cell::new(tally.correct),
        Cell::new(tally.review_errors),
        Cell::new(tally.misconceptions),
        Cell::new(tally.unresolved),
        Cell::new(format!("{}%", focus.accuracy)),
        Cell::new(report.session.rating),
    ]);

    eprintln!("\n{table}");
}

fn print_outcomes(report: &AssessmentReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Source", "Result", "Slip", "Coach note"]);
    for o in &report.outcomes {
        table.add_row(vec![
            Cell::new(o.submission_index + 1),
            Cell::new(&o.question_id),
            Cell::new(o.source),
            Cell::new(o.result_label()),
            Cell::new(
                o.slip
                    .slip_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(&o.coach_note.title),
        ]);
    }

    println!("{table}");
}
