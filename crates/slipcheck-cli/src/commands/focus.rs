//! The `slipcheck focus` command.

use std::path::PathBuf;

use anyhow::Result;

use slipcheck_core::engine::{AssessmentEngine, AssessmentItem, NoopReporter};
use slipcheck_core::parser;
use slipcheck_core::report::{compute_session_summary, SessionSummary};
use slipcheck_providers::config::load_config_from;

use crate::OutputFormat;

/// Scores use the deterministic layer only. Unresolved answers count as incorrect.
pub async fn execute(
    practice_set_path: PathBuf,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let set = parser::parse_practice_set(&practice_set_path)?;

    let engine_config = config.engine_config(&config.default_model);
    let engine = AssessmentEngine::offline(engine_config);
    let items = AssessmentItem::from_practice_set(&set);
    let outcomes = engine.assess_batch(&items, &NoopReporter).await;
    let session = compute_session_summary(&set, &outcomes, &engine.config().focus);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text | OutputFormat::Markdown => print_session(&set.name, &session),
    }

    Ok(())
}

fn print_session(name: &str, session: &SessionSummary) {
    use comfy_table::{Cell, Table};

    let focus = &session.focus;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Attempts"),
        Cell::new(format!("{}/{} correct", focus.correct_attempts, focus.total_attempts)),
    ]);
    table.add_row(vec![Cell::new("Accuracy"), Cell::new(format!("{}%", focus.accuracy))]);
    table.add_row(vec![Cell::new("Speed"), Cell::new(focus.speed)]);
    table.add_row(vec![
        Cell::new("Avg time"),
        Cell::new(
            focus
                .avg_time_seconds
                .map(|s| format!("{s:.1}s"))
                .unwrap_or_else(|| "-".into()),
        ),
    ]);
    table.add_row(vec![Cell::new("Efficiency rating"), Cell::new(session.rating)]);
    table.add_row(vec![
        Cell::new("First nudge"),
        Cell::new(format!("{}ms", session.thresholds.first_nudge_ms)),
    ]);
    table.add_row(vec![
        Cell::new("Second nudge"),
        Cell::new(format!("{}ms", session.thresholds.second_nudge_ms)),
    ]);
    table.add_row(vec![
        Cell::new("Baseline"),
        Cell::new(format!("{}ms", session.thresholds.baseline_ms)),
    ]);

    println!("Focus session: {name}");
    println!("{table}");
}
