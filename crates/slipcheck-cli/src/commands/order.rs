//! The `slipcheck order` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use slipcheck_core::ordering::{order_by_difficulty, DEFAULT_DIFFICULTY};
use slipcheck_core::parser;

use crate::OutputFormat;

#[derive(Serialize)]
struct OrderedQuestion<'a> {
    position: usize,
    id: &'a str,
    difficulty: u8,
}

#[derive(Serialize)]
struct OrderOutput<'a> {
    practice_set: &'a str,
    seed: u32,
    order: Vec<OrderedQuestion<'a>>,
}

pub fn execute(practice_set_path: PathBuf, seed: Option<u32>, format: OutputFormat) -> Result<()> {
    let set = parser::parse_practice_set(&practice_set_path)?;
    let seed = seed.unwrap_or(set.seed);
    let ids = order_by_difficulty(&set.questions, seed);

    let order = ids
        .iter()
        .enumerate()
        .map(|(i, id)| OrderedQuestion {
            position: i + 1,
            id: id.as_str(),
            difficulty: set
                .question(id)
                .and_then(|q| q.difficulty)
                .unwrap_or(DEFAULT_DIFFICULTY),
        })
        .collect();
    let output = OrderOutput {
        practice_set: &set.id,
        seed,
        order,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("Session order for {} (seed {seed}):", set.name);
            for q in &output.order {
                println!("  {:>3}. {} [difficulty {}]", q.position, q.id, q.difficulty);
            }
        }
    }

    Ok(())
}
