//! The `slipcheck init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("slipcheck.toml").exists() {
        println!("slipcheck.toml already exists, skipping.");
    } else {
        std::fs::write("slipcheck.toml", SAMPLE_CONFIG)?;
        println!("Created slipcheck.toml");
    }

    std::fs::create_dir_all("practice-sets")?;
    let example_path = Path::new("practice-sets/example.toml");
    if example_path.exists() {
        println!("practice-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PRACTICE_SET)?;
        println!("Created practice-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set ANTHROPIC_API_KEY, or point default_provider at ollama");
    println!("  2. Run: slipcheck validate --practice-set practice-sets/example.toml");
    println!("  3. Run: slipcheck assess --practice-set practice-sets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# slipcheck configuration

default_provider = "anthropic"
default_model = "claude-haiku-4-5-20251001"
default_temperature = 0.0
max_tokens = 512
parallelism = 4
output_dir = "./slipcheck-reports"

[focus]
default_target_secs = 35.0

[focus.topic_targets]
# "long division" = 60.0

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[providers.offline]
type = "mock"
"#;

const EXAMPLE_PRACTICE_SET: &str = r#"[practice_set]
id = "example"
name = "Example Practice Set"
description = "A short set to get started"
seed = 1
default_topic = "fractions"

[[questions]]
id = "half-plus-quarter"
prompt = "What is 1/2 + 1/4?"
correct_answer = "3/4"
difficulty = 2

[[questions]]
id = "three-quarters-of-twenty"
prompt = "What is 3/4 of 20?"
correct_answer = "15"
difficulty = 4

[[submissions]]
question_id = "half-plus-quarter"
answer = "2/6"
explanation = "I added the tops and then added the bottoms."
time_ms = 30000

[[submissions]]
question_id = "three-quarters-of-twenty"
answer = "150"
explanation = "A quarter of 20 is 5, so three quarters is 15."
time_ms = 25000
"#;
