//! The `slipcheck list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use slipcheck_core::traits::ModelInfo;
use slipcheck_providers::config::{load_config_from, ProviderConfig};
use slipcheck_providers::create_provider;
use slipcheck_providers::ollama::OllamaProvider;

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();

    let mut found_any = false;
    for name in names {
        if provider_filter.as_ref().is_some_and(|filter| filter != name) {
            continue;
        }
        let provider_config = &config.providers[name];

        let models = match provider_config {
            // Installed models are only known by asking the server.
            ProviderConfig::Ollama { base_url } => {
                match OllamaProvider::new(base_url)?.list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        eprintln!("Provider: {name} unavailable: {e:#}");
                        continue;
                    }
                }
            }
            _ => match create_provider(name, provider_config) {
                Ok(provider) => provider.available_models(),
                Err(e) => {
                    eprintln!("Provider: {name} skipped: {e:#}");
                    continue;
                }
            },
        };

        if !models.is_empty() {
            found_any = true;
            println!("Provider: {name}");
            for model in &models {
                print_model(model);
            }
            println!();
        }
    }

    if !found_any {
        println!("No providers configured. Run `slipcheck init` to create a config file.");
    }

    Ok(())
}

fn print_model(model: &ModelInfo) {
    if model.max_context == 0 {
        println!("  {} ({})", model.id, model.name);
    } else {
        println!(
            "  {}: {} ({}K context, ${:.4}/{:.4} per 1K tokens)",
            model.id,
            model.name,
            model.max_context / 1000,
            model.cost_per_1k_input,
            model.cost_per_1k_output,
        );
    }
}
