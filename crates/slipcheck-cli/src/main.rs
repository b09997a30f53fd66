//! slipcheck CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "slipcheck",
    version,
    about = "Answer assessment and adaptive scoring for math practice"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output format for commands that print a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one answer against its key
    Classify {
        /// The student's answer
        #[arg(long, allow_hyphen_values = true)]
        student: String,

        /// The answer key
        #[arg(long, allow_hyphen_values = true)]
        correct: String,

        /// The student's explanation, used for the coach note
        #[arg(long)]
        explanation: Option<String>,

        /// Output format: text or json
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Assess every submission in a practice set
    Assess {
        /// Path to a practice-set .toml file or directory
        #[arg(long)]
        practice_set: PathBuf,

        /// Judge provider name from the config (default: config default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Judge model (default: config default_model)
        #[arg(long)]
        model: Option<String>,

        /// Never escalate; unexplained answers stay unresolved
        #[arg(long)]
        offline: bool,

        /// Directory for JSON reports (default: config output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Stdout format: text, json or markdown
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the difficulty-ordered session for a practice set
    Order {
        /// Path to a practice-set .toml file
        #[arg(long)]
        practice_set: PathBuf,

        /// Shuffle seed (default: the set's seed)
        #[arg(long)]
        seed: Option<u32>,

        /// Output format: text or json
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Focus scores, efficiency rating and nudge thresholds for a practice set
    Focus {
        /// Path to a practice-set .toml file
        #[arg(long)]
        practice_set: PathBuf,

        /// Output format: text or json
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate practice-set TOML files
    Validate {
        /// Path to practice-set file or directory
        #[arg(long)]
        practice_set: PathBuf,
    },

    /// List judge models for the configured providers
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example practice set
    Init,
}

#[tokio::main]
async fn main() {
    let directive = match "slipcheck=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify {
            student,
            correct,
            explanation,
            format,
        } => commands::classify::execute(student, correct, explanation, format),
        Commands::Assess {
            practice_set,
            provider,
            model,
            offline,
            output,
            format,
            config,
        } => {
            commands::assess::execute(
                practice_set,
                provider,
                model,
                offline,
                output,
                format,
                config,
            )
            .await
        }
        Commands::Order {
            practice_set,
            seed,
            format,
        } => commands::order::execute(practice_set, seed, format),
        Commands::Focus {
            practice_set,
            format,
            config,
        } => commands::focus::execute(practice_set, format, config).await,
        Commands::Validate { practice_set } => commands::validate::execute(practice_set),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
