//! critica CLI: critical-thinking analysis from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "critica",
    version,
    about = "Detect cognitive biases and reasoning weaknesses in texts and student answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a reading for biases, fallacies and misinformation
    Document {
        /// Text file to analyze ("-" for stdin)
        input: PathBuf,

        /// Check factual claims against published fact-checks
        #[arg(long)]
        verify: bool,

        /// Language hint for claim lookup (default: es)
        #[arg(long)]
        language: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write the report as JSON to this path
        #[arg(long)]
        save: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Evaluate a student's answer to a reading question
    Answer {
        /// Answer file ("-" for stdin)
        input: PathBuf,

        /// The question the student answered
        #[arg(long)]
        prompt: Option<String>,

        /// literal, inferential, critical or applied
        #[arg(long)]
        question_type: Option<String>,

        /// Source reading, used to check concept coverage
        #[arg(long)]
        source: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace banned vocabulary in generated text
    Sanitize {
        /// Text file ("-" for stdin)
        input: PathBuf,

        /// Comma-separated banned terms
        #[arg(long)]
        banned: Option<String>,

        /// Extra TERM=SUBSTITUTE replacement (repeatable)
        #[arg(long)]
        replace: Vec<String>,

        /// Instruction the text was generated for, checked against --original
        #[arg(long)]
        instruction: Option<String>,

        /// Previous version of the text
        #[arg(long)]
        original: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Split a didactic explanation into its sections
    Parse {
        /// Explanation file ("-" for stdin)
        input: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a sanitized didactic explanation
    Explain {
        /// Topic or question to explain
        prompt: String,

        /// Comma-separated banned terms
        #[arg(long)]
        banned: Option<String>,

        /// Revision instruction, e.g. "amplía el glosario"
        #[arg(long)]
        instruction: Option<String>,

        /// Previous version of the explanation
        #[arg(long)]
        previous: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a report saved with `document --save`
    Show {
        report: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a starter config and a sample reading
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("critica=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Document {
            input,
            verify,
            language,
            format,
            save,
            config,
        } => commands::document::execute(input, verify, language, format, save, config).await,
        Commands::Answer {
            input,
            prompt,
            question_type,
            source,
            format,
        } => commands::answer::execute(input, prompt, question_type, source, format),
        Commands::Sanitize {
            input,
            banned,
            replace,
            instruction,
            original,
            format,
        } => commands::sanitize::execute(input, banned, replace, instruction, original, format),
        Commands::Parse { input, format } => commands::parse::execute(input, format),
        Commands::Explain {
            prompt,
            banned,
            instruction,
            previous,
            format,
            config,
        } => {
            commands::explain::execute(prompt, banned, instruction, previous, format, config).await
        }
        Commands::Show { report, format } => commands::show::execute(report, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
