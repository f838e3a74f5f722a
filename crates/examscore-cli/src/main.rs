//! examscore CLI: score sessions and rank contests from exported records.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examscore", version, about = "Exam scoring and contest leaderboards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one participant's session
    Score {
        /// Question bank (.toml or .json)
        #[arg(long)]
        questions: PathBuf,

        /// Response log JSON for the session
        #[arg(long)]
        responses: PathBuf,

        /// Participant identifier
        #[arg(long)]
        participant: String,

        /// Only score this session (default: the session of the log's last record)
        #[arg(long)]
        session: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Save the session report as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rank a contest from its attempt log
    Rank {
        /// Question bank (.toml or .json)
        #[arg(long)]
        questions: PathBuf,

        /// Attempt log JSON
        #[arg(long)]
        attempts: PathBuf,

        /// Contest identifier
        #[arg(long)]
        contest: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank files
    Validate {
        /// Path to a question bank file or directory
        #[arg(long)]
        questions: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two saved session reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Accuracy change treated as significant
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any subject regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config and sample question bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            questions,
            responses,
            participant,
            session,
            format,
            output,
            config,
        } => commands::score::execute(
            questions,
            responses,
            participant,
            session,
            format,
            output,
            config,
        ),
        Commands::Rank {
            questions,
            attempts,
            contest,
            format,
            config,
        } => commands::rank::execute(questions, attempts, contest, format, config),
        Commands::Validate { questions, config } => commands::validate::execute(questions, config),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
