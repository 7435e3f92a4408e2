use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use covdiff::cli::{self, GithubFiles, Inputs};

/// covdiff: Markdown coverage reports from Clover or Cobertura XML, with
/// an optional comparison against a base report.
#[derive(Parser)]
#[command(name = "covdiff", version, about)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the coverage report and apply the fail gates.
    Report {
        #[command(flatten)]
        inputs: Inputs,

        /// Base coverage report to compare against.
        #[arg(long, env = "INPUT_BASE_FILENAME")]
        base: Option<PathBuf>,
    },

    /// Print the parsed snapshot of a coverage file as JSON.
    Parse {
        /// Path to the coverage file.
        file: PathBuf,
    },

    /// Show a plain-text summary of a coverage file.
    Summary {
        /// Path to the coverage file.
        file: PathBuf,
    },

    /// Print the artifact name for a branch or ref.
    ArtifactName {
        /// Branch or ref name substituted for `%name%`.
        name: String,

        #[command(flatten)]
        inputs: Inputs,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Report { inputs, base } => run_report(inputs, base),
        Commands::Parse { file } => {
            print!("{}", cli::cmd_parse(&file)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Summary { file } => {
            print!("{}", cli::cmd_summary(&file)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::ArtifactName { name, inputs } => {
            let config = inputs.into_config().context("Invalid inputs")?;
            print!("{}", cli::cmd_artifact_name(&config, &name));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_report(inputs: Inputs, base: Option<PathBuf>) -> Result<ExitCode> {
    let config = inputs.into_config().context("Invalid inputs")?;
    let outcome = cli::cmd_report(&config, base.as_deref())?;

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    cli::write_outputs(&config, &outcome, &cwd, &GithubFiles::from_env())?;

    print!("{}", outcome.markdown);

    // Each failure was already logged by the gate.
    if outcome.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
