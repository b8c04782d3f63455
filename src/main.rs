mod commands;
mod config;
mod context;
mod error;
mod function;
mod logging;
mod manifest;
mod output;
mod secrets;
#[cfg(test)]
mod test_helpers;
mod traits;

use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{DockerfileCommand, RunCommand, RunOptions};
use function::OutputFormat;
use secrets::GCP_SECRET_MANAGER;
use secrets::gcp::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "secret-generator")]
#[command(about = "KRM function that appends a Secret resolved from Google Secret Manager to a ResourceList", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Increase log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct RunArgs {
    /// How secret sources are resolved
    #[arg(long, env = "SECRET_GENERATOR_RESOLVER", default_value = GCP_SECRET_MANAGER)]
    resolver: String,

    /// Timeout in seconds for each Secret Manager request
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Encoding of the ResourceList written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    output_format: OutputFormat,

    /// Secret Manager API base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a Dockerfile for packaging this function as a container image
    Gen {
        /// Directory the Dockerfile is written to
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Gen { dir }) => {
            match DockerfileCommand::execute(&context::Context::new(), &dir) {
                Ok(path) => {
                    output::success(&format!("Wrote {}", path.display()));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    output::error(&format!("{:#}", e));
                    ExitCode::FAILURE
                }
            }
        }
        None => {
            let options = RunOptions {
                resolver: cli.run.resolver,
                endpoint: cli.run.endpoint,
                timeout: Duration::from_secs(cli.run.timeout),
                format: cli.run.output_format,
            };

            match RunCommand::execute(&options) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::debug!(error = ?e, "function failed");
                    output::error(&e.to_string());
                    if matches!(e, error::FunctionError::Transport(_)) {
                        output::hint("Expected a config.kubernetes.io/v1 ResourceList on stdin");
                    }
                    ExitCode::FAILURE
                }
            }
        }
    }
}
