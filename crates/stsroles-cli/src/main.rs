use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stsroles_core::EngineConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

use commands::operator_roles::{self, OperatorRolesArgs};

#[derive(Parser, Debug)]
#[command(name = "stsroles", version, about = "Provision IAM roles for ROSA STS cluster operators")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "STSROLES_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `stsroles_runtime=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create resources
    Create {
        #[command(subcommand)]
        cmd: CreateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CreateCommand {
    /// Create the IAM roles cluster operators assume through OIDC
    OperatorRoles(OperatorRolesArgs),
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Create {
            cmd: CreateCommand::OperatorRoles(args),
        } => operator_roles::run(args, &config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
