//! # certchain CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certchain_cli::commands::{
    run_address, run_commit, run_confirm, run_issue, run_link, run_list, run_publish, run_status,
    run_verify, AddressArgs, CommitArgs, IdArgs, IssueArgs, LinkArgs, ListArgs, OwnedIdArgs,
};
use certchain_cli::config::CertchainConfig;
use certchain_cli::workspace::Workspace;
use certchain_registry::RegistryError;

/// certchain: content-addressed certificates anchored on a ledger.
#[derive(Parser, Debug)]
#[command(name = "certchain", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory override.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the content id of a file.
    Address(AddressArgs),
    /// Compute the commitment for a file and its metadata.
    Commit(CommitArgs),
    /// Upload a certificate, publish it, and wait for confirmation.
    Issue(IssueArgs),
    /// Publish a draft certificate.
    Publish(OwnedIdArgs),
    /// Wait for ledger confirmation of a published certificate.
    Confirm(OwnedIdArgs),
    /// Verify a certificate against its content and the ledger.
    Verify(IdArgs),
    /// Show a certificate and its current status.
    Status(IdArgs),
    /// List an owner's certificates.
    List(ListArgs),
    /// Print the public share link, optionally writing a QR code.
    Link(LinkArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => match cli.verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            if let Some(registry) = e.downcast_ref::<RegistryError>() {
                eprintln!("error: {}", registry.user_message());
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut config = CertchainConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Address(args) => return run_address(args),
        Commands::Commit(args) => return run_commit(args, config.backend),
        _ => {}
    }

    let ws = Workspace::open(config).await?;
    let result = match &cli.command {
        Commands::Issue(args) => run_issue(&ws, args).await,
        Commands::Publish(args) => run_publish(&ws, args).await,
        Commands::Confirm(args) => run_confirm(&ws, args).await,
        Commands::Verify(args) => run_verify(&ws, args).await,
        Commands::Status(args) => run_status(&ws, args).await,
        Commands::List(args) => run_list(&ws, args).await,
        Commands::Link(args) => run_link(&ws, args).await,
        Commands::Address(_) | Commands::Commit(_) => Ok(0),
    };
    ws.save()?;
    result
}
