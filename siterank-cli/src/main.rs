use clap::Parser;

use siterank_core::error::{ConfigError, InputError, OutputError, SiteRankError, SolveError};
use siterank_core::graph::GraphError;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "siterank",
    version,
    about = "Compute site-level rank over a crawled document link graph"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into a process exit code.
///
/// Exit codes:
///   0: success
///   1: general/unknown error
///   2: configuration error
///   3: input not found or malformed
///   4: solver invariant violated
///   5: solver did not converge
///   6: output could not be written
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SiteRankError>() {
            return match e {
                SiteRankError::Config(_) => 2,
                SiteRankError::Input(_) => 3,
                SiteRankError::Solve(e) => solve_exit_code(e),
                SiteRankError::Output(_) => 6,
                SiteRankError::Graph(e) => graph_exit_code(e),
            };
        }
        if cause.is::<ConfigError>() {
            return 2;
        }
        if cause.is::<InputError>() {
            return 3;
        }
        if let Some(e) = cause.downcast_ref::<SolveError>() {
            return solve_exit_code(e);
        }
        if cause.is::<OutputError>() {
            return 6;
        }
        if let Some(e) = cause.downcast_ref::<GraphError>() {
            return graph_exit_code(e);
        }
    }

    let lower = format!("{err:#}").to_lowercase();
    if lower.contains("config") {
        2
    } else if lower.contains("cannot read") || lower.contains("not found") {
        3
    } else if lower.contains("cannot write") {
        6
    } else {
        1
    }
}

fn solve_exit_code(err: &SolveError) -> i32 {
    match err {
        SolveError::DidNotConverge { .. } => 5,
        _ => 4,
    }
}

fn graph_exit_code(err: &GraphError) -> i32 {
    match err {
        GraphError::UnknownSite(_) => 3,
        GraphError::Io(_) => 6,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command, cli.quiet) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
