pub mod export;
pub mod init;
pub mod rank;
pub mod sites;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use siterank_core::config::SiteRankConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "siterank.toml";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default siterank.toml
    Init(init::InitArgs),
    /// Build the site graph, solve ranks, and write rank files
    Rank(rank::RankArgs),
    /// Convert "<doc_id>\t<url>" lines into "<doc_id>,<site_key>" assignments
    Sites(sites::SitesArgs),
    /// Export the site graph (or one site's neighbourhood) as Graphviz DOT
    Export(export::ExportArgs),
}

pub fn run(cmd: Command, quiet: bool) -> anyhow::Result<()> {
    match cmd {
        Command::Init(args) => init::run(&args, quiet),
        Command::Rank(args) => rank::run(&args, quiet),
        Command::Sites(args) => sites::run(&args),
        Command::Export(args) => export::run(&args),
    }
}

/// Loads `explicit`, else `./siterank.toml` when present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<SiteRankConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !local.exists() {
                tracing::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                return Ok(SiteRankConfig::default());
            }
            local
        }
    };
    tracing::info!(path = %path.display(), "Loading config");
    SiteRankConfig::load(&path).with_context(|| format!("Cannot load config: {}", path.display()))
}
