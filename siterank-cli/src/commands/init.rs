use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use siterank_core::config::SiteRankConfig;

use super::DEFAULT_CONFIG_FILE;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write siterank.toml into (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, quiet: bool) -> anyhow::Result<()> {
    let target = args.path.join(DEFAULT_CONFIG_FILE);
    if target.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let content = toml::to_string_pretty(&SiteRankConfig::default())
        .context("Cannot serialize default config")?;
    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("Cannot write {}", args.path.display()))?;
    std::fs::write(&target, content)
        .with_context(|| format!("Cannot write {}", target.display()))?;

    if !quiet {
        println!("Wrote {}", target.display());
    }
    Ok(())
}
