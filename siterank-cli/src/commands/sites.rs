use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use siterank_core::io::{self, Records, site_key};

#[derive(Args, Debug)]
pub struct SitesArgs {
    /// "<doc_id>\t<url>" records
    pub urls: PathBuf,

    /// Write assignments here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &SitesArgs) -> anyhow::Result<()> {
    let reader = io::open_input(&args.urls)?;
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(io::create_output(path)?),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut count = 0usize;
    for record in Records::display_urls(reader, io::source_name(&args.urls)) {
        let record = record?;
        let key = site_key(&record.url)?;
        writeln!(writer, "{},{key}", record.doc_id).context("Cannot write site assignments")?;
        count += 1;
    }
    writer.flush().context("Cannot write site assignments")?;

    tracing::info!(records = count, "Site assignments written");
    Ok(())
}
