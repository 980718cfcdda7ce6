use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use siterank_core::graph::export;
use siterank_core::io;
use siterank_core::pipeline::load_graph;
use siterank_core::progress::NoopReporter;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Config file naming the input records
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only export this site and its direct neighbours
    #[arg(long)]
    pub site: Option<String>,

    /// Write DOT here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ExportArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let loaded = load_graph(&config.input, &NoopReporter)?;

    let digraph = match &args.site {
        Some(site) => export::neighborhood(&loaded.graph, site)?,
        None => export::to_digraph(&loaded.graph),
    };

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(io::create_output(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    export::write_dot(&digraph, writer)?;

    tracing::info!(
        nodes = digraph.node_count(),
        edges = digraph.edge_count(),
        "Site graph exported"
    );
    Ok(())
}
