use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use siterank_core::config::{ContributionMode, SiteRankConfig};
use siterank_core::pipeline::{PipelineResult, SiteRankPipeline};
use siterank_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Config file (default: ./siterank.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// "<doc_id>,<site_id>" assignment records
    #[arg(long)]
    pub assignments: Option<PathBuf>,

    /// "<src_doc_id>\t<dst_doc_id>" document edges
    #[arg(long)]
    pub edges: Option<PathBuf>,

    /// "<doc_id>\t<display_url>" root documents
    #[arg(long, conflicts_with = "no_display_urls")]
    pub display_urls: Option<PathBuf>,

    /// Skip the root-document output
    #[arg(long)]
    pub no_display_urls: bool,

    /// Pre-size the document index for this many documents
    #[arg(long)]
    pub expected_documents: Option<usize>,

    /// Pre-size the site arena for this many sites
    #[arg(long)]
    pub expected_sites: Option<usize>,

    /// Directory for idToSiterank.txt and rootIdToSiterank.txt
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Contribution mode: collapsed, document-weighted
    #[arg(long)]
    pub mode: Option<ContributionMode>,

    /// Damping factor in (0, 1)
    #[arg(long)]
    pub damping: Option<f64>,

    /// Give up after this many iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Run the solver on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Number of sites listed in the summary
    #[arg(long)]
    pub top: Option<usize>,

    /// Also write the summary as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl RankArgs {
    /// Applies command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut SiteRankConfig) {
        if let Some(path) = &self.assignments {
            config.input.assignments.clone_from(path);
        }
        if let Some(path) = &self.edges {
            config.input.edges.clone_from(path);
        }
        if let Some(path) = &self.display_urls {
            config.input.display_urls = Some(path.clone());
        }
        if self.no_display_urls {
            config.input.display_urls = None;
        }
        if let Some(documents) = self.expected_documents {
            config.input.expected_documents = documents;
        }
        if let Some(sites) = self.expected_sites {
            config.input.expected_sites = sites;
        }
        if let Some(dir) = &self.output_dir {
            config.output.ranks = rebase(dir, &config.output.ranks);
            config.output.root_ranks = rebase(dir, &config.output.root_ranks);
        }
        if let Some(mode) = self.mode {
            config.solver.mode = mode;
        }
        if let Some(damping) = self.damping {
            config.solver.damping = damping;
        }
        if let Some(max) = self.max_iterations {
            config.solver.max_iterations = max;
        }
        if self.sequential {
            config.solver.parallel = false;
        }
        if let Some(top) = self.top {
            config.report.top_k = top;
        }
        if let Some(path) = &self.summary_json {
            config.output.summary_json = Some(path.clone());
        }
    }
}

/// Keeps the file name of `path` but places it in `dir`.
fn rebase(dir: &Path, path: &Path) -> PathBuf {
    path.file_name().map_or_else(|| dir.to_path_buf(), |name| dir.join(name))
}

pub fn run(args: &RankArgs, quiet: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate().context("Invalid config after command-line overrides")?;

    let reporter: Box<dyn ProgressReporter> = if quiet || args.no_progress || args.json {
        Box::new(NoopReporter)
    } else {
        Box::new(IndicatifReporter::new())
    };

    let result = SiteRankPipeline::new(&config)
        .run(reporter.as_ref())
        .context("Site rank computation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
    } else if !quiet {
        print_result(&result, &config);
    }
    Ok(())
}

fn print_result(result: &PipelineResult, config: &SiteRankConfig) {
    println!("{}", result.summary);
    println!();
    println!(
        "Converged after {} iterations ({} mode, max delta {:.2e}) in {:.2?}",
        result.solve.iterations, result.solve.mode, result.solve.max_delta, result.timings.solve
    );
    println!(
        "Documents: {} assigned, {} duplicate; edges: {} read, {} unresolved, {} same-site",
        result.build.documents_assigned,
        result.build.duplicate_documents,
        result.records.edges_read,
        result.build.unresolved_edges,
        result.build.self_loops
    );
    println!(
        "Wrote {} document ranks to {}",
        result.records.document_ranks_written,
        config.output.ranks.display()
    );
    if let Some(root) = result.records.root_records {
        println!(
            "Wrote {} root records to {} ({} without a site skipped)",
            root.written,
            config.output.root_ranks.display(),
            root.skipped_unknown
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        args: RankArgs,
    }

    fn parse(argv: &[&str]) -> RankArgs {
        Harness::parse_from(std::iter::once("rank").chain(argv.iter().copied())).args
    }

    #[test]
    fn overrides_replace_config_fields() {
        let args = parse(&[
            "--edges",
            "data/links.tsv",
            "--output-dir",
            "results",
            "--mode",
            "document-weighted",
            "--max-iterations",
            "20",
            "--top",
            "3",
            "--sequential",
            "--expected-documents",
            "250000",
        ]);
        let mut config = SiteRankConfig::default();
        args.apply(&mut config);

        assert_eq!(config.input.edges, PathBuf::from("data/links.tsv"));
        assert_eq!(config.input.assignments, PathBuf::from("input/idToSitename.txt"));
        assert_eq!(config.output.ranks, PathBuf::from("results/idToSiterank.txt"));
        assert_eq!(config.output.root_ranks, PathBuf::from("results/rootIdToSiterank.txt"));
        assert_eq!(config.solver.mode, ContributionMode::DocumentWeighted);
        assert_eq!(config.solver.max_iterations, 20);
        assert!(!config.solver.parallel);
        assert_eq!(config.report.top_k, 3);
        assert_eq!(config.input.expected_documents, 250_000);
        assert_eq!(config.input.expected_sites, 0);
    }

    #[test]
    fn capacity_hints_keep_config_values_when_absent() {
        let mut config = SiteRankConfig::default();
        config.input.expected_documents = 1_000;
        config.input.expected_sites = 40;

        parse(&[]).apply(&mut config);
        assert_eq!(config.input.expected_documents, 1_000);
        assert_eq!(config.input.expected_sites, 40);

        parse(&["--expected-sites", "512"]).apply(&mut config);
        assert_eq!(config.input.expected_documents, 1_000);
        assert_eq!(config.input.expected_sites, 512);
    }

    #[test]
    fn display_urls_can_be_disabled() {
        let mut config = SiteRankConfig::default();
        parse(&["--no-display-urls"]).apply(&mut config);
        assert!(config.input.display_urls.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected_by_parser() {
        let result = Harness::try_parse_from(["rank", "--mode", "uniform"]);
        assert!(result.is_err());
    }
}
