// Pipeline orchestrator: Load → Build → Solve → Report → Write.

use std::io::Write;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use siterank_graph::{BuildStats, DocId, GraphBuilder, SiteGraph};

use crate::config::{InputSection, SiteRankConfig, SolverConfig};
use crate::error::{OutputError, Result};
use crate::io::{self, Records, RootWriteStats};
use crate::progress::ProgressReporter;
use crate::report::RankSummary;
use crate::solver::{RankSolver, SolveOutcome};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub load_assignments: Duration,
    pub load_edges: Duration,
    pub build: Duration,
    pub solve: Duration,
    pub write: Duration,
}

/// Records read and written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordCounts {
    pub assignments_read: usize,
    pub edges_read: usize,
    pub document_ranks_written: usize,
    /// `None` when no display-URL input is configured.
    pub root_records: Option<RootWriteStats>,
}

/// Everything a finished run produced besides the output files.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub build: BuildStats,
    pub solve: SolveOutcome,
    pub summary: RankSummary,
    pub records: RecordCounts,
    pub timings: StageTimings,
    pub finished_at: DateTime<Utc>,
}

/// A site graph built from the configured input files.
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: SiteGraph,
    pub build: BuildStats,
    pub assignments_read: usize,
    pub edges_read: usize,
    pub load_assignments: Duration,
    pub load_edges: Duration,
    pub build_duration: Duration,
}

/// Streams the assignment and edge files into a finalized [`SiteGraph`].
#[instrument(skip_all, name = "load_graph")]
pub fn load_graph(input: &InputSection, progress: &dyn ProgressReporter) -> Result<LoadedGraph> {
    let mut builder = GraphBuilder::with_capacity(input.expected_documents, input.expected_sites);

    let start = Instant::now();
    progress.start("Reading site assignments", None);
    let reader = io::open_input(&input.assignments)?;
    let mut assignments_read = 0;
    for record in Records::assignments(reader, io::source_name(&input.assignments)) {
        let record = record?;
        builder.assign_document(record.doc_id, &record.site_id);
        assignments_read += 1;
        progress.advance(1);
    }
    progress.finish();
    let load_assignments = start.elapsed();
    info!(
        path = %input.assignments.display(),
        records = assignments_read,
        sites = builder.site_count(),
        duration = ?load_assignments,
        "Site assignments loaded"
    );

    let start = Instant::now();
    progress.start("Reading document edges", None);
    let reader = io::open_input(&input.edges)?;
    let mut edges_read = 0;
    for record in Records::edges(reader, io::source_name(&input.edges)) {
        let record = record?;
        builder.add_edge(record.source, record.destination);
        edges_read += 1;
        progress.advance(1);
    }
    progress.finish();
    let load_edges = start.elapsed();
    info!(
        path = %input.edges.display(),
        records = edges_read,
        duration = ?load_edges,
        "Document edges loaded"
    );

    let start = Instant::now();
    let (graph, build) = builder.finalize();
    let build_duration = start.elapsed();

    Ok(LoadedGraph {
        graph,
        build,
        assignments_read,
        edges_read,
        load_assignments,
        load_edges,
        build_duration,
    })
}

/// Runs the whole rank computation for one [`SiteRankConfig`].
#[derive(Debug)]
pub struct SiteRankPipeline<'a> {
    config: &'a SiteRankConfig,
}

impl<'a> SiteRankPipeline<'a> {
    pub fn new(config: &'a SiteRankConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, name = "siterank_pipeline")]
    pub fn run(&self, progress: &dyn ProgressReporter) -> Result<PipelineResult> {
        let config = self.config;
        let LoadedGraph {
            mut graph,
            build,
            assignments_read,
            edges_read,
            load_assignments,
            load_edges,
            build_duration,
        } = load_graph(&config.input, progress)?;

        let solver = RankSolver::new(config.solver.clone());
        let start = Instant::now();
        let solve = solver.solve_with_progress(&mut graph, progress)?;
        let solve_duration = start.elapsed();

        let summary = RankSummary::from_graph(&graph, config.report.top_k);

        let start = Instant::now();
        let mut records = RecordCounts {
            assignments_read,
            edges_read,
            ..RecordCounts::default()
        };
        records.document_ranks_written = self.write_ranks(&graph)?;
        records.root_records = self.write_root_ranks(&graph, progress)?;
        self.write_summary(&summary)?;
        let write = start.elapsed();

        info!(
            documents = records.document_ranks_written,
            root_records = records.root_records.map_or(0, |s| s.written),
            duration = ?write,
            "Rank outputs written"
        );

        Ok(PipelineResult {
            build,
            solve,
            summary,
            records,
            timings: StageTimings {
                load_assignments,
                load_edges,
                build: build_duration,
                solve: solve_duration,
                write,
            },
            finished_at: Utc::now(),
        })
    }

    fn write_ranks(&self, graph: &SiteGraph) -> Result<usize> {
        let path = &self.config.output.ranks;
        let writer = io::create_output(path)?;
        io::write_document_ranks(graph, writer, path)
    }

    fn write_root_ranks(
        &self,
        graph: &SiteGraph,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<RootWriteStats>> {
        let Some(urls) = &self.config.input.display_urls else {
            return Ok(None);
        };
        let reader = io::open_input(urls)?;
        let path = &self.config.output.root_ranks;
        let writer = io::create_output(path)?;
        let records = Records::display_urls(reader, io::source_name(urls));
        let stats = io::write_root_records(graph, records, writer, path)?;
        if stats.skipped_unknown > 0 {
            info!(
                skipped = stats.skipped_unknown,
                "Root records without a known site were skipped"
            );
            progress.message(&format!(
                "{} root records skipped: document has no known site",
                stats.skipped_unknown
            ));
        }
        Ok(Some(stats))
    }

    fn write_summary(&self, summary: &RankSummary) -> Result<()> {
        let Some(path) = &self.config.output.summary_json else {
            return Ok(());
        };
        let mut writer = io::create_output(path)?;
        serde_json::to_writer_pretty(&mut writer, summary).map_err(OutputError::from)?;
        writer.flush().map_err(|source| OutputError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

/// A solved graph built from in-memory records.
#[derive(Debug)]
pub struct RankedGraph {
    pub graph: SiteGraph,
    pub build: BuildStats,
    pub outcome: SolveOutcome,
}

/// Builds and solves a site graph without touching the filesystem.
pub fn rank_in_memory<A, S, E>(
    assignments: A,
    edges: E,
    config: &SolverConfig,
) -> Result<RankedGraph>
where
    A: IntoIterator<Item = (DocId, S)>,
    S: AsRef<str>,
    E: IntoIterator<Item = (DocId, DocId)>,
{
    let mut builder = GraphBuilder::new();
    for (doc, site) in assignments {
        builder.assign_document(doc, site.as_ref());
    }
    for (source, destination) in edges {
        builder.add_edge(source, destination);
    }
    let (mut graph, build) = builder.finalize();
    let outcome = RankSolver::new(config.clone()).solve(&mut graph)?;
    Ok(RankedGraph {
        graph,
        build,
        outcome,
    })
}
