use std::time::{Duration, Instant};

use siterank_core::config::{SiteRankConfig, SolverConfig};
use siterank_core::graph::{DocId, GraphBuilder, SiteGraph};
use siterank_core::pipeline::SiteRankPipeline;
use siterank_core::progress::NoopReporter;
use siterank_core::solver::RankSolver;

fn threshold_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

#[allow(clippy::cast_possible_wrap)]
fn crawl_like_graph(site_count: usize, docs_per_site: usize) -> SiteGraph {
    let doc_count = site_count * docs_per_site;
    let mut builder = GraphBuilder::with_capacity(doc_count, site_count);
    for doc in 0..doc_count {
        builder.assign_document(DocId(doc as i64), &format!("http{}", doc / docs_per_site));
    }
    for doc in 0..doc_count {
        if (doc / docs_per_site) % 40 == 0 {
            continue;
        }
        for prime in [11, 37, 101] {
            builder.add_edge(DocId(doc as i64), DocId(((doc * prime + 3) % doc_count) as i64));
        }
    }
    builder.finalize().0
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_solver_under_threshold() {
    let mut graph = crawl_like_graph(200_000, 3);
    let solver = RankSolver::new(SolverConfig::default());

    let start = Instant::now();
    let outcome = solver.solve(&mut graph).unwrap();
    let elapsed = start.elapsed();

    let budget = threshold_ms("SITERANK_PERF_SOLVE_MS", 30_000);
    eprintln!(
        "Solve of {} sites: {elapsed:?} over {} iterations (budget {budget:?})",
        graph.site_count(),
        outcome.iterations
    );
    assert!((outcome.rank_sum - 1.0).abs() < 1e-6);
    assert!(
        elapsed <= budget,
        "solve took {elapsed:?}, budget {budget:?}"
    );
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_pipeline_under_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let sites = dir.path().join("sites.txt");
    let edges = dir.path().join("edges.txt");

    let doc_count = 300_000usize;
    let assignments: String = (0..doc_count)
        .map(|doc| format!("{doc},http{}\n", doc / 3))
        .collect();
    let links: String = (0..doc_count)
        .map(|doc| format!("{doc}\t{}\n", (doc * 17 + 5) % doc_count))
        .collect();
    std::fs::write(&sites, assignments).unwrap();
    std::fs::write(&edges, links).unwrap();

    let mut config = SiteRankConfig::default();
    config.input.assignments = sites;
    config.input.edges = edges;
    config.input.display_urls = None;
    config.output.ranks = dir.path().join("out/ranks.txt");

    let start = Instant::now();
    let result = SiteRankPipeline::new(&config).run(&NoopReporter).unwrap();
    let elapsed = start.elapsed();

    let budget = threshold_ms("SITERANK_PERF_PIPELINE_MS", 60_000);
    eprintln!("Pipeline: {elapsed:?} (budget {budget:?}), timings {:?}", result.timings);
    assert_eq!(result.records.document_ranks_written, doc_count);
    assert!(
        elapsed <= budget,
        "pipeline took {elapsed:?}, budget {budget:?}"
    );
}
