//! Damped power iteration over a [`SiteGraph`].
//!
//! Each step freezes the current ranks, computes the mass every dead end
//! spreads to all *other* sites, then recomputes every site from the frozen
//! values:
//!
//! ```text
//! next[s] = (1 - d) / N + d * (links_into(s) + dead_mass - own_dead_share(s))
//! ```
//!
//! Because every update reads only frozen values, the per-site loop runs on
//! the rayon pool without changing results.

// Rank arithmetic mixes counts and probabilities.
#![allow(clippy::cast_precision_loss)]

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, trace};

use siterank_graph::{Site, SiteGraph, SiteIdx};

use crate::config::{ContributionMode, SolverConfig};
use crate::error::SolveError;
use crate::progress::{NoopReporter, ProgressReporter};

/// Whole-graph solver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverPhase {
    Initializing,
    Iterating,
    Converged,
}

/// What one iteration step observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepStats {
    pub iteration: u32,
    /// Largest `|next - prev|` over all sites.
    pub max_delta: f64,
    /// Mass redistributed from dead ends to each other site.
    pub dead_mass: f64,
    /// Rank sum, when this step ran the normalization check.
    pub rank_sum: Option<f64>,
}

/// Result of a converged run.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    pub iterations: u32,
    pub max_delta: f64,
    pub rank_sum: f64,
    pub phase: SolverPhase,
    pub mode: ContributionMode,
    #[serde(skip)]
    pub duration: std::time::Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RankSolver {
    config: SolverConfig,
}

impl RankSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Sets every site to the uniform prior `1 / N`.
    pub fn initialize(&self, graph: &mut SiteGraph) {
        let n = graph.site_count();
        if n == 0 {
            return;
        }
        let ranks = graph.ranks_mut();
        ranks.fill_next(1.0 / n as f64);
        ranks.commit();
    }

    /// Runs one iteration step. `iteration` is 1-based and only used for
    /// error reporting and the normalization schedule.
    pub fn step(&self, graph: &mut SiteGraph, iteration: u32) -> Result<StepStats, SolveError> {
        let n = graph.site_count();
        if n < 2 {
            // Nowhere to redistribute to; the lone site keeps its mass.
            graph.ranks_mut().commit();
            return Ok(StepStats {
                iteration,
                max_delta: 0.0,
                dead_mass: 0.0,
                rank_sum: None,
            });
        }

        let teleport = (1.0 - self.config.damping) / n as f64;
        let spread = (n - 1) as f64;

        let (sites, dead_ends, ranks) = graph.split_ranks_mut();
        ranks.commit();
        let (prev, next) = ranks.split_mut();

        let dead_mass: f64 = dead_ends.iter().map(|d| prev[d.index()] / spread).sum();
        if dead_mass > 1.0 {
            return Err(SolveError::DeadEndMassExceeded {
                iteration,
                mass: dead_mass,
            });
        }

        let update = |(i, slot): (usize, &mut f64)| -> Result<f64, SolveError> {
            let site = &sites[i];
            let link_sum = self.link_contribution(sites, prev, SiteIdx(i));
            let own_share = if site.is_dead_end() {
                prev[i] / spread
            } else {
                0.0
            };
            let total = link_sum + (dead_mass - own_share);
            if total > 1.0 {
                return Err(SolveError::ContributionExceeded {
                    iteration,
                    site: site.id().to_string(),
                    total,
                });
            }
            *slot = teleport + self.config.damping * total;
            Ok((*slot - prev[i]).abs())
        };

        let max_delta = if self.config.parallel {
            next.par_iter_mut()
                .enumerate()
                .map(&update)
                .try_reduce(|| 0.0_f64, |a, b| Ok(a.max(b)))?
        } else {
            next.iter_mut()
                .enumerate()
                .map(&update)
                .try_fold(0.0_f64, |acc, delta| delta.map(|d| acc.max(d)))?
        };

        let rank_sum = if iteration % self.config.normalization_interval.max(1) == 0 {
            Some(self.check_normalization(graph, iteration)?)
        } else {
            None
        };

        trace!(iteration, max_delta, dead_mass, "Iteration complete");

        Ok(StepStats {
            iteration,
            max_delta,
            dead_mass,
            rank_sum,
        })
    }

    /// Verifies the ranks still sum to 1 within the configured margin.
    pub fn check_normalization(
        &self,
        graph: &SiteGraph,
        iteration: u32,
    ) -> Result<f64, SolveError> {
        let sum = graph.ranks().next_sum();
        debug!(iteration, sum, "Sum of site ranks");
        if (sum - 1.0).abs() > self.config.margin {
            return Err(SolveError::NormalizationDrift {
                iteration,
                sum,
                margin: self.config.margin,
            });
        }
        Ok(sum)
    }

    /// Initializes and iterates until the largest change is within epsilon.
    pub fn solve(&self, graph: &mut SiteGraph) -> Result<SolveOutcome, SolveError> {
        self.solve_with_progress(graph, &NoopReporter)
    }

    pub fn solve_with_progress(
        &self,
        graph: &mut SiteGraph,
        progress: &dyn ProgressReporter,
    ) -> Result<SolveOutcome, SolveError> {
        let start = Instant::now();
        let n = graph.site_count();
        info!(
            sites = n,
            dead_ends = graph.dead_ends().len(),
            mode = %self.config.mode,
            damping = self.config.damping,
            "Computing site rank"
        );

        debug!(phase = ?SolverPhase::Initializing, initial_rank = 1.0 / n.max(1) as f64);
        self.initialize(graph);

        if n < 2 {
            debug!(phase = ?SolverPhase::Converged, "Trivial graph, nothing to iterate");
            return Ok(SolveOutcome {
                iterations: 0,
                max_delta: 0.0,
                rank_sum: graph.ranks().next_sum(),
                phase: SolverPhase::Converged,
                mode: self.config.mode,
                duration: start.elapsed(),
            });
        }

        debug!(phase = ?SolverPhase::Iterating);
        progress.start(
            "Iterating site rank",
            Some(u64::from(self.config.max_iterations)),
        );
        let result = self.iterate(graph, progress);
        progress.finish();
        let (iterations, max_delta) = result?;

        let rank_sum = self.check_normalization(graph, iterations)?;
        debug!(phase = ?SolverPhase::Converged);

        let outcome = SolveOutcome {
            iterations,
            max_delta,
            rank_sum,
            phase: SolverPhase::Converged,
            mode: self.config.mode,
            duration: start.elapsed(),
        };
        info!(
            iterations,
            max_delta,
            rank_sum,
            duration = ?outcome.duration,
            "Site rank converged"
        );
        Ok(outcome)
    }

    fn iterate(
        &self,
        graph: &mut SiteGraph,
        progress: &dyn ProgressReporter,
    ) -> Result<(u32, f64), SolveError> {
        let mut iteration = 0;
        loop {
            iteration += 1;
            let stats = self.step(graph, iteration)?;
            progress.advance(1);
            if iteration % 10 == 0 {
                progress.detail(&format!("max delta {:.3e}", stats.max_delta));
            }

            if stats.max_delta <= self.config.epsilon {
                return Ok((iteration, stats.max_delta));
            }
            if iteration >= self.config.max_iterations {
                return Err(SolveError::DidNotConverge {
                    iterations: iteration,
                    max_delta: stats.max_delta,
                });
            }
        }
    }

    /// Mass flowing into `cur` over its incoming site edges.
    fn link_contribution(&self, sites: &[Site], prev: &[f64], cur: SiteIdx) -> f64 {
        sites[cur.index()]
            .in_edges()
            .iter()
            .filter(|&(&src, _)| src != cur)
            .map(|(&src, &weight)| {
                let factor = contribution_factor(self.config.mode, &sites[src.index()], weight);
                prev[src.index()] * factor
            })
            .sum()
    }
}

/// Share of `src`'s rank carried by an edge of `weight` document links.
fn contribution_factor(mode: ContributionMode, src: &Site, weight: u64) -> f64 {
    match mode {
        ContributionMode::Collapsed => 1.0 / src.out_site_count() as f64,
        ContributionMode::DocumentWeighted => weight as f64 / src.total_out_doc_count() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siterank_graph::{DocId, GraphBuilder};

    /// One document per site (doc id = position), one document link per pair.
    fn graph_of(sites: &[&str], links: &[(&str, &str)]) -> SiteGraph {
        let mut builder = GraphBuilder::new();
        for (i, site) in sites.iter().enumerate() {
            builder.assign_document(DocId(i as i64), site);
        }
        let doc = |name: &str| DocId(sites.iter().position(|s| *s == name).unwrap() as i64);
        for &(src, dst) in links {
            builder.add_edge(doc(src), doc(dst));
        }
        builder.finalize().0
    }

    fn rank(graph: &SiteGraph, id: &str) -> f64 {
        graph.rank_of(id).unwrap()
    }

    fn sequential() -> RankSolver {
        RankSolver::new(SolverConfig {
            parallel: false,
            ..SolverConfig::default()
        })
    }

    #[test]
    fn three_cycle_is_symmetric() {
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let outcome = RankSolver::default().solve(&mut graph).unwrap();

        for id in ["a", "b", "c"] {
            assert!((rank(&graph, id) - 1.0 / 3.0).abs() < 1e-6);
        }
        assert!((outcome.rank_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn two_site_dead_end_returns_all_mass() {
        // b's whole share goes back to a, the only other site.
        let mut graph = graph_of(&["a", "b"], &[("a", "b")]);
        RankSolver::default().solve(&mut graph).unwrap();

        assert!((rank(&graph, "a") - 0.5).abs() < 1e-9);
        assert!((rank(&graph, "b") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dead_end_outranks_its_linkers() {
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        RankSolver::default().solve(&mut graph).unwrap();

        // Fixed point: a = c = 0.475 / 1.85, b = 1 - 2a.
        let side = 0.475 / 1.85;
        assert!(rank(&graph, "b") > rank(&graph, "a"));
        assert!((rank(&graph, "a") - side).abs() < 1e-5);
        assert!((rank(&graph, "c") - side).abs() < 1e-5);
        assert!((rank(&graph, "b") - (1.0 - 2.0 * side)).abs() < 1e-5);
    }

    #[test]
    fn isolated_site_receives_only_teleport_mass() {
        // c is the only dead end and nothing links to it, so it keeps (1 - d) / N.
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "a")]);
        RankSolver::default().solve(&mut graph).unwrap();

        assert!((rank(&graph, "c") - 0.15 / 3.0).abs() < 1e-9);
        assert!((rank(&graph, "a") - 0.475).abs() < 1e-9);
        assert!((rank(&graph, "b") - 0.475).abs() < 1e-9);
    }

    #[test]
    fn all_isolated_sites_stay_uniform() {
        let mut graph = graph_of(&["a", "b", "c"], &[]);
        let outcome = RankSolver::default().solve(&mut graph).unwrap();

        assert_eq!(outcome.iterations, 1);
        for id in ["a", "b", "c"] {
            assert!((rank(&graph, id) - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn document_weighted_mode_follows_link_counts() {
        let mut builder = GraphBuilder::new();
        for (doc, site) in [(1, "a"), (2, "b"), (3, "c")] {
            builder.assign_document(DocId(doc), site);
        }
        for _ in 0..3 {
            builder.add_edge(DocId(1), DocId(2));
        }
        builder.add_edge(DocId(1), DocId(3));
        builder.add_edge(DocId(2), DocId(1));
        builder.add_edge(DocId(3), DocId(1));
        let (graph, _) = builder.finalize();

        let mut collapsed = graph.clone();
        RankSolver::default().solve(&mut collapsed).unwrap();
        assert!((rank(&collapsed, "b") - rank(&collapsed, "c")).abs() < 1e-9);

        let mut weighted = graph;
        let solver = RankSolver::new(SolverConfig {
            mode: ContributionMode::DocumentWeighted,
            ..SolverConfig::default()
        });
        let outcome = solver.solve(&mut weighted).unwrap();
        assert_eq!(outcome.mode, ContributionMode::DocumentWeighted);
        assert!((rank(&weighted, "b") - 0.360_135).abs() < 1e-5);
        assert!((rank(&weighted, "c") - 0.153_378).abs() < 1e-5);
    }

    #[test]
    fn parallel_and_sequential_agree_exactly() {
        let mut graph = graph_of(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("b", "c"), ("c", "a"), ("d", "c"), ("e", "a")],
        );
        let par = RankSolver::default().solve(&mut graph).unwrap();
        let par_ranks = graph.ranks().next().to_vec();

        let seq = sequential().solve(&mut graph).unwrap();
        assert_eq!(graph.ranks().next(), par_ranks.as_slice());
        assert_eq!(par.iterations, seq.iterations);
    }

    #[test]
    fn every_step_conserves_mass() {
        let mut graph = graph_of(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "b"), ("d", "b")],
        );
        let solver = RankSolver::new(SolverConfig {
            normalization_interval: 1,
            ..SolverConfig::default()
        });
        solver.initialize(&mut graph);
        for iteration in 1..=40 {
            let stats = solver.step(&mut graph, iteration).unwrap();
            let sum = stats.rank_sum.unwrap();
            assert!((sum - 1.0).abs() < 1e-9, "iteration {iteration}: sum {sum}");
        }
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        let solver = RankSolver::new(SolverConfig {
            max_iterations: 3,
            ..SolverConfig::default()
        });
        let err = solver.solve(&mut graph).unwrap_err();
        assert!(matches!(err, SolveError::DidNotConverge { iterations: 3, .. }));
    }

    #[test]
    fn excess_dead_end_mass_is_fatal() {
        let mut graph = graph_of(&["a", "b", "c"], &[]);
        let solver = RankSolver::default();
        solver.initialize(&mut graph);
        graph.ranks_mut().fill_next(1.0);

        let err = solver.step(&mut graph, 1).unwrap_err();
        assert!(matches!(
            err,
            SolveError::DeadEndMassExceeded { iteration: 1, mass } if mass > 1.0
        ));
    }

    #[test]
    fn excess_link_contribution_is_fatal() {
        let mut graph = graph_of(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let solver = sequential();
        solver.initialize(&mut graph);
        graph.ranks_mut().next_mut().copy_from_slice(&[0.1, 1.5]);

        let err = solver.step(&mut graph, 7).unwrap_err();
        assert!(matches!(
            err,
            SolveError::ContributionExceeded { iteration: 7, ref site, .. } if site == "a"
        ));
    }

    #[test]
    fn normalization_drift_is_fatal() {
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let solver = RankSolver::new(SolverConfig {
            normalization_interval: 1,
            ..SolverConfig::default()
        });
        solver.initialize(&mut graph);
        graph.ranks_mut().fill_next(0.9);

        let err = solver.step(&mut graph, 1).unwrap_err();
        assert!(matches!(
            err,
            SolveError::NormalizationDrift { iteration: 1, sum, .. } if sum > 2.0
        ));
    }

    #[test]
    fn progress_counts_iterations() {
        let mut graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        let reporter = crate::progress::IndicatifReporter::hidden();
        let solver = RankSolver::default();
        let outcome = solver.solve_with_progress(&mut graph, &reporter).unwrap();
        assert_eq!(reporter.position(), u64::from(outcome.iterations));
        assert_eq!(
            reporter.length(),
            Some(u64::from(solver.config().max_iterations))
        );
        assert_eq!(outcome.phase, SolverPhase::Converged);
    }

    #[test]
    fn empty_graph_converges_immediately() {
        let mut graph = GraphBuilder::new().finalize().0;
        let outcome = RankSolver::default().solve(&mut graph).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.rank_sum.abs() < f64::EPSILON);
    }

    #[test]
    fn single_site_holds_all_mass() {
        let mut graph = graph_of(&["only"], &[]);
        let outcome = RankSolver::default().solve(&mut graph).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert!((rank(&graph, "only") - 1.0).abs() < f64::EPSILON);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_graph() -> impl Strategy<Value = SiteGraph> {
            (2usize..12, prop::collection::vec((0usize..12, 0usize..12), 0..60)).prop_map(
                |(n, links)| {
                    let mut builder = GraphBuilder::new();
                    for i in 0..n {
                        builder.assign_document(DocId(i as i64), &format!("s{i}"));
                    }
                    for (src, dst) in links {
                        builder.add_edge(DocId((src % n) as i64), DocId((dst % n) as i64));
                    }
                    builder.finalize().0
                },
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn solved_ranks_form_a_distribution(mut graph in arb_graph()) {
                let outcome = RankSolver::default().solve(&mut graph).unwrap();
                prop_assert!((outcome.rank_sum - 1.0).abs() < 1e-6);
                prop_assert!(outcome.max_delta <= 1e-6);
                for &r in graph.ranks().next() {
                    prop_assert!(r > 0.0 && r < 1.0);
                }
            }

            #[test]
            fn weighted_mode_also_conserves(mut graph in arb_graph()) {
                let solver = RankSolver::new(SolverConfig {
                    mode: ContributionMode::DocumentWeighted,
                    normalization_interval: 1,
                    ..SolverConfig::default()
                });
                let outcome = solver.solve(&mut graph).unwrap();
                prop_assert!((outcome.rank_sum - 1.0).abs() < 1e-6);
            }
        }
    }
}
