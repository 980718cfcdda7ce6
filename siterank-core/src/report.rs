//! Read-only summary of a solved site graph.

use std::fmt;

use serde::Serialize;

use siterank_graph::{SiteGraph, SiteIdx};

/// One line of the top-K listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRankEntry {
    /// 1-based position in rank order.
    pub position: usize,
    pub site_id: String,
    pub rank: f64,
    pub documents: usize,
    pub in_site_edges: usize,
    pub out_site_edges: usize,
    pub in_doc_edges: u64,
    pub out_doc_edges: u64,
}

/// Top-K sites plus whole-graph totals.
#[derive(Debug, Clone, Serialize)]
pub struct RankSummary {
    pub top: Vec<SiteRankEntry>,
    pub site_count: usize,
    pub dead_end_count: usize,
    pub site_edge_count: usize,
    pub doc_edge_count: u64,
    pub rank_sum: f64,
}

impl RankSummary {
    /// Summarizes `graph`, listing `min(top_k, N)` sites by descending rank.
    pub fn from_graph(graph: &SiteGraph, top_k: usize) -> Self {
        let top = ranked_sites(graph)
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, idx)| {
                let site = graph.site(idx);
                SiteRankEntry {
                    position: i + 1,
                    site_id: site.id().to_string(),
                    rank: graph.rank_next(idx),
                    documents: site.document_ids().len(),
                    in_site_edges: site.in_site_count(),
                    out_site_edges: site.out_site_count(),
                    in_doc_edges: site.total_in_doc_count(),
                    out_doc_edges: site.total_out_doc_count(),
                }
            })
            .collect();

        Self {
            top,
            site_count: graph.site_count(),
            dead_end_count: graph.dead_ends().len(),
            site_edge_count: graph.site_edge_count(),
            doc_edge_count: graph.doc_edge_count(),
            rank_sum: graph.ranks().next_sum(),
        }
    }
}

/// All sites by descending rank; equal ranks keep arena order.
pub fn ranked_sites(graph: &SiteGraph) -> Vec<SiteIdx> {
    let mut order: Vec<SiteIdx> = graph.site_indices().collect();
    order.sort_by(|&a, &b| graph.rank_next(b).total_cmp(&graph.rank_next(a)));
    order
}

impl fmt::Display for RankSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Top {} site ranks:", self.top.len())?;
        for entry in &self.top {
            writeln!(f, "{:>3}. {} = {:.6}", entry.position, entry.site_id, entry.rank)?;
            writeln!(
                f,
                "       docs {}, in sites {}, out sites {}, in docs {}, out docs {}",
                entry.documents,
                entry.in_site_edges,
                entry.out_site_edges,
                entry.in_doc_edges,
                entry.out_doc_edges
            )?;
        }
        writeln!(f, "Total sites:      {}", self.site_count)?;
        writeln!(f, "Total dead ends:  {}", self.dead_end_count)?;
        writeln!(f, "Total site edges: {}", self.site_edge_count)?;
        writeln!(f, "Total doc edges:  {}", self.doc_edge_count)?;
        write!(f, "Sum of ranks:     {:.6}", self.rank_sum)
    }
}
