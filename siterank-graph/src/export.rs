//! Conversion to `petgraph` for visualisation and ad-hoc analysis.

use std::collections::HashMap;
use std::io::Write;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::site_graph::SiteGraph;
use crate::types::SiteIdx;
use crate::{GraphError, Result};

/// Whole site graph as a `DiGraph`; node `i` is site `SiteIdx(i)`, edge
/// weights are document link counts.
pub fn to_digraph(graph: &SiteGraph) -> DiGraph<String, u64> {
    let mut out = DiGraph::with_capacity(graph.site_count(), graph.site_edge_count());
    for site in graph.sites() {
        out.add_node(site.id().to_string());
    }

    for (i, site) in graph.sites().iter().enumerate() {
        for (dst, weight) in sorted_edges(site.out_edges()) {
            out.add_edge(NodeIndex::new(i), NodeIndex::new(dst.index()), weight);
        }
    }

    out
}

/// The site named `site_id` with its direct in- and out-neighbours and the
/// edges touching it.
pub fn neighborhood(graph: &SiteGraph, site_id: &str) -> Result<DiGraph<String, u64>> {
    let center = graph
        .site_by_id(site_id)
        .ok_or_else(|| GraphError::UnknownSite(site_id.to_string()))?;
    let site = graph.site(center);

    let mut members: Vec<SiteIdx> = std::iter::once(center)
        .chain(site.in_edges().keys().copied())
        .chain(site.out_edges().keys().copied())
        .collect();
    members.sort_unstable();
    members.dedup();

    let mut out =
        DiGraph::with_capacity(members.len(), site.in_site_count() + site.out_site_count());
    let index: HashMap<SiteIdx, NodeIndex> = members
        .iter()
        .map(|&m| (m, out.add_node(graph.site(m).id().to_string())))
        .collect();

    for (dst, weight) in sorted_edges(site.out_edges()) {
        out.add_edge(index[&center], index[&dst], weight);
    }
    for (src, weight) in sorted_edges(site.in_edges()) {
        out.add_edge(index[&src], index[&center], weight);
    }

    Ok(out)
}

/// Renders `graph` as Graphviz DOT.
pub fn write_dot<W: Write>(graph: &DiGraph<String, u64>, mut writer: W) -> Result<()> {
    write!(writer, "{}", Dot::new(graph))?;
    writer.flush()?;
    Ok(())
}

fn sorted_edges(edges: &HashMap<SiteIdx, u64>) -> Vec<(SiteIdx, u64)> {
    let mut sorted: Vec<_> = edges.iter().map(|(&idx, &w)| (idx, w)).collect();
    sorted.sort_unstable_by_key(|&(idx, _)| idx);
    sorted
}
