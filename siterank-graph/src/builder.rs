//! Single-pass construction of a [`SiteGraph`] from document records.
//!
//! Document assignments must all be registered before edges: an edge whose
//! endpoint has no known site is dropped, never deferred.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::site::Site;
use crate::site_graph::SiteGraph;
use crate::types::{DocId, SiteIdx};

/// Result of registering one document under a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The site did not exist yet and was created for this document.
    NewSite(SiteIdx),
    /// The document joined an existing site.
    ExistingSite(SiteIdx),
    /// The document already belongs to `owner`; the record was ignored.
    Duplicate { owner: SiteIdx },
}

/// Result of offering one document-level link to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Added { source: SiteIdx, destination: SiteIdx },
    UnresolvedSource,
    UnresolvedDestination,
    SelfLoop,
}

/// Counters collected while building a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub documents_assigned: u64,
    pub duplicate_documents: u64,
    pub sites: usize,
    pub edges_added: u64,
    pub unresolved_edges: u64,
    pub self_loops: u64,
    pub site_edges: usize,
    pub dead_ends: usize,
}

/// Accumulates sites and site-level edges, then freezes them into a
/// [`SiteGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    sites: Vec<Site>,
    site_by_id: HashMap<String, SiteIdx>,
    doc_to_site: HashMap<DocId, SiteIdx>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with pre-sized document and site indexes, so bulk loading a
    /// large corpus does not rehash repeatedly.
    pub fn with_capacity(documents: usize, sites: usize) -> Self {
        Self {
            sites: Vec::with_capacity(sites),
            site_by_id: HashMap::with_capacity(sites),
            doc_to_site: HashMap::with_capacity(documents),
            stats: BuildStats::default(),
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Registers `doc` under the site named `site_id`, creating the site on
    /// first reference. A document keeps its first site for good.
    pub fn assign_document(&mut self, doc: DocId, site_id: &str) -> Assignment {
        let (idx, created) = self.get_or_create_site(site_id);

        if let Some(&owner) = self.doc_to_site.get(&doc) {
            self.stats.duplicate_documents += 1;
            debug!(%doc, site = site_id, "Ignoring duplicate document assignment");
            return Assignment::Duplicate { owner };
        }

        self.doc_to_site.insert(doc, idx);
        self.sites[idx.index()].push_document(doc);
        self.stats.documents_assigned += 1;

        if created {
            Assignment::NewSite(idx)
        } else {
            Assignment::ExistingSite(idx)
        }
    }

    /// Collapses a document link into the site edge between the documents'
    /// sites. Unknown documents and same-site links are dropped.
    pub fn add_edge(&mut self, source: DocId, destination: DocId) -> EdgeOutcome {
        let Some(&src) = self.doc_to_site.get(&source) else {
            self.stats.unresolved_edges += 1;
            return EdgeOutcome::UnresolvedSource;
        };
        let Some(&dst) = self.doc_to_site.get(&destination) else {
            self.stats.unresolved_edges += 1;
            return EdgeOutcome::UnresolvedDestination;
        };
        if src == dst {
            self.stats.self_loops += 1;
            return EdgeOutcome::SelfLoop;
        }

        self.sites[dst.index()].record_in_link(src);
        self.sites[src.index()].record_out_link(dst);
        self.stats.edges_added += 1;

        EdgeOutcome::Added {
            source: src,
            destination: dst,
        }
    }

    /// Freezes the topology and detects dead ends.
    pub fn finalize(self) -> (SiteGraph, BuildStats) {
        let mut stats = self.stats;
        let graph = SiteGraph::from_parts(self.sites, self.site_by_id, self.doc_to_site);

        stats.sites = graph.site_count();
        stats.site_edges = graph.site_edge_count();
        stats.dead_ends = graph.dead_ends().len();

        info!(
            sites = stats.sites,
            documents = stats.documents_assigned,
            site_edges = stats.site_edges,
            doc_edges = stats.edges_added,
            dead_ends = stats.dead_ends,
            "Built site graph"
        );

        (graph, stats)
    }

    fn get_or_create_site(&mut self, site_id: &str) -> (SiteIdx, bool) {
        if let Some(&idx) = self.site_by_id.get(site_id) {
            return (idx, false);
        }
        let idx = SiteIdx(self.sites.len());
        self.sites.push(Site::new(site_id.to_string()));
        self.site_by_id.insert(site_id.to_string(), idx);
        (idx, true)
    }
}
