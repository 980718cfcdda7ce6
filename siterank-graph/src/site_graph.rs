//! The finalized site graph and its rank vectors.

use std::collections::HashMap;

use serde::Serialize;

use crate::site::Site;
use crate::types::{DocId, SiteIdx};

/// Per-site probability mass before (`prev`) and after (`next`) an
/// iteration step, indexed by [`SiteIdx`].
///
/// Kept outside [`Site`] so a solver can read every `prev` value while
/// writing `next` values concurrently.
#[derive(Debug, Clone, Default)]
pub struct RankState {
    prev: Vec<f64>,
    next: Vec<f64>,
}

impl RankState {
    fn zeroed(len: usize) -> Self {
        Self {
            prev: vec![0.0; len],
            next: vec![0.0; len],
        }
    }

    pub fn prev(&self) -> &[f64] {
        &self.prev
    }

    pub fn next(&self) -> &[f64] {
        &self.next
    }

    pub fn next_mut(&mut self) -> &mut [f64] {
        &mut self.next
    }

    /// Sets every `next` value to `value`.
    pub fn fill_next(&mut self, value: f64) {
        self.next.fill(value);
    }

    /// Copies `next` into `prev`, freezing the state an iteration reads from.
    pub fn commit(&mut self) {
        self.prev.copy_from_slice(&self.next);
    }

    /// Frozen `prev` values alongside the writable `next` values.
    pub fn split_mut(&mut self) -> (&[f64], &mut [f64]) {
        (&self.prev, &mut self.next)
    }

    pub fn next_sum(&self) -> f64 {
        self.next.iter().sum()
    }
}

/// Final rank of one document: the rank of the site it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentRank {
    pub doc_id: DocId,
    pub site_rank: f64,
}

/// Extended record for a root document (one with a display URL).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootDocumentRecord {
    pub doc_id: DocId,
    pub site_id: String,
    pub display_url: String,
    pub site_rank: f64,
    pub in_edge_site_count: usize,
    pub out_edge_site_count: usize,
    pub total_in_doc_count: u64,
    pub total_out_doc_count: u64,
}

/// Sites, their weighted adjacency, and the document index.
///
/// Produced by [`GraphBuilder::finalize`](crate::GraphBuilder::finalize);
/// topology is fixed from then on and only the rank vectors change.
#[derive(Debug, Clone)]
pub struct SiteGraph {
    sites: Vec<Site>,
    site_by_id: HashMap<String, SiteIdx>,
    doc_to_site: HashMap<DocId, SiteIdx>,
    dead_ends: Vec<SiteIdx>,
    ranks: RankState,
}

impl SiteGraph {
    pub(crate) fn from_parts(
        sites: Vec<Site>,
        site_by_id: HashMap<String, SiteIdx>,
        doc_to_site: HashMap<DocId, SiteIdx>,
    ) -> Self {
        let dead_ends = sites
            .iter()
            .enumerate()
            .filter(|(_, site)| site.is_dead_end())
            .map(|(i, _)| SiteIdx(i))
            .collect();
        let ranks = RankState::zeroed(sites.len());

        Self {
            sites,
            site_by_id,
            doc_to_site,
            dead_ends,
            ranks,
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.doc_to_site.len()
    }

    /// All sites in arena (first-seen) order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Handles of all sites in arena order.
    pub fn site_indices(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        (0..self.sites.len()).map(SiteIdx)
    }

    /// The site behind `idx`. Panics on a handle from another graph.
    pub fn site(&self, idx: SiteIdx) -> &Site {
        &self.sites[idx.index()]
    }

    pub fn site_by_id(&self, id: &str) -> Option<SiteIdx> {
        self.site_by_id.get(id).copied()
    }

    pub fn site_of_document(&self, doc: DocId) -> Option<SiteIdx> {
        self.doc_to_site.get(&doc).copied()
    }

    /// Sites without outgoing edges, in arena order.
    pub fn dead_ends(&self) -> &[SiteIdx] {
        &self.dead_ends
    }

    pub fn is_dead_end(&self, idx: SiteIdx) -> bool {
        self.site(idx).is_dead_end()
    }

    /// Number of distinct directed site pairs with at least one link.
    pub fn site_edge_count(&self) -> usize {
        self.sites.iter().map(Site::out_site_count).sum()
    }

    /// Number of document-level links that survived into site edges.
    pub fn doc_edge_count(&self) -> u64 {
        self.sites.iter().map(Site::total_out_doc_count).sum()
    }

    pub fn ranks(&self) -> &RankState {
        &self.ranks
    }

    pub fn ranks_mut(&mut self) -> &mut RankState {
        &mut self.ranks
    }

    /// Read-only topology next to the mutable rank vectors.
    pub fn split_ranks_mut(&mut self) -> (&[Site], &[SiteIdx], &mut RankState) {
        (&self.sites, &self.dead_ends, &mut self.ranks)
    }

    pub fn rank_prev(&self, idx: SiteIdx) -> f64 {
        self.ranks.prev[idx.index()]
    }

    pub fn rank_next(&self, idx: SiteIdx) -> f64 {
        self.ranks.next[idx.index()]
    }

    /// Current rank of the site named `id`.
    pub fn rank_of(&self, id: &str) -> Option<f64> {
        self.site_by_id(id).map(|idx| self.rank_next(idx))
    }

    /// First site pair whose in/out edge weights disagree, or whose totals
    /// drifted from the sum of their edge map.
    pub fn first_mirror_violation(&self) -> Option<(SiteIdx, SiteIdx)> {
        for (i, site) in self.sites.iter().enumerate() {
            let src = SiteIdx(i);
            if site.out_edges().values().sum::<u64>() != site.total_out_doc_count()
                || site.in_edges().values().sum::<u64>() != site.total_in_doc_count()
            {
                return Some((src, src));
            }
            for (&dst, &weight) in site.out_edges() {
                if self.site(dst).in_edges().get(&src) != Some(&weight) {
                    return Some((src, dst));
                }
            }
            for (&from, &weight) in site.in_edges() {
                if self.site(from).out_edges().get(&src) != Some(&weight) {
                    return Some((from, src));
                }
            }
        }
        None
    }

    /// Final rank of every document, grouped by site in arena order.
    pub fn document_ranks(&self) -> impl Iterator<Item = DocumentRank> + '_ {
        self.sites.iter().enumerate().flat_map(move |(i, site)| {
            let site_rank = self.ranks.next[i];
            site.document_ids()
                .iter()
                .map(move |&doc_id| DocumentRank { doc_id, site_rank })
        })
    }

    /// Extended record for `doc`, or `None` when its site is unknown.
    pub fn root_record(&self, doc: DocId, display_url: &str) -> Option<RootDocumentRecord> {
        let idx = self.site_of_document(doc)?;
        let site = self.site(idx);
        Some(RootDocumentRecord {
            doc_id: doc,
            site_id: site.id().to_string(),
            display_url: display_url.to_string(),
            site_rank: self.rank_next(idx),
            in_edge_site_count: site.in_site_count(),
            out_edge_site_count: site.out_site_count(),
            total_in_doc_count: site.total_in_doc_count(),
            total_out_doc_count: site.total_out_doc_count(),
        })
    }
}
