use std::collections::HashMap;

use crate::types::{DocId, SiteIdx};

/// A site: the aggregation unit that documents belong to.
///
/// Adjacency is keyed by arena handle rather than by reference, so the
/// mutual in/out links between sites never form an ownership cycle.
#[derive(Debug, Clone)]
pub struct Site {
    id: String,
    document_ids: Vec<DocId>,
    /// Source site → number of document links from it into this site.
    in_edges: HashMap<SiteIdx, u64>,
    /// Destination site → number of document links from this site to it.
    out_edges: HashMap<SiteIdx, u64>,
    total_in_doc_count: u64,
    total_out_doc_count: u64,
}

impl Site {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            document_ids: Vec::new(),
            in_edges: HashMap::new(),
            out_edges: HashMap::new(),
            total_in_doc_count: 0,
            total_out_doc_count: 0,
        }
    }

    /// Site identifier: a hostname or an opaque site key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Documents of this site in first-seen order.
    pub fn document_ids(&self) -> &[DocId] {
        &self.document_ids
    }

    pub fn in_edges(&self) -> &HashMap<SiteIdx, u64> {
        &self.in_edges
    }

    pub fn out_edges(&self) -> &HashMap<SiteIdx, u64> {
        &self.out_edges
    }

    /// Sum of all incoming edge weights.
    pub fn total_in_doc_count(&self) -> u64 {
        self.total_in_doc_count
    }

    /// Sum of all outgoing edge weights.
    pub fn total_out_doc_count(&self) -> u64 {
        self.total_out_doc_count
    }

    /// Number of distinct sites linking here.
    pub fn in_site_count(&self) -> usize {
        self.in_edges.len()
    }

    /// Number of distinct sites linked from here.
    pub fn out_site_count(&self) -> usize {
        self.out_edges.len()
    }

    pub fn is_dead_end(&self) -> bool {
        self.total_out_doc_count == 0
    }

    pub(crate) fn push_document(&mut self, doc: DocId) {
        self.document_ids.push(doc);
    }

    pub(crate) fn record_in_link(&mut self, source: SiteIdx) {
        *self.in_edges.entry(source).or_insert(0) += 1;
        self.total_in_doc_count += 1;
    }

    pub(crate) fn record_out_link(&mut self, destination: SiteIdx) {
        *self.out_edges.entry(destination).or_insert(0) += 1;
        self.total_out_doc_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_counters_follow_edge_maps() {
        let mut site = Site::new("example.com".into());
        site.record_out_link(SiteIdx(1));
        site.record_out_link(SiteIdx(1));
        site.record_out_link(SiteIdx(2));
        site.record_in_link(SiteIdx(2));

        assert_eq!(site.out_edges()[&SiteIdx(1)], 2);
        assert_eq!(site.out_site_count(), 2);
        assert_eq!(site.total_out_doc_count(), 3);
        assert_eq!(site.in_site_count(), 1);
        assert_eq!(site.total_in_doc_count(), 1);
        assert!(!site.is_dead_end());
    }

    #[test]
    fn fresh_site_is_a_dead_end() {
        let site = Site::new("lonely".into());
        assert!(site.is_dead_end());
        assert!(site.document_ids().is_empty());
    }
}
