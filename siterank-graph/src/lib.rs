//! Site-level link graph.
//!
//! Documents are assigned to sites, document-level links are collapsed into
//! weighted site-level edges, and the resulting [`SiteGraph`] carries the
//! per-site rank vectors that a solver iterates over.

pub mod builder;
pub mod export;
pub mod site;
pub mod site_graph;
pub mod types;

pub use builder::{Assignment, BuildStats, EdgeOutcome, GraphBuilder};
pub use site::Site;
pub use site_graph::{DocumentRank, RankState, RootDocumentRecord, SiteGraph};
pub use types::{DocId, SiteIdx};

/// Error type for the site graph.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
