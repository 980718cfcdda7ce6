//! siterank core library: rank solver, summaries, record I/O and the pipeline.
//!
//! The main entry point is [`pipeline::SiteRankPipeline`], which runs the
//! Load → Build → Solve → Report → Write sequence over the inputs named in a
//! [`config::SiteRankConfig`]. Library callers holding records in memory can
//! use [`pipeline::rank_in_memory`] instead.

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod solver;

pub use siterank_graph as graph;
