use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a source site's rank is split across its outgoing site edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionMode {
    /// Every outgoing site edge is equally likely: `1 / |out_edges|`.
    #[default]
    Collapsed,
    /// Edges are weighted by document links: `weight / total_out_doc_count`.
    DocumentWeighted,
}

impl ContributionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::DocumentWeighted => "document-weighted",
        }
    }
}

impl std::fmt::Display for ContributionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContributionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collapsed" => Ok(Self::Collapsed),
            "document-weighted" | "weighted" => Ok(Self::DocumentWeighted),
            other => Err(ConfigError::Invalid(format!(
                "unknown contribution mode: {other} (use collapsed or document-weighted)"
            ))),
        }
    }
}

/// Top-level siterank configuration, matching `siterank.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRankConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub report: ReportSection,
}

impl SiteRankConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()
    }
}

/// Rank solver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Probability of following a link instead of jumping to a random site.
    pub damping: f64,
    /// Convergence threshold on the largest per-site rank change.
    pub epsilon: f64,
    /// Allowed drift of the rank sum away from 1.
    pub margin: f64,
    /// Check the rank sum every this many iterations.
    pub normalization_interval: u32,
    /// Give up with `DidNotConverge` after this many iterations.
    pub max_iterations: u32,
    pub mode: ContributionMode,
    /// Compute per-site updates on the rayon pool.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            epsilon: 1e-6,
            margin: 0.05,
            normalization_interval: 5000,
            max_iterations: 10_000,
            mode: ContributionMode::Collapsed,
            parallel: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damping.is_nan() || self.damping <= 0.0 || self.damping >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "solver.damping must be in (0, 1), got {}",
                self.damping
            )));
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "solver.epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.margin.is_nan() || self.margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "solver.margin must not be negative, got {}",
                self.margin
            )));
        }
        if self.normalization_interval == 0 {
            return Err(ConfigError::Invalid(
                "solver.normalization_interval must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "solver.max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Input record files and sizing hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// `<doc_id>,<site_id>` lines.
    pub assignments: PathBuf,
    /// `<src_doc_id>\t<dst_doc_id>` lines.
    pub edges: PathBuf,
    /// `<doc_id>\t<display_url>` lines for root documents; optional.
    pub display_urls: Option<PathBuf>,
    /// Expected number of documents, used to pre-size the document index.
    /// `0` grows the index on demand.
    pub expected_documents: usize,
    /// Expected number of sites, used to pre-size the site arena.
    pub expected_sites: usize,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            assignments: PathBuf::from("input/idToSitename.txt"),
            edges: PathBuf::from("input/edges.txt"),
            display_urls: Some(PathBuf::from("input/idToSite.txt")),
            expected_documents: 0,
            expected_sites: 0,
        }
    }
}

/// Output files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// `<doc_id>, <rank>` for every document.
    pub ranks: PathBuf,
    /// Extended records for root documents.
    pub root_ranks: PathBuf,
    /// JSON summary; skipped when unset.
    pub summary_json: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            ranks: PathBuf::from("output/idToSiterank.txt"),
            root_ranks: PathBuf::from("output/rootIdToSiterank.txt"),
            summary_json: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Number of top sites listed in the summary.
    pub top_k: usize,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}
