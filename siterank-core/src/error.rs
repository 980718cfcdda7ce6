/// Top-level siterank error type.
///
/// All fallible operations in `siterank-core` return [`Result<T, SiteRankError>`](Result).
/// Each variant wraps a layer-specific error enum, so callers can tell a bad
/// input file from a solver invariant breach without string matching.
#[derive(thiserror::Error, Debug)]
pub enum SiteRankError {
    /// Error from the site graph layer (unknown site, DOT export I/O).
    #[error("Graph error: {0}")]
    Graph(#[from] siterank_graph::GraphError),

    /// Error reading or parsing an input record stream.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Error writing rank results.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Fatal invariant violation or non-convergence in the rank solver.
    #[error("Solver error: {0}")]
    Solve(#[from] SolveError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Unrecoverable conditions raised by the rank solver.
///
/// The mass bounds and the normalization check only trip when graph
/// construction or the update rule is broken, so none of these are retried.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    /// The redistributed dead-end mass of one step exceeded 1.
    #[error("Dead-end contribution sum {mass} exceeds 1 at iteration {iteration}")]
    DeadEndMassExceeded { iteration: u32, mass: f64 },

    /// Link plus dead-end contributions into one site exceeded 1.
    #[error("Incoming contribution {total} into site {site} exceeds 1 at iteration {iteration}")]
    ContributionExceeded {
        iteration: u32,
        site: String,
        total: f64,
    },

    /// The ranks no longer sum to 1 within the configured margin.
    #[error("Sum of site ranks is {sum} at iteration {iteration}, outside 1 ± {margin}")]
    NormalizationDrift { iteration: u32, sum: f64, margin: f64 },

    /// The iteration cap was reached before the largest change fell to epsilon.
    #[error("Did not converge after {iterations} iterations (max delta {max_delta})")]
    DidNotConverge { iterations: u32, max_delta: f64 },
}

/// Errors from the input record adapters.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    /// An input file could not be opened or read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A record line could not be parsed.
    #[error("Malformed record in {source_name} line {line}: {message}")]
    Malformed {
        /// File name or other label of the record stream.
        source_name: String,
        /// 1-based line number.
        line: usize,
        message: String,
    },

    /// A URL did not yield a site key.
    #[error("Cannot extract site key from url: {0}")]
    SiteKey(String),
}

/// Errors from the output writers.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// Writing an output file failed.
    #[error("Cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization of the summary failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors in siterank configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, SiteRankError>`.
pub type Result<T> = std::result::Result<T, SiteRankError>;
