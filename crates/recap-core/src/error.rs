use std::path::PathBuf;

/// Errors that can occur across the recap workspace.
///
/// Library crates return this type directly; the binary renders it as a
/// `miette` report. An empty history is never an error: every analysis
/// returns an empty collection instead.
///
/// # Examples
///
/// ```
/// use recap_core::RecapError;
///
/// let err = RecapError::InvalidThreshold(150.0);
/// assert!(err.to_string().contains("150"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RecapError {
    /// The path is not inside a git work tree.
    #[error("not a git repository: {}", .0.display())]
    #[diagnostic(
        code(recap::invalid_repository),
        help("run recap from inside a git repository, or pass --repo-path")
    )]
    InvalidRepository(PathBuf),

    /// Bus-factor threshold outside `(0, 100]`.
    #[error("invalid threshold {0}: must be greater than 0 and at most 100")]
    #[diagnostic(code(recap::invalid_threshold))]
    InvalidThreshold(f64),

    /// Time window that could not be parsed.
    #[error("invalid time window '{0}'")]
    #[diagnostic(
        code(recap::invalid_since),
        help("use 'all', '2 weeks ago', '30' (days), or a date like '2024-01-31'")
    )]
    InvalidSince(String),

    /// The underlying git operation failed.
    #[error("git history extraction failed: {0}")]
    #[diagnostic(code(recap::extraction))]
    Extraction(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(recap::config))]
    Config(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(recap::io))]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(recap::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(recap::toml))]
    Toml(#[from] toml::de::Error),
}
