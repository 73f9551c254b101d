use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecapError;

/// Top-level configuration loaded from `.recap.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use recap_core::RecapConfig;
///
/// let config = RecapConfig::default();
/// assert_eq!(config.bus_factor.high_cut, 80.0);
/// assert_eq!(config.output.limit, 10);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecapConfig {
    /// History mining settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Bus-factor tier boundaries.
    #[serde(default)]
    pub bus_factor: BusFactorConfig,
    /// Contributor identity matching.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Report rendering settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl RecapConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::Io`] if the file cannot be read, or
    /// [`RecapError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use recap_core::RecapConfig;
    /// use std::path::Path;
    ///
    /// let config = RecapConfig::from_file(Path::new(".recap.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, RecapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use recap_core::RecapConfig;
    ///
    /// let toml = r#"
    /// [bus_factor]
    /// high_cut = 70.0
    /// "#;
    /// let config = RecapConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.bus_factor.high_cut, 70.0);
    /// assert_eq!(config.bus_factor.low_band, 20.0);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RecapError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// History mining configuration.
///
/// # Examples
///
/// ```
/// use recap_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert_eq!(config.since, "all");
/// assert_eq!(config.recap_since, "24 hours ago");
/// assert_eq!(config.max_files_per_commit, 0);
/// assert!(!config.include_merges);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Default window for hotspots (default: `"all"`).
    #[serde(default = "default_since")]
    pub since: String,
    /// Default window for the recap summary (default: `"24 hours ago"`).
    #[serde(default = "default_recap_since")]
    pub recap_since: String,
    /// Skip commits touching more files than this; `0` disables the limit.
    #[serde(default)]
    pub max_files_per_commit: usize,
    /// Diff merge commits against their first parent instead of skipping them.
    #[serde(default)]
    pub include_merges: bool,
    /// Branch to walk instead of HEAD.
    pub branch: Option<String>,
}

fn default_since() -> String {
    "all".into()
}

fn default_recap_since() -> String {
    "24 hours ago".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            since: default_since(),
            recap_since: default_recap_since(),
            max_files_per_commit: 0,
            include_merges: false,
            branch: None,
        }
    }
}

/// Bus-factor tier boundaries.
///
/// `high_cut` is the ownership percentage at which a file counts as
/// concentrated; `low_band` is the width of the `Low` tier below it.
///
/// # Examples
///
/// ```
/// use recap_core::BusFactorConfig;
///
/// let config = BusFactorConfig::default();
/// assert_eq!(config.high_cut, 80.0);
/// assert_eq!(config.low_band, 20.0);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusFactorConfig {
    /// Ownership percent for `High`/`Medium` (default: 80.0).
    #[serde(default = "default_high_cut")]
    pub high_cut: f64,
    /// Width of the `Low` band below `high_cut` (default: 20.0).
    #[serde(default = "default_low_band")]
    pub low_band: f64,
}

fn default_high_cut() -> f64 {
    80.0
}

fn default_low_band() -> f64 {
    20.0
}

impl Default for BusFactorConfig {
    fn default() -> Self {
        Self {
            high_cut: default_high_cut(),
            low_band: default_low_band(),
        }
    }
}

/// Contributor identity matching configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// How author identities are compared (default: exact).
    #[serde(default)]
    pub strategy: IdentityStrategy,
}

/// Strategy for deciding whether two commit authors are the same person.
///
/// # Examples
///
/// ```
/// use recap_core::IdentityStrategy;
///
/// let s: IdentityStrategy = serde_json::from_str("\"case-insensitive\"").unwrap();
/// assert_eq!(s, IdentityStrategy::CaseInsensitive);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityStrategy {
    /// Name and email must match byte for byte.
    #[default]
    Exact,
    /// Whitespace-normalized name, lowercased email.
    CaseInsensitive,
}

/// Report rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Maximum rows per table (default: 10).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}
