//! Bus-factor risk classification.
//!
//! Classifies files by how concentrated their ownership is. Two tiers share
//! the same numeric cut: `High` means only one person has ever touched the
//! file, `Medium` means one person dominates but others have contributed.

use std::collections::BTreeMap;
use std::fmt;

use recap_core::{BusFactorConfig, RecapError};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::mining::normalize_prefix;
use crate::ownership::{primary_maintainers, FileStats};

/// Risk tier for a single file.
///
/// # Examples
///
/// ```
/// use recap_history::bus_factor::RiskTier;
///
/// assert_eq!(RiskTier::High.to_string(), "high");
/// assert!(RiskTier::High > RiskTier::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Ownership is well distributed.
    None,
    /// Owner share within the band just below the cut.
    Low,
    /// Owner share at or above the cut, with other contributors present.
    Medium,
    /// Owner share at or above the cut and nobody else has contributed.
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::None => write!(f, "none"),
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Validated tier boundaries.
///
/// # Examples
///
/// ```
/// use recap_history::bus_factor::{RiskTier, TierConfig};
///
/// let tiers = TierConfig::default().with_threshold(60.0).unwrap();
/// assert_eq!(tiers.tier(60.0, 2), RiskTier::Medium);
/// assert_eq!(tiers.tier(59.9, 2), RiskTier::Low);
/// assert_eq!(tiers.tier(39.9, 3), RiskTier::None);
///
/// assert!(TierConfig::default().with_threshold(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierConfig {
    high_cut: f64,
    low_band: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            high_cut: 80.0,
            low_band: 20.0,
        }
    }
}

impl TierConfig {
    /// Build tier boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidThreshold`] if `high_cut` is outside
    /// `(0, 100]`, or [`RecapError::Config`] if `low_band` is negative or
    /// not finite.
    pub fn new(high_cut: f64, low_band: f64) -> Result<Self, RecapError> {
        validate_threshold(high_cut)?;
        if !low_band.is_finite() || low_band < 0.0 {
            return Err(RecapError::Config(format!(
                "bus_factor.low_band must be a non-negative number, got {low_band}"
            )));
        }
        Ok(Self { high_cut, low_band })
    }

    /// Build tier boundaries from the `[bus_factor]` config section.
    ///
    /// # Errors
    ///
    /// See [`TierConfig::new`].
    pub fn from_config(config: &BusFactorConfig) -> Result<Self, RecapError> {
        Self::new(config.high_cut, config.low_band)
    }

    /// Replace the cut with a caller-supplied threshold.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidThreshold`] if `threshold` is outside
    /// `(0, 100]`.
    pub fn with_threshold(self, threshold: f64) -> Result<Self, RecapError> {
        Self::new(threshold, self.low_band)
    }

    pub fn high_cut(&self) -> f64 {
        self.high_cut
    }

    pub fn low_band(&self) -> f64 {
        self.low_band
    }

    /// Tier for an owner holding `percent` with `contributors` nonzero shares.
    pub fn tier(&self, percent: f64, contributors: usize) -> RiskTier {
        if percent >= self.high_cut {
            if contributors <= 1 {
                RiskTier::High
            } else {
                RiskTier::Medium
            }
        } else if percent >= self.high_cut - self.low_band {
            RiskTier::Low
        } else {
            RiskTier::None
        }
    }
}

/// Check that a bus-factor threshold lies in `(0, 100]`.
///
/// # Errors
///
/// Returns [`RecapError::InvalidThreshold`] otherwise, including for NaN.
pub fn validate_threshold(threshold: f64) -> Result<(), RecapError> {
    if threshold > 0.0 && threshold <= 100.0 {
        Ok(())
    } else {
        Err(RecapError::InvalidThreshold(threshold))
    }
}

/// Classification of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFactorFinding {
    /// File path relative to repo root.
    pub path: String,
    /// Assigned tier.
    pub risk_tier: RiskTier,
    /// Primary maintainer of the file.
    pub dominant_owner: Identity,
    /// The maintainer's share, 0–100.
    pub owner_percent: f64,
    /// Total churn of the file.
    pub total_lines: u64,
    /// Authors holding a nonzero share.
    pub contributors: usize,
}

impl BusFactorFinding {
    /// Owner percentage rounded to the nearest integer for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use recap_history::bus_factor::{BusFactorFinding, RiskTier};
    /// use recap_history::identity::Identity;
    ///
    /// let finding = BusFactorFinding {
    ///     path: "src/main.rs".into(),
    ///     risk_tier: RiskTier::Medium,
    ///     dominant_owner: Identity::new("alice", "alice@example.com"),
    ///     owner_percent: 66.666,
    ///     total_lines: 15,
    ///     contributors: 2,
    /// };
    /// assert_eq!(finding.rounded_percent(), 67);
    /// ```
    pub fn rounded_percent(&self) -> u32 {
        self.owner_percent.round() as u32
    }
}

/// Classify every in-scope file.
///
/// Returns findings ordered by owner percent descending, then path.
/// An empty `stats` map yields an empty result.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use recap_history::bus_factor::{classify, TierConfig};
///
/// assert!(classify(&BTreeMap::new(), &TierConfig::default(), None).is_empty());
/// ```
pub fn classify(
    stats: &BTreeMap<String, FileStats>,
    tiers: &TierConfig,
    path_scope: Option<&str>,
) -> Vec<BusFactorFinding> {
    let prefix = normalize_prefix(path_scope);

    // Already ordered by percent descending, then path.
    primary_maintainers(stats)
        .into_iter()
        .filter(|entry| match prefix.as_deref() {
            Some(p) => entry.path.starts_with(p),
            None => true,
        })
        .filter_map(|entry| {
            let contributors = stats.get(&entry.path)?.contributors();
            Some(BusFactorFinding {
                risk_tier: tiers.tier(entry.percent, contributors),
                dominant_owner: entry.owner,
                owner_percent: entry.percent,
                total_lines: entry.total_lines,
                contributors,
                path: entry.path,
            })
        })
        .collect()
}

/// Finding counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

impl TierCounts {
    pub fn from_findings(findings: &[BusFactorFinding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.risk_tier {
                RiskTier::High => counts.high += 1,
                RiskTier::Medium => counts.medium += 1,
                RiskTier::Low => counts.low += 1,
                RiskTier::None => counts.none += 1,
            }
        }
        counts
    }
}

/// Classified files grouped for reporting.
///
/// # Examples
///
/// ```
/// use recap_history::bus_factor::{BusFactorReport, RiskTier};
///
/// let report = BusFactorReport::new(80.0, Vec::new(), false);
/// assert_eq!(report.counts.high, 0);
/// assert!(report.tier(RiskTier::High).next().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFactorReport {
    /// Cut used for `High`/`Medium`.
    pub threshold: f64,
    /// Counts over every classified file, shown or not.
    pub counts: TierCounts,
    /// Findings selected for display, in classifier order.
    pub findings: Vec<BusFactorFinding>,
}

impl BusFactorReport {
    /// Build a report; `None`-tier files are kept only when `include_none`.
    pub fn new(threshold: f64, findings: Vec<BusFactorFinding>, include_none: bool) -> Self {
        let counts = TierCounts::from_findings(&findings);
        let findings = findings
            .into_iter()
            .filter(|f| include_none || f.risk_tier != RiskTier::None)
            .collect();
        Self {
            threshold,
            counts,
            findings,
        }
    }

    /// Displayed findings in `tier`.
    pub fn tier(&self, tier: RiskTier) -> impl Iterator<Item = &BusFactorFinding> {
        self.findings.iter().filter(move |f| f.risk_tier == tier)
    }
}
