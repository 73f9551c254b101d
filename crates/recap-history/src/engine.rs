//! High-level entry point tying extraction to the analyses.

use recap_core::RecapError;
use tracing::debug;

use crate::bus_factor::{classify, BusFactorFinding, TierConfig};
use crate::churn::{rank_hotspots, Hotspot};
use crate::experts::{rank_experts, Expert};
use crate::identity::{ExactIdentity, IdentityNormalizer};
use crate::mining::{normalize_path, CommitRecord, CommitSource, MiningOptions};
use crate::ownership::aggregate_ownership;
use crate::recap::{summarize, RecapSummary};
use crate::since::Since;

/// Runs the history analyses over a [`CommitSource`].
///
/// Every call re-extracts and folds into fresh maps, so calls are
/// independent of each other.
///
/// # Examples
///
/// ```
/// use recap_history::engine::HistoryEngine;
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, FileChange, InMemoryHistory};
///
/// let commit = |name: &str, added: u64| CommitRecord {
///     id: name.into(),
///     author: Identity::new(name, format!("{name}@e.com")),
///     timestamp: 0,
///     message: String::new(),
///     files: vec![FileChange::new("x.rs", added, 0)],
/// };
/// let engine = HistoryEngine::new(InMemoryHistory::new(vec![commit("a", 10), commit("b", 5)]));
///
/// let experts = engine.who_knows("x.rs").unwrap();
/// assert_eq!(experts.len(), 2);
/// assert!(engine.bus_factor(None, Some(0.0)).is_err());
/// ```
pub struct HistoryEngine<S> {
    source: S,
    options: MiningOptions,
    normalizer: Box<dyn IdentityNormalizer>,
    tiers: TierConfig,
}

impl<S: CommitSource> HistoryEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: MiningOptions::default(),
            normalizer: Box::new(ExactIdentity),
            tiers: TierConfig::default(),
        }
    }

    /// Base extraction options shared by every analysis.
    pub fn with_options(mut self, options: MiningOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn IdentityNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_tiers(mut self, tiers: TierConfig) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Files ranked by churn within `since`, optionally under `path`.
    ///
    /// # Errors
    ///
    /// Propagates extraction failures.
    pub fn hotspots(&self, since: Since, path: Option<&str>) -> Result<Vec<Hotspot>, RecapError> {
        let options = MiningOptions {
            since,
            path_filter: path.map(str::to_string),
            ..self.options.clone()
        };
        let commits = self.commits(&options)?;
        Ok(rank_hotspots(&commits))
    }

    /// Contributors to exactly `path`, most knowledgeable first.
    ///
    /// A path with no recorded changes yields an empty list.
    ///
    /// # Errors
    ///
    /// Propagates extraction failures.
    pub fn who_knows(&self, path: &str) -> Result<Vec<Expert>, RecapError> {
        let path = normalize_path(path);
        let options = MiningOptions {
            path_filter: Some(path.clone()),
            ..self.options.clone()
        };
        let commits = self.commits(&options)?;
        let stats = aggregate_ownership(&commits, None);
        Ok(stats.get(&path).map(rank_experts).unwrap_or_default())
    }

    /// Classify files under `scope` by ownership concentration.
    ///
    /// `threshold` overrides the configured cut for this call.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidThreshold`] before touching history if
    /// `threshold` is outside `(0, 100]`; otherwise propagates extraction
    /// failures.
    pub fn bus_factor(
        &self,
        scope: Option<&str>,
        threshold: Option<f64>,
    ) -> Result<Vec<BusFactorFinding>, RecapError> {
        let tiers = match threshold {
            Some(t) => self.tiers.with_threshold(t)?,
            None => self.tiers,
        };
        let options = MiningOptions {
            path_filter: scope.map(str::to_string),
            ..self.options.clone()
        };
        let commits = self.commits(&options)?;
        let stats = aggregate_ownership(&commits, scope);
        Ok(classify(&stats, &tiers, scope))
    }

    /// Commits matching `author` within `since`, with their totals.
    ///
    /// # Errors
    ///
    /// Propagates extraction failures.
    pub fn recap(
        &self,
        author: Option<&str>,
        since: Since,
    ) -> Result<(Vec<CommitRecord>, RecapSummary), RecapError> {
        let options = MiningOptions {
            since,
            author: author.map(str::to_string),
            ..self.options.clone()
        };
        let commits = self.commits(&options)?;
        let summary = summarize(&commits);
        Ok((commits, summary))
    }

    fn commits(&self, options: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError> {
        let mut commits = self.source.extract(options)?;
        for commit in &mut commits {
            commit.author = self.normalizer.normalize(&commit.author);
        }
        debug!(commits = commits.len(), "commits ready for analysis");
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_factor::RiskTier;
    use crate::identity::{CaseInsensitiveEmail, Identity};
    use crate::mining::{FileChange, InMemoryHistory};

    fn make_commit(
        author: &str,
        email: &str,
        timestamp: i64,
        files: Vec<(&str, u64, u64)>,
    ) -> CommitRecord {
        CommitRecord {
            id: format!("c{timestamp}"),
            author: Identity::new(author, email),
            timestamp,
            message: format!("commit {timestamp}"),
            files: files
                .into_iter()
                .map(|(p, a, d)| FileChange::new(p, a, d))
                .collect(),
        }
    }

    fn engine(commits: Vec<CommitRecord>) -> HistoryEngine<InMemoryHistory> {
        HistoryEngine::new(InMemoryHistory::new(commits))
    }

    fn two_author_history() -> Vec<CommitRecord> {
        vec![
            make_commit("A", "a@e.com", 100, vec![("X", 10, 0)]),
            make_commit("B", "b@e.com", 200, vec![("X", 5, 0)]),
        ]
    }

    #[test]
    fn who_knows_two_authors() {
        let experts = engine(two_author_history()).who_knows("X").unwrap();
        let shares: Vec<_> = experts
            .iter()
            .map(|e| (e.identity.name.as_str(), format!("{:.1}", e.percent)))
            .collect();
        assert_eq!(
            shares,
            vec![("A", "66.7".to_string()), ("B", "33.3".to_string())]
        );
    }

    #[test]
    fn who_knows_requires_exact_path() {
        let history = vec![
            make_commit("A", "a@e.com", 100, vec![("src/lib.rs", 3, 0)]),
            make_commit("B", "b@e.com", 200, vec![("src/lib.rs.orig", 9, 0)]),
        ];
        let experts = engine(history).who_knows("./src/lib.rs").unwrap();
        assert_eq!(experts.len(), 1);
        assert_eq!(experts[0].identity.name, "A");
        assert_eq!(experts[0].percent, 100.0);
    }

    #[test]
    fn who_knows_unknown_path_is_empty() {
        assert!(engine(two_author_history())
            .who_knows("missing.rs")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn bus_factor_medium_at_sixty() {
        let findings = engine(two_author_history())
            .bus_factor(None, Some(60.0))
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].risk_tier, RiskTier::Medium);
        assert_eq!(findings[0].dominant_owner.name, "A");
    }

    #[test]
    fn bus_factor_uses_configured_tiers_without_override() {
        let tiers = TierConfig::new(70.0, 10.0).unwrap();
        let findings = engine(two_author_history())
            .with_tiers(tiers)
            .bus_factor(None, None)
            .unwrap();
        assert_eq!(findings[0].risk_tier, RiskTier::Low);
    }

    #[test]
    fn invalid_threshold_fails_without_output() {
        let engine = engine(two_author_history());
        for bad in [0.0, 150.0, f64::NAN] {
            let err = engine.bus_factor(None, Some(bad)).unwrap_err();
            assert!(matches!(err, RecapError::InvalidThreshold(_)));
        }
    }

    #[test]
    fn invalid_threshold_is_checked_before_extraction() {
        struct Failing;
        impl CommitSource for Failing {
            fn extract(&self, _: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError> {
                Err(RecapError::Extraction("unreachable history".into()))
            }
        }
        let err = HistoryEngine::new(Failing)
            .bus_factor(None, Some(0.0))
            .unwrap_err();
        assert!(matches!(err, RecapError::InvalidThreshold(_)));

        let err = HistoryEngine::new(Failing)
            .bus_factor(None, Some(50.0))
            .unwrap_err();
        assert!(matches!(err, RecapError::Extraction(_)));
    }

    #[test]
    fn hotspots_scenario_orders_by_churn() {
        let history = vec![make_commit(
            "A",
            "a@e.com",
            100,
            vec![("b.rs", 2, 1), ("c.rs", 1, 0), ("a.rs", 4, 1)],
        )];
        let ranked: Vec<_> = engine(history)
            .hotspots(Since::All, None)
            .unwrap()
            .into_iter()
            .map(|h| (h.path, h.total_changes))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("a.rs".to_string(), 5),
                ("b.rs".to_string(), 3),
                ("c.rs".to_string(), 1),
            ]
        );
    }

    #[test]
    fn hotspots_respect_window_and_path() {
        let history = vec![
            make_commit("A", "a@e.com", 100, vec![("src/old.rs", 50, 0)]),
            make_commit("A", "a@e.com", 500, vec![("src/new.rs", 5, 0), ("docs/x.md", 9, 0)]),
        ];
        let engine = engine(history);

        let recent = engine.hotspots(Since::After(500), None).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].path, "docs/x.md");

        let src = engine.hotspots(Since::All, Some("src")).unwrap();
        let paths: Vec<_> = src.into_iter().map(|h| h.path).collect();
        assert_eq!(paths, vec!["src/old.rs", "src/new.rs"]);
    }

    #[test]
    fn empty_history_yields_empty_results() {
        let engine = engine(Vec::new());
        assert!(engine.hotspots(Since::All, None).unwrap().is_empty());
        assert!(engine.bus_factor(None, Some(80.0)).unwrap().is_empty());
        assert!(engine.who_knows("a.rs").unwrap().is_empty());
        let (commits, summary) = engine.recap(None, Since::All).unwrap();
        assert!(commits.is_empty());
        assert_eq!(summary, RecapSummary::default());
    }

    #[test]
    fn normalizer_merges_case_variants() {
        let history = vec![
            make_commit("Alice", "Alice@E.com", 100, vec![("a.rs", 3, 0)]),
            make_commit("Alice", "alice@e.com", 200, vec![("a.rs", 1, 0)]),
        ];

        let exact = engine(history.clone()).who_knows("a.rs").unwrap();
        assert_eq!(exact.len(), 2);

        let merged = engine(history)
            .with_normalizer(Box::new(CaseInsensitiveEmail))
            .who_knows("a.rs")
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].changes, 4);
        assert_eq!(merged[0].commits, 2);
    }

    #[test]
    fn recap_filters_by_author_and_window() {
        let history = vec![
            make_commit("alice", "alice@e.com", 100, vec![("a.rs", 3, 1)]),
            make_commit("bob", "bob@e.com", 150, vec![("a.rs", 7, 0)]),
            make_commit("alice", "alice@e.com", 200, vec![("b.rs", 2, 2)]),
            make_commit("alice", "alice@e.com", 300, vec![("a.rs", 1, 0)]),
        ];
        let (commits, summary) = engine(history)
            .recap(Some("alice"), Since::After(150))
            .unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].timestamp, 200);
        assert_eq!(summary.lines_added, 3);
        assert_eq!(summary.lines_deleted, 2);
        assert_eq!(summary.files_touched, 2);
    }

    #[test]
    fn base_options_carry_into_every_call() {
        let history = vec![
            make_commit("A", "a@e.com", 100, vec![("a", 1, 0), ("b", 1, 0), ("c", 1, 0)]),
            make_commit("B", "b@e.com", 200, vec![("a", 2, 0)]),
        ];
        let engine = engine(history).with_options(MiningOptions {
            max_files_per_commit: Some(2),
            ..MiningOptions::default()
        });
        let hotspots = engine.hotspots(Since::All, None).unwrap();
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].contributors, 1);
    }
}
