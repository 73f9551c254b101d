//! Churn aggregation and hotspot ranking.
//!
//! Folds the commit stream into per-file change totals. The aggregator is
//! window-agnostic: time scoping happens in the extractor, so any finite
//! commit sequence (including an empty one) is valid input.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::mining::CommitRecord;

/// A file ranked by churn.
///
/// # Examples
///
/// ```
/// use recap_history::churn::Hotspot;
///
/// let h = Hotspot {
///     path: "src/main.rs".into(),
///     total_changes: 500,
///     revisions: 22,
///     contributors: 5,
///     last_modified: 1_700_000_000,
/// };
/// assert_eq!(h.suggestion(), Some("Consider refactoring or adding more tests"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// File path relative to repo root.
    pub path: String,
    /// Lines added + deleted across all commits.
    pub total_changes: u64,
    /// Number of commits touching this file.
    pub revisions: u32,
    /// Number of distinct authors.
    pub contributors: u32,
    /// Unix timestamp of the most recent change.
    pub last_modified: i64,
}

impl Hotspot {
    /// Advisory note for heavily modified files, if one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        if self.revisions > 20 && self.contributors > 4 {
            Some("Consider refactoring or adding more tests")
        } else if self.contributors > 6 {
            Some("Consider assigning a code owner")
        } else if self.revisions > 15 {
            Some("Review for potential technical debt")
        } else {
            None
        }
    }
}

/// Sum `added + deleted` per path.
///
/// # Examples
///
/// ```
/// use recap_history::churn::aggregate_churn;
///
/// assert!(aggregate_churn(&[]).is_empty());
/// ```
pub fn aggregate_churn(commits: &[CommitRecord]) -> BTreeMap<String, u64> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for commit in commits {
        for file in &commit.files {
            *totals.entry(file.path.clone()).or_default() += file.churn();
        }
    }
    totals
}

/// Order churn totals by `total_changes` descending, then path ascending.
pub fn rank_churn(totals: BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Rank every touched file as a [`Hotspot`], highest churn first.
///
/// Ties on churn are broken by path so output is reproducible.
///
/// # Examples
///
/// ```
/// use recap_history::churn::rank_hotspots;
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, FileChange};
///
/// let commits = vec![CommitRecord {
///     id: "abc".into(),
///     author: Identity::new("alice", "alice@example.com"),
///     timestamp: 1000,
///     message: "init".into(),
///     files: vec![FileChange::new("a.rs", 1, 0), FileChange::new("b.rs", 4, 1)],
/// }];
/// let hotspots = rank_hotspots(&commits);
/// assert_eq!(hotspots[0].path, "b.rs");
/// assert_eq!(hotspots[0].total_changes, 5);
/// ```
pub fn rank_hotspots(commits: &[CommitRecord]) -> Vec<Hotspot> {
    #[derive(Default)]
    struct Accum<'a> {
        revisions: u32,
        authors: HashSet<&'a Identity>,
        last_modified: i64,
    }

    let totals = aggregate_churn(commits);

    let mut per_file: BTreeMap<&str, Accum<'_>> = BTreeMap::new();
    for commit in commits {
        for file in &commit.files {
            let entry = per_file.entry(file.path.as_str()).or_default();
            entry.revisions += 1;
            entry.authors.insert(&commit.author);
            entry.last_modified = entry.last_modified.max(commit.timestamp);
        }
    }

    rank_churn(totals)
        .into_iter()
        .map(|(path, total_changes)| {
            let accum = per_file.get(path.as_str());
            Hotspot {
                total_changes,
                revisions: accum.map_or(0, |a| a.revisions),
                contributors: accum.map_or(0, |a| a.authors.len() as u32),
                last_modified: accum.map_or(0, |a| a.last_modified),
                path,
            }
        })
        .collect()
}
