//! Per-file ownership accounting.
//!
//! Attributes each file's churn to the authors who produced it and derives
//! ownership percentages and the primary maintainer per path.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::mining::{normalize_prefix, CommitRecord};

/// One author's contribution to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorTally {
    /// Lines added + deleted by this author.
    pub changes: u64,
    /// Commits by this author touching the file.
    pub commits: u32,
    /// Position of the author's first touching commit in the stream.
    pub first_seen: usize,
    /// Unix timestamp of the author's first touching commit.
    pub first_commit: i64,
    /// Unix timestamp of the author's latest touching commit.
    pub last_commit: i64,
}

/// Aggregated churn for one file, split by author.
///
/// Invariant: the sum of `per_author[*].changes` equals `total_changes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// File path relative to repo root.
    pub path: String,
    /// Lines added + deleted across all authors.
    pub total_changes: u64,
    /// Contribution per author.
    pub per_author: BTreeMap<Identity, AuthorTally>,
}

impl FileStats {
    fn new(path: String) -> Self {
        Self {
            path,
            total_changes: 0,
            per_author: BTreeMap::new(),
        }
    }

    /// Ownership share of `author` in percent, if they touched the file.
    pub fn percent(&self, author: &Identity) -> Option<f64> {
        let tally = self.per_author.get(author)?;
        Some(share(tally.changes, self.total_changes))
    }

    /// Number of authors holding a nonzero share.
    pub fn contributors(&self) -> usize {
        self.per_author.values().filter(|t| t.changes > 0).count()
    }

    /// The author with the largest share.
    ///
    /// Ties go to whoever touched the file first.
    ///
    /// # Examples
    ///
    /// ```
    /// use recap_history::identity::Identity;
    /// use recap_history::mining::{CommitRecord, FileChange};
    /// use recap_history::ownership::aggregate_ownership;
    ///
    /// let commit = |name: &str, ts: i64| CommitRecord {
    ///     id: ts.to_string(),
    ///     author: Identity::new(name, format!("{name}@e.com")),
    ///     timestamp: ts,
    ///     message: String::new(),
    ///     files: vec![FileChange::new("lib.rs", 5, 0)],
    /// };
    /// let stats = aggregate_ownership(&[commit("zoe", 1), commit("adam", 2)], None);
    /// let primary = stats["lib.rs"].primary_maintainer().unwrap();
    /// assert_eq!(primary.owner.name, "zoe");
    /// assert_eq!(primary.percent, 50.0);
    /// ```
    pub fn primary_maintainer(&self) -> Option<OwnershipEntry> {
        self.per_author
            .iter()
            .max_by(|(_, a), (_, b)| {
                a.changes
                    .cmp(&b.changes)
                    .then_with(|| b.first_seen.cmp(&a.first_seen))
            })
            .map(|(identity, tally)| self.entry_for(identity, tally))
    }

    fn entry_for(&self, identity: &Identity, tally: &AuthorTally) -> OwnershipEntry {
        OwnershipEntry {
            path: self.path.clone(),
            owner: identity.clone(),
            percent: share(tally.changes, self.total_changes),
            total_lines: self.total_changes,
        }
    }
}

/// An author's share of a file.
///
/// `percent` keeps full precision; rounding happens only when displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipEntry {
    /// File path relative to repo root.
    pub path: String,
    /// The author.
    pub owner: Identity,
    /// Share of the file's churn, 0–100.
    pub percent: f64,
    /// Total churn of the file.
    pub total_lines: u64,
}

/// Fold commits into per-file, per-author churn.
///
/// `path_filter` is a prefix; files outside it are excluded entirely.
/// Paths whose total churn is zero are left out of the result.
///
/// # Examples
///
/// ```
/// use recap_history::ownership::aggregate_ownership;
///
/// assert!(aggregate_ownership(&[], Some("src/")).is_empty());
/// ```
pub fn aggregate_ownership(
    commits: &[CommitRecord],
    path_filter: Option<&str>,
) -> BTreeMap<String, FileStats> {
    let prefix = normalize_prefix(path_filter);
    let mut stats: BTreeMap<String, FileStats> = BTreeMap::new();

    for (seq, commit) in commits.iter().enumerate() {
        for file in &commit.files {
            if let Some(ref prefix) = prefix {
                if !file.path.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            let churn = file.churn();
            if churn == 0 {
                continue;
            }

            let file_stats = stats
                .entry(file.path.clone())
                .or_insert_with(|| FileStats::new(file.path.clone()));
            file_stats.total_changes += churn;

            let tally = file_stats
                .per_author
                .entry(commit.author.clone())
                .or_insert(AuthorTally {
                    changes: 0,
                    commits: 0,
                    first_seen: seq,
                    first_commit: commit.timestamp,
                    last_commit: commit.timestamp,
                });
            tally.changes += churn;
            tally.commits += 1;
            tally.first_commit = tally.first_commit.min(commit.timestamp);
            tally.last_commit = tally.last_commit.max(commit.timestamp);
        }
    }

    stats.retain(|_, s| s.total_changes > 0);
    stats
}

/// Primary maintainer of every file, most concentrated first.
///
/// Paths are independent, so entries are derived in parallel and then
/// sorted by percent descending, path ascending.
pub fn primary_maintainers(stats: &BTreeMap<String, FileStats>) -> Vec<OwnershipEntry> {
    let mut entries: Vec<OwnershipEntry> = stats
        .par_iter()
        .filter_map(|(_, s)| s.primary_maintainer())
        .collect();
    entries.sort_by(by_percent_then_path);
    entries
}

pub(crate) fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn by_percent_then_path(a: &OwnershipEntry, b: &OwnershipEntry) -> Ordering {
    b.percent
        .total_cmp(&a.percent)
        .then_with(|| a.path.cmp(&b.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::FileChange;

    fn make_commit(author: &str, timestamp: i64, files: Vec<(&str, u64, u64)>) -> CommitRecord {
        CommitRecord {
            id: format!("c{timestamp}"),
            author: Identity::new(author, format!("{author}@e.com")),
            timestamp,
            message: "test".into(),
            files: files
                .into_iter()
                .map(|(path, added, deleted)| FileChange::new(path, added, deleted))
                .collect(),
        }
    }

    fn id(name: &str) -> Identity {
        Identity::new(name, format!("{name}@e.com"))
    }

    #[test]
    fn two_authors_split_by_churn() {
        let commits = vec![
            make_commit("alice", 1, vec![("x.rs", 10, 0)]),
            make_commit("bob", 2, vec![("x.rs", 5, 0)]),
        ];
        let stats = aggregate_ownership(&commits, None);
        let x = &stats["x.rs"];
        assert_eq!(x.total_changes, 15);
        assert!((x.percent(&id("alice")).unwrap() - 66.666_666).abs() < 1e-3);
        assert!((x.percent(&id("bob")).unwrap() - 33.333_333).abs() < 1e-3);
        assert_eq!(x.contributors(), 2);
    }

    #[test]
    fn conservation_holds_per_path() {
        let commits = vec![
            make_commit("alice", 1, vec![("a.rs", 3, 2), ("b.rs", 1, 0)]),
            make_commit("bob", 2, vec![("a.rs", 0, 4)]),
            make_commit("alice", 3, vec![("a.rs", 7, 7), ("b.rs", 2, 2)]),
            make_commit("carol", 4, vec![("b.rs", 9, 0)]),
        ];
        for stats in aggregate_ownership(&commits, None).values() {
            let sum: u64 = stats.per_author.values().map(|t| t.changes).sum();
            assert_eq!(sum, stats.total_changes, "path {}", stats.path);
        }
    }

    #[test]
    fn path_filter_excludes_whole_files() {
        let commits = vec![make_commit(
            "alice",
            1,
            vec![("src/a.rs", 1, 0), ("tests/a.rs", 1, 0), ("srcgen/b.rs", 1, 0)],
        )];
        let stats = aggregate_ownership(&commits, Some("src/"));
        assert_eq!(stats.keys().collect::<Vec<_>>(), vec!["src/a.rs"]);

        let all = aggregate_ownership(&commits, Some("."));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn zero_churn_changes_are_ignored() {
        let commits = vec![make_commit("alice", 1, vec![("a.rs", 0, 0)])];
        assert!(aggregate_ownership(&commits, None).is_empty());
    }

    #[test]
    fn tally_tracks_commit_span() {
        let commits = vec![
            make_commit("alice", 100, vec![("a.rs", 1, 0)]),
            make_commit("alice", 300, vec![("a.rs", 1, 0)]),
            make_commit("alice", 200, vec![("a.rs", 1, 0)]),
        ];
        let stats = aggregate_ownership(&commits, None);
        let tally = &stats["a.rs"].per_author[&id("alice")];
        assert_eq!(tally.commits, 3);
        assert_eq!(tally.first_commit, 100);
        assert_eq!(tally.last_commit, 300);
        assert_eq!(tally.first_seen, 0);
    }

    #[test]
    fn primary_tie_goes_to_earliest_author() {
        let commits = vec![
            make_commit("mallory", 1, vec![("a.rs", 4, 0)]),
            make_commit("bob", 2, vec![("a.rs", 2, 0)]),
            make_commit("aaron", 3, vec![("a.rs", 4, 0)]),
        ];
        let stats = aggregate_ownership(&commits, None);
        let primary = stats["a.rs"].primary_maintainer().unwrap();
        assert_eq!(primary.owner, id("mallory"));
        assert_eq!(primary.percent, 40.0);
        assert_eq!(primary.total_lines, 10);
    }

    #[test]
    fn primary_maintainers_sorted_by_concentration() {
        let commits = vec![
            make_commit("alice", 1, vec![("b.rs", 10, 0), ("a.rs", 1, 0), ("c.rs", 1, 0)]),
            make_commit("bob", 2, vec![("a.rs", 1, 0), ("c.rs", 3, 0)]),
        ];
        let stats = aggregate_ownership(&commits, None);
        let entries = primary_maintainers(&stats);
        let order: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(order, vec!["b.rs", "c.rs", "a.rs"]);
        assert_eq!(entries[0].percent, 100.0);
        assert_eq!(entries[1].percent, 75.0);
        assert_eq!(entries[2].percent, 50.0);
        assert_eq!(entries[2].owner, id("alice"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let commits = vec![
            make_commit("alice", 1, vec![("a.rs", 3, 0), ("b.rs", 1, 1)]),
            make_commit("bob", 2, vec![("a.rs", 3, 0)]),
        ];
        let first = aggregate_ownership(&commits, None);
        let second = aggregate_ownership(&commits, None);
        assert_eq!(first, second);
        assert_eq!(primary_maintainers(&first), primary_maintainers(&second));
    }
}
