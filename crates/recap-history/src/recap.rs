//! Per-author activity summary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::mining::CommitRecord;

/// Totals over a set of commits.
///
/// # Examples
///
/// ```
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, FileChange};
/// use recap_history::recap::summarize;
///
/// let commits = vec![CommitRecord {
///     id: "abc12345".into(),
///     author: Identity::new("alice", "alice@example.com"),
///     timestamp: 0,
///     message: "feat: parser".into(),
///     files: vec![FileChange::new("src/parse.rs", 40, 2), FileChange::new("README.md", 3, 1)],
/// }];
/// let summary = summarize(&commits);
/// assert_eq!(summary.commits, 1);
/// assert_eq!(summary.lines_added, 43);
/// assert_eq!(summary.lines_deleted, 3);
/// assert_eq!(summary.files_touched, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapSummary {
    pub commits: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Distinct paths across all commits.
    pub files_touched: usize,
}

pub fn summarize(commits: &[CommitRecord]) -> RecapSummary {
    let mut paths = BTreeSet::new();
    let mut summary = RecapSummary {
        commits: commits.len(),
        ..RecapSummary::default()
    };
    for commit in commits {
        for file in &commit.files {
            summary.lines_added += file.added;
            summary.lines_deleted += file.deleted;
            paths.insert(file.path.as_str());
        }
    }
    summary.files_touched = paths.len();
    summary
}
