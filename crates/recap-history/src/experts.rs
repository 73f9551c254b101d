//! File expertise ranking ("who knows this file?").

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ownership::{share, FileStats};

/// One contributor's standing on a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    /// The contributor.
    pub identity: Identity,
    /// Share of the file's churn, 0–100.
    pub percent: f64,
    /// Lines added + deleted by this contributor.
    pub changes: u64,
    /// Commits by this contributor touching the file.
    pub commits: u32,
    /// Unix timestamp of the first touching commit.
    pub first_commit: i64,
    /// Unix timestamp of the latest touching commit.
    pub last_commit: i64,
}

/// Rank a file's contributors by ownership share.
///
/// Sorted by percent descending; equal shares are ordered by author name,
/// then email.
///
/// # Examples
///
/// ```
/// use recap_history::experts::rank_experts;
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, FileChange};
/// use recap_history::ownership::aggregate_ownership;
///
/// let commit = |name: &str, added: u64| CommitRecord {
///     id: name.into(),
///     author: Identity::new(name, format!("{name}@e.com")),
///     timestamp: 0,
///     message: String::new(),
///     files: vec![FileChange::new("x.rs", added, 0)],
/// };
/// let stats = aggregate_ownership(&[commit("alice", 10), commit("bob", 5)], None);
/// let experts = rank_experts(&stats["x.rs"]);
/// assert_eq!(experts[0].identity.name, "alice");
/// assert_eq!(format!("{:.1}", experts[0].percent), "66.7");
/// assert_eq!(format!("{:.1}", experts[1].percent), "33.3");
/// ```
pub fn rank_experts(stats: &FileStats) -> Vec<Expert> {
    let mut experts: Vec<Expert> = stats
        .per_author
        .iter()
        .map(|(identity, tally)| Expert {
            identity: identity.clone(),
            percent: share(tally.changes, stats.total_changes),
            changes: tally.changes,
            commits: tally.commits,
            first_commit: tally.first_commit,
            last_commit: tally.last_commit,
        })
        .collect();

    experts.sort_by(|a, b| {
        b.changes
            .cmp(&a.changes)
            .then_with(|| a.identity.name.cmp(&b.identity.name))
            .then_with(|| a.identity.email.cmp(&b.identity.email))
    });
    experts
}
