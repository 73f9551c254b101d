//! Git history extraction via git2.
//!
//! Produces the oldest-first [`CommitRecord`] stream every analysis consumes,
//! with per-file line additions and deletions, author identity, and
//! timestamps. Window, author, and path filters are applied here so the
//! aggregators never see out-of-scope data.

use std::path::{Path, PathBuf};

use git2::{Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, Patch, Repository, Sort};
use recap_core::RecapError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::identity::Identity;
use crate::since::Since;

/// A single commit as seen by the analysis engine.
///
/// # Examples
///
/// ```
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, FileChange};
///
/// let record = CommitRecord {
///     id: "abc12345".into(),
///     author: Identity::new("alice", "alice@example.com"),
///     timestamp: 1_700_000_000,
///     message: "fix: auth bug".into(),
///     files: vec![FileChange::new("src/auth.rs", 10, 3)],
/// };
/// assert_eq!(record.churn(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Abbreviated commit hash.
    pub id: String,
    /// Commit author.
    pub author: Identity,
    /// Unix timestamp of the authored time.
    pub timestamp: i64,
    /// First line of the commit message.
    pub message: String,
    /// Files changed in this commit, in diff order.
    pub files: Vec<FileChange>,
}

impl CommitRecord {
    /// Total lines added plus deleted across all files.
    pub fn churn(&self) -> u64 {
        self.files.iter().map(FileChange::churn).sum()
    }
}

/// Line counts for one file within a commit.
///
/// # Examples
///
/// ```
/// use recap_history::mining::FileChange;
///
/// let change = FileChange::new("./src/main.rs", 10, 3);
/// assert_eq!(change.path, "src/main.rs");
/// assert_eq!(change.churn(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Repo-relative path with forward slashes.
    pub path: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl FileChange {
    pub fn new(path: &str, added: u64, deleted: u64) -> Self {
        Self {
            path: normalize_path(path),
            added,
            deleted,
        }
    }

    /// Churn contribution of this change.
    pub fn churn(&self) -> u64 {
        self.added + self.deleted
    }
}

/// Options for history extraction.
///
/// # Examples
///
/// ```
/// use recap_history::mining::MiningOptions;
/// use recap_history::since::Since;
///
/// let opts = MiningOptions::default();
/// assert_eq!(opts.since, Since::All);
/// assert!(opts.author.is_none());
/// assert!(!opts.include_merges);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Only include commits inside this window.
    pub since: Since,
    /// Case-insensitive substring match against `"Name <email>"`.
    pub author: Option<String>,
    /// Only keep file changes under this path prefix.
    pub path_filter: Option<String>,
    /// Skip commits touching more files than this.
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Also diff merge commits against their first parent.
    pub include_merges: bool,
}

impl MiningOptions {
    /// Whether `author` passes the author filter.
    pub fn matches_author(&self, author: &Identity) -> bool {
        match &self.author {
            None => true,
            Some(needle) => author
                .to_string()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }

    /// Apply every filter to a fully built record.
    ///
    /// Returns `None` when the commit is out of scope, and the number of
    /// zero-line file changes that were discarded along the way.
    fn scope(&self, mut record: CommitRecord) -> (Option<CommitRecord>, usize) {
        if !self.since.includes(record.timestamp) || !self.matches_author(&record.author) {
            return (None, 0);
        }
        if let Some(max) = self.max_files_per_commit {
            if record.files.len() > max {
                debug!(commit = %record.id, files = record.files.len(), "skipping oversized commit");
                return (None, 0);
            }
        }

        let before = record.files.len();
        record.files.retain(|f| f.churn() > 0);
        let dropped = before - record.files.len();

        if let Some(prefix) = normalize_prefix(self.path_filter.as_deref()) {
            record.files.retain(|f| f.path.starts_with(&prefix));
            if record.files.is_empty() {
                return (None, dropped);
            }
        }

        (Some(record), dropped)
    }
}

/// Anything that can produce an oldest-first commit stream.
pub trait CommitSource {
    /// Extract commits matching `options`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::Extraction`] if the underlying history cannot
    /// be read.
    fn extract(&self, options: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError>;
}

/// In-memory history, already in chronological order.
///
/// # Examples
///
/// ```
/// use recap_history::identity::Identity;
/// use recap_history::mining::{CommitRecord, CommitSource, FileChange, InMemoryHistory, MiningOptions};
///
/// let history = InMemoryHistory::new(vec![CommitRecord {
///     id: "1".into(),
///     author: Identity::new("alice", "a@e.com"),
///     timestamp: 10,
///     message: "init".into(),
///     files: vec![FileChange::new("a.rs", 0, 0), FileChange::new("b.rs", 2, 0)],
/// }]);
/// let commits = history.extract(&MiningOptions::default()).unwrap();
/// assert_eq!(commits[0].files.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    commits: Vec<CommitRecord>,
}

impl InMemoryHistory {
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self { commits }
    }
}

impl CommitSource for InMemoryHistory {
    fn extract(&self, options: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError> {
        let mut dropped = 0usize;
        let commits = self
            .commits
            .iter()
            .cloned()
            .filter_map(|c| {
                let (kept, zeroes) = options.scope(c);
                dropped += zeroes;
                kept
            })
            .collect();
        if dropped > 0 {
            debug!(dropped, "dropped file changes with no line delta");
        }
        Ok(commits)
    }
}

/// A git repository opened through libgit2.
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::InvalidRepository`] if `path` is not inside a
    /// git repository.
    pub fn open(path: &Path) -> Result<Self, RecapError> {
        let repo = Repository::discover(path)
            .map_err(|_| RecapError::InvalidRepository(path.to_path_buf()))?;
        info!("Opened git repository at {}", path.display());
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Path the repository was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `user.name` from the repository's effective git configuration.
    pub fn user_name(&self) -> Option<String> {
        let config = self.repo.config().ok()?;
        let name = config.get_string("user.name").ok()?;
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Unified patch of commit `id` against its first parent, as `git show`
    /// prints it.
    ///
    /// # Errors
    ///
    /// Returns [`RecapError::Extraction`] if `id` does not name a commit or
    /// the diff cannot be rendered.
    pub fn commit_diff(&self, id: &str) -> Result<String, RecapError> {
        let commit = self
            .repo
            .revparse_single(id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| RecapError::Extraction(format!("failed to find commit '{id}': {e}")))?;
        let diff = first_parent_diff(&self.repo, &commit)?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })
        .map_err(|e| RecapError::Extraction(format!("failed to render diff: {e}")))?;
        Ok(patch)
    }
}

impl CommitSource for GitRepository {
    fn extract(&self, options: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError> {
        mine_history(&self.repo, options)
    }
}

fn mine_history(repo: &Repository, options: &MiningOptions) -> Result<Vec<CommitRecord>, RecapError> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| RecapError::Extraction(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
        .map_err(|e| RecapError::Extraction(format!("failed to sort revwalk: {e}")))?;

    if let Some(ref branch) = options.branch {
        let reference = repo.resolve_reference_from_short_name(branch).map_err(|e| {
            RecapError::Extraction(format!("failed to resolve branch '{branch}': {e}"))
        })?;
        let oid = reference
            .target()
            .ok_or_else(|| RecapError::Extraction(format!("branch '{branch}' has no target")))?;
        revwalk
            .push(oid)
            .map_err(|e| RecapError::Extraction(format!("failed to push oid: {e}")))?;
    } else {
        // A freshly initialized repository has no HEAD yet: empty history.
        if repo.is_empty().unwrap_or(false) {
            return Ok(Vec::new());
        }
        revwalk
            .push_head()
            .map_err(|e| RecapError::Extraction(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();
    let mut dropped = 0usize;

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| RecapError::Extraction(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| RecapError::Extraction(format!("failed to find commit: {e}")))?;

        let timestamp = commit.author().when().seconds();
        if !options.since.includes(timestamp) {
            continue;
        }
        if commit.parent_count() > 1 && !options.include_merges {
            continue;
        }

        let author = commit.author();
        let identity = Identity::new(
            author.name().unwrap_or("unknown"),
            author.email().unwrap_or("unknown"),
        );
        if !options.matches_author(&identity) {
            continue;
        }

        let hash = oid.to_string();
        let record = CommitRecord {
            id: hash[..hash.len().min(8)].to_string(),
            author: identity,
            timestamp,
            message: commit.summary().unwrap_or("").to_string(),
            files: extract_file_changes(repo, &commit)?,
        };

        let (kept, zeroes) = options.scope(record);
        dropped += zeroes;
        if let Some(record) = kept {
            commits.push(record);
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped file changes with no line delta");
    }
    debug!(commits = commits.len(), "history extraction finished");

    Ok(commits)
}

/// Diff `commit` against its first parent (the empty tree for roots), with
/// renames detected.
fn first_parent_diff<'r>(
    repo: &'r Repository,
    commit: &git2::Commit<'_>,
) -> Result<Diff<'r>, RecapError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| RecapError::Extraction(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| RecapError::Extraction(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| RecapError::Extraction(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), Some(&mut diff_opts))
        .map_err(|e| RecapError::Extraction(format!("failed to compute diff: {e}")))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| RecapError::Extraction(format!("failed to find renames: {e}")))?;

    Ok(diff)
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit<'_>,
) -> Result<Vec<FileChange>, RecapError> {
    let diff = first_parent_diff(repo, commit)?;

    let mut changes = Vec::with_capacity(diff.deltas().len());
    for (idx, delta) in diff.deltas().enumerate() {
        let file = match delta.status() {
            Delta::Deleted => delta.old_file(),
            _ => delta.new_file(),
        };
        let Some(path) = file.path() else {
            continue;
        };
        let path = path.to_string_lossy();

        let (added, deleted) = match Patch::from_diff(&diff, idx)
            .map_err(|e| RecapError::Extraction(format!("failed to build patch: {e}")))?
        {
            Some(patch) => {
                let (_, additions, deletions) = patch
                    .line_stats()
                    .map_err(|e| RecapError::Extraction(format!("failed to count lines: {e}")))?;
                (additions as u64, deletions as u64)
            }
            None => (0, 0),
        };

        changes.push(FileChange::new(&path, added, deleted));
    }

    Ok(changes)
}

/// Normalize a path to the repo-relative, forward-slash form.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Normalize a path-scope argument; `None` means the whole repository.
///
/// # Examples
///
/// ```
/// use recap_history::mining::normalize_prefix;
///
/// assert_eq!(normalize_prefix(Some(".")), None);
/// assert_eq!(normalize_prefix(Some("./src/")), Some("src/".to_string()));
/// assert_eq!(normalize_prefix(None), None);
/// ```
pub fn normalize_prefix(filter: Option<&str>) -> Option<String> {
    let normalized = normalize_path(filter?);
    match normalized.as_str() {
        "" | "." => None,
        _ => Some(normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn record(author: &str, timestamp: i64, files: Vec<(&str, u64, u64)>) -> CommitRecord {
        CommitRecord {
            id: format!("c{timestamp}"),
            author: Identity::new(author, format!("{author}@example.com")),
            timestamp,
            message: "test".into(),
            files: files
                .into_iter()
                .map(|(p, a, d)| FileChange::new(p, a, d))
                .collect(),
        }
    }

    /// Commit `files` (path, content) on top of HEAD in `repo`.
    fn commit_files(repo: &Repository, author: &str, time: i64, files: &[(&str, &str)]) {
        let workdir = repo.workdir().unwrap().to_path_buf();
        let mut index = repo.index().unwrap();
        for (path, content) in files {
            let full = workdir.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::new(
            author,
            &format!("{author}@example.com"),
            &git2::Time::new(time, 0),
        )
        .unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parent_refs)
            .unwrap();
    }

    fn fixture_repo() -> (tempfile::TempDir, GitRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_files(&repo, "alice", 1_000, &[("src/lib.rs", "a\nb\nc\n")]);
        commit_files(&repo, "bob", 2_000, &[("src/lib.rs", "a\nB\nc\nd\n")]);
        commit_files(&repo, "alice", 3_000, &[("README.md", "hello\n")]);
        let opened = GitRepository::open(dir.path()).unwrap();
        (dir, opened)
    }

    /// Commit a snapshot of top-level `files` with explicit parents,
    /// moving `update_ref` to the new commit.
    fn commit_snapshot(
        repo: &Repository,
        update_ref: &str,
        author: &str,
        time: i64,
        files: &[(&str, &str)],
        parents: &[git2::Oid],
    ) -> git2::Oid {
        let mut builder = repo.treebuilder(None).unwrap();
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(*name, blob, 0o100644).unwrap();
        }
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        let sig = Signature::new(
            author,
            &format!("{author}@example.com"),
            &git2::Time::new(time, 0),
        )
        .unwrap();
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some(update_ref), &sig, &sig, "change", &tree, &parent_refs)
            .unwrap()
    }

    /// alice adds a.txt; bob adds b.txt on a side branch; carol renames
    /// a.txt to c.txt on the main line; dave merges the side branch.
    fn merge_fixture() -> (tempfile::TempDir, GitRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let ten: String = (1..=10).map(|i| format!("line {i}\n")).collect();
        let ten = ten.as_str();

        let base = commit_snapshot(&repo, "HEAD", "alice", 1_000, &[("a.txt", ten)], &[]);
        let side = commit_snapshot(
            &repo,
            "refs/heads/side",
            "bob",
            2_000,
            &[("a.txt", ten), ("b.txt", "x\ny\n")],
            &[base],
        );
        let renamed = commit_snapshot(&repo, "HEAD", "carol", 3_000, &[("c.txt", ten)], &[base]);
        commit_snapshot(
            &repo,
            "HEAD",
            "dave",
            4_000,
            &[("c.txt", ten), ("b.txt", "x\ny\n")],
            &[renamed, side],
        );

        let opened = GitRepository::open(dir.path()).unwrap();
        (dir, opened)
    }

    #[test]
    fn merge_commits_are_skipped_by_default() {
        let (_dir, repo) = merge_fixture();
        let commits = repo.extract(&MiningOptions::default()).unwrap();
        let mut authors: Vec<_> = commits.iter().map(|c| c.author.name.as_str()).collect();
        authors.sort_unstable();
        assert_eq!(authors, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn merge_commits_diff_against_first_parent_when_included() {
        let (_dir, repo) = merge_fixture();
        let opts = MiningOptions {
            include_merges: true,
            ..MiningOptions::default()
        };
        let commits = repo.extract(&opts).unwrap();
        assert_eq!(commits.len(), 4);
        let merge = commits.last().unwrap();
        assert_eq!(merge.author.name, "dave");
        assert_eq!(merge.files, vec![FileChange::new("b.txt", 2, 0)]);
    }

    #[test]
    fn pure_rename_leaves_no_zero_churn_entry() {
        let (_dir, repo) = merge_fixture();
        let commits = repo.extract(&MiningOptions::default()).unwrap();

        let carol = commits.iter().find(|c| c.author.name == "carol").unwrap();
        assert!(carol.files.is_empty());

        let changes: Vec<&FileChange> = commits.iter().flat_map(|c| &c.files).collect();
        assert!(changes.iter().all(|f| f.churn() > 0));
        assert!(changes.iter().all(|f| f.path != "c.txt"));
        assert_eq!(commits[0].files, vec![FileChange::new("a.txt", 10, 0)]);
    }

    #[test]
    fn commit_diff_renders_patch_lines() {
        let (_dir, repo) = fixture_repo();
        let commits = repo.extract(&MiningOptions::default()).unwrap();

        let patch = repo.commit_diff(&commits[1].id).unwrap();
        assert!(patch.contains("src/lib.rs"));
        assert!(patch.contains("-b\n"));
        assert!(patch.contains("+B\n"));
        assert!(patch.contains("+d\n"));
        assert!(patch.contains(" a\n"));

        let root = repo.commit_diff(&commits[0].id).unwrap();
        assert!(root.contains("+a\n+b\n+c\n"));
    }

    #[test]
    fn commit_diff_of_unknown_id_fails() {
        let (_dir, repo) = fixture_repo();
        let err = repo.commit_diff("0000000000").unwrap_err();
        assert!(matches!(err, RecapError::Extraction(_)));
    }

    #[test]
    fn default_options_are_unbounded() {
        let opts = MiningOptions::default();
        assert_eq!(opts.since, Since::All);
        assert!(opts.path_filter.is_none());
        assert!(opts.max_files_per_commit.is_none());
        assert!(opts.branch.is_none());
    }

    #[test]
    fn git_history_is_oldest_first_with_line_counts() {
        let (_dir, repo) = fixture_repo();
        let commits = repo.extract(&MiningOptions::default()).unwrap();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].author.name, "alice");
        assert_eq!(commits[0].files, vec![FileChange::new("src/lib.rs", 3, 0)]);
        // "b" -> "B" plus a new "d" line.
        assert_eq!(commits[1].files, vec![FileChange::new("src/lib.rs", 2, 1)]);
        assert_eq!(commits[2].files[0].path, "README.md");
        assert!(commits.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn git_filters_apply() {
        let (_dir, repo) = fixture_repo();
        let opts = MiningOptions {
            since: Since::After(1_500),
            author: Some("ALICE".into()),
            ..MiningOptions::default()
        };
        let commits = repo.extract(&opts).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].timestamp, 3_000);

        let scoped = MiningOptions {
            path_filter: Some("./src".into()),
            ..MiningOptions::default()
        };
        let commits = repo.extract(&scoped).unwrap();
        assert_eq!(commits.len(), 2);
        assert!(commits.iter().all(|c| c.files[0].path == "src/lib.rs"));
    }

    #[test]
    fn empty_repository_yields_no_commits() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let repo = GitRepository::open(dir.path()).unwrap();
        assert!(repo.extract(&MiningOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn non_repository_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitRepository::open(dir.path()).err().unwrap();
        assert!(matches!(err, RecapError::InvalidRepository(_)));
    }

    #[test]
    fn unknown_branch_is_an_extraction_failure() {
        let (_dir, repo) = fixture_repo();
        let opts = MiningOptions {
            branch: Some("does-not-exist".into()),
            ..MiningOptions::default()
        };
        let err = repo.extract(&opts).unwrap_err();
        assert!(matches!(err, RecapError::Extraction(_)));
    }

    #[test]
    fn zero_line_changes_are_dropped() {
        let history = InMemoryHistory::new(vec![record(
            "alice",
            1,
            vec![("bin.png", 0, 0), ("a.rs", 1, 0)],
        )]);
        let commits = history.extract(&MiningOptions::default()).unwrap();
        assert_eq!(commits[0].files, vec![FileChange::new("a.rs", 1, 0)]);
    }

    #[test]
    fn oversized_commits_are_skipped() {
        let history = InMemoryHistory::new(vec![
            record("alice", 1, vec![("a", 1, 0), ("b", 1, 0), ("c", 1, 0)]),
            record("bob", 2, vec![("a", 1, 0)]),
        ]);
        let opts = MiningOptions {
            max_files_per_commit: Some(2),
            ..MiningOptions::default()
        };
        let commits = history.extract(&opts).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].author.name, "bob");
    }

    #[test]
    fn path_filter_drops_commits_without_matches() {
        let history = InMemoryHistory::new(vec![
            record("alice", 1, vec![("src/a.rs", 1, 0), ("docs/x.md", 4, 0)]),
            record("bob", 2, vec![("docs/y.md", 1, 0)]),
        ]);
        let opts = MiningOptions {
            path_filter: Some("src/".into()),
            ..MiningOptions::default()
        };
        let commits = history.extract(&opts).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].files, vec![FileChange::new("src/a.rs", 1, 0)]);
    }

    #[test]
    fn author_filter_matches_email_too() {
        let opts = MiningOptions {
            author: Some("@example.COM".into()),
            ..MiningOptions::default()
        };
        assert!(opts.matches_author(&Identity::new("x", "x@example.com")));
        assert!(!opts.matches_author(&Identity::new("x", "x@other.org")));
    }

    #[test]
    fn normalize_path_handles_prefixes_and_separators() {
        assert_eq!(normalize_path("./src/main.rs"), "src/main.rs");
        assert_eq!(normalize_path("src\\win\\path.rs"), "src/win/path.rs");
        assert_eq!(normalize_path(" lib.rs "), "lib.rs");
    }
}
