//! Contributor identities and pluggable identity normalization.

use std::fmt;

use recap_core::IdentityStrategy;
use serde::{Deserialize, Serialize};

/// A commit author.
///
/// Two identities are the same contributor iff both name and email match.
/// Case or whitespace variants of one person count as different people
/// unless an [`IdentityNormalizer`] merges them first.
///
/// # Examples
///
/// ```
/// use recap_history::identity::Identity;
///
/// let a = Identity::new("Alice", "alice@example.com");
/// let b = Identity::new("Alice", "ALICE@example.com");
/// assert_ne!(a, b);
/// assert_eq!(a.to_string(), "Alice <alice@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Maps raw commit identities onto the identity used for attribution.
///
/// Applied once at the extractor boundary, so the aggregators only ever see
/// already-normalized identities.
pub trait IdentityNormalizer: Send + Sync {
    /// Return the canonical identity for `identity`.
    fn normalize(&self, identity: &Identity) -> Identity;
}

/// Leaves identities untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactIdentity;

impl IdentityNormalizer for ExactIdentity {
    fn normalize(&self, identity: &Identity) -> Identity {
        identity.clone()
    }
}

/// Collapses whitespace in names and lowercases emails.
///
/// # Examples
///
/// ```
/// use recap_history::identity::{CaseInsensitiveEmail, Identity, IdentityNormalizer};
///
/// let raw = Identity::new("  Alice   Smith ", "Alice@Example.COM ");
/// let normalized = CaseInsensitiveEmail.normalize(&raw);
/// assert_eq!(normalized, Identity::new("Alice Smith", "alice@example.com"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveEmail;

impl IdentityNormalizer for CaseInsensitiveEmail {
    fn normalize(&self, identity: &Identity) -> Identity {
        Identity {
            name: identity.name.split_whitespace().collect::<Vec<_>>().join(" "),
            email: identity.email.trim().to_lowercase(),
        }
    }
}

/// Build the normalizer selected by configuration.
pub fn normalizer_for(strategy: IdentityStrategy) -> Box<dyn IdentityNormalizer> {
    match strategy {
        IdentityStrategy::Exact => Box::new(ExactIdentity),
        IdentityStrategy::CaseInsensitive => Box::new(CaseInsensitiveEmail),
    }
}
