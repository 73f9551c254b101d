//! Git history analysis: churn hotspots, file expertise, and bus factor.
//!
//! Mines git history using git2 into an oldest-first commit stream, then
//! folds it into per-file churn and per-author ownership to answer three
//! questions: which files change most, who knows a given file, and which
//! files depend on a single person.

pub mod bus_factor;
pub mod churn;
pub mod engine;
pub mod experts;
pub mod identity;
pub mod mining;
pub mod ownership;
pub mod recap;
pub mod since;

pub use engine::HistoryEngine;
