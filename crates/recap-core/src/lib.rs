//! Core types, configuration, and error handling for recap.
//!
//! This crate provides the shared foundation used by the other recap crates:
//! - [`RecapError`]: unified error type using `thiserror` and `miette`
//! - [`RecapConfig`]: configuration loaded from `.recap.toml`
//! - [`OutputFormat`]: report rendering format

mod config;
mod error;
mod format;

pub use config::{
    BusFactorConfig, HistoryConfig, IdentityConfig, IdentityStrategy, OutputConfig, RecapConfig,
};
pub use error::RecapError;
pub use format::OutputFormat;

/// A convenience `Result` type for recap operations.
pub type Result<T> = std::result::Result<T, RecapError>;
