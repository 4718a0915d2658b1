//! Configuration for opening a project database.
//!
//! Built with `typed-builder`, so every option other than the ones you care
//! about falls back to a sensible default.

use std::path::PathBuf;
use typed_builder::TypedBuilder;

/// What `save` does when the stored row has moved on since this record last
/// read or wrote it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum ConcurrencyPolicy {
    /// Last writer wins. The stored row is overwritten unconditionally.
    #[default]
    Overwrite,
    /// Refuse the save with [`ProjectError::StaleRecord`](crate::errors::ProjectError::StaleRecord)
    /// when the stored version marker differs from the last committed one.
    RejectStale,
}

/// Configuration for a [`ProjectDatabase`](crate::database::ProjectDatabase).
///
/// # Examples
///
/// ```
/// use project_store::config::{ConcurrencyPolicy, ProjectConfig};
///
/// // In-memory, defaults everywhere
/// let config = ProjectConfig::builder().build();
/// assert!(config.path.is_none());
///
/// // File backed, rejecting stale saves
/// let config = ProjectConfig::builder()
///     .path("/tmp/project.osp")
///     .concurrency_policy(ConcurrencyPolicy::RejectStale)
///     .build();
/// assert_eq!(config.log_target, "project_store");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct ProjectConfig {
    /// Path to the database file. `None` opens a private in-memory database.
    #[builder(default, setter(strip_option, into))]
    pub path: Option<PathBuf>,

    /// Whether to create the database file if it doesn't exist
    #[builder(default = true)]
    pub create_if_missing: bool,

    /// Behaviour of `save` when another writer changed the row
    #[builder(default)]
    pub concurrency_policy: ConcurrencyPolicy,

    /// `log` target used for everything the store reports
    #[builder(default = String::from("project_store"), setter(into))]
    pub log_target: String,
}

impl ProjectConfig {
    /// Create a basic configuration with just a path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self::builder().build()
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ProjectConfig::builder().build();
        assert!(config.path.is_none());
        assert!(config.create_if_missing);
        assert_eq!(config.concurrency_policy, ConcurrencyPolicy::Overwrite);
        assert_eq!(config.log_target, "project_store");
    }

    #[test]
    fn test_policy_from_str() {
        let policy: ConcurrencyPolicy = "RejectStale".parse().unwrap();
        assert_eq!(policy, ConcurrencyPolicy::RejectStale);
        assert_eq!(ConcurrencyPolicy::Overwrite.to_string(), "Overwrite");
    }
}
