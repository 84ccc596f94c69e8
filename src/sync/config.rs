//! Sync run configuration.

use std::path::PathBuf;

/// Configuration for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the local documentation tree.
    pub docs_root: PathBuf,

    /// Only sync these categories (matched by slug). `None` syncs all.
    pub categories: Option<Vec<String>>,

    /// Log decisions without contacting the remote store.
    pub dry_run: bool,
}

impl SyncConfig {
    /// Sync every category under `docs_root`.
    pub fn new(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
            categories: None,
            dry_run: false,
        }
    }

    /// Restrict the run to the given categories. An empty list means all.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = if categories.is_empty() { None } else { Some(categories) };
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
