//! Run-scoped mutable state.

use std::collections::{HashMap, HashSet};

/// State shared by every sink dispatch of one distribution run.
///
/// Threaded explicitly from the orchestrator into the adapters; nothing
/// here survives the run, so unrelated batches can never observe each
/// other's cached resolutions or purge bookkeeping.
#[derive(Debug, Default)]
pub struct RunState {
    /// `lib://` target to resolved-directory cache.
    pub path_cache: HashMap<String, String>,
    /// Delete-all-first scopes already purged on the hub in this run.
    pub purged_owners: HashSet<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}
