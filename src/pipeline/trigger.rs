// ABOUTME: The push event that asks for a deployment, and the filter decision on it.
// ABOUTME: Filters are evaluated once, before any step executes.

use crate::config::WatchConfig;
use serde::Serialize;

/// Branch, commit, and changed paths of the triggering push.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerEvent {
    pub branch: String,
    pub commit: String,
    pub changed_paths: Vec<String>,
}

impl TriggerEvent {
    pub fn new(
        branch: impl Into<String>,
        commit: impl Into<String>,
        changed_paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            branch: branch.into(),
            commit: commit.into(),
            changed_paths: changed_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Why this trigger does not apply to the target, if it doesn't.
    pub fn filtered_reason(&self, watch: &WatchConfig) -> Option<String> {
        if !watch.allows_branch(&self.branch) {
            let wanted = watch.branch.as_deref().unwrap_or_default();
            return Some(format!(
                "branch {} does not match watched branch {wanted}",
                self.branch
            ));
        }
        if !watch.touches_paths(&self.changed_paths) {
            return Some("no changed path falls under a watched path".to_string());
        }
        None
    }
}
