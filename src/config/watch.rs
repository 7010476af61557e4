// ABOUTME: Trigger filter configuration for branch and path matching.
// ABOUTME: Decides whether a push event is relevant to a target at all.

use serde::Deserialize;

/// Restricts which pushes a target reacts to.
///
/// An absent branch means any branch qualifies. An empty `paths` list
/// means any change qualifies. Both conditions must hold for a run to
/// proceed past the filter.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchConfig {
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub paths: Vec<String>,
}

impl WatchConfig {
    pub fn allows_branch(&self, branch: &str) -> bool {
        match &self.branch {
            Some(wanted) => wanted == branch,
            None => true,
        }
    }

    /// True when at least one changed path falls under a watched prefix.
    ///
    /// Prefixes match on path component boundaries, so watching `src`
    /// covers `src/main.rs` but not `srctool/main.rs`.
    pub fn touches_paths(&self, changed: &[String]) -> bool {
        if self.paths.is_empty() {
            return true;
        }
        changed.iter().any(|path| {
            self.paths.iter().any(|prefix| {
                let prefix = prefix.trim_end_matches('/');
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
        })
    }
}
