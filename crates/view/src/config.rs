//! Configuration shared by the view caches and the bootstrap.
//!
//! The configuration is a plain value handed to the caches when they are
//! constructed; there is no process wide switch.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for view location and caching.
///
/// It can be built in code or deserialized from the host's configuration file:
///
/// ```
/// use micro_view::ViewConfiguration;
///
/// let config: ViewConfiguration = serde_json::from_str(r#"{ "disable_caches": true }"#).unwrap();
/// assert!(config.disable_caches());
/// assert!(!config.runtime_view_updates());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewConfiguration {
    /// Re-scan view locations and recompile views on every call, used for live reload in development.
    disable_caches: bool,
    /// Evict a cached view when its location result reports it as stale.
    runtime_view_updates: bool,
    /// Root directory scanned by the default filesystem provider.
    view_root: Option<PathBuf>,
    /// Base path used to expand `~/` when the request carries none.
    base_path: Option<String>,
}

impl ViewConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_disable_caches(mut self, disable_caches: bool) -> Self {
        self.disable_caches = disable_caches;
        self
    }

    #[must_use]
    pub fn with_runtime_view_updates(mut self, runtime_view_updates: bool) -> Self {
        self.runtime_view_updates = runtime_view_updates;
        self
    }

    #[must_use]
    pub fn with_view_root(mut self, view_root: impl Into<PathBuf>) -> Self {
        self.view_root = Some(view_root.into());
        self
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn disable_caches(&self) -> bool {
        self.disable_caches
    }

    pub fn runtime_view_updates(&self) -> bool {
        self.runtime_view_updates
    }

    pub fn view_root(&self) -> Option<&Path> {
        self.view_root.as_deref()
    }

    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ViewConfiguration::default();
        assert!(!config.disable_caches());
        assert!(!config.runtime_view_updates());
        assert!(config.view_root().is_none());
        assert!(config.base_path().is_none());
    }

    #[test]
    fn test_deserialize() {
        let config: ViewConfiguration = serde_json::from_str(
            r#"{ "runtime_view_updates": true, "view_root": "/srv/app", "base_path": "/blog" }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ViewConfiguration::new().with_runtime_view_updates(true).with_view_root("/srv/app").with_base_path("/blog")
        );
    }
}
