use crate::ViewConfiguration;
use crate::location::{ViewLocationProvider, ViewLocationResult};
use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Aggregates the views of every registered [`ViewLocationProvider`].
///
/// The providers are scanned once at construction, for the extensions the
/// registered view engines support, and the results are kept as an immutable
/// snapshot. [`refresh`](ViewLocationCache::refresh) replaces the snapshot as a
/// whole. With caches disabled every query scans the providers again.
pub struct ViewLocationCache {
    providers: Vec<Arc<dyn ViewLocationProvider>>,
    supported_extensions: Vec<String>,
    disable_caches: bool,
    located_views: ArcSwap<Vec<ViewLocationResult>>,
}

impl ViewLocationCache {
    pub fn new(
        providers: Vec<Arc<dyn ViewLocationProvider>>,
        supported_extensions: Vec<String>,
        configuration: &ViewConfiguration,
    ) -> Self {
        let located_views = scan(&providers, &supported_extensions);
        debug!(count = located_views.len(), extensions = ?supported_extensions, "view locations cached");

        Self {
            providers,
            supported_extensions,
            disable_caches: configuration.disable_caches(),
            located_views: ArcSwap::from_pointee(located_views),
        }
    }

    /// Extensions the providers are scanned for.
    pub fn supported_extensions(&self) -> &[String] {
        &self.supported_extensions
    }

    /// Snapshot of every located view.
    pub fn views(&self) -> Arc<Vec<ViewLocationResult>> {
        if self.disable_caches {
            return Arc::new(scan(&self.providers, &self.supported_extensions));
        }
        self.located_views.load_full()
    }

    pub fn get_matching_views<P>(&self, predicate: P) -> Vec<ViewLocationResult>
    where
        P: Fn(&ViewLocationResult) -> bool,
    {
        self.views().iter().filter(|view| predicate(view)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.views().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views().is_empty()
    }

    /// Scans the providers again and replaces the cached snapshot.
    pub fn refresh(&self) {
        let located_views = scan(&self.providers, &self.supported_extensions);
        debug!(count = located_views.len(), "view locations refreshed");
        self.located_views.store(Arc::new(located_views));
    }
}

impl fmt::Debug for ViewLocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewLocationCache")
            .field("providers", &self.providers.len())
            .field("supported_extensions", &self.supported_extensions)
            .field("disable_caches", &self.disable_caches)
            .field("located_views", &self.located_views.load().len())
            .finish()
    }
}

/// Collects the views of every provider, the first provider wins for a duplicated view.
fn scan(providers: &[Arc<dyn ViewLocationProvider>], supported_extensions: &[String]) -> Vec<ViewLocationResult> {
    let mut seen = HashSet::new();
    let mut located_views = Vec::new();

    for (index, provider) in providers.iter().enumerate() {
        let views = match provider.get_located_views(supported_extensions) {
            Ok(views) => views,
            Err(e) => {
                warn!(cause = %e, provider = index, "view location provider failed, skipping its views");
                continue;
            }
        };

        for view in views {
            if seen.insert(view.clone()) {
                located_views.push(view);
            }
        }
    }

    located_views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        views: Vec<ViewLocationResult>,
        scans: AtomicUsize,
    }

    impl StaticProvider {
        fn new(views: Vec<ViewLocationResult>) -> Arc<Self> {
            Arc::new(Self { views, scans: AtomicUsize::new(0) })
        }
    }

    impl ViewLocationProvider for StaticProvider {
        fn get_located_views(&self, supported_extensions: &[String]) -> Result<Vec<ViewLocationResult>, ViewError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .views
                .iter()
                .filter(|view| supported_extensions.iter().any(|extension| view.has_extension(extension)))
                .cloned()
                .collect())
        }
    }

    struct FailingProvider;

    impl ViewLocationProvider for FailingProvider {
        fn get_located_views(&self, _supported_extensions: &[String]) -> Result<Vec<ViewLocationResult>, ViewError> {
            Err(ViewError::io(std::io::Error::other("unreadable")))
        }
    }

    fn view(location: &str, name: &str, extension: &str) -> ViewLocationResult {
        ViewLocationResult::from_bytes(location, name, extension, "")
    }

    fn extensions() -> Vec<String> {
        vec!["html".to_string(), "sshtml".to_string()]
    }

    #[test]
    fn test_union_without_duplicates() {
        let first = StaticProvider::new(vec![view("views", "index", "html"), view("views", "about", "txt")]);
        let second = StaticProvider::new(vec![view("views", "index", "html"), view("views", "list", "sshtml")]);

        let providers: Vec<Arc<dyn ViewLocationProvider>> = vec![first, second, Arc::new(FailingProvider)];
        let cache = ViewLocationCache::new(providers, extensions(), &ViewConfiguration::default());

        let names = cache.views().iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(names, vec!["views/index.html", "views/list.sshtml"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_matching_views() {
        let provider = StaticProvider::new(vec![view("views", "index", "html"), view("views", "list", "sshtml")]);
        let providers: Vec<Arc<dyn ViewLocationProvider>> = vec![provider];
        let cache = ViewLocationCache::new(providers, extensions(), &ViewConfiguration::default());

        let matching = cache.get_matching_views(|view| view.has_extension("sshtml"));
        assert_eq!(matching, vec![view("views", "list", "sshtml")]);
    }

    #[test]
    fn test_cached_snapshot_is_reused() {
        let provider = StaticProvider::new(vec![view("views", "index", "html")]);
        let providers: Vec<Arc<dyn ViewLocationProvider>> = vec![Arc::clone(&provider) as _];
        let cache = ViewLocationCache::new(providers, extensions(), &ViewConfiguration::default());

        cache.views();
        cache.get_matching_views(|_| true);
        assert_eq!(provider.scans.load(Ordering::SeqCst), 1);

        cache.refresh();
        assert_eq!(provider.scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disabled_caches_rescan_on_every_query() {
        let provider = StaticProvider::new(vec![view("views", "index", "html")]);
        let configuration = ViewConfiguration::new().with_disable_caches(true);
        let providers: Vec<Arc<dyn ViewLocationProvider>> = vec![Arc::clone(&provider) as _];
        let cache = ViewLocationCache::new(providers, extensions(), &configuration);

        cache.views();
        cache.views();
        assert_eq!(provider.scans.load(Ordering::SeqCst), 3);
    }
}
