use crate::engine::{ViewEngine, ViewEngineStartupContext};
use crate::location::ViewLocationCache;
use crate::view_cache::ViewCache;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Application startup task that lets every engine warm the view cache.
pub struct ViewEngineStartup {
    engines: Vec<Arc<dyn ViewEngine>>,
    view_location_cache: Arc<ViewLocationCache>,
    view_cache: Arc<ViewCache>,
}

impl ViewEngineStartup {
    pub fn new(engines: Vec<Arc<dyn ViewEngine>>, view_location_cache: Arc<ViewLocationCache>, view_cache: Arc<ViewCache>) -> Self {
        Self { engines, view_location_cache, view_cache }
    }

    /// Calls `initialize` once on every engine with the located views it supports.
    ///
    /// An engine failing to initialize is logged; it still renders, just without a warm cache.
    pub fn initialize(&self) {
        for engine in &self.engines {
            let views = self.view_location_cache.get_matching_views(|view| engine.supports(view.extension()));
            debug!(extensions = ?engine.extensions(), views = views.len(), "initializing view engine");

            let context = ViewEngineStartupContext::new(Arc::clone(&self.view_cache), views);
            if let Err(e) = engine.initialize(&context) {
                warn!(cause = %e, extensions = ?engine.extensions(), "view engine failed to initialize");
            }
        }
    }
}

impl fmt::Debug for ViewEngineStartup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEngineStartup")
            .field("engines", &self.engines.len())
            .field("view_location_cache", &self.view_location_cache)
            .field("view_cache", &self.view_cache)
            .finish()
    }
}
