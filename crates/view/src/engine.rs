//! The view engine contract.
//!
//! An engine renders templates of the extensions it lists. The view factory picks
//! the first registered engine supporting a located view's extension, so the order
//! engines are registered in matters when two of them claim the same extension.

use crate::error::BoxError;
use crate::location::ViewLocationResult;
use crate::render_context::RenderContext;
use crate::utils::contains_extension;
use crate::view_cache::ViewCache;
use crate::writer::ViewWriter;
use crate::Model;
use std::sync::Arc;

pub trait ViewEngine: Send + Sync {
    /// Extensions rendered by this engine, without leading dots.
    fn extensions(&self) -> &[String];

    /// Called once at startup, before the first render.
    fn initialize(&self, _context: &ViewEngineStartupContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Renders a located view.
    ///
    /// Errors are caught by the view factory and turned into an empty view.
    fn render_view(
        &self,
        view: &ViewLocationResult,
        model: Option<&Model>,
        render_context: &dyn RenderContext,
    ) -> Result<ViewWriter, BoxError>;

    fn supports(&self, extension: &str) -> bool {
        contains_extension(self.extensions(), extension)
    }
}

/// What an engine gets to see at startup: the shared view cache and the located
/// views it is able to render.
#[derive(Debug)]
pub struct ViewEngineStartupContext {
    view_cache: Arc<ViewCache>,
    view_location_results: Vec<ViewLocationResult>,
}

impl ViewEngineStartupContext {
    pub fn new(view_cache: Arc<ViewCache>, view_location_results: Vec<ViewLocationResult>) -> Self {
        Self { view_cache, view_location_results }
    }

    pub fn view_cache(&self) -> &ViewCache {
        &self.view_cache
    }

    pub fn view_location_results(&self) -> &[ViewLocationResult] {
        &self.view_location_results
    }
}

/// The distinct union of every engine's extensions, lower cased, in registration order.
pub fn supported_extensions(engines: &[Arc<dyn ViewEngine>]) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for extension in engines.iter().flat_map(|engine| engine.extensions()) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if !extension.is_empty() && !extensions.contains(&extension) {
            extensions.push(extension);
        }
    }
    extensions
}
