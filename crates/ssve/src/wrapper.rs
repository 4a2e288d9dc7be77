use crate::engine::SuperSimpleViewEngine;
use crate::host::RenderContextHost;
use micro_view::location::ViewLocationResult;
use micro_view::{BoxError, Model, RenderContext, ViewEngine, ViewEngineStartupContext, ViewWriter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extensions rendered by [`SuperSimpleViewEngineWrapper`].
pub const EXTENSIONS: [&str; 3] = ["sshtml", "html", "htm"];

/// Plugs the [`SuperSimpleViewEngine`] into the view system.
///
/// Template text is read once and kept in the view cache, keyed by the located view.
#[derive(Debug, Clone)]
pub struct SuperSimpleViewEngineWrapper {
    engine: SuperSimpleViewEngine,
    extensions: Vec<String>,
}

impl SuperSimpleViewEngineWrapper {
    pub fn new() -> Self {
        Self::with_engine(SuperSimpleViewEngine::new())
    }

    /// Wraps a preconfigured engine, e.g. one carrying matchers.
    pub fn with_engine(engine: SuperSimpleViewEngine) -> Self {
        Self { engine, extensions: EXTENSIONS.iter().map(ToString::to_string).collect() }
    }

    pub fn engine(&self) -> &SuperSimpleViewEngine {
        &self.engine
    }
}

impl Default for SuperSimpleViewEngineWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewEngine for SuperSimpleViewEngineWrapper {
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn initialize(&self, context: &ViewEngineStartupContext) -> Result<(), BoxError> {
        for view in context.view_location_results() {
            match context.view_cache().get_or_add(view, |view| view.read_to_string()) {
                Ok(_) => debug!(view = %view, "template cached"),
                Err(e) => warn!(cause = %e, view = %view, "failed to read template"),
            }
        }
        Ok(())
    }

    fn render_view(
        &self,
        view: &ViewLocationResult,
        model: Option<&Model>,
        render_context: &dyn RenderContext,
    ) -> Result<ViewWriter, BoxError> {
        let template: Arc<String> = render_context.view_cache().get_or_add(view, |view| view.read_to_string())?;
        let host = RenderContextHost::new(render_context);
        let output = self.engine.render(&template, model, &host)?;
        Ok(ViewWriter::from(output))
    }
}
