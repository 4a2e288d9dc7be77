//! The entry point request handlers render views through.
//!
//! Rendering is best effort: a view that cannot be found, has no engine, or fails
//! while rendering yields an empty [`ViewWriter`] instead of an error, so one broken
//! view never takes the whole response down. Failures are logged and, if a
//! [`RenderFailureHook`] is installed, reported to it. Only programmer errors
//! (no view name and no model) and ambiguous view names are returned as errors.

use crate::engine::ViewEngine;
use crate::error::BoxError;
use crate::location::ViewLocationResult;
use crate::render_context::RenderContextFactory;
use crate::resolver::ViewResolver;
use crate::utils::ensure;
use crate::writer::ViewWriter;
use crate::{Model, ViewError, ViewLocationContext};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives the errors of engines that failed to render a located view.
pub type RenderFailureHook = Arc<dyn Fn(&ViewLocationResult, &(dyn Error + Send + Sync)) + Send + Sync>;

pub trait ViewFactory: Send + Sync {
    /// Renders a view by name, by model, or both.
    ///
    /// Without a view name the name is derived from the model's type name, minus a
    /// trailing `Model`: a `PersonModel` renders the view `Person`.
    fn render_view(
        &self,
        view_name: Option<&str>,
        model: Option<&Model>,
        context: &ViewLocationContext<'_>,
    ) -> Result<ViewWriter, ViewError>;

    fn render_model(&self, model: &Model, context: &ViewLocationContext<'_>) -> Result<ViewWriter, ViewError> {
        self.render_view(None, Some(model), context)
    }

    fn render_named(&self, view_name: &str, context: &ViewLocationContext<'_>) -> Result<ViewWriter, ViewError> {
        self.render_view(Some(view_name), None, context)
    }

    fn render(&self, view_name: &str, model: &Model, context: &ViewLocationContext<'_>) -> Result<ViewWriter, ViewError> {
        self.render_view(Some(view_name), Some(model), context)
    }
}

pub struct DefaultViewFactory {
    resolver: Arc<dyn ViewResolver>,
    engines: Vec<Arc<dyn ViewEngine>>,
    render_context_factory: Arc<dyn RenderContextFactory>,
    failure_hook: Option<RenderFailureHook>,
}

impl DefaultViewFactory {
    pub fn new(
        resolver: Arc<dyn ViewResolver>,
        engines: Vec<Arc<dyn ViewEngine>>,
        render_context_factory: Arc<dyn RenderContextFactory>,
    ) -> Self {
        Self { resolver, engines, render_context_factory, failure_hook: None }
    }

    #[must_use]
    pub fn with_failure_hook(mut self, failure_hook: Option<RenderFailureHook>) -> Self {
        self.failure_hook = failure_hook;
        self
    }

    fn engine_for(&self, view: &ViewLocationResult) -> Option<&Arc<dyn ViewEngine>> {
        self.engines.iter().find(|engine| engine.supports(view.extension()))
    }

    fn render_located(&self, view: &ViewLocationResult, model: Option<&Model>, context: &ViewLocationContext<'_>) -> ViewWriter {
        let Some(engine) = self.engine_for(view) else {
            debug!(view = %view, "no view engine supports the view's extension");
            return ViewWriter::empty();
        };

        let render_context = self.render_context_factory.get_render_context(*context);
        match engine.render_view(view, model, render_context.as_ref()) {
            Ok(writer) => writer,
            Err(e) => {
                warn!(cause = %e, view = %view, "view engine failed, rendering an empty view");
                self.report_failure(view, e);
                ViewWriter::empty()
            }
        }
    }

    fn report_failure(&self, view: &ViewLocationResult, e: BoxError) {
        if let Some(failure_hook) = &self.failure_hook {
            failure_hook(view, e.as_ref());
        }
    }
}

impl ViewFactory for DefaultViewFactory {
    fn render_view(
        &self,
        view_name: Option<&str>,
        model: Option<&Model>,
        context: &ViewLocationContext<'_>,
    ) -> Result<ViewWriter, ViewError> {
        ensure!(view_name.is_some() || model.is_some(), ViewError::invalid_argument("view name and model cannot both be absent"));

        let view_name = match (view_name.filter(|name| !name.is_empty()), model) {
            (Some(view_name), _) => view_name,
            (None, Some(model)) => view_name_from_model(model),
            (None, None) => return Err(ViewError::invalid_argument("view name cannot be empty when there is no model")),
        };

        match self.resolver.get_view_location(view_name, model, context)? {
            Some(view) => Ok(self.render_located(&view, model, context)),
            None => {
                debug!(view_name, "view not found, rendering an empty view");
                Ok(ViewWriter::empty())
            }
        }
    }
}

impl fmt::Debug for DefaultViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultViewFactory")
            .field("engines", &self.engines.len())
            .field("failure_hook", &self.failure_hook.is_some())
            .finish_non_exhaustive()
    }
}

fn view_name_from_model(model: &Model) -> &str {
    let type_name = model.type_name();
    type_name.strip_suffix("Model").unwrap_or(type_name)
}
