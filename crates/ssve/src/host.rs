use crate::error::SsveError;
use micro_view::{Model, RenderContext};
use std::sync::Arc;
use tracing::{debug, warn};

/// The services a template needs from the application it renders in.
pub trait ViewEngineHost {
    fn html_encode(&self, input: &str) -> String;

    /// Returns the raw text of a partial or master template, `None` if it cannot be located.
    fn get_template(&self, template_name: &str, model: Option<&Model>) -> Option<Arc<String>>;

    /// Expands a `~/` path against the application base path.
    fn expand_path(&self, path: &str) -> String;

    /// Returns the hidden form field carrying the request's CSRF token.
    fn anti_forgery_token(&self) -> Result<String, SsveError>;

    /// Returns a localized text, `None` if there is no text for the key.
    fn text(&self, key: &str) -> Option<String>;
}

/// A [`ViewEngineHost`] backed by a [`RenderContext`]; templates are read through the view cache.
pub struct RenderContextHost<'a> {
    render_context: &'a dyn RenderContext,
}

impl<'a> RenderContextHost<'a> {
    pub fn new(render_context: &'a dyn RenderContext) -> Self {
        Self { render_context }
    }
}

impl ViewEngineHost for RenderContextHost<'_> {
    fn html_encode(&self, input: &str) -> String {
        self.render_context.html_encode(input)
    }

    fn get_template(&self, template_name: &str, model: Option<&Model>) -> Option<Arc<String>> {
        let view = match self.render_context.locate_view(template_name, model) {
            Ok(Some(view)) => view,
            Ok(None) => {
                debug!(template_name, "template not found");
                return None;
            }
            Err(e) => {
                warn!(cause = %e, template_name, "failed to locate template");
                return None;
            }
        };

        match self.render_context.view_cache().get_or_add(&view, |view| view.read_to_string()) {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(cause = %e, view = %view, "failed to read template");
                None
            }
        }
    }

    fn expand_path(&self, path: &str) -> String {
        self.render_context.parse_path(path)
    }

    fn anti_forgery_token(&self) -> Result<String, SsveError> {
        let token = self.render_context.csrf_token()?;
        Ok(format!(
            r#"<input type="hidden" name="{}" value="{}"/>"#,
            self.html_encode(&token.key),
            self.html_encode(&token.value)
        ))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.render_context.text(key)
    }
}

impl std::fmt::Debug for RenderContextHost<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContextHost").field("context", self.render_context.context()).finish()
    }
}
