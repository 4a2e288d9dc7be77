//! What a view engine sees of the application while it renders.
//!
//! Engines never talk to the resolver, the request or the caches directly; they go
//! through a [`RenderContext`], which is created per render call by a
//! [`RenderContextFactory`] and scoped to the call's [`ViewLocationContext`].

use crate::location::ViewLocationResult;
use crate::resolver::ViewResolver;
use crate::view_cache::ViewCache;
use crate::{Model, RequestContext, ViewError, ViewLocationContext};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A CSRF token as it is emitted into a form: field name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub key: String,
    pub value: String,
}

pub trait RenderContext {
    fn html_encode(&self, input: &str) -> String {
        crate::utils::html_encode(input)
    }

    /// Resolves a view relative to the current render call, e.g. a partial or a master page.
    fn locate_view(&self, view_name: &str, model: Option<&Model>) -> Result<Option<ViewLocationResult>, ViewError>;

    /// Expands a leading `~` against the application base path.
    fn parse_path(&self, path: &str) -> String;

    fn csrf_token(&self) -> Result<CsrfToken, ViewError>;

    fn view_cache(&self) -> &ViewCache;

    /// Looks a localized text up for the culture of the current request.
    fn text(&self, key: &str) -> Option<String>;

    fn culture(&self) -> Option<&str>;

    fn context(&self) -> &ViewLocationContext<'_>;
}

/// Creates the render context of one render call.
pub trait RenderContextFactory: Send + Sync {
    fn get_render_context<'a>(&'a self, context: ViewLocationContext<'a>) -> Box<dyn RenderContext + 'a>;
}

/// Localized text lookup.
pub trait TextResource: Send + Sync {
    /// Returns the text stored under `key` for `culture`, `None` for the invariant culture.
    fn get(&self, key: &str, culture: Option<&str>) -> Option<String>;
}

/// In-memory texts keyed by culture then key.
///
/// A lookup tries the exact culture (`sv-SE`), then its language (`sv`), then the
/// invariant culture. Cultures compare ignoring ASCII case.
#[derive(Debug, Clone, Default)]
pub struct StaticTextResource {
    texts: HashMap<String, HashMap<String, String>>,
}

impl StaticTextResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text to the invariant culture.
    #[must_use]
    pub fn with_text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_culture_text("", key, text)
    }

    #[must_use]
    pub fn with_culture_text(mut self, culture: &str, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.entry(culture.to_ascii_lowercase()).or_default().insert(key.into(), text.into());
        self
    }

    fn lookup(&self, culture: &str, key: &str) -> Option<String> {
        self.texts.get(culture).and_then(|texts| texts.get(key)).cloned()
    }
}

impl TextResource for StaticTextResource {
    fn get(&self, key: &str, culture: Option<&str>) -> Option<String> {
        if let Some(culture) = culture.map(str::to_ascii_lowercase) {
            if let Some(text) = self.lookup(&culture, key) {
                return Some(text);
            }

            if let Some((language, _)) = culture.split_once('-') {
                if let Some(text) = self.lookup(language, key) {
                    return Some(text);
                }
            }
        }

        self.lookup("", key)
    }
}

pub struct DefaultRenderContext<'a> {
    resolver: &'a dyn ViewResolver,
    view_cache: &'a ViewCache,
    text_resource: &'a dyn TextResource,
    base_path: Option<&'a str>,
    context: ViewLocationContext<'a>,
}

impl<'a> DefaultRenderContext<'a> {
    pub fn new(
        resolver: &'a dyn ViewResolver,
        view_cache: &'a ViewCache,
        text_resource: &'a dyn TextResource,
        context: ViewLocationContext<'a>,
    ) -> Self {
        Self { resolver, view_cache, text_resource, base_path: None, context }
    }

    /// Base path used when the request carries none.
    #[must_use]
    pub fn with_base_path(mut self, base_path: Option<&'a str>) -> Self {
        self.base_path = base_path;
        self
    }

    fn request(&self) -> &RequestContext {
        self.context.context()
    }
}

impl RenderContext for DefaultRenderContext<'_> {
    fn locate_view(&self, view_name: &str, model: Option<&Model>) -> Result<Option<ViewLocationResult>, ViewError> {
        self.resolver.get_view_location(view_name, model, &self.context)
    }

    fn parse_path(&self, path: &str) -> String {
        let Some(rest) = path.strip_prefix('~').filter(|rest| rest.is_empty() || rest.starts_with('/')) else {
            return path.to_string();
        };

        let base_path = self.request().base_path().or(self.base_path).map(|base_path| base_path.trim_end_matches('/'));
        match base_path {
            Some(base_path) if !base_path.is_empty() => format!("{base_path}{rest}"),
            _ => rest.to_string(),
        }
    }

    fn csrf_token(&self) -> Result<CsrfToken, ViewError> {
        let value = self
            .request()
            .item(RequestContext::CSRF_TOKEN_KEY)
            .and_then(|item| item.downcast_ref::<String>())
            .filter(|value| !value.is_empty())
            .ok_or(ViewError::CsrfNotEnabled)?;

        Ok(CsrfToken { key: RequestContext::CSRF_TOKEN_KEY.to_string(), value: value.clone() })
    }

    fn view_cache(&self) -> &ViewCache {
        self.view_cache
    }

    fn text(&self, key: &str) -> Option<String> {
        self.text_resource.get(key, self.culture())
    }

    fn culture(&self) -> Option<&str> {
        self.request().culture()
    }

    fn context(&self) -> &ViewLocationContext<'_> {
        &self.context
    }
}

impl fmt::Debug for DefaultRenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRenderContext")
            .field("base_path", &self.base_path)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

pub struct DefaultRenderContextFactory {
    resolver: Arc<dyn ViewResolver>,
    view_cache: Arc<ViewCache>,
    text_resource: Arc<dyn TextResource>,
    base_path: Option<String>,
}

impl DefaultRenderContextFactory {
    pub fn new(resolver: Arc<dyn ViewResolver>, view_cache: Arc<ViewCache>, text_resource: Arc<dyn TextResource>) -> Self {
        Self { resolver, view_cache, text_resource, base_path: None }
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: Option<String>) -> Self {
        self.base_path = base_path;
        self
    }
}

impl RenderContextFactory for DefaultRenderContextFactory {
    fn get_render_context<'a>(&'a self, context: ViewLocationContext<'a>) -> Box<dyn RenderContext + 'a> {
        let render_context =
            DefaultRenderContext::new(self.resolver.as_ref(), &self.view_cache, self.text_resource.as_ref(), context)
                .with_base_path(self.base_path.as_deref());
        Box::new(render_context)
    }
}

impl fmt::Debug for DefaultRenderContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRenderContextFactory")
            .field("view_cache", &self.view_cache)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewConfiguration;
    use http::Request;

    struct NoViews;

    impl ViewResolver for NoViews {
        fn get_view_location(
            &self,
            _: &str,
            _: Option<&Model>,
            _: &ViewLocationContext<'_>,
        ) -> Result<Option<ViewLocationResult>, ViewError> {
            Ok(None)
        }
    }

    fn new_factory(base_path: Option<&str>) -> DefaultRenderContextFactory {
        let texts = StaticTextResource::new().with_text("Greeting", "Hello").with_culture_text("sv", "Greeting", "Hej");
        DefaultRenderContextFactory::new(
            Arc::new(NoViews),
            Arc::new(ViewCache::new(&ViewConfiguration::default())),
            Arc::new(texts),
        )
        .with_base_path(base_path.map(str::to_string))
    }

    fn new_request(accept_language: &str) -> RequestContext {
        let request = Request::builder().header(http::header::ACCEPT_LANGUAGE, accept_language).body(()).unwrap();
        RequestContext::from_request(request)
    }

    #[test]
    fn test_parse_path() {
        let factory = new_factory(Some("/app/"));
        let request = new_request("en");
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.parse_path("~/css/site.css"), "/app/css/site.css");
        assert_eq!(render_context.parse_path("/css/site.css"), "/css/site.css");
        assert_eq!(render_context.parse_path("~user"), "~user");

        let request = new_request("en").with_base_path("/blog");
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.parse_path("~/posts"), "/blog/posts");

        let factory = new_factory(None);
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.parse_path("~/posts"), "/blog/posts");

        let request = new_request("en");
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.parse_path("~/posts"), "/posts");
    }

    #[test]
    fn test_csrf_token() {
        let factory = new_factory(None);

        let request = new_request("en");
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert!(matches!(render_context.csrf_token(), Err(ViewError::CsrfNotEnabled)));

        let request = new_request("en").with_item(RequestContext::CSRF_TOKEN_KEY, String::new());
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert!(matches!(render_context.csrf_token(), Err(ViewError::CsrfNotEnabled)));

        let request = new_request("en").with_item(RequestContext::CSRF_TOKEN_KEY, 42_u32);
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert!(matches!(render_context.csrf_token(), Err(ViewError::CsrfNotEnabled)));

        let request = new_request("en").with_item(RequestContext::CSRF_TOKEN_KEY, "abc".to_string());
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.csrf_token().unwrap(), CsrfToken { key: "_csrf".into(), value: "abc".into() });
    }

    #[test]
    fn test_text_falls_back_to_language_then_invariant() {
        let factory = new_factory(None);

        for (accept_language, expected) in [("sv-SE", "Hej"), ("SV", "Hej"), ("de-DE", "Hello")] {
            let request = new_request(accept_language);
            let render_context = factory.get_render_context(ViewLocationContext::new(&request));
            assert_eq!(render_context.text("Greeting").as_deref(), Some(expected), "{accept_language}");
            assert_eq!(render_context.text("Missing"), None);
        }
    }

    #[test]
    fn test_html_encode() {
        let factory = new_factory(None);
        let request = new_request("en");
        let render_context = factory.get_render_context(ViewLocationContext::new(&request));
        assert_eq!(render_context.html_encode("<b>"), "&lt;b&gt;");
    }
}
