use crate::engine::{self, ViewEngine};
use crate::error::ViewSystemBuildError;
use crate::factory::{DefaultViewFactory, RenderFailureHook, ViewFactory};
use crate::location::{FileSystemViewLocationProvider, ViewLocationCache, ViewLocationProvider};
use crate::locator::{DefaultViewLocator, ViewLocator, ViewSourceProvider};
use crate::render_context::{DefaultRenderContextFactory, StaticTextResource, TextResource};
use crate::resolver::{DefaultViewResolver, ViewLocationConventions, ViewResolver};
use crate::startup::ViewEngineStartup;
use crate::view_cache::ViewCache;
use crate::writer::ViewWriter;
use crate::{Model, ViewConfiguration, ViewError, ViewLocationContext};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub struct ViewSystemBuilder {
    configuration: ViewConfiguration,
    engines: Vec<Arc<dyn ViewEngine>>,
    providers: Vec<Arc<dyn ViewLocationProvider>>,
    sources: Vec<Arc<dyn ViewSourceProvider>>,
    conventions: ViewLocationConventions,
    text_resource: Option<Arc<dyn TextResource>>,
    failure_hook: Option<RenderFailureHook>,
}

impl ViewSystemBuilder {
    fn new() -> Self {
        Self {
            configuration: ViewConfiguration::default(),
            engines: Vec::new(),
            providers: Vec::new(),
            sources: Vec::new(),
            conventions: ViewLocationConventions::default(),
            text_resource: None,
            failure_hook: None,
        }
    }

    pub fn configuration(mut self, configuration: ViewConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Registers an engine; engines registered first win when extensions overlap.
    pub fn engine(mut self, engine: impl ViewEngine + 'static) -> Self {
        self.engines.push(Arc::new(engine));
        self
    }

    pub fn location_provider(mut self, provider: impl ViewLocationProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Adds a source the locator asks after the location cache.
    pub fn view_source(mut self, source: impl ViewSourceProvider + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn conventions(mut self, conventions: ViewLocationConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn text_resource(mut self, text_resource: impl TextResource + 'static) -> Self {
        self.text_resource = Some(Arc::new(text_resource));
        self
    }

    pub fn on_render_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&crate::location::ViewLocationResult, &(dyn Error + Send + Sync)) + Send + Sync + 'static,
    {
        self.failure_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<ViewSystem, ViewSystemBuildError> {
        let Self { configuration, engines, mut providers, sources, conventions, text_resource, failure_hook } = self;

        if engines.is_empty() {
            return Err(ViewSystemBuildError::MissingViewEngines);
        }

        if providers.is_empty() {
            let view_root = configuration.view_root().ok_or(ViewSystemBuildError::MissingLocationProviders)?;
            providers.push(Arc::new(FileSystemViewLocationProvider::new(view_root)));
        }

        let supported_extensions = engine::supported_extensions(&engines);
        let view_location_cache = Arc::new(ViewLocationCache::new(providers, supported_extensions.clone(), &configuration));

        let mut view_sources: Vec<Arc<dyn ViewSourceProvider>> = vec![Arc::clone(&view_location_cache) as _];
        view_sources.extend(sources);
        let locator = Arc::new(DefaultViewLocator::new(view_sources, supported_extensions));

        let resolver: Arc<dyn ViewResolver> = Arc::new(DefaultViewResolver::new(Arc::clone(&locator) as _, conventions));
        let view_cache = Arc::new(ViewCache::new(&configuration));
        let text_resource = text_resource.unwrap_or_else(|| Arc::new(StaticTextResource::new()) as Arc<dyn TextResource>);
        let render_context_factory = Arc::new(
            DefaultRenderContextFactory::new(Arc::clone(&resolver), Arc::clone(&view_cache), text_resource)
                .with_base_path(configuration.base_path().map(str::to_string)),
        );

        let factory = DefaultViewFactory::new(Arc::clone(&resolver), engines.clone(), render_context_factory)
            .with_failure_hook(failure_hook);

        ViewEngineStartup::new(engines.clone(), Arc::clone(&view_location_cache), Arc::clone(&view_cache)).initialize();
        info!(
            engines = engines.len(),
            views = view_location_cache.len(),
            extensions = ?locator.supported_extensions(),
            "view system started"
        );

        Ok(ViewSystem { configuration, engines, view_location_cache, view_cache, locator, resolver, factory })
    }
}

impl fmt::Debug for ViewSystemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSystemBuilder")
            .field("configuration", &self.configuration)
            .field("engines", &self.engines.len())
            .field("providers", &self.providers.len())
            .field("sources", &self.sources.len())
            .field("conventions", &self.conventions)
            .field("failure_hook", &self.failure_hook.is_some())
            .finish_non_exhaustive()
    }
}

/// The wired view subsystem: caches, locator, resolver and factory.
///
/// ```ignore
/// let views = ViewSystem::builder()
///     .configuration(ViewConfiguration::new().with_view_root("./templates"))
///     .engine(SuperSimpleViewEngineWrapper::new())
///     .build()?;
///
/// let writer = views.render_model(&model, &ViewLocationContext::new(&request))?;
/// ```
pub struct ViewSystem {
    configuration: ViewConfiguration,
    engines: Vec<Arc<dyn ViewEngine>>,
    view_location_cache: Arc<ViewLocationCache>,
    view_cache: Arc<ViewCache>,
    locator: Arc<DefaultViewLocator>,
    resolver: Arc<dyn ViewResolver>,
    factory: DefaultViewFactory,
}

impl ViewSystem {
    pub fn builder() -> ViewSystemBuilder {
        ViewSystemBuilder::new()
    }

    pub fn configuration(&self) -> &ViewConfiguration {
        &self.configuration
    }

    pub fn engines(&self) -> &[Arc<dyn ViewEngine>] {
        &self.engines
    }

    pub fn view_location_cache(&self) -> &ViewLocationCache {
        &self.view_location_cache
    }

    pub fn view_cache(&self) -> &ViewCache {
        &self.view_cache
    }

    pub fn locator(&self) -> &dyn ViewLocator {
        self.locator.as_ref()
    }

    pub fn resolver(&self) -> &dyn ViewResolver {
        self.resolver.as_ref()
    }

    pub fn factory(&self) -> &DefaultViewFactory {
        &self.factory
    }

    /// Rescans every provider and drops every compiled view.
    pub fn refresh(&self) {
        self.view_location_cache.refresh();
        self.view_cache.clear();
        info!(views = self.view_location_cache.len(), "view system refreshed");
    }
}

impl ViewFactory for ViewSystem {
    fn render_view(
        &self,
        view_name: Option<&str>,
        model: Option<&Model>,
        context: &ViewLocationContext<'_>,
    ) -> Result<ViewWriter, ViewError> {
        self.factory.render_view(view_name, model, context)
    }
}

impl fmt::Debug for ViewSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSystem")
            .field("configuration", &self.configuration)
            .field("engines", &self.engines.len())
            .field("view_location_cache", &self.view_location_cache)
            .field("view_cache", &self.view_cache)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::location::ViewLocationResult;
    use crate::locator::ProviderViewSource;
    use crate::render_context::RenderContext;
    use crate::RequestContext;
    use std::fs;
    use tempfile::TempDir;

    /// Renders the template text with `{path}` replaced by the expanded `~/` path.
    struct RawEngine {
        extensions: Vec<String>,
    }

    impl RawEngine {
        fn new(extension: &str) -> Self {
            Self { extensions: vec![extension.to_string()] }
        }
    }

    impl ViewEngine for RawEngine {
        fn extensions(&self) -> &[String] {
            &self.extensions
        }

        fn render_view(&self, view: &ViewLocationResult, _: Option<&Model>, context: &dyn RenderContext) -> Result<ViewWriter, BoxError> {
            let template = context.view_cache().get_or_add(view, |view| view.read_to_string())?;
            Ok(ViewWriter::from(template.replace("{path}", &context.parse_path("~/"))))
        }
    }

    struct Views(Vec<ViewLocationResult>);

    impl ViewLocationProvider for Views {
        fn get_located_views(&self, _: &[String]) -> Result<Vec<ViewLocationResult>, ViewError> {
            Ok(self.0.clone())
        }
    }

    fn render(system: &ViewSystem, view_name: &str) -> String {
        let request = RequestContext::from_request(http::Request::new(()));
        let context = ViewLocationContext::new(&request).with_module_path("/shop");
        let writer = system.render_named(view_name, &context).unwrap();
        String::from_utf8(writer.to_bytes().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_builder_debug() {
        let builder = ViewSystem::builder().engine(RawEngine::new("html")).location_provider(Views(vec![]));
        let debug = format!("{builder:?}");

        assert!(debug.starts_with("ViewSystemBuilder {"));
        assert!(debug.contains("engines: 1, providers: 1, sources: 0"));
    }

    #[test]
    fn test_build_validation() {
        let result = ViewSystem::builder().location_provider(Views(vec![])).build();
        assert!(matches!(result, Err(ViewSystemBuildError::MissingViewEngines)));

        let result = ViewSystem::builder().engine(RawEngine::new("html")).build();
        assert!(matches!(result, Err(ViewSystemBuildError::MissingLocationProviders)));
    }

    #[test]
    fn test_view_root_adds_file_system_provider() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("views/shop")).unwrap();
        fs::write(dir.path().join("views/shop/index.html"), "shop at {path}").unwrap();
        fs::write(dir.path().join("views/index.html"), "home").unwrap();

        let system = ViewSystem::builder()
            .configuration(ViewConfiguration::new().with_view_root(dir.path()).with_base_path("/app"))
            .engine(RawEngine::new("html"))
            .build()
            .unwrap();

        assert_eq!(system.view_location_cache().len(), 2);
        assert_eq!(system.view_cache().len(), 0);
        assert_eq!(render(&system, "index"), "shop at /app/");
        assert_eq!(render(&system, "views/index"), "home");
        assert_eq!(system.view_cache().len(), 2);
    }

    #[test]
    fn test_refresh_picks_up_new_views() {
        let dir = TempDir::new().unwrap();
        let system = ViewSystem::builder()
            .configuration(ViewConfiguration::new().with_view_root(dir.path()))
            .engine(RawEngine::new("html"))
            .build()
            .unwrap();

        assert_eq!(render(&system, "about"), "");

        fs::write(dir.path().join("about.html"), "about").unwrap();
        assert_eq!(render(&system, "about"), "");

        system.refresh();
        assert_eq!(render(&system, "about"), "about");
    }

    #[test]
    fn test_view_sources_are_asked_after_the_location_cache() {
        let system = ViewSystem::builder()
            .engine(RawEngine::new("html"))
            .engine(RawEngine::new("htm"))
            .location_provider(Views(vec![ViewLocationResult::from_bytes("views", "index", "html", "cached")]))
            .view_source(ProviderViewSource::new(Views(vec![
                ViewLocationResult::from_bytes("views", "index", "html", "shadowed"),
                ViewLocationResult::from_bytes("views", "extra", "html", "extra"),
                ViewLocationResult::from_bytes("views", "dup", "html", ""),
                ViewLocationResult::from_bytes("views", "dup", "htm", ""),
            ])))
            .build()
            .unwrap();

        assert_eq!(system.view_location_cache().len(), 1);
        assert_eq!(render(&system, "index"), "cached");
        assert_eq!(render(&system, "extra"), "extra");

        let request = RequestContext::from_request(http::Request::new(()));
        let result = system.render_named("dup", &ViewLocationContext::new(&request));
        assert!(matches!(result, Err(ViewError::AmbiguousViews { count: 2, .. })));
    }

    #[test]
    fn test_failure_hook() {
        struct Failing(Vec<String>);

        impl ViewEngine for Failing {
            fn extensions(&self) -> &[String] {
                &self.0
            }

            fn render_view(&self, _: &ViewLocationResult, _: Option<&Model>, _: &dyn RenderContext) -> Result<ViewWriter, BoxError> {
                Err("broken".into())
            }
        }

        let failures = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let system = ViewSystem::builder()
            .engine(Failing(vec!["html".into()]))
            .location_provider(Views(vec![ViewLocationResult::from_bytes("", "index", "html", "")]))
            .on_render_failure(move |_, _| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .build()
            .unwrap();

        assert_eq!(render(&system, "index"), "");
        assert_eq!(failures.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
