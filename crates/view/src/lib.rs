//! View location, resolution and rendering for the micro web framework
//!
//! This crate turns a logical view name and a model into rendered output. The work
//! is split into small stages that are wired together by [`ViewSystem`]:
//!
//! - location providers scan a directory tree or embedded resources for templates
//! - the [`ViewLocationCache`] keeps the union of everything they found
//! - the [`DefaultViewLocator`] finds one template by name, case-insensitively
//! - the [`DefaultViewResolver`] tries an ordered list of naming conventions
//! - the [`ViewCache`] memoizes whatever an engine compiled a template into
//! - the [`DefaultViewFactory`] dispatches to the [`ViewEngine`] registered for the
//!   template's extension, through a per-call [`RenderContext`]
//!
//! Template languages live in their own crates and plug in as [`ViewEngine`]s.
//!
//! # Example
//!
//! ```ignore
//! use micro_view::{Model, RequestContext, ViewConfiguration, ViewFactory, ViewLocationContext, ViewSystem};
//!
//! let views = ViewSystem::builder()
//!     .configuration(ViewConfiguration::new().with_view_root("./templates"))
//!     .engine(my_engine)
//!     .build()?;
//!
//! let request = RequestContext::from_request(request);
//! let context = ViewLocationContext::new(&request).with_module_path("/products");
//! let writer = views.render_model(&Model::from_serialize(&product)?, &context)?;
//! writer.write_to(&mut out)?;
//! ```

mod bootstrap;
mod config;
mod engine;
mod error;
mod factory;
mod model;
mod request;
mod render_context;
mod startup;
mod utils;
mod view_cache;
mod writer;

pub mod location;
pub mod locator;
pub mod resolver;

pub use bootstrap::{ViewSystem, ViewSystemBuilder};
pub use config::ViewConfiguration;
pub use engine::{ViewEngine, ViewEngineStartupContext, supported_extensions};
pub use error::{BoxError, ViewError, ViewSystemBuildError};
pub use factory::{DefaultViewFactory, RenderFailureHook, ViewFactory};
pub use location::{ViewLocationCache, ViewLocationResult};
pub use locator::{DefaultViewLocator, ViewLocator};
pub use model::{DynamicDictionary, DynamicObject, Model, ModelShape};
pub use render_context::{
    CsrfToken, DefaultRenderContext, DefaultRenderContextFactory, RenderContext, RenderContextFactory, StaticTextResource,
    TextResource,
};
pub use request::{RequestContext, ViewLocationContext};
pub use resolver::{DefaultViewResolver, ViewResolver};
pub use startup::ViewEngineStartup;
pub use utils::html_encode;
pub use view_cache::ViewCache;
pub use writer::ViewWriter;
