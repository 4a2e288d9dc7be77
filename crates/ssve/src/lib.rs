//! The Super Simple View Engine for micro-view
//!
//! A small, regex driven template language. Templates reference the model with
//! `@Model.Path`, loop with `@Each`, branch with `@If` / `@IfNot`, pull in other
//! templates with `@Partial` and inherit layouts with `@Master` and `@Section`.
//! See [`engine`] for the full list of directives.
//!
//! Register a [`SuperSimpleViewEngineWrapper`] with a `ViewSystem` to render
//! `.sshtml`, `.html` and `.htm` views:
//!
//! ```ignore
//! let views = ViewSystem::builder()
//!     .configuration(ViewConfiguration::new().with_view_root("./templates"))
//!     .engine(SuperSimpleViewEngineWrapper::new())
//!     .build()?;
//! ```
//!
//! The engine can also be used on its own through [`SuperSimpleViewEngine::render`]
//! with any [`ViewEngineHost`].

pub mod engine;
mod error;
mod extractor;
mod host;
mod matcher;
mod wrapper;

pub use engine::{ERROR_TOKEN, MAX_NESTING_DEPTH, SuperSimpleViewEngine};
pub use error::SsveError;
pub use extractor::{DictionaryExtractor, MemberExtractor, PropertyExtractor};
pub use host::{RenderContextHost, ViewEngineHost};
pub use matcher::ViewEngineMatcher;
pub use wrapper::{EXTENSIONS, SuperSimpleViewEngineWrapper};
