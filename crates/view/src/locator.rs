//! View lookup by name.
//!
//! A view name is a `/` separated path whose last segment is the view's file name,
//! with or without extension: `views/home/index` or `views/home/index.html`. The
//! directory part is matched against [`ViewLocationResult::location`], the rest
//! against name and extension, all ignoring ASCII case.
//!
//! [`DefaultViewLocator`] asks an ordered list of [`ViewSourceProvider`]s and takes
//! the first match. A source that fails is treated as having no match, with one
//! exception: a lookup matching several views is reported as
//! [`ViewError::AmbiguousViews`] instead of picking one of them.

use crate::ViewError;
use crate::location::{ViewLocationCache, ViewLocationProvider, ViewLocationResult};
use crate::utils::{contains_extension, view_name_extension};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// A source a view can be looked up in.
pub trait ViewSourceProvider: Send + Sync {
    /// Returns the single view matching `view_name` with one of `extensions`.
    fn locate_view(&self, view_name: &str, extensions: &[String]) -> Result<Option<ViewLocationResult>, ViewError>;
}

/// Locates views by name.
#[cfg_attr(test, mockall::automock)]
pub trait ViewLocator: Send + Sync {
    /// Locates `view_name`, searching only its own extension when it carries one,
    /// every supported extension otherwise.
    fn locate_view(&self, view_name: &str) -> Result<Option<ViewLocationResult>, ViewError>;
}

impl ViewSourceProvider for ViewLocationCache {
    fn locate_view(&self, view_name: &str, extensions: &[String]) -> Result<Option<ViewLocationResult>, ViewError> {
        unique_matching_view(view_name, extensions, self.views().iter())
    }
}

/// Looks views up by scanning a [`ViewLocationProvider`] on every call.
pub struct ProviderViewSource<P> {
    provider: P,
}

impl<P: ViewLocationProvider> ProviderViewSource<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ViewLocationProvider> ViewSourceProvider for ProviderViewSource<P> {
    fn locate_view(&self, view_name: &str, extensions: &[String]) -> Result<Option<ViewLocationResult>, ViewError> {
        let views = self.provider.get_located_views(extensions)?;
        unique_matching_view(view_name, extensions, views.iter())
    }
}

impl<P> fmt::Debug for ProviderViewSource<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderViewSource").finish_non_exhaustive()
    }
}

/// Asks its sources in registration order; the first one with a match wins.
pub struct DefaultViewLocator {
    sources: Vec<Arc<dyn ViewSourceProvider>>,
    supported_extensions: Vec<String>,
}

impl DefaultViewLocator {
    pub fn new(sources: Vec<Arc<dyn ViewSourceProvider>>, supported_extensions: Vec<String>) -> Self {
        Self { sources, supported_extensions }
    }

    pub fn supported_extensions(&self) -> &[String] {
        &self.supported_extensions
    }

    /// Locates `view_name` among the given extensions.
    ///
    /// An explicit extension on the view name replaces `supported_extensions`.
    /// Source failures are logged and skipped, ambiguity is returned.
    pub fn locate_view_with(
        &self,
        view_name: &str,
        supported_extensions: &[String],
    ) -> Result<Option<ViewLocationResult>, ViewError> {
        if view_name.is_empty() || supported_extensions.is_empty() || self.sources.is_empty() {
            return Ok(None);
        }

        let explicit;
        let extensions = match view_name_extension(view_name) {
            Some(extension) => {
                explicit = [extension.to_string()];
                &explicit[..]
            }
            None => supported_extensions,
        };

        for (index, source) in self.sources.iter().enumerate() {
            match source.locate_view(view_name, extensions) {
                Ok(Some(view)) => {
                    trace!(view_name, view = %view, source = index, "view located");
                    return Ok(Some(view));
                }
                Ok(None) => {}
                Err(e) if e.is_ambiguous() => return Err(e),
                Err(e) => warn!(cause = %e, view_name, source = index, "view source failed, trying the next one"),
            }
        }

        Ok(None)
    }
}

impl ViewLocator for DefaultViewLocator {
    fn locate_view(&self, view_name: &str) -> Result<Option<ViewLocationResult>, ViewError> {
        self.locate_view_with(view_name, &self.supported_extensions)
    }
}

impl fmt::Debug for DefaultViewLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultViewLocator")
            .field("sources", &self.sources.len())
            .field("supported_extensions", &self.supported_extensions)
            .finish()
    }
}

/// Finds the view matching `view_name`; more than one match is an error.
///
/// The extension of `view_name`, when present, must be one of `extensions`.
pub fn unique_matching_view<'v>(
    view_name: &str,
    extensions: &[String],
    views: impl IntoIterator<Item = &'v ViewLocationResult>,
) -> Result<Option<ViewLocationResult>, ViewError> {
    let (location, file_name) = view_name.trim_start_matches('/').rsplit_once('/').unwrap_or(("", view_name.trim_start_matches('/')));
    let (name, extension) = match view_name_extension(file_name) {
        Some(extension) => (&file_name[..file_name.len() - extension.len() - 1], Some(extension)),
        None => (file_name, None),
    };

    if extension.is_some_and(|extension| !contains_extension(extensions, extension)) {
        return Ok(None);
    }

    let mut matches = views.into_iter().filter(|view| {
        view.location().eq_ignore_ascii_case(location)
            && view.name().eq_ignore_ascii_case(name)
            && match extension {
                Some(extension) => view.has_extension(extension),
                None => contains_extension(extensions, view.extension()),
            }
    });

    let Some(first) = matches.next() else {
        return Ok(None);
    };

    let rest = matches.collect::<Vec<_>>();
    if rest.is_empty() {
        return Ok(Some(first.clone()));
    }

    let views = std::iter::once(first).chain(rest).map(ToString::to_string).collect();
    Err(ViewError::ambiguous_views(views))
}
