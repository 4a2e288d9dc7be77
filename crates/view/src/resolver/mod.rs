//! View name resolution.
//!
//! A handler asks for a logical view name such as `index`; the resolver turns it
//! into a located template by running the [`ViewLocationConventions`] in order and
//! handing every candidate name to the [`ViewLocator`]. The first candidate that
//! locates a view wins.

mod conventions;

pub use conventions::{ViewLocationConvention, ViewLocationConventions};

use crate::locator::ViewLocator;
use crate::location::ViewLocationResult;
use crate::{Model, ViewError, ViewLocationContext};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves a view name, model and context to a located view.
pub trait ViewResolver: Send + Sync {
    fn get_view_location(
        &self,
        view_name: &str,
        model: Option<&Model>,
        context: &ViewLocationContext<'_>,
    ) -> Result<Option<ViewLocationResult>, ViewError>;
}

pub struct DefaultViewResolver {
    locator: Arc<dyn ViewLocator>,
    conventions: ViewLocationConventions,
}

impl DefaultViewResolver {
    pub fn new(locator: Arc<dyn ViewLocator>, conventions: ViewLocationConventions) -> Self {
        Self { locator, conventions }
    }

    pub fn conventions(&self) -> &ViewLocationConventions {
        &self.conventions
    }
}

impl ViewResolver for DefaultViewResolver {
    fn get_view_location(
        &self,
        view_name: &str,
        model: Option<&Model>,
        context: &ViewLocationContext<'_>,
    ) -> Result<Option<ViewLocationResult>, ViewError> {
        if view_name.is_empty() {
            return Ok(None);
        }

        for (index, convention) in self.conventions.iter().enumerate() {
            let candidate = match convention(view_name, model, context) {
                Ok(Some(candidate)) if !candidate.is_empty() => candidate,
                Ok(_) => continue,
                Err(e) => {
                    debug!(cause = %e, view_name, convention = index, "view location convention failed");
                    continue;
                }
            };

            trace!(view_name, candidate = %candidate, convention = index, "trying view location candidate");
            if let Some(view) = self.locator.locate_view(&candidate)? {
                debug!(view_name, view = %view, "view resolved");
                return Ok(Some(view));
            }
        }

        debug!(view_name, "no convention located the view");
        Ok(None)
    }
}

impl fmt::Debug for DefaultViewResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultViewResolver").field("conventions", &self.conventions).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestContext;
    use crate::locator::MockViewLocator;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> RequestContext {
        RequestContext::from_request(http::Request::new(()))
    }

    fn view(location: &str, name: &str) -> ViewLocationResult {
        ViewLocationResult::from_bytes(location, name, "html", "")
    }

    #[test]
    fn test_first_locatable_candidate_wins() {
        let mut locator = MockViewLocator::new();
        locator.expect_locate_view().with(eq("views/products/index")).times(1).returning(|_| Ok(None));
        locator.expect_locate_view().with(eq("products/index")).times(1).returning(|_| Ok(Some(view("products", "index"))));
        locator.expect_locate_view().with(eq("views/index")).never();

        let resolver = DefaultViewResolver::new(Arc::new(locator), ViewLocationConventions::default());
        let request = request();
        let context = ViewLocationContext::new(&request).with_module_path("/products");

        let found = resolver.get_view_location("index", None, &context).unwrap();
        assert_eq!(found, Some(view("products", "index")));
    }

    #[test]
    fn test_failing_and_empty_conventions_decline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let conventions = ViewLocationConventions::empty()
            .with(|_, _, _| Err("boom".into()))
            .with(|_, _, _| Ok(Some(String::new())))
            .with(move |name, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(format!("shared/{name}")))
            });

        let mut locator = MockViewLocator::new();
        locator.expect_locate_view().with(eq("shared/index")).times(1).returning(|_| Ok(Some(view("shared", "index"))));

        let resolver = DefaultViewResolver::new(Arc::new(locator), conventions);
        let request = request();
        let found = resolver.get_view_location("index", None, &ViewLocationContext::new(&request)).unwrap();

        assert_eq!(found, Some(view("shared", "index")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_view_name() {
        let mut locator = MockViewLocator::new();
        locator.expect_locate_view().never();

        let resolver = DefaultViewResolver::new(Arc::new(locator), ViewLocationConventions::default());
        let request = request();
        assert!(resolver.get_view_location("", None, &ViewLocationContext::new(&request)).unwrap().is_none());
    }

    #[test]
    fn test_nothing_located() {
        let mut locator = MockViewLocator::new();
        locator.expect_locate_view().times(2).returning(|_| Ok(None));

        let resolver = DefaultViewResolver::new(Arc::new(locator), ViewLocationConventions::default());
        let request = request();
        assert!(resolver.get_view_location("index", None, &ViewLocationContext::new(&request)).unwrap().is_none());
    }

    #[test]
    fn test_ambiguity_propagates() {
        let mut locator = MockViewLocator::new();
        locator.expect_locate_view().returning(|_| Err(ViewError::ambiguous_views(vec!["a.html".into(), "a.htm".into()])));

        let resolver = DefaultViewResolver::new(Arc::new(locator), ViewLocationConventions::default());
        let request = request();
        let result = resolver.get_view_location("a", None, &ViewLocationContext::new(&request));
        assert!(matches!(result, Err(ViewError::AmbiguousViews { .. })));
    }
}
