//! Request scoped state consumed by view location and rendering.
//!
//! This module contains the types a render call sees of the current request:
//! - `RequestContext`: the request head, the application base path and the item bag
//! - `ViewLocationContext`: the module a view is rendered for plus its request

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Represents the context of an HTTP request as seen by the view subsystem.
///
/// Items stored in the bag are shared with other request pipeline stages, e.g. the
/// CSRF stage stores its token under [`RequestContext::CSRF_TOKEN_KEY`].
pub struct RequestContext {
    head: Parts,
    base_path: Option<String>,
    items: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Item key the CSRF token is stored under, also used as the hidden form field name.
    pub const CSRF_TOKEN_KEY: &'static str = "_csrf";

    /// Creates a new RequestContext from the request head
    pub fn new(head: Parts) -> Self {
        Self { head, base_path: None, items: HashMap::new() }
    }

    /// Creates a new RequestContext from a request, discarding its body
    pub fn from_request<B>(request: Request<B>) -> Self {
        Self::new(request.into_parts().0)
    }

    /// Sets the base path the application is mounted at, e.g. `/blog`
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Stores an item in the request's item bag
    #[must_use]
    pub fn with_item<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert_item(key, value);
        self
    }

    pub fn insert_item<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.items.insert(key.into(), Box::new(value));
    }

    /// Returns an item from the bag, `None` if it is absent
    pub fn item(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.items.get(key).map(|item| &**item)
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Returns the base path the application is mounted at, if any
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref().filter(|base_path| !base_path.is_empty())
    }

    /// Returns the preferred culture of the request, the first `Accept-Language` tag
    pub fn culture(&self) -> Option<&str> {
        let header = self.headers().get(http::header::ACCEPT_LANGUAGE)?.to_str().ok()?;
        header
            .split(',')
            .map(|tag| tag.split(';').next().unwrap_or(tag).trim())
            .find(|tag| !tag.is_empty() && *tag != "*")
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("base_path", &self.base_path)
            .field("items", &self.items.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The request scoped context a view is located and rendered in.
///
/// Created per render call; it borrows the request and is never cached.
#[derive(Debug, Clone, Copy)]
pub struct ViewLocationContext<'r> {
    module_path: &'r str,
    module_name: &'r str,
    context: &'r RequestContext,
}

impl<'r> ViewLocationContext<'r> {
    pub fn new(context: &'r RequestContext) -> Self {
        Self { module_path: "", module_name: "", context }
    }

    /// Sets the route base path of the module rendering the view, e.g. `/products`
    #[must_use]
    pub fn with_module_path(mut self, module_path: &'r str) -> Self {
        self.module_path = module_path;
        self
    }

    /// Sets the name of the module rendering the view, e.g. `products`
    #[must_use]
    pub fn with_module_name(mut self, module_name: &'r str) -> Self {
        self.module_name = module_name;
        self
    }

    pub fn module_path(&self) -> &'r str {
        self.module_path
    }

    pub fn module_name(&self) -> &'r str {
        self.module_name
    }

    pub fn context(&self) -> &'r RequestContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_context() -> RequestContext {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/products/1")
            .header(http::header::ACCEPT_LANGUAGE, "sv-SE;q=0.9, en;q=0.8")
            .body(())
            .unwrap();
        RequestContext::from_request(request)
    }

    #[test]
    fn test_request_head() {
        let context = request_context();
        assert_eq!(context.method(), &Method::GET);
        assert_eq!(context.uri().path(), "/products/1");
        assert_eq!(context.culture(), Some("sv-SE"));
    }

    #[test]
    fn test_items() {
        let context = request_context().with_item("answer", 42_u32);
        assert_eq!(context.item("answer").and_then(|item| item.downcast_ref::<u32>()), Some(&42));
        assert!(context.item("missing").is_none());
    }

    #[test]
    fn test_empty_base_path_is_none() {
        assert_eq!(request_context().with_base_path("").base_path(), None);
        assert_eq!(request_context().with_base_path("/blog").base_path(), Some("/blog"));
    }

    #[test]
    fn test_view_location_context() {
        let context = request_context();
        let view_location_context = ViewLocationContext::new(&context).with_module_path("/products").with_module_name("products");
        assert_eq!(view_location_context.module_path(), "/products");
        assert_eq!(view_location_context.module_name(), "products");
        assert_eq!(view_location_context.context().uri().path(), "/products/1");
    }
}
