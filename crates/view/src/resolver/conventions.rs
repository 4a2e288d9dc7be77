use crate::error::BoxError;
use crate::{Model, ViewLocationContext};
use std::fmt;
use std::sync::Arc;

/// Maps a view name, model and context to a candidate view name.
///
/// `Ok(None)` and `Ok(Some(""))` both decline. An error declines too; the
/// resolver logs it and moves on to the next convention.
pub type ViewLocationConvention =
    Arc<dyn Fn(&str, Option<&Model>, &ViewLocationContext<'_>) -> Result<Option<String>, BoxError> + Send + Sync>;

/// An ordered list of [`ViewLocationConvention`]s; earlier conventions win.
#[derive(Clone)]
pub struct ViewLocationConventions {
    conventions: Vec<ViewLocationConvention>,
}

impl ViewLocationConventions {
    /// An empty list; the resolver will locate nothing until conventions are pushed.
    pub fn empty() -> Self {
        Self { conventions: Vec::new() }
    }

    pub fn new(conventions: Vec<ViewLocationConvention>) -> Self {
        Self { conventions }
    }

    /// Appends a convention, evaluated after every convention already present.
    #[must_use]
    pub fn with<F>(mut self, convention: F) -> Self
    where
        F: Fn(&str, Option<&Model>, &ViewLocationContext<'_>) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    {
        self.conventions.push(Arc::new(convention));
        self
    }

    /// Inserts a convention ahead of every convention already present.
    #[must_use]
    pub fn with_first<F>(mut self, convention: F) -> Self
    where
        F: Fn(&str, Option<&Model>, &ViewLocationContext<'_>) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    {
        self.conventions.insert(0, Arc::new(convention));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewLocationConvention> {
        self.conventions.iter()
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }
}

impl Default for ViewLocationConventions {
    /// Module specific folders first, then the shared `views` folder, then the root.
    fn default() -> Self {
        Self::empty()
            .with(|view_name, _, context| Ok(module_path(context).map(|path| format!("views/{path}/{view_name}"))))
            .with(|view_name, _, context| Ok(module_path(context).map(|path| format!("{path}/{view_name}"))))
            .with(|view_name, _, context| Ok(module_name(context).map(|name| format!("views/{name}/{view_name}"))))
            .with(|view_name, _, context| Ok(module_name(context).map(|name| format!("{name}/{view_name}"))))
            .with(|view_name, _, _| Ok(Some(format!("views/{view_name}"))))
            .with(|view_name, _, _| Ok(Some(view_name.to_string())))
    }
}

impl fmt::Debug for ViewLocationConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewLocationConventions").field("len", &self.conventions.len()).finish()
    }
}

fn module_path<'r>(context: &ViewLocationContext<'r>) -> Option<&'r str> {
    Some(context.module_path().trim_matches('/')).filter(|path| !path.is_empty())
}

fn module_name<'r>(context: &ViewLocationContext<'r>) -> Option<&'r str> {
    Some(context.module_name()).filter(|name| !name.is_empty())
}
