use crate::ViewError;
use crate::location::ViewLocationResult;

/// Scans one source of view templates.
///
/// Implementations return every template whose extension is in
/// `supported_extensions` (compared case-insensitively); finding nothing is an
/// empty vector, not an error. Failures reading the source are returned to the
/// caller, which decides whether to suppress them.
pub trait ViewLocationProvider: Send + Sync {
    fn get_located_views(&self, supported_extensions: &[String]) -> Result<Vec<ViewLocationResult>, ViewError>;
}
