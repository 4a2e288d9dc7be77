use crate::host::ViewEngineHost;
use serde_json::Value;

/// A user supplied substitution pass.
///
/// Matchers run after the built-in substitutions and before partials and master
/// pages are composed, in registration order. Any closure of the right shape is a
/// matcher.
pub trait ViewEngineMatcher: Send + Sync {
    fn invoke(&self, content: &str, model: &Value, host: &dyn ViewEngineHost) -> String;
}

impl<F> ViewEngineMatcher for F
where
    F: Fn(&str, &Value, &dyn ViewEngineHost) -> String + Send + Sync,
{
    fn invoke(&self, content: &str, model: &Value, host: &dyn ViewEngineHost) -> String {
        self(content, model, host)
    }
}
