use std::error::Error;
use std::io;
use thiserror::Error;

/// Boxed error returned across the plug-in seams (engines, conventions).
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("ambiguous views, {count} views match: {}", views.join(", "))]
    AmbiguousViews { count: usize, views: Vec<String> },

    #[error("only one view was found in assembly {assembly}, but no root namespace had been registered")]
    MissingRootNamespace { assembly: String },

    #[error("csrf is not enabled on this request")]
    CsrfNotEnabled,

    #[error("unsupported model type {type_name}, dynamic models must expose a string keyed dictionary")]
    UnsupportedModel { type_name: String },

    #[error("model serialization error: {source}")]
    ModelSerialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ViewError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn ambiguous_views(views: Vec<String>) -> Self {
        Self::AmbiguousViews { count: views.len(), views }
    }

    pub fn missing_root_namespace<S: ToString>(assembly: S) -> Self {
        Self::MissingRootNamespace { assembly: assembly.to_string() }
    }

    pub fn unsupported_model<S: ToString>(type_name: S) -> Self {
        Self::UnsupportedModel { type_name: type_name.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if this error must surface instead of being treated as a declined candidate.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousViews { .. })
    }
}

#[derive(Error, Debug)]
pub enum ViewSystemBuildError {
    #[error("at least one view engine must be registered")]
    MissingViewEngines,
    #[error("at least one view location provider must be registered, or a view root configured")]
    MissingLocationProviders,
}
