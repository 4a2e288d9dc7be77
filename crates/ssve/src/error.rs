use micro_view::ViewError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SsveError {
    #[error("unsupported model type {type_name}, dynamic models must expose a string keyed dictionary")]
    UnsupportedModel { type_name: String },

    #[error("view error: {source}")]
    View {
        #[from]
        source: ViewError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SsveError {
    pub fn unsupported_model<S: ToString>(type_name: S) -> Self {
        Self::UnsupportedModel { type_name: type_name.to_string() }
    }
}
