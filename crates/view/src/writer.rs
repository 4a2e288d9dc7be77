//! The output of a render call.
//!
//! A [`ViewWriter`] is handed back to the request handler, which decides where the
//! rendered view goes: into any [`std::io::Write`] through
//! [`write_to`](ViewWriter::write_to), or into an HTTP response through
//! [`into_response`](ViewWriter::into_response).

use bytes::Bytes;
use http::{HeaderValue, Response, header};
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

type WriteFn = dyn Fn(&mut dyn Write) -> io::Result<()> + Send + Sync;

/// Writes a rendered view; may be invoked more than once.
#[derive(Clone)]
pub struct ViewWriter {
    inner: Kind,
}

#[derive(Clone)]
enum Kind {
    Once(Option<Bytes>),
    Stream(Arc<WriteFn>),
}

impl ViewWriter {
    /// A writer that writes nothing.
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self { inner: Kind::Once(Some(bytes)) }
    }

    /// A writer that produces its output while writing.
    pub fn stream<F>(write: F) -> Self
    where
        F: Fn(&mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    {
        Self { inner: Kind::Stream(Arc::new(write)) }
    }

    /// Returns true if this writer is known to write zero bytes.
    pub fn is_empty(&self) -> bool {
        matches!(self.inner, Kind::Once(None))
    }

    pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        match &self.inner {
            Kind::Once(None) => Ok(()),
            Kind::Once(Some(bytes)) => writer.write_all(bytes),
            Kind::Stream(write) => write(writer),
        }
    }

    pub fn to_bytes(&self) -> io::Result<Bytes> {
        match &self.inner {
            Kind::Once(None) => Ok(Bytes::new()),
            Kind::Once(Some(bytes)) => Ok(bytes.clone()),
            Kind::Stream(write) => {
                let mut buf = Vec::new();
                write(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Renders into an HTML response.
    pub fn into_response(self) -> io::Result<Response<Bytes>> {
        let body = self.to_bytes()?;
        let content_type = HeaderValue::from_str(mime::TEXT_HTML_UTF_8.as_ref()).map_err(io::Error::other)?;
        let mut response = Response::new(body);
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        Ok(response)
    }
}

impl Default for ViewWriter {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for ViewWriter {
    fn from(value: String) -> Self {
        Self::once(value)
    }
}

impl From<&'static str> for ViewWriter {
    fn from(value: &'static str) -> Self {
        Self::once(value)
    }
}

impl fmt::Debug for ViewWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(None) => f.write_str("ViewWriter::Empty"),
            Kind::Once(Some(bytes)) => f.debug_tuple("ViewWriter::Once").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("ViewWriter::Stream"),
        }
    }
}
