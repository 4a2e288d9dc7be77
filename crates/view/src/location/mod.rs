//! View location: where view templates live and how they are read.
//!
//! A [`ViewLocationResult`] describes one template by its location (directory or
//! namespace path), name and extension, plus a [`ViewContents`] source that opens a
//! fresh reader on every call. Results are produced by [`ViewLocationProvider`]s and
//! aggregated by the [`ViewLocationCache`].

mod cache;
mod file_system;
mod provider;
mod resource;

pub use cache::ViewLocationCache;
pub use file_system::{DefaultFileSystemReader, FileSystemReader, FileSystemViewContents, FileSystemViewLocationProvider};
pub use provider::ViewLocationProvider;
pub use resource::{EmbeddedAssembly, EmbeddedResource, ResourceViewLocationProvider};

use bytes::Bytes;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// A source of template contents.
///
/// Every call to [`open`](ViewContents::open) returns a new reader; callers read it
/// to the end and drop it, they never keep it across calls.
pub trait ViewContents: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Returns true if the contents changed since they were last read.
    fn is_stale(&self) -> bool {
        false
    }
}

struct FnContents<F>(F);

impl<F> ViewContents for FnContents<F>
where
    F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync,
{
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        (self.0)()
    }
}

struct BytesContents(Bytes);

impl ViewContents for BytesContents {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.0.clone())))
    }
}

/// Describes a located view template.
///
/// Equality and hashing are structural over (location, name, extension), which
/// makes the result usable as a cache key. The contents source is shared between
/// clones.
#[derive(Clone)]
pub struct ViewLocationResult {
    location: String,
    name: String,
    extension: String,
    contents: Arc<dyn ViewContents>,
}

impl ViewLocationResult {
    /// Creates a result whose contents are produced by `contents` on every read.
    pub fn new<F>(location: impl Into<String>, name: impl Into<String>, extension: impl Into<String>, contents: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self::with_contents(location, name, extension, Arc::new(FnContents(contents)))
    }

    /// Creates a result over an in-memory template.
    pub fn from_bytes(
        location: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self::with_contents(location, name, extension, Arc::new(BytesContents(contents.into())))
    }

    /// Creates a result backed by a file, tracking when it was last read for staleness checks.
    pub fn file_system(
        location: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        path: impl Into<PathBuf>,
        reader: Arc<dyn FileSystemReader>,
    ) -> Self {
        Self::with_contents(location, name, extension, Arc::new(FileSystemViewContents::new(path, reader)))
    }

    pub fn with_contents(
        location: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        contents: Arc<dyn ViewContents>,
    ) -> Self {
        let location = location.into();
        Self {
            location: location.trim_end_matches('/').to_string(),
            name: name.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            contents,
        }
    }

    /// Directory or namespace path of the view, without a trailing separator.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// File name of the view without its extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension of the view without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Opens a fresh reader over the view's contents.
    pub fn contents(&self) -> io::Result<Box<dyn Read + Send>> {
        self.contents.open()
    }

    /// Reads the whole template, closing the reader before returning.
    pub fn read_to_string(&self) -> io::Result<String> {
        let mut reader = self.contents()?;
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(buf)
    }

    /// Returns true if the underlying template changed since it was last read.
    pub fn is_stale(&self) -> bool {
        self.contents.is_stale()
    }

    /// Returns true if `extension` names this view's extension, ignoring case and leading dots.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extension.eq_ignore_ascii_case(extension.trim_start_matches('.'))
    }
}

impl PartialEq for ViewLocationResult {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.name == other.name && self.extension == other.extension
    }
}

impl Eq for ViewLocationResult {}

impl Hash for ViewLocationResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
        self.name.hash(state);
        self.extension.hash(state);
    }
}

impl fmt::Display for ViewLocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}.{}", self.name, self.extension)
        } else {
            write!(f, "{}/{}.{}", self.location, self.name, self.extension)
        }
    }
}

impl fmt::Debug for ViewLocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewLocationResult")
            .field("location", &self.location)
            .field("name", &self.name)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}
