//! Filesystem view location.
//!
//! [`FileSystemViewLocationProvider`] walks a root directory for templates with a
//! supported extension. Every result it produces carries a [`FileSystemViewContents`]
//! source, which remembers the modification time of the file when it was last read
//! and compares it against live metadata in [`is_stale`](ViewContents::is_stale).

use crate::ViewError;
use crate::location::{ViewContents, ViewLocationProvider, ViewLocationResult};
use arc_swap::ArcSwapOption;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Filesystem access used by view location.
pub trait FileSystemReader: Send + Sync {
    /// Returns every file below `root` whose extension is in `extensions`.
    ///
    /// `extensions` are lower case and carry no leading dot.
    fn get_views_with_supported_extensions(&self, root: &Path, extensions: &HashSet<String>) -> io::Result<Vec<PathBuf>>;

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// [`FileSystemReader`] over the local disk, walking directories with `walkdir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFileSystemReader;

impl FileSystemReader for DefaultFileSystemReader {
    fn get_views_with_supported_extensions(&self, root: &Path, extensions: &HashSet<String>) -> io::Result<Vec<PathBuf>> {
        let mut views = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            // a dangling link or an unreadable directory only hides itself
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(cause = %e, path = ?e.path(), "skipping unreadable view entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| extensions.contains(&extension.to_ascii_lowercase()));

            if matches {
                views.push(entry.into_path());
            }
        }
        Ok(views)
    }

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Contents of a template file, with staleness tracking.
pub struct FileSystemViewContents {
    path: PathBuf,
    reader: Arc<dyn FileSystemReader>,
    last_updated: ArcSwapOption<SystemTime>,
}

impl FileSystemViewContents {
    pub fn new(path: impl Into<PathBuf>, reader: Arc<dyn FileSystemReader>) -> Self {
        Self { path: path.into(), reader, last_updated: ArcSwapOption::empty() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the file when it was last read, `None` before the first read.
    pub fn last_updated(&self) -> Option<SystemTime> {
        self.last_updated.load().as_deref().copied()
    }
}

impl ViewContents for FileSystemViewContents {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let modified = self.reader.last_modified(&self.path).ok();
        let reader = self.reader.open(&self.path)?;
        self.last_updated.store(modified.map(Arc::new));
        Ok(reader)
    }

    fn is_stale(&self) -> bool {
        let Some(last_updated) = self.last_updated() else {
            return true;
        };

        match self.reader.last_modified(&self.path) {
            Ok(modified) => modified != last_updated,
            Err(_) => true,
        }
    }
}

/// Locates views on disk below a root directory.
pub struct FileSystemViewLocationProvider {
    root: Option<PathBuf>,
    reader: Arc<dyn FileSystemReader>,
}

impl FileSystemViewLocationProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_reader(Some(root.into()), Arc::new(DefaultFileSystemReader))
    }

    pub fn with_reader(root: Option<PathBuf>, reader: Arc<dyn FileSystemReader>) -> Self {
        Self { root, reader }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn located_view(&self, root: &Path, path: PathBuf) -> Option<ViewLocationResult> {
        let name = path.file_stem()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_string();
        let location = location_of(root, &path);

        Some(ViewLocationResult::file_system(location, name, extension, path, Arc::clone(&self.reader)))
    }
}

impl ViewLocationProvider for FileSystemViewLocationProvider {
    fn get_located_views(&self, supported_extensions: &[String]) -> Result<Vec<ViewLocationResult>, ViewError> {
        let Some(root) = self.root.as_deref().filter(|root| !root.as_os_str().is_empty()) else {
            return Ok(Vec::new());
        };

        if !root.is_dir() {
            debug!(root = %root.display(), "view root is not a directory, no views located");
            return Ok(Vec::new());
        }

        let extensions = supported_extensions
            .iter()
            .map(|extension| extension.trim_start_matches('.').to_ascii_lowercase())
            .collect::<HashSet<_>>();

        let views = self
            .reader
            .get_views_with_supported_extensions(root, &extensions)?
            .into_iter()
            .filter_map(|path| self.located_view(root, path))
            .inspect(|view| trace!(view = %view, "located view on disk"))
            .collect();

        Ok(views)
    }
}

/// Directory of `path` relative to `root`, with `/` separators and no trailing separator.
fn location_of(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let Some(parent) = relative.parent() else {
        return String::new();
    };

    parent
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn extensions(extensions: &[&str]) -> Vec<String> {
        extensions.iter().map(|extension| (*extension).to_string()).collect()
    }

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_locates_views_recursively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "root");
        write(dir.path(), "views/home/list.sshtml", "list");
        write(dir.path(), "views/home/notes.txt", "ignored");

        let provider = FileSystemViewLocationProvider::new(dir.path());
        let mut views = provider.get_located_views(&extensions(&["html", "sshtml"])).unwrap();
        views.sort_by(|a, b| a.to_string().cmp(&b.to_string()));

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].to_string(), "index.html");
        assert_eq!(views[0].location(), "");
        assert_eq!(views[1].location(), "views/home");
        assert_eq!(views[1].name(), "list");
        assert_eq!(views[1].extension(), "sshtml");
        assert_eq!(views[1].read_to_string().unwrap(), "list");
    }

    #[test]
    fn test_extension_matching_is_case_insensitive_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "views/index.HTML", "upper");

        let provider = FileSystemViewLocationProvider::new(dir.path());
        let views = provider.get_located_views(&extensions(&["html", "HTML", ".html"])).unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].extension(), "HTML");
    }

    #[test]
    fn test_missing_or_empty_root_locates_nothing() {
        let provider = FileSystemViewLocationProvider::with_reader(None, Arc::new(DefaultFileSystemReader));
        assert!(provider.get_located_views(&extensions(&["html"])).unwrap().is_empty());

        let provider = FileSystemViewLocationProvider::new("");
        assert!(provider.get_located_views(&extensions(&["html"])).unwrap().is_empty());

        let dir = TempDir::new().unwrap();
        let provider = FileSystemViewLocationProvider::new(dir.path().join("missing"));
        assert!(provider.get_located_views(&extensions(&["html"])).unwrap().is_empty());
    }

    #[test]
    fn test_staleness() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "index.html", "v1");
        let file = File::options().write(true).open(&path).unwrap();
        let initial = SystemTime::now() - Duration::from_secs(60);
        file.set_modified(initial).unwrap();

        let provider = FileSystemViewLocationProvider::new(dir.path());
        let view = provider.get_located_views(&extensions(&["html"])).unwrap().remove(0);

        assert!(view.is_stale(), "a view is stale before it has been read");

        assert_eq!(view.read_to_string().unwrap(), "v1");
        assert!(!view.is_stale());

        file.set_modified(initial + Duration::from_secs(30)).unwrap();
        assert!(view.is_stale(), "touching the file makes the view stale");

        view.read_to_string().unwrap();
        assert!(!view.is_stale());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_does_not_hide_other_views() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "views/index.html", "index");
        std::os::unix::fs::symlink(dir.path().join("views/missing.html"), dir.path().join("views/stale-link.html")).unwrap();

        let provider = FileSystemViewLocationProvider::new(dir.path());
        let views = provider.get_located_views(&extensions(&["html"])).unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].to_string(), "views/index.html");
    }

    #[test]
    fn test_failed_read_keeps_last_updated() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "index.html", "v1");
        let contents = FileSystemViewContents::new(&path, Arc::new(DefaultFileSystemReader));

        contents.open().unwrap();
        let last_updated = contents.last_updated();
        assert!(last_updated.is_some());

        fs::remove_file(&path).unwrap();
        assert!(contents.open().is_err());
        assert_eq!(contents.last_updated(), last_updated);
    }

    #[test]
    fn test_location_of() {
        let root = Path::new("/srv/views");
        assert_eq!(location_of(root, Path::new("/srv/views/index.html")), "");
        assert_eq!(location_of(root, Path::new("/srv/views/a/b/index.html")), "a/b");
    }
}
