//! Embedded resource view location.
//!
//! Views compiled into the binary are grouped in [`EmbeddedAssembly`] values. A
//! resource is addressed by a dotted name such as `MyApp.Views.Home.index.html`;
//! the assembly's common namespace (`MyApp`) and the file name (`index.html`) are
//! stripped and the remaining namespace becomes the view location (`Views/Home`).

use crate::ViewError;
use crate::location::{ViewLocationProvider, ViewLocationResult};
use crate::utils::contains_extension;
use bytes::Bytes;
use include_dir::Dir;
use std::sync::Arc;
use tracing::{debug, trace};

/// Prefixes of assembly names that never carry views.
const DEFAULT_IGNORED_ASSEMBLIES: &[&str] =
    &["std", "core", "alloc", "proc_macro", "test", "mockall", "criterion", "tokio", "serde"];

/// A named template compiled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedResource {
    name: String,
    contents: Bytes,
}

impl EmbeddedResource {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self { name: name.into(), contents: contents.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A unit of embedded resources, together with the names of the types it defines.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedAssembly {
    name: String,
    type_names: Vec<String>,
    root_namespace: Option<String>,
    resources: Vec<EmbeddedResource>,
}

impl EmbeddedAssembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Builds an assembly from a directory embedded with `include_dir!`.
    ///
    /// Files are named `{root_namespace}.{path with '/' replaced by '.'}`, and the
    /// root namespace is registered so it is stripped from every resource.
    pub fn from_dir(name: impl Into<String>, root_namespace: &str, dir: &Dir<'static>) -> Self {
        let mut assembly = Self::new(name).with_root_namespace(root_namespace);
        collect_dir(dir, root_namespace, &mut assembly.resources);
        assembly
    }

    /// Registers the fully qualified name of a type defined by the assembly.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_names.push(type_name.into());
        self
    }

    /// Overrides the namespace stripped from resource names.
    #[must_use]
    pub fn with_root_namespace(mut self, root_namespace: impl Into<String>) -> Self {
        self.root_namespace = Some(root_namespace.into());
        self
    }

    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        self.resources.push(EmbeddedResource::new(name, contents));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &[EmbeddedResource] {
        &self.resources
    }

    /// Longest namespace shared by every type of the assembly, compared segment by segment.
    pub fn common_namespace(&self) -> String {
        let mut namespaces = self
            .type_names
            .iter()
            .map(|type_name| type_name.rsplit_once('.').map_or("", |(namespace, _)| namespace))
            .map(|namespace| namespace.split('.').filter(|segment| !segment.is_empty()).collect::<Vec<_>>());

        let Some(mut common) = namespaces.next() else {
            return String::new();
        };

        for namespace in namespaces {
            let shared = common.iter().zip(namespace.iter()).take_while(|(a, b)| a == b).count();
            common.truncate(shared);
        }

        common.join(".")
    }
}

fn collect_dir(dir: &Dir<'static>, root_namespace: &str, resources: &mut Vec<EmbeddedResource>) {
    for file in dir.files() {
        let path = file.path().to_string_lossy().replace(['/', '\\'], ".");
        let name = if root_namespace.is_empty() { path } else { format!("{root_namespace}.{path}") };
        resources.push(EmbeddedResource::new(name, Bytes::from_static(file.contents())));
    }

    for sub_dir in dir.dirs() {
        collect_dir(sub_dir, root_namespace, resources);
    }
}

/// Locates views among embedded resources.
#[derive(Debug, Clone)]
pub struct ResourceViewLocationProvider {
    assemblies: Vec<Arc<EmbeddedAssembly>>,
    ignored_assemblies: Vec<String>,
}

impl ResourceViewLocationProvider {
    pub fn new(assemblies: impl IntoIterator<Item = EmbeddedAssembly>) -> Self {
        Self {
            assemblies: assemblies.into_iter().map(Arc::new).collect(),
            ignored_assemblies: DEFAULT_IGNORED_ASSEMBLIES.iter().map(|prefix| (*prefix).to_string()).collect(),
        }
    }

    /// Skips assemblies whose name starts with `prefix`.
    #[must_use]
    pub fn ignore(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_assemblies.push(prefix.into());
        self
    }

    fn is_ignored(&self, assembly: &EmbeddedAssembly) -> bool {
        self.ignored_assemblies.iter().any(|prefix| is_name_or_child(assembly.name(), prefix))
    }

    fn get_view_locations(
        assembly: &EmbeddedAssembly,
        supported_extensions: &[String],
    ) -> Result<Vec<ViewLocationResult>, ViewError> {
        let matches = assembly
            .resources()
            .iter()
            .filter(|resource| {
                resource_extension(resource.name()).is_some_and(|ext| contains_extension(supported_extensions, ext))
            })
            .collect::<Vec<_>>();

        if matches.is_empty() {
            return Ok(Vec::new());
        }

        if matches.len() == 1 && assembly.root_namespace.is_none() {
            return Err(ViewError::missing_root_namespace(assembly.name()));
        }

        let common_namespace = assembly.root_namespace.clone().unwrap_or_else(|| assembly.common_namespace());
        if common_namespace.is_empty() {
            debug!(assembly = assembly.name(), "no common namespace, skipping embedded views");
            return Ok(Vec::new());
        }

        let views = matches
            .into_iter()
            .filter_map(|resource| {
                let (name, extension) = resource_file_name(resource.name())?;
                let location = resource_location(&common_namespace, resource.name(), name, extension);
                let view = ViewLocationResult::from_bytes(location, name, extension, resource.contents.clone());
                trace!(assembly = assembly.name(), view = %view, "located embedded view");
                Some(view)
            })
            .collect();

        Ok(views)
    }
}

impl ViewLocationProvider for ResourceViewLocationProvider {
    fn get_located_views(&self, supported_extensions: &[String]) -> Result<Vec<ViewLocationResult>, ViewError> {
        let mut views = Vec::new();
        for assembly in self.assemblies.iter().filter(|assembly| !self.is_ignored(assembly)) {
            views.extend(Self::get_view_locations(assembly, supported_extensions)?);
        }
        Ok(views)
    }
}

fn is_name_or_child(name: &str, prefix: &str) -> bool {
    name == prefix || name.strip_prefix(prefix).is_some_and(|rest| rest.starts_with(['.', '_', '-', ':']))
}

fn resource_extension(resource_name: &str) -> Option<&str> {
    resource_name.rsplit_once('.').map(|(_, extension)| extension).filter(|extension| !extension.is_empty())
}

/// Splits the last two dotted segments into (file name, extension).
fn resource_file_name(resource_name: &str) -> Option<(&str, &str)> {
    let (rest, extension) = resource_name.rsplit_once('.')?;
    let name = rest.rsplit('.').next()?;
    if name.is_empty() || extension.is_empty() {
        return None;
    }
    Some((name, extension))
}

fn resource_location(common_namespace: &str, resource_name: &str, name: &str, extension: &str) -> String {
    let without_namespace = resource_name
        .strip_prefix(common_namespace)
        .filter(|rest| rest.starts_with('.'))
        .unwrap_or(resource_name);
    let file_name_len = name.len() + extension.len() + 1;
    let namespace = &without_namespace[..without_namespace.len().saturating_sub(file_name_len)];

    namespace.trim_matches('.').replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["html".to_string(), "sshtml".to_string()]
    }

    fn assembly() -> EmbeddedAssembly {
        EmbeddedAssembly::new("shop")
            .with_type_name("Shop.Modules.HomeModule")
            .with_type_name("Shop.Models.Product")
            .with_resource("Shop.Views.Home.index.html", "<p>home</p>")
            .with_resource("Shop.Views.Products.list.SSHTML", "<ul></ul>")
            .with_resource("Shop.Styles.site.css", "body {}")
    }

    #[test]
    fn test_common_namespace() {
        assert_eq!(assembly().common_namespace(), "Shop");
        assert_eq!(EmbeddedAssembly::new("empty").common_namespace(), "");
        assert_eq!(
            EmbeddedAssembly::new("a").with_type_name("A.B.C.One").with_type_name("A.B.C.Two").common_namespace(),
            "A.B.C"
        );
    }

    #[test]
    fn test_located_views() {
        let provider = ResourceViewLocationProvider::new([assembly()]);
        let views = provider.get_located_views(&extensions()).unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].location(), "Views/Home");
        assert_eq!(views[0].name(), "index");
        assert_eq!(views[0].extension(), "html");
        assert_eq!(views[0].read_to_string().unwrap(), "<p>home</p>");

        assert_eq!(views[1].location(), "Views/Products");
        assert_eq!(views[1].extension(), "SSHTML");
    }

    #[test]
    fn test_ignored_assemblies_are_skipped() {
        let std_assembly = EmbeddedAssembly::new("std")
            .with_root_namespace("Std")
            .with_resource("Std.Views.index.html", "");
        let provider = ResourceViewLocationProvider::new([std_assembly, assembly()]).ignore("shop");

        assert!(provider.get_located_views(&extensions()).unwrap().is_empty());
    }

    #[test]
    fn test_single_view_requires_root_namespace() {
        let single = EmbeddedAssembly::new("single").with_type_name("Single.Module").with_resource("Single.Views.index.html", "");
        let provider = ResourceViewLocationProvider::new([single.clone()]);
        assert!(matches!(provider.get_located_views(&extensions()), Err(ViewError::MissingRootNamespace { .. })));

        let provider = ResourceViewLocationProvider::new([single.with_root_namespace("Single")]);
        let views = provider.get_located_views(&extensions()).unwrap();
        assert_eq!(views[0].location(), "Views");
    }

    static EMBEDDED: Dir<'static> = include_dir::include_dir!("$CARGO_MANIFEST_DIR/resources/embedded");

    #[test]
    fn test_embedded_dir() {
        let assembly = EmbeddedAssembly::from_dir("site", "Site", &EMBEDDED);
        let mut names = assembly.resources().iter().map(EmbeddedResource::name).collect::<Vec<_>>();
        names.sort_unstable();
        assert_eq!(names, ["Site.content.site.css", "Site.views.home.index.html", "Site.views.shared.layout.sshtml"]);

        let provider = ResourceViewLocationProvider::new([assembly]);
        let mut views = provider.get_located_views(&extensions()).unwrap();
        views.sort_by_key(ToString::to_string);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].location(), "views/home");
        assert_eq!(views[0].name(), "index");
        assert_eq!(views[0].read_to_string().unwrap(), "<p>home</p>\n");
        assert_eq!(views[1].to_string(), "views/shared/layout.sshtml");
    }

    #[test]
    fn test_resource_file_name() {
        assert_eq!(resource_file_name("A.Views.index.html"), Some(("index", "html")));
        assert_eq!(resource_file_name("index.html"), Some(("index", "html")));
        assert_eq!(resource_file_name("html"), None);
    }

    #[test]
    fn test_is_name_or_child() {
        assert!(is_name_or_child("std", "std"));
        assert!(is_name_or_child("serde_json", "serde"));
        assert!(!is_name_or_child("stdlib_views", "std_"));
        assert!(!is_name_or_child("shop", "sh"));
    }
}
