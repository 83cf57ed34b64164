//! Objects of the project graph.
//!
//! Objects live in per-kind tables owned by the `Project` and refer to each
//! other through typed indices. An index is only meaningful for the project
//! that handed it out. Parent links of groups and file references are plain
//! indices too: they are never followed when rendering the graph.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::file_types;

macro_rules! object_ids {
  ($($(#[$doc:meta])* $name:ident),*) => {$(
    $(#[$doc])*
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct $name(pub(crate) usize);
  )*}
}

object_ids!(GroupId, FileRefId, BuildFileId, PhaseId, ConfigId, ConfigListId,
            /// Targets compare by identity; the project keeps their names unique.
            TargetId,
            ProxyId, DependencyId);

/// A child of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceId {
  Group(GroupId),
  File(FileRefId)
}

/// Any object of the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectId {
  Project,
  Group(GroupId),
  File(FileRefId),
  BuildFile(BuildFileId),
  Phase(PhaseId),
  Config(ConfigId),
  ConfigList(ConfigListId),
  Target(TargetId),
  Proxy(ProxyId),
  Dependency(DependencyId)
}

impl From<ReferenceId> for ObjectId {
  fn from(r: ReferenceId) -> Self {
    match r {
      ReferenceId::Group(g) => ObjectId::Group(g),
      ReferenceId::File(f)  => ObjectId::File(f)
    }
  }
}

/// Base location a path is relative to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceTree {
  Group,
  Absolute,
  BuiltProductsDir,
  SdkRoot,
  SourceRoot,
  DeveloperDir
}

impl SourceTree {
  pub fn to_str(self) -> &'static str {
    match self {
      SourceTree::Group            => "<group>",
      SourceTree::Absolute         => "<absolute>",
      SourceTree::BuiltProductsDir => "BUILT_PRODUCTS_DIR",
      SourceTree::SdkRoot          => "SDKROOT",
      SourceTree::SourceRoot       => "SOURCE_ROOT",
      SourceTree::DeveloperDir     => "DEVELOPER_DIR"
    }
  }
}

/// A build setting value. Lists render as plist arrays.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Setting {
  Value(String),
  List(Vec<String>)
}

impl From<&str> for Setting {
  fn from(s: &str) -> Self {
    Setting::Value(s.to_string())
  }
}

impl From<String> for Setting {
  fn from(s: String) -> Self {
    Setting::Value(s)
  }
}

pub type BuildSettings = BTreeMap<String, Setting>;

#[derive(Clone, Debug)]
pub struct FileReference {
  pub name:          String,
  pub path:          Option<String>,
  pub source_tree:   SourceTree,
  /// False for files produced by the build, such as target products.
  pub is_input_file: bool,
  /// Overrides the type inferred from the name's extension.
  pub explicit_file_type: Option<String>,

  pub(crate) parent: Option<GroupId>
}

impl FileReference {
  pub fn file_type(&self) -> &str {
    match &self.explicit_file_type {
      Some(t) => t.as_str(),
      None    => file_types::file_type(&self.name)
    }
  }

  pub fn parent(&self) -> Option<GroupId> {
    self.parent
  }

  fn key(&self) -> (bool, &str, SourceTree, &str, Option<&str>) {
    (self.is_input_file, self.file_type(), self.source_tree, self.name.as_str(), self.path.as_deref())
  }
}

impl PartialEq for FileReference {
  fn eq(&self, o: &Self) -> bool {
    self.key() == o.key()
  }
}

impl Eq for FileReference {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
  Group,
  /// Gathers the localizations of one file.
  Variant
}

#[derive(Clone, Debug)]
pub struct Group {
  pub kind:        GroupKind,
  pub name:        Option<String>,
  pub path:        Option<String>,
  pub source_tree: SourceTree,

  pub(crate) children:         Vec<ReferenceId>,
  pub(crate) groups_by_name:   HashMap<String, GroupId>,
  pub(crate) variants_by_name: HashMap<String, GroupId>,
  /// A file's location within the group. Its other attributes never split it.
  pub(crate) files_by_path:    HashMap<(SourceTree, String), FileRefId>,
  pub(crate) parent:           Option<GroupId>
}

impl Group {
  pub(crate) fn new(kind: GroupKind, name: Option<String>, path: Option<String>,
                    source_tree: SourceTree, parent: Option<GroupId>) -> Self
  {
    Group {
      kind, name, path, source_tree, parent,
      children:         Vec::new(),
      groups_by_name:   HashMap::new(),
      variants_by_name: HashMap::new(),
      files_by_path:    HashMap::new()
    }
  }

  /// Children in insertion order. They are sorted by name when rendered.
  pub fn children(&self) -> &[ReferenceId] {
    &self.children
  }

  pub fn parent(&self) -> Option<GroupId> {
    self.parent
  }

  pub fn display_name(&self) -> Option<&str> {
    self.name.as_deref().or_else(|| self.path.as_deref())
  }
}

/// A file as a member of one build phase.
#[derive(Clone, Debug)]
pub struct BuildFile {
  pub file_ref: FileRefId,
  pub settings: BuildSettings
}

#[derive(Clone, Debug)]
pub struct ShellScript {
  pub name:         Option<String>,
  pub script:       String,
  pub shell_path:   String,
  pub input_paths:  Vec<String>,
  pub output_paths: Vec<String>,
  pub show_env_vars_in_log: bool
}

impl ShellScript {
  pub fn new<S: Into<String>>(script: S) -> Self {
    ShellScript {
      name:         None,
      script:       script.into(),
      shell_path:   "/bin/sh".to_string(),
      input_paths:  Vec::new(),
      output_paths: Vec::new(),
      show_env_vars_in_log: false
    }
  }
}

#[derive(Clone, Debug)]
pub enum PhaseKind {
  Sources,
  ShellScript(ShellScript)
}

#[derive(Clone, Debug)]
pub struct BuildPhase {
  pub kind: PhaseKind,

  pub(crate) files:   Vec<BuildFileId>,
  pub(crate) by_file: HashMap<FileRefId, BuildFileId>
}

impl BuildPhase {
  pub(crate) fn new(kind: PhaseKind) -> Self {
    BuildPhase { kind, files: Vec::new(), by_file: HashMap::new() }
  }

  pub fn files(&self) -> &[BuildFileId] {
    &self.files
  }

  pub fn isa(&self) -> &'static str {
    match self.kind {
      PhaseKind::Sources        => "PBXSourcesBuildPhase",
      PhaseKind::ShellScript(_) => "PBXShellScriptBuildPhase"
    }
  }

  pub fn name(&self) -> &str {
    match &self.kind {
      PhaseKind::Sources        => "Sources",
      PhaseKind::ShellScript(s) => s.name.as_deref().unwrap_or("ShellScript")
    }
  }
}

#[derive(Clone, Debug)]
pub struct BuildConfiguration {
  pub name:     String,
  pub settings: BuildSettings,
  pub base_configuration: Option<FileRefId>
}

#[derive(Clone, Debug, Default)]
pub struct ConfigurationList {
  pub(crate) configs: BTreeMap<String, ConfigId>
}

impl ConfigurationList {
  pub fn get(&self, name: &str) -> Option<ConfigId> {
    self.configs.get(name).cloned()
  }

  /// Configurations sorted by name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, ConfigId)> + '_ {
    self.configs.iter().map(|(k, v)| (k.as_str(), *v))
  }

  pub fn is_empty(&self) -> bool {
    self.configs.is_empty()
  }

  /// "Release" when present, otherwise the first name.
  pub fn default_name(&self) -> Option<&str> {
    match self.configs.contains_key("Release") {
      true  => Some("Release"),
      false => self.configs.keys().next().map(String::as_str)
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
  StaticLibrary,
  DynamicLibrary,
  Tool,
  Bundle,
  Framework,
  StaticFramework,
  Application,
  UnitTest,
  UiTest,
  InAppPurchaseContent,
  AppExtension,
  XpcService
}

impl ProductType {
  pub fn identifier(self) -> &'static str {
    match self {
      ProductType::StaticLibrary        => "com.apple.product-type.library.static",
      ProductType::DynamicLibrary       => "com.apple.product-type.library.dynamic",
      ProductType::Tool                 => "com.apple.product-type.tool",
      ProductType::Bundle               => "com.apple.product-type.bundle",
      ProductType::Framework            => "com.apple.product-type.framework",
      ProductType::StaticFramework      => "com.apple.product-type.framework.static",
      ProductType::Application          => "com.apple.product-type.application",
      ProductType::UnitTest             => "com.apple.product-type.bundle.unit-test",
      ProductType::UiTest               => "com.apple.product-type.bundle.ui-testing",
      ProductType::InAppPurchaseContent => "com.apple.product-type.in-app-purchase-content",
      ProductType::AppExtension         => "com.apple.product-type.app-extension",
      ProductType::XpcService           => "com.apple.product-type.xpc-service"
    }
  }

  /// Type of the file produced by targets of this kind.
  pub fn file_type(self) -> &'static str {
    match self {
      ProductType::StaticLibrary        => "archive.ar",
      ProductType::DynamicLibrary       => "compiled.mach-o.dylib",
      ProductType::Tool                 => "compiled.mach-o.executable",
      ProductType::Bundle               |
      ProductType::UnitTest             |
      ProductType::UiTest               => "wrapper.cfbundle",
      ProductType::Framework            => "wrapper.framework",
      ProductType::StaticFramework      => "wrapper.framework.static",
      ProductType::Application          => "wrapper.application",
      ProductType::InAppPurchaseContent => "folder",
      ProductType::AppExtension         => "wrapper.app-extension",
      ProductType::XpcService           => "wrapper.xpc-service"
    }
  }

  pub fn product_file_name(self, name: &str) -> String {
    let (prefix, ext) = match self {
      ProductType::StaticLibrary        => ("lib", ".a"),
      ProductType::DynamicLibrary       => ("",    ".dylib"),
      ProductType::Tool                 |
      ProductType::InAppPurchaseContent => ("",    ""),
      ProductType::Bundle               => ("",    ".bundle"),
      ProductType::Framework            |
      ProductType::StaticFramework      => ("",    ".framework"),
      ProductType::Application          => ("",    ".app"),
      ProductType::UnitTest             |
      ProductType::UiTest               => ("",    ".xctest"),
      ProductType::AppExtension         => ("",    ".appex"),
      ProductType::XpcService           => ("",    ".xpc")
    };
    [prefix, name, ext].join("")
  }

  pub fn is_library(self) -> bool {
    match self {
      ProductType::StaticLibrary  |
      ProductType::DynamicLibrary => true,
      _                           => false
    }
  }

  pub fn is_test(self) -> bool {
    match self {
      ProductType::UnitTest |
      ProductType::UiTest   => true,
      _                     => false
    }
  }
}

#[derive(Clone, Debug)]
pub struct NativeTarget {
  pub product_type:      ProductType,
  pub product_reference: FileRefId
}

/// A target built by invoking an external tool.
#[derive(Clone, Debug)]
pub struct LegacyTarget {
  pub build_tool_path:         String,
  pub build_arguments:         String,
  pub build_working_directory: String,
  pub pass_build_settings_in_environment: bool
}

#[derive(Clone, Debug)]
pub enum TargetKind {
  Native(NativeTarget),
  Legacy(LegacyTarget)
}

#[derive(Clone, Debug)]
pub struct Target {
  pub name:         String,
  pub product_name: String,
  pub kind:         TargetKind,

  pub(crate) config_list:  ConfigListId,
  pub(crate) dependencies: Vec<DependencyId>,
  pub(crate) phases:       Vec<PhaseId>
}

impl Target {
  pub fn isa(&self) -> &'static str {
    match self.kind {
      TargetKind::Native(_) => "PBXNativeTarget",
      TargetKind::Legacy(_) => "PBXLegacyTarget"
    }
  }

  pub fn config_list(&self) -> ConfigListId {
    self.config_list
  }

  pub fn dependencies(&self) -> &[DependencyId] {
    &self.dependencies
  }

  pub fn phases(&self) -> &[PhaseId] {
    &self.phases
  }

  pub fn product_type(&self) -> Option<ProductType> {
    match &self.kind {
      TargetKind::Native(n) => Some(n.product_type),
      TargetKind::Legacy(_) => None
    }
  }
}

/// The `proxyType` of a container item proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProxyType {
  TargetReference,
  Reference
}

impl ProxyType {
  pub fn code(self) -> u8 {
    match self {
      ProxyType::TargetReference => 1,
      ProxyType::Reference       => 2
    }
  }
}

/// What a container item proxy points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProxyTarget {
  Target(TargetId),
  File(FileRefId)
}

/// Points at an object of the containing project, which is always the project
/// owning the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerItemProxy {
  pub target:     ProxyTarget,
  pub proxy_type: ProxyType
}

#[derive(Clone, Copy, Debug)]
pub struct TargetDependency {
  pub proxy:  ProxyId,
  /// Set when the proxy points at a target.
  pub target: Option<TargetId>
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(name: &str, tree: SourceTree, input: bool) -> FileReference {
    FileReference {
      name:          name.to_string(),
      path:          Some(name.to_string()),
      source_tree:   tree,
      is_input_file: input,
      explicit_file_type: None,
      parent:        None
    }
  }

  #[test]
  fn file_references_compare_by_structure() {
    let a = file("a.c", SourceTree::Group, true);
    let mut b = file("a.c", SourceTree::Group, true);
    b.parent = Some(GroupId(3));
    assert_eq!(a, b);
    assert_ne!(a, file("a.c", SourceTree::SourceRoot, true));
    assert_ne!(a, file("a.c", SourceTree::Group, false));

    b.explicit_file_type = Some("text".to_string());
    assert_ne!(a, b);
  }

  #[test]
  fn product_names() {
    assert_eq!(ProductType::StaticLibrary.product_file_name("Foo"), "libFoo.a");
    assert_eq!(ProductType::StaticLibrary.file_type(), "archive.ar");
    assert_eq!(ProductType::Application.product_file_name("Foo"), "Foo.app");
    assert_eq!(ProductType::Application.file_type(), "wrapper.application");
    assert_eq!(ProductType::Tool.product_file_name("foo"), "foo");
    assert_eq!(ProductType::UiTest.product_file_name("FooUITests"), "FooUITests.xctest");
  }

  #[test]
  fn default_configuration_prefers_release() {
    let mut l = ConfigurationList::default();
    assert_eq!(l.default_name(), None);
    l.configs.insert("Debug".to_string(), ConfigId(0));
    assert_eq!(l.default_name(), Some("Debug"));
    l.configs.insert("Release".to_string(), ConfigId(1));
    l.configs.insert("Profile".to_string(), ConfigId(2));
    assert_eq!(l.default_name(), Some("Release"));
    assert_eq!(l.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["Debug", "Profile", "Release"]);
  }
}
