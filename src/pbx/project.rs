use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use super::model::*;

/// Name of the group holding the products of native targets.
pub const PRODUCTS_GROUP: &str = "Products";

/// Owner of a configuration list, used to describe the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOwner {
  Project,
  Target(TargetId)
}

/// Root of the object graph.
///
/// The project owns every object. Objects are created through the methods
/// below, which go through the lookup tables so that the same logical file,
/// group, proxy or dependency is only ever created once.
pub struct Project {
  pub name:         String,
  pub organization: Option<String>,

  main_group:     GroupId,
  products_group: Option<GroupId>,
  config_list:    ConfigListId,

  pub(crate) groups:       Vec<Group>,
  pub(crate) file_refs:    Vec<FileReference>,
  pub(crate) build_files:  Vec<(BuildFile, PhaseId)>,
  pub(crate) phases:       Vec<BuildPhase>,
  pub(crate) configs:      Vec<BuildConfiguration>,
  pub(crate) config_lists: Vec<(ConfigurationList, ListOwner)>,
  pub(crate) targets:      Vec<Target>,
  pub(crate) proxies:      Vec<ContainerItemProxy>,
  pub(crate) dependencies: Vec<TargetDependency>,

  targets_by_name:       BTreeMap<String, TargetId>,
  proxies_by_key:        HashMap<ContainerItemProxy, ProxyId>,
  dependencies_by_proxy: HashMap<ProxyId, DependencyId>,
  test_hosts:            BTreeMap<TargetId, TargetId>,
  hosted_tests:          HashMap<TargetId, BTreeSet<TargetId>>
}

impl Project {
  /// Creates an empty project whose main group is rooted at `root_path`.
  pub fn new<S: Into<String>>(name: S, root_tree: SourceTree, root_path: Option<String>) -> Self {
    let main = Group::new(GroupKind::Group, None, root_path, root_tree, None);
    Project {
      name:           name.into(),
      organization:   None,
      main_group:     GroupId(0),
      products_group: None,
      config_list:    ConfigListId(0),
      groups:         vec!(main),
      file_refs:      Vec::new(),
      build_files:    Vec::new(),
      phases:         Vec::new(),
      configs:        Vec::new(),
      config_lists:   vec!((ConfigurationList::default(), ListOwner::Project)),
      targets:        Vec::new(),
      proxies:        Vec::new(),
      dependencies:   Vec::new(),

      targets_by_name:       BTreeMap::new(),
      proxies_by_key:        HashMap::new(),
      dependencies_by_proxy: HashMap::new(),
      test_hosts:            BTreeMap::new(),
      hosted_tests:          HashMap::new()
    }
  }

  pub fn main_group(&self) -> GroupId {
    self.main_group
  }

  pub fn products_group(&self) -> Option<GroupId> {
    self.products_group
  }

  /// The project-level configuration list.
  pub fn config_list(&self) -> ConfigListId {
    self.config_list
  }

  pub fn group(&self, id: GroupId) -> &Group {
    &self.groups[id.0]
  }

  pub fn file_ref(&self, id: FileRefId) -> &FileReference {
    &self.file_refs[id.0]
  }

  pub fn build_file(&self, id: BuildFileId) -> &BuildFile {
    &self.build_files[id.0].0
  }

  pub fn build_file_mut(&mut self, id: BuildFileId) -> &mut BuildFile {
    &mut self.build_files[id.0].0
  }

  pub fn phase(&self, id: PhaseId) -> &BuildPhase {
    &self.phases[id.0]
  }

  pub fn config(&self, id: ConfigId) -> &BuildConfiguration {
    &self.configs[id.0]
  }

  pub fn config_mut(&mut self, id: ConfigId) -> &mut BuildConfiguration {
    &mut self.configs[id.0]
  }

  pub fn configuration_list(&self, id: ConfigListId) -> &ConfigurationList {
    &self.config_lists[id.0].0
  }

  pub fn target(&self, id: TargetId) -> &Target {
    &self.targets[id.0]
  }

  pub fn proxy(&self, id: ProxyId) -> &ContainerItemProxy {
    &self.proxies[id.0]
  }

  pub fn dependency(&self, id: DependencyId) -> &TargetDependency {
    &self.dependencies[id.0]
  }

  // Groups and file references
  // --------------------------------------------------------------------------

  pub fn get_or_create_group(&mut self, parent: GroupId, name: &str) -> GroupId {
    if let Some(&id) = self.groups[parent.0].groups_by_name.get(name) {
      return id;
    }

    let id = self.push_group(parent, GroupKind::Group, Some(name.to_string()), Some(name.to_string()));
    self.groups[parent.0].groups_by_name.insert(name.to_string(), id);
    id
  }

  /// Returns the group gathering the localizations of the file `name`.
  pub fn get_or_create_variant_group(&mut self, parent: GroupId, name: &str) -> GroupId {
    if let Some(&id) = self.groups[parent.0].variants_by_name.get(name) {
      return id;
    }

    let id = self.push_group(parent, GroupKind::Variant, Some(name.to_string()), None);
    self.groups[parent.0].variants_by_name.insert(name.to_string(), id);
    id
  }

  fn push_group(&mut self, parent: GroupId, kind: GroupKind,
                name: Option<String>, path: Option<String>) -> GroupId
  {
    let id = GroupId(self.groups.len());
    self.groups.push(Group::new(kind, name, path, SourceTree::Group, Some(parent)));
    self.groups[parent.0].children.push(ReferenceId::Group(id));
    id
  }

  /// Returns the input file at `path` in `parent`, named after the path's
  /// last component.
  pub fn get_or_create_file_ref(&mut self, parent: GroupId, tree: SourceTree, path: &str) -> FileRefId {
    let name = Path::new(path).file_name()
      .and_then(|x| x.to_str())
      .unwrap_or(path)
      .to_string();
    self.get_or_create_named_file_ref(parent, &name, tree, path, true, None)
  }

  /// Returns the file at `(tree, path)` in `parent`. The name, input flag and
  /// explicit type only apply when the reference gets created.
  ///
  /// Within a group, `(tree, path)` identifies a file: asking again for the
  /// same location with different attributes returns the existing reference.
  pub fn get_or_create_named_file_ref(&mut self, parent: GroupId, name: &str, tree: SourceTree,
                                      path: &str, is_input_file: bool,
                                      file_type: Option<&str>) -> FileRefId
  {
    let file = FileReference {
      is_input_file,
      name:        name.to_string(),
      path:        Some(path.to_string()),
      source_tree: tree,
      explicit_file_type: file_type.map(str::to_string),
      parent:      Some(parent)
    };

    let key = (tree, path.to_string());
    if let Some(&id) = self.groups[parent.0].files_by_path.get(&key) {
      if self.file_refs[id.0] != file {
        warn!("{} is already referenced as {} ({})", path, self.file_refs[id.0].name,
              self.file_refs[id.0].file_type());
      }
      return id;
    }

    let id = FileRefId(self.file_refs.len());
    self.file_refs.push(file);

    let group = &mut self.groups[parent.0];
    group.files_by_path.insert(key, id);
    group.children.push(ReferenceId::File(id));
    id
  }

  pub fn reference_name(&self, r: ReferenceId) -> Option<&str> {
    match r {
      ReferenceId::Group(g) => self.groups.get(g.0).and_then(Group::display_name),
      ReferenceId::File(f)  => self.file_refs.get(f.0).map(|x| x.name.as_str())
    }
  }

  /// Computes the path of a reference relative to the main group by walking
  /// up its parents. The walk stops at the first element that isn't relative
  /// to its group.
  pub fn reference_path(&self, r: ReferenceId) -> PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    let (path, tree, mut parent) = match r {
      ReferenceId::Group(g) => {
        let x = &self.groups[g.0];
        (x.path.as_deref(), x.source_tree, x.parent)
      },
      ReferenceId::File(f) => {
        let x = &self.file_refs[f.0];
        (x.path.as_deref(), x.source_tree, x.parent)
      }
    };

    parts.extend(path);
    if tree != SourceTree::Group {
      parent = None;
    }

    while let Some(id) = parent {
      let g = &self.groups[id.0];
      if g.parent.is_none() {
        break; // Main group.
      }

      parts.extend(g.path.as_deref());
      parent = match g.source_tree {
        SourceTree::Group => g.parent,
        _                 => None
      };
    }

    parts.iter().rev().collect()
  }

  // Build phases and configurations
  // --------------------------------------------------------------------------

  pub fn add_sources_phase(&mut self, target: TargetId) -> PhaseId {
    self.push_phase(target, PhaseKind::Sources)
  }

  pub fn add_shell_script_phase(&mut self, target: TargetId, script: ShellScript) -> PhaseId {
    self.push_phase(target, PhaseKind::ShellScript(script))
  }

  fn push_phase(&mut self, target: TargetId, kind: PhaseKind) -> PhaseId {
    let id = PhaseId(self.phases.len());
    self.phases.push(BuildPhase::new(kind));
    self.targets[target.0].phases.push(id);
    id
  }

  /// Adds a file to a build phase. Adding the same file to a phase again
  /// returns the existing build file, with its settings left untouched.
  pub fn add_build_file(&mut self, phase: PhaseId, file_ref: FileRefId,
                        settings: BuildSettings) -> BuildFileId
  {
    if let Some(&id) = self.phases[phase.0].by_file.get(&file_ref) {
      warn!("{} is already part of the {} phase", self.file_refs[file_ref.0].name,
            self.phases[phase.0].name());
      return id;
    }

    let id = BuildFileId(self.build_files.len());
    self.build_files.push((BuildFile { file_ref, settings }, phase));

    let p = &mut self.phases[phase.0];
    p.by_file.insert(file_ref, id);
    p.files.push(id);
    id
  }

  /// The phase a build file belongs to.
  pub fn build_file_phase(&self, id: BuildFileId) -> PhaseId {
    self.build_files[id.0].1
  }

  pub fn get_or_create_config(&mut self, list: ConfigListId, name: &str) -> ConfigId {
    if let Some(id) = self.config_lists[list.0].0.get(name) {
      return id;
    }

    let id = ConfigId(self.configs.len());
    self.configs.push(BuildConfiguration {
      name:     name.to_string(),
      settings: BuildSettings::new(),
      base_configuration: None
    });
    self.config_lists[list.0].0.configs.insert(name.to_string(), id);
    id
  }

  pub fn config_list_owner(&self, id: ConfigListId) -> ListOwner {
    self.config_lists[id.0].1
  }

  // Targets
  // --------------------------------------------------------------------------

  /// Creates a native target along with its product reference.
  pub fn add_native_target(&mut self, name: &str, product_type: ProductType) -> Result<TargetId> {
    self.check_unique(name)?;

    // Kept out of the name lookup, so a source directory named "Products"
    // gets its own group.
    let products = match self.products_group {
      Some(g) => g,
      None    => {
        let g = self.push_group(self.main_group, GroupKind::Group, Some(PRODUCTS_GROUP.to_string()), None);
        self.products_group = Some(g);
        g
      }
    };

    let file_name = product_type.product_file_name(name);
    let product   = self.get_or_create_named_file_ref(products, &file_name,
                                                      SourceTree::BuiltProductsDir,
                                                      &file_name, false,
                                                      Some(product_type.file_type()));

    Ok(self.push_target(name, TargetKind::Native(NativeTarget {
      product_type,
      product_reference: product
    })))
  }

  pub fn add_legacy_target(&mut self, name: &str, legacy: LegacyTarget) -> Result<TargetId> {
    self.check_unique(name)?;
    Ok(self.push_target(name, TargetKind::Legacy(legacy)))
  }

  fn check_unique(&self, name: &str) -> Result<()> {
    match self.targets_by_name.contains_key(name) {
      true  => Err(Error::DuplicateTarget(name.to_string())),
      false => Ok(())
    }
  }

  fn push_target(&mut self, name: &str, kind: TargetKind) -> TargetId {
    let id   = TargetId(self.targets.len());
    let list = ConfigListId(self.config_lists.len());
    self.config_lists.push((ConfigurationList::default(), ListOwner::Target(id)));
    self.targets.push(Target {
      kind,
      name:         name.to_string(),
      product_name: name.to_string(),
      config_list:  list,
      dependencies: Vec::new(),
      phases:       Vec::new()
    });
    self.targets_by_name.insert(name.to_string(), id);
    debug!("created target {}", name);
    id
  }

  /// Every target, sorted by name.
  pub fn all_targets(&self) -> impl Iterator<Item = TargetId> + '_ {
    self.targets_by_name.values().cloned()
  }

  pub fn target_by_name(&self, name: &str) -> Option<TargetId> {
    self.targets_by_name.get(name).cloned()
  }

  fn check_target(&self, id: TargetId) -> Result<&Target> {
    self.targets.get(id.0).ok_or_else(|| Error::UnknownTarget(format!("target #{}", id.0)))
  }

  // Dependencies
  // --------------------------------------------------------------------------

  /// Makes `from` depend on the target `on`.
  pub fn create_dependency(&mut self, from: TargetId, on: TargetId) -> Result<DependencyId> {
    self.create_proxy_dependency(from, ProxyTarget::Target(on), ProxyType::TargetReference)
  }

  /// Makes `from` depend on the object behind a container item proxy. Asking
  /// for the same dependency again returns the existing one.
  pub fn create_proxy_dependency(&mut self, from: TargetId, target: ProxyTarget,
                                 proxy_type: ProxyType) -> Result<DependencyId>
  {
    let name = self.check_target(from)?.name.clone();
    match target {
      ProxyTarget::Target(t) => {
        if t == from {
          return Err(Error::SelfDependency(name));
        }
        self.check_target(t)?;
      },
      ProxyTarget::File(f) => if f.0 >= self.file_refs.len() {
        return Err(Error::UnknownTarget(format!("file reference #{}", f.0)));
      }
    }

    let dep  = self.dependency_for(ContainerItemProxy { target, proxy_type });
    let deps = &mut self.targets[from.0].dependencies;
    if !deps.contains(&dep) {
      deps.push(dep);
      debug!("{} depends on {:?}", name, target);
    }
    Ok(dep)
  }

  fn dependency_for(&mut self, key: ContainerItemProxy) -> DependencyId {
    let proxy = match self.proxies_by_key.get(&key) {
      Some(&p) => p,
      None     => {
        let p = ProxyId(self.proxies.len());
        self.proxies.push(key);
        self.proxies_by_key.insert(key, p);
        p
      }
    };

    if let Some(&d) = self.dependencies_by_proxy.get(&proxy) {
      return d;
    }

    let d = DependencyId(self.dependencies.len());
    self.dependencies.push(TargetDependency {
      proxy,
      target: match key.target {
        ProxyTarget::Target(t) => Some(t),
        ProxyTarget::File(_)   => None
      }
    });
    self.dependencies_by_proxy.insert(proxy, d);
    d
  }

  /// Number of pooled target dependencies.
  pub fn dependency_count(&self) -> usize {
    self.dependencies.len()
  }

  // Test hosts
  // --------------------------------------------------------------------------

  /// Records `host` as the application hosting the tests of `test`, and makes
  /// `test` depend on it. Linking a test again replaces its host.
  pub fn link_test_target(&mut self, test: TargetId, host: TargetId) -> Result<()> {
    self.create_dependency(test, host)?;

    if let Some(old) = self.test_hosts.insert(test, host) {
      if old != host {
        warn!("{} was hosted by {}, now hosted by {}", self.targets[test.0].name,
              self.targets[old.0].name, self.targets[host.0].name);
        if let Some(tests) = self.hosted_tests.get_mut(&old) {
          tests.remove(&test);
        }
      }
    }

    self.hosted_tests.entry(host).or_default().insert(test);
    Ok(())
  }

  pub fn test_host(&self, test: TargetId) -> Option<TargetId> {
    self.test_hosts.get(&test).cloned()
  }

  pub fn linked_test_targets_for_host(&self, host: TargetId) -> Vec<TargetId> {
    match self.hosted_tests.get(&host) {
      Some(tests) => tests.iter().cloned().collect(),
      None        => Vec::new()
    }
  }

  /// Every (test, host) pair.
  pub fn test_linkages(&self) -> impl Iterator<Item = (TargetId, TargetId)> + '_ {
    self.test_hosts.iter().map(|(t, h)| (*t, *h))
  }

  pub fn has_test_linkages(&self) -> bool {
    !self.test_hosts.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn project() -> Project {
    Project::new("Test", SourceTree::Group, Some("..".to_string()))
  }

  #[test]
  fn groups_and_files_are_created_once() {
    let mut p = project();
    let root  = p.main_group();
    let a1 = p.get_or_create_group(root, "a");
    let a2 = p.get_or_create_group(root, "a");
    assert_eq!(a1, a2);
    assert_eq!(p.group(root).children().len(), 1);

    let f1 = p.get_or_create_file_ref(a1, SourceTree::Group, "x.c");
    let f2 = p.get_or_create_file_ref(a1, SourceTree::Group, "x.c");
    assert_eq!(f1, f2);
    assert_eq!(p.group(a1).children().len(), 1);

    // Same path under another source tree is another file.
    let f3 = p.get_or_create_file_ref(a1, SourceTree::SourceRoot, "x.c");
    assert_ne!(f1, f3);
    assert_eq!(p.group(a1).children().len(), 2);
  }

  #[test]
  fn file_locations_are_pooled_regardless_of_attributes() {
    let mut p = project();
    let root  = p.main_group();
    let f1 = p.get_or_create_named_file_ref(root, "gen.m", SourceTree::Group, "gen.m", true, None);
    let f2 = p.get_or_create_named_file_ref(root, "other.m", SourceTree::Group, "gen.m", false,
                                            Some("sourcecode.c.objc"));
    assert_eq!(f1, f2);
    assert_eq!(p.group(root).children().len(), 1);

    // The first request wins.
    let file = p.file_ref(f1);
    assert_eq!(file.name, "gen.m");
    assert!(file.is_input_file);
    assert_eq!(file.explicit_file_type, None);
  }

  #[test]
  fn variant_groups_are_separate_from_groups() {
    let mut p = project();
    let root  = p.main_group();
    let g = p.get_or_create_group(root, "Main.storyboard");
    let v = p.get_or_create_variant_group(root, "Main.storyboard");
    assert_ne!(g, v);
    assert_eq!(p.get_or_create_variant_group(root, "Main.storyboard"), v);
    assert_eq!(p.group(v).kind, GroupKind::Variant);
    assert_eq!(p.group(v).path, None);
  }

  #[test]
  fn reference_paths_walk_up_to_the_main_group() {
    let mut p = project();
    let root  = p.main_group();
    let a = p.get_or_create_group(root, "a");
    let b = p.get_or_create_group(a, "b");
    let f = p.get_or_create_file_ref(b, SourceTree::Group, "c.txt");
    assert_eq!(p.reference_path(ReferenceId::File(f)), PathBuf::from("a/b/c.txt"));
    assert_eq!(p.reference_path(ReferenceId::Group(b)), PathBuf::from("a/b"));
    assert_eq!(p.file_ref(f).parent(), Some(b));

    let v = p.get_or_create_variant_group(b, "Localizable.strings");
    let l = p.get_or_create_named_file_ref(v, "en", SourceTree::Group,
                                           "en.lproj/Localizable.strings", true, None);
    assert_eq!(p.reference_path(ReferenceId::File(l)),
               PathBuf::from("a/b/en.lproj/Localizable.strings"));

    let s = p.get_or_create_file_ref(b, SourceTree::SdkRoot, "usr/lib/libz.tbd");
    assert_eq!(p.reference_path(ReferenceId::File(s)), PathBuf::from("usr/lib/libz.tbd"));
  }

  #[test]
  fn native_targets_own_their_product() {
    let mut p = project();
    let t = p.add_native_target("Foo", ProductType::StaticLibrary).unwrap();
    let product = match &p.target(t).kind {
      TargetKind::Native(n) => p.file_ref(n.product_reference),
      TargetKind::Legacy(_) => unreachable!()
    };
    assert_eq!(product.name, "libFoo.a");
    assert_eq!(product.file_type(), "archive.ar");
    assert_eq!(product.source_tree, SourceTree::BuiltProductsDir);
    assert!(!product.is_input_file);

    let products = p.products_group().unwrap();
    assert_eq!(p.group(products).display_name(), Some(PRODUCTS_GROUP));
    assert_eq!(p.group(products).children().len(), 1);
  }

  #[test]
  fn target_names_are_unique() {
    let mut p = project();
    p.add_native_target("Foo", ProductType::Application).unwrap();
    match p.add_native_target("Foo", ProductType::StaticLibrary) {
      Err(Error::DuplicateTarget(name)) => assert_eq!(name, "Foo"),
      other => panic!("unexpected result: {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn all_targets_are_sorted_by_name() {
    let mut p = project();
    let c = p.add_native_target("c", ProductType::Tool).unwrap();
    let a = p.add_native_target("a", ProductType::Tool).unwrap();
    let b = p.add_native_target("b", ProductType::Tool).unwrap();
    assert_eq!(p.all_targets().collect::<Vec<_>>(), [a, b, c]);
    assert_eq!(p.target_by_name("b"), Some(b));
    assert_eq!(p.target_by_name("d"), None);
  }

  #[test]
  fn dependencies_are_pooled() {
    let mut p = project();
    let a = p.add_native_target("A", ProductType::Application).unwrap();
    let b = p.add_native_target("B", ProductType::StaticLibrary).unwrap();
    let c = p.add_native_target("C", ProductType::StaticLibrary).unwrap();

    let d1 = p.create_dependency(a, b).unwrap();
    let d2 = p.create_dependency(a, b).unwrap();
    let d3 = p.create_dependency(c, b).unwrap();
    assert_eq!(d1, d2);
    assert_eq!(d1, d3);
    assert_eq!(p.dependency_count(), 1);
    assert_eq!(p.target(a).dependencies(), [d1]);

    let d4 = p.create_proxy_dependency(a, ProxyTarget::Target(b), ProxyType::Reference).unwrap();
    assert_ne!(d1, d4);
    assert_eq!(p.dependency(d4).target, Some(b));
    assert_eq!(p.proxy(p.dependency(d4).proxy).proxy_type, ProxyType::Reference);
  }

  #[test]
  fn self_dependencies_are_rejected() {
    let mut p = project();
    let a = p.add_native_target("A", ProductType::Application).unwrap();
    match p.create_dependency(a, a) {
      Err(Error::SelfDependency(name)) => assert_eq!(name, "A"),
      other => panic!("unexpected result: {:?}", other)
    }
    assert!(p.target(a).dependencies().is_empty());
    assert_eq!(p.dependency_count(), 0);
  }

  #[test]
  fn unknown_targets_are_named_by_index() {
    let mut p = project();
    let a = p.add_native_target("A", ProductType::Application).unwrap();
    match p.create_dependency(a, TargetId(9)) {
      Err(Error::UnknownTarget(what)) => assert_eq!(what, "target #9"),
      other => panic!("unexpected result: {:?}", other)
    }
    match p.create_proxy_dependency(a, ProxyTarget::File(FileRefId(42)), ProxyType::Reference) {
      Err(Error::UnknownTarget(what)) => assert_eq!(what, "file reference #42"),
      other => panic!("unexpected result: {:?}", other)
    }
    assert_eq!(p.dependency_count(), 0);
  }

  #[test]
  fn test_linkage_is_reciprocal() {
    let mut p = project();
    let host = p.add_native_target("Host", ProductType::Application).unwrap();
    let test = p.add_native_target("Tst", ProductType::UnitTest).unwrap();
    p.link_test_target(test, host).unwrap();

    assert_eq!(p.test_linkages().collect::<Vec<_>>(), [(test, host)]);
    assert_eq!(p.linked_test_targets_for_host(host), [test]);
    assert_eq!(p.test_host(test), Some(host));

    let deps = p.target(test).dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!(p.dependency(deps[0]).target, Some(host));
    assert_eq!(p.proxy(p.dependency(deps[0]).proxy).target, ProxyTarget::Target(host));
  }

  #[test]
  fn relinking_a_test_moves_it_to_the_new_host() {
    let mut p = project();
    let h1   = p.add_native_target("H1", ProductType::Application).unwrap();
    let h2   = p.add_native_target("H2", ProductType::Application).unwrap();
    let test = p.add_native_target("Tst", ProductType::UnitTest).unwrap();
    p.link_test_target(test, h1).unwrap();
    p.link_test_target(test, h2).unwrap();
    assert!(p.linked_test_targets_for_host(h1).is_empty());
    assert_eq!(p.linked_test_targets_for_host(h2), [test]);
  }

  #[test]
  fn build_files_are_unique_per_phase() {
    let mut p = project();
    let root  = p.main_group();
    let f = p.get_or_create_file_ref(root, SourceTree::Group, "a.c");
    let a = p.add_native_target("A", ProductType::Tool).unwrap();
    let b = p.add_native_target("B", ProductType::Tool).unwrap();
    let pa = p.add_sources_phase(a);
    let pb = p.add_sources_phase(b);

    let b1 = p.add_build_file(pa, f, BuildSettings::new());
    let b2 = p.add_build_file(pa, f, BuildSettings::new());
    let b3 = p.add_build_file(pb, f, BuildSettings::new());
    assert_eq!(b1, b2);
    assert_ne!(b1, b3);
    assert_eq!(p.phase(pa).files(), [b1]);
    assert_eq!(p.build_file(b3).file_ref, f);
    assert_eq!(p.build_file_phase(b3), pb);
  }

  #[test]
  fn configurations_are_created_once() {
    let mut p = project();
    let list  = p.config_list();
    let d1 = p.get_or_create_config(list, "Debug");
    let d2 = p.get_or_create_config(list, "Debug");
    assert_eq!(d1, d2);
    p.config_mut(d1).settings.insert("A".to_string(), "1".into());
    assert_eq!(p.config(d2).settings["A"], Setting::from("1"));
    assert_eq!(p.config_list_owner(list), ListOwner::Project);
  }
}
