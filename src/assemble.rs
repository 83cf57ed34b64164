//! Builds a project from the targets of a resolved build graph.

use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::pbx::file_types;
use crate::pbx::{BuildSettings, ConfigId, FileRefId, GroupId, LegacyTarget, ProductType, Project,
                 Setting, ShellScript, SourceTree, TargetId};

/// Facts about the build, as produced by the build tool.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildGraph {
  #[serde(default)]
  pub targets: Vec<TargetDescriptor>,

  /// Files shown in the project without being part of any target.
  #[serde(default)]
  pub additional_files: Vec<String>
}

impl BuildGraph {
  pub fn from_json(s: &str) -> serde_json::Result<Self> {
    serde_json::from_str(s)
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDescriptor {
  pub label: String,

  /// Rule kind, such as `objc_library` or `ios_application`.
  pub kind: String,

  /// Overrides the product type inferred from the rule kind.
  #[serde(default)]
  pub product_type: Option<ProductType>,

  #[serde(default)]
  pub srcs: Vec<String>,

  #[serde(default)]
  pub copts: Vec<String>,

  #[serde(default)]
  pub build_settings: BuildSettings,

  #[serde(default)]
  pub deps: Vec<String>,

  /// Label of the application hosting this test target.
  #[serde(default)]
  pub test_host: Option<String>
}

#[derive(Clone, Debug)]
pub struct Options {
  pub root_tree:        SourceTree,
  pub root_path:        Option<String>,
  pub configurations:   Vec<String>,
  pub build_tool:       String,
  pub project_settings: BuildSettings,
  pub base_config:      Option<String>,
  pub organization:     Option<String>
}

impl Default for Options {
  fn default() -> Self {
    Options {
      root_tree:        SourceTree::Group,
      root_path:        None,
      configurations:   vec!("Debug".to_string(), "Release".to_string()),
      build_tool:       "bazel".to_string(),
      project_settings: BuildSettings::new(),
      base_config:      None,
      organization:     None
    }
  }
}

/// Maps a rule kind to the product of its native target. Kinds without a
/// product are built through a legacy target.
pub fn product_type_for_kind(kind: &str) -> Option<ProductType> {
  Some(match kind {
    "objc_library" | "cc_library" | "swift_library"       => ProductType::StaticLibrary,
    "apple_resource_bundle"                                => ProductType::Bundle,
    k if k.ends_with("_command_line_application")          => ProductType::Tool,
    k if k.ends_with("_application")                       => ProductType::Application,
    k if k.ends_with("_unit_test")                         => ProductType::UnitTest,
    k if k.ends_with("_ui_test")                           => ProductType::UiTest,
    k if k.ends_with("_static_framework")                  => ProductType::StaticFramework,
    k if k.ends_with("_framework")                         => ProductType::Framework,
    k if k.ends_with("_extension")                         => ProductType::AppExtension,
    k if k.ends_with("_bundle")                            => ProductType::Bundle,
    k if k.ends_with("_xpc_service")                       => ProductType::XpcService,
    k if k.ends_with("_dylib")                             => ProductType::DynamicLibrary,
    _                                                      => return None
  })
}

fn short_name(label: &str) -> &str {
  match label.rfind(':') {
    Some(i) => &label[i + 1 ..],
    None    => label.trim_start_matches("//").rsplit('/').next().unwrap_or(label)
  }
}

fn long_name(label: &str) -> String {
  label.trim_start_matches("//").replace(|c| c == '/' || c == ':', "-")
}

/// Names the targets after their labels, falling back to the full label for
/// names shared by several targets, until every name is unique.
fn target_names(targets: &[TargetDescriptor]) -> Vec<String> {
  let mut names = targets.iter().map(|t| match short_name(&t.label) {
    ""   => long_name(&t.label),
    name => name.to_string()
  }).collect::<Vec<_>>();

  // Each name moves to its long form at most once.
  loop {
    let mut counts = HashMap::new();
    for name in &names {
      *counts.entry(name.clone()).or_insert(0) += 1;
    }

    let mut changed = false;
    for (name, t) in names.iter_mut().zip(targets) {
      let long = long_name(&t.label);
      if counts[name.as_str()] > 1 && *name != long {
        *name   = long;
        changed = true;
      }
    }

    if !changed {
      return names;
    }
  }
}

/// Every label referenced by a target without being provided by one.
fn unresolved_labels(graph: &BuildGraph) -> BTreeSet<String> {
  let known = graph.targets.iter().map(|t| t.label.as_str()).collect::<BTreeSet<_>>();
  graph.targets.iter()
    .flat_map(|t| t.deps.iter().chain(t.test_host.iter()))
    .filter(|l| !known.contains(l.as_str()))
    .cloned()
    .collect()
}

/// Adds the file at `path` below `root`, creating the groups in between.
///
/// Directories Xcode treats as files, like asset catalogs, end the walk: the
/// reference to the bundle is returned in place of the file inside it. Files
/// inside a `.lproj` directory are added to a variant group named after the
/// file, under the name of their locale.
pub fn expand_path(project: &mut Project, root: GroupId, path: &str) -> Option<FileRefId> {
  if path.starts_with('/') {
    return Some(project.get_or_create_file_ref(root, SourceTree::Absolute, path));
  }

  let parts = path.split('/').filter(|x| !x.is_empty() && *x != ".").collect::<Vec<_>>();
  let (file, dirs) = match parts.split_last() {
    Some(x) => x,
    None    => {
      warn!("skipping empty path \"{}\"", path);
      return None;
    }
  };

  let mut group = root;
  for (i, dir) in dirs.iter().enumerate() {
    if file_types::bundle_file_type(dir).is_some() {
      return Some(project.get_or_create_file_ref(group, SourceTree::Group, dir));
    }

    if i + 1 == dirs.len() {
      if let Some(locale) = file_types::localized_dir_locale(dir) {
        let variant = project.get_or_create_variant_group(group, file);
        let local   = [*dir, *file].join("/");
        return Some(project.get_or_create_named_file_ref(variant, locale, SourceTree::Group, &local,
                                                         true, Some(file_types::file_type(file))));
      }
    }

    group = project.get_or_create_group(group, dir);
  }

  Some(project.get_or_create_file_ref(group, SourceTree::Group, file))
}

/// Builds the project described by `graph`.
///
/// Fails without building anything when a target refers to a label no target
/// provides.
pub fn assemble<S: Into<String>>(name: S, graph: &BuildGraph, opts: &Options) -> Result<Project> {
  let unresolved = unresolved_labels(graph);
  if !unresolved.is_empty() {
    return Err(Error::UnresolvedLabels(unresolved));
  }

  let mut project = Project::new(name, opts.root_tree, opts.root_path.clone());
  project.organization = opts.organization.clone();
  let root = project.main_group();

  let base = match &opts.base_config {
    Some(path) => expand_path(&mut project, root, path),
    None       => None
  };

  let list = project.config_list();
  for cfg in &opts.configurations {
    let c = project.get_or_create_config(list, cfg);
    let c = project.config_mut(c);
    c.settings = opts.project_settings.clone();
    c.base_configuration = base;
  }

  let names = target_names(&graph.targets);
  let mut by_label = HashMap::new();
  for (desc, name) in graph.targets.iter().zip(&names) {
    if by_label.contains_key(desc.label.as_str()) {
      return Err(Error::DuplicateTarget(desc.label.clone()));
    }

    let id = add_target(&mut project, desc, name, opts)?;
    by_label.insert(desc.label.as_str(), id);
  }

  for desc in &graph.targets {
    let from = by_label[desc.label.as_str()];
    for dep in &desc.deps {
      project.create_dependency(from, by_label[dep.as_str()])?;
    }
  }

  for desc in &graph.targets {
    if let Some(host) = &desc.test_host {
      link_test(&mut project, by_label[desc.label.as_str()], by_label[host.as_str()])?;
    }
  }

  for path in &graph.additional_files {
    expand_path(&mut project, root, path);
  }

  info!("assembled {} targets for project {}", graph.targets.len(), project.name);
  Ok(project)
}

fn add_target(project: &mut Project, desc: &TargetDescriptor, name: &str,
              opts: &Options) -> Result<TargetId>
{
  let root = project.main_group();
  let id = match desc.product_type.or_else(|| product_type_for_kind(&desc.kind)) {
    Some(product_type) => {
      let id     = project.add_native_target(name, product_type)?;
      let phase  = project.add_sources_phase(id);
      let mut settings = BuildSettings::new();
      if !desc.copts.is_empty() {
        settings.insert("COMPILER_FLAGS".to_string(), Setting::from(desc.copts.join(" ")));
      }

      for src in &desc.srcs {
        if let Some(f) = expand_path(project, root, src) {
          if file_types::is_compilable(project.file_ref(f).file_type()) {
            project.add_build_file(phase, f, settings.clone());
          }
        }
      }

      if !product_type.is_library() {
        let mut script = ShellScript::new(format!("{} build {}", opts.build_tool, desc.label));
        script.name = Some(format!("Build with {}", opts.build_tool));
        project.add_shell_script_phase(id, script);
      }

      id
    },
    None => {
      debug!("{} ({}) has no native product", desc.label, desc.kind);
      let id = project.add_legacy_target(name, LegacyTarget {
        build_tool_path:         opts.build_tool.clone(),
        build_arguments:         format!("build {}", desc.label),
        build_working_directory: "$(PROJECT_DIR)".to_string(),
        pass_build_settings_in_environment: true
      })?;

      for src in &desc.srcs {
        expand_path(project, root, src);
      }

      id
    }
  };

  let list = project.target(id).config_list();
  for cfg in &opts.configurations {
    let c = project.get_or_create_config(list, cfg);
    let settings = &mut project.config_mut(c).settings;
    *settings = desc.build_settings.clone();
    settings.insert("PRODUCT_NAME".to_string(), Setting::from(name));
  }

  Ok(id)
}

/// Links a test target to its host and points its configurations at the
/// host's product.
fn link_test(project: &mut Project, test: TargetId, host: TargetId) -> Result<()> {
  project.link_test_target(test, host)?;

  let host_name = project.target(host).product_name.clone();
  let mut settings = Vec::new();
  match project.target(test).product_type() {
    Some(ProductType::UnitTest) => {
      settings.push(("TEST_HOST", format!("$(BUILT_PRODUCTS_DIR)/{0}.app/{0}", host_name)));
      settings.push(("BUNDLE_LOADER", "$(TEST_HOST)".to_string()));
    },
    Some(ProductType::UiTest) => settings.push(("TEST_TARGET_NAME", host_name)),
    _ => warn!("{} is not a test target", project.target(test).name)
  }

  let list    = project.target(test).config_list();
  let configs = project.configuration_list(list).iter().map(|(_, c)| c).collect::<Vec<ConfigId>>();
  for c in configs {
    for (k, v) in &settings {
      project.config_mut(c).settings.insert(k.to_string(), Setting::from(v.as_str()));
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pbx::{GroupKind, PhaseKind, ReferenceId, TargetKind};
  use std::path::PathBuf;

  fn project() -> Project {
    Project::new("Test", SourceTree::Group, Some("..".to_string()))
  }

  fn graph(json: &str) -> BuildGraph {
    BuildGraph::from_json(json).unwrap()
  }

  fn child_group(p: &Project, parent: GroupId, name: &str) -> GroupId {
    p.group(parent).children().iter().filter_map(|c| match c {
      ReferenceId::Group(g) if p.group(*g).display_name() == Some(name) => Some(*g),
      _ => None
    }).next().unwrap()
  }

  #[test]
  fn paths_share_their_groups() {
    let mut p = project();
    let root  = p.main_group();
    for _ in 0..2 {
      for path in &["a/b/c.txt", "a/b/d.txt"] {
        expand_path(&mut p, root, path).unwrap();
      }
    }

    assert_eq!(p.group(root).children().len(), 1);
    let a = child_group(&p, root, "a");
    assert_eq!(p.group(a).children().len(), 1);
    let b = child_group(&p, a, "b");
    let names = p.group(b).children().iter()
      .map(|c| p.reference_name(*c).unwrap())
      .collect::<Vec<_>>();
    assert_eq!(names, ["c.txt", "d.txt"]);
  }

  #[test]
  fn bundles_are_not_expanded() {
    let mut p = project();
    let root  = p.main_group();
    let f = expand_path(&mut p, root, "Images.xcassets/icon.png").unwrap();
    assert_eq!(p.file_ref(f).name, "Images.xcassets");
    assert_eq!(p.file_ref(f).file_type(), "folder.assetcatalog");
    assert_eq!(p.group(root).children(), [ReferenceId::File(f)]);
    assert_eq!(expand_path(&mut p, root, "Images.xcassets/other.png"), Some(f));
  }

  #[test]
  fn localized_files_go_to_variant_groups() {
    let mut p = project();
    let root  = p.main_group();
    let en = expand_path(&mut p, root, "res/en.lproj/Localizable.strings").unwrap();
    let fr = expand_path(&mut p, root, "res/fr.lproj/Localizable.strings").unwrap();
    assert_ne!(en, fr);

    let variant = p.file_ref(en).parent().unwrap();
    assert_eq!(p.file_ref(fr).parent(), Some(variant));
    assert_eq!(p.group(variant).kind, GroupKind::Variant);
    assert_eq!(p.group(variant).display_name(), Some("Localizable.strings"));
    assert_eq!(p.file_ref(en).name, "en");
    assert_eq!(p.file_ref(en).file_type(), "text.plist.strings");
    assert_eq!(p.reference_path(ReferenceId::File(en)),
               PathBuf::from("res/en.lproj/Localizable.strings"));
  }

  #[test]
  fn empty_and_absolute_paths() {
    let mut p = project();
    let root  = p.main_group();
    assert_eq!(expand_path(&mut p, root, ""), None);
    assert_eq!(expand_path(&mut p, root, "./"), None);
    let f = expand_path(&mut p, root, "/usr/include/zlib.h").unwrap();
    assert_eq!(p.file_ref(f).source_tree, SourceTree::Absolute);
  }

  #[test]
  fn rule_kinds() {
    assert_eq!(product_type_for_kind("objc_library"), Some(ProductType::StaticLibrary));
    assert_eq!(product_type_for_kind("ios_application"), Some(ProductType::Application));
    assert_eq!(product_type_for_kind("macos_command_line_application"), Some(ProductType::Tool));
    assert_eq!(product_type_for_kind("ios_static_framework"), Some(ProductType::StaticFramework));
    assert_eq!(product_type_for_kind("ios_framework"), Some(ProductType::Framework));
    assert_eq!(product_type_for_kind("ios_ui_test"), Some(ProductType::UiTest));
    assert_eq!(product_type_for_kind("genrule"), None);
  }

  #[test]
  fn names_collide_into_full_labels() {
    let g = graph(r#"{"targets": [
      {"label": "//a:lib", "kind": "objc_library"},
      {"label": "//b:lib", "kind": "objc_library"},
      {"label": "//tools/gen", "kind": "genrule"}
    ]}"#);
    assert_eq!(target_names(&g.targets), ["a-lib", "b-lib", "gen"]);
  }

  #[test]
  fn long_names_do_not_clash_with_short_names() {
    let g = graph(r#"{"targets": [
      {"label": "//a:lib", "kind": "objc_library"},
      {"label": "//b:lib", "kind": "objc_library"},
      {"label": "//c:a-lib", "kind": "objc_library"}
    ]}"#);
    assert_eq!(target_names(&g.targets), ["a-lib", "b-lib", "c-a-lib"]);

    let p = assemble("App", &g, &Options::default()).unwrap();
    assert_eq!(p.all_targets().count(), 3);
    assert!(p.target_by_name("c-a-lib").is_some());
  }

  #[test]
  fn source_products_directory_is_not_the_products_group() {
    let g = graph(r#"{"targets": [
      {"label": "//a:A", "kind": "objc_library", "srcs": ["a/A.m"]},
      {"label": "//p:P", "kind": "objc_library", "srcs": ["Products/gen.m"]}
    ]}"#);
    let p = assemble("App", &g, &Options::default()).unwrap();

    let products = p.products_group().unwrap();
    let names = p.group(products).children().iter()
      .map(|c| p.reference_name(*c).unwrap())
      .collect::<Vec<_>>();
    assert_eq!(names, ["libA.a", "libP.a"]);
    assert_eq!(p.group(products).path, None);

    let root = p.main_group();
    let dirs = p.group(root).children().iter()
      .filter(|c| p.reference_name(**c) == Some("Products"))
      .count();
    assert_eq!(dirs, 2);

    let sources = p.phase(p.target(p.target_by_name("P").unwrap()).phases()[0]);
    let gen = p.build_file(sources.files()[0]).file_ref;
    assert_eq!(p.reference_path(ReferenceId::File(gen)), PathBuf::from("Products/gen.m"));
    let dir = p.file_ref(gen).parent().unwrap();
    assert_ne!(Some(dir), p.products_group());
    assert_eq!(p.group(dir).path.as_deref(), Some("Products"));
  }

  #[test]
  fn unresolved_labels_abort() {
    let g = graph(r#"{"targets": [
      {"label": "//app:App", "kind": "ios_application", "deps": ["//x:X", "//lib:Lib"]},
      {"label": "//app:Tests", "kind": "ios_unit_test", "test_host": "//y:Y"},
      {"label": "//lib:Lib", "kind": "objc_library"}
    ]}"#);
    match assemble("App", &g, &Options::default()) {
      Err(Error::UnresolvedLabels(labels)) => {
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), ["//x:X", "//y:Y"]);
      },
      other => panic!("unexpected result: {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn self_dependencies_abort() {
    let g = graph(r#"{"targets": [{"label": "//a:A", "kind": "objc_library", "deps": ["//a:A"]}]}"#);
    match assemble("App", &g, &Options::default()) {
      Err(Error::SelfDependency(name)) => assert_eq!(name, "A"),
      other => panic!("unexpected result: {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn builds_targets_phases_and_configurations() {
    let g = graph(r#"{
      "targets": [
        {"label": "//app:App", "kind": "ios_application", "srcs": ["app/main.m", "app/App.h"],
         "copts": ["-Wall", "-Werror"], "build_settings": {"SDKROOT": "iphoneos"},
         "deps": ["//lib:Lib"]},
        {"label": "//lib:Lib", "kind": "objc_library", "srcs": ["lib/Lib.m"]},
        {"label": "//gen:files", "kind": "genrule", "srcs": ["gen/in.txt"]}
      ],
      "additional_files": ["BUILD"]
    }"#);
    let p = assemble("App", &g, &Options::default()).unwrap();

    let app = p.target_by_name("App").unwrap();
    let lib = p.target_by_name("Lib").unwrap();
    let gen = p.target_by_name("files").unwrap();
    assert_eq!(p.all_targets().count(), 3);

    let phases = p.target(app).phases();
    assert_eq!(phases.len(), 2);
    let sources = p.phase(phases[0]);
    assert_eq!(sources.files().len(), 1);
    let bf = p.build_file(sources.files()[0]);
    assert_eq!(p.file_ref(bf.file_ref).name, "main.m");
    assert_eq!(bf.settings["COMPILER_FLAGS"], Setting::from("-Wall -Werror"));
    match &p.phase(phases[1]).kind {
      PhaseKind::ShellScript(s) => {
        assert_eq!(s.script, "bazel build //app:App");
        assert_eq!(s.name.as_deref(), Some("Build with bazel"));
      },
      other => panic!("unexpected phase: {:?}", other)
    }

    assert_eq!(p.target(lib).phases().len(), 1);
    assert_eq!(p.target(app).dependencies().len(), 1);
    assert_eq!(p.dependency(p.target(app).dependencies()[0]).target, Some(lib));

    match &p.target(gen).kind {
      TargetKind::Legacy(l) => {
        assert_eq!(l.build_tool_path, "bazel");
        assert_eq!(l.build_arguments, "build //gen:files");
        assert!(l.pass_build_settings_in_environment);
      },
      other => panic!("unexpected target: {:?}", other)
    }

    let list  = p.configuration_list(p.target(app).config_list());
    let names = list.iter().map(|(n, _)| n).collect::<Vec<_>>();
    assert_eq!(names, ["Debug", "Release"]);
    let release = p.config(list.get("Release").unwrap());
    assert_eq!(release.settings["PRODUCT_NAME"], Setting::from("App"));
    assert_eq!(release.settings["SDKROOT"], Setting::from("iphoneos"));

    let root = p.main_group();
    assert!(p.group(root).children().iter().any(|c| p.reference_name(*c) == Some("BUILD")));
  }

  #[test]
  fn test_hosts_are_linked() {
    let g = graph(r#"{"targets": [
      {"label": "//app:App", "kind": "ios_application"},
      {"label": "//app:Tests", "kind": "ios_unit_test", "test_host": "//app:App"},
      {"label": "//app:UITests", "kind": "ios_ui_test", "test_host": "//app:App"}
    ]}"#);
    let p = assemble("App", &g, &Options::default()).unwrap();
    let app   = p.target_by_name("App").unwrap();
    let unit  = p.target_by_name("Tests").unwrap();
    let ui    = p.target_by_name("UITests").unwrap();
    assert_eq!(p.linked_test_targets_for_host(app), [unit, ui]);

    let settings = |t: TargetId| {
      let list = p.configuration_list(p.target(t).config_list());
      p.config(list.get("Debug").unwrap()).settings.clone()
    };
    assert_eq!(settings(unit)["TEST_HOST"], Setting::from("$(BUILT_PRODUCTS_DIR)/App.app/App"));
    assert_eq!(settings(unit)["BUNDLE_LOADER"], Setting::from("$(TEST_HOST)"));
    assert_eq!(settings(ui)["TEST_TARGET_NAME"], Setting::from("App"));
    assert!(!settings(ui).contains_key("TEST_HOST"));
  }

  #[test]
  fn project_configurations_use_the_base_config() {
    let opts = Options {
      base_config:  Some("config/Base.xcconfig".to_string()),
      organization: Some("Acme".to_string()),
      ..Options::default()
    };
    let p = assemble("App", &BuildGraph::default(), &opts).unwrap();
    let list = p.configuration_list(p.config_list());
    let debug = p.config(list.get("Debug").unwrap());
    let base  = debug.base_configuration.unwrap();
    assert_eq!(p.file_ref(base).name, "Base.xcconfig");
    assert_eq!(p.organization.as_deref(), Some("Acme"));
  }
}
