//! Renders a project into the text property list format of `project.pbxproj`.
//!
//! The format provides the following data types:
//! - String:     contents, or "contents" when delimiters are involved
//! - Array:      ( element, ... )
//! - Dictionary: { key = value; ... }
//!
//! Comments of the form /* contents */ are optional. They are still generated
//! after every object reference, like Xcode does, to keep diffs readable when
//! the project file is put in version control.
//!
//! The file holds a single dictionary with every object of the project keyed
//! by its identifier, grouped by "isa" in sections delimited by comments:
//!
//! ```text
//! /* Begin <ISA> section */
//! <OBJECT-ID> /* <OBJECT-NAME> */ = <OBJECT-PROPERTIES-DICTIONARY>;
//! ...
//! /* End <ISA> section */
//! ```
//!
//! Objects are ordered by identifier within their section, which is the order
//! Xcode itself uses when saving the project.

use log::{debug, info};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::Write as IOWrite;

use crate::error::{Error, Problem, Result};
use super::gid::{Gid, IdGenerator};
use super::model::*;
use super::project::{ListOwner, Project};

pub const ARCHIVE_VERSION:       &str = "1";
pub const OBJECT_VERSION:        &str = "46";
pub const COMPATIBILITY_VERSION: &str = "Xcode 3.2";
pub const LAST_UPGRADE_CHECK:    &str = "1100";

const BUILD_ACTION_MASK: &str = "2147483647";

/// Writes the project to `out`. Nothing is written unless the whole project
/// renders successfully.
pub fn write_project<W: IOWrite>(project: &Project, ids: &mut IdGenerator, out: &mut W) -> Result<()> {
  let text = render(project, ids)?;
  out.write_all(text.as_bytes())?;
  out.flush()?;
  Ok(())
}

/// Renders the project, assigning identifiers from `ids`.
pub fn render(project: &Project, ids: &mut IdGenerator) -> Result<String> {
  let mut w = Writer {
    project, ids,
    gids:     HashMap::new(),
    sections: BTreeMap::new(),
    problems: Vec::new()
  };

  let root = w.visit(ObjectId::Project);

  if !w.problems.is_empty() {
    return Err(Error::Serialization {
      project:  project.name.clone(),
      problems: w.problems
    });
  }

  info!("serialized {} objects for project {}", w.gids.len(), project.name);
  Ok(w.finish(&root))
}

/// Quotes a string unless it only contains characters safe to leave bare.
pub fn quote(s: &str) -> Cow<'_, str> {
  let bare = !s.is_empty()
    && !s.contains("//") && !s.contains("/*")
    && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '/');

  match bare {
    true  => Cow::Borrowed(s),
    false => {
      let mut q = String::with_capacity(s.len() + 2);
      q.push('"');
      for c in s.chars() {
        match c {
          '"'  => q.push_str("\\\""),
          '\\' => q.push_str("\\\\"),
          '\n' => q.push_str("\\n"),
          '\r' => q.push_str("\\r"),
          '\t' => q.push_str("\\t"),
          _    => q.push(c)
        }
      }
      q.push('"');
      Cow::Owned(q)
    }
  }
}

enum Value {
  Str(String),
  /// An object reference followed by a comment describing the object.
  Ref(Gid, Option<String>),
  /// A bare object identifier.
  Id(Gid),
  Array(Vec<Value>),
  Dict(BTreeMap<String, Value>)
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<&Setting> for Value {
  fn from(s: &Setting) -> Self {
    match s {
      Setting::Value(v) => Value::Str(v.clone()),
      Setting::List(l)  => Value::Array(l.iter().map(|x| Value::from(x.as_str())).collect())
    }
  }
}

fn settings_dict(settings: &BuildSettings) -> Value {
  Value::Dict(settings.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
}

fn bool_value(b: bool) -> Value {
  Value::from(match b {
    true  => "1",
    false => "0"
  })
}

/// Fields of one object, rendered after "isa" in key order.
struct Record {
  isa:    &'static str,
  inline: bool,
  fields: BTreeMap<&'static str, Value>
}

impl Record {
  fn new(isa: &'static str) -> Self {
    Record { isa, inline: false, fields: BTreeMap::new() }
  }

  fn set<V: Into<Value>>(&mut self, key: &'static str, value: V) -> &mut Self {
    self.fields.insert(key, value.into());
    self
  }
}

impl From<Gid> for Value {
  fn from(g: Gid) -> Self {
    Value::Id(g)
  }
}

type Fields = std::result::Result<Record, Problem>;

struct Writer<'a> {
  project:  &'a Project,
  ids:      &'a mut IdGenerator,
  gids:     HashMap<ObjectId, Gid>,
  sections: BTreeMap<&'static str, BTreeMap<Gid, String>>,
  problems: Vec<Problem>
}

fn lookup<'p, T>(table: &'p [T], index: usize, kind: &str) -> std::result::Result<&'p T, Problem> {
  table.get(index).ok_or_else(|| Problem::new(format!("{} #{}", kind, index), "dangling object reference"))
}

impl<'a> Writer<'a> {
  /// Returns the identifier of an object, rendering it on first visit.
  fn visit(&mut self, obj: ObjectId) -> Gid {
    if let Some(gid) = self.gids.get(&obj) {
      return gid.clone();
    }

    // Assigned before the fields are gathered, objects refer to each other.
    let gid = self.ids.next_id();
    self.gids.insert(obj, gid.clone());

    let comment = self.comment(obj);
    match self.record(obj) {
      Ok(r) => {
        let text = render_object(&gid, comment.ok().flatten().as_deref(), &r);
        self.sections.entry(r.isa).or_default().insert(gid.clone(), text);
      },
      Err(p) => self.problems.push(p)
    }

    gid
  }

  fn reference(&mut self, obj: ObjectId) -> std::result::Result<Value, Problem> {
    let comment = self.comment(obj)?;
    let gid     = self.visit(obj);
    Ok(Value::Ref(gid, comment))
  }

  fn references<I>(&mut self, objs: I) -> std::result::Result<Value, Problem>
    where I: IntoIterator<Item = ObjectId>
  {
    let mut v = Vec::new();
    for obj in objs {
      v.push(self.reference(obj)?);
    }
    Ok(Value::Array(v))
  }

  /// Describes an object in the comments following its identifier.
  fn comment(&self, obj: ObjectId) -> std::result::Result<Option<String>, Problem> {
    let p = self.project;
    Ok(match obj {
      ObjectId::Project       => Some("Project object".to_string()),
      ObjectId::Group(id)     => lookup(&p.groups, id.0, "group")?.display_name().map(str::to_string),
      ObjectId::File(id)      => Some(lookup(&p.file_refs, id.0, "file reference")?.name.clone()),
      ObjectId::BuildFile(id) => {
        let (bf, phase) = lookup(&p.build_files, id.0, "build file")?;
        let file  = lookup(&p.file_refs, bf.file_ref.0, "file reference")?;
        let phase = lookup(&p.phases, phase.0, "build phase")?;
        Some([file.name.as_str(), " in ", phase.name()].join(""))
      },
      ObjectId::Phase(id)      => Some(lookup(&p.phases, id.0, "build phase")?.name().to_string()),
      ObjectId::Config(id)     => Some(lookup(&p.configs, id.0, "build configuration")?.name.clone()),
      ObjectId::ConfigList(id) => {
        let (_, owner) = lookup(&p.config_lists, id.0, "configuration list")?;
        let (kind, name) = match owner {
          ListOwner::Project   => ("PBXProject", p.name.as_str()),
          ListOwner::Target(t) => {
            let t = lookup(&p.targets, t.0, "target")?;
            (t.isa(), t.name.as_str())
          }
        };
        Some(format!("Build configuration list for {} \"{}\"", kind, name))
      },
      ObjectId::Target(id)     => Some(lookup(&p.targets, id.0, "target")?.name.clone()),
      ObjectId::Proxy(_)       => Some("PBXContainerItemProxy".to_string()),
      ObjectId::Dependency(_)  => Some("PBXTargetDependency".to_string())
    })
  }

  fn record(&mut self, obj: ObjectId) -> Fields {
    match obj {
      ObjectId::Project        => self.project_record(),
      ObjectId::Group(id)      => self.group_record(id),
      ObjectId::File(id)       => self.file_record(id),
      ObjectId::BuildFile(id)  => self.build_file_record(id),
      ObjectId::Phase(id)      => self.phase_record(id),
      ObjectId::Config(id)     => self.config_record(id),
      ObjectId::ConfigList(id) => self.config_list_record(id),
      ObjectId::Target(id)     => self.target_record(id),
      ObjectId::Proxy(id)      => self.proxy_record(id),
      ObjectId::Dependency(id) => self.dependency_record(id)
    }
  }

  fn project_record(&mut self) -> Fields {
    let p = self.project;
    let mut r = Record::new("PBXProject");

    let mut attributes = BTreeMap::new();
    attributes.insert("LastUpgradeCheck".to_string(), Value::from(LAST_UPGRADE_CHECK));

    if let Some(org) = &p.organization {
      attributes.insert("ORGANIZATIONNAME".to_string(), Value::from(org.as_str()));
    }

    if p.has_test_linkages() {
      let mut hosted = BTreeMap::new();
      for (test, host) in p.test_linkages() {
        let test = self.visit(ObjectId::Target(test));
        let host = self.visit(ObjectId::Target(host));
        let mut attrs = BTreeMap::new();
        attrs.insert("TestTargetID".to_string(), Value::Id(host));
        hosted.insert(test.to_string(), Value::Dict(attrs));
      }
      attributes.insert("TargetAttributes".to_string(), Value::Dict(hosted));
    }

    r.set("attributes", Value::Dict(attributes));
    r.set("buildConfigurationList", self.reference(ObjectId::ConfigList(p.config_list()))?);
    r.set("compatibilityVersion", COMPATIBILITY_VERSION);
    r.set("developmentRegion", "en");
    r.set("hasScannedForEncodings", "0");
    r.set("knownRegions", Value::Array(vec!(Value::from("en"), Value::from("Base"))));
    r.set("mainGroup", self.reference(ObjectId::Group(p.main_group()))?);

    if let Some(g) = p.products_group() {
      r.set("productRefGroup", self.reference(ObjectId::Group(g))?);
    }

    r.set("projectDirPath", "");
    r.set("projectRoot", "");
    r.set("targets", self.references(p.all_targets().map(ObjectId::Target))?);
    Ok(r)
  }

  fn group_record(&mut self, id: GroupId) -> Fields {
    let p = self.project;
    let g = lookup(&p.groups, id.0, "group")?;

    if g.parent.is_some() && g.display_name().is_none() {
      return Err(Problem::new(format!("group #{}", id.0), "group has neither a name nor a path"));
    }

    let mut children = g.children().to_vec();
    children.sort_by(|a, b| p.reference_name(*a).cmp(&p.reference_name(*b)));

    let mut r = Record::new(match g.kind {
      GroupKind::Group   => "PBXGroup",
      GroupKind::Variant => "PBXVariantGroup"
    });
    r.set("children", self.references(children.into_iter().map(ObjectId::from))?);

    if let Some(name) = &g.name {
      if g.path.as_ref() != Some(name) {
        r.set("name", name.as_str());
      }
    }

    if let Some(path) = &g.path {
      r.set("path", path.as_str());
    }

    r.set("sourceTree", g.source_tree.to_str());
    Ok(r)
  }

  fn file_record(&mut self, id: FileRefId) -> Fields {
    let p = self.project;
    let f = lookup(&p.file_refs, id.0, "file reference")?;

    if f.name.is_empty() && f.path.is_none() {
      return Err(Problem::new(format!("file reference #{}", id.0),
                              "file reference has neither a name nor a path"));
    }

    let mut r = Record::new("PBXFileReference");
    r.inline = true;

    match f.is_input_file {
      true  => r.set("lastKnownFileType", f.file_type()),
      false => r.set("explicitFileType", f.file_type()).set("includeInIndex", "0")
    };

    if !f.name.is_empty() && f.path.as_ref() != Some(&f.name) {
      r.set("name", f.name.as_str());
    }

    if let Some(path) = &f.path {
      r.set("path", path.as_str());
    }

    r.set("sourceTree", f.source_tree.to_str());
    Ok(r)
  }

  fn build_file_record(&mut self, id: BuildFileId) -> Fields {
    let p = self.project;
    let (bf, _) = lookup(&p.build_files, id.0, "build file")?;

    let mut r = Record::new("PBXBuildFile");
    r.inline = true;
    r.set("fileRef", self.reference(ObjectId::File(bf.file_ref))?);

    if !bf.settings.is_empty() {
      r.set("settings", settings_dict(&bf.settings));
    }

    Ok(r)
  }

  fn phase_record(&mut self, id: PhaseId) -> Fields {
    let p = self.project;
    let phase = lookup(&p.phases, id.0, "build phase")?;

    let mut r = Record::new(phase.isa());
    r.set("buildActionMask", BUILD_ACTION_MASK);
    r.set("files", self.references(phase.files().iter().cloned().map(ObjectId::BuildFile))?);
    r.set("runOnlyForDeploymentPostprocessing", "0");

    if let PhaseKind::ShellScript(s) = &phase.kind {
      if s.shell_path.is_empty() {
        return Err(Problem::new(phase.name(), "shell script phase has an empty shell path"));
      }

      let paths = |v: &[String]| Value::Array(v.iter().map(|x| Value::from(x.as_str())).collect());
      r.set("inputPaths", paths(&s.input_paths));
      r.set("outputPaths", paths(&s.output_paths));
      r.set("shellPath", s.shell_path.as_str());
      r.set("shellScript", s.script.as_str());

      if let Some(name) = &s.name {
        r.set("name", name.as_str());
      }

      if !s.show_env_vars_in_log {
        r.set("showEnvVarsInLog", "0");
      }
    }

    Ok(r)
  }

  fn config_record(&mut self, id: ConfigId) -> Fields {
    let p = self.project;
    let c = lookup(&p.configs, id.0, "build configuration")?;

    let mut r = Record::new("XCBuildConfiguration");
    if let Some(base) = c.base_configuration {
      r.set("baseConfigurationReference", self.reference(ObjectId::File(base))?);
    }

    r.set("buildSettings", settings_dict(&c.settings));
    r.set("name", c.name.as_str());
    Ok(r)
  }

  fn config_list_record(&mut self, id: ConfigListId) -> Fields {
    let p = self.project;
    let (list, _) = lookup(&p.config_lists, id.0, "configuration list")?;

    let default = match list.default_name() {
      Some(name) => name,
      None       => return Err(Problem::new(self.comment(ObjectId::ConfigList(id))?.unwrap_or_default(),
                                            "configuration list has no configurations"))
    };

    let mut r = Record::new("XCConfigurationList");
    r.set("buildConfigurations", self.references(list.iter().map(|(_, c)| ObjectId::Config(c)))?);
    r.set("defaultConfigurationIsVisible", "0");
    r.set("defaultConfigurationName", default);
    Ok(r)
  }

  fn target_record(&mut self, id: TargetId) -> Fields {
    let p = self.project;
    let t = lookup(&p.targets, id.0, "target")?;

    let mut r = Record::new(t.isa());
    r.set("buildConfigurationList", self.reference(ObjectId::ConfigList(t.config_list()))?);
    r.set("buildPhases", self.references(t.phases().iter().cloned().map(ObjectId::Phase))?);
    r.set("dependencies", self.references(t.dependencies().iter().cloned().map(ObjectId::Dependency))?);
    r.set("name", t.name.as_str());
    r.set("productName", t.product_name.as_str());

    match &t.kind {
      TargetKind::Native(n) => {
        r.set("buildRules", Value::Array(Vec::new()));
        r.set("productReference", self.reference(ObjectId::File(n.product_reference))?);
        r.set("productType", n.product_type.identifier());
      },
      TargetKind::Legacy(l) => {
        if l.build_tool_path.is_empty() {
          return Err(Problem::new(t.name.as_str(), "legacy target has an empty build tool path"));
        }

        r.set("buildArgumentsString", l.build_arguments.as_str());
        r.set("buildToolPath", l.build_tool_path.as_str());
        r.set("buildWorkingDirectory", l.build_working_directory.as_str());
        r.set("passBuildSettingsInEnvironment", bool_value(l.pass_build_settings_in_environment));
      }
    }

    Ok(r)
  }

  fn proxy_record(&mut self, id: ProxyId) -> Fields {
    let p = self.project;
    let proxy = *lookup(&p.proxies, id.0, "container item proxy")?;

    let (remote, info) = match proxy.target {
      ProxyTarget::Target(t) => (ObjectId::Target(t), lookup(&p.targets, t.0, "target")?.name.as_str()),
      ProxyTarget::File(f)   => (ObjectId::File(f), lookup(&p.file_refs, f.0, "file reference")?.name.as_str())
    };

    let mut r = Record::new("PBXContainerItemProxy");
    r.set("containerPortal", self.reference(ObjectId::Project)?);
    r.set("proxyType", proxy.proxy_type.code().to_string());
    r.set("remoteGlobalIDString", self.visit(remote));
    r.set("remoteInfo", info);
    Ok(r)
  }

  fn dependency_record(&mut self, id: DependencyId) -> Fields {
    let p = self.project;
    let dep = *lookup(&p.dependencies, id.0, "target dependency")?;

    let mut r = Record::new("PBXTargetDependency");
    if let Some(t) = dep.target {
      r.set("target", self.reference(ObjectId::Target(t))?);
    }

    r.set("targetProxy", self.reference(ObjectId::Proxy(dep.proxy))?);
    Ok(r)
  }

  fn finish(self, root: &Gid) -> String {
    let mut s = format!(concat!("// !$*UTF8*$!\n",
                                "{{\n",
                                "\tarchiveVersion = {archive};\n",
                                "\tclasses = {{\n",
                                "\t}};\n",
                                "\tobjectVersion = {object};\n",
                                "\tobjects = {{\n"),
                        archive = ARCHIVE_VERSION,
                        object  = OBJECT_VERSION);

    for (isa, objects) in &self.sections {
      s.push_str(&format!("\n/* Begin {} section */\n", isa));
      for text in objects.values() {
        s.push_str(text);
      }
      s.push_str(&format!("/* End {} section */\n", isa));
    }

    s.push_str(&format!(concat!("\t}};\n",
                                "\trootObject = {} /* Project object */;\n",
                                "}}\n"),
                        root));

    debug!("rendered {} sections", self.sections.len());
    s
  }
}

fn tabs(s: &mut String, depth: usize) {
  for _ in 0..depth {
    s.push('\t');
  }
}

fn escape_comment(c: &str) -> Cow<'_, str> {
  match c.contains("*/") {
    true  => Cow::Owned(c.replace("*/", "* /")),
    false => Cow::Borrowed(c)
  }
}

fn render_object(gid: &Gid, comment: Option<&str>, r: &Record) -> String {
  let mut s = String::new();
  tabs(&mut s, 2);
  s.push_str(gid.as_str());

  if let Some(c) = comment {
    s.push_str(&format!(" /* {} */", escape_comment(c)));
  }

  match r.inline {
    true => {
      s.push_str(&format!(" = {{isa = {}; ", r.isa));
      for (k, v) in &r.fields {
        s.push_str(&format!("{} = ", k));
        write_value(&mut s, v, 0, true);
        s.push_str("; ");
      }
      s.push_str("};\n");
    },
    false => {
      s.push_str(&format!(" = {{\n\t\t\tisa = {};\n", r.isa));
      for (k, v) in &r.fields {
        tabs(&mut s, 3);
        s.push_str(&format!("{} = ", k));
        write_value(&mut s, v, 3, false);
        s.push_str(";\n");
      }
      s.push_str("\t\t};\n");
    }
  }

  s
}

fn write_value(s: &mut String, v: &Value, depth: usize, inline: bool) {
  match v {
    Value::Str(x) => s.push_str(&quote(x)),
    Value::Id(g)  => s.push_str(g.as_str()),
    Value::Ref(g, c) => {
      s.push_str(g.as_str());
      if let Some(c) = c {
        s.push_str(&format!(" /* {} */", escape_comment(c)));
      }
    },
    Value::Array(items) => {
      s.push('(');
      for item in items {
        if !inline {
          s.push('\n');
          tabs(s, depth + 1);
        }
        write_value(s, item, depth + 1, inline);
        s.push(',');
        if inline {
          s.push(' ');
        }
      }
      if !inline {
        s.push('\n');
        tabs(s, depth);
      }
      s.push(')');
    },
    Value::Dict(entries) => {
      s.push('{');
      for (k, item) in entries {
        if !inline {
          s.push('\n');
          tabs(s, depth + 1);
        }
        s.push_str(&format!("{} = ", quote(k)));
        write_value(s, item, depth + 1, inline);
        s.push(';');
        if inline {
          s.push(' ');
        }
      }
      if !inline {
        s.push('\n');
        tabs(s, depth);
      }
      s.push('}');
    }
  }
}
