use clap::{App, ArgMatches};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use pbxgen::config::Config;
use pbxgen::pbx::{IdGenerator, Project};

pub trait Command {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b>;

  fn run(&self, ctx: &Context) -> RunResult;
}

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;
pub type RunResult    = DynResult<()>;

pub type Commands = BTreeMap<&'static str, Box<dyn Command>>;

pub struct Context<'a> {
  pub commands: Commands,

  pub build_dir: PathBuf,

  pub env:     &'a Env,
  pub args:    &'a ArgMatches<'a>,
  pub config:  &'a Config,
  pub project: &'a Project
}

impl<'a> Context<'a> {
  /// Identifier generator for one serialization pass.
  pub fn id_generator(&self) -> IdGenerator {
    match self.env.seed {
      Some(seed) => IdGenerator::with_seed(seed),
      None       => IdGenerator::new()
    }
  }

  pub fn project_file(&self) -> PathBuf {
    self.build_dir
      .join([self.project.name.as_str(), ".xcodeproj"].join(""))
      .join("project.pbxproj")
  }
}

/// Environment variables, read without their `PBXGEN_` prefix.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Env {
  pub seed:       Option<u64>,
  pub build_tool: Option<String>
}
