//! The project configuration file.
//!
//! ```toml
//! [project]
//! name           = "App"
//! min_version    = "0.1.0"
//! configurations = ["Debug", "Release"]
//!
//! [settings]
//! CLANG_CXX_LANGUAGE_STANDARD = "gnu++17"
//! WARNING_CFLAGS              = ["-Wall", "-Wextra"]
//! ```

use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use crate::assemble::Options;
use crate::pbx::{BuildSettings, SourceTree};

pub const DEFAULT_CONFIG_FILE: &str = "Pbxgen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid version \"{0}\": {1}")]
  Version(String, String),

  #[error("project does not support this version: expected {expected} but running {current}")]
  Unsupported {
    expected: Version,
    current:  Version
  },

  #[error(transparent)]
  Toml(#[from] toml::de::Error)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(rename = "project")]
  pub info: ProjectInfo,

  /// Project-level build settings.
  #[serde(default)]
  pub settings: BuildSettings
}

impl std::ops::Deref for Config {
  type Target = ProjectInfo;

  fn deref(&self) -> &ProjectInfo {
    &self.info
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
  pub name: String,

  #[serde(default)]
  pub min_version: String,

  #[serde(default)]
  pub organization: Option<String>,

  /// Build graph description, relative to the input folder.
  #[serde(default = "default_graph")]
  pub graph: String,

  #[serde(default = "default_configurations")]
  pub configurations: Vec<String>,

  #[serde(default = "default_build_tool")]
  pub build_tool: String,

  /// An xcconfig file every project configuration is based on.
  #[serde(default)]
  pub base_config: Option<String>,

  /// Glob patterns of extra files to show in the project.
  #[serde(default)]
  pub additional_files: Vec<String>
}

fn default_graph() -> String {
  "build_graph.json".to_string()
}

fn default_configurations() -> Vec<String> {
  vec!("Debug".to_string(), "Release".to_string())
}

fn default_build_tool() -> String {
  "bazel".to_string()
}

impl Config {
  pub fn from_str(s: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(s)?)
  }

  /// Assembly options for a main group rooted at `root`, relative to the
  /// folder holding the generated project.
  pub fn options(&self, root: Option<String>) -> Options {
    Options {
      root_tree:        SourceTree::Group,
      root_path:        root,
      configurations:   self.configurations.clone(),
      build_tool:       self.build_tool.clone(),
      project_settings: self.settings.clone(),
      base_config:      self.base_config.clone(),
      organization:     self.organization.clone()
    }
  }
}

/// Fails when the running version is older than `min_version`.
pub fn is_supported(min_version: &str) -> Result<(), ConfigError> {
  check_version(min_version, env!("CARGO_PKG_VERSION"))
}

fn check_version(min_version: &str, current: &str) -> Result<(), ConfigError> {
  if min_version.is_empty() {
    return Ok(());
  }

  let parse = |v: &str| Version::parse(v).map_err(|e| ConfigError::Version(v.to_string(), e.to_string()));
  let expected = parse(min_version)?;
  let current  = parse(current)?;
  match expected > current {
    true  => Err(ConfigError::Unsupported { expected, current }),
    false => Ok(())
  }
}
