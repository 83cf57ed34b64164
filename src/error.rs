use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// Labels referenced by the build graph that no descriptor provides.
  #[error("unresolved build labels: {}", join(.0))]
  UnresolvedLabels(BTreeSet<String>),

  #[error("target \"{0}\" cannot depend on itself")]
  SelfDependency(String),

  #[error("a target named \"{0}\" already exists in the project")]
  DuplicateTarget(String),

  /// An id that does not belong to the project, such as "target #3".
  #[error("unknown object: {0}")]
  UnknownTarget(String),

  /// Every problem found while rendering one project. Nothing is written when
  /// this is returned.
  #[error("failed to serialize project \"{project}\":\n{}", list(.problems))]
  Serialization {
    project:  String,
    problems: Vec<Problem>
  },

  #[error(transparent)]
  Io(#[from] std::io::Error)
}

/// An object the writer could not render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
  pub object: String,
  pub reason: String
}

impl Problem {
  pub fn new<O: Into<String>, R: Into<String>>(object: O, reason: R) -> Self {
    Problem { object: object.into(), reason: reason.into() }
  }
}

impl fmt::Display for Problem {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}: {}", self.object, self.reason)
  }
}

fn join(labels: &BTreeSet<String>) -> String {
  labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn list(problems: &[Problem]) -> String {
  problems.iter().map(|p| format!("  - {}", p)).collect::<Vec<_>>().join("\n")
}
