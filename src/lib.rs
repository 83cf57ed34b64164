//! Generates Xcode projects from resolved build graphs.
//!
//! Build-graph facts go through `assemble` to populate a `pbx::Project`, which
//! `pbx::write_project` renders into the `project.pbxproj` format.

pub mod assemble;
pub mod config;
pub mod error;
pub mod pbx;

pub use error::{Error, Problem, Result};
