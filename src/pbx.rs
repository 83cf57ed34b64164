//! The Xcode project object graph.
//!
//! The project file format mirrors the object model of Xcode. Every object has
//! an "isa" property naming its type:
//! - PBXProject                    The root object describing the project.
//! - PBXNativeTarget               A target producing a native application or library.
//! - PBXLegacyTarget               A target produced using an external build tool.
//! - PBXTargetDependency           A target to PBXContainerItemProxy dependency.
//! - PBXContainerItemProxy         A reference to another object of the project.
//! - PBXBuildFile                  A file reference used in a build phase.
//! - PBXFileReference              A file referenced by the project.
//! - PBXGroup                      Container for file references and groups.
//! - PBXVariantGroup               Gathers the localizations of a file.
//! - PBXSourcesBuildPhase          Compiles the sources of a target.
//! - PBXShellScriptBuildPhase      Runs a script while building a target.
//! - XCBuildConfiguration          Compiler, linker and target settings.
//! - XCConfigurationList           A list of XCBuildConfiguration objects.
//!
//! References:
//! - https://en.wikipedia.org/wiki/Property_list
//! - http://monoobjc.net/xcode-project-file-format.html

pub mod file_types;
mod gid;
mod model;
mod project;
mod writer;

pub use gid::{Gid, IdGenerator};
pub use model::{BuildConfiguration, BuildFile, BuildFileId, BuildPhase, BuildSettings, ConfigId,
                ConfigListId, ConfigurationList, ContainerItemProxy, DependencyId, FileRefId,
                FileReference, Group, GroupId, GroupKind, LegacyTarget, NativeTarget, ObjectId,
                PhaseId, PhaseKind, ProductType, ProxyId, ProxyTarget, ProxyType, ReferenceId,
                Setting, ShellScript, SourceTree, Target, TargetDependency, TargetId, TargetKind};
pub use project::{ListOwner, PRODUCTS_GROUP, Project};
pub use writer::{ARCHIVE_VERSION, COMPATIBILITY_VERSION, LAST_UPGRADE_CHECK, OBJECT_VERSION,
                 quote, render, write_project};
