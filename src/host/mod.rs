//! The consumed slice of the build-orchestration host.
//!
//! These types model what the host owns and this crate only reads: projects,
//! their source-control configuration, the last successful build with its
//! captured environment, and the identity directory. Nothing in here is
//! persisted or mutated by this crate.

pub mod identity;
pub mod project;

pub use identity::{Identity, IdentityDirectory, NameOnlyDirectory};
pub use project::{
    Build, BuildRef, GitConfig, ModuleLocation, Project, ScmConfig, SubversionConfig,
};
