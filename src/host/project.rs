//! Build projects and their source-control configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A build project as the host describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project name, used for display and logging only.
    pub name: String,
    /// Source-control configuration, absent for projects without one.
    #[serde(default)]
    pub scm: Option<ScmConfig>,
    /// The most recent build that completed successfully, if any.
    #[serde(default)]
    pub last_successful_build: Option<Build>,
}

impl Project {
    /// Reference to the last successful build, suitable for anchoring a
    /// change set.
    pub fn reference_build(&self) -> Option<BuildRef> {
        self.last_successful_build.as_ref().map(Build::to_ref)
    }
}

/// One completed build with the environment captured while it ran.
///
/// The captured environment is the only persistence layer the providers see:
/// per-location revision state survives between builds solely as environment
/// values recorded here by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    /// Host-assigned build number.
    pub number: u32,
    /// Environment variables captured at build time.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Build {
    /// Looks up a captured environment variable.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }

    /// Cheap reference to this build.
    pub fn to_ref(&self) -> BuildRef {
        BuildRef {
            number: self.number,
        }
    }
}

/// Lightweight handle to a build, kept by a change set as its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRef {
    /// Host-assigned build number.
    pub number: u32,
}

/// Source-control configuration of a project, one variant per supported
/// repository kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScmConfig {
    /// A centralized Subversion repository, possibly tracking several
    /// locations.
    Subversion(SubversionConfig),
    /// A git repository reachable through a local path.
    Git(GitConfig),
}

/// Subversion configuration: the ordered list of tracked locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubversionConfig {
    /// Tracked remote paths. A location's index among its siblings is its
    /// position in this list.
    pub locations: Vec<ModuleLocation>,
}

/// One tracked remote path of a Subversion project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLocation {
    /// Repository URL of this location.
    pub url: String,
}

/// Git configuration: a repository path and the branch the project builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Path to the repository (the build workspace or a mirror).
    pub path: PathBuf,
    /// Branch whose head defines "latest"; the repository HEAD when absent.
    #[serde(default)]
    pub branch: Option<String>,
}
