//! Pending changes for git-backed projects.
//!
//! The mirror of the Subversion convention: the host captures `GIT_COMMIT`
//! in each build's environment, and pending changes are the commits
//! reachable from the configured branch head but not from that commit.

use crate::host::{GitConfig, Identity, IdentityDirectory, NameOnlyDirectory, Project, ScmConfig};
use crate::scm::changes::{ChangeEntry, ChangeSet, LocationSkip, SkipReason};
use crate::scm::provider::PendingChangesProvider;
use git2::Repository;
use std::sync::Arc;
use tracing::{debug, warn};

/// Captured-environment key holding the built commit of a git project.
pub const COMMIT_KEY: &str = "GIT_COMMIT";

/// Provider for git repositories reachable through a local path.
pub struct GitProvider {
    identities: Arc<dyn IdentityDirectory>,
}

impl GitProvider {
    /// Provider with name-echoing identities.
    pub fn new() -> Self {
        Self::with_identities(Arc::new(NameOnlyDirectory))
    }

    /// Provider over an explicit identity directory.
    pub fn with_identities(identities: Arc<dyn IdentityDirectory>) -> Self {
        Self { identities }
    }

    fn repository_changes(
        &self,
        project: &Project,
        config: &GitConfig,
    ) -> Result<Vec<ChangeEntry>, SkipReason> {
        let build = project
            .last_successful_build
            .as_ref()
            .ok_or(SkipReason::NoSuccessfulBuild)?;
        let stored = build.env_var(COMMIT_KEY).ok_or_else(|| {
            SkipReason::MissingRevision {
                key: COMMIT_KEY.to_string(),
            }
        })?;

        let repo = Repository::open(&config.path).map_err(|e| SkipReason::SessionFailed {
            detail: e.message().to_string(),
        })?;

        let built = repo
            .revparse_single(stored)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| SkipReason::InvalidRevision {
                key: COMMIT_KEY.to_string(),
                value: stored.to_string(),
            })?;

        let head = match &config.branch {
            Some(branch) => repo
                .revparse_single(branch)
                .and_then(|obj| obj.peel_to_commit())
                .map_err(|e| SkipReason::QueryFailed {
                    detail: e.message().to_string(),
                })?,
            None => repo
                .head()
                .and_then(|head| head.peel_to_commit())
                .map_err(|e| SkipReason::QueryFailed {
                    detail: e.message().to_string(),
                })?,
        };
        debug!(path = %config.path.display(), built = %built.id(), head = %head.id(), "walking pending commits");

        // Walk from the branch head back to the already-built commit,
        // exclusive, then flip to oldest-first.
        let collect = || -> Result<Vec<ChangeEntry>, git2::Error> {
            let mut walker = repo.revwalk()?;
            walker.push(head.id())?;
            walker.hide(built.id())?;

            let mut entries = Vec::new();
            for oid in walker {
                let oid = oid?;
                let commit = repo.find_commit(oid)?;
                let author = match commit.author().name() {
                    Some(name) => self.identities.resolve(name),
                    None => Identity::unknown(),
                };
                entries.push(ChangeEntry::new(
                    oid.to_string(),
                    commit.message().unwrap_or("").to_string(),
                    author,
                ));
            }
            entries.reverse();
            Ok(entries)
        };

        collect().map_err(|e| SkipReason::QueryFailed {
            detail: e.message().to_string(),
        })
    }
}

impl Default for GitProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingChangesProvider for GitProvider {
    fn name(&self) -> &'static str {
        "git"
    }

    fn supports(&self, scm: Option<&ScmConfig>) -> bool {
        matches!(scm, Some(ScmConfig::Git(_)))
    }

    fn pending_changes(&self, project: &Project) -> ChangeSet {
        let Some(ScmConfig::Git(config)) = project.scm.as_ref() else {
            return ChangeSet::new(project.reference_build(), Vec::new(), Vec::new());
        };

        match self.repository_changes(project, config) {
            Ok(entries) => ChangeSet::new(project.reference_build(), entries, Vec::new()),
            Err(reason) => {
                warn!(path = %config.path.display(), %reason, "skipping repository");
                let skip = LocationSkip::new(config.path.display().to_string(), reason);
                ChangeSet::new(project.reference_build(), Vec::new(), vec![skip])
            }
        }
    }
}
