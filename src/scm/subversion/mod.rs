//! Pending changes for Subversion-backed projects.
//!
//! The provider turns the revision captured at the last successful build into
//! a log query per configured location. Revision state survives between
//! builds only as captured environment values: `SVN_REVISION` for
//! single-location projects, `SVN_REVISION_<index>` otherwise. That naming
//! convention is an external contract shared with the host's environment
//! capture; a location whose key is missing silently contributes nothing.

pub mod client;
pub mod command;

pub use client::{SvnConnector, SvnError, SvnLogRecord, SvnSession};
pub use command::CommandLineSvn;

use crate::host::{Identity, IdentityDirectory, ModuleLocation, NameOnlyDirectory, Project, ScmConfig};
use crate::scm::changes::{ChangeEntry, ChangeSet, LocationSkip, SkipReason};
use crate::scm::provider::PendingChangesProvider;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Captured-environment key holding the built revision of a single-location
/// project.
pub const REVISION_KEY: &str = "SVN_REVISION";

/// Provider for centralized, integer-revisioned Subversion repositories.
pub struct SubversionProvider {
    connector: Arc<dyn SvnConnector>,
    identities: Arc<dyn IdentityDirectory>,
}

impl SubversionProvider {
    /// Provider over an explicit client and identity directory.
    pub fn new(connector: Arc<dyn SvnConnector>, identities: Arc<dyn IdentityDirectory>) -> Self {
        Self {
            connector,
            identities,
        }
    }

    /// Default wiring: the command-line client and name-echoing identities.
    pub fn command_line() -> Self {
        Self::new(Arc::new(CommandLineSvn::new()), Arc::new(NameOnlyDirectory))
    }

    /// Collects one location's pending entries into `entries`.
    ///
    /// Any failure skips the whole location and leaves `entries` with only
    /// the records appended by earlier locations.
    fn location_changes(
        &self,
        project: &Project,
        location: &ModuleLocation,
        index: usize,
        location_count: usize,
        entries: &mut Vec<ChangeEntry>,
    ) -> Result<(), SkipReason> {
        let url = Url::parse(&location.url).map_err(|e| SkipReason::InvalidUrl {
            detail: e.to_string(),
        })?;
        let mut session = self
            .connector
            .open(&url)
            .map_err(|e| SkipReason::SessionFailed {
                detail: e.to_string(),
            })?;

        let key = revision_key(index, location_count);
        let build = project
            .last_successful_build
            .as_ref()
            .ok_or(SkipReason::NoSuccessfulBuild)?;
        let stored = build
            .env_var(&key)
            .ok_or_else(|| SkipReason::MissingRevision { key: key.clone() })?;
        let built_revision: u64 =
            stored
                .trim()
                .parse()
                .map_err(|_| SkipReason::InvalidRevision {
                    key,
                    value: stored.to_string(),
                })?;

        // The stored revision is the one already built; start strictly after
        // it, with an open upper bound.
        let records = session
            .log(built_revision + 1)
            .map_err(|e| SkipReason::QueryFailed {
                detail: e.to_string(),
            })?;
        debug!(url = %location.url, built_revision, pending = records.len(), "queried location");

        for record in records {
            let author = match &record.author {
                Some(name) => self.identities.resolve(name),
                None => Identity::unknown(),
            };
            entries.push(ChangeEntry::new(
                record.revision.to_string(),
                record.message,
                author,
            ));
        }

        Ok(())
    }
}

impl PendingChangesProvider for SubversionProvider {
    fn name(&self) -> &'static str {
        "subversion"
    }

    fn supports(&self, scm: Option<&ScmConfig>) -> bool {
        matches!(scm, Some(ScmConfig::Subversion(_)))
    }

    fn pending_changes(&self, project: &Project) -> ChangeSet {
        let Some(ScmConfig::Subversion(config)) = project.scm.as_ref() else {
            // Callers go through supports(); anything else still gets a
            // valid, empty answer.
            return ChangeSet::new(project.reference_build(), Vec::new(), Vec::new());
        };

        let mut entries = Vec::new();
        let mut skips = Vec::new();
        let location_count = config.locations.len();

        for (index, location) in config.locations.iter().enumerate() {
            if let Err(reason) =
                self.location_changes(project, location, index, location_count, &mut entries)
            {
                warn!(location = %location.url, %reason, "skipping location");
                skips.push(LocationSkip::new(location.url.clone(), reason));
            }
        }

        ChangeSet::new(project.reference_build(), entries, skips)
    }
}

/// Captured-environment key naming for a location.
///
/// Single-location projects use the bare key, everything else indexes by
/// position.
fn revision_key(index: usize, location_count: usize) -> String {
    if location_count == 1 {
        REVISION_KEY.to_string()
    } else {
        format!("{REVISION_KEY}_{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_location_uses_bare_key() {
        assert_eq!(revision_key(0, 1), "SVN_REVISION");
    }

    #[test]
    fn sibling_locations_use_indexed_keys() {
        let keys: Vec<String> = (0..3).map(|i| revision_key(i, 3)).collect();
        assert_eq!(keys, ["SVN_REVISION_0", "SVN_REVISION_1", "SVN_REVISION_2"]);
    }

    proptest! {
        #[test]
        fn key_naming_convention(index in 0usize..64, extra in 1usize..64) {
            let count = index + extra;
            let key = revision_key(index, count);
            if count == 1 {
                prop_assert_eq!(key, "SVN_REVISION");
            } else {
                prop_assert_eq!(key, format!("SVN_REVISION_{index}"));
            }
        }
    }
}
