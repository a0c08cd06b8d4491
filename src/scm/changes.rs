//! Change entries and change sets.

use crate::host::{BuildRef, Identity};
use serde::Serialize;
use std::fmt;

/// One committed revision pending since the last successful build.
///
/// Immutable once constructed; entries are owned by the change set that
/// collected them.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEntry {
    commit_id: String,
    message: String,
    author: Identity,
}

impl ChangeEntry {
    /// Builds an entry from one remote log record.
    pub fn new(commit_id: impl Into<String>, message: impl Into<String>, author: Identity) -> Self {
        Self {
            commit_id: commit_id.into(),
            message: message.into(),
            author,
        }
    }

    /// Revision identifier, rendered as text.
    pub fn commit_id(&self) -> &str {
        &self.commit_id
    }

    /// Raw commit message, possibly empty, never trimmed.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Resolved commit author.
    pub fn author(&self) -> &Identity {
        &self.author
    }

    /// Paths touched by this revision.
    ///
    /// The centralized-VCS log query does not report paths, so this is always
    /// empty. Documented limitation, kept as an accessor so consumers have a
    /// stable call site should a provider ever supply paths.
    pub fn affected_paths(&self) -> &[String] {
        &[]
    }
}

/// The ordered collection of pending changes for one project.
///
/// Entries keep the order they were accumulated in: per-location query order,
/// locations in configuration order, never re-sorted across locations.
/// Constructed once per fetch and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
    reference_build: Option<BuildRef>,
    skips: Vec<LocationSkip>,
}

impl ChangeSet {
    /// Builds a change set anchored to `reference_build`.
    ///
    /// `reference_build` is absent only when the project has never built
    /// successfully, in which case `entries` is necessarily empty.
    pub fn new(
        reference_build: Option<BuildRef>,
        entries: Vec<ChangeEntry>,
        skips: Vec<LocationSkip>,
    ) -> Self {
        Self {
            entries,
            reference_build,
            skips,
        }
    }

    /// The build this set is pending relative to.
    pub fn reference_build(&self) -> Option<&BuildRef> {
        self.reference_build.as_ref()
    }

    /// Entries in accumulation order.
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Number of pending changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pending changes were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locations that contributed nothing, with the reason each was skipped.
    ///
    /// Lets operators tell "no pending changes" apart from "every location
    /// failed"; callers that only want the original contract can ignore it.
    pub fn skips(&self) -> &[LocationSkip] {
        &self.skips
    }

    /// Iterates entries in accumulation order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A location that was skipped during a fetch.
#[derive(Debug, Clone, Serialize)]
pub struct LocationSkip {
    location: String,
    reason: SkipReason,
}

impl LocationSkip {
    /// Records that `location` contributed nothing because of `reason`.
    pub fn new(location: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            location: location.into(),
            reason,
        }
    }

    /// The skipped location (URL or repository path).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Why the location was skipped.
    pub fn reason(&self) -> &SkipReason {
        &self.reason
    }
}

/// Why a location contributed no entries.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// The configured URL did not parse.
    InvalidUrl {
        /// Parser diagnostic.
        detail: String,
    },
    /// The repository session could not be opened.
    SessionFailed {
        /// Client diagnostic.
        detail: String,
    },
    /// The project has no successful build to diff against.
    NoSuccessfulBuild,
    /// The captured environment holds no revision value under the expected
    /// key.
    MissingRevision {
        /// The key that was looked up.
        key: String,
    },
    /// The captured revision value did not parse as a revision.
    InvalidRevision {
        /// The key that was looked up.
        key: String,
        /// The raw captured value.
        value: String,
    },
    /// The log query itself failed.
    QueryFailed {
        /// Client diagnostic.
        detail: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { detail } => write!(f, "invalid url: {detail}"),
            Self::SessionFailed { detail } => write!(f, "session failed: {detail}"),
            Self::NoSuccessfulBuild => write!(f, "no successful build yet"),
            Self::MissingRevision { key } => write!(f, "no captured value for {key}"),
            Self::InvalidRevision { key, value } => {
                write!(f, "captured {key}={value:?} is not a revision")
            }
            Self::QueryFailed { detail } => write!(f, "log query failed: {detail}"),
        }
    }
}
