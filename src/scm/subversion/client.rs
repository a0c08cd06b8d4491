//! Repository-access client abstraction for Subversion.
//!
//! The provider consumes these traits; which client actually talks to the
//! server is an implementation detail behind them. Tests substitute in-memory
//! fakes, production wiring uses the command-line client.

use thiserror::Error;
use url::Url;

/// Errors raised by a repository-access client.
#[derive(Error, Debug)]
pub enum SvnError {
    /// The client process could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// The command that was attempted.
        command: String,
        /// Underlying launch failure.
        #[source]
        source: std::io::Error,
    },

    /// The client ran but reported failure.
    #[error("svn exited with {status}: {stderr}")]
    CommandFailed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The client produced output this crate could not interpret.
    #[error("unexpected svn output: {0}")]
    MalformedOutput(String),

    /// The repository session could not be established.
    #[error("repository session failed: {0}")]
    Session(String),
}

/// One record of the remote log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnLogRecord {
    /// Revision number.
    pub revision: u64,
    /// Committing account name; absent for revisions committed without
    /// authentication.
    pub author: Option<String>,
    /// Raw commit message.
    pub message: String,
}

/// An open session against one repository location.
///
/// Sessions live for a single fetch of a single location and are dropped at
/// the end of it, on every exit path.
pub trait SvnSession {
    /// All log entries strictly from `start_revision` through the latest
    /// available revision, oldest first.
    ///
    /// The query follows the full ancestry path (cross-copy history) and
    /// includes merged revisions where the backing client supports it. A
    /// start revision beyond the latest one yields an empty log, not an
    /// error.
    fn log(&mut self, start_revision: u64) -> Result<Vec<SvnLogRecord>, SvnError>;
}

/// Opens sessions against repository locations.
pub trait SvnConnector: Send + Sync {
    /// Opens a session scoped to `url`.
    fn open(&self, url: &Url) -> Result<Box<dyn SvnSession>, SvnError>;
}
