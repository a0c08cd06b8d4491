//! # pending-changes
//!
//! Reports the source-control changes a build project would pick up if it
//! built right now: everything committed upstream since the last successful
//! build.
//!
//! The capability is read-only and pluggable. Providers implement
//! [`scm::PendingChangesProvider`] per repository kind, a process-wide
//! [`scm::ProviderRegistry`] selects the one matching a project's
//! configuration, and every fetch returns a valid [`scm::ChangeSet`].
//! Remote failures degrade to logged warnings and per-location skip records,
//! never to errors.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod host;
pub mod scm;

pub use crate::cli::Cli;

/// The current version of pending-changes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
