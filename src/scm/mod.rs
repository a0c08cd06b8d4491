//! The pending-changes capability.
//!
//! `changes` is the data model, `provider` the pluggable contract plus the
//! registry that selects a provider per repository kind, and the remaining
//! modules are the providers themselves.

pub mod changes;
pub mod git;
pub mod provider;
pub mod subversion;

pub use changes::{ChangeEntry, ChangeSet, LocationSkip, SkipReason};
pub use git::GitProvider;
pub use provider::{
    global_registry, install_registry, PendingChangesProvider, ProviderRegistry,
};
pub use subversion::SubversionProvider;
