//! User identities attached to commits.

use serde::{Deserialize, Serialize};

/// A user account known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account id, typically the source-control user name.
    pub id: String,
    /// Display name; falls back to the account id when the directory has
    /// nothing better.
    pub full_name: String,
}

impl Identity {
    /// Identity carrying only an account name.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            full_name: id.clone(),
            id,
        }
    }

    /// Placeholder for commits with no recorded author.
    pub fn unknown() -> Self {
        Self::named("unknown")
    }
}

/// Resolves account names to identities.
///
/// Resolution is total: an unknown name yields a placeholder identity rather
/// than an error, so a failed lookup can never abort a fetch.
pub trait IdentityDirectory: Send + Sync {
    /// Resolves `name` to an identity.
    fn resolve(&self, name: &str) -> Identity;
}

/// Directory-less resolver that echoes the account name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOnlyDirectory;

impl IdentityDirectory for NameOnlyDirectory {
    fn resolve(&self, name: &str) -> Identity {
        if name.is_empty() {
            Identity::unknown()
        } else {
            Identity::named(name)
        }
    }
}
