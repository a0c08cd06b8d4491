//! Provider contract, registry, and provider selection.

use crate::host::{Project, ScmConfig};
use crate::scm::changes::ChangeSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Pluggable access to the pending changes of one kind of repository.
pub trait PendingChangesProvider: Send + Sync {
    /// Short provider name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this provider can handle `scm`.
    ///
    /// A pure predicate: no side effects, no panics, and `None` (an
    /// unconfigured project) is always unsupported.
    fn supports(&self, scm: Option<&ScmConfig>) -> bool;

    /// Retrieves all changes committed since the project's last successful
    /// build.
    ///
    /// May block on network I/O. Never fails: every remote failure mode
    /// degrades to a warning plus a skip record, and the result is always a
    /// valid (possibly empty) change set.
    fn pending_changes(&self, project: &Project) -> ChangeSet;
}

/// Ordered collection of all registered providers.
///
/// Populated once at startup and read-only afterwards; concurrent lookups
/// from request handling are safe.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn PendingChangesProvider>>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the providers this crate ships: Subversion (backed
    /// by the command-line client) and git.
    pub fn with_default_providers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::scm::subversion::SubversionProvider::command_line()));
        registry.register(Box::new(crate::scm::git::GitProvider::new()));
        registry
    }

    /// Appends a provider. Registration order is selection order.
    pub fn register(&mut self, provider: Box<dyn PendingChangesProvider>) {
        debug!(provider = provider.name(), "registering pending-changes provider");
        self.providers.push(provider);
    }

    /// Selects the provider for `scm`: the first registered provider whose
    /// `supports` returns true.
    ///
    /// Later providers that would also match are shadowed; each shadowing is
    /// logged so an accidental double registration is visible to operators.
    pub fn provider_for(&self, scm: Option<&ScmConfig>) -> Option<&dyn PendingChangesProvider> {
        let mut matching = self.providers.iter().filter(|p| p.supports(scm));
        let chosen = matching.next()?;
        for shadowed in matching {
            warn!(
                chosen = chosen.name(),
                shadowed = shadowed.name(),
                "multiple providers support this repository; first registration wins"
            );
        }
        Some(chosen.as_ref())
    }

    /// Whether any registered provider supports the project's repository.
    ///
    /// This is the affordance check a host runs before showing any pending
    /// changes UI; permission gating stays with the caller.
    pub fn supported(&self, project: &Project) -> bool {
        self.provider_for(project.scm.as_ref()).is_some()
    }

    /// Fetches the pending changes of `project`.
    ///
    /// `None` means the capability is unavailable: the project has no
    /// repository configured, or no registered provider supports it. That is
    /// distinct from `Some` of an empty set, which means a supported fetch
    /// found nothing (or every location was skipped).
    pub fn pending_changes(&self, project: &Project) -> Option<ChangeSet> {
        let scm = project.scm.as_ref()?;
        let provider = self.provider_for(Some(scm))?;
        debug!(
            provider = provider.name(),
            project = %project.name,
            "fetching pending changes"
        );
        Some(provider.pending_changes(project))
    }
}

/// Process-wide registry instance.
static REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

/// The process-wide registry, initialized with the default providers on
/// first use.
pub fn global_registry() -> &'static ProviderRegistry {
    REGISTRY.get_or_init(ProviderRegistry::with_default_providers)
}

/// Installs a custom process-wide registry.
///
/// Must run before the first `global_registry` call; once a registry is in
/// place it stays for the life of the process and the rejected replacement is
/// handed back.
pub fn install_registry(registry: ProviderRegistry) -> Result<(), ProviderRegistry> {
    REGISTRY.set(registry)
}
