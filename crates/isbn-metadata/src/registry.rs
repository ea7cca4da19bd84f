//! Named metadata providers, consulted in ascending priority order

use std::sync::Arc;

use crate::error::RegistryError;
use crate::provider::Provider;

struct Registration {
    provider: Arc<dyn Provider>,
    priority: i32,
    seq: usize,
}

/// Registry of metadata providers, consulted in priority order.
///
/// Lower priority values run first; equal priorities keep registration order.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<Registration>,
    next_seq: usize,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Returns error if one with the same name exists.
    pub fn register(
        &mut self,
        provider: Arc<dyn Provider>,
        priority: i32,
    ) -> Result<(), RegistryError> {
        if self.get(provider.name()).is_some() {
            return Err(RegistryError::AlreadyRegistered(provider.name().to_string()));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Registration {
            provider,
            priority,
            seq,
        });
        // Stable sort on (priority, seq) keeps ties in registration order
        self.entries.sort_by_key(|r| (r.priority, r.seq));
        Ok(())
    }

    /// Remove a provider by name, returning it if it was registered.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Provider>> {
        let pos = self.entries.iter().position(|r| r.provider.name() == name)?;
        Some(self.entries.remove(pos).provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.entries
            .iter()
            .find(|r| r.provider.name() == name)
            .map(|r| Arc::clone(&r.provider))
    }

    /// Providers in the order the resolver consults them.
    pub fn ordered(&self) -> Vec<Arc<dyn Provider>> {
        self.entries
            .iter()
            .map(|r| Arc::clone(&r.provider))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.provider.name()).collect()
    }

    pub fn priority_of(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|r| r.provider.name() == name)
            .map(|r| r.priority)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|r| (r.provider.name(), r.priority)))
            .finish()
    }
}
