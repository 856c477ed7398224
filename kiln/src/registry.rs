use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Set of container identifiers currently held by live containers.
///
/// Reservation is an atomic check-and-set, so when several builders
/// initialize with the same identifier concurrently exactly one of them wins.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: DashMap<Arc<str>, ()>,
}

impl ContainerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the registry shared by the whole process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ContainerRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(ContainerRegistry::new).clone()
    }

    /// Reserves an identifier, returning `None` if it is already held.
    pub fn reserve(self: &Arc<Self>, id: &str) -> Option<ContainerLease> {
        match self.containers.entry(id.into()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => {
                let id = v.key().clone();
                v.insert(());
                tracing::debug!(container_id = &*id, "Container id reserved");
                Some(ContainerLease {
                    registry: self.clone(),
                    id,
                })
            }
        }
    }

    pub fn is_in_use(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    fn release(&self, id: &str) {
        if self.containers.remove(id).is_some() {
            tracing::debug!(container_id = id, "Container id released");
        }
    }
}

/// Reservation of a container identifier. Dropping it releases the identifier.
pub struct ContainerLease {
    registry: Arc<ContainerRegistry>,
    id: Arc<str>,
}

impl ContainerLease {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ContainerLease {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}
