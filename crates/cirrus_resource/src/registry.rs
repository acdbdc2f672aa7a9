//! Registry of declared resources.

use cirrus_output::ResourceId;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::ResourceError;
use crate::handle::ResourceHandle;

struct Entry {
    handle: ResourceHandle,
    parent: Option<ResourceId>,
}

/// Owns every registered resource handle, keyed by [`ResourceId`].
///
/// Children refer to their parent by id only; walking up the tree goes
/// through the registry, so no handle owns another.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: RwLock<HashMap<ResourceId, Entry>>,
}

impl core::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.len())
            .finish()
    }
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle` with an optional parent.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownParent`] if `parent` is not registered
    /// and [`ResourceError::DuplicateId`] if `handle` already is.
    pub fn insert(
        &self,
        handle: ResourceHandle,
        parent: Option<ResourceId>,
    ) -> Result<(), ResourceError> {
        let mut entries = self.entries.write();
        if let Some(parent) = parent
            && !entries.contains_key(&parent)
        {
            return Err(ResourceError::UnknownParent(parent));
        }

        let id = handle.id();
        if entries.contains_key(&id) {
            return Err(ResourceError::DuplicateId(id));
        }

        tracing::trace!(
            resource = %id,
            type_token = handle.type_token(),
            name = handle.name(),
            parent = ?parent,
            "resource added to registry"
        );
        entries.insert(id, Entry { handle, parent });
        Ok(())
    }

    /// Returns the handle for `id`.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<ResourceHandle> {
        self.entries.read().get(&id).map(|entry| entry.handle.clone())
    }

    /// Returns the resource whose URN has resolved to `urn`.
    #[must_use]
    pub fn find_by_urn(&self, urn: &str) -> Option<ResourceHandle> {
        self.entries
            .read()
            .values()
            .find(|entry| {
                matches!(
                    entry.handle.urn().try_data(),
                    Some(Ok(data)) if data.value().is_some_and(|known| known == urn)
                )
            })
            .map(|entry| entry.handle.clone())
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Returns the parent of `id`, if it has one.
    #[must_use]
    pub fn parent(&self, id: ResourceId) -> Option<ResourceHandle> {
        let entries = self.entries.read();
        let parent = entries.get(&id)?.parent?;
        entries.get(&parent).map(|entry| entry.handle.clone())
    }

    /// Returns the ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: ResourceId) -> Vec<ResourceHandle> {
        let entries = self.entries.read();
        let mut ancestors = Vec::new();
        let mut current = entries.get(&id).and_then(|entry| entry.parent);

        while let Some(parent) = current {
            let Some(entry) = entries.get(&parent) else {
                break;
            };
            ancestors.push(entry.handle.clone());
            current = entry.parent;
        }
        ancestors
    }

    /// Returns the direct children of `id`.
    #[must_use]
    pub fn children(&self, id: ResourceId) -> Vec<ResourceHandle> {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.parent == Some(id))
            .map(|entry| entry.handle.clone())
            .collect()
    }

    /// Returns the number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
