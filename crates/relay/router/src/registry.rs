//! Component registry owned by the consumer loop.

use std::collections::HashMap;

use relay_types::{ComponentHandle, ComponentId};

/// ComponentId → handle. An id is present iff that component is registered.
pub struct ComponentRegistry<P> {
    entries: HashMap<ComponentId, ComponentHandle<P>>,
}

impl<P: Send + 'static> ComponentRegistry<P> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, id: &ComponentId) -> Option<&ComponentHandle<P>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `id` is registered to exactly this handle.
    pub fn holds(&self, id: &ComponentId, handle: &ComponentHandle<P>) -> bool {
        self.entries
            .get(id)
            .is_some_and(|existing| existing.same_component(handle))
    }

    /// The id under which this handle is registered, by handle identity.
    pub fn find(&self, handle: &ComponentHandle<P>) -> Option<ComponentId> {
        self.entries
            .iter()
            .find(|(_, existing)| existing.same_component(handle))
            .map(|(id, _)| *id)
    }

    pub fn insert(&mut self, id: ComponentId, handle: ComponentHandle<P>) {
        self.entries.insert(id, handle);
    }

    pub fn remove(&mut self, id: &ComponentId) -> Option<ComponentHandle<P>> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Send + 'static> Default for ComponentRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
