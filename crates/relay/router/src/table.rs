//! Routing table owned by the consumer loop.

use std::collections::HashMap;

use relay_types::{ComponentHandle, ComponentId, RouteEntry, RouteSnapshot, RouteTarget};

use crate::config::DuplicatePolicy;
use crate::registry::ComponentRegistry;

/// A destination recorded under a source.
///
/// The id is the one the destination held when the route was added, so stale
/// routes stay identifiable after their destination unregisters.
pub struct Destination<P> {
    pub id: ComponentId,
    pub handle: ComponentHandle<P>,
}

impl<P> Clone for Destination<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handle: self.handle.clone(),
        }
    }
}

/// Source id → destinations, in insertion order.
pub struct RoutingTable<P> {
    routes: HashMap<ComponentId, Vec<Destination<P>>>,
}

impl<P: Send + 'static> RoutingTable<P> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Append a destination. Returns false when `policy` suppressed a
    /// duplicate.
    pub fn add(
        &mut self,
        source: ComponentId,
        destination: Destination<P>,
        policy: DuplicatePolicy,
    ) -> bool {
        let list = self.routes.entry(source).or_default();
        if policy == DuplicatePolicy::Unique
            && list.iter().any(|d| d.handle == destination.handle)
        {
            return false;
        }
        list.push(destination);
        true
    }

    /// Remove every occurrence of `handle` under `source`.
    pub fn remove(&mut self, source: &ComponentId, handle: &ComponentHandle<P>) -> usize {
        self.remove_where(source, |d| d.handle == *handle)
    }

    /// Remove every destination recorded under id `destination`.
    pub fn remove_by_id(&mut self, source: &ComponentId, destination: &ComponentId) -> usize {
        self.remove_where(source, |d| d.id == *destination)
    }

    fn remove_where<F>(&mut self, source: &ComponentId, mut matches: F) -> usize
    where
        F: FnMut(&Destination<P>) -> bool,
    {
        let Some(list) = self.routes.get_mut(source) else {
            return 0;
        };
        let before = list.len();
        list.retain(|d| !matches(d));
        let removed = before - list.len();
        if list.is_empty() {
            self.routes.remove(source);
        }
        removed
    }

    /// Forget a component entirely: its own routes and every route to it.
    /// Returns the number of edges removed.
    pub fn scrub(&mut self, id: &ComponentId, handle: &ComponentHandle<P>) -> usize {
        let mut removed = self.routes.remove(id).map_or(0, |list| list.len());
        for list in self.routes.values_mut() {
            let before = list.len();
            list.retain(|d| d.handle != *handle && d.id != *id);
            removed += before - list.len();
        }
        self.routes.retain(|_, list| !list.is_empty());
        removed
    }

    pub fn destinations(&self, source: &ComponentId) -> &[Destination<P>] {
        self.routes.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn source_count(&self) -> usize {
        self.routes.len()
    }

    pub fn snapshot(&self, registry: &ComponentRegistry<P>) -> RouteSnapshot {
        let mut entries: Vec<RouteEntry> = self
            .routes
            .iter()
            .map(|(source, list)| RouteEntry {
                source: *source,
                destinations: list
                    .iter()
                    .map(|d| RouteTarget {
                        id: d.id,
                        registered: registry.holds(&d.id, &d.handle),
                        live: d.handle.is_alive(),
                    })
                    .collect(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.source);

        RouteSnapshot {
            entries,
            registered: registry.len(),
        }
    }
}

impl<P: Send + 'static> Default for RoutingTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::ChannelComponent;
    use std::sync::Arc;

    struct Fixture {
        components: Vec<Arc<ChannelComponent<u8>>>,
        _inboxes: Vec<tokio::sync::mpsc::Receiver<u8>>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            let (components, _inboxes) = (0..n).map(|_| ChannelComponent::<u8>::new(1)).unzip();
            Self {
                components,
                _inboxes,
            }
        }

        fn id(&self, i: usize) -> ComponentId {
            ComponentId::from_u128(i as u128 + 1)
        }

        fn dest(&self, i: usize) -> Destination<u8> {
            Destination {
                id: self.id(i),
                handle: ComponentHandle::new(&self.components[i]),
            }
        }
    }

    #[test]
    fn duplicates_allowed_by_default() {
        let f = Fixture::new(2);
        let mut table = RoutingTable::new();
        assert!(table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow));
        assert!(table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow));
        assert_eq!(table.destinations(&f.id(0)).len(), 2);
    }

    #[test]
    fn unique_policy_is_idempotent() {
        let f = Fixture::new(2);
        let mut table = RoutingTable::new();
        assert!(table.add(f.id(0), f.dest(1), DuplicatePolicy::Unique));
        assert!(!table.add(f.id(0), f.dest(1), DuplicatePolicy::Unique));
        assert_eq!(table.destinations(&f.id(0)).len(), 1);
    }

    #[test]
    fn remove_drops_every_occurrence_and_keeps_others() {
        let f = Fixture::new(3);
        let mut table = RoutingTable::new();
        table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow);
        table.add(f.id(0), f.dest(2), DuplicatePolicy::Allow);
        table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow);

        assert_eq!(table.remove(&f.id(0), &f.dest(1).handle), 2);
        let left: Vec<_> = table.destinations(&f.id(0)).iter().map(|d| d.id).collect();
        assert_eq!(left, vec![f.id(2)]);
    }

    #[test]
    fn empty_source_entries_are_dropped() {
        let f = Fixture::new(2);
        let mut table = RoutingTable::new();
        table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow);
        table.remove_by_id(&f.id(0), &f.id(1));
        assert_eq!(table.source_count(), 0);
        assert!(table.destinations(&f.id(0)).is_empty());
    }

    #[test]
    fn scrub_removes_component_on_both_sides() {
        let f = Fixture::new(3);
        let mut table = RoutingTable::new();
        table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow);
        table.add(f.id(1), f.dest(2), DuplicatePolicy::Allow);
        table.add(f.id(2), f.dest(1), DuplicatePolicy::Allow);
        table.add(f.id(2), f.dest(0), DuplicatePolicy::Allow);

        assert_eq!(table.scrub(&f.id(1), &f.dest(1).handle), 3);
        assert_eq!(table.source_count(), 1);
        let left: Vec<_> = table.destinations(&f.id(2)).iter().map(|d| d.id).collect();
        assert_eq!(left, vec![f.id(0)]);
    }

    #[test]
    fn snapshot_flags_unregistered_destinations() {
        let f = Fixture::new(2);
        let mut registry = ComponentRegistry::new();
        registry.insert(f.id(0), f.dest(0).handle);

        let mut table = RoutingTable::new();
        table.add(f.id(0), f.dest(1), DuplicatePolicy::Allow);

        let snap = table.snapshot(&registry);
        assert_eq!(snap.registered, 1);
        assert_eq!(snap.entries.len(), 1);
        let target = snap.entries[0].destinations[0];
        assert_eq!(target.id, f.id(1));
        assert!(!target.registered);
        assert!(target.live);
    }
}
