//! Point-in-time view of the routing table for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ComponentId;

/// A destination as seen at snapshot time.
///
/// `registered` is false for destinations that were unregistered while the
/// route stayed in place; `live` is false once the owner dropped the
/// component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTarget {
    pub id: ComponentId,
    pub registered: bool,
    pub live: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub source: ComponentId,
    pub destinations: Vec<RouteTarget>,
}

/// The full routing table, sources in ascending id order and destinations in
/// table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub entries: Vec<RouteEntry>,
    /// Number of registered components when the snapshot was taken.
    pub registered: usize,
}

impl RouteSnapshot {
    /// Destination ids for `source`, empty when it has no routes.
    pub fn destinations(&self, source: &ComponentId) -> Vec<ComponentId> {
        self.entries
            .iter()
            .find(|entry| entry.source == *source)
            .map(|entry| entry.destinations.iter().map(|d| d.id).collect())
            .unwrap_or_default()
    }

    /// Total number of source → destination edges.
    pub fn route_count(&self) -> usize {
        self.entries.iter().map(|e| e.destinations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destinations that can no longer be trusted: unregistered ones and
    /// registered ones whose owner has dropped the component.
    pub fn stale_targets(&self) -> impl Iterator<Item = (&ComponentId, &RouteTarget)> {
        self.entries.iter().flat_map(|entry| {
            entry
                .destinations
                .iter()
                .filter(|d| !d.registered || !d.live)
                .map(move |d| (&entry.source, d))
        })
    }
}

impl fmt::Display for RouteSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "(no routes, {} registered)", self.registered);
        }
        for entry in &self.entries {
            write!(f, "{} ->", entry.source)?;
            for (i, target) in entry.destinations.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{}{}", sep, target.id)?;
                if !target.registered {
                    write!(f, " (unregistered)")?;
                } else if !target.live {
                    write!(f, " (dropped)")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
