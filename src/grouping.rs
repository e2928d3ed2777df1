//! Merges resources sharing a position into marker groups, the way the map
//! screen wants them: one marker per location, members in arrival order.

use std::collections::HashMap;

use crate::types::{LocationKey, MarkerGroup, Resource};

/// Index of marker groups keyed by location. Groups are created on the first
/// resource seen at a key and only ever grow; first-seen order is preserved
/// so UI re-renders stay stable and appendable.
#[derive(Debug, Default)]
pub struct LocationGroupingIndex {
    by_key: HashMap<LocationKey, usize>,
    groups: Vec<MarkerGroup>,
}

impl LocationGroupingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource, appending it to the group at its location or creating
    /// a new group. Returns the key of the group the resource landed in.
    pub fn add(&mut self, resource: Resource) -> LocationKey {
        let key = resource.location_key();
        match self.by_key.get(&key) {
            Some(&index) => self.groups[index].members.push(resource),
            None => {
                self.by_key.insert(key, self.groups.len());
                self.groups.push(MarkerGroup {
                    key,
                    members: vec![resource],
                });
            }
        }
        key
    }

    pub fn extend(&mut self, resources: impl IntoIterator<Item = Resource>) {
        for resource in resources {
            self.add(resource);
        }
    }

    pub fn get(&self, key: LocationKey) -> Option<&MarkerGroup> {
        self.by_key.get(&key).map(|&index| &self.groups[index])
    }

    /// Groups in first-seen order.
    pub fn groups(&self) -> &[MarkerGroup] {
        &self.groups
    }

    /// Number of groups, not of resources.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
        self.groups.clear();
    }
}
