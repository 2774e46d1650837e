//! Region catalog
//!
//! The address-ordered collection of named regions describing an attached
//! process's modules and mappings, plus address-to-region resolution.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::region::{MemoryRegion, Region};

/// Ordered collection of [`MemoryRegion`] entries, unique by start address.
///
/// Entries are iterated in address order regardless of insertion order. The
/// OS module list and memory-map list may describe overlapping ranges; the
/// catalog stores both and lookups resolve overlap by first match in
/// iteration order. The first entry inserted at a given start address wins,
/// so the refresh inserts module entries before mapping entries to give
/// modules precedence.
///
/// A refresh always clears and fully rebuilds the catalog; there is no
/// incremental update.
#[derive(Debug, Default, Clone)]
pub struct RegionCatalog {
    entries: BTreeMap<u64, MemoryRegion>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        RegionCatalog::default()
    }

    /// Insert an entry, keeping any existing entry with the same start
    /// address. Returns false when the start address was already taken.
    pub fn insert(&mut self, entry: MemoryRegion) -> bool {
        match self.entries.entry(entry.region.start) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Clear and repopulate from the two enumeration sources. Modules go in
    /// first so they win start-address collisions against plain mappings.
    pub fn rebuild(&mut self, modules: Vec<MemoryRegion>, mappings: Vec<MemoryRegion>) {
        self.entries.clear();
        for entry in modules.into_iter().chain(mappings) {
            self.insert(entry);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.entries.values()
    }

    /// First entry (in address order) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&MemoryRegion> {
        self.iter().find(|entry| entry.name == name)
    }

    /// Resolve an address against the catalog.
    ///
    /// Returns `(region, true)` for the first cataloged entry containing the
    /// address. For an address between two cataloged entries, returns the
    /// synthesized gap region spanning from the end of the preceding entry
    /// to the start of the following one, with `false`. Returns
    /// `(Region::INVALID, false)` when the address precedes every entry or
    /// no following entry exists.
    pub fn resolve_region(&self, address: u64) -> (Region, bool) {
        for entry in self.iter() {
            if entry.region.contains(address) {
                return (entry.region, true);
            }
        }

        let mut previous: Option<Region> = None;
        for entry in self.iter() {
            if address < entry.region.start {
                return match previous {
                    Some(prev) => (
                        Region::new(prev.end(), entry.region.start - prev.end()),
                        false,
                    ),
                    None => (Region::INVALID, false),
                };
            }
            previous = Some(entry.region);
        }

        (Region::INVALID, false)
    }
}
