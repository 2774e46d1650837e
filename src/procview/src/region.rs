//! Region types
//!
//! Address-range value types shared by the catalog and the backends.

use serde::Serialize;

/// A half-open byte range `[start, start + size)` in a foreign address space.
///
/// Regions are ordered by start address. [`Region::INVALID`] is the sentinel
/// for "no region", used by address resolution when an address falls outside
/// every known mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Region {
    pub start: u64,
    pub size: u64,
}

impl Region {
    /// Sentinel denoting "no region".
    pub const INVALID: Region = Region {
        start: u64::MAX,
        size: 0,
    };

    pub fn new(start: u64, size: u64) -> Self {
        Region { start, size }
    }

    /// One past the last address of the range.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn is_invalid(&self) -> bool {
        *self == Region::INVALID
    }

    /// True if the two half-open ranges intersect.
    pub fn overlaps(&self, other: Region) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// True if `address` lies inside `[start, start + size)`.
    pub fn contains(&self, address: u64) -> bool {
        self.overlaps(Region::new(address, 1))
    }
}

/// A catalog entry: a region plus a human-readable name.
///
/// The name is a module file name, an OS-reported mapping label (`[heap]`,
/// a mapped file path), or a label synthesized from the range's
/// classification flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    pub region: Region,
    pub name: String,
}

impl MemoryRegion {
    pub fn new(region: Region, name: impl Into<String>) -> Self {
        MemoryRegion {
            region,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_end() {
        let region = Region::new(0x1000, 0x100);
        assert_eq!(region.end(), 0x1100);
    }

    #[test]
    fn test_region_contains_boundaries() {
        let region = Region::new(0x1000, 0x100);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x10ff));
        assert!(!region.contains(0x0fff));
        assert!(!region.contains(0x1100));
    }

    #[test]
    fn test_region_overlaps() {
        let a = Region::new(0x1000, 0x100);
        assert!(a.overlaps(Region::new(0x10f0, 0x100)));
        assert!(a.overlaps(Region::new(0x0f00, 0x101)));
        assert!(!a.overlaps(Region::new(0x1100, 0x100)));
        assert!(!a.overlaps(Region::new(0x0f00, 0x100)));
    }

    #[test]
    fn test_region_zero_size_never_overlaps() {
        let empty = Region::new(0x1000, 0);
        assert!(!empty.overlaps(Region::new(0x1000, 0x100)));
        assert!(!Region::new(0x1000, 0x100).overlaps(empty));
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(Region::INVALID.is_invalid());
        assert!(!Region::INVALID.contains(0));
        assert!(!Region::new(0, 0x1000).is_invalid());
    }

    #[test]
    fn test_region_ordering_by_start() {
        let mut regions = vec![
            Region::new(0x3000, 0x10),
            Region::new(0x1000, 0x10),
            Region::new(0x2000, 0x10),
        ];
        regions.sort();
        assert_eq!(regions[0].start, 0x1000);
        assert_eq!(regions[2].start, 0x3000);
    }
}
