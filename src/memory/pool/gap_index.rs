/*!
 * Gap Index
 * Size-sorted index over a pool's free segments
 */

use crate::core::config::GrowthPolicy;
use crate::core::errors::{PoolResult, Resource};
use crate::core::types::{NodeIndex, Offset, Size};
use crate::memory::traits::try_grow;
use tracing::{debug, warn};

/// Free segment entry, ordered by `(size, offset)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct GapEntry {
    pub size: Size,
    pub offset: Offset,
    pub node: NodeIndex,
}

impl GapEntry {
    #[inline]
    fn sorts_before(&self, other: &GapEntry) -> bool {
        self.size < other.size || (self.size == other.size && self.offset < other.offset)
    }
}

/// Ascending array of gaps, smallest first, lowest address on ties
///
/// Sorted order is kept incrementally: inserts bubble the new tail entry into
/// place and removals shift the tail left, so no global sort ever runs.
#[derive(Debug)]
pub(super) struct GapIndex {
    entries: Vec<GapEntry>,
    capacity: usize,
    growth: GrowthPolicy,
}

impl GapIndex {
    pub fn new(capacity: usize, growth: GrowthPolicy) -> PoolResult<Self> {
        let mut entries = Vec::new();
        try_grow(&mut entries, capacity, Resource::GapIndex)?;
        Ok(Self {
            entries,
            capacity,
            growth,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow when occupancy is above the fill factor
    ///
    /// A failed growth is only an error when the index is completely full.
    pub fn ensure_room(&mut self) -> PoolResult<()> {
        if !self.growth.exceeded(self.entries.len(), self.capacity) {
            return Ok(());
        }

        let new = self.growth.next_capacity(self.capacity);
        let additional = new - self.entries.len();
        match try_grow(&mut self.entries, additional, Resource::GapIndex) {
            Ok(()) => {
                debug!(from = self.capacity, to = new, "gap index expanded");
                self.capacity = new;
                Ok(())
            }
            Err(e) if self.entries.len() >= self.capacity => Err(e),
            Err(e) => {
                warn!(gaps = self.entries.len(), capacity = self.capacity, error = %e, "gap index growth failed, continuing with spare entries");
                Ok(())
            }
        }
    }

    /// Append a gap and bubble it left into sorted position
    pub fn insert(&mut self, size: Size, offset: Offset, node: NodeIndex) -> PoolResult<()> {
        self.ensure_room()?;
        self.entries.push(GapEntry { size, offset, node });

        let mut i = self.entries.len() - 1;
        while i > 0 && self.entries[i].sorts_before(&self.entries[i - 1]) {
            self.entries.swap(i, i - 1);
            i -= 1;
        }
        Ok(())
    }

    /// Drop the entry referring to `node`, shifting later entries left
    ///
    /// Returns the removed entry, or `None` if `node` is not indexed.
    pub fn remove(&mut self, node: NodeIndex) -> Option<GapEntry> {
        let position = self.entries.iter().position(|entry| entry.node == node)?;
        Some(self.entries.remove(position))
    }

    /// Smallest gap of at least `size` bytes
    pub fn smallest_fit(&self, size: Size) -> Option<NodeIndex> {
        self.entries
            .iter()
            .find(|entry| entry.size >= size)
            .map(|entry| entry.node)
    }

    /// Size of the largest gap, 0 when the pool is full
    pub fn largest(&self) -> Size {
        self.entries.last().map_or(0, |entry| entry.size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GapEntry> {
        self.entries.iter()
    }

    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].sorts_before(&pair[1]))
    }
}
