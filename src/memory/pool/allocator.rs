/*!
 * Pool Allocator Implementation
 * Placement, splitting and coalescing
 */

use super::Pool;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{NodeIndex, Size};
use crate::memory::types::{AllocPolicy, SegmentRef};
use tracing::{debug, warn};

impl Pool {
    /// Allocate `size` bytes according to the pool's placement policy
    ///
    /// Every fallible step runs before the first mutation, so an error leaves
    /// the pool exactly as it was.
    pub fn allocate(&mut self, size: Size) -> PoolResult<SegmentRef> {
        if size == 0 {
            return Err(PoolError::InvalidSize);
        }

        self.nodes.ensure_room()?;

        let Some(chosen) = self.find_gap(size) else {
            let largest_gap = self.gaps.largest();
            warn!(pool = %self.id, requested = size, largest_gap, policy = %self.policy, "no gap fits request");
            return Err(PoolError::NoFit {
                requested: size,
                largest_gap,
            });
        };

        let remaining = self.nodes[chosen].size - size;
        let spare = if remaining > 0 {
            Some(self.nodes.vacant_slot()?)
        } else {
            None
        };

        self.gaps.remove(chosen);
        let node = &mut self.nodes[chosen];
        node.allocated = true;
        node.size = size;
        node.generation += 1;
        let segment = SegmentRef {
            pool: self.id,
            node: chosen,
            offset: node.offset,
            size,
            generation: node.generation,
        };

        if let Some(slot) = spare {
            self.nodes.split_after(chosen, slot, remaining);
            // The chosen gap was just removed, so the index has room
            self.gaps.insert(remaining, self.nodes[slot].offset, slot)?;
            debug!(pool = %self.id, offset = segment.offset + size, remaining, "split gap");
        }

        self.num_allocations += 1;
        self.used_size += size;

        debug!(
            pool = %self.id,
            offset = segment.offset,
            size,
            used = self.used_size,
            gaps = self.gaps.len(),
            "allocated segment"
        );
        Ok(segment)
    }

    /// Return a segment to the pool and coalesce it with free neighbours
    pub fn deallocate(&mut self, segment: SegmentRef) -> PoolResult<()> {
        if let Err(e) = self.resolve(&segment) {
            warn!(pool = %self.id, %segment, error = %e, "rejected deallocation");
            return Err(e);
        }

        // At most one net gap is added below
        self.gaps.ensure_room()?;

        let mut current = segment.node;
        self.nodes[current].allocated = false;
        self.num_allocations -= 1;
        self.used_size -= segment.size;

        if let Some(next) = self.free_neighbour(self.nodes[current].next) {
            self.gaps.remove(next);
            self.nodes.absorb_next(current);
            debug!(pool = %self.id, offset = segment.offset, "coalesced with next gap");
        }

        if let Some(prev) = self.free_neighbour(self.nodes[current].prev) {
            self.gaps.remove(prev);
            self.nodes.absorb_next(prev);
            current = prev;
            debug!(pool = %self.id, offset = self.nodes[prev].offset, "coalesced with previous gap");
        }

        let merged = &self.nodes[current];
        let (size, offset) = (merged.size, merged.offset);
        self.gaps.insert(size, offset, current)?;

        debug!(
            pool = %self.id,
            offset = segment.offset,
            size = segment.size,
            gap = size,
            used = self.used_size,
            gaps = self.gaps.len(),
            "deallocated segment"
        );
        Ok(())
    }

    fn find_gap(&self, size: Size) -> Option<NodeIndex> {
        match self.policy {
            AllocPolicy::FirstFit => self
                .nodes
                .address_order()
                .find(|(_, node)| !node.allocated && node.size >= size)
                .map(|(index, _)| index),
            AllocPolicy::BestFit => self.gaps.smallest_fit(size),
        }
    }

    fn free_neighbour(&self, neighbour: Option<NodeIndex>) -> Option<NodeIndex> {
        neighbour.filter(|&index| self.nodes[index].is_gap())
    }
}
