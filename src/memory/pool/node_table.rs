/*!
 * Node Table
 * Recyclable arena of segment descriptors linked in address order
 */

use crate::core::config::GrowthPolicy;
use crate::core::errors::{PoolResult, Resource};
use crate::core::types::{NodeIndex, Offset, Size};
use crate::memory::traits::try_grow;
use std::ops::{Index, IndexMut};
use tracing::{debug, warn};

/// Slot holding the segment at offset 0
///
/// Coalescing always keeps the lower-address node, so this slot is never
/// released while the pool is open.
pub(super) const HEAD: NodeIndex = 0;

/// Descriptor of one contiguous byte range of the pool buffer
#[derive(Debug, Clone, Default)]
pub(super) struct SegmentNode {
    pub offset: Offset,
    pub size: Size,
    pub allocated: bool,
    /// Slot occupancy, not segment state: `false` means free for reuse
    pub in_use: bool,
    pub prev: Option<NodeIndex>,
    pub next: Option<NodeIndex>,
    pub generation: u64,
}

impl SegmentNode {
    #[inline]
    pub fn is_gap(&self) -> bool {
        self.in_use && !self.allocated
    }

    #[inline]
    pub fn end(&self) -> Offset {
        self.offset + self.size
    }
}

#[derive(Debug)]
pub(super) struct NodeTable {
    slots: Vec<SegmentNode>,
    used: usize,
    growth: GrowthPolicy,
}

impl NodeTable {
    /// Allocate `capacity` unused slots and seed the head with one free
    /// segment spanning `total_size` bytes
    pub fn new(capacity: usize, growth: GrowthPolicy, total_size: Size) -> PoolResult<Self> {
        let mut slots = Vec::new();
        try_grow(&mut slots, capacity, Resource::NodeTable)?;
        slots.resize_with(capacity, SegmentNode::default);

        slots[HEAD] = SegmentNode {
            offset: 0,
            size: total_size,
            allocated: false,
            in_use: true,
            prev: None,
            next: None,
            generation: 0,
        };

        Ok(Self {
            slots,
            used: 1,
            growth,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Node at `index` if that slot currently holds a segment
    pub fn get(&self, index: NodeIndex) -> Option<&SegmentNode> {
        self.slots.get(index).filter(|node| node.in_use)
    }

    /// Grow when occupancy is above the fill factor
    ///
    /// A failed growth is only an error when no vacant slot remains.
    pub fn ensure_room(&mut self) -> PoolResult<()> {
        if !self.growth.exceeded(self.used, self.capacity()) {
            return Ok(());
        }
        match self.grow() {
            Err(e) if self.used >= self.capacity() => Err(e),
            Err(e) => {
                warn!(used = self.used, capacity = self.capacity(), error = %e, "node table growth failed, continuing with spare slots");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn grow(&mut self) -> PoolResult<()> {
        let old = self.capacity();
        let new = self.growth.next_capacity(old);
        try_grow(&mut self.slots, new - old, Resource::NodeTable)?;
        self.slots.resize_with(new, SegmentNode::default);
        debug!(from = old, to = new, "node table expanded");
        Ok(())
    }

    /// Lowest unused slot, growing the table when every slot is taken
    ///
    /// Does not occupy the slot; `split_after` does.
    pub fn vacant_slot(&mut self) -> PoolResult<NodeIndex> {
        if let Some(index) = self.slots.iter().position(|node| !node.in_use) {
            return Ok(index);
        }
        let index = self.capacity();
        self.grow()?;
        Ok(index)
    }

    /// Turn `slot` into a free segment of `size` bytes placed right after
    /// `index` in address order
    pub fn split_after(&mut self, index: NodeIndex, slot: NodeIndex, size: Size) {
        let next = self.slots[index].next;
        let offset = self.slots[index].end();

        let generation = self.slots[slot].generation;
        self.slots[slot] = SegmentNode {
            offset,
            size,
            allocated: false,
            in_use: true,
            prev: Some(index),
            next,
            generation,
        };

        if let Some(next) = next {
            self.slots[next].prev = Some(slot);
        }
        self.slots[index].next = Some(slot);
        self.used += 1;
    }

    /// Merge the successor of `index` into it and recycle the successor's slot
    ///
    /// Returns the recycled slot.
    pub fn absorb_next(&mut self, index: NodeIndex) -> Option<NodeIndex> {
        let victim = self.slots[index].next?;
        let (size, next) = {
            let node = &self.slots[victim];
            (node.size, node.next)
        };

        self.slots[index].size += size;
        self.slots[index].next = next;
        if let Some(next) = next {
            self.slots[next].prev = Some(index);
        }

        // Keep the generation so references into the old slot stay stale
        let generation = self.slots[victim].generation;
        self.slots[victim] = SegmentNode {
            generation,
            ..SegmentNode::default()
        };
        self.used -= 1;
        Some(victim)
    }

    /// Walk the segments from offset 0 upwards
    pub fn address_order(&self) -> AddressOrder<'_> {
        AddressOrder {
            table: self,
            cursor: Some(HEAD),
        }
    }

    /// Every occupied slot in slot order
    pub fn occupied(&self) -> impl Iterator<Item = (NodeIndex, &SegmentNode)> {
        self.slots.iter().enumerate().filter(|(_, node)| node.in_use)
    }
}

impl Index<NodeIndex> for NodeTable {
    type Output = SegmentNode;

    #[inline]
    fn index(&self, index: NodeIndex) -> &SegmentNode {
        &self.slots[index]
    }
}

impl IndexMut<NodeIndex> for NodeTable {
    #[inline]
    fn index_mut(&mut self, index: NodeIndex) -> &mut SegmentNode {
        &mut self.slots[index]
    }
}

/// Linked-list traversal in address order
#[derive(Clone)]
pub(super) struct AddressOrder<'a> {
    table: &'a NodeTable,
    cursor: Option<NodeIndex>,
}

impl<'a> Iterator for AddressOrder<'a> {
    type Item = (NodeIndex, &'a SegmentNode);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = &self.table.slots[index];
        self.cursor = node.next;
        Some((index, node))
    }
}
