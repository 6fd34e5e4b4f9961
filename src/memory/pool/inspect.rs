/*!
 * Pool Inspection
 * Segment listing, statistics and invariant checks
 */

use super::node_table::AddressOrder;
use super::Pool;
use crate::core::errors::{PoolError, PoolResult};
use crate::memory::types::{PoolStats, SegmentInfo};
use std::collections::BTreeSet;

/// Lazy walk over a pool's segments in address order
///
/// A clone resumes from the same position; calling `Pool::inspect` again
/// starts over from offset 0.
#[derive(Clone)]
pub struct Segments<'a> {
    inner: AddressOrder<'a>,
}

impl Iterator for Segments<'_> {
    type Item = SegmentInfo;

    fn next(&mut self) -> Option<SegmentInfo> {
        self.inner.next().map(|(_, node)| SegmentInfo {
            offset: node.offset,
            size: node.size,
            allocated: node.allocated,
        })
    }
}

impl Pool {
    /// Every segment from offset 0 upwards, without mutating the pool
    pub fn inspect(&self) -> Segments<'_> {
        Segments {
            inner: self.nodes.address_order(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            policy: self.policy,
            total_size: self.total_size,
            used_size: self.used_size,
            num_allocations: self.num_allocations,
            num_gaps: self.gaps.len(),
            largest_gap: self.gaps.largest(),
            node_slots: self.nodes.capacity(),
            used_nodes: self.nodes.used(),
            gap_slots: self.gaps.capacity(),
        }
    }

    /// Check every bookkeeping invariant, reporting the first violation
    ///
    /// - the segment list tiles `[0, total_size)` with back links intact
    /// - no two gaps are adjacent
    /// - the gap index holds exactly the free segments, sorted
    /// - counters agree with the list
    pub fn verify(&self) -> PoolResult<()> {
        let corrupt = |reason: String| Err(PoolError::Corruption(reason));

        let mut expected_offset = 0;
        let mut previous: Option<(usize, bool)> = None;
        let mut walked = 0;
        let mut allocations = 0;
        let mut used = 0;
        let mut free_nodes = BTreeSet::new();

        for (index, node) in self.nodes.address_order() {
            walked += 1;
            if walked > self.nodes.used() {
                return corrupt(format!("segment list longer than {} nodes", self.nodes.used()));
            }
            if !node.in_use {
                return corrupt(format!("node {index} is linked but unused"));
            }
            if node.offset != expected_offset {
                return corrupt(format!(
                    "node {index} starts at {} instead of {expected_offset}",
                    node.offset
                ));
            }
            if node.size == 0 {
                return corrupt(format!("node {index} is empty"));
            }
            if node.prev != previous.map(|(p, _)| p) {
                return corrupt(format!("node {index} has a broken back link"));
            }
            if let Some((prev, prev_allocated)) = previous {
                if !prev_allocated && !node.allocated {
                    return corrupt(format!("gaps {prev} and {index} are adjacent"));
                }
            }

            if node.allocated {
                allocations += 1;
                used += node.size;
            } else {
                free_nodes.insert(index);
            }
            expected_offset = node.end();
            previous = Some((index, node.allocated));
        }

        if expected_offset != self.total_size {
            return corrupt(format!(
                "segments cover {expected_offset} of {} bytes",
                self.total_size
            ));
        }
        if walked != self.nodes.used() || self.nodes.occupied().count() != walked {
            return corrupt(format!(
                "{walked} linked nodes but {} slots in use",
                self.nodes.used()
            ));
        }
        if allocations != self.num_allocations || used != self.used_size {
            return corrupt(format!(
                "counters say {} allocations / {} bytes, list says {allocations} / {used}",
                self.num_allocations, self.used_size
            ));
        }

        let indexed: BTreeSet<_> = self.gaps.iter().map(|entry| entry.node).collect();
        if indexed != free_nodes || indexed.len() != self.gaps.len() {
            return corrupt(format!(
                "gap index {indexed:?} does not match free nodes {free_nodes:?}"
            ));
        }
        for entry in self.gaps.iter() {
            let node = &self.nodes[entry.node];
            if node.size != entry.size || node.offset != entry.offset {
                return corrupt(format!("gap entry for node {} is stale", entry.node));
            }
        }
        if !self.gaps.is_sorted() {
            return corrupt("gap index is out of order".into());
        }
        Ok(())
    }
}
