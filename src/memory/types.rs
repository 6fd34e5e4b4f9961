/*!
 * Memory Types
 * Handles, references and reports exchanged with callers
 */

use crate::core::types::{NodeIndex, Offset, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placement policy used when choosing a gap for an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocPolicy {
    /// First sufficiently large gap in address order
    FirstFit,
    /// Smallest sufficiently large gap, lowest address on ties
    BestFit,
}

impl fmt::Display for AllocPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AllocPolicy::FirstFit => write!(f, "FIRST_FIT"),
            AllocPolicy::BestFit => write!(f, "BEST_FIT"),
        }
    }
}

/// Handle to a pool registered in a `PoolRegistry`
///
/// Wraps the registry slot. Slots are never reused while the registry is
/// initialized, so a handle to a closed pool stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolHandle(pub(crate) usize);

impl PoolHandle {
    /// Registry slot backing this handle
    pub fn slot(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to an allocated segment, returned by `Pool::allocate`
///
/// Only the issuing pool can create one. The generation detects references
/// that outlived their allocation after the node slot was recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentRef {
    pub(crate) pool: PoolHandle,
    pub(crate) node: NodeIndex,
    pub(crate) offset: Offset,
    pub(crate) size: Size,
    pub(crate) generation: u64,
}

impl SegmentRef {
    /// Pool that issued this segment
    pub fn pool(&self) -> PoolHandle {
        self.pool
    }

    /// Byte offset of the segment inside the pool buffer
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Segment length in bytes
    pub fn size(&self) -> Size {
        self.size
    }
}

impl fmt::Display for SegmentRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}@0x{:x}+{} (node {}, gen {})",
            self.pool, self.offset, self.size, self.node, self.generation
        )
    }
}

/// One entry of a pool inspection, in address order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    pub offset: Offset,
    pub size: Size,
    pub allocated: bool,
}

/// Pool statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub policy: AllocPolicy,
    pub total_size: Size,
    pub used_size: Size,
    pub num_allocations: usize,
    pub num_gaps: usize,
    pub largest_gap: Size,
    pub node_slots: usize,
    pub used_nodes: usize,
    pub gap_slots: usize,
}

impl PoolStats {
    /// Bytes not currently allocated
    pub fn free_size(&self) -> Size {
        self.total_size - self.used_size
    }

    /// Share of free bytes outside the largest gap, 0.0 when unfragmented
    pub fn fragmentation(&self) -> f64 {
        let free = self.free_size();
        if free == 0 {
            return 0.0;
        }
        1.0 - self.largest_gap as f64 / free as f64
    }
}
