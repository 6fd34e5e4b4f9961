/*!
 * Memory Pool
 *
 * One fixed-size arena carved out of a single backing buffer.
 *
 * ## Bookkeeping
 *
 * - **Node table**: recyclable slots describing every segment, linked by slot
 *   index in address order so table growth never invalidates links
 * - **Gap index**: free segments sorted by `(size, offset)`, searched by
 *   best-fit placement and for the largest gap
 *
 * ## Placement
 *
 * - **First fit**: walk the segment list from offset 0, take the first gap
 *   that is large enough
 * - **Best fit**: take the first gap index entry that is large enough, which
 *   is the smallest sufficient gap
 *
 * Allocation splits the chosen gap; deallocation coalesces with both
 * neighbours, so two free segments are never adjacent.
 */

mod allocator;
mod gap_index;
mod inspect;
mod node_table;

pub use inspect::Segments;

use crate::core::config::PoolConfig;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Size;
use crate::memory::traits::BufferSource;
use crate::memory::types::{AllocPolicy, PoolHandle, SegmentRef};
use gap_index::GapIndex;
use node_table::{NodeTable, HEAD};
use tracing::{info, instrument};

/// Memory pool
pub struct Pool {
    id: PoolHandle,
    buffer: Box<[u8]>,
    policy: AllocPolicy,
    total_size: Size,
    used_size: Size,
    num_allocations: usize,
    nodes: NodeTable,
    gaps: GapIndex,
}

impl Pool {
    /// Build a pool of `size` bytes seeded with a single free segment
    ///
    /// Any allocation failure drops what was already built, so nothing
    /// partial escapes.
    #[instrument(level = "debug", skip(config, source))]
    pub(crate) fn open(
        id: PoolHandle,
        size: Size,
        policy: AllocPolicy,
        config: &PoolConfig,
        source: &dyn BufferSource,
    ) -> PoolResult<Self> {
        if size == 0 {
            return Err(PoolError::InvalidSize);
        }

        let buffer = source.acquire(size)?;
        let nodes = NodeTable::new(config.node_table_capacity, config.growth, size)?;
        let mut gaps = GapIndex::new(config.gap_index_capacity, config.growth)?;
        gaps.insert(size, 0, HEAD)?;

        info!(pool = %id, size, %policy, "pool opened");
        Ok(Self {
            id,
            buffer,
            policy,
            total_size: size,
            used_size: 0,
            num_allocations: 0,
            nodes,
            gaps,
        })
    }

    /// Fail with `NotEmpty` unless the pool is one whole free segment
    pub(crate) fn check_closable(&self) -> PoolResult<()> {
        if self.gaps.len() == 1 && self.num_allocations == 0 {
            Ok(())
        } else {
            Err(PoolError::NotEmpty {
                allocations: self.num_allocations,
                gaps: self.gaps.len(),
            })
        }
    }

    pub fn handle(&self) -> PoolHandle {
        self.id
    }

    pub fn policy(&self) -> AllocPolicy {
        self.policy
    }

    pub fn total_size(&self) -> Size {
        self.total_size
    }

    pub fn used_size(&self) -> Size {
        self.used_size
    }

    pub fn num_allocations(&self) -> usize {
        self.num_allocations
    }

    pub fn num_gaps(&self) -> usize {
        self.gaps.len()
    }

    /// Bytes of an allocated segment
    pub fn segment_bytes(&self, segment: &SegmentRef) -> PoolResult<&[u8]> {
        self.resolve(segment)?;
        Ok(&self.buffer[segment.offset..segment.offset + segment.size])
    }

    /// Mutable bytes of an allocated segment
    pub fn segment_bytes_mut(&mut self, segment: &SegmentRef) -> PoolResult<&mut [u8]> {
        self.resolve(segment)?;
        Ok(&mut self.buffer[segment.offset..segment.offset + segment.size])
    }

    /// Check that `segment` names a live allocation of this pool
    fn resolve(&self, segment: &SegmentRef) -> PoolResult<()> {
        let out_of_range = segment
            .offset
            .checked_add(segment.size)
            .map_or(true, |end| end > self.total_size);
        if segment.pool != self.id || out_of_range {
            return Err(PoolError::NotFound(*segment));
        }
        match self.nodes.get(segment.node) {
            Some(node)
                if node.allocated
                    && node.offset == segment.offset
                    && node.size == segment.size
                    && node.generation == segment.generation =>
            {
                Ok(())
            }
            // Issued here but since freed: slot released, recycled or free
            _ => Err(PoolError::DoubleFree(*segment)),
        }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("total_size", &self.total_size)
            .field("used_size", &self.used_size)
            .field("num_allocations", &self.num_allocations)
            .field("num_gaps", &self.gaps.len())
            .finish()
    }
}
