/*!
 * Memory Traits
 * Boundary to the environment's heap
 */

use crate::core::errors::{PoolError, PoolResult, Resource};
use crate::core::types::Size;
use tracing::error;

/// Supplier of raw backing buffers for pools
///
/// The allocator never manages memory below this boundary: a pool owns the
/// returned buffer and releases it by dropping it on close.
pub trait BufferSource: Send + Sync {
    /// Obtain a zero-filled buffer of exactly `size` bytes
    fn acquire(&self, size: Size) -> PoolResult<Box<[u8]>>;
}

/// Default source backed by the global allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBuffers;

impl BufferSource for HeapBuffers {
    fn acquire(&self, size: Size) -> PoolResult<Box<[u8]>> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|e| {
                error!(size, error = %e, "backing buffer allocation failed");
                PoolError::out_of_memory(size, Resource::Buffer)
            })?;
        buffer.resize(size, 0u8);
        Ok(buffer.into_boxed_slice())
    }
}

/// Fallible growth for the allocator's bookkeeping arrays
pub(crate) fn try_grow<T>(vec: &mut Vec<T>, additional: usize, resource: Resource) -> PoolResult<()> {
    vec.try_reserve_exact(additional).map_err(|e| {
        let requested = additional.saturating_mul(std::mem::size_of::<T>());
        error!(%resource, requested, error = %e, "bookkeeping growth failed");
        PoolError::out_of_memory(requested, resource)
    })
}
