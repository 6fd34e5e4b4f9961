/*!
 * Memory Module
 * Pools, their registry, and the process-wide facade
 */

pub mod global;
pub mod pool;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use global::{
    pool_allocate, pool_close, pool_deallocate, pool_inspect, pool_open, pool_stats,
    registry_init, registry_init_with, registry_initialized, registry_shutdown, with_pool,
};
pub use pool::{Pool, Segments};
pub use registry::PoolRegistry;
pub use traits::{BufferSource, HeapBuffers};
pub use types::*;
