/*!
 * Segment Pool Library
 * Memory-pool allocator with first-fit and best-fit placement
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::config::{GrowthPolicy, PoolConfig, RegistryConfig};
pub use crate::core::errors::{PoolError, PoolResult, Resource};
pub use memory::*;
pub use monitoring::init_tracing;
