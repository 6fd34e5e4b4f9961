/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::memory::{PoolHandle, SegmentRef};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Backing structure whose allocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Buffer,
    NodeTable,
    GapIndex,
    Registry,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Buffer => write!(f, "backing buffer"),
            Resource::NodeTable => write!(f, "node table"),
            Resource::GapIndex => write!(f, "gap index"),
            Resource::Registry => write!(f, "pool registry"),
        }
    }
}

/// Allocator errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("Pool registry is already initialized")]
    #[diagnostic(
        code(registry::already_initialized),
        help("Call registry_shutdown() before initializing again.")
    )]
    AlreadyInitialized,

    #[error("Pool registry is not initialized")]
    #[diagnostic(
        code(registry::not_initialized),
        help("Call registry_init() before opening pools.")
    )]
    NotInitialized,

    #[error("{open} pool(s) still open")]
    #[diagnostic(
        code(registry::pools_still_open),
        help("Close every pool before shutting the registry down.")
    )]
    PoolsStillOpen { open: usize },

    #[error("Out of memory: could not allocate {requested} bytes for the {resource}")]
    #[diagnostic(
        code(pool::out_of_memory),
        help("The process heap refused the request. Prior pool state is unchanged.")
    )]
    OutOfMemory { requested: usize, resource: Resource },

    #[error("Pool is not empty: {allocations} allocation(s), {gaps} gap(s)")]
    #[diagnostic(
        code(pool::not_empty),
        help("Deallocate every segment before closing the pool.")
    )]
    NotEmpty { allocations: usize, gaps: usize },

    #[error("No free segment fits {requested} bytes (largest gap: {largest_gap} bytes)")]
    #[diagnostic(
        code(pool::no_fit),
        help("Free segments or open a larger pool, then retry.")
    )]
    NoFit { requested: usize, largest_gap: usize },

    #[error("Segment {0} does not belong to this pool")]
    #[diagnostic(code(pool::not_found))]
    NotFound(SegmentRef),

    #[error("Segment {0} is already free")]
    #[diagnostic(
        code(pool::double_free),
        help("The reference is stale: it was deallocated earlier.")
    )]
    DoubleFree(SegmentRef),

    #[error("Pool {0} is not open")]
    #[diagnostic(
        code(registry::unknown_pool),
        help("The pool was closed or the handle comes from another registry.")
    )]
    UnknownPool(PoolHandle),

    #[error("Zero-sized pools and segments are not supported")]
    #[diagnostic(code(pool::invalid_size))]
    InvalidSize,

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(config::invalid))]
    InvalidConfig(String),

    #[error("Pool bookkeeping is corrupted: {0}")]
    #[diagnostic(code(pool::corruption))]
    Corruption(String),
}

impl PoolError {
    pub(crate) fn out_of_memory(requested: usize, resource: Resource) -> Self {
        PoolError::OutOfMemory {
            requested,
            resource,
        }
    }
}
