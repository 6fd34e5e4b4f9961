/*!
 * Core Types
 * Common types used across the allocator
 */

/// Byte offset of a segment inside its pool's backing buffer
pub type Offset = usize;

/// Size type for memory operations
pub type Size = usize;

/// Index of a slot in a pool's node table
pub type NodeIndex = usize;
