/*!
 * Allocator Limits and Constants
 *
 * Centralized location for the capacities and growth thresholds shared by the
 * pool registry, node tables and gap indexes.
 */

// =============================================================================
// GROWTH POLICY
// =============================================================================

/// Occupancy ratio above which a growable array is expanded
pub const DEFAULT_FILL_FACTOR: f64 = 0.75;

/// Capacity multiplier applied on each expansion
pub const DEFAULT_EXPAND_FACTOR: usize = 2;

// =============================================================================
// REGISTRY
// =============================================================================

/// Initial number of pool slots in the registry
pub const REGISTRY_INIT_CAPACITY: usize = 20;

// =============================================================================
// PER-POOL STRUCTURES
// =============================================================================

/// Initial number of segment-node slots in a pool's node table
pub const NODE_TABLE_INIT_CAPACITY: usize = 40;

/// Initial number of entries in a pool's gap index
pub const GAP_INDEX_INIT_CAPACITY: usize = 40;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Pool operations slower than this are reported at warn level (microseconds)
pub const SLOW_OPERATION_US: u128 = 10_000;
