/*!
 * Allocator Configuration
 *
 * Capacities and growth thresholds for the registry and for every pool it
 * opens. Defaults come from `core::limits`.
 */

use super::errors::{PoolError, PoolResult};
use super::limits::*;
use serde::{Deserialize, Serialize};

/// Fill-factor / expand-factor rule shared by every growable array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPolicy {
    /// Grow once `len / capacity` exceeds this ratio (default: 0.75)
    pub fill_factor: f64,

    /// Capacity multiplier on growth (default: 2)
    pub expand_factor: usize,
}

impl GrowthPolicy {
    /// Whether an array holding `len` items in `capacity` slots must grow
    ///
    /// A full array always grows, even with a fill factor of 1.0.
    #[inline]
    pub fn exceeded(&self, len: usize, capacity: usize) -> bool {
        len >= capacity || (len as f64 / capacity as f64) > self.fill_factor
    }

    /// Capacity after one expansion step
    #[inline]
    pub fn next_capacity(&self, capacity: usize) -> usize {
        capacity.saturating_mul(self.expand_factor).max(capacity + 1)
    }

    fn validate(&self) -> PoolResult<()> {
        if !(self.fill_factor > 0.0 && self.fill_factor <= 1.0) {
            return Err(PoolError::InvalidConfig(format!(
                "fill_factor must be in (0, 1], got {}",
                self.fill_factor
            )));
        }
        if self.expand_factor < 2 {
            return Err(PoolError::InvalidConfig(format!(
                "expand_factor must be at least 2, got {}",
                self.expand_factor
            )));
        }
        Ok(())
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            fill_factor: DEFAULT_FILL_FACTOR,
            expand_factor: DEFAULT_EXPAND_FACTOR,
        }
    }
}

/// Per-pool capacities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Initial node table slots (default: 40)
    pub node_table_capacity: usize,

    /// Initial gap index entries (default: 40)
    pub gap_index_capacity: usize,

    /// Growth rule for both structures
    pub growth: GrowthPolicy,
}

impl PoolConfig {
    pub fn validate(&self) -> PoolResult<()> {
        if self.node_table_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "node_table_capacity must be non-zero".into(),
            ));
        }
        if self.gap_index_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "gap_index_capacity must be non-zero".into(),
            ));
        }
        self.growth.validate()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            node_table_capacity: NODE_TABLE_INIT_CAPACITY,
            gap_index_capacity: GAP_INDEX_INIT_CAPACITY,
            growth: GrowthPolicy::default(),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Initial pool slots (default: 20)
    pub registry_capacity: usize,

    /// Growth rule for the registry slot array
    pub growth: GrowthPolicy,

    /// Settings applied to every pool opened through the registry
    pub pool: PoolConfig,
}

impl RegistryConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            registry_capacity: REGISTRY_INIT_CAPACITY,
            growth: GrowthPolicy::default(),
            pool: PoolConfig::default(),
        }
    }

    /// Tiny initial capacities so growth paths run early (testing only)
    pub fn compact() -> Self {
        Self {
            registry_capacity: 1,
            growth: GrowthPolicy::default(),
            pool: PoolConfig {
                node_table_capacity: 1,
                gap_index_capacity: 1,
                growth: GrowthPolicy::default(),
            },
        }
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> PoolResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.registry_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "registry_capacity must be non-zero".into(),
            ));
        }
        self.growth.validate()?;
        self.pool.validate()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}
