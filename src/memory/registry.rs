/*!
 * Pool Registry
 *
 * Owns every open pool. Lifecycle: `Uninitialized -> Ready -> Uninitialized`;
 * pool operations outside `Ready` fail with `NotInitialized`.
 *
 * Slots are appended on open and emptied on close. They are never reused or
 * compacted while the registry is ready, so a handle outlives its pool only as
 * an `UnknownPool` error.
 */

use super::pool::{Pool, Segments};
use super::traits::{try_grow, BufferSource, HeapBuffers};
use super::types::{AllocPolicy, PoolHandle, PoolStats, SegmentRef};
use crate::core::config::RegistryConfig;
use crate::core::errors::{PoolError, PoolResult, Resource};
use crate::core::types::Size;
use tracing::{debug, info, instrument, warn};

enum RegistryState {
    Uninitialized,
    Ready(Store),
}

struct Store {
    slots: Vec<Option<Pool>>,
    capacity: usize,
    config: RegistryConfig,
    source: Box<dyn BufferSource>,
}

impl Store {
    fn open_pools(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Grow the slot array past the fill factor before registering
    fn ensure_room(&mut self) -> PoolResult<()> {
        let growth = self.config.growth;
        if !growth.exceeded(self.slots.len(), self.capacity) {
            return Ok(());
        }

        let new = growth.next_capacity(self.capacity);
        let additional = new - self.slots.len();
        match try_grow(&mut self.slots, additional, Resource::Registry) {
            Ok(()) => {
                debug!(from = self.capacity, to = new, "pool registry expanded");
                self.capacity = new;
                Ok(())
            }
            Err(e) if self.slots.len() >= self.capacity => Err(e),
            Err(e) => {
                warn!(pools = self.slots.len(), capacity = self.capacity, error = %e, "registry growth failed, continuing with spare slots");
                Ok(())
            }
        }
    }
}

/// Registry of open pools
pub struct PoolRegistry {
    state: RegistryState,
}

impl PoolRegistry {
    /// Create an uninitialized registry
    pub const fn new() -> Self {
        Self {
            state: RegistryState::Uninitialized,
        }
    }

    /// Initialize with default capacities and the process heap
    pub fn initialize(&mut self) -> PoolResult<()> {
        self.initialize_with(RegistryConfig::default(), Box::new(HeapBuffers))
    }

    pub fn initialize_with(
        &mut self,
        config: RegistryConfig,
        source: Box<dyn BufferSource>,
    ) -> PoolResult<()> {
        if let RegistryState::Ready(_) = self.state {
            return Err(PoolError::AlreadyInitialized);
        }
        config.validate()?;

        let mut slots = Vec::new();
        try_grow(&mut slots, config.registry_capacity, Resource::Registry)?;

        info!(
            capacity = config.registry_capacity,
            node_table_capacity = config.pool.node_table_capacity,
            gap_index_capacity = config.pool.gap_index_capacity,
            "pool registry initialized"
        );
        self.state = RegistryState::Ready(Store {
            slots,
            capacity: config.registry_capacity,
            config,
            source,
        });
        Ok(())
    }

    /// Release the registry; every pool must already be closed
    pub fn shutdown(&mut self) -> PoolResult<()> {
        let store = self.store()?;
        let open = store.open_pools();
        if open > 0 {
            warn!(open, "registry shutdown refused, pools still open");
            return Err(PoolError::PoolsStillOpen { open });
        }

        let registered = store.slots.len();
        self.state = RegistryState::Uninitialized;
        info!(registered, "pool registry shut down");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, RegistryState::Ready(_))
    }

    /// Number of open pools, 0 when uninitialized
    pub fn open_pools(&self) -> usize {
        self.store().map_or(0, Store::open_pools)
    }

    /// Slot capacity, 0 when uninitialized
    pub fn capacity(&self) -> usize {
        self.store().map_or(0, |store| store.capacity)
    }

    /// Handles of every open pool in registration order
    pub fn handles(&self) -> Vec<PoolHandle> {
        match &self.state {
            RegistryState::Ready(store) => store
                .slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_some())
                .map(|(i, _)| PoolHandle(i))
                .collect(),
            RegistryState::Uninitialized => Vec::new(),
        }
    }

    /// Open a pool of `size` bytes and register it
    ///
    /// Nothing is registered if any part of the pool cannot be allocated.
    pub fn open(&mut self, size: Size, policy: AllocPolicy) -> PoolResult<PoolHandle> {
        let store = self.store_mut()?;
        store.ensure_room()?;

        let handle = PoolHandle(store.slots.len());
        let pool = Pool::open(handle, size, policy, &store.config.pool, store.source.as_ref())
            .map_err(|e| {
                warn!(size, %policy, error = %e, "pool open failed");
                e
            })?;
        store.slots.push(Some(pool));
        Ok(handle)
    }

    /// Close an empty pool and release its buffer and bookkeeping
    #[instrument(level = "debug", skip(self))]
    pub fn close(&mut self, handle: PoolHandle) -> PoolResult<()> {
        let store = self.store_mut()?;
        let slot = store
            .slots
            .get_mut(handle.0)
            .filter(|slot| slot.is_some())
            .ok_or(PoolError::UnknownPool(handle))?;

        if let Some(pool) = slot.as_ref() {
            if let Err(e) = pool.check_closable() {
                warn!(pool = %handle, error = %e, "pool close refused");
                return Err(e);
            }
        }

        if let Some(pool) = slot.take() {
            info!(pool = %handle, size = pool.total_size(), "pool closed");
        }
        Ok(())
    }

    pub fn pool(&self, handle: PoolHandle) -> PoolResult<&Pool> {
        self.store()?
            .slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(PoolError::UnknownPool(handle))
    }

    pub fn pool_mut(&mut self, handle: PoolHandle) -> PoolResult<&mut Pool> {
        self.store_mut()?
            .slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(PoolError::UnknownPool(handle))
    }

    pub fn allocate(&mut self, handle: PoolHandle, size: Size) -> PoolResult<SegmentRef> {
        self.pool_mut(handle)?.allocate(size)
    }

    pub fn deallocate(&mut self, handle: PoolHandle, segment: SegmentRef) -> PoolResult<()> {
        self.pool_mut(handle)?.deallocate(segment)
    }

    pub fn inspect(&self, handle: PoolHandle) -> PoolResult<Segments<'_>> {
        Ok(self.pool(handle)?.inspect())
    }

    pub fn stats(&self, handle: PoolHandle) -> PoolResult<PoolStats> {
        Ok(self.pool(handle)?.stats())
    }

    fn store(&self) -> PoolResult<&Store> {
        match &self.state {
            RegistryState::Ready(store) => Ok(store),
            RegistryState::Uninitialized => Err(PoolError::NotInitialized),
        }
    }

    fn store_mut(&mut self) -> PoolResult<&mut Store> {
        match &mut self.state {
            RegistryState::Ready(store) => Ok(store),
            RegistryState::Uninitialized => Err(PoolError::NotInitialized),
        }
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
