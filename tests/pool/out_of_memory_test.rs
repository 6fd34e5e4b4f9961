/*!
 * Out-of-memory Tests
 * Backing-buffer failures must leave the registry untouched
 */

use pretty_assertions::assert_eq;
use segment_pool::{
    AllocPolicy, BufferSource, HeapBuffers, PoolError, PoolRegistry, PoolResult, RegistryConfig,
    Resource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Heap source that refuses every request after a budget runs out
struct Budgeted {
    remaining: Arc<AtomicUsize>,
}

impl BufferSource for Budgeted {
    fn acquire(&self, size: usize) -> PoolResult<Box<[u8]>> {
        let granted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(size));
        match granted {
            Ok(_) => HeapBuffers.acquire(size),
            Err(_) => Err(PoolError::OutOfMemory {
                requested: size,
                resource: Resource::Buffer,
            }),
        }
    }
}

fn budgeted(bytes: usize) -> (PoolRegistry, Arc<AtomicUsize>) {
    let remaining = Arc::new(AtomicUsize::new(bytes));
    let mut registry = PoolRegistry::new();
    registry
        .initialize_with(
            RegistryConfig::default(),
            Box::new(Budgeted {
                remaining: Arc::clone(&remaining),
            }),
        )
        .unwrap();
    (registry, remaining)
}

#[test]
fn test_buffer_refusal_registers_nothing() {
    let (mut registry, _) = budgeted(0);

    assert_eq!(
        registry.open(64, AllocPolicy::FirstFit),
        Err(PoolError::OutOfMemory {
            requested: 64,
            resource: Resource::Buffer
        })
    );
    assert_eq!(registry.open_pools(), 0);
    assert!(registry.handles().is_empty());
    registry.shutdown().unwrap();
}

#[test]
fn test_budget_exhaustion_mid_sequence() {
    let (mut registry, remaining) = budgeted(150);

    let first = registry.open(100, AllocPolicy::BestFit).unwrap();
    assert!(matches!(
        registry.open(100, AllocPolicy::BestFit),
        Err(PoolError::OutOfMemory { resource: Resource::Buffer, .. })
    ));
    assert_eq!(remaining.load(Ordering::SeqCst), 50);

    // The refused open left the existing pool usable and the next slot free
    let seg = registry.allocate(first, 60).unwrap();
    let second = registry.open(50, AllocPolicy::FirstFit).unwrap();
    assert_eq!(second.slot(), 1);
    assert_eq!(registry.handles(), vec![first, second]);

    registry.deallocate(first, seg).unwrap();
    registry.close(first).unwrap();
    registry.close(second).unwrap();
    registry.shutdown().unwrap();
}

#[test]
fn test_bookkeeping_refusal_rolls_back_open() {
    let mut node_heavy = RegistryConfig::default();
    node_heavy.pool.node_table_capacity = usize::MAX / 2;
    let mut gap_heavy = RegistryConfig::default();
    gap_heavy.pool.gap_index_capacity = usize::MAX / 2;

    for (config, expected) in [(node_heavy, Resource::NodeTable), (gap_heavy, Resource::GapIndex)] {
        let mut registry = PoolRegistry::new();
        registry
            .initialize_with(config, Box::new(HeapBuffers))
            .unwrap();

        match registry.open(64, AllocPolicy::BestFit) {
            Err(PoolError::OutOfMemory { resource, .. }) => assert_eq!(resource, expected),
            other => panic!("expected OutOfMemory for {expected}, got {other:?}"),
        }
        assert_eq!(registry.open_pools(), 0);
        assert!(registry.handles().is_empty());
        registry.shutdown().unwrap();
    }
}

#[test]
fn test_heap_refuses_impossible_pool() {
    let mut registry = PoolRegistry::new();
    registry.initialize().unwrap();

    let result = registry.open(usize::MAX, AllocPolicy::FirstFit);
    assert!(matches!(
        result,
        Err(PoolError::OutOfMemory { requested: usize::MAX, resource: Resource::Buffer })
    ));
    assert_eq!(registry.open_pools(), 0);
    registry.shutdown().unwrap();
}
