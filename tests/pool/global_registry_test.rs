/*!
 * Process-wide Registry Tests
 * Serialized because they share one registry
 */

use pretty_assertions::assert_eq;
use segment_pool::{
    pool_allocate, pool_close, pool_deallocate, pool_inspect, pool_open, pool_stats,
    registry_init, registry_init_with, registry_initialized, registry_shutdown, with_pool,
    AllocPolicy, HeapBuffers, PoolError, RegistryConfig, SegmentInfo,
};
use serial_test::serial;

#[test]
#[serial]
fn test_global_lifecycle() {
    assert!(!registry_initialized());
    assert_eq!(registry_shutdown(), Err(PoolError::NotInitialized));
    assert_eq!(pool_open(64, AllocPolicy::FirstFit), Err(PoolError::NotInitialized));

    registry_init().unwrap();
    assert_eq!(registry_init(), Err(PoolError::AlreadyInitialized));
    assert!(registry_initialized());

    let pool = pool_open(64, AllocPolicy::FirstFit).unwrap();
    assert_eq!(registry_shutdown(), Err(PoolError::PoolsStillOpen { open: 1 }));

    pool_close(pool).unwrap();
    registry_shutdown().unwrap();
    assert!(!registry_initialized());
}

#[test]
#[serial]
fn test_global_allocate_and_inspect() {
    registry_init_with(RegistryConfig::compact(), Box::new(HeapBuffers)).unwrap();
    let pool = pool_open(1024, AllocPolicy::BestFit).unwrap();

    let seg = pool_allocate(pool, 100).unwrap();
    assert_eq!(
        pool_inspect(pool).unwrap(),
        vec![
            SegmentInfo { offset: 0, size: 100, allocated: true },
            SegmentInfo { offset: 100, size: 924, allocated: false },
        ]
    );
    assert_eq!(
        pool_allocate(pool, 1000),
        Err(PoolError::NoFit { requested: 1000, largest_gap: 924 })
    );

    let written = with_pool(pool, |p| {
        p.segment_bytes_mut(&seg)?.fill(7);
        Ok::<_, PoolError>(p.segment_bytes(&seg)?.iter().map(|&b| b as usize).sum::<usize>())
    })
    .unwrap()
    .unwrap();
    assert_eq!(written, 700);

    pool_deallocate(pool, seg).unwrap();
    assert_eq!(pool_stats(pool).unwrap().num_gaps, 1);
    assert_eq!(pool_deallocate(pool, seg), Err(PoolError::DoubleFree(seg)));

    pool_close(pool).unwrap();
    assert!(matches!(with_pool(pool, |_| ()), Err(PoolError::UnknownPool(_))));
    registry_shutdown().unwrap();
}

#[test]
#[serial]
fn test_global_close_refuses_live_pool() {
    registry_init().unwrap();
    let pool = pool_open(100, AllocPolicy::FirstFit).unwrap();
    let a = pool_allocate(pool, 50).unwrap();
    let b = pool_allocate(pool, 50).unwrap();

    assert_eq!(
        pool_close(pool),
        Err(PoolError::NotEmpty { allocations: 2, gaps: 0 })
    );

    pool_deallocate(pool, b).unwrap();
    pool_deallocate(pool, a).unwrap();
    pool_close(pool).unwrap();
    registry_shutdown().unwrap();
}
