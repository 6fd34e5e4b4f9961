/*!
 * Pool Invariant Tests
 * Property-based allocate / deallocate sequences
 */

use proptest::prelude::*;
use segment_pool::{
    AllocPolicy, HeapBuffers, PoolError, PoolRegistry, RegistryConfig, SegmentRef,
};

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    /// Free the live segment at this index modulo the live count
    Free(usize),
    /// Free a segment that was already freed
    FreeStale(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..200).prop_map(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Free),
        1 => any::<usize>().prop_map(Op::FreeStale),
    ]
}

fn policy() -> impl Strategy<Value = AllocPolicy> {
    prop_oneof![Just(AllocPolicy::FirstFit), Just(AllocPolicy::BestFit)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_bookkeeping_stays_consistent(
        policy in policy(),
        size in 64usize..2048,
        ops in prop::collection::vec(op(), 1..120),
    ) {
        let mut registry = PoolRegistry::new();
        registry
            .initialize_with(RegistryConfig::compact(), Box::new(HeapBuffers))
            .unwrap();
        let handle = registry.open(size, policy).unwrap();

        let mut live: Vec<SegmentRef> = Vec::new();
        let mut freed: Vec<SegmentRef> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate(request) => match registry.allocate(handle, request) {
                    Ok(seg) => {
                        prop_assert_eq!(seg.size(), request);
                        live.push(seg);
                    }
                    Err(PoolError::NoFit { requested, largest_gap }) => {
                        prop_assert_eq!(requested, request);
                        prop_assert!(largest_gap < request);
                        prop_assert_eq!(largest_gap, registry.stats(handle).unwrap().largest_gap);
                    }
                    Err(e) => prop_assert!(false, "unexpected error {}", e),
                },
                Op::Free(i) if !live.is_empty() => {
                    let seg = live.swap_remove(i % live.len());
                    registry.deallocate(handle, seg).unwrap();
                    freed.push(seg);
                }
                Op::FreeStale(i) if !freed.is_empty() => {
                    let seg = freed[i % freed.len()];
                    let before = registry.stats(handle).unwrap();
                    prop_assert_eq!(
                        registry.deallocate(handle, seg),
                        Err(PoolError::DoubleFree(seg))
                    );
                    prop_assert_eq!(registry.stats(handle).unwrap(), before);
                }
                _ => {}
            }

            let pool = registry.pool(handle).unwrap();
            prop_assert!(pool.verify().is_ok(), "{:?}", pool.verify());
            prop_assert_eq!(pool.num_allocations(), live.len());
            prop_assert_eq!(
                pool.used_size(),
                live.iter().map(SegmentRef::size).sum::<usize>()
            );

            let segments: Vec<_> = pool.inspect().collect();
            prop_assert_eq!(segments.iter().map(|s| s.size).sum::<usize>(), size);
            prop_assert!(segments
                .windows(2)
                .all(|w| w[0].allocated || w[1].allocated));
        }

        for seg in live.drain(..) {
            registry.deallocate(handle, seg).unwrap();
        }
        prop_assert_eq!(registry.pool(handle).unwrap().num_gaps(), 1);
        registry.close(handle).unwrap();
        registry.shutdown().unwrap();
    }

    #[test]
    fn prop_best_fit_picks_smallest_sufficient_gap(
        sizes in prop::collection::vec(1usize..64, 2..20),
        request in 1usize..64,
    ) {
        let total: usize = sizes.iter().sum::<usize>() * 2;
        let mut registry = PoolRegistry::new();
        registry.initialize().unwrap();
        let handle = registry.open(total, AllocPolicy::BestFit).unwrap();

        // Alternate gap / spacer so no two gaps merge
        let mut gaps = Vec::new();
        for &s in &sizes {
            gaps.push(registry.allocate(handle, s).unwrap());
            registry.allocate(handle, s).unwrap();
        }
        for seg in &gaps {
            registry.deallocate(handle, *seg).unwrap();
        }

        let candidates: Vec<(usize, usize)> = registry
            .inspect(handle)
            .unwrap()
            .filter(|s| !s.allocated && s.size >= request)
            .map(|s| (s.size, s.offset))
            .collect();

        match registry.allocate(handle, request) {
            Ok(seg) => {
                let best = candidates.iter().min().copied().unwrap();
                prop_assert_eq!(seg.offset(), best.1);
            }
            Err(PoolError::NoFit { .. }) => prop_assert!(candidates.is_empty()),
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }
}
