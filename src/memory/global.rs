/*!
 * Process-wide Registry
 *
 * Free-function facade over one `PoolRegistry` shared by the whole process.
 * A single mutex serializes every call; pools themselves are not otherwise
 * synchronized.
 */

use super::registry::PoolRegistry;
use super::traits::BufferSource;
use super::types::{AllocPolicy, PoolHandle, PoolStats, SegmentInfo, SegmentRef};
use super::Pool;
use crate::core::config::RegistryConfig;
use crate::core::errors::PoolResult;
use crate::core::types::Size;
use crate::monitoring::span_operation;
use parking_lot::{const_mutex, Mutex};

static REGISTRY: Mutex<PoolRegistry> = const_mutex(PoolRegistry::new());

/// Initialize the process-wide registry with default settings
pub fn registry_init() -> PoolResult<()> {
    let span = span_operation("registry_init");
    let _entered = span.enter();
    let result = REGISTRY.lock().initialize();
    span.record_result(&result);
    result
}

/// Initialize the process-wide registry with custom settings and buffer source
pub fn registry_init_with(
    config: RegistryConfig,
    source: Box<dyn BufferSource>,
) -> PoolResult<()> {
    let span = span_operation("registry_init");
    let _entered = span.enter();
    let result = REGISTRY.lock().initialize_with(config, source);
    span.record_result(&result);
    result
}

/// Tear the registry down; fails while any pool is open
pub fn registry_shutdown() -> PoolResult<()> {
    let span = span_operation("registry_shutdown");
    let _entered = span.enter();
    let result = REGISTRY.lock().shutdown();
    span.record_result(&result);
    result
}

pub fn pool_open(size: Size, policy: AllocPolicy) -> PoolResult<PoolHandle> {
    let span = span_operation("pool_open");
    let _entered = span.enter();
    let result = REGISTRY.lock().open(size, policy);
    span.record_result(&result);
    result
}

pub fn pool_close(handle: PoolHandle) -> PoolResult<()> {
    let span = span_operation("pool_close").with_pool(handle);
    let _entered = span.enter();
    let result = REGISTRY.lock().close(handle);
    span.record_result(&result);
    result
}

pub fn pool_allocate(handle: PoolHandle, size: Size) -> PoolResult<SegmentRef> {
    let span = span_operation("pool_allocate").with_pool(handle);
    let _entered = span.enter();
    let result = REGISTRY.lock().allocate(handle, size);
    span.record_result(&result);
    result
}

pub fn pool_deallocate(handle: PoolHandle, segment: SegmentRef) -> PoolResult<()> {
    let span = span_operation("pool_deallocate").with_pool(handle);
    let _entered = span.enter();
    let result = REGISTRY.lock().deallocate(handle, segment);
    span.record_result(&result);
    result
}

/// Snapshot of a pool's segments in address order
pub fn pool_inspect(handle: PoolHandle) -> PoolResult<Vec<SegmentInfo>> {
    let span = span_operation("pool_inspect").with_pool(handle);
    let _entered = span.enter();
    let result: PoolResult<Vec<SegmentInfo>> = REGISTRY
        .lock()
        .inspect(handle)
        .map(|segments| segments.collect());
    span.record_result(&result);
    result
}

pub fn pool_stats(handle: PoolHandle) -> PoolResult<PoolStats> {
    let span = span_operation("pool_stats").with_pool(handle);
    let _entered = span.enter();
    let result = REGISTRY.lock().stats(handle);
    span.record_result(&result);
    result
}

/// Run `f` against an open pool while holding the registry lock
///
/// The lock is not reentrant: `f` must not call back into any function of
/// this module, or it deadlocks.
pub fn with_pool<R>(handle: PoolHandle, f: impl FnOnce(&mut Pool) -> R) -> PoolResult<R> {
    let span = span_operation("with_pool").with_pool(handle);
    let _entered = span.enter();
    let result = REGISTRY.lock().pool_mut(handle).map(f);
    span.record_result(&result);
    result
}

/// Whether the process-wide registry is ready
pub fn registry_initialized() -> bool {
    REGISTRY.lock().is_initialized()
}
