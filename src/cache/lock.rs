use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock `lock`, taking over the guard if a previous holder panicked.
///
/// The poison flag is cleared after recovery so the warning fires once per
/// panic rather than on every later lookup.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    source: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                target = "leafdoc::cache",
                op,
                source,
                result = "poisoned_recovered",
                "rendered documents may be stale after a panic while the cache was locked"
            );
            let guard = poisoned.into_inner();
            lock.clear_poison();
            guard
        }
    }
}
