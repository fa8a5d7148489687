//! Parallel batch utilities.

use std::fmt::Display;

use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

/// Outcome counts of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.succeeded == 0
    }

    pub fn record<T, E>(&mut self, result: &Result<T, E>) {
        if result.is_ok() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Thread pool with `threads` workers.
pub fn bounded_pool(threads: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
    ThreadPoolBuilder::new().num_threads(threads.max(1)).build()
}

/// Run `op` over `items` on `pool`, logging each failure.
pub fn process_parallel_iter<T, R, E, F>(
    pool: &ThreadPool,
    label: &str,
    items: impl IntoIterator<Item = T>,
    op: F,
) -> BatchResult
where
    T: Send,
    R: Send,
    E: Display + Send,
    F: Fn(T) -> Result<R, E> + Sync + Send,
{
    let items: Vec<T> = items.into_iter().collect();
    let results: Vec<_> = pool.install(|| items.into_par_iter().map(&op).collect());

    let mut result = BatchResult::default();
    for r in &results {
        if let Err(e) = r {
            warn!("{label}: {e}");
        }
        result.record(r);
    }

    info!("{label}: {} succeeded, {} failed", result.succeeded, result.failed);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let pool = bounded_pool(4).unwrap();
        let result = process_parallel_iter(&pool, "even", 0..10, |n| if n % 2 == 0 { Ok(n) } else { Err("odd") });
        assert_eq!(result, BatchResult { succeeded: 5, failed: 5 });
        assert!(!result.all_succeeded());
        assert!(!result.all_failed());
    }

    #[test]
    fn test_all_failed_needs_work() {
        assert!(!BatchResult::default().all_failed());
        assert!(BatchResult { succeeded: 0, failed: 2 }.all_failed());
    }
}
