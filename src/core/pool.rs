//! Chromosome-parallel operation engine
//!
//! Every genome-wide operation is split into one unit per chromosome and run
//! on a bounded rayon pool. Results come back ordered by unit index, never by
//! completion order.
//!
//! Cancellation is cooperative: units poll a [`StopToken`] at loop
//! granularity. A stopped submission yields [`OperationError::Cancelled`] and
//! no partial result.

use crate::core::error::{OperationError, OperationResult};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Shared cooperative stop flag
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; running units notice it at their next checkpoint
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Checkpoint for unit inner loops
    #[inline]
    pub fn check(&self) -> OperationResult<()> {
        if self.is_stopped() {
            Err(OperationError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Observer notified every time a unit completes
pub trait ProgressSink: Send + Sync {
    fn unit_completed(&self, completed: usize, total: usize);
}

/// Monotonic count of completed units
#[derive(Clone, Default)]
pub struct ProgressCounter {
    completed: Arc<AtomicUsize>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            sink: Some(sink),
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn record(&self, total: usize) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(sink) = &self.sink {
            sink.unit_completed(completed, total);
        }
    }
}

impl fmt::Debug for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCounter")
            .field("completed", &self.completed())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Stop token and progress counter shared by the units of one operation
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    token: StopToken,
    progress: ProgressCounter,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            token: StopToken::new(),
            progress: ProgressCounter::with_sink(sink),
        }
    }

    pub fn token(&self) -> &StopToken {
        &self.token
    }

    pub fn progress(&self) -> &ProgressCounter {
        &self.progress
    }

    /// Request a cooperative stop of the operation
    pub fn stop(&self) {
        self.token.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_stopped()
    }
}

/// Bounded worker pool running one unit per chromosome
pub struct OperationPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl OperationPool {
    /// Create a pool with a fixed number of worker threads (0 = one per core)
    pub fn with_workers(workers: usize) -> OperationResult<Self> {
        let workers = if workers == 0 { default_workers() } else { workers };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("metagenome-worker-{}", i))
            .build()
            .map_err(|e| OperationError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `unit` once per item and collect results in item order.
    ///
    /// Blocks until every unit has finished or voluntarily stopped. If the
    /// context was stopped the result is `Cancelled`; otherwise the failure
    /// with the lowest index, if any, is returned.
    pub fn submit<I, T, E, F>(
        &self,
        items: &[I],
        ctx: &OperationContext,
        unit: F,
    ) -> OperationResult<Vec<T>>
    where
        I: Sync,
        T: Send,
        E: fmt::Display,
        F: Fn(usize, &I, &StopToken) -> Result<T, E> + Sync,
    {
        self.run(items.len(), ctx, |index, token| unit(index, &items[index], token))
    }

    /// Generic function-of-index executor behind [`submit`](Self::submit)
    pub fn run<T, E, F>(&self, count: usize, ctx: &OperationContext, unit: F) -> OperationResult<Vec<T>>
    where
        T: Send,
        E: fmt::Display,
        F: Fn(usize, &StopToken) -> Result<T, E> + Sync,
    {
        debug!("Submitting {} units to {} workers", count, self.workers);
        let token = &ctx.token;
        let progress = &ctx.progress;

        let outcomes: Vec<OperationResult<T>> = self.pool.install(|| {
            (0..count)
                .into_par_iter()
                .map(|index| {
                    if token.is_stopped() {
                        return Err(OperationError::Cancelled);
                    }
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit(index, token)));
                    let result = match outcome {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(e)) => Err(OperationError::Failed {
                            index,
                            message: e.to_string(),
                        }),
                        Err(payload) => Err(OperationError::Failed {
                            index,
                            message: panic_message(payload.as_ref()),
                        }),
                    };
                    progress.record(count);
                    result
                })
                .collect()
        });

        if token.is_stopped() {
            info!("Operation stopped after {} units", progress.completed());
            return Err(OperationError::Cancelled);
        }

        let mut results = Vec::with_capacity(count);
        for outcome in outcomes {
            match outcome {
                Ok(value) => results.push(value),
                Err(e) => {
                    warn!("{}", e);
                    return Err(e);
                }
            }
        }
        Ok(results)
    }
}

impl fmt::Debug for OperationPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationPool")
            .field("workers", &self.workers)
            .finish()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("unit panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("unit panicked: {}", s)
    } else {
        "unit panicked".to_string()
    }
}

static GLOBAL_POOL: OnceLock<OperationPool> = OnceLock::new();
/// Serialises construction so racing first callers build one pool only
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

fn existing_pool(workers: usize) -> Option<&'static OperationPool> {
    let pool = GLOBAL_POOL.get()?;
    if workers != 0 && pool.workers() != workers {
        warn!(
            "Global pool already running with {} workers, ignoring request for {}",
            pool.workers(),
            workers
        );
    }
    Some(pool)
}

/// Initialise the process-wide pool with an explicit size (0 = one per core).
///
/// Only the first initialisation takes effect; later calls return the
/// existing pool.
pub fn init_global_pool(workers: usize) -> OperationResult<&'static OperationPool> {
    if let Some(pool) = existing_pool(workers) {
        return Ok(pool);
    }

    let _guard = GLOBAL_INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = existing_pool(workers) {
        return Ok(pool);
    }

    // only the guard holder reaches here, so `set` cannot lose a race
    let _ = GLOBAL_POOL.set(OperationPool::with_workers(workers)?);
    let pool = GLOBAL_POOL
        .get()
        .ok_or_else(|| OperationError::ThreadPool("global pool unavailable".to_string()))?;
    debug!("Global pool ready with {} workers", pool.workers());
    Ok(pool)
}

/// The process-wide pool, created on first use with one worker per core
pub fn global_pool() -> OperationResult<&'static OperationPool> {
    init_global_pool(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_results_in_index_order() {
        let pool = OperationPool::with_workers(4).unwrap();
        let ctx = OperationContext::new();
        let items: Vec<u64> = (0..32).collect();

        let results = pool
            .submit(&items, &ctx, |index, item, _| {
                // later units finish first
                std::thread::sleep(Duration::from_millis((32 - index as u64) % 5));
                Ok::<_, OperationError>(item * 10)
            })
            .unwrap();

        assert_eq!(results, (0..32).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(ctx.progress().completed(), 32);
    }

    #[test]
    fn test_empty_submission() {
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();
        let items: Vec<u32> = Vec::new();

        let results = pool.submit(&items, &ctx, |_, item, _| Ok::<_, OperationError>(*item)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_first_failure_by_index() {
        let pool = OperationPool::with_workers(4).unwrap();
        let ctx = OperationContext::new();
        let items: Vec<usize> = (0..10).collect();

        let result = pool.submit(&items, &ctx, |index, _, _| {
            if index == 7 {
                Err("seven".to_string())
            } else if index == 3 {
                std::thread::sleep(Duration::from_millis(20));
                Err("three".to_string())
            } else {
                Ok(index)
            }
        });

        assert_eq!(
            result,
            Err(OperationError::Failed { index: 3, message: "three".to_string() })
        );
        // every unit still ran
        assert_eq!(ctx.progress().completed(), 10);
    }

    #[test]
    fn test_panic_reported_as_failure() {
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();
        let items = vec![0, 1, 2];

        let result = pool.submit(&items, &ctx, |index, _, _| {
            if index == 1 {
                panic!("boom");
            }
            Ok::<_, OperationError>(index)
        });

        match result {
            Err(OperationError::Failed { index, message }) => {
                assert_eq!(index, 1);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // pool is reusable after a failure
        let again = pool.submit(&items, &OperationContext::new(), |i, _, _| Ok::<_, OperationError>(i));
        assert_eq!(again.unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_stop_yields_no_result() {
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();
        let items: Vec<usize> = (0..8).collect();

        let result = pool.submit(&items, &ctx, |index, _, token| {
            if index == 0 {
                ctx.stop();
            }
            for _ in 0..100 {
                token.check()?;
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok::<_, OperationError>(index)
        });

        assert_eq!(result, Err(OperationError::Cancelled));
    }

    #[test]
    fn test_stopped_before_submit() {
        let pool = OperationPool::with_workers(2).unwrap();
        let ctx = OperationContext::new();
        ctx.stop();

        let result = pool.submit(&[1, 2, 3], &ctx, |_, item, _| Ok::<_, OperationError>(*item));
        assert_eq!(result, Err(OperationError::Cancelled));
    }

    struct Recorder(Mutex<Vec<(usize, usize)>>);

    impl ProgressSink for Recorder {
        fn unit_completed(&self, completed: usize, total: usize) {
            self.0.lock().unwrap().push((completed, total));
        }
    }

    #[test]
    fn test_progress_sink() {
        let pool = OperationPool::with_workers(3).unwrap();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let ctx = OperationContext::with_progress(recorder.clone());

        pool.submit(&[1, 2, 3, 4], &ctx, |_, item, _| Ok::<_, OperationError>(*item))
            .unwrap();

        let mut seen = recorder.0.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_global_pool_is_shared() {
        let a = global_pool().unwrap() as *const OperationPool;
        let b = global_pool().unwrap() as *const OperationPool;
        assert_eq!(a, b);
        assert!(global_pool().unwrap().workers() >= 1);
    }

    #[test]
    fn test_concurrent_first_use_yields_one_pool() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| init_global_pool(0).unwrap() as *const OperationPool as usize))
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(addresses[0], global_pool().unwrap() as *const OperationPool as usize);
    }
}
