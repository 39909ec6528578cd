//! A fixed pool of threads turning pending column positions into chunk columns.
//!
//! Workers coordinate only through the two shared [`WorkQueue`]s: they claim
//! positions from the pending queue and publish finished columns to the
//! completed queue. A column is always generated end-to-end by one worker with
//! no lock held, and a worker finishes its current column before it observes a
//! stop request.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glam::IVec2;
use strata_voxel::ChunkColumn;

use crate::error::PipelineError;
use crate::generation::{ColumnLayout, generate_column};
use crate::source::VolumeSource;
use crate::work_queue::WorkQueue;

/// Worker count leaving headroom for the main thread and the consumer.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// Tuning of a [`GenerationWorkerPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Zero selects [`default_worker_count`].
    pub worker_count: usize,
    /// Longest a worker waits on an empty pending queue before re-checking
    /// the stop signal.
    pub idle_interval: Duration,
    /// Pause after each published column.
    pub throttle: Duration,
    /// Shape of generated columns.
    pub layout: ColumnLayout,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            idle_interval: Duration::from_millis(10),
            throttle: Duration::from_millis(10),
            layout: ColumnLayout::default(),
        }
    }
}

impl PoolConfig {
    /// The worker count actually spawned.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            default_worker_count()
        } else {
            self.worker_count
        }
    }
}

/// A one-shot, cancellable stop request shared by all workers.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop and wakes every waiter.
    pub fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.changed.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for up to `timeout`, returning early once a stop is requested.
    ///
    /// Returns `true` if the signal is set.
    pub fn wait(&self, timeout: Duration) -> bool {
        let stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped || timeout.is_zero() {
            return *stopped;
        }
        let (stopped, _) = self
            .changed
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

/// State every worker thread holds a handle to.
struct WorkerContext {
    index: usize,
    source: Arc<dyn VolumeSource>,
    pending: Arc<WorkQueue<IVec2>>,
    completed: Arc<WorkQueue<ChunkColumn>>,
    stop: Arc<StopSignal>,
    idle_interval: Duration,
    throttle: Duration,
    layout: ColumnLayout,
}

impl WorkerContext {
    fn run(self) {
        tracing::debug!(worker = self.index, "generation worker started");
        let mut generated = 0usize;

        while !self.stop.is_stopped() {
            let Some(position) = self.pending.pop_timeout(self.idle_interval) else {
                continue;
            };

            let start = Instant::now();
            let column = generate_column(self.source.as_ref(), position, &self.layout);
            debug_assert!(
                column.validate().is_ok(),
                "generated column {position} is inconsistent"
            );
            self.completed.push(column);
            generated += 1;

            tracing::debug!(
                worker = self.index,
                x = position.x,
                y = position.y,
                elapsed_us = start.elapsed().as_micros() as u64,
                "generated column"
            );

            if self.stop.wait(self.throttle) {
                break;
            }
        }

        tracing::debug!(worker = self.index, generated, "generation worker stopped");
    }
}

/// A fixed set of generation threads running until stopped.
///
/// Dropping the pool stops and joins every worker.
pub struct GenerationWorkerPool {
    workers: Vec<JoinHandle<()>>,
    stop: Arc<StopSignal>,
    pending: Arc<WorkQueue<IVec2>>,
}

impl GenerationWorkerPool {
    /// Starts the workers.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidLayout`] for an unusable column shape and
    /// [`PipelineError::Spawn`] if a thread cannot be started; workers started
    /// before the failure are stopped again.
    pub fn spawn(
        config: &PoolConfig,
        source: Arc<dyn VolumeSource>,
        pending: Arc<WorkQueue<IVec2>>,
        completed: Arc<WorkQueue<ChunkColumn>>,
    ) -> Result<Self, PipelineError> {
        config.layout.validate()?;
        let count = config.resolved_worker_count();

        let mut pool = Self {
            workers: Vec::with_capacity(count),
            stop: Arc::new(StopSignal::new()),
            pending: Arc::clone(&pending),
        };

        for index in 0..count {
            let context = WorkerContext {
                index,
                source: Arc::clone(&source),
                pending: Arc::clone(&pending),
                completed: Arc::clone(&completed),
                stop: Arc::clone(&pool.stop),
                idle_interval: config.idle_interval,
                throttle: config.throttle,
                layout: config.layout,
            };
            let handle = std::thread::Builder::new()
                .name(format!("chunk-gen-worker-{index}"))
                .spawn(move || context.run())
                .map_err(PipelineError::Spawn)?;
            pool.workers.push(handle);
        }

        tracing::info!(
            workers = count,
            resolution = config.layout.resolution,
            slices = config.layout.slices,
            "generation pool started"
        );
        Ok(pool)
    }

    /// Asks every worker to exit after its current column.
    pub fn stop(&self) {
        if !self.stop.is_stopped() {
            tracing::info!(workers = self.workers.len(), "stopping generation pool");
        }
        self.stop.stop();
        self.pending.notify_all();
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_stopped()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops the pool and waits for every worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerPanicked`] naming the first worker that
    /// panicked. All workers are joined either way.
    pub fn join(mut self) -> Result<(), PipelineError> {
        self.join_workers()
    }

    fn join_workers(&mut self) -> Result<(), PipelineError> {
        self.stop();
        let mut result = Ok(());
        for (index, handle) in std::mem::take(&mut self.workers).into_iter().enumerate() {
            if handle.join().is_err() {
                tracing::warn!(worker = index, "generation worker panicked");
                if result.is_ok() {
                    result = Err(PipelineError::WorkerPanicked { index });
                }
            }
        }
        result
    }
}

impl Drop for GenerationWorkerPool {
    fn drop(&mut self) {
        let _ = self.join_workers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FlatSource, HeightField};
    use strata_voxel::BlockId;

    struct Exploding;

    impl VolumeSource for Exploding {
        fn generate(&self, _position: IVec2, _layout: &ColumnLayout) -> HeightField {
            panic!("source failure");
        }
    }

    /// Takes a while per column so a stop can land mid-generation.
    struct Slow;

    impl VolumeSource for Slow {
        fn generate(&self, _position: IVec2, layout: &ColumnLayout) -> HeightField {
            std::thread::sleep(Duration::from_millis(200));
            HeightField::flat(layout.resolution, BlockId(4), 20)
        }
    }

    fn config(workers: usize) -> PoolConfig {
        PoolConfig {
            worker_count: workers,
            idle_interval: Duration::from_millis(5),
            throttle: Duration::ZERO,
            layout: ColumnLayout::new(16, 4),
        }
    }

    fn wait_for(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let end = Instant::now() + deadline;
        while Instant::now() < end {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn test_stop_signal_wait() {
        let signal = StopSignal::new();
        assert!(!signal.wait(Duration::ZERO));
        assert!(!signal.wait(Duration::from_millis(5)));
        signal.stop();
        assert!(signal.is_stopped());
        assert!(signal.wait(Duration::from_secs(60)));
    }

    #[test]
    fn test_stop_signal_wakes_waiter() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            std::thread::spawn(move || signal.wait(Duration::from_secs(60)))
        };
        std::thread::sleep(Duration::from_millis(10));
        signal.stop();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_default_worker_count_is_positive() {
        assert!(default_worker_count() >= 1);
        assert_eq!(config(3).resolved_worker_count(), 3);
        assert_eq!(config(0).resolved_worker_count(), default_worker_count());
    }

    #[test]
    fn test_workers_generate_every_position() {
        let pending = Arc::new(WorkQueue::new());
        let completed = Arc::new(WorkQueue::new());
        pending.extend((0..6).map(|x| IVec2::new(x, 0)));

        let pool = GenerationWorkerPool::spawn(
            &config(2),
            Arc::new(FlatSource::new(24, BlockId(1))),
            Arc::clone(&pending),
            Arc::clone(&completed),
        )
        .unwrap();
        assert_eq!(pool.worker_count(), 2);

        assert!(wait_for(Duration::from_secs(10), || completed.len() == 6));
        pool.join().unwrap();

        let mut positions: Vec<_> = completed
            .pop_many(usize::MAX)
            .into_iter()
            .map(|column| {
                column.validate().unwrap();
                column.position()
            })
            .collect();
        positions.sort_by_key(|p| p.x);
        assert_eq!(positions, (0..6).map(|x| IVec2::new(x, 0)).collect::<Vec<_>>());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_stop_is_observed_while_idle() {
        let pool = GenerationWorkerPool::spawn(
            &config(3),
            Arc::new(FlatSource::new(0, BlockId(1))),
            Arc::new(WorkQueue::new()),
            Arc::new(WorkQueue::new()),
        )
        .unwrap();
        assert!(!pool.is_stopping());
        pool.stop();
        assert!(pool.is_stopping());
        pool.join().unwrap();
    }

    #[test]
    fn test_stop_mid_generation_still_publishes() {
        let pending = Arc::new(WorkQueue::new());
        let completed = Arc::new(WorkQueue::new());
        pending.push(IVec2::new(3, 3));

        let pool = GenerationWorkerPool::spawn(
            &config(1),
            Arc::new(Slow),
            Arc::clone(&pending),
            Arc::clone(&completed),
        )
        .unwrap();
        // The position is claimed; the column is still being generated.
        assert!(wait_for(Duration::from_secs(10), || pending.is_empty()));
        pool.stop();
        pool.join().unwrap();

        assert_eq!(completed.len(), 1);
        let column = completed.pop().unwrap();
        assert_eq!(column.position(), IVec2::new(3, 3));
        column.validate().unwrap();
        assert_eq!(column.get(0, 0, 19), BlockId(4));
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let pending = Arc::new(WorkQueue::new());
        let completed: Arc<WorkQueue<ChunkColumn>> = Arc::new(WorkQueue::new());
        pending.push(IVec2::ZERO);

        let pool = GenerationWorkerPool::spawn(
            &config(1),
            Arc::new(Exploding),
            Arc::clone(&pending),
            Arc::clone(&completed),
        )
        .unwrap();
        assert!(wait_for(Duration::from_secs(10), || pending.is_empty()));

        let err = pool.join().unwrap_err();
        assert!(matches!(err, PipelineError::WorkerPanicked { index: 0 }));
        assert!(completed.is_empty());
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        let mut bad = config(1);
        bad.layout = ColumnLayout::new(12, 4);
        let result = GenerationWorkerPool::spawn(
            &bad,
            Arc::new(FlatSource::new(0, BlockId(1))),
            Arc::new(WorkQueue::new()),
            Arc::new(WorkQueue::new()),
        );
        assert!(matches!(result, Err(PipelineError::InvalidLayout { .. })));
    }
}
