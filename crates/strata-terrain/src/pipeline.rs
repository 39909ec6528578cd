//! The producer/consumer facade: bootstrap positions in, finished columns out.

use std::sync::Arc;

use glam::IVec2;
use strata_voxel::{ChunkColumn, coords::chebyshev_distance};

use crate::error::PipelineError;
use crate::source::VolumeSource;
use crate::work_queue::WorkQueue;
use crate::worker_pool::{GenerationWorkerPool, PoolConfig};

/// Receives finished columns on the consumer thread.
pub trait ColumnConsumer {
    fn on_column_ready(&mut self, column: ChunkColumn);
}

impl<F: FnMut(ChunkColumn)> ColumnConsumer for F {
    fn on_column_ready(&mut self, column: ChunkColumn) {
        self(column)
    }
}

/// Orders `positions` so that a most-recent-first queue yields the one
/// nearest `center` first: farthest positions come first in the result.
pub fn bootstrap_order(center: IVec2, positions: impl IntoIterator<Item = IVec2>) -> Vec<IVec2> {
    let mut ordered: Vec<IVec2> = positions.into_iter().collect();
    ordered.sort_by_key(|p| {
        let offset = *p - center;
        (
            std::cmp::Reverse(chebyshev_distance(*p, center)),
            std::cmp::Reverse(offset.length_squared()),
            p.x,
            p.y,
        )
    });
    ordered
}

/// Owns the pending and completed queues together with the workers
/// connecting them.
///
/// The owning thread is the only reader of completed columns and, after
/// bootstrap, the only writer of pending positions.
pub struct GenerationPipeline {
    pending: Arc<WorkQueue<IVec2>>,
    completed: Arc<WorkQueue<ChunkColumn>>,
    pool: GenerationWorkerPool,
}

impl GenerationPipeline {
    /// Starts the workers over two fresh, empty queues.
    pub fn spawn(config: &PoolConfig, source: Arc<dyn VolumeSource>) -> Result<Self, PipelineError> {
        let pending = Arc::new(WorkQueue::new());
        let completed = Arc::new(WorkQueue::new());
        let pool = GenerationWorkerPool::spawn(
            config,
            source,
            Arc::clone(&pending),
            Arc::clone(&completed),
        )?;
        Ok(Self {
            pending,
            completed,
            pool,
        })
    }

    /// Queues one position for generation.
    pub fn enqueue(&self, position: IVec2) {
        self.pending.push(position);
    }

    /// Seeds the pending queue so that the columns nearest `center` are
    /// claimed first.
    pub fn enqueue_positions(&self, center: IVec2, positions: impl IntoIterator<Item = IVec2>) {
        let ordered = bootstrap_order(center, positions);
        tracing::debug!(count = ordered.len(), %center, "enqueued column positions");
        self.pending.extend(ordered);
    }

    /// Takes up to `max` finished columns without blocking.
    pub fn drain_ready(&self, max: usize) -> Vec<ChunkColumn> {
        self.completed.pop_many(max)
    }

    /// Hands up to `max` finished columns to `consumer`, returning how many.
    pub fn drain_into(&self, consumer: &mut impl ColumnConsumer, max: usize) -> usize {
        let ready = self.drain_ready(max);
        let count = ready.len();
        for column in ready {
            consumer.on_column_ready(column);
        }
        count
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn ready_len(&self) -> usize {
        self.completed.len()
    }

    pub fn pool(&self) -> &GenerationWorkerPool {
        &self.pool
    }

    /// Stops and joins the workers. Columns still queued are discarded.
    pub fn shutdown(self) -> Result<(), PipelineError> {
        let result = self.pool.join();
        tracing::info!(
            pending = self.pending.len(),
            ready = self.completed.len(),
            "generation pipeline shut down"
        );
        result
    }
}
