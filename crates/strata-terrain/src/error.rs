//! Errors raised while starting or stopping the generation pipeline.

/// Failures of the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The OS refused to start a worker thread.
    #[error("failed to spawn generation worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// A worker panicked while generating and published nothing further.
    #[error("generation worker {index} panicked")]
    WorkerPanicked {
        /// Index of the worker in the pool.
        index: usize,
    },

    /// The column shape cannot be built from grids.
    #[error(
        "invalid column layout: resolution {resolution} with world height {world_height} \
         (resolution must be a power of two up to 128 dividing a non-zero height)"
    )]
    InvalidLayout {
        /// Requested slice resolution.
        resolution: u8,
        /// Requested column height in cells.
        world_height: u32,
    },
}
