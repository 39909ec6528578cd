//! Chunk column generation: volume sources, per-slice grid construction, and the
//! worker pool that turns pending column positions into finished columns.

mod error;
mod generation;
mod heightmap;
mod pipeline;
mod source;
mod work_queue;
mod worker_pool;

pub use error::PipelineError;
pub use generation::{ColumnLayout, generate_column};
pub use heightmap::{HeightmapParams, HeightmapSampler, NoiseSource};
pub use pipeline::{ColumnConsumer, GenerationPipeline, bootstrap_order};
pub use source::{FlatSource, HeightField, VolumeSource};
pub use work_queue::{WorkQueue, WorkQueueGuard};
pub use worker_pool::{GenerationWorkerPool, PoolConfig, StopSignal, default_worker_count};
