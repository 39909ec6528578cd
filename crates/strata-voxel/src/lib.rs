//! Run-length voxel storage: a four-level hierarchy of runs per chunk, level-of-detail
//! sampling, and the chunk columns handed from generation workers to consumers.

pub mod block;
pub mod chunk_column;
pub mod coords;
pub mod grid;
pub mod layer;
pub mod lod;
pub mod row;
pub mod run;

pub use block::BlockId;
pub use chunk_column::ChunkColumn;
pub use grid::{
    CHUNK_SIZE, HierarchicalGrid, Level, MAX_RESOLUTION, StructureError, is_valid_resolution,
};
pub use layer::LayerRun;
pub use lod::{apply_resolution, extract_resolution, lod_stride};
pub use row::{ColumnRun, RowRun};
pub use run::{Content, FindResult, FindTarget, Run, Split, merge_adjacent};
