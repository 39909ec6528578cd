//! Hierarchical run-length storage for one cubic chunk.
//!
//! The grid is a stack of layer runs along Z. Each non-uniform layer is split
//! into row runs along X, and each non-uniform row into column runs along Y.
//! A grid filled with a single block stores no runs at all; an edit only
//! splits the runs on the path to the edited cell.

use glam::UVec3;

use crate::block::BlockId;
use crate::layer::LayerRun;
use crate::run::{Content, FindResult, Run};

/// Native edge length of a chunk in cells.
pub const CHUNK_SIZE: u8 = 16;

/// Largest supported grid resolution (spans are stored as `u8`).
pub const MAX_RESOLUTION: u8 = 128;

/// Returns `true` for powers of two in `1..=MAX_RESOLUTION`.
pub fn is_valid_resolution(resolution: u8) -> bool {
    resolution.is_power_of_two() && resolution <= MAX_RESOLUTION
}

/// Hierarchy level named in a [`StructureError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// The grid's layer partition.
    Grid,
    /// A layer's row partition.
    Layer,
    /// A row's column partition.
    Row,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Grid => "grid",
            Self::Layer => "layer",
            Self::Row => "row",
        })
    }
}

/// A broken structural invariant found by [`HierarchicalGrid::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// Child spans do not add up to the extent of their parent.
    #[error("{level} at {origin} partitions {actual} cells, expected {expected}")]
    SpanMismatch {
        /// Level whose partition is wrong.
        level: Level,
        /// Minimum corner of the container.
        origin: UVec3,
        /// Extent the children must cover.
        expected: u16,
        /// Sum of the child spans.
        actual: u16,
    },
    /// A partitioned container holds no runs.
    #[error("{level} at {origin} is partitioned into zero runs")]
    EmptyPartition {
        /// Level whose partition is empty.
        level: Level,
        /// Minimum corner of the container.
        origin: UVec3,
    },
    /// A run covers no cells.
    #[error("{level} at {origin} holds a zero-span run")]
    ZeroSpan {
        /// Level holding the run.
        level: Level,
        /// Minimum corner of the container.
        origin: UVec3,
    },
}

/// Run-length compressed voxel storage for one `resolution`³ chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchicalGrid {
    resolution: u8,
    content: Content<LayerRun>,
}

impl Default for HierarchicalGrid {
    fn default() -> Self {
        Self::new(CHUNK_SIZE)
    }
}

impl HierarchicalGrid {
    /// Creates a grid filled with air.
    ///
    /// # Panics
    ///
    /// Panics if `resolution` is not a power of two in `1..=128`.
    pub fn new(resolution: u8) -> Self {
        Self::filled(BlockId::AIR, resolution)
    }

    /// Creates a grid filled with `block`.
    ///
    /// # Panics
    ///
    /// Panics if `resolution` is not a power of two in `1..=128`.
    pub fn filled(block: BlockId, resolution: u8) -> Self {
        assert!(
            is_valid_resolution(resolution),
            "grid resolution {resolution} must be a power of two no larger than {MAX_RESOLUTION}"
        );
        Self {
            resolution,
            content: Content::Uniform(block),
        }
    }

    /// Edge length of the grid in cells.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        usize::from(self.resolution).pow(3)
    }

    /// Returns `true` if every cell holds the same block.
    pub fn is_uniform(&self) -> bool {
        self.content.is_uniform()
    }

    /// The block filling the grid, or `None` when mixed.
    pub fn uniform_block(&self) -> Option<BlockId> {
        self.content.uniform_block()
    }

    /// Layer contents of the grid.
    pub fn content(&self) -> &Content<LayerRun> {
        &self.content
    }

    /// Layer runs in Z order (empty when uniform).
    pub fn layers(&self) -> &[LayerRun] {
        self.content.children()
    }

    fn assert_in_bounds(&self, x: u8, y: u8, z: u8) {
        assert!(
            x < self.resolution && y < self.resolution && z < self.resolution,
            "cell ({x}, {y}, {z}) outside grid of resolution {}",
            self.resolution
        );
    }

    /// Returns the block at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is `>= resolution`.
    pub fn get(&self, x: u8, y: u8, z: u8) -> BlockId {
        self.assert_in_bounds(x, y, z);
        match self.content.child_at(z) {
            Some((_, layer)) => layer.get(x, y),
            None => self.content.uniform_block().unwrap_or_default(),
        }
    }

    /// Locates the layer run covering `z`.
    ///
    /// A uniform grid yields a synthesized layer spanning the whole grid.
    pub fn find_layer(&self, z: u8) -> FindResult<LayerRun> {
        self.content.find(z, self.resolution)
    }

    /// Writes `block` at `(x, y, z)`.
    ///
    /// Only the runs on the path to the cell are split. With `trigger_merge`
    /// the path is merged back bottom-up afterwards; otherwise the caller is
    /// expected to run [`HierarchicalGrid::full_merge`] once a batch of edits
    /// is done.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is `>= resolution`.
    pub fn set(&mut self, x: u8, y: u8, z: u8, block: BlockId, trigger_merge: bool) {
        if self.get(x, y, z) == block {
            return;
        }

        if self.resolution == 1 {
            self.content = Content::Uniform(block);
            return;
        }

        self.content
            .unit_child_mut(z, self.resolution)
            .set(x, y, block, self.resolution);

        if trigger_merge {
            self.cascade_merge_from(x, z);
        }
    }

    /// Merges the path to the cell edited at `(x, _, z)`, stopping at the
    /// first level that does not collapse to a single run.
    ///
    /// Returns `true` if the grid is uniform afterwards.
    pub fn cascade_merge_from(&mut self, x: u8, z: u8) -> bool {
        let Some(layer) = self.content.child_at_mut(z) else {
            return true;
        };
        if !layer.cascade_merge_from(x) {
            return false;
        }
        self.content.merge()
    }

    /// Merges every level of the grid bottom-up.
    pub fn full_merge(&mut self) {
        for layer in self.content.children_mut() {
            layer.full_merge();
        }
        self.content.merge();
    }

    /// Visits every box implied by the hierarchy as `(size, offset, block)`.
    ///
    /// The boxes partition the grid: every cell is covered exactly once.
    pub fn for_each_region(&self, mut visit: impl FnMut(UVec3, UVec3, BlockId)) {
        let res = u32::from(self.resolution);
        let layers = match &self.content {
            Content::Uniform(block) => return visit(UVec3::splat(res), UVec3::ZERO, *block),
            Content::Partitioned(layers) => layers,
        };

        let mut z = 0;
        for layer in layers {
            let depth = u32::from(layer.span());
            match layer.content() {
                Content::Uniform(block) => {
                    visit(UVec3::new(res, res, depth), UVec3::new(0, 0, z), *block);
                }
                Content::Partitioned(rows) => {
                    let mut x = 0;
                    for row in rows {
                        let width = u32::from(row.span());
                        match row.content() {
                            Content::Uniform(block) => {
                                visit(UVec3::new(width, res, depth), UVec3::new(x, 0, z), *block);
                            }
                            Content::Partitioned(columns) => {
                                let mut y = 0;
                                for column in columns {
                                    let length = u32::from(column.span);
                                    visit(
                                        UVec3::new(width, length, depth),
                                        UVec3::new(x, y, z),
                                        column.block,
                                    );
                                    y += length;
                                }
                            }
                        }
                        x += width;
                    }
                }
            }
            z += depth;
        }
    }

    /// Number of boxes [`HierarchicalGrid::for_each_region`] visits.
    pub fn region_count(&self) -> usize {
        let mut count = 0;
        self.for_each_region(|_, _, _| count += 1);
        count
    }

    /// Checks span conservation at every level.
    pub fn validate(&self) -> Result<(), StructureError> {
        let res = self.resolution;
        check_partition(&self.content, res, Level::Grid, UVec3::ZERO)?;

        let mut z = 0;
        for layer in self.layers() {
            check_partition(layer.content(), res, Level::Layer, UVec3::new(0, 0, z))?;
            let mut x = 0;
            for row in layer.rows() {
                check_partition(row.content(), res, Level::Row, UVec3::new(x, 0, z))?;
                x += u32::from(row.span());
            }
            z += u32::from(layer.span());
        }
        Ok(())
    }
}

fn check_partition<C: Run>(
    content: &Content<C>,
    extent: u8,
    level: Level,
    origin: UVec3,
) -> Result<(), StructureError> {
    let Content::Partitioned(children) = content else {
        return Ok(());
    };
    if children.is_empty() {
        return Err(StructureError::EmptyPartition { level, origin });
    }
    if children.iter().any(|c| c.span() == 0) {
        return Err(StructureError::ZeroSpan { level, origin });
    }
    let actual = content.span_total();
    if actual != u16::from(extent) {
        return Err(StructureError::SpanMismatch {
            level,
            origin,
            expected: u16::from(extent),
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
