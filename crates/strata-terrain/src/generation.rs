//! Building a whole chunk column from a volume source.

use glam::IVec2;
use strata_voxel::{ChunkColumn, HierarchicalGrid, is_valid_resolution};

use crate::error::PipelineError;
use crate::source::{HeightField, VolumeSource};

/// Shape of every column the pipeline produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Edge length of each slice grid in cells.
    pub resolution: u8,
    /// Number of vertical slices per column.
    pub slices: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            resolution: 16,
            slices: 16,
        }
    }
}

impl ColumnLayout {
    /// Layout of `slices` grids of `resolution` cells per edge.
    pub fn new(resolution: u8, slices: usize) -> Self {
        Self { resolution, slices }
    }

    /// Layout whose slices stack up to `world_height` cells.
    pub fn from_world_height(resolution: u8, world_height: u32) -> Result<Self, PipelineError> {
        let res = u32::from(resolution);
        if !is_valid_resolution(resolution) || world_height == 0 || world_height % res != 0 {
            return Err(PipelineError::InvalidLayout {
                resolution,
                world_height,
            });
        }
        Ok(Self::new(resolution, (world_height / res) as usize))
    }

    /// Column height in cells.
    pub fn height(&self) -> u32 {
        self.slices as u32 * u32::from(self.resolution)
    }

    /// Checks that grids of this shape can be built.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if is_valid_resolution(self.resolution) && self.slices > 0 {
            Ok(())
        } else {
            Err(PipelineError::InvalidLayout {
                resolution: self.resolution,
                world_height: self.height(),
            })
        }
    }
}

/// Generates the column at `position`, slice by slice from the bottom.
///
/// Every solid cell is written with merging deferred, then each slice is
/// coalesced by a single full merge. Slices that are entirely solid or
/// entirely empty skip the per-cell writes.
///
/// # Panics
///
/// Panics if the source returns a field whose resolution differs from the
/// layout's.
pub fn generate_column(
    source: &dyn VolumeSource,
    position: IVec2,
    layout: &ColumnLayout,
) -> ChunkColumn {
    let field = source.generate(position, layout);
    assert_eq!(
        field.resolution(),
        layout.resolution,
        "volume source returned a height field of the wrong resolution for column {position}"
    );
    let grids = (0..layout.slices)
        .map(|slice| build_slice(&field, slice, layout.resolution))
        .collect();
    ChunkColumn::from_grids(position, grids)
}

fn build_slice(field: &HeightField, slice: usize, resolution: u8) -> HierarchicalGrid {
    let base = slice as u32 * u32::from(resolution);
    let top = base + u32::from(resolution);
    let (min, max) = field.height_range();
    if min >= top {
        return HierarchicalGrid::filled(field.block(), resolution);
    }
    if max <= base {
        return HierarchicalGrid::new(resolution);
    }

    let mut grid = HierarchicalGrid::new(resolution);
    for y in 0..resolution {
        for x in 0..resolution {
            for z in 0..field.solid_in_slice(x, y, slice) {
                grid.set(x, y, z, field.block(), false);
            }
        }
    }
    grid.full_merge();
    grid
}
