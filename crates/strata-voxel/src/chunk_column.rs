//! Vertical stacks of chunk grids sharing one horizontal position.

use glam::IVec2;

use crate::block::BlockId;
use crate::grid::{HierarchicalGrid, StructureError};

/// The grids of every vertical chunk slice at one horizontal column position.
///
/// Slice 0 is the bottom of the world. A column is built end-to-end by a single
/// generation worker and handed over whole; it is never shared while mutable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkColumn {
    position: IVec2,
    grids: Vec<HierarchicalGrid>,
}

impl ChunkColumn {
    /// Creates a column of `slices` air grids of the given resolution.
    pub fn new(position: IVec2, slices: usize, resolution: u8) -> Self {
        Self {
            position,
            grids: vec![HierarchicalGrid::new(resolution); slices],
        }
    }

    /// Assembles a column from already generated grids, bottom first.
    ///
    /// # Panics
    ///
    /// Panics if the grids do not share one resolution.
    pub fn from_grids(position: IVec2, grids: Vec<HierarchicalGrid>) -> Self {
        if let Some(first) = grids.first() {
            let resolution = first.resolution();
            assert!(
                grids.iter().all(|g| g.resolution() == resolution),
                "column {position} mixes grid resolutions"
            );
        }
        Self { position, grids }
    }

    /// Horizontal chunk position of the column.
    pub fn position(&self) -> IVec2 {
        self.position
    }

    /// All slices, bottom first.
    pub fn slices(&self) -> &[HierarchicalGrid] {
        &self.grids
    }

    /// The slice at `index`, if present.
    pub fn slice(&self, index: usize) -> Option<&HierarchicalGrid> {
        self.grids.get(index)
    }

    /// Mutable access to the slice at `index`.
    pub fn slice_mut(&mut self, index: usize) -> Option<&mut HierarchicalGrid> {
        self.grids.get_mut(index)
    }

    /// Number of vertical slices.
    pub fn slice_count(&self) -> usize {
        self.grids.len()
    }

    /// Resolution shared by every slice (0 for an empty column).
    pub fn resolution(&self) -> u8 {
        self.grids.first().map_or(0, HierarchicalGrid::resolution)
    }

    /// Height of the column in cells.
    pub fn height(&self) -> u32 {
        self.grids.len() as u32 * u32::from(self.resolution())
    }

    /// Returns the block at local `(x, y)` and column height `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z >= height()` or `(x, y)` lies outside a slice.
    pub fn get(&self, x: u8, y: u8, z: u32) -> BlockId {
        assert!(z < self.height(), "height {z} above column of {}", self.height());
        let res = u32::from(self.resolution());
        self.grids[(z / res) as usize].get(x, y, (z % res) as u8)
    }

    /// Checks span conservation in every slice.
    pub fn validate(&self) -> Result<(), StructureError> {
        self.grids.iter().try_for_each(HierarchicalGrid::validate)
    }

    /// Consumes the column, returning its slices.
    pub fn into_grids(self) -> Vec<HierarchicalGrid> {
        self.grids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_is_air() {
        let column = ChunkColumn::new(IVec2::new(2, -1), 16, 16);
        assert_eq!(column.position(), IVec2::new(2, -1));
        assert_eq!(column.slice_count(), 16);
        assert_eq!(column.height(), 256);
        assert!(column.slices().iter().all(HierarchicalGrid::is_uniform));
        assert_eq!(column.get(0, 0, 255), BlockId::AIR);
    }

    #[test]
    fn test_get_crosses_slices() {
        let mut column = ChunkColumn::new(IVec2::ZERO, 4, 16);
        column
            .slice_mut(2)
            .unwrap()
            .set(1, 2, 3, BlockId(5), true);
        assert_eq!(column.get(1, 2, 35), BlockId(5));
        assert_eq!(column.get(1, 2, 3), BlockId::AIR);
        column.validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "above column")]
    fn test_get_above_column_panics() {
        ChunkColumn::new(IVec2::ZERO, 2, 16).get(0, 0, 32);
    }

    #[test]
    #[should_panic(expected = "mixes grid resolutions")]
    fn test_from_grids_rejects_mixed_resolutions() {
        ChunkColumn::from_grids(
            IVec2::ZERO,
            vec![HierarchicalGrid::new(16), HierarchicalGrid::new(8)],
        );
    }
}
