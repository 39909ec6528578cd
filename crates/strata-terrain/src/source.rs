//! The boundary to terrain shaping: how many cells of each vertical column are solid.

use glam::IVec2;
use strata_voxel::BlockId;

use crate::generation::ColumnLayout;

/// Solid heights for every `(x, y)` cell column of one chunk column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightField {
    resolution: u8,
    block: BlockId,
    /// Indexed as `x + y * resolution`.
    heights: Vec<u32>,
}

impl HeightField {
    /// Creates a field of zero heights whose solid cells hold `block`.
    pub fn new(resolution: u8, block: BlockId) -> Self {
        let len = usize::from(resolution) * usize::from(resolution);
        Self {
            resolution,
            block,
            heights: vec![0; len],
        }
    }

    /// Creates a field with the same height everywhere.
    pub fn flat(resolution: u8, block: BlockId, height: u32) -> Self {
        let mut field = Self::new(resolution, block);
        field.heights.fill(height);
        field
    }

    /// Edge length of the field in cells.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Block written into solid cells.
    pub fn block(&self) -> BlockId {
        self.block
    }

    fn index(&self, x: u8, y: u8) -> usize {
        usize::from(x) + usize::from(y) * usize::from(self.resolution)
    }

    /// Number of solid cells from the bottom of the world at `(x, y)`.
    pub fn height(&self, x: u8, y: u8) -> u32 {
        self.heights[self.index(x, y)]
    }

    /// Sets the number of solid cells at `(x, y)`.
    pub fn set_height(&mut self, x: u8, y: u8, height: u32) {
        let index = self.index(x, y);
        self.heights[index] = height;
    }

    /// Solid cells at `(x, y)` that fall inside vertical slice `slice`.
    pub fn solid_in_slice(&self, x: u8, y: u8, slice: usize) -> u8 {
        let base = slice as u32 * u32::from(self.resolution);
        let solid = self.height(x, y).saturating_sub(base);
        solid.min(u32::from(self.resolution)) as u8
    }

    /// Lowest and highest column height.
    pub fn height_range(&self) -> (u32, u32) {
        let min = self.heights.iter().copied().min().unwrap_or(0);
        let max = self.heights.iter().copied().max().unwrap_or(0);
        (min, max)
    }
}

/// Produces the raw voxel layout of a chunk column.
///
/// Implementations must be deterministic pure functions of their inputs: the
/// same position always yields the same field, with no shared mutable state.
/// They are called concurrently from every generation worker.
pub trait VolumeSource: Send + Sync {
    /// Solid heights for the column at `position`.
    fn generate(&self, position: IVec2, layout: &ColumnLayout) -> HeightField;
}

/// A world of constant surface height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatSource {
    /// Solid cells from the bottom of the world.
    pub height: u32,
    /// Block filling the solid cells.
    pub block: BlockId,
}

impl FlatSource {
    /// Creates a flat source of `height` solid cells.
    pub fn new(height: u32, block: BlockId) -> Self {
        Self { height, block }
    }

    /// Surface at a normalized noise value in `[-1, 1]` mapped onto `world_height`.
    pub fn from_noise_value(value: f64, world_height: u32, block: BlockId) -> Self {
        let height = ((value + 1.0) * f64::from(world_height) / 2.0).round();
        Self::new(height.clamp(0.0, f64::from(world_height)) as u32, block)
    }
}

impl VolumeSource for FlatSource {
    fn generate(&self, _position: IVec2, layout: &ColumnLayout) -> HeightField {
        HeightField::flat(layout.resolution, self.block, self.height.min(layout.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_in_slice_clamps() {
        let mut field = HeightField::new(16, BlockId(1));
        field.set_height(2, 3, 40);
        assert_eq!(field.solid_in_slice(2, 3, 0), 16);
        assert_eq!(field.solid_in_slice(2, 3, 1), 16);
        assert_eq!(field.solid_in_slice(2, 3, 2), 8);
        assert_eq!(field.solid_in_slice(2, 3, 3), 0);
        assert_eq!(field.solid_in_slice(0, 0, 0), 0);
    }

    #[test]
    fn test_flat_from_mid_noise_value() {
        let source = FlatSource::from_noise_value(0.5, 256, BlockId(1));
        assert_eq!(source.height, 192);
        assert_eq!(FlatSource::from_noise_value(-1.0, 256, BlockId(1)).height, 0);
        assert_eq!(FlatSource::from_noise_value(2.0, 256, BlockId(1)).height, 256);
    }

    #[test]
    fn test_flat_source_is_capped_by_layout() {
        let layout = ColumnLayout::new(16, 2);
        let field = FlatSource::new(100, BlockId(3)).generate(IVec2::ZERO, &layout);
        assert_eq!(field.height_range(), (32, 32));
        assert_eq!(field.block(), BlockId(3));
    }
}
