//! Reduced-resolution copies of a grid.
//!
//! A level-of-detail grid of resolution `r` covers the same spatial extent as
//! its source. Each LoD cell takes the value of the source cell at its minimum
//! corner (nearest-neighbor point sampling, no averaging), so features smaller
//! than the sampling stride can vanish entirely.

use glam::UVec3;

use crate::grid::{HierarchicalGrid, is_valid_resolution};

/// Number of source cells per LoD cell along each axis.
///
/// # Panics
///
/// Panics unless both resolutions are valid and `target <= native`.
pub fn lod_stride(native: u8, target: u8) -> u8 {
    assert!(
        is_valid_resolution(native) && is_valid_resolution(target) && target <= native,
        "cannot sample resolution {target} from resolution {native}"
    );
    native / target
}

/// Maps a cell of a LoD grid to the source cell it samples.
pub fn apply_resolution(position: UVec3, native: u8, target: u8) -> UVec3 {
    position * u32::from(lod_stride(native, target))
}

/// Maps a source cell to the LoD cell containing it.
pub fn extract_resolution(position: UVec3, native: u8, target: u8) -> UVec3 {
    position / u32::from(lod_stride(native, target))
}

impl HierarchicalGrid {
    /// Builds an independent grid of resolution `target` by point-sampling
    /// this grid every `resolution / target` cells on all three axes.
    ///
    /// This grid's resolution is taken as the native one.
    ///
    /// # Panics
    ///
    /// Panics if `target` is not a valid resolution no larger than this grid's.
    pub fn generate_lod(&self, target: u8) -> HierarchicalGrid {
        let native = self.resolution();
        lod_stride(native, target);

        if let Some(block) = self.uniform_block() {
            return HierarchicalGrid::filled(block, target);
        }

        let mut lod = HierarchicalGrid::new(target);
        for z in 0..target {
            for y in 0..target {
                for x in 0..target {
                    let src = apply_resolution(
                        UVec3::new(u32::from(x), u32::from(y), u32::from(z)),
                        native,
                        target,
                    );
                    let block = self.get(src.x as u8, src.y as u8, src.z as u8);
                    lod.set(x, y, z, block, false);
                }
            }
        }
        lod.full_merge();

        tracing::trace!(
            native,
            target,
            regions = lod.region_count(),
            "sampled level of detail"
        );
        lod
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
