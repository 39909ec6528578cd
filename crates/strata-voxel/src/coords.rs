//! Conversions between world space, chunk columns, and local cell coordinates.
//!
//! Column positions are horizontal `(x, y)` chunk-grid coordinates; Z is up.

use glam::{DVec3, IVec2, IVec3};
use rustc_hash::FxHashSet;

/// Horizontal chunk column containing a world-space point.
///
/// `cell_size` is the world-space edge length of one cell.
pub fn column_of(world: DVec3, resolution: u8, cell_size: f64) -> IVec2 {
    let chunk_extent = f64::from(resolution) * cell_size;
    IVec2::new(
        (world.x / chunk_extent).floor() as i32,
        (world.y / chunk_extent).floor() as i32,
    )
}

/// Chunk (column position plus vertical slice) containing a world-space point.
pub fn section_of(world: DVec3, resolution: u8, cell_size: f64) -> IVec3 {
    let chunk_extent = f64::from(resolution) * cell_size;
    (world / chunk_extent).floor().as_ivec3()
}

/// Cell coordinates of `global` relative to the chunk at `chunk`.
pub fn to_local(global: IVec3, chunk: IVec3, resolution: u8) -> IVec3 {
    global - chunk * i32::from(resolution)
}

/// Chebyshev (chessboard) distance between two column positions.
pub fn chebyshev_distance(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

/// Every column position within `distance` of `center`, as a square.
pub fn positions_around(center: IVec2, distance: i32) -> FxHashSet<IVec2> {
    let mut positions = FxHashSet::default();
    for x in center.x - distance..=center.x + distance {
        for y in center.y - distance..=center.y + distance {
            positions.insert(IVec2::new(x, y));
        }
    }
    positions
}

/// The four edge-adjacent column positions of `origin`.
pub fn neighbor_positions(origin: IVec2) -> [IVec2; 4] {
    [
        origin + IVec2::X,
        origin + IVec2::Y,
        origin - IVec2::X,
        origin - IVec2::Y,
    ]
}
