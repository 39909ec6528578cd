//! Multi-octave fractal Brownian motion (fBm) terrain heights.
//!
//! Composites several octaves of simplex noise over the horizontal plane and
//! turns the result into per-column solid heights.

use glam::IVec2;
use noise::{NoiseFn, Simplex};
use strata_voxel::BlockId;

use crate::generation::ColumnLayout;
use crate::source::{HeightField, VolumeSource};

/// Configuration for multi-octave fBm noise.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapParams {
    /// World seed for deterministic generation.
    pub seed: u64,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per cell.
    pub base_frequency: f64,
    /// Amplitude of the first octave, in cells.
    pub amplitude: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
            amplitude: 24.0,
        }
    }
}

/// Samples fBm over simplex noise.
pub struct HeightmapSampler {
    noise: Simplex,
    params: HeightmapParams,
}

impl HeightmapSampler {
    /// Create a new sampler with the given parameters.
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Simplex::new(params.seed as u32);
        Self { noise, params }
    }

    /// Height offset at world cell `(x, y)`, roughly in `[-max_amplitude, max_amplitude]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Theoretical maximum absolute value of [`HeightmapSampler::sample`].
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}

/// Rolling terrain: a base height displaced by fBm noise.
pub struct NoiseSource {
    sampler: HeightmapSampler,
    base_height: f64,
    block: BlockId,
}

impl NoiseSource {
    /// Creates a source whose surface hovers around `base_height` cells.
    pub fn new(params: HeightmapParams, base_height: f64, block: BlockId) -> Self {
        Self {
            sampler: HeightmapSampler::new(params),
            base_height,
            block,
        }
    }

    /// The underlying sampler.
    pub fn sampler(&self) -> &HeightmapSampler {
        &self.sampler
    }

    /// Surface height at world cell `(x, y)`, clamped to `[0, max_height]`.
    pub fn surface_height(&self, x: i64, y: i64, max_height: u32) -> u32 {
        let height = self.base_height + self.sampler.sample(x as f64, y as f64);
        height.round().clamp(0.0, f64::from(max_height)) as u32
    }
}

impl VolumeSource for NoiseSource {
    fn generate(&self, position: IVec2, layout: &ColumnLayout) -> HeightField {
        let res = layout.resolution;
        let origin_x = i64::from(position.x) * i64::from(res);
        let origin_y = i64::from(position.y) * i64::from(res);
        let max_height = layout.height();

        let mut field = HeightField::new(res, self.block);
        for y in 0..res {
            for x in 0..res {
                let height =
                    self.surface_height(origin_x + i64::from(x), origin_y + i64::from(y), max_height);
                field.set_height(x, y, height);
            }
        }
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(seed: u64) -> NoiseSource {
        NoiseSource::new(
            HeightmapParams {
                seed,
                ..Default::default()
            },
            64.0,
            BlockId(1),
        )
    }

    #[test]
    fn test_sample_within_max_amplitude() {
        let sampler = HeightmapSampler::new(HeightmapParams::default());
        let max = sampler.max_amplitude();
        for i in 0..200 {
            let v = sampler.sample(i as f64 * 7.3, i as f64 * -3.1);
            assert!(v.abs() <= max * 1.1, "sample {v} exceeds {max}");
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let layout = ColumnLayout::new(16, 8);
        let a = source(7).generate(IVec2::new(3, -2), &layout);
        let b = source(7).generate(IVec2::new(3, -2), &layout);
        assert_eq!(a, b);
    }

    #[test]
    fn test_heights_stay_inside_column() {
        let layout = ColumnLayout::new(16, 4);
        let field = NoiseSource::new(HeightmapParams::default(), 60.0, BlockId(1))
            .generate(IVec2::new(10, 10), &layout);
        let (min, max) = field.height_range();
        assert!(min <= max);
        assert!(max <= layout.height());
    }

    #[test]
    fn test_adjacent_columns_share_edge_continuity() {
        let layout = ColumnLayout::new(16, 8);
        let src = source(3);
        let left = src.generate(IVec2::new(0, 0), &layout);
        let right = src.generate(IVec2::new(1, 0), &layout);
        // Neighbouring world cells across the chunk border differ only slightly.
        for y in 0..16 {
            let a = i64::from(left.height(15, y));
            let b = i64::from(right.height(0, y));
            assert!((a - b).abs() <= 6, "discontinuity {a} vs {b} at y={y}");
        }
    }
}
