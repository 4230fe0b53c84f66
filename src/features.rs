//! Histogram feature extraction.
//!
//! A feature vector is the concatenation of a color histogram (three
//! channels, `color_bins` each) and a surface-normal histogram (three axes,
//! `normal_bins` each). Both halves are normalized to sum to one, and both
//! are all-zero when there is nothing to count, so the vector length only
//! depends on the bin configuration.

use crate::errors::CollectorResult;
use crate::point_cloud::PointCloud;
use serde::{Deserialize, Serialize};

/// Upper bound of the color channel range, exclusive.
const COLOR_RANGE: (f32, f32) = (0.0, 256.0);
/// Range of a unit normal component.
const NORMAL_RANGE: (f32, f32) = (-1.0, 1.0);

/// Color space used for the color histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    #[default]
    Hsv,
}

/// Fixed-length feature vector computed from one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Remote surface-normal estimation, injected so tests can fake it.
pub trait NormalEstimator {
    /// Returns one unit normal per point of `cloud`.
    fn get_normals(&mut self, cloud: &PointCloud) -> CollectorResult<Vec<[f32; 3]>>;
}

impl<N: NormalEstimator + ?Sized> NormalEstimator for &mut N {
    fn get_normals(&mut self, cloud: &PointCloud) -> CollectorResult<Vec<[f32; 3]>> {
        (**self).get_normals(cloud)
    }
}

impl<N: NormalEstimator + ?Sized> NormalEstimator for Box<N> {
    fn get_normals(&mut self, cloud: &PointCloud) -> CollectorResult<Vec<[f32; 3]>> {
        (**self).get_normals(cloud)
    }
}

/// Converts an RGB triple to HSV, each channel scaled to `[0, 255]`.
#[must_use]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let [r, g, b] = rgb.map(|c| f32::from(c) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    [hue * 255.0, saturation * 255.0, max * 255.0]
}

/// Counts `values` into `bins` equal-width bins over `[lo, hi]`.
///
/// Values equal to `hi` land in the last bin; values outside the range or
/// non-finite are ignored.
fn histogram(values: impl Iterator<Item = f32>, bins: usize, lo: f32, hi: f32) -> Vec<f32> {
    let mut counts = vec![0.0f32; bins];
    if bins == 0 {
        return counts;
    }
    let width = (hi - lo) / bins as f32;
    for v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1.0;
    }
    counts
}

fn normalize(mut features: Vec<f32>) -> Vec<f32> {
    let total: f32 = features.iter().sum();
    if total > 0.0 {
        features.iter_mut().for_each(|f| *f /= total);
    }
    features
}

/// Normalized per-channel color histogram, length `3 * bins`.
#[must_use]
pub fn compute_color_histogram(cloud: &PointCloud, color_space: ColorSpace, bins: usize) -> Vec<f32> {
    let colors: Vec<[f32; 3]> = cloud
        .points
        .iter()
        .map(|p| match color_space {
            ColorSpace::Rgb => p.rgb.map(f32::from),
            ColorSpace::Hsv => rgb_to_hsv(p.rgb),
        })
        .collect();

    let (lo, hi) = COLOR_RANGE;
    let mut features = Vec::with_capacity(3 * bins);
    for channel in 0..3 {
        features.extend(histogram(colors.iter().map(|c| c[channel]), bins, lo, hi));
    }
    normalize(features)
}

/// Normalized per-axis surface-normal histogram, length `3 * bins`.
#[must_use]
pub fn compute_normal_histogram(normals: &[[f32; 3]], bins: usize) -> Vec<f32> {
    let (lo, hi) = NORMAL_RANGE;
    let mut features = Vec::with_capacity(3 * bins);
    for axis in 0..3 {
        features.extend(histogram(normals.iter().map(|n| n[axis]), bins, lo, hi));
    }
    normalize(features)
}

/// Histogram extractor for one run's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractor {
    pub color_space: ColorSpace,
    pub color_bins: usize,
    pub normal_bins: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Hsv,
            color_bins: 32,
            normal_bins: 32,
        }
    }
}

impl FeatureExtractor {
    /// Length of every vector this extractor produces.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        3 * self.color_bins + 3 * self.normal_bins
    }

    /// Computes the feature vector for `cloud`, asking `estimator` for normals once.
    pub fn extract<N: NormalEstimator>(
        &self,
        cloud: &PointCloud,
        estimator: &mut N,
    ) -> CollectorResult<FeatureVector> {
        let mut features = compute_color_histogram(cloud, self.color_space, self.color_bins);
        let normals = estimator.get_normals(cloud)?;
        features.extend(compute_normal_histogram(&normals, self.normal_bins));
        Ok(FeatureVector(features))
    }
}
