//! Point cloud types for raw sensor readings.
//!
//! A reading is a flat collection of colored points. The sensor's native
//! representation packs 24-bit RGB into the bits of an `f32`, so the
//! in-memory point array has four columns: `[x, y, z, rgb]`.

use serde::{Deserialize, Serialize};

/// A single colored point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rgb: [u8; 3],
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, rgb: [u8; 3]) -> Self {
        Self { x, y, z, rgb }
    }

    /// Returns the position as `[x, y, z]`.
    #[must_use]
    pub const fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Packs an RGB triple into the float bit layout used by the sensor (`0x00RRGGBB`).
#[must_use]
pub fn pack_rgb(rgb: [u8; 3]) -> f32 {
    let [r, g, b] = rgb;
    let bits = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    f32::from_bits(bits)
}

/// Inverse of [`pack_rgb`].
#[must_use]
pub fn unpack_rgb(packed: f32) -> [u8; 3] {
    let bits = packed.to_bits();
    [
        ((bits >> 16) & 0xff) as u8,
        ((bits >> 8) & 0xff) as u8,
        (bits & 0xff) as u8,
    ]
}

/// One raw sensor reading.
///
/// A cloud is valid when it contains at least one point. Invalid clouds are
/// still representable because the capture mechanism can return them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point>,
}

impl PointCloud {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// An empty reading.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns `true` if the reading has at least one point.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_empty()
    }

    /// Converts to the `[x, y, z, packed_rgb]` point array.
    #[must_use]
    pub fn to_array(&self) -> Vec<[f32; 4]> {
        self.points
            .iter()
            .map(|p| [p.x, p.y, p.z, pack_rgb(p.rgb)])
            .collect()
    }

    /// Builds a cloud from a `[x, y, z, packed_rgb]` point array.
    #[must_use]
    pub fn from_array(rows: &[[f32; 4]]) -> Self {
        let points = rows
            .iter()
            .map(|&[x, y, z, rgb]| Point::new(x, y, z, unpack_rgb(rgb)))
            .collect();
        Self { points }
    }

    /// Mean point position, or `None` for an empty cloud.
    #[must_use]
    pub fn centroid(&self) -> Option<[f32; 3]> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f32;
        let sum = self.points.iter().fold([0.0f32; 3], |acc, p| {
            [acc[0] + p.x, acc[1] + p.y, acc[2] + p.z]
        });
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_rgb_is_bit_exact() {
        let packed = pack_rgb([0x12, 0x34, 0x56]);
        assert_eq!(packed.to_bits(), 0x0012_3456);
        assert_eq!(unpack_rgb(packed), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn point_array_keeps_colors() {
        let cloud = PointCloud::new(vec![
            Point::new(1.0, 2.0, 3.0, [255, 0, 10]),
            Point::new(-1.0, 0.5, 0.0, [0, 128, 255]),
        ]);
        let rows = cloud.to_array();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][..3], [1.0, 2.0, 3.0]);
        assert_eq!(PointCloud::from_array(&rows), cloud);
    }

    #[test]
    fn validity_is_non_empty() {
        assert!(!PointCloud::empty().is_valid());
        assert!(PointCloud::new(vec![Point::new(0.0, 0.0, 0.0, [0, 0, 0])]).is_valid());
        assert!(PointCloud::empty().centroid().is_none());
    }
}
