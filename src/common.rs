use serde::{Deserialize, Serialize};

use crate::error::{Result, SmoothError};

// Point struct for better cache locality
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Point {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point> for [f64; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Axis-aligned bounding box of a cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Length of the box diagonal, an upper bound on the cloud's diameter.
    pub fn diagonal(&self) -> f64 {
        self.min.distance(&self.max)
    }
}

/// Ordered, index-addressable point sequence. Index `i` of a smoothed cloud
/// is the smoothed counterpart of index `i` of its input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a cloud from an interleaved `[x0, y0, z0, x1, ...]` buffer.
    pub fn from_flat_f32(data: &[f32]) -> Result<Self> {
        if data.len() % 3 != 0 {
            return Err(SmoothError::InvalidBufferLength(data.len()));
        }
        let points = data
            .chunks_exact(3)
            .map(|c| Point::new(c[0] as f64, c[1] as f64, c[2] as f64))
            .collect();
        Ok(Self { points })
    }

    pub fn to_flat_f32(&self) -> Vec<f32> {
        self.points
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Index of the first point with a NaN or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points.iter().position(|p| !p.is_finite())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            max.x = max.x.max(p.x);
            min.y = min.y.min(p.y);
            max.y = max.y.max(p.y);
            min.z = min.z.min(p.z);
            max.z = max.z.max(p.z);
        }
        Some(Bounds { min, max })
    }
}

impl From<Vec<Point>> for PointCloud {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl std::ops::Index<usize> for PointCloud {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}
