use crate::common::Point;
use crate::error::{Result, SmoothError};

/// Componentwise arithmetic mean of `points`.
///
/// Accumulates sequentially in iteration order, so the same points in the
/// same order always give a bit-identical result. An empty input is an
/// error, never a silent zero.
pub fn centroid<I>(points: I) -> Result<Point>
where
    I: IntoIterator<Item = Point>,
{
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_z = 0.0;
    let mut count = 0usize;

    for p in points {
        sum_x += p.x;
        sum_y += p.y;
        sum_z += p.z;
        count += 1;
    }

    if count == 0 {
        return Err(SmoothError::EmptyNeighborhood);
    }

    let scale = 1.0 / count as f64;
    Ok(Point::new(sum_x * scale, sum_y * scale, sum_z * scale))
}

/// Centroid of `points[i]` for every `i` in `indices`.
pub fn centroid_of_indices(points: &[Point], indices: &[usize]) -> Result<Point> {
    centroid(indices.iter().map(|&i| points[i]))
}
