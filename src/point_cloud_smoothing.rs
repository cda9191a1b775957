//! Radius moving-average smoothing.
//!
//! Each output point is the centroid of every input point within `radius` of
//! the corresponding input point. Neighbor lookups always resolve against the
//! pass's input, never against already-smoothed output, so each point is
//! independent of the others and the per-point loop can run in parallel.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::centroid::centroid_of_indices;
use crate::common::{Point, PointCloud};
use crate::config::SmoothingConfig;
use crate::error::{Result, SmoothError};
use crate::spatial_index::KdTree;

/// One smoothing pass with the given radius.
///
/// Returns a new cloud of the same length where index `i` is the centroid of
/// the radius neighborhood of `input[i]`. A radius of zero returns the input
/// unchanged; a radius at least the cloud's diameter collapses every point
/// onto the global centroid.
pub fn smooth(input: &PointCloud, radius: f64) -> Result<PointCloud> {
    smooth_with(input, &SmoothingConfig::with_radius(radius), None)
}

/// Full entry point: validates the configuration, rejects non-finite input
/// coordinates, then runs `config.iterations` passes.
///
/// `cancel` is polled between points. Once it is set the run stops with
/// [`SmoothError::Cancelled`] and no partial output is returned.
#[instrument(skip_all, fields(points = input.len(), radius = config.radius, iterations = config.iterations))]
pub fn smooth_with(
    input: &PointCloud,
    config: &SmoothingConfig,
    cancel: Option<&AtomicBool>,
) -> Result<PointCloud> {
    config.validate()?;

    if let Some(index) = input.first_non_finite() {
        return Err(SmoothError::NonFiniteCoordinate { index });
    }

    let mut current = input.clone();
    for pass in 0..config.iterations {
        current = match smooth_pass(&current, config.radius, config.parallel, cancel) {
            Ok(smoothed) => smoothed,
            Err(SmoothError::Cancelled) => {
                warn!(pass, "smoothing cancelled");
                return Err(SmoothError::Cancelled);
            }
            Err(e) => return Err(e),
        };
        debug!(pass, points = current.len(), "smoothing pass complete");
    }

    Ok(current)
}

fn smooth_pass(
    input: &PointCloud,
    radius: f64,
    parallel: bool,
    cancel: Option<&AtomicBool>,
) -> Result<PointCloud> {
    if input.is_empty() {
        return Ok(PointCloud::new());
    }

    let tree = KdTree::build(input.points());

    #[cfg(feature = "parallel")]
    if parallel {
        return smooth_points_parallel(&tree, radius, cancel);
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    smooth_points_sequential(&tree, radius, cancel)
}

fn smooth_points_sequential(
    tree: &KdTree,
    radius: f64,
    cancel: Option<&AtomicBool>,
) -> Result<PointCloud> {
    let points = tree.points();
    let mut output = PointCloud::with_capacity(points.len());
    let mut neighbors = Vec::new();

    for &center in points {
        check_cancelled(cancel)?;
        tree.radius_query_into(center, radius, &mut neighbors);
        output.push(centroid_of_indices(points, &neighbors)?);
    }

    Ok(output)
}

#[cfg(feature = "parallel")]
fn smooth_points_parallel(
    tree: &KdTree,
    radius: f64,
    cancel: Option<&AtomicBool>,
) -> Result<PointCloud> {
    let points = tree.points();

    // Indexed collect keeps output slot i paired with input point i.
    let smoothed = points
        .par_iter()
        .map_init(Vec::new, |neighbors, &center| {
            check_cancelled(cancel)?;
            tree.radius_query_into(center, radius, neighbors);
            centroid_of_indices(points, neighbors)
        })
        .collect::<Result<Vec<Point>>>()?;

    Ok(PointCloud::from_points(smoothed))
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(SmoothError::Cancelled),
        _ => Ok(()),
    }
}
