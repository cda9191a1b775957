//! Radius moving-average smoothing for 3D point clouds.
//!
//! Every point is replaced by the centroid of all points within a fixed
//! radius of it, using a k-d tree for the neighborhood queries.

pub mod centroid;
pub mod common;
pub mod config;
pub mod error;
pub mod glyph;
pub mod point_cloud_smoothing;
pub mod protocol;
pub mod spatial_index;

use std::sync::atomic::AtomicBool;

use tracing::info;

pub use centroid::{centroid, centroid_of_indices};
pub use common::{Bounds, Point, PointCloud};
pub use config::{SmoothingConfig, DEFAULT_RADIUS};
pub use error::{Result, SmoothError};
pub use glyph::VertexGlyphs;
pub use point_cloud_smoothing::{smooth, smooth_with};
pub use spatial_index::KdTree;

/// Configured smoothing stage for host pipelines.
///
/// Holds the radius and pass count and turns an input cloud into packaged
/// vertex glyphs. The numerical work is done by [`smooth_with`].
#[derive(Debug, Clone, Default)]
pub struct MovingAverageFilter {
    config: SmoothingConfig,
}

impl MovingAverageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SmoothingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        config::validate_radius(radius)?;
        self.config.radius = radius;
        Ok(())
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.config.iterations = iterations;
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.config.parallel = parallel;
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn apply(&self, input: &PointCloud) -> Result<PointCloud> {
        smooth_with(input, &self.config, None)
    }

    /// Like [`MovingAverageFilter::apply`], stopping early once `cancel` is set.
    pub fn apply_cancellable(
        &self,
        input: &PointCloud,
        cancel: &AtomicBool,
    ) -> Result<PointCloud> {
        smooth_with(input, &self.config, Some(cancel))
    }

    /// Smooths `input` and packages the result as one vertex per point.
    pub fn run(&self, input: &PointCloud) -> Result<VertexGlyphs> {
        let smoothed = self.apply(input)?;
        info!(points = smoothed.len(), radius = self.config.radius, "moving average complete");
        Ok(VertexGlyphs::package(smoothed))
    }
}
