use serde::{Deserialize, Serialize};

use crate::common::{Point, PointCloud};

/// Renderable packaging of a smoothed cloud: one vertex primitive per point,
/// no connectivity. `vertices[i]` always references `points[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexGlyphs {
    pub points: Vec<Point>,
    pub vertices: Vec<usize>,
}

impl VertexGlyphs {
    pub fn package(cloud: PointCloud) -> Self {
        let points = cloud.into_points();
        let vertices = (0..points.len()).collect();
        Self { points, vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_cloud(self) -> PointCloud {
        PointCloud::from_points(self.points)
    }
}
