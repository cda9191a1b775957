use approx::assert_abs_diff_eq;
use pointcloud_moving_average::protocol::{self, SmoothRequest};
use pointcloud_moving_average::{
    centroid, smooth, smooth_with, KdTree, MovingAverageFilter, Point, PointCloud,
    SmoothingConfig,
};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

fn cloud_from(pts: &[(f64, f64, f64)]) -> PointCloud {
    pts.iter().map(|&(x, y, z)| Point::new(x, y, z)).collect()
}

/// Fibonacci sphere of radius 1 with a deterministic radial wobble.
fn noisy_sphere(n: usize) -> PointCloud {
    let golden = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f64;
            let wobble = 1.0 + 0.05 * ((i as f64) * 12.9898).sin();
            Point::new(
                theta.cos() * r * wobble,
                y * wobble,
                theta.sin() * r * wobble,
            )
        })
        .collect()
}

fn average_pairwise_distance(cloud: &PointCloud) -> f64 {
    let pts = cloud.points();
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            sum += pts[i].distance(&pts[j]);
            pairs += 1;
        }
    }
    sum / pairs as f64
}

fn points_close(a: &Point, b: &Point, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps && (a.z - b.z).abs() <= eps
}

fn assert_points_close(a: &Point, b: &Point, eps: f64) {
    assert_abs_diff_eq!(a.x, b.x, epsilon = eps);
    assert_abs_diff_eq!(a.y, b.y, epsilon = eps);
    assert_abs_diff_eq!(a.z, b.z, epsilon = eps);
}

#[test]
fn unit_square_scenario() {
    let input = cloud_from(&[
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (0.0, 1.0, 0.0),
        (1.0, 1.0, 0.0),
    ]);

    let collapsed = smooth(&input, 1.5).unwrap();
    for p in &collapsed {
        assert_points_close(p, &Point::new(0.5, 0.5, 0.0), 1e-12);
    }

    let unchanged = smooth(&input, 0.5).unwrap();
    assert_eq!(unchanged, input);
}

#[test]
fn smoothing_shrinks_noisy_sphere() {
    let input = noisy_sphere(400);
    let output = smooth(&input, 0.4).unwrap();
    assert_eq!(output.len(), input.len());
    assert!(average_pairwise_distance(&output) < average_pairwise_distance(&input));
}

#[test]
fn repeated_passes_keep_shrinking() {
    let input = noisy_sphere(300);
    let one = smooth_with(
        &input,
        &SmoothingConfig {
            radius: 0.4,
            iterations: 1,
            parallel: false,
        },
        None,
    )
    .unwrap();
    let three = smooth_with(
        &input,
        &SmoothingConfig {
            radius: 0.4,
            iterations: 3,
            parallel: false,
        },
        None,
    )
    .unwrap();
    assert!(average_pairwise_distance(&three) < average_pairwise_distance(&one));
}

#[test]
fn binary_protocol_end_to_end() {
    let request = SmoothRequest {
        cloud: cloud_from(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (5.0, 5.0, 5.0)]),
        config: SmoothingConfig {
            radius: 1.0,
            iterations: 1,
            parallel: true,
        },
    };
    let mut wire = Vec::new();
    protocol::write_request(&mut wire, &request).unwrap();

    let decoded = protocol::read_request(&mut wire.as_slice()).unwrap();
    let filter = MovingAverageFilter::from_config(decoded.config).unwrap();
    let smoothed = filter.apply(&decoded.cloud).unwrap();

    let mut response = Vec::new();
    protocol::write_response(&mut response, &smoothed).unwrap();

    assert_eq!(&response[..4], &3u32.to_le_bytes());
    let floats: Vec<f32> = response[4..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(floats, vec![0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 5.0, 5.0, 5.0]);
}

#[test]
fn json_protocol_end_to_end() {
    let json = r#"{"points": [[0,0,0],[1,0,0],[0,1,0],[1,1,0]], "radius": 1.5, "parallel": false}"#;
    let req = protocol::read_json_request(json.as_bytes()).unwrap();
    let glyphs = MovingAverageFilter::from_config(req.config)
        .unwrap()
        .run(&req.cloud)
        .unwrap();

    let mut out = Vec::new();
    protocol::write_json_response(&mut out, &glyphs).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["vertices"], serde_json::json!([0, 1, 2, 3]));
    assert_eq!(value["points"][2], serde_json::json!([0.5, 0.5, 0.0]));
}

fn coords() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec(
        (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0),
        0..200,
    )
}

proptest! {
    #[test]
    fn output_length_matches_input(pts in coords(), radius in 0.0f64..50.0) {
        let input = cloud_from(&pts);
        prop_assert_eq!(smooth(&input, radius).unwrap().len(), input.len());
    }

    #[test]
    fn every_point_finds_itself(pts in coords(), radius in 0.0f64..20.0) {
        let input = cloud_from(&pts);
        let tree = KdTree::build(input.points());
        for (i, p) in input.iter().enumerate() {
            prop_assert!(tree.radius_query(*p, radius).contains(&i));
        }
    }

    #[test]
    fn tree_matches_brute_force(
        pts in coords(),
        center in (-120.0f64..120.0, -120.0f64..120.0, -120.0f64..120.0),
        radius in 0.0f64..80.0,
    ) {
        let input = cloud_from(&pts);
        let center = Point::new(center.0, center.1, center.2);
        let tree = KdTree::build(input.points());

        let found: FxHashSet<usize> = tree.radius_query(center, radius).into_iter().collect();
        let expected: FxHashSet<usize> = input
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance_squared(&center) <= radius * radius)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn zero_radius_is_identity(pts in coords()) {
        let input = cloud_from(&pts);
        let output = smooth(&input, 0.0).unwrap();
        for (a, b) in input.iter().zip(output.iter()) {
            prop_assert!(points_close(a, b, 1e-9), "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn output_stays_inside_input_bounds(pts in coords(), radius in 0.0f64..60.0) {
        let input = cloud_from(&pts);
        let output = smooth(&input, radius).unwrap();
        if let Some(b) = input.bounds() {
            let eps = 1e-9;
            for p in &output {
                prop_assert!(p.x >= b.min.x - eps && p.x <= b.max.x + eps);
                prop_assert!(p.y >= b.min.y - eps && p.y <= b.max.y + eps);
                prop_assert!(p.z >= b.min.z - eps && p.z <= b.max.z + eps);
            }
        }
    }

    #[test]
    fn large_radius_collapses_to_global_centroid(pts in coords()) {
        let input = cloud_from(&pts);
        let Some(bounds) = input.bounds() else {
            return Ok(());
        };
        let radius = bounds.diagonal() * 1.001 + 1e-6;
        let global = centroid(input.iter().copied()).unwrap();
        for p in &smooth(&input, radius).unwrap() {
            prop_assert!(points_close(p, &global, 1e-9), "{:?} != {:?}", p, global);
        }
    }

    #[test]
    fn permuting_input_permutes_output(pts in coords(), radius in 0.0f64..30.0) {
        let input = cloud_from(&pts);
        let reversed: PointCloud = input.iter().rev().copied().collect();

        let forward = smooth(&input, radius).unwrap();
        let backward = smooth(&reversed, radius).unwrap();

        let n = input.len();
        for i in 0..n {
            let (a, b) = (&forward[i], &backward[n - 1 - i]);
            prop_assert!(points_close(a, b, 1e-9), "{:?} != {:?}", a, b);
        }
    }
}
