//! End-to-end behaviour of the viewer's GPU-free core.

use std::collections::HashSet;
use std::f32::consts::PI;
use std::time::Instant;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wrapped_viz::config::{CameraConfig, ViewerConfig};
use wrapped_viz::data::{
    load_or_fallback, ConversationPoint, DataResponse, DataSource, LoadKind, SharedConnection,
};
use wrapped_viz::gfx::camera::{CameraController, OrbitCamera};
use wrapped_viz::gfx::camera::orbit_camera::{MAX_PHI, MIN_PHI};
use wrapped_viz::gfx::overlay::ComparisonOverlay;
use wrapped_viz::gfx::picking::{CanvasRect, PointPicker};
use wrapped_viz::gfx::point_cloud::{ColorAssignment, ColorMode, PointCloudBuilder};
use wrapped_viz::gfx::visibility::{
    CategoryFilter, ComparisonPair, FilterCriteria, VisibilityFilter, VisibleSet,
};
use wrapped_viz::viewer::{DataStatus, ViewerState};
use wrapped_viz::{Result, VizError};

fn point(email: &str, title: &str, position: [f32; 3]) -> ConversationPoint {
    ConversationPoint {
        x: position[0],
        y: position[1],
        z: position[2],
        email: email.to_string(),
        title: title.to_string(),
        timestamp: "2024-03-01T09:30:00Z".to_string(),
        cluster_id: None,
        cluster_title: None,
        body: None,
    }
}

fn default_camera() -> OrbitCamera {
    OrbitCamera::from_config(&CameraConfig::default(), 1.5)
}

#[test]
fn polar_angle_stays_clamped_for_any_input() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut camera = default_camera();

    for _ in 0..1_000 {
        let delta: f32 = rng.random_range(-500.0..500.0);
        if rng.random_bool(0.5) {
            camera.set_phi(camera.phi + delta);
        } else {
            camera.orbit(rng.random_range(-1_000.0..1_000.0), delta * 10.0);
        }
        assert!(camera.phi >= MIN_PHI && camera.phi <= MAX_PHI, "phi {}", camera.phi);
    }

    camera.set_phi(f32::MAX);
    assert_relative_eq!(camera.phi, PI - 0.1);
    camera.set_phi(-f32::MAX);
    assert_relative_eq!(camera.phi, 0.1);
}

#[test]
fn radius_stays_within_configured_bounds() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut camera = default_camera();

    for _ in 0..1_000 {
        camera.zoom(rng.random_range(-10.0..10.0));
        assert!(camera.radius >= 8.0 && camera.radius <= 80.0, "radius {}", camera.radius);
    }

    for _ in 0..100 {
        camera.zoom(1.0);
    }
    assert_relative_eq!(camera.radius, 80.0);
    for _ in 0..100 {
        camera.zoom(-1.0);
    }
    assert_relative_eq!(camera.radius, 8.0);
}

fn mixed_points() -> Vec<ConversationPoint> {
    let mut points = Vec::new();
    let emails = ["alice@company.com", "bob@startup.io", "carol@tech.org"];
    let clusters = ["Development & Coding", "Project Management"];
    for i in 0..30 {
        let mut p = point(emails[i % 3], &format!("Conversation {i}"), [i as f32, -(i as f32), 0.5]);
        p.cluster_title = Some(clusters[i % 2].to_string());
        p.body = (i % 5 == 0).then(|| "notes about rust lifetimes".to_string());
        points.push(p);
    }
    points
}

#[test]
fn filtering_twice_is_idempotent() {
    let points = mixed_points();
    let filter = VisibilityFilter::default();
    let criteria = FilterCriteria {
        search: "Rust".to_string(),
        category: CategoryFilter::Cluster("Development & Coding".to_string()),
        comparison: Some(ComparisonPair {
            current_user: "alice@company.com".to_string(),
            target: "bob@startup.io".to_string(),
        }),
    };

    let mut first_positions = Vec::new();
    let first = filter.apply(&points, &criteria, &mut first_positions);
    let mut second_positions = first_positions.clone();
    let second = filter.apply(&points, &criteria, &mut second_positions);

    assert_eq!(first, second);
    assert_eq!(first_positions, second_positions);
    assert!(!first.is_empty());
}

#[test]
fn hidden_points_sit_at_sentinel_and_visible_points_at_true_position() {
    let points = mixed_points();
    let filter = VisibilityFilter::new(10_000.0);
    let criteria = FilterCriteria {
        category: CategoryFilter::Cluster("Project Management".to_string()),
        comparison: Some(ComparisonPair {
            current_user: "alice@company.com".to_string(),
            target: "carol@tech.org".to_string(),
        }),
        ..FilterCriteria::default()
    };

    let mut positions = Vec::new();
    let visible = filter.apply(&points, &criteria, &mut positions);

    assert_eq!(positions.len(), points.len() * 3);
    for (index, point) in points.iter().enumerate() {
        let slot = &positions[index * 3..index * 3 + 3];
        if visible.contains(index) {
            assert_eq!(slot, point.position());
        } else {
            assert_eq!(slot, [10_000.0; 3]);
        }
    }
}

#[test]
fn picking_ignores_points_outside_the_visible_set() {
    let mut config = CameraConfig::default();
    config.radius = 20.0;
    config.theta = 0.0;
    config.phi = PI / 2.0;
    let camera = OrbitCamera::from_config(&config, 1.0);
    let rect = CanvasRect::new(0.0, 0.0, 600.0, 600.0);
    let centre = (300.0, 300.0);

    // Point 0 is geometrically nearest along the centre ray.
    let positions = [4.0, 0.0, 0.0, -4.0, 0.0, 0.0];
    let mut picker = PointPicker::new(0.5);

    let hidden_nearest: VisibleSet = [1].into_iter().collect();
    assert_eq!(picker.pointer_moved(centre, rect, &camera, &positions, &hidden_nearest), None);

    let nothing_visible = VisibleSet::default();
    assert_eq!(picker.pointer_moved(centre, rect, &camera, &positions, &nothing_visible), None);

    let all = VisibleSet::all(2);
    let hover = picker.pointer_moved(centre, rect, &camera, &positions, &all);
    assert_eq!(hover.map(|h| h.index), Some(0));
}

#[test]
fn three_users_get_three_colours() {
    let emails = ["alice@company.com", "bob@startup.io", "carol@tech.org"];
    let mut rng = StdRng::seed_from_u64(6);
    let points: Vec<ConversationPoint> = (0..500)
        .map(|i| {
            let position = [rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0), 0.0];
            point(emails[(i * 7) % 3], "Chat", position)
        })
        .collect();

    let colors = ColorAssignment::assign(&points, ColorMode::ByUser);
    assert_eq!(colors.len(), 3);

    let buffers = PointCloudBuilder::default().build(&points, &colors, &mut rng);
    let distinct: HashSet<[u32; 3]> = (0..points.len())
        .map(|i| buffers.color(i).map(f32::to_bits))
        .collect();
    assert_eq!(distinct.len(), 3);

    for email in emails {
        let expected = colors.get(email).map(|rgb| rgb.0);
        for (i, p) in points.iter().enumerate() {
            if p.email == email {
                assert_eq!(Some(buffers.color(i)), expected);
            }
        }
    }
}

#[test]
fn search_for_python_finds_only_the_matching_title() {
    let points: Vec<ConversationPoint> = (0..12)
        .map(|i| {
            let title = if i == 7 { "Learning PyThOn generators".to_string() } else { format!("Topic {i}") };
            point("dana@example.com", &title, [i as f32, 0.0, 0.0])
        })
        .collect();

    let criteria = FilterCriteria {
        search: "python".to_string(),
        ..FilterCriteria::default()
    };
    let mut positions = Vec::new();
    let visible = VisibilityFilter::default().apply(&points, &criteria, &mut positions);

    assert_eq!(visible.iter().collect::<Vec<_>>(), vec![7]);
}

#[test]
fn drag_sequence_orbits_by_pixel_delta() {
    let mut camera = default_camera();
    let mut controller = CameraController::new(std::time::Duration::from_secs(2));
    let (theta, phi) = (camera.theta, camera.phi);

    controller.pointer_down((100.0, 100.0));
    assert!(!controller.auto_rotate());
    controller.pointer_move((140.0, 130.0), &mut camera);
    controller.pointer_up(Instant::now());

    assert_relative_eq!(camera.theta, theta - 0.40, epsilon = 1e-5);
    assert_relative_eq!(camera.phi, phi + 0.30, epsilon = 1e-5);
    assert!(!controller.is_dragging());
    assert!(controller.resume_at().is_some());
}

#[test]
fn stronger_connections_draw_more_opaque_lines() {
    let a = point("alice@company.com", "A", [0.0, 0.0, 0.0]);
    let b = point("bob@startup.io", "B", [1.0, 1.0, 1.0]);
    let connections = vec![
        SharedConnection {
            conversation1: a.clone(),
            conversation2: b.clone(),
            similarity: 0.9,
        },
        SharedConnection {
            conversation1: a,
            conversation2: b,
            similarity: 0.5,
        },
    ];

    let mut overlay = ComparisonOverlay::default();
    overlay.rebuild(&connections);

    let segments = overlay.segments();
    assert_eq!(segments.len(), 2);
    assert!(segments[0].color[3] > segments[1].color[3]);
    assert_eq!(segments[0].start, [0.0, 0.0, 0.0]);
    assert_eq!(segments[0].end, [1.0, 1.0, 1.0]);
}

struct OfflineSource;

impl DataSource for OfflineSource {
    fn fetch_data(&self) -> Result<DataResponse> {
        Err(VizError::Http("connection refused".to_string()))
    }

    fn refresh(&self) -> Result<DataResponse> {
        Err(VizError::HttpStatus {
            code: 500,
            message: "recompute failed".to_string(),
        })
    }

    fn compare(&self, _email1: &str, _email2: &str) -> Result<Vec<SharedConnection>> {
        Err(VizError::Http("connection refused".to_string()))
    }
}

#[test]
fn failed_fetch_shows_fallback_data() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut viewer = ViewerState::with_rng(&ViewerConfig::default(), 1.5, StdRng::seed_from_u64(1));

    let request = viewer.begin_data_request();
    assert_eq!(viewer.status(), &DataStatus::Loading);
    let data = load_or_fallback(&OfflineSource, LoadKind::Initial, &mut rng);
    assert!(viewer.apply_data(request, data));

    assert!(matches!(viewer.status(), DataStatus::Fallback { .. }));
    assert!(viewer.points().len() >= 300);
    assert_eq!(viewer.visible().len(), viewer.points().len());
    assert_eq!(viewer.stats().total_conversations, viewer.points().len());

    let request = viewer.begin_data_request();
    let data = load_or_fallback(&OfflineSource, LoadKind::Refresh, &mut rng);
    assert!(viewer.apply_data(request, data));
    match viewer.status() {
        DataStatus::Fallback { reason } => assert!(reason.contains("recompute failed")),
        other => panic!("unexpected status {other:?}"),
    }
}
