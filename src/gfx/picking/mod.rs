//! # Point Picking
//!
//! Hover and click resolution for the point cloud using pointer ray-casting.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: Convert window coordinates to NDC using the canvas
//!    rect, then unproject through the camera into a world-space ray
//! 2. **Ray-Point Intersection**: Every point within `threshold` of the ray
//!    is a hit, ordered by distance from the camera along the ray
//! 3. **Visibility**: The nearest hit is reported only if it is in the
//!    current [`VisibleSet`]; parked points never become hovered
//!
//! ## Usage
//!
//! ```no_run
//! # use wrapped_viz::gfx::picking::{CanvasRect, PointPicker};
//! # use wrapped_viz::gfx::visibility::VisibleSet;
//! # use wrapped_viz::gfx::camera::OrbitCamera;
//! # let camera = OrbitCamera::new(25.0, 0.0, 1.0, 1.0);
//! # let positions: Vec<f32> = Vec::new();
//! # let visible = VisibleSet::default();
//! let mut picker = PointPicker::new(0.5);
//! let rect = CanvasRect::new(0.0, 0.0, 1280.0, 720.0);
//! if let Some(hover) = picker.pointer_moved((640.0, 360.0), rect, &camera, &positions, &visible) {
//!     println!("hovering point {}", hover.index);
//! }
//! ```

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

use crate::gfx::{camera::orbit_camera::OrbitCamera, visibility::VisibleSet};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Closest point on the ray to `point`; the origin when `point` lies behind.
    pub fn closest_point_to(&self, point: Vector3<f32>) -> Vector3<f32> {
        let t = (point - self.origin).dot(self.direction);
        self.point_at(t.max(0.0))
    }
}

/// Window-space rectangle the scene is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Pointer position to normalized device coordinates, +Y up.
    pub fn to_ndc(&self, pointer: (f32, f32)) -> (f32, f32) {
        let x = (pointer.0 - self.left) / self.width * 2.0 - 1.0;
        let y = -((pointer.1 - self.top) / self.height) * 2.0 + 1.0;
        (x, y)
    }
}

/// Convert normalized device coordinates to a world-space ray starting at the eye
pub fn screen_to_ray(ndc: (f32, f32), camera: &OrbitCamera) -> Ray {
    let (ndc_x, ndc_y) = ndc;

    // GL-style clip space, depth -1..1
    let eye = Point3::from_vec(camera.eye);
    let target = Point3::from_vec(camera.target);
    let view_matrix = Matrix4::look_at_rh(eye, target, camera.up);
    let proj_matrix = cgmath::perspective(camera.fovy, camera.aspect, camera.znear, camera.zfar);
    let inv_view_proj = (proj_matrix * view_matrix)
        .invert()
        .unwrap_or(Matrix4::from_scale(1.0));

    let world_near = inv_view_proj * Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
    let world_far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
    let near_3d = world_near.truncate() / world_near.w;
    let far_3d = world_far.truncate() / world_far.w;

    Ray::new(camera.eye, far_3d - near_3d)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    pub index: usize,
    /// Distance from the ray origin to the closest point on the ray.
    pub distance: f32,
    /// Perpendicular distance between the point and the ray.
    pub distance_to_ray: f32,
}

/// All points within `threshold` of the ray and inside `[near, far]`,
/// nearest first. `positions` holds three floats per point.
pub fn intersect_points(ray: &Ray, positions: &[f32], threshold: f32, near: f32, far: f32) -> Vec<PointHit> {
    let threshold_sq = threshold * threshold;
    let mut hits: Vec<PointHit> = positions
        .chunks_exact(3)
        .enumerate()
        .filter_map(|(index, p)| {
            let point = Vector3::new(p[0], p[1], p[2]);
            let closest = ray.closest_point_to(point);
            let distance_sq = (point - closest).magnitude2();
            if distance_sq >= threshold_sq {
                return None;
            }
            let distance = (closest - ray.origin).magnitude();
            if distance < near || distance > far {
                return None;
            }
            Some(PointHit {
                index,
                distance,
                distance_to_ray: distance_sq.sqrt(),
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// A hovered point plus the pointer position, for tooltip placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    pub index: usize,
    pub pointer: (f32, f32),
}

/// Tracks the hovered and selected point.
#[derive(Debug, Clone)]
pub struct PointPicker {
    pub threshold: f32,
    hovered: Option<Hover>,
    selected: Option<usize>,
}

impl PointPicker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            hovered: None,
            selected: None,
        }
    }

    pub fn hovered(&self) -> Option<Hover> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Resolves the hover under `pointer`. Only the nearest hit is
    /// considered; if it is not visible nothing is hovered.
    pub fn pointer_moved(
        &mut self,
        pointer: (f32, f32),
        rect: CanvasRect,
        camera: &OrbitCamera,
        positions: &[f32],
        visible: &VisibleSet,
    ) -> Option<Hover> {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            self.hovered = None;
            return None;
        }

        let ray = screen_to_ray(rect.to_ndc(pointer), camera);
        let nearest = intersect_points(&ray, positions, self.threshold, camera.znear, camera.zfar)
            .into_iter()
            .next();

        self.hovered = nearest
            .filter(|hit| visible.contains(hit.index))
            .map(|hit| Hover {
                index: hit.index,
                pointer,
            });
        self.hovered
    }

    /// Selects the hovered point, if any. Selection is sticky otherwise.
    pub fn click(&mut self) -> Option<usize> {
        if let Some(hover) = self.hovered {
            self.selected = Some(hover.index);
        }
        self.selected
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Forgets hover and selection, e.g. when the point set is replaced.
    pub fn reset(&mut self) {
        self.hovered = None;
        self.selected = None;
    }
}
