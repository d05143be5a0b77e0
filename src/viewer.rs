//! The viewer's owned render context.
//!
//! [`ViewerState`] holds every piece of mutable scene state: camera rig,
//! drag controller, point buffers, visibility, picking and the comparison
//! overlay. Input handlers, the frame tick and teardown all go through it,
//! so there is exactly one owner and one place to stop the loop.
//!
//! Nothing here touches the GPU. The app reads [`ViewerState::take_point_upload`]
//! and [`ViewerState::take_line_upload`] after each change and pushes the
//! results to the render engine.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ViewerConfig;
use crate::data::model::{unique_cluster_titles, unique_users};
use crate::data::{ConversationPoint, DataOrigin, LoadedData, RequestId, RequestTracker, SharedConnection, Stats};
use crate::error::Result;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::overlay::{ComparisonOverlay, LineSegment};
use crate::gfx::picking::{CanvasRect, Hover, PointPicker};
use crate::gfx::point_cloud::{ColorAssignment, ColorMode, PointCloudBuffers, PointCloudBuilder};
use crate::gfx::render_loop::RenderLoop;
use crate::gfx::rendering::{build_instances, PointInstance};
use crate::gfx::visibility::{CategoryFilter, ComparisonPair, FilterCriteria, VisibilityFilter, VisibleSet};

pub const COMPARE_NO_USER: &str = "Current user not set.";
pub const COMPARE_FAILED: &str = "Could not load shared connections.";

/// Operator-tunable scene parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    pub point_size: f32,
    /// Radians per second of auto-rotation.
    pub rotation_speed: f32,
    pub glow_intensity: f32,
    pub color_mode: ColorMode,
}

/// What the status indicator shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DataStatus {
    Loading,
    Live,
    Fallback { reason: String },
}

/// A comparison the app should fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub id: RequestId,
    pub current_user: String,
    pub target: String,
}

#[derive(Debug, Default)]
pub struct ComparisonState {
    /// Target of the request in flight, if any.
    pending: Option<String>,
    active: Option<ComparisonPair>,
    connections: Vec<SharedConnection>,
    error: Option<String>,
}

impl ComparisonState {
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn active(&self) -> Option<&ComparisonPair> {
        self.active.as_ref()
    }

    pub fn connections(&self) -> &[SharedConnection] {
        &self.connections
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct ViewerState {
    pub camera: CameraManager,
    pub controls: Controls,
    render_loop: RenderLoop,
    picker: PointPicker,
    filter: VisibilityFilter,
    builder: PointCloudBuilder,
    rng: StdRng,

    points: Vec<ConversationPoint>,
    stats: Stats,
    last_updated: String,
    status: DataStatus,
    colors: ColorAssignment,
    buffers: PointCloudBuffers,
    display_positions: Vec<f32>,
    visible: VisibleSet,
    clusters: Vec<String>,
    users: Vec<String>,
    configured_user: Option<String>,
    current_user: Option<String>,

    criteria: FilterCriteria,
    comparison: ComparisonState,
    overlay: ComparisonOverlay,

    data_requests: RequestTracker,
    compare_requests: RequestTracker,

    points_dirty: bool,
    lines_dirty: bool,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig, aspect: f32) -> Self {
        Self::with_rng(config, aspect, StdRng::from_os_rng())
    }

    /// Deterministic construction for tests and replays.
    pub fn with_rng(config: &ViewerConfig, aspect: f32, rng: StdRng) -> Self {
        let camera = OrbitCamera::from_config(&config.camera, aspect);
        let controller =
            CameraController::new(Duration::from_millis(config.controls.resume_delay_ms));
        let controls = Controls {
            point_size: config.controls.point_size,
            rotation_speed: config.controls.rotation_speed,
            glow_intensity: config.controls.glow_intensity,
            color_mode: config.controls.color_mode,
        };

        Self {
            camera: CameraManager::new(camera, controller),
            controls,
            render_loop: RenderLoop::new(),
            picker: PointPicker::new(config.picking.threshold),
            filter: VisibilityFilter::new(config.filter.sentinel),
            builder: PointCloudBuilder::default(),
            rng,
            points: Vec::new(),
            stats: Stats::default(),
            last_updated: String::new(),
            status: DataStatus::Loading,
            colors: ColorAssignment::assign(&[], controls.color_mode),
            buffers: PointCloudBuffers::default(),
            display_positions: Vec::new(),
            visible: VisibleSet::default(),
            clusters: Vec::new(),
            users: Vec::new(),
            configured_user: config.current_user.clone(),
            current_user: config.current_user.clone(),
            criteria: FilterCriteria::default(),
            comparison: ComparisonState::default(),
            overlay: ComparisonOverlay::default(),
            data_requests: RequestTracker::default(),
            compare_requests: RequestTracker::default(),
            points_dirty: true,
            lines_dirty: true,
        }
    }

    // --- data ---------------------------------------------------------

    /// Starts a load or refresh; only the returned id's response will be
    /// applied. The scene keeps rendering the current points meanwhile.
    pub fn begin_data_request(&mut self) -> RequestId {
        self.status = DataStatus::Loading;
        self.data_requests.issue()
    }

    /// Replaces the whole point set. Returns `false` for a stale response.
    pub fn apply_data(&mut self, id: RequestId, data: LoadedData) -> bool {
        if !self.data_requests.is_current(id) {
            info!("dropping stale data response {id:?}");
            return false;
        }

        self.status = match data.origin {
            DataOrigin::Api => DataStatus::Live,
            DataOrigin::Fallback { reason } => DataStatus::Fallback { reason },
        };
        self.points = data.points;
        self.stats = data.stats;
        self.last_updated = data.last_updated;
        self.users = unique_users(&self.points);
        self.clusters = unique_cluster_titles(&self.points);
        self.current_user = self
            .configured_user
            .clone()
            .or_else(|| self.users.first().cloned());

        if let CategoryFilter::Cluster(title) = &self.criteria.category {
            if !self.clusters.contains(title) {
                self.criteria.category = CategoryFilter::All;
            }
        }

        self.picker.reset();
        self.exit_comparison();
        self.rebuild_buffers();
        info!(
            "showing {} points ({} users, {} clusters)",
            self.points.len(),
            self.users.len(),
            self.clusters.len()
        );
        true
    }

    pub fn points(&self) -> &[ConversationPoint] {
        &self.points
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn last_updated(&self) -> &str {
        &self.last_updated
    }

    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Changing the user ends any comparison started on behalf of the
    /// previous one.
    pub fn set_current_user(&mut self, email: Option<String>) {
        if self.current_user == email {
            return;
        }
        self.current_user = email;
        if self.comparison.active.is_some() || self.comparison.pending.is_some() {
            self.exit_comparison();
        }
    }

    // --- colour and filters -------------------------------------------

    pub fn colors(&self) -> &ColorAssignment {
        &self.colors
    }

    pub fn buffers(&self) -> &PointCloudBuffers {
        &self.buffers
    }

    pub fn display_positions(&self) -> &[f32] {
        &self.display_positions
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Switching colour mode rebuilds colours and sizes.
    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if self.controls.color_mode == mode {
            return;
        }
        self.controls.color_mode = mode;
        self.rebuild_buffers();
    }

    pub fn set_search(&mut self, search: &str) {
        if self.criteria.search == search {
            return;
        }
        self.criteria.search = search.to_string();
        self.refilter();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        if self.criteria.category == category {
            return;
        }
        self.criteria.category = category;
        self.refilter();
    }

    fn rebuild_buffers(&mut self) {
        self.colors = ColorAssignment::assign(&self.points, self.controls.color_mode);
        self.buffers = self.builder.build(&self.points, &self.colors, &mut self.rng);
        self.refilter();
    }

    /// Recomputes the visible set and display positions from the current
    /// criteria.
    pub fn refilter(&mut self) {
        self.visible = self
            .filter
            .apply(&self.points, &self.criteria, &mut self.display_positions);
        if let Some(hover) = self.picker.hovered() {
            if !self.visible.contains(hover.index) {
                self.picker.clear_hover();
            }
        }
        self.points_dirty = true;
        debug!("{} of {} points visible", self.visible.len(), self.points.len());
    }

    // --- comparison ---------------------------------------------------

    pub fn comparison(&self) -> &ComparisonState {
        &self.comparison
    }

    pub fn overlay(&self) -> &ComparisonOverlay {
        &self.overlay
    }

    /// Starts a comparison between the current user and `target`. Without
    /// a current user the error is shown instead and nothing is fetched.
    pub fn begin_comparison(&mut self, target: &str) -> Option<ComparisonRequest> {
        let Some(current_user) = self.current_user.clone() else {
            warn!("comparison requested without a current user");
            self.comparison.error = Some(COMPARE_NO_USER.to_string());
            return None;
        };

        self.comparison.error = None;
        self.comparison.pending = Some(target.to_string());
        Some(ComparisonRequest {
            id: self.compare_requests.issue(),
            current_user,
            target: target.to_string(),
        })
    }

    /// Applies a comparison result. A failure leaves the scene untouched
    /// apart from the error message. Returns `false` for a stale response.
    pub fn apply_comparison(
        &mut self,
        id: RequestId,
        request: &ComparisonRequest,
        result: Result<Vec<SharedConnection>>,
    ) -> bool {
        if !self.compare_requests.is_current(id) {
            info!("dropping stale comparison response {id:?}");
            return false;
        }
        self.comparison.pending = None;

        match result {
            Ok(connections) => {
                info!(
                    "{} shared connections between {} and {}",
                    connections.len(),
                    request.current_user,
                    request.target
                );
                let pair = ComparisonPair {
                    current_user: request.current_user.clone(),
                    target: request.target.clone(),
                };
                self.overlay.rebuild(&connections);
                self.comparison.connections = connections;
                self.comparison.active = Some(pair.clone());
                self.criteria.comparison = Some(pair);
                self.lines_dirty = true;
                self.refilter();
            }
            Err(err) => {
                warn!("comparison failed: {err}");
                self.comparison.error = Some(COMPARE_FAILED.to_string());
            }
        }
        true
    }

    /// Ends an active or pending comparison. Returns `false` when there was
    /// nothing to cancel.
    pub fn cancel_comparison(&mut self) -> bool {
        if self.comparison.active.is_none() && self.comparison.pending.is_none() {
            return false;
        }
        self.exit_comparison();
        true
    }

    /// Leaves comparison mode and clears the overlay. Any request still in
    /// flight is invalidated.
    pub fn exit_comparison(&mut self) {
        let was_active = self.comparison.active.is_some() || self.comparison.pending.is_some();
        if self.comparison.pending.is_some() {
            self.compare_requests.issue();
        }
        self.comparison = ComparisonState::default();
        self.overlay.clear();
        self.lines_dirty = true;
        if self.criteria.comparison.take().is_some() {
            self.refilter();
        }
        if was_active {
            info!("left comparison mode");
        }
    }

    // --- input ----------------------------------------------------------

    pub fn hovered(&self) -> Option<Hover> {
        self.picker.hovered()
    }

    pub fn selected(&self) -> Option<usize> {
        self.picker.selected()
    }

    pub fn selected_point(&self) -> Option<&ConversationPoint> {
        self.picker.selected().and_then(|index| self.points.get(index))
    }

    pub fn hovered_point(&self) -> Option<&ConversationPoint> {
        self.picker.hovered().and_then(|hover| self.points.get(hover.index))
    }

    pub fn is_dragging(&self) -> bool {
        self.camera.controller.is_dragging()
    }

    pub fn pointer_pressed(&mut self, position: (f32, f32)) {
        self.camera.controller.pointer_down(position);
    }

    /// Orbits while dragging and refreshes the hover under the pointer.
    pub fn pointer_moved(&mut self, position: (f32, f32), rect: CanvasRect) -> Option<Hover> {
        self.camera
            .controller
            .pointer_move(position, &mut self.camera.camera);
        self.picker.pointer_moved(
            position,
            rect,
            &self.camera.camera,
            &self.display_positions,
            &self.visible,
        )
    }

    /// Ends a drag; a release over a visible point selects it.
    pub fn pointer_released(&mut self, now: Instant) -> Option<usize> {
        self.camera.controller.pointer_up(now);
        self.picker.hovered()?;
        self.picker.click()
    }

    pub fn pointer_left(&mut self) {
        self.picker.clear_hover();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.camera
            .controller
            .wheel(delta_y, &mut self.camera.camera);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.camera.resize_projection(width, height);
    }

    // --- frame ----------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Advances one frame. Returns `false` once the loop has been stopped.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(dt) = self.render_loop.begin_frame(now) else {
            return false;
        };
        self.camera.tick(dt, self.controls.rotation_speed, now);
        true
    }

    /// Instances to upload if the point buffers changed since last taken.
    pub fn take_point_upload(&mut self) -> Option<Vec<PointInstance>> {
        if !self.points_dirty {
            return None;
        }
        self.points_dirty = false;
        Some(build_instances(&self.buffers, &self.display_positions))
    }

    /// Segments to upload if the overlay changed since last taken.
    pub fn take_line_upload(&mut self) -> Option<&[LineSegment]> {
        if !self.lines_dirty {
            return None;
        }
        self.lines_dirty = false;
        Some(self.overlay.segments())
    }

    /// Stops the render loop and invalidates every request in flight so
    /// late responses are dropped.
    pub fn teardown(&mut self) {
        self.render_loop.stop();
        self.data_requests.issue();
        self.compare_requests.issue();
        self.comparison.pending = None;
        self.picker.clear_hover();
        info!("viewer torn down");
    }
}
