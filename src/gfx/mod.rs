//! # Graphics Module
//!
//! Everything between the loaded conversation points and the pixels on
//! screen.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - spherical orbit rig and the drag/wheel controller
//! - **Point cloud** ([`point_cloud`]) - colour assignment and per-point buffers
//! - **Visibility** ([`visibility`]) - search, category and comparison filtering
//! - **Picking** ([`picking`]) - pointer ray casting against the point set
//! - **Overlay** ([`overlay`]) - similarity-weighted connection lines
//! - **Rendering** ([`rendering`]) - wgpu surface, glow and line pipelines
//! - **Render loop** ([`render_loop`]) - per-frame timing and cancellation
//!
//! Only [`rendering`] touches the GPU. The rest is plain data and can be
//! driven from tests.

pub mod camera;
pub mod overlay;
pub mod picking;
pub mod point_cloud;
pub mod render_loop;
pub mod rendering;
pub mod visibility;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
