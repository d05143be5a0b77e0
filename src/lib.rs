// src/lib.rs
//! Wrapped.ai conversation viewer
//!
//! Renders a user's conversation history as a rotating 3D point cloud with
//! search, cluster filtering, picking and a shared-connection comparison
//! overlay. Built on winit, wgpu and Dear ImGui.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::WrappedApp;
pub use config::ViewerConfig;
pub use error::{Result, VizError};
pub use viewer::ViewerState;
