// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, GPU buffers and frame submission.

pub mod line_renderer;
pub mod pipeline_manager;
pub mod point_renderer;
pub mod render_engine;
pub mod scene_bindings;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use point_renderer::{build_instances, PointInstance};
pub use render_engine::RenderEngine;
