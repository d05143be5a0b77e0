// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Typed wrappers around uniform and vertex buffers.

pub mod uniform_buffer;

// Re-export main types
pub use uniform_buffer::{UniformBuffer, VertexArrayBuffer};
