//! # User Interface Module
//!
//! Dear ImGui overlay for the viewer.
//!
//! - [`UiManager`] - ImGui context, winit input glue and wgpu renderer
//! - [`panel`] - the viewer's panels and the hover tooltip
//!
//! ## Input Handling
//!
//! Events go to ImGui first. When the pointer is over a panel ImGui captures
//! it and the scene does not orbit, zoom or pick.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{viewer_panels, UiActions};
