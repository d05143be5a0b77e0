//! # Prelude
//!
//! Common imports for driving the viewer from code or tests.
//!
//! ```rust
//! use wrapped_viz::prelude::*;
//!
//! let viewer = ViewerState::new(&ViewerConfig::default(), 1.5);
//! assert!(viewer.points().is_empty());
//! ```

pub use crate::config::ViewerConfig;
pub use crate::data::{
    ConversationPoint, DataOrigin, DataSource, LoadKind, LoadedData, SharedConnection, Stats,
};
pub use crate::error::{Result, VizError};
pub use crate::gfx::camera::{CameraController, DragState, OrbitCamera};
pub use crate::gfx::picking::CanvasRect;
pub use crate::gfx::point_cloud::{ColorAssignment, ColorMode};
pub use crate::gfx::visibility::{CategoryFilter, FilterCriteria, VisibilityFilter, VisibleSet};
pub use crate::viewer::{DataStatus, ViewerState};
