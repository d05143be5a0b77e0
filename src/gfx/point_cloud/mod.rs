//! CPU side of the point cloud: colours, sizes and positions.

pub mod builder;
pub mod palette;

pub use builder::{PointCloudBuffers, PointCloudBuilder};
pub use palette::{ColorAssignment, ColorMode, Rgb};
