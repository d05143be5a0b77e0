//! Viewer configuration
//!
//! Settings come from built-in defaults, then an optional TOML file, then a
//! handful of `WRAPPED_VIZ_*` environment variables for the values people
//! actually tweak between runs.
//!
//! ```toml
//! current_user = "alice@company.com"
//!
//! [api]
//! base_url = "http://localhost:8000/api"
//!
//! [camera]
//! min_radius = 8.0
//! max_radius = 80.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VizError};
use crate::gfx::point_cloud::palette::ColorMode;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "wrapped-viz.toml";

pub const ENV_CONFIG_PATH: &str = "WRAPPED_VIZ_CONFIG";
pub const ENV_API_BASE_URL: &str = "WRAPPED_VIZ_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "WRAPPED_VIZ_API_TIMEOUT_MS";
pub const ENV_CURRENT_USER: &str = "WRAPPED_VIZ_CURRENT_USER";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub api: ApiConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub picking: PickingConfig,
    pub filter: FilterConfig,
    /// Email of the person looking at the cloud. Falls back to the first
    /// user (sorted) once data arrives.
    pub current_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub health_check: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 30_000,
            health_check: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub zoom_step: f32,
    pub orbit_sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 25.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_4,
            min_radius: 8.0,
            max_radius: 80.0,
            zoom_step: 0.1,
            orbit_sensitivity: 0.01,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub point_size: f32,
    /// Auto-rotation speed in radians per second.
    pub rotation_speed: f32,
    pub glow_intensity: f32,
    pub resume_delay_ms: u64,
    pub color_mode: ColorMode,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            point_size: 1.2,
            rotation_speed: 0.3,
            glow_intensity: 0.8,
            resume_delay_ms: 2000,
            color_mode: ColorMode::ByUser,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Maximum world-space distance between the pointer ray and a point.
    pub threshold: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Coordinate hidden points are parked at, on all three axes.
    pub sentinel: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { sentinel: 10_000.0 }
    }
}

impl ViewerConfig {
    /// Loads `WRAPPED_VIZ_CONFIG` (or `wrapped-viz.toml` if present), then
    /// applies environment overrides and validates the result.
    pub fn from_default_sources() -> Result<Self> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE_NAME);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            VizError::Config(format!("read config file failed ({}): {err}", path.display()))
        })?;
        Self::from_toml_str(&content).map_err(|err| match err {
            VizError::Config(message) => {
                VizError::Config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| VizError::Config(format!("parse config failed: {err}")))
    }

    /// Applies overrides read through `getter`; blank values are ignored.
    pub fn apply_env_with<F>(&mut self, mut getter: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut read = |key: &str| getter(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = read(ENV_API_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(value) = read(ENV_API_TIMEOUT_MS) {
            self.api.timeout_ms = value
                .trim()
                .parse::<u64>()
                .map_err(|_| VizError::Config(format!("invalid timeout value: {value}")))?;
        }
        if let Some(user) = read(ENV_CURRENT_USER) {
            self.current_user = Some(user);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        let camera_values = [
            ("radius", camera.radius),
            ("theta", camera.theta),
            ("phi", camera.phi),
            ("min_radius", camera.min_radius),
            ("max_radius", camera.max_radius),
            ("zoom_step", camera.zoom_step),
            ("orbit_sensitivity", camera.orbit_sensitivity),
            ("fov_degrees", camera.fov_degrees),
            ("near", camera.near),
            ("far", camera.far),
        ];
        if let Some((name, value)) = camera_values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(VizError::Config(format!("camera.{name} must be finite, got {value}")));
        }
        if !(camera.min_radius > 0.0) || camera.min_radius > camera.max_radius {
            return Err(VizError::Config(format!(
                "camera radius bounds must satisfy 0 < min <= max (got {}..{})",
                camera.min_radius, camera.max_radius
            )));
        }
        if !(camera.zoom_step > 0.0 && camera.zoom_step < 1.0) {
            return Err(VizError::Config(format!(
                "camera.zoom_step must be in (0, 1), got {}",
                camera.zoom_step
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(VizError::Config(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.orbit_sensitivity > 0.0) {
            return Err(VizError::Config(format!(
                "camera.orbit_sensitivity must be positive, got {}",
                camera.orbit_sensitivity
            )));
        }
        if !(camera.near > 0.0) || camera.near >= camera.far {
            return Err(VizError::Config(format!(
                "camera clip planes must satisfy 0 < near < far (got {}..{})",
                camera.near, camera.far
            )));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(VizError::Config("api.base_url is empty".to_string()));
        }
        if !(self.picking.threshold > 0.0) {
            return Err(VizError::Config(format!(
                "picking.threshold must be positive, got {}",
                self.picking.threshold
            )));
        }
        Ok(())
    }
}
