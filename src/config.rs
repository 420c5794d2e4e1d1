//! Start-up settings
//!
//! [`StudioConfig`] carries every tunable default of the studio: window and
//! output sizes, camera defaults and bounds, controller sensitivities and
//! model import options. All fields have defaults, so a settings file only
//! needs the values it wants to override.
//!
//! The settings file is read once at start-up and never written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// File looked up in the working directory when no override is given
pub const DEFAULT_CONFIG_FILE: &str = "icon-studio.json";

/// Environment variable pointing at an alternative settings file
pub const CONFIG_ENV_VAR: &str = "ICON_STUDIO_CONFIG";

/// Largest texture edge the renderer requests from the device
pub const MAX_TEXTURE_SIZE: u32 = 4096;

/// Vertical field of view range in degrees, inclusive
pub const FOV_RANGE_DEGREES: (f32, f32) = (1.0, 179.0);

/// Axis that points "up" in a model file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpAxis {
    Y,
    Z,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Degrees
    pub yaw: f32,
    /// Degrees
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            yaw: 35.0,
            pitch: 20.0,
            distance: 100.0,
            fov: 30.0,
            min_pitch: -89.0,
            max_pitch: 89.0,
            min_distance: 10.0,
            max_distance: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Radians per pixel of mouse motion
    pub rotate_speed: f32,
    /// Fraction of the camera distance per pixel of mouse motion
    pub pan_speed: f32,
    /// Fraction of the camera distance per wheel line
    pub zoom_speed: f32,
    /// Radians per pixel of mouse motion while rotating the model
    pub model_rotate_speed: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 0.005,
            pan_speed: 0.002,
            zoom_speed: 0.1,
            model_rotate_speed: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub up_axis: UpAxis,
    pub scale: f32,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub width: u32,
    pub height: u32,
    /// Render at `size * supersample` and downsample; 1, 2 or 4
    pub supersample: u32,
    pub background: [f32; 4],
    pub path: PathBuf,
    pub copy_to_clipboard: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            supersample: 2,
            background: [0.0, 0.0, 0.0, 0.0],
            path: PathBuf::from("icon.png"),
            copy_to_clipboard: true,
        }
    }
}

impl OutputSettings {
    /// Checks the output size against the texture limits
    pub fn validate(&self) -> Result<()> {
        validate_output_size(self.width, self.height, self.supersample)
    }
}

/// Checks that an icon of `width`x`height` rendered at `supersample` fits
/// in a single texture
pub fn validate_output_size(width: u32, height: u32, supersample: u32) -> Result<()> {
    let valid_factor = matches!(supersample, 1 | 2 | 4);
    let fits = |edge: u32| edge >= 1 && edge.saturating_mul(supersample) <= MAX_TEXTURE_SIZE;

    if valid_factor && fits(width) && fits(height) {
        Ok(())
    } else {
        Err(StudioError::InvalidOutputSize {
            width,
            height,
            supersample,
        })
    }
}

/// All start-up settings of the studio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub camera: CameraSettings,
    pub controller: ControllerSettings,
    pub import: ImportSettings,
    pub output: OutputSettings,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 800,
            camera: CameraSettings::default(),
            controller: ControllerSettings::default(),
            import: ImportSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl StudioConfig {
    /// Loads the settings file named by `ICON_STUDIO_CONFIG`, or
    /// `icon-studio.json` in the working directory. A missing file yields
    /// the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    /// Reads and validates a settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| StudioError::io(path, e))?;
        let config = Self::from_json(&json).map_err(|err| match err {
            StudioError::ConfigParse { source, .. } => StudioError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: StudioConfig =
            serde_json::from_str(json).map_err(|source| StudioError::ConfigParse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the camera and renderer cannot honour
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.min_distance > 0.0 && camera.min_distance <= camera.max_distance) {
            return Err(StudioError::Config(format!(
                "distance bounds [{}, {}] must be positive and ordered",
                camera.min_distance, camera.max_distance
            )));
        }
        // At exactly +-90 degrees the view direction is parallel to up
        if !(camera.min_pitch > -90.0
            && camera.max_pitch < 90.0
            && camera.min_pitch <= camera.max_pitch)
        {
            return Err(StudioError::Config(format!(
                "pitch bounds [{}, {}] must be ordered and strictly within (-90, 90)",
                camera.min_pitch, camera.max_pitch
            )));
        }
        let (min_fov, max_fov) = FOV_RANGE_DEGREES;
        if !(min_fov..=max_fov).contains(&camera.fov) {
            return Err(StudioError::Config(format!(
                "field of view {} must be between {} and {} degrees",
                camera.fov, min_fov, max_fov
            )));
        }
        if !(self.import.scale > 0.0) {
            return Err(StudioError::Config(format!(
                "import scale {} must be positive",
                self.import.scale
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(StudioError::Config("window size must be non-zero".into()));
        }
        self.output.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StudioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.min_pitch, -89.0);
        assert_eq!(config.camera.max_pitch, 89.0);
        assert_eq!(config.camera.min_distance, 10.0);
        assert_eq!(config.camera.max_distance, 1000.0);
    }

    #[test]
    fn partial_json_is_filled_with_defaults() {
        let config = StudioConfig::from_json(
            r#"{ "output": { "width": 128, "height": 64 }, "import": { "up_axis": "Z" } }"#,
        )
        .unwrap();

        assert_eq!(config.output.width, 128);
        assert_eq!(config.output.height, 64);
        assert_eq!(config.output.supersample, 2);
        assert_eq!(config.import.up_axis, UpAxis::Z);
        assert_eq!(config.camera, CameraSettings::default());
    }

    #[test]
    fn inverted_distance_bounds_are_rejected() {
        let result = StudioConfig::from_json(
            r#"{ "camera": { "min_distance": 500.0, "max_distance": 20.0 } }"#,
        );
        assert!(matches!(result, Err(StudioError::Config(_))));
    }

    #[test]
    fn vertical_pitch_bounds_are_rejected() {
        let mut config = StudioConfig::default();
        config.camera.max_pitch = 90.0;
        assert!(matches!(config.validate(), Err(StudioError::Config(_))));

        config.camera.max_pitch = 89.9;
        config.camera.min_pitch = -90.0;
        assert!(matches!(config.validate(), Err(StudioError::Config(_))));

        config.camera.min_pitch = -89.9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fov_limits_are_inclusive() {
        let mut config = StudioConfig::default();
        config.camera.fov = FOV_RANGE_DEGREES.1;
        assert!(config.validate().is_ok());
        config.camera.fov = FOV_RANGE_DEGREES.0 - 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let result = StudioConfig::from_json("{ not json");
        assert!(matches!(result, Err(StudioError::ConfigParse { .. })));
    }

    #[test]
    fn output_size_limits() {
        assert!(validate_output_size(256, 256, 2).is_ok());
        assert!(validate_output_size(4096, 1, 1).is_ok());
        assert!(validate_output_size(0, 256, 1).is_err());
        assert!(validate_output_size(2048, 2048, 4).is_err());
        assert!(validate_output_size(256, 256, 3).is_err());
    }

    #[test]
    fn settings_file_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!(
            "icon_studio_config_{}.json",
            std::process::id()
        ));
        let mut config = StudioConfig::default();
        config.output.background = [1.0, 0.5, 0.25, 1.0];
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = StudioConfig::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
