//! Tunables for meshing, ray queries and the spectator controller.

use std::path::Path;

use serde::{ Deserialize, Serialize };

use crate::{
    error::ConfigError,
    mesh::NormalMode,
};

/// Settings shared by [`VoxelScene`](crate::VoxelScene) and
/// [`Spectator`](crate::controller::Spectator).
///
/// Every field has a default, so a config file only needs the values it
/// overrides:
///
/// ```
/// let config = voxel_march::MarchConfig::from_json_str(r#"{ "iso_level": 0.5 }"#).unwrap();
/// assert_eq!(config.iso_level, 0.5);
/// assert_eq!(config.ray_distance, 1000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchConfig {
    /// Density at or above which a voxel counts as solid.
    pub iso_level: f32,
    /// How mesh normals are emitted.
    pub normals: NormalMode,
    /// Maximum distance of the interaction ray, in world units.
    pub ray_distance: f32,
    /// Density added or removed per second while an edit button is held.
    pub interaction_rate: f32,
    /// Camera speed in world units per second.
    pub move_speed: f32,
    /// Degrees of rotation per unit of pointer velocity.
    pub look_sensitivity: f32,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            iso_level: 0.15,
            normals: NormalMode::Normalized,
            ray_distance: 1000.0,
            interaction_rate: 5.0,
            move_speed: 30.0,
            look_sensitivity: 1.18 * 0.05,
        }
    }
}

impl MarchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid { message: message.to_string() });

        if !self.iso_level.is_finite() {
            return invalid("iso_level must be finite");
        }
        if !(self.ray_distance.is_finite() && self.ray_distance > 0.0) {
            return invalid("ray_distance must be positive");
        }
        if !(self.interaction_rate.is_finite() && self.interaction_rate >= 0.0) {
            return invalid("interaction_rate must not be negative");
        }
        if !(self.move_speed.is_finite() && self.move_speed >= 0.0) {
            return invalid("move_speed must not be negative");
        }
        if !self.look_sensitivity.is_finite() {
            return invalid("look_sensitivity must be finite");
        }
        Ok(())
    }
}

#[test]
fn default_config_is_valid() {
    let config = MarchConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.iso_level, 0.15);
    assert_eq!(config.normals, NormalMode::Normalized);
}

#[test]
fn partial_json_keeps_defaults() {
    let config = MarchConfig::from_json_str(r#"{ "normals": "accumulated", "move_speed": 4.0 }"#).unwrap();
    assert_eq!(config.normals, NormalMode::Accumulated);
    assert_eq!(config.move_speed, 4.0);
    assert_eq!(config.interaction_rate, 5.0);
}

#[test]
fn rejects_bad_values() {
    assert!(matches!(
        MarchConfig::from_json_str(r#"{ "ray_distance": -1.0 }"#),
        Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
        MarchConfig::from_json_str(r#"{ "iso_level": "high" }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.json");
    std::fs::write(&path, r#"{ "iso_level": 0.5, "ray_distance": 64.0 }"#).unwrap();

    let config = MarchConfig::load(&path).unwrap();
    assert_eq!(config.iso_level, 0.5);
    assert_eq!(config.ray_distance, 64.0);

    assert!(matches!(MarchConfig::load(dir.path().join("missing.json")), Err(ConfigError::Io(_))));
}
