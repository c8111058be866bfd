//! Tunables for the two demos.
//!
//! Every field defaults to the value the demos were designed around, so an
//! empty or missing config file reproduces the stock behavior.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Root directory (native) or base URL (wasm) that asset paths are resolved against.
    pub asset_root: String,
    pub ground_diffuse_texture: String,
    pub ground_normal_texture: String,
    pub character_model: String,
    pub ground_size: f32,
    pub ground_uv_scale: f32,
    /// World units per second.
    pub camera_speed: f32,
    /// World units per second.
    pub character_speed: f32,
    /// Travel ends once the proxy is at most this far from the target.
    pub stop_distance: f32,
    pub camera_container_position: glam::Vec3,
    pub camera_local_position: glam::Vec3,
    pub camera_local_target: glam::Vec3,
    pub light_direction: glam::Vec3,
    pub idle_clip: String,
    pub running_clip: String,
    pub clear_color: [f64; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            ground_diffuse_texture: "textures/groundTexDiffuse.jpg".into(),
            ground_normal_texture: "textures/groundTexNormal.jpg".into(),
            character_model: "models/character.glb".into(),
            ground_size: 50.0,
            ground_uv_scale: 10.0,
            camera_speed: 3.0,
            character_speed: 3.0,
            stop_distance: 1.1,
            camera_container_position: glam::Vec3::new(0.0, 15.0, 0.0),
            camera_local_position: glam::Vec3::new(0.0, 0.0, -5.0),
            camera_local_target: glam::Vec3::new(0.0, -10.0, 0.0),
            light_direction: glam::Vec3::new(0.0, 20.0, 0.0),
            idle_clip: "idle".into(),
            running_clip: "running".into(),
            clear_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_asset_root() -> String {
    "assets".into()
}

#[cfg(target_arch = "wasm32")]
fn default_asset_root() -> String {
    String::new()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub capacity: usize,
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub marker_radius: f32,
    pub line_color: [f32; 4],
    pub background: [f64; 4],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            width: 640.0,
            height: 400.0,
            margin_top: 20.0,
            margin_right: 20.0,
            margin_bottom: 20.0,
            margin_left: 20.0,
            marker_radius: 2.5,
            line_color: [0.0, 0.0, 0.0, 1.0],
            background: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

pub fn from_ron_str<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, ConfigError> {
    Ok(ron::from_str(text)?)
}

/// Loads a config file, falling back to defaults when no path is given.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_or_default<T>(path: Option<&std::path::Path>) -> Result<T, ConfigError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Loaded config from {}", path.display());
    from_ron_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: SceneConfig = from_ron_str("()").unwrap();
        assert_eq!(cfg, SceneConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg: SceneConfig = from_ron_str("(character_speed: 6.0, stop_distance: 0.5)").unwrap();
        assert_eq!(cfg.character_speed, 6.0);
        assert_eq!(cfg.stop_distance, 0.5);
        assert_eq!(cfg.camera_speed, 3.0);
    }

    #[test]
    fn plot_defaults_match_chart_layout() {
        let cfg = PlotConfig::default();
        assert_eq!(cfg.capacity, 200);
        assert_eq!((cfg.width, cfg.height), (640.0, 400.0));
    }

    #[test]
    fn bad_syntax_is_reported() {
        assert!(from_ron_str::<PlotConfig>("(capacity: )").is_err());
    }
}
