pub mod animation;
pub mod app;
pub mod assets;
pub mod camera;
pub mod character;
pub mod chart;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod light;
pub mod line;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod renderer;
pub mod scene;
pub mod texture;
pub mod winit_integration;

pub use config::{PlotConfig, SceneConfig};
pub use error::{AssetError, ConfigError};
