//! Usage: `scene [config.ron]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config: walkabout::SceneConfig = walkabout::config::load_or_default(path.as_deref())?;
    walkabout::app::scene_view::run(config)
}

#[cfg(target_arch = "wasm32")]
fn main() {}
