use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("invalid glTF data: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid image data: {0}")]
    Image(#[from] image::ImageError),
    #[error("model contains no triangle meshes")]
    EmptyModel,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
