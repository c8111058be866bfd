//! Asset fetching and decoding.
//!
//! Native builds read from a directory on disk, web builds fetch relative
//! to a base URL. Decoding is shared.

use super::animation::{AnimationGroup, AnimationSet};
use super::error::AssetError;
use super::mesh::{Geometry, Vertex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    root: String,
}

impl AssetSource {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let root = self.root.trim_end_matches('/');
        if root.is_empty() {
            path.to_string()
        } else {
            format!("{root}/{path}")
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.resolve(path);
        log::debug!("Reading {full}");
        std::fs::read(&full).map_err(|source| AssetError::Io { path: full, source })
    }

    #[cfg(target_arch = "wasm32")]
    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let url = self.resolve(path);
        log::debug!("Fetching {url}");
        let http_err = |reason: String| AssetError::Http {
            url: url.clone(),
            reason,
        };

        let window = web_sys::window().ok_or_else(|| http_err("no window".into()))?;
        let resp_val = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(|e| http_err(format!("{e:?}")))?;
        let resp: web_sys::Response = resp_val
            .dyn_into()
            .map_err(|e| http_err(format!("{e:?}")))?;
        if !resp.ok() {
            return Err(http_err(format!("HTTP {} {}", resp.status(), resp.status_text())));
        }

        let buf_promise = resp.array_buffer().map_err(|e| http_err(format!("{e:?}")))?;
        let buf = JsFuture::from(buf_promise)
            .await
            .map_err(|e| http_err(format!("{e:?}")))?;
        Ok(js_sys::Uint8Array::new(&buf).to_vec())
    }
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<ImageData, AssetError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Ok(ImageData {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

#[derive(Debug, Clone)]
pub struct ImportedModel {
    /// All triangle primitives baked into the model's root space.
    pub geometry: Geometry,
    pub base_color: glam::Vec3,
    pub animations: AnimationSet,
}

/// Parses a binary or embedded glTF file.
pub fn import_model(bytes: &[u8]) -> Result<ImportedModel, AssetError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;

    let mut geometry = Geometry::default();
    let mut base_color = None;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            collect_node(&node, glam::Mat4::IDENTITY, &buffers, &mut geometry, &mut base_color);
        }
    }
    if geometry.is_empty() {
        return Err(AssetError::EmptyModel);
    }

    let groups = document
        .animations()
        .enumerate()
        .map(|(i, anim)| {
            let (from, to) = anim
                .channels()
                .filter_map(|channel| {
                    let reader = channel.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));
                    reader.read_inputs()
                })
                .flatten()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), t| {
                    (lo.min(t), hi.max(t))
                });
            let (from, to) = if from.is_finite() { (from, to) } else { (0.0, 0.0) };
            let name = anim
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("animation{i}"));
            log::debug!("Animation {name:?}: {from:.2}s..{to:.2}s");
            AnimationGroup::new(name, from, to)
        })
        .collect();

    log::info!(
        "Imported model: {} vertices, {} triangles",
        geometry.vertices.len(),
        geometry.indices.len() / 3
    );
    Ok(ImportedModel {
        geometry,
        base_color: base_color.unwrap_or(glam::Vec3::ONE),
        animations: AnimationSet::new(groups),
    })
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: glam::Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Geometry,
    base_color: &mut Option<glam::Vec3>,
) {
    let world = parent * glam::Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping {:?} primitive", primitive.mode());
                continue;
            }
            let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<glam::Vec3> = positions.map(glam::Vec3::from).collect();
            let normals: Vec<glam::Vec3> = reader
                .read_normals()
                .map(|n| n.map(glam::Vec3::from).collect())
                .unwrap_or_default();
            let uvs: Vec<glam::Vec2> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().map(glam::Vec2::from).collect())
                .unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let part = Geometry {
                vertices: positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        Vertex::new(
                            *p,
                            normals.get(i).copied().unwrap_or(glam::Vec3::Y),
                            uvs.get(i).copied().unwrap_or(glam::Vec2::ZERO),
                        )
                    })
                    .collect(),
                indices,
            };
            out.append_transformed(&part, world);

            if base_color.is_none() {
                let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
                *base_color = Some(glam::Vec3::new(r, g, b));
            }
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out, base_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_root_and_path() {
        let src = AssetSource::new("assets/");
        assert_eq!(src.resolve("/models/character.glb"), "assets/models/character.glb");
        assert_eq!(AssetSource::new("").resolve("textures/a.jpg"), "textures/a.jpg");
    }

    #[test]
    fn garbage_is_not_a_model() {
        assert!(matches!(import_model(b"not a gltf"), Err(AssetError::Gltf(_))));
    }

    #[test]
    fn garbage_is_not_an_image() {
        assert!(matches!(decode_image(&[0, 1, 2, 3]), Err(AssetError::Image(_))));
    }

    #[test]
    fn decodes_png() {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(&img.pixels[..4], &[10, 20, 30, 255]);
    }

    // A single triangle with one two-keyframe animation, as embedded glTF JSON.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "translation": [0.0, 1.0, 0.0]}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "animations": [{
            "name": "idle",
            "channels": [{"sampler": 0, "target": {"node": 0, "path": "translation"}}],
            "samplers": [{"input": 1, "output": 2}]
        }],
        "buffers": [{"byteLength": 68, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAEAAAAAAAAAAAAAAAAAAAAAAAACAPwAAAAA="}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 8},
            {"buffer": 0, "byteOffset": 44, "byteLength": 24}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
             "min": [0.0], "max": [2.0]},
            {"bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3"}
        ]
    }"#;

    #[test]
    fn imports_embedded_triangle() {
        let model = import_model(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(model.geometry.vertices.len(), 3);
        assert_eq!(model.geometry.indices, [0, 1, 2]);
        let (min, max) = model.geometry.bounds().unwrap();
        assert_eq!(min.y, 1.0);
        assert_eq!(max.y, 2.0);

        let idle = model.animations.get("idle").unwrap();
        assert_eq!((idle.from, idle.to), (0.0, 2.0));
        assert!(!idle.is_playing());
    }
}
