use super::mesh::{Geometry, Vertex};

/// Axis-aligned box centred on the origin with flat per-face normals.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> Geometry {
    let h = glam::Vec3::new(width, height, depth) * 0.5;
    // (normal, u axis, v axis) per face
    let faces = [
        (glam::Vec3::Z, glam::Vec3::NEG_X, glam::Vec3::Y),
        (glam::Vec3::NEG_Z, glam::Vec3::X, glam::Vec3::Y),
        (glam::Vec3::X, glam::Vec3::Z, glam::Vec3::Y),
        (glam::Vec3::NEG_X, glam::Vec3::NEG_Z, glam::Vec3::Y),
        (glam::Vec3::Y, glam::Vec3::X, glam::Vec3::Z),
        (glam::Vec3::NEG_Y, glam::Vec3::X, glam::Vec3::NEG_Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + u * su + v * sv) * h;
            let uv = glam::Vec2::new((su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5);
            vertices.push(Vertex::new(position, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Geometry { vertices, indices }
}

/// Flat quad on the XZ plane at y = 0, facing +Y.
pub fn ground_geometry(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let corners = [
        (glam::Vec3::new(-hw, 0.0, -hh), glam::Vec2::new(0.0, 1.0)),
        (glam::Vec3::new(hw, 0.0, -hh), glam::Vec2::new(1.0, 1.0)),
        (glam::Vec3::new(hw, 0.0, hh), glam::Vec2::new(1.0, 0.0)),
        (glam::Vec3::new(-hw, 0.0, hh), glam::Vec2::new(0.0, 0.0)),
    ];
    let vertices = corners
        .iter()
        .map(|(p, uv)| Vertex::new(*p, glam::Vec3::Y, *uv))
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1,
        0, 3, 2,
    ];

    Geometry { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_extents() {
        let geo = box_geometry(1.0, 2.0, 1.0);
        assert_eq!(geo.vertices.len(), 24);
        assert_eq!(geo.indices.len(), 36);
        let (min, max) = geo.bounds().unwrap();
        assert!(min.abs_diff_eq(glam::Vec3::new(-0.5, -1.0, -0.5), 1e-6));
        assert!(max.abs_diff_eq(glam::Vec3::new(0.5, 1.0, 0.5), 1e-6));
    }

    #[test]
    fn box_face_vertices_lie_on_their_face() {
        let geo = box_geometry(2.0, 2.0, 2.0);
        for v in &geo.vertices {
            assert!((v.position.dot(v.normal) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ground_is_flat() {
        let geo = ground_geometry(50.0, 50.0);
        assert_eq!(geo.indices.len(), 6);
        assert!(geo.vertices.iter().all(|v| v.position.y == 0.0));
        let (min, max) = geo.bounds().unwrap();
        assert_eq!(min.x, -25.0);
        assert_eq!(max.z, 25.0);
    }
}
