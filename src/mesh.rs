use wgpu::util::DeviceExt;

use super::renderer::Instance;

pub const DEFAULT_INSTANCE_CAPACITY: usize = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: glam::Vec3,
    pub normal: glam::Vec3,
    pub uv: glam::Vec2,
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
    pub const fn new(position: glam::Vec3, normal: glam::Vec3, uv: glam::Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// CPU side triangle list. Kept around after upload for picking.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn bounds(&self) -> Option<(glam::Vec3, glam::Vec3)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.min(v.position), max.max(v.position))
        }))
    }

    pub fn triangles(&self) -> impl Iterator<Item = [glam::Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position,
                self.vertices[tri[1] as usize].position,
                self.vertices[tri[2] as usize].position,
            ]
        })
    }

    /// Appends `other` transformed by `matrix`.
    pub fn append_transformed(&mut self, other: &Geometry, matrix: glam::Mat4) {
        let normal_matrix = glam::Mat3::from_mat4(matrix).inverse().transpose();
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().map(|v| Vertex {
            position: matrix.transform_point3(v.position),
            normal: (normal_matrix * v.normal).normalize_or_zero(),
            uv: v.uv,
        }));
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Index into the renderer's mesh table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub usize);

pub struct Mesh {
    pub index_count: u32,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

impl Mesh {
    pub fn from_geometry(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            index_count: geometry.indices.len() as u32,
            vertex_buffer,
            index_buffer,
        }
    }
}

/// Per-instance data for every draw of a frame, grown by doubling.
pub struct InstanceBuffer {
    pub buffer: wgpu::Buffer,
    pub capacity: usize,
}

impl InstanceBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let capacity = DEFAULT_INSTANCE_CAPACITY;
        Self {
            buffer: Self::create(device, capacity),
            capacity,
        }
    }

    fn create(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[Instance]) {
        if instances.len() > self.capacity {
            while self.capacity < instances.len() {
                self.capacity *= 2;
            }
            log::debug!("Growing instance buffer to {}", self.capacity);
            self.buffer = Self::create(device, self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert!(Geometry::default().bounds().is_none());
    }

    #[test]
    fn append_offsets_indices_and_moves_points() {
        let quad = primitives::ground_geometry(2.0, 2.0);
        let mut merged = quad.clone();
        merged.append_transformed(&quad, glam::Mat4::from_translation(glam::Vec3::Y * 3.0));
        assert_eq!(merged.vertices.len(), 8);
        assert_eq!(merged.indices[6], quad.indices[0] + 4);
        let (_, max) = merged.bounds().unwrap();
        assert_eq!(max.y, 3.0);
        assert_eq!(merged.triangles().count(), 4);
    }
}
