//! Line renderer used by the plot demo. Vertices are in plot units, and
//! the whole plot area is stretched over the surface.

use super::chart::PlotLayout;
use super::context::GpuContext;
use wgpu::util::DeviceExt;

const MARKER_SEGMENTS: usize = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    /// Plot units, origin top-left.
    pub position: glam::Vec2,
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Expands a plot layout into line-list vertices: one segment per pair of
/// neighbouring samples, plus a small polygon outline per marker.
pub fn plot_vertices(layout: &PlotLayout, marker_radius: f32, color: glam::Vec4) -> Vec<LineVertex> {
    let color = color.to_array();
    let vertex = |position| LineVertex { position, color };
    let mut out = Vec::with_capacity(layout.line.len() * 2 + layout.markers.len() * MARKER_SEGMENTS * 2);

    for pair in layout.line.windows(2) {
        out.push(vertex(pair[0]));
        out.push(vertex(pair[1]));
    }

    if marker_radius > 0.0 {
        let ring: Vec<glam::Vec2> = (0..MARKER_SEGMENTS)
            .map(|i| {
                let angle = i as f32 / MARKER_SEGMENTS as f32 * std::f32::consts::TAU;
                glam::Vec2::from_angle(angle) * marker_radius
            })
            .collect();
        for centre in &layout.markers {
            for i in 0..MARKER_SEGMENTS {
                out.push(vertex(*centre + ring[i]));
                out.push(vertex(*centre + ring[(i + 1) % MARKER_SEGMENTS]));
            }
        }
    }
    out
}

pub struct LineRenderer {
    pub ctx: GpuContext,
    pub pipeline: wgpu::RenderPipeline,
    pub viewport_buffer: wgpu::Buffer,
    pub viewport_bind_group: wgpu::BindGroup,
    pub clear_color: wgpu::Color,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    vertex_count: u32,
}

impl LineRenderer {
    pub fn new(ctx: GpuContext, plot_size: glam::Vec2) -> Self {
        let device = &ctx.device;
        let viewport_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Viewport Buffer"),
            contents: bytemuck::cast_slice(&[plot_size.extend(0.0).extend(0.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewport Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewport Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("line_shader.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_capacity = 1024;
        let vertex_buffer = Self::create_vertex_buffer(device, vertex_capacity);

        Self {
            ctx,
            pipeline,
            viewport_buffer,
            viewport_bind_group,
            clear_color: wgpu::Color::WHITE,
            vertex_buffer,
            vertex_capacity,
            vertex_count: 0,
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Vertex Buffer"),
            size: (capacity * std::mem::size_of::<LineVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Option<glam::UVec2> {
        self.ctx.resize(width, height)
    }

    pub fn set_vertices(&mut self, vertices: &[LineVertex]) {
        if vertices.len() > self.vertex_capacity {
            while self.vertex_capacity < vertices.len() {
                self.vertex_capacity *= 2;
            }
            self.vertex_buffer = Self::create_vertex_buffer(&self.ctx.device, self.vertex_capacity);
        }
        if !vertices.is_empty() {
            self.ctx
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
        self.vertex_count = vertices.len() as u32;
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.ctx.is_configured() {
            return Ok(());
        }
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Line Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Line Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if self.vertex_count > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..self.vertex_count, 0..1);
            }
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_and_marker_rings() {
        let layout = PlotLayout {
            line: vec![glam::Vec2::ZERO, glam::Vec2::X, glam::Vec2::ONE],
            markers: vec![glam::Vec2::ZERO, glam::Vec2::X, glam::Vec2::ONE],
        };
        let verts = plot_vertices(&layout, 2.5, glam::Vec4::ONE);
        assert_eq!(verts.len(), 2 * 2 + 3 * MARKER_SEGMENTS * 2);
        assert_eq!(verts[2].position, glam::Vec2::X);
        for v in &verts[4..4 + MARKER_SEGMENTS * 2] {
            assert!((v.position.length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn vertex_layout_matches_attributes() {
        assert_eq!(
            std::mem::offset_of!(LineVertex, position) as u64,
            LineVertex::ATTRIBS[0].offset
        );
        assert_eq!(
            std::mem::offset_of!(LineVertex, color) as u64,
            LineVertex::ATTRIBS[1].offset
        );
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
    }

    #[test]
    fn vertices_carry_line_color() {
        let layout = PlotLayout {
            line: vec![glam::Vec2::ZERO, glam::Vec2::ONE],
            markers: vec![],
        };
        let color = glam::Vec4::new(0.1, 0.2, 0.3, 1.0);
        let verts = plot_vertices(&layout, 0.0, color);
        assert!(verts.iter().all(|v| v.color == [0.1, 0.2, 0.3, 1.0]));
    }

    #[test]
    fn single_point_has_no_segments() {
        let layout = PlotLayout {
            line: vec![glam::Vec2::ONE],
            markers: vec![glam::Vec2::ONE],
        };
        assert_eq!(plot_vertices(&layout, 0.0, glam::Vec4::ONE).len(), 0);
        assert_eq!(plot_vertices(&layout, 1.0, glam::Vec4::ONE).len(), MARKER_SEGMENTS * 2);
    }
}
