use super::assets::ImageData;
use super::camera::Camera;
use super::commands::DrawCommand;
use super::context::GpuContext;
use super::light::{HemisphericLight, LightUniform};
use super::material::{MaterialHandle, StandardMaterial, TextureSlot};
use super::mesh::{InstanceBuffer, Mesh, MeshHandle, Vertex};
use super::scene::Scene;
use super::texture::{self, GpuTexture};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    view_proj: glam::Mat4,
    eye: glam::Vec4,
    light: LightUniform,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model_matrix: glam::Mat4,
    /// rgb tint, a = visibility
    pub color: glam::Vec4,
}

impl Instance {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4
    ];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

struct GpuMaterial {
    _uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Lit, textured mesh renderer for a [`Scene`].
pub struct Renderer {
    pub ctx: GpuContext,
    pub opaque_pipeline: wgpu::RenderPipeline,
    pub transparent_pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub depth: GpuTexture,
    pub commands: Vec<DrawCommand>,
    pub clear_color: wgpu::Color,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    instances: InstanceBuffer,
    meshes: HashMap<MeshHandle, Mesh>,
    materials: HashMap<MaterialHandle, GpuMaterial>,
    textures: HashMap<String, GpuTexture>,
    fallback_diffuse: GpuTexture,
    fallback_normal: GpuTexture,
}

impl Renderer {
    pub fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;
        let depth = GpuTexture::depth(device, ctx.size());

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms {
                view_proj: glam::Mat4::IDENTITY,
                eye: glam::Vec4::ZERO,
                light: HemisphericLight::new("default", glam::Vec3::Y).uniform(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Bind Groups
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniforms Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Render Pipelines
        let vert_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("vert_shader.wgsl").into()),
        });
        let frag_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("frag_shader.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let build_pipeline = |label: &str, blend: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vert_shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::desc(), Instance::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &frag_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format(),
                        blend: blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: texture::DEPTH_FORMAT,
                    // Blended meshes test against depth but do not occlude each other.
                    depth_write_enabled: !blend,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };
        let opaque_pipeline = build_pipeline("Opaque Pipeline", false);
        let transparent_pipeline = build_pipeline("Transparent Pipeline", true);

        let fallback_diffuse = GpuTexture::from_image(
            device,
            &ctx.queue,
            "Fallback Diffuse",
            &ImageData::solid(texture::NEUTRAL_DIFFUSE),
            true,
        );
        let fallback_normal = GpuTexture::from_image(
            device,
            &ctx.queue,
            "Fallback Normal",
            &ImageData::solid(texture::NEUTRAL_NORMAL),
            false,
        );
        let instances = InstanceBuffer::new(device);

        Self {
            ctx,
            opaque_pipeline,
            transparent_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth,
            commands: Vec::new(),
            clear_color: wgpu::Color::WHITE,
            material_layout,
            sampler,
            instances,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            fallback_diffuse,
            fallback_normal,
        }
    }

    /// Returns the new surface size, `None` for a zero-sized window.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<glam::UVec2> {
        let size = self.ctx.resize(width, height)?;
        self.depth = GpuTexture::depth(&self.ctx.device, size);
        Some(size)
    }

    pub fn update_uniforms(&mut self, camera: &impl Camera, light: Option<&HemisphericLight>) {
        let light = light
            .map(HemisphericLight::uniform)
            .unwrap_or_else(|| HemisphericLight::new("default", glam::Vec3::Y).uniform());
        let uniforms = Uniforms {
            view_proj: camera.view_proj(),
            eye: camera.eye().extend(1.0),
            light,
        };
        log::trace!("Uniforms: {}", uniforms.view_proj);
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Uploads a decoded image under `path`. Materials are rebuilt on the
    /// next sync so they pick it up.
    pub fn set_texture(&mut self, path: &str, image: &ImageData, srgb: bool) {
        log::debug!("Uploading texture {path} ({}x{})", image.width, image.height);
        let gpu = GpuTexture::from_image(&self.ctx.device, &self.ctx.queue, path, image, srgb);
        self.textures.insert(path.to_string(), gpu);
        self.materials.clear();
    }

    /// Mirrors scene geometry and materials that are not on the GPU yet and
    /// rebuilds the frame's draw list.
    pub fn sync_scene(&mut self, scene: &Scene) {
        for (i, geometry) in scene.geometries.iter().enumerate() {
            let handle = MeshHandle(i);
            if geometry.is_empty() || self.meshes.contains_key(&handle) {
                continue;
            }
            let mesh = Mesh::from_geometry(&self.ctx.device, &format!("Mesh {i}"), geometry);
            self.meshes.insert(handle, mesh);
        }

        for (i, material) in scene.materials.iter().enumerate() {
            let handle = MaterialHandle(i);
            if !self.materials.contains_key(&handle) {
                let gpu = self.create_material(material);
                self.materials.insert(handle, gpu);
            }
        }

        self.commands = DrawCommand::collect(scene);
    }

    fn create_material(&self, material: &StandardMaterial) -> GpuMaterial {
        let device = &self.ctx.device;
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniform Buffer", material.name)),
            contents: bytemuck::cast_slice(&[material.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let diffuse = self.texture_view(&material.diffuse_texture, &self.fallback_diffuse);
        let bump = self.texture_view(&material.bump_texture, &self.fallback_normal);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", material.name)),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(diffuse),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(bump),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        GpuMaterial {
            _uniform_buffer: uniform_buffer,
            bind_group,
        }
    }

    fn texture_view<'a>(
        &'a self,
        slot: &Option<TextureSlot>,
        fallback: &'a GpuTexture,
    ) -> &'a wgpu::TextureView {
        slot.as_ref()
            .and_then(|s| self.textures.get(&s.path))
            .map_or(&fallback.view, |t| &t.view)
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
                label: Some("Render Encoder"),
            });

        let instances: Vec<Instance> = self.commands.iter().map(|c| c.instance).collect();
        self.instances
            .write(&self.ctx.device, &self.ctx.queue, &instances);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instances.buffer.slice(..));

            // Commands are sorted, so runs of the same (pipeline, material,
            // mesh) become one instanced draw.
            let mut start = 0;
            while start < self.commands.len() {
                let head = &self.commands[start];
                let key = (head.is_transparent(), head.material, head.mesh);
                let end = self.commands[start..]
                    .iter()
                    .position(|c| (c.is_transparent(), c.material, c.mesh) != key)
                    .map_or(self.commands.len(), |offset| start + offset);

                if let (Some(mesh), Some(material)) =
                    (self.meshes.get(&head.mesh), self.materials.get(&head.material))
                {
                    let pipeline = if key.0 {
                        &self.transparent_pipeline
                    } else {
                        &self.opaque_pipeline
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, &material.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, start as u32..end as u32);
                }
                start = end;
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
