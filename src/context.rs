/// Device, queue and the window surface they present to.
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    is_configured: bool,
}

impl GpuContext {
    pub async fn new_with_surface(
        surface: wgpu::Surface<'static>,
        instance: wgpu::Instance,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            adapter,
            device,
            queue,
            surface,
            surface_config,
            is_configured: false,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn is_configured(&self) -> bool {
        self.is_configured
    }

    pub fn size(&self) -> glam::UVec2 {
        glam::UVec2::new(self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigures the surface. Returns the new size, or `None` when the
    /// window is minimised.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<glam::UVec2> {
        if width == 0 || height == 0 {
            return None;
        }
        // Needed for firefox
        const MAX_DIM: u32 = 2048;
        let scale = if width > MAX_DIM || height > MAX_DIM {
            MAX_DIM as f32 / width.max(height) as f32
        } else {
            1.0
        };
        self.surface_config.width = ((width as f32 * scale) as u32).max(1);
        self.surface_config.height = ((height as f32 * scale) as u32).max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.is_configured = true;
        log::debug!(
            "Surface size: {}x{}",
            self.surface_config.width,
            self.surface_config.height
        );
        Some(self.size())
    }
}
