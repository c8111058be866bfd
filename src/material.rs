/// Index into the renderer's material table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    pub path: String,
    pub u_scale: f32,
    pub v_scale: f32,
}

impl TextureSlot {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            u_scale: 1.0,
            v_scale: 1.0,
        }
    }

    pub fn with_scale(self, u_scale: f32, v_scale: f32) -> Self {
        Self {
            u_scale,
            v_scale,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub name: String,
    pub diffuse_color: glam::Vec3,
    pub specular_color: glam::Vec3,
    pub specular_power: f32,
    pub diffuse_texture: Option<TextureSlot>,
    pub bump_texture: Option<TextureSlot>,
}

impl StandardMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: glam::Vec3::ONE,
            specular_color: glam::Vec3::ONE,
            specular_power: 64.0,
            diffuse_texture: None,
            bump_texture: None,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        let scale = |slot: &Option<TextureSlot>| {
            slot.as_ref()
                .map(|s| glam::Vec2::new(s.u_scale, s.v_scale))
                .unwrap_or(glam::Vec2::ONE)
        };
        let diffuse = scale(&self.diffuse_texture);
        let bump = scale(&self.bump_texture);
        MaterialUniform {
            diffuse_color: self.diffuse_color.extend(1.0),
            specular: self.specular_color.extend(self.specular_power),
            uv_scale: glam::Vec4::new(diffuse.x, diffuse.y, bump.x, bump.y),
            flags: glam::Vec4::new(
                self.diffuse_texture.is_some() as u32 as f32,
                self.bump_texture.is_some() as u32 as f32,
                0.0,
                0.0,
            ),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub diffuse_color: glam::Vec4,
    /// rgb = specular colour, w = specular power
    pub specular: glam::Vec4,
    /// xy = diffuse uv scale, zw = bump uv scale
    pub uv_scale: glam::Vec4,
    /// x = has diffuse texture, y = has bump texture
    pub flags: glam::Vec4,
}
