/// Sky/ground blended ambient light, brightest on surfaces facing `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphericLight {
    pub name: String,
    /// Points toward the sky.
    pub direction: glam::Vec3,
    pub intensity: f32,
    pub diffuse: glam::Vec3,
    pub ground_color: glam::Vec3,
    pub specular: glam::Vec3,
}

impl HemisphericLight {
    pub fn new(name: impl Into<String>, direction: glam::Vec3) -> Self {
        Self {
            name: name.into(),
            direction: direction.normalize_or(glam::Vec3::Y),
            intensity: 1.0,
            diffuse: glam::Vec3::ONE,
            ground_color: glam::Vec3::ZERO,
            specular: glam::Vec3::ONE,
        }
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            direction: self.direction.extend(0.0),
            diffuse: self.diffuse.extend(self.intensity),
            ground_color: self.ground_color.extend(0.0),
            specular: self.specular.extend(0.0),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub direction: glam::Vec4,
    /// rgb = sky colour, w = intensity
    pub diffuse: glam::Vec4,
    pub ground_color: glam::Vec4,
    pub specular: glam::Vec4,
}
