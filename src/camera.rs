use super::input::AxisInput;
use super::scene::{NodeId, Ray, Scene};

pub trait Camera {
    fn view_matrix(&self) -> &glam::Mat4;
    fn proj_matrix(&self) -> &glam::Mat4;
    fn eye(&self) -> glam::Vec3;

    fn view_proj(&self) -> glam::Mat4 {
        *self.proj_matrix() * *self.view_matrix()
    }

    /// World-space ray through a pixel of a `width` x `height` surface.
    fn screen_to_ray(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let ndc_x = 2.0 * x / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height.max(1.0);
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(glam::Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(glam::Vec3::new(ndc_x, ndc_y, 1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize(),
        }
    }
}

/// Left-handed, Y-up perspective camera whose position and target are
/// given in the space of a parent node.
#[derive(Debug)]
pub struct FreeCamera {
    pub name: String,
    pub local_position: glam::Vec3,
    pub local_target: glam::Vec3,
    pub fovy: f32,
    pub z_near: f32,
    pub z_far: f32,
    eye: glam::Vec3,
    view_matrix: glam::Mat4,
    proj_matrix: glam::Mat4,
}

impl Camera for FreeCamera {
    fn view_matrix(&self) -> &glam::Mat4 {
        &self.view_matrix
    }
    fn proj_matrix(&self) -> &glam::Mat4 {
        &self.proj_matrix
    }
    fn eye(&self) -> glam::Vec3 {
        self.eye
    }
}

impl FreeCamera {
    pub fn new(name: impl Into<String>, local_position: glam::Vec3) -> Self {
        let fovy = 0.8;
        let z_near = 1.0;
        let z_far = 10_000.0;
        let mut cam = Self {
            name: name.into(),
            local_position,
            local_target: local_position + glam::Vec3::Z,
            fovy,
            z_near,
            z_far,
            eye: local_position,
            view_matrix: glam::Mat4::IDENTITY,
            proj_matrix: glam::Mat4::perspective_lh(fovy, 16.0 / 9.0, z_near, z_far),
        };
        cam.update(glam::Mat4::IDENTITY);
        cam
    }

    pub fn set_target(&mut self, local_target: glam::Vec3) {
        self.local_target = local_target;
    }

    /// Recomputes the view matrix from the parent's world matrix.
    pub fn update(&mut self, parent_world: glam::Mat4) {
        self.eye = parent_world.transform_point3(self.local_position);
        let target = parent_world.transform_point3(self.local_target);
        let up = parent_world.transform_vector3(glam::Vec3::Y);
        self.view_matrix = glam::Mat4::look_at_lh(self.eye, target, up);
    }

    pub fn update_aspect(&mut self, window_size: glam::UVec2) {
        let aspect = if window_size.x == 0 || window_size.y == 0 {
            1.0
        } else {
            window_size.x as f32 / window_size.y as f32
        };
        self.proj_matrix = glam::Mat4::perspective_lh(self.fovy, aspect, self.z_near, self.z_far);
    }
}

/// A camera carried around by a container node that slides across the
/// scene from the arrow key axes.
#[derive(Debug)]
pub struct CameraRig {
    pub container: NodeId,
    pub camera: FreeCamera,
    /// World units per second.
    pub speed: f32,
}

impl CameraRig {
    pub fn new(scene: &mut Scene, container_position: glam::Vec3, camera: FreeCamera, speed: f32) -> Self {
        let container = scene.add_transform_node("cameraContainer");
        scene.node_mut(container).position = container_position;
        let mut rig = Self {
            container,
            camera,
            speed,
        };
        rig.sync(scene);
        rig
    }

    pub fn advance(&mut self, scene: &mut Scene, axis: &AxisInput, delta_ms: f32) {
        if !axis.is_idle() {
            let step = self.speed * delta_ms / 1000.0;
            let offset = glam::Vec3::new(axis.horizontal * step, 0.0, axis.vertical * step);
            log::trace!("Camera container step: {offset}");
            scene.locally_translate(self.container, offset);
        }
        self.sync(scene);
    }

    pub fn sync(&mut self, scene: &Scene) {
        self.camera.update(scene.world_matrix(self.container));
    }
}
