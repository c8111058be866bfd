use super::material::MaterialHandle;
use super::mesh::MeshHandle;
use super::renderer::Instance;
use super::scene::Scene;

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instance: Instance,
}

impl DrawCommand {
    pub fn is_transparent(&self) -> bool {
        self.instance.color.w < 1.0
    }

    /// One command per enabled mesh node, opaque first, each group sorted
    /// by (material, mesh) so consecutive commands share GPU state.
    pub fn collect(scene: &Scene) -> Vec<DrawCommand> {
        let mut commands: Vec<DrawCommand> = scene
            .nodes()
            .filter(|(id, _)| scene.is_enabled(*id))
            .filter_map(|(id, node)| {
                let attachment = node.mesh.as_ref()?;
                if attachment.visibility <= 0.0 {
                    return None;
                }
                Some(
                    DrawCommandBuilder::new(attachment.mesh, attachment.material)
                        .with_matrix(scene.world_matrix(id))
                        .with_visibility(attachment.visibility)
                        .build(),
                )
            })
            .collect();
        commands.sort_by_key(|c| (c.is_transparent(), c.material, c.mesh));
        commands
    }
}

pub struct DrawCommandBuilder {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub matrix: glam::Mat4,
    pub color: glam::Vec4,
}

impl DrawCommandBuilder {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            matrix: glam::Mat4::IDENTITY,
            color: glam::Vec4::ONE,
        }
    }

    pub fn with_matrix(self, matrix: glam::Mat4) -> Self {
        Self { matrix, ..self }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.color.w = visibility.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> DrawCommand {
        DrawCommand {
            mesh: self.mesh,
            material: self.material,
            instance: Instance {
                model_matrix: self.matrix,
                color: self.color,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::StandardMaterial;
    use crate::primitives;

    #[test]
    fn builder_applies_matrix_and_clamps_visibility() {
        let matrix = glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let cmd = DrawCommandBuilder::new(MeshHandle(0), MaterialHandle(0))
            .with_matrix(matrix)
            .with_visibility(1.5)
            .build();
        assert_eq!(cmd.instance.model_matrix, matrix);
        assert_eq!(cmd.instance.color, glam::Vec4::ONE);
        assert!(!cmd.is_transparent());
    }

    #[test]
    fn parented_mesh_uses_world_matrix() {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(primitives::box_geometry(1.0, 1.0, 1.0));
        let mat = scene.add_material(StandardMaterial::new("m"));
        let parent = scene.add_transform_node("parent");
        scene.node_mut(parent).position = glam::Vec3::new(0.0, 5.0, 0.0);
        let child = scene.add_mesh("child", cube, mat);
        scene.node_mut(child).position = glam::Vec3::X;
        scene.set_parent(child, Some(parent));

        let commands = DrawCommand::collect(&scene);
        assert_eq!(commands.len(), 1);
        let origin = commands[0].instance.model_matrix.transform_point3(glam::Vec3::ZERO);
        assert!(origin.abs_diff_eq(glam::Vec3::new(1.0, 5.0, 0.0), 1e-6));
    }

    #[test]
    fn transparent_meshes_draw_last() {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(primitives::box_geometry(1.0, 1.0, 1.0));
        let mat = scene.add_material(StandardMaterial::new("m"));
        let ghost = scene.add_mesh("ghost", cube, mat);
        scene.node_mut(ghost).mesh.as_mut().unwrap().visibility = 0.5;
        scene.add_mesh("solid", cube, mat);
        let hidden = scene.add_mesh("hidden", cube, mat);
        scene.node_mut(hidden).enabled = false;

        let commands = DrawCommand::collect(&scene);
        assert_eq!(commands.len(), 2);
        assert!(!commands[0].is_transparent());
        assert!(commands[1].is_transparent());
        assert_eq!(commands[1].instance.color.w, 0.5);
    }
}
