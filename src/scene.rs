//! Scene graph: a flat arena of transform nodes, some of which carry a mesh.
//!
//! Geometry and materials live here as CPU data and are referenced by
//! handle. The renderer mirrors them on the GPU the first time it sees them.

use super::light::HemisphericLight;
use super::material::{MaterialHandle, StandardMaterial};
use super::mesh::{Geometry, MeshHandle};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct MeshAttachment {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    /// Opacity in 0..=1. Values below 1 are drawn blended after opaque meshes.
    pub visibility: f32,
    pub pickable: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub position: glam::Vec3,
    pub rotation: glam::Quat,
    pub scaling: glam::Vec3,
    pub enabled: bool,
    pub mesh: Option<MeshAttachment>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: glam::Vec3::ZERO,
            rotation: glam::Quat::IDENTITY,
            scaling: glam::Vec3::ONE,
            enabled: true,
            mesh: None,
            parent: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn local_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scaling, self.rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: glam::Vec3,
    pub direction: glam::Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickingInfo {
    pub node: NodeId,
    pub name: String,
    pub point: glam::Vec3,
    pub distance: f32,
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    pub geometries: Vec<Geometry>,
    pub materials: Vec<StandardMaterial>,
    pub lights: Vec<HemisphericLight>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> MeshHandle {
        self.geometries.push(geometry);
        MeshHandle(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle(self.materials.len() - 1)
    }

    pub fn add_transform_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.push(Node::new(name));
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        mesh: MeshHandle,
        material: MaterialHandle,
    ) -> NodeId {
        let id = self.add_transform_node(name);
        self.nodes[id.0].mesh = Some(MeshAttachment {
            mesh,
            material,
            visibility: 1.0,
            pickable: true,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    /// Re-parents `child`, keeping its local transform. Returns false and
    /// leaves the graph untouched if the link would create a cycle.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        let mut cursor = parent;
        while let Some(id) = cursor {
            if id == child {
                log::warn!("Refusing to parent {} under its own descendant", self.nodes[child.0].name);
                return false;
            }
            cursor = self.nodes[id.0].parent;
        }
        self.nodes[child.0].parent = parent;
        true
    }

    pub fn world_matrix(&self, id: NodeId) -> glam::Mat4 {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => self.world_matrix(parent) * node.local_matrix(),
            None => node.local_matrix(),
        }
    }

    pub fn world_position(&self, id: NodeId) -> glam::Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// A node is drawn only if it and all its ancestors are enabled.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.enabled && node.parent.is_none_or(|p| self.is_enabled(p))
    }

    /// Moves a node along its own axes.
    pub fn locally_translate(&mut self, id: NodeId, offset: glam::Vec3) {
        let node = &mut self.nodes[id.0];
        node.position += node.rotation * offset;
    }

    /// Rotates a node so that its local +Z axis points at `target`
    /// (expressed in the node's parent space).
    pub fn look_at(&mut self, id: NodeId, target: glam::Vec3) {
        let node = &mut self.nodes[id.0];
        let dir = target - node.position;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        let yaw = dir.x.atan2(dir.z);
        let pitch = -dir.y.atan2(glam::Vec2::new(dir.x, dir.z).length());
        node.rotation = glam::Quat::from_rotation_y(yaw) * glam::Quat::from_rotation_x(pitch);
    }

    /// Nearest pickable mesh along `ray`.
    pub fn pick(&self, ray: Ray) -> Option<PickingInfo> {
        let mut closest: Option<(NodeId, f32)> = None;

        for (id, node) in self.nodes() {
            let Some(attachment) = &node.mesh else {
                continue;
            };
            if !attachment.pickable || !self.is_enabled(id) {
                continue;
            }
            let geometry = &self.geometries[attachment.mesh.0];
            let Some((min, max)) = geometry.bounds() else {
                continue;
            };

            let transform = self.world_matrix(id);
            let (world_min, world_max) = transformed_aabb(transform, min, max);
            if ray_aabb_intersection(ray, world_min, world_max).is_none() {
                continue;
            }

            for [v0, v1, v2] in geometry.triangles() {
                let v0 = transform.transform_point3(v0);
                let v1 = transform.transform_point3(v1);
                let v2 = transform.transform_point3(v2);
                if let Some(t) = ray_triangle_intersection(ray, v0, v1, v2) {
                    match closest {
                        Some((_, current)) if current <= t => {}
                        _ => closest = Some((id, t)),
                    }
                }
            }
        }

        closest.map(|(node, t)| PickingInfo {
            node,
            name: self.nodes[node.0].name.clone(),
            point: ray.origin + ray.direction * t,
            distance: t,
        })
    }
}

fn transformed_aabb(
    transform: glam::Mat4,
    min: glam::Vec3,
    max: glam::Vec3,
) -> (glam::Vec3, glam::Vec3) {
    let corners = [
        glam::Vec3::new(min.x, min.y, min.z),
        glam::Vec3::new(max.x, min.y, min.z),
        glam::Vec3::new(min.x, max.y, min.z),
        glam::Vec3::new(max.x, max.y, min.z),
        glam::Vec3::new(min.x, min.y, max.z),
        glam::Vec3::new(max.x, min.y, max.z),
        glam::Vec3::new(min.x, max.y, max.z),
        glam::Vec3::new(max.x, max.y, max.z),
    ]
    .map(|c| transform.transform_point3(c));

    corners[1..]
        .iter()
        .fold((corners[0], corners[0]), |(lo, hi), c| (lo.min(*c), hi.max(*c)))
}

// Slab test. Flat boxes (e.g. the ground) have zero thickness on one axis,
// so the slabs are compared inclusively.
fn ray_aabb_intersection(ray: Ray, min: glam::Vec3, max: glam::Vec3) -> Option<f32> {
    let inv = ray.direction.recip();
    let t1 = (min - ray.origin) * inv;
    let t2 = (max - ray.origin) * inv;

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        if ray.direction[axis] == 0.0 {
            if ray.origin[axis] < min[axis] || ray.origin[axis] > max[axis] {
                return None;
            }
            continue;
        }
        tmin = tmin.max(t1[axis].min(t2[axis]));
        tmax = tmax.min(t1[axis].max(t2[axis]));
    }

    if tmax < 0.0 || tmin > tmax {
        return None;
    }
    Some(if tmin < 0.0 { tmax } else { tmin })
}

// Möller–Trumbore, double sided.
fn ray_triangle_intersection(
    ray: Ray,
    v0: glam::Vec3,
    v1: glam::Vec3,
    v2: glam::Vec3,
) -> Option<f32> {
    const EPSILON: f32 = 1e-6;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > EPSILON { Some(t) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    fn ground_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let mesh = scene.add_geometry(primitives::ground_geometry(50.0, 50.0));
        let mat = scene.add_material(StandardMaterial::new("groundMat"));
        let ground = scene.add_mesh("ground", mesh, mat);
        (scene, ground)
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let parent = scene.add_transform_node("parent");
        let child = scene.add_transform_node("child");
        scene.node_mut(parent).position = glam::Vec3::new(1.0, 2.0, 3.0);
        scene.node_mut(child).position = glam::Vec3::new(0.0, -1.0, 0.0);
        assert!(scene.set_parent(child, Some(parent)));
        assert!(
            scene
                .world_position(child)
                .abs_diff_eq(glam::Vec3::new(1.0, 1.0, 3.0), 1e-6)
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let mut scene = Scene::new();
        let a = scene.add_transform_node("a");
        let b = scene.add_transform_node("b");
        assert!(scene.set_parent(b, Some(a)));
        assert!(!scene.set_parent(a, Some(b)));
        assert!(scene.node(a).parent().is_none());
    }

    #[test]
    fn look_at_then_translate_moves_toward_target() {
        let mut scene = Scene::new();
        let node = scene.add_transform_node("box");
        scene.node_mut(node).position = glam::Vec3::new(0.0, 1.0, 0.0);
        scene.look_at(node, glam::Vec3::new(3.0, 1.0, 4.0));
        scene.locally_translate(node, glam::Vec3::Z * 5.0);
        assert!(
            scene
                .node(node)
                .position
                .abs_diff_eq(glam::Vec3::new(3.0, 1.0, 4.0), 1e-5)
        );
    }

    #[test]
    fn look_at_own_position_is_noop() {
        let mut scene = Scene::new();
        let node = scene.add_transform_node("n");
        scene.look_at(node, glam::Vec3::ZERO);
        assert_eq!(scene.node(node).rotation, glam::Quat::IDENTITY);
    }

    #[test]
    fn pick_ground_from_above() {
        let (scene, ground) = ground_scene();
        let hit = scene
            .pick(Ray {
                origin: glam::Vec3::new(2.0, 10.0, -3.0),
                direction: glam::Vec3::NEG_Y,
            })
            .unwrap();
        assert_eq!(hit.node, ground);
        assert_eq!(hit.name, "ground");
        assert!(hit.point.abs_diff_eq(glam::Vec3::new(2.0, 0.0, -3.0), 1e-5));
        assert!((hit.distance - 10.0).abs() < 1e-5);
    }

    #[test]
    fn pick_misses_outside_ground() {
        let (scene, _) = ground_scene();
        let hit = scene.pick(Ray {
            origin: glam::Vec3::new(30.0, 10.0, 0.0),
            direction: glam::Vec3::NEG_Y,
        });
        assert!(hit.is_none());
    }

    #[test]
    fn pick_prefers_nearest_mesh() {
        let (mut scene, _) = ground_scene();
        let cube = scene.add_geometry(primitives::box_geometry(1.0, 2.0, 1.0));
        let mat = scene.add_material(StandardMaterial::new("boxMat"));
        let node = scene.add_mesh("characterBox", cube, mat);
        scene.node_mut(node).position.y = 1.0;

        let hit = scene
            .pick(Ray {
                origin: glam::Vec3::new(0.0, 10.0, 0.0),
                direction: glam::Vec3::NEG_Y,
            })
            .unwrap();
        assert_eq!(hit.name, "characterBox");
        assert!((hit.point.y - 2.0).abs() < 1e-5);

        scene.node_mut(node).mesh.as_mut().unwrap().pickable = false;
        let hit = scene
            .pick(Ray {
                origin: glam::Vec3::new(0.0, 10.0, 0.0),
                direction: glam::Vec3::NEG_Y,
            })
            .unwrap();
        assert_eq!(hit.name, "ground");
    }

    #[test]
    fn disabled_parent_hides_child() {
        let mut scene = Scene::new();
        let a = scene.add_transform_node("a");
        let b = scene.add_transform_node("b");
        scene.set_parent(b, Some(a));
        scene.node_mut(a).enabled = false;
        assert!(!scene.is_enabled(b));
    }
}
