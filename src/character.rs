use super::animation::AnimationSet;
use super::assets::ImportedModel;
use super::config::SceneConfig;
use super::material::StandardMaterial;
use super::primitives;
use super::scene::{NodeId, Scene};

/// The imported model once it has been attached to the proxy.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub root: NodeId,
    pub animations: AnimationSet,
}

/// Click-to-walk driver. A half transparent box stands in for the
/// character; the imported model rides on it as a child node.
#[derive(Debug)]
pub struct CharacterController {
    pub proxy: NodeId,
    pub speed: f32,
    pub stop_distance: f32,
    idle_clip: String,
    running_clip: String,
    model: Option<LoadedModel>,
    target: Option<glam::Vec3>,
}

impl CharacterController {
    pub fn spawn(scene: &mut Scene, config: &SceneConfig) -> Self {
        let mesh = scene.add_geometry(primitives::box_geometry(1.0, 2.0, 1.0));
        let material = scene.add_material(StandardMaterial::new("characterBoxMat"));
        let proxy = scene.add_mesh("characterBox", mesh, material);
        let node = scene.node_mut(proxy);
        node.position.y = 1.0;
        if let Some(attachment) = node.mesh.as_mut() {
            attachment.visibility = 0.5;
        }

        Self {
            proxy,
            speed: config.character_speed,
            stop_distance: config.stop_distance,
            idle_clip: config.idle_clip.clone(),
            running_clip: config.running_clip.clone(),
            model: None,
            target: None,
        }
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn target(&self) -> Option<glam::Vec3> {
        self.target
    }

    pub fn is_travelling(&self) -> bool {
        self.target.is_some()
    }

    /// Hangs the model under the proxy with its feet at the proxy's base
    /// and starts the idle clip.
    pub fn attach_model(&mut self, scene: &mut Scene, imported: ImportedModel) -> NodeId {
        let mesh = scene.add_geometry(imported.geometry);
        let mut material = StandardMaterial::new("characterMat");
        material.diffuse_color = imported.base_color;
        let material = scene.add_material(material);
        let root = scene.add_mesh("__root__", mesh, material);
        scene.set_parent(root, Some(self.proxy));
        scene.node_mut(root).position.y = -1.0;

        let mut animations = imported.animations;
        animations.play_exclusive(&self.idle_clip);
        self.model = Some(LoadedModel { root, animations });
        root
    }

    /// Starts walking toward `point`. Ignored until a model is attached.
    pub fn move_to(&mut self, scene: &mut Scene, point: glam::Vec3) {
        let Some(model) = self.model.as_mut() else {
            log::debug!("Ignoring move request; model not loaded");
            return;
        };
        log::debug!("Moving to {point}");
        self.target = Some(point);

        let y = scene.node(self.proxy).position.y;
        scene.look_at(self.proxy, glam::Vec3::new(point.x, y, point.z));
        model.animations.play_exclusive(&self.running_clip);
    }

    pub fn stop(&mut self) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        self.target = None;
        model.animations.play_exclusive(&self.idle_clip);
    }

    /// Per-frame step. Returns true on the frame the character arrives.
    pub fn update(&mut self, scene: &mut Scene, delta_ms: f32) -> bool {
        if let Some(model) = self.model.as_mut() {
            model.animations.advance(delta_ms / 1000.0);
        }

        let Some(target) = self.target else {
            return false;
        };

        let position = scene.node(self.proxy).position;
        let remaining = glam::Vec2::new(target.x - position.x, target.z - position.z).length();
        let step = (self.speed * delta_ms / 1000.0).min(remaining);
        scene.locally_translate(self.proxy, glam::Vec3::Z * step);

        let position = scene.node(self.proxy).position;
        // Reaching the point horizontally also ends travel, so a stop
        // distance smaller than the proxy's height still terminates.
        if position.distance(target) <= self.stop_distance || step >= remaining {
            log::debug!("Arrived at {target}");
            self.stop();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationGroup, AnimationSet};
    use crate::mesh::Geometry;

    fn imported() -> ImportedModel {
        ImportedModel {
            geometry: primitives::box_geometry(0.5, 1.8, 0.5),
            base_color: glam::Vec3::new(0.8, 0.2, 0.2),
            animations: AnimationSet::new(vec![
                AnimationGroup::new("idle", 0.0, 2.0),
                AnimationGroup::new("running", 0.0, 0.8),
            ]),
        }
    }

    fn spawn() -> (Scene, CharacterController) {
        let mut scene = Scene::new();
        let character = CharacterController::spawn(&mut scene, &SceneConfig::default());
        (scene, character)
    }

    #[test]
    fn proxy_is_half_visible_box_at_height_one() {
        let (scene, character) = spawn();
        let node = scene.node(character.proxy);
        assert_eq!(node.name, "characterBox");
        assert_eq!(node.position.y, 1.0);
        assert_eq!(node.mesh.as_ref().unwrap().visibility, 0.5);
    }

    #[test]
    fn attach_parents_model_and_plays_idle() {
        let (mut scene, mut character) = spawn();
        let root = character.attach_model(&mut scene, imported());
        assert_eq!(scene.node(root).parent(), Some(character.proxy));
        assert!(scene.world_position(root).abs_diff_eq(glam::Vec3::ZERO, 1e-6));
        let playing: Vec<_> = character.model().unwrap().animations.playing().collect();
        assert_eq!(playing, ["idle"]);
    }

    #[test]
    fn move_before_model_loads_is_ignored() {
        let (mut scene, mut character) = spawn();
        character.move_to(&mut scene, glam::Vec3::new(5.0, 0.0, 5.0));
        assert!(!character.is_travelling());
        assert!(!character.update(&mut scene, 16.0));
        assert_eq!(scene.node(character.proxy).position, glam::Vec3::Y);
    }

    #[test]
    fn move_switches_to_running_and_faces_target() {
        let (mut scene, mut character) = spawn();
        character.attach_model(&mut scene, imported());
        character.move_to(&mut scene, glam::Vec3::new(10.0, 0.0, 0.0));
        let playing: Vec<_> = character.model().unwrap().animations.playing().collect();
        assert_eq!(playing, ["running"]);
        let forward = scene.node(character.proxy).rotation * glam::Vec3::Z;
        assert!(forward.abs_diff_eq(glam::Vec3::X, 1e-5));
    }

    #[test]
    fn walks_then_stops_within_threshold() {
        let (mut scene, mut character) = spawn();
        character.attach_model(&mut scene, imported());
        let target = glam::Vec3::new(6.0, 0.0, -8.0);
        character.move_to(&mut scene, target);

        let mut frames = 0;
        while character.is_travelling() {
            character.update(&mut scene, 16.0);
            frames += 1;
            assert!(frames < 10_000, "never arrived");
        }

        let position = scene.node(character.proxy).position;
        assert!(position.distance(target) <= 1.1);
        assert_eq!(position.y, 1.0);
        let playing: Vec<_> = character.model().unwrap().animations.playing().collect();
        assert_eq!(playing, ["idle"]);
    }

    #[test]
    fn large_frame_does_not_overshoot() {
        let (mut scene, mut character) = spawn();
        character.attach_model(&mut scene, imported());
        character.stop_distance = 0.5;
        character.move_to(&mut scene, glam::Vec3::new(0.0, 0.0, 2.0));
        assert!(character.update(&mut scene, 5_000.0));
        let position = scene.node(character.proxy).position;
        assert!(position.abs_diff_eq(glam::Vec3::new(0.0, 1.0, 2.0), 1e-5));
    }

    #[test]
    fn new_click_replaces_target() {
        let (mut scene, mut character) = spawn();
        character.attach_model(&mut scene, imported());
        character.move_to(&mut scene, glam::Vec3::new(10.0, 0.0, 0.0));
        character.move_to(&mut scene, glam::Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(character.target(), Some(glam::Vec3::new(-10.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_geometry_still_attaches() {
        let (mut scene, mut character) = spawn();
        let model = ImportedModel {
            geometry: Geometry::default(),
            ..imported()
        };
        character.attach_model(&mut scene, model);
        assert!(character.model().is_some());
    }
}
