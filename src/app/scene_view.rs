//! Walk-around scene: textured ground, arrow-key camera rig and a
//! character that walks to wherever the ground is clicked.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    assets::{self, AssetSource, ImageData, ImportedModel},
    camera::{Camera, CameraRig, FreeCamera},
    character::CharacterController,
    clock::FrameClock,
    config::SceneConfig,
    context::GpuContext,
    input::{ArrowKey, AxisInput},
    light::HemisphericLight,
    material::{StandardMaterial, TextureSlot},
    primitives,
    renderer::Renderer,
    scene::{NodeId, PickingInfo, Scene},
};

pub const GROUND_NAME: &str = "ground";

/// Everything that changes in response to input, independent of the GPU.
pub struct SceneWorld {
    pub config: SceneConfig,
    pub scene: Scene,
    pub rig: CameraRig,
    pub character: CharacterController,
    pub input: AxisInput,
    pub ground: NodeId,
}

impl SceneWorld {
    pub fn new(config: SceneConfig) -> Self {
        let mut scene = Scene::new();
        scene
            .lights
            .push(HemisphericLight::new("mainLight", config.light_direction));

        let ground_mesh = scene.add_geometry(primitives::ground_geometry(
            config.ground_size,
            config.ground_size,
        ));
        let mut ground_mat = StandardMaterial::new("groundMat");
        let uv = config.ground_uv_scale;
        ground_mat.diffuse_texture =
            Some(TextureSlot::new(config.ground_diffuse_texture.as_str()).with_scale(uv, uv));
        ground_mat.bump_texture =
            Some(TextureSlot::new(config.ground_normal_texture.as_str()).with_scale(uv, uv));
        ground_mat.specular_color = glam::Vec3::ZERO;
        let ground_mat = scene.add_material(ground_mat);
        let ground = scene.add_mesh(GROUND_NAME, ground_mesh, ground_mat);

        let character = CharacterController::spawn(&mut scene, &config);

        let mut camera = FreeCamera::new("mainCam", config.camera_local_position);
        camera.set_target(config.camera_local_target);
        let rig = CameraRig::new(
            &mut scene,
            config.camera_container_position,
            camera,
            config.camera_speed,
        );

        log::debug!("Scene initialized");
        Self {
            config,
            scene,
            rig,
            character,
            input: AxisInput::default(),
            ground,
        }
    }

    pub fn handle_key(&mut self, key: ArrowKey, is_pressed: bool) {
        self.input.handle(key, is_pressed);
    }

    /// Picks under the pointer; a hit on the ground becomes the walk target.
    pub fn pointer_down(&mut self, x: f32, y: f32, width: f32, height: f32) -> Option<PickingInfo> {
        let ray = self.rig.camera.screen_to_ray(x, y, width, height);
        let hit = self.scene.pick(ray)?;
        log::debug!("Picked {} at {}", hit.name, hit.point);
        if hit.name == GROUND_NAME {
            self.character.move_to(&mut self.scene, hit.point);
        }
        Some(hit)
    }

    pub fn attach_model(&mut self, model: ImportedModel) {
        self.character.attach_model(&mut self.scene, model);
    }

    pub fn frame(&mut self, delta_ms: f32) {
        self.rig.advance(&mut self.scene, &self.input, delta_ms);
        self.character.update(&mut self.scene, delta_ms);
    }
}

pub enum SceneEvent {
    Ready(Box<SceneView>),
    Texture {
        path: String,
        image: ImageData,
        srgb: bool,
    },
    Model(ImportedModel),
}

/// Fetches the ground textures and the character model, emitting each as
/// it arrives. Failures are logged; the scene keeps running without them.
pub async fn load_assets(source: AssetSource, config: SceneConfig, emit: impl Fn(SceneEvent)) {
    let textures = [
        (config.ground_diffuse_texture.clone(), true),
        (config.ground_normal_texture.clone(), false),
    ];
    for (path, srgb) in textures {
        let decoded = match source.load_bytes(&path).await {
            Ok(bytes) => assets::decode_image(&bytes),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(image) => emit(SceneEvent::Texture { path, image, srgb }),
            Err(e) => log::warn!("Texture {path} unavailable, using fallback: {e}"),
        }
    }

    let model = match source.load_bytes(&config.character_model).await {
        Ok(bytes) => assets::import_model(&bytes),
        Err(e) => Err(e),
    };
    match model {
        Ok(model) => emit(SceneEvent::Model(model)),
        Err(e) => log::error!("Failed to load model {}: {e}", config.character_model),
    }
}

pub struct SceneView {
    window: Arc<Window>,
    pub renderer: Renderer,
    pub world: SceneWorld,
    clock: FrameClock,
    cursor: glam::Vec2,
}

impl SceneView {
    pub async fn new(window: Arc<Window>, config: SceneConfig) -> anyhow::Result<Self> {
        let ctx = GpuContext::from_winit_window(window.clone()).await?;
        let mut renderer = Renderer::new(ctx);
        let [r, g, b, a] = config.clear_color;
        renderer.clear_color = wgpu::Color { r, g, b, a };

        let world = SceneWorld::new(config);
        renderer.update_uniforms(&world.rig.camera, world.scene.lights.first());

        Ok(Self {
            window,
            renderer,
            world,
            clock: FrameClock::new(),
            cursor: glam::Vec2::ZERO,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(size) = self.renderer.resize(width, height) {
            self.world.rig.camera.update_aspect(size);
        }
    }

    pub fn apply(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::Ready(_) => log::warn!("Scene view already initialized"),
            SceneEvent::Texture { path, image, srgb } => {
                self.renderer.set_texture(&path, &image, srgb)
            }
            SceneEvent::Model(model) => self.world.attach_model(model),
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.window.request_redraw();
        let delta_ms = self.clock.tick();
        self.world.frame(delta_ms);

        self.renderer.sync_scene(&self.world.scene);
        self.renderer
            .update_uniforms(&self.world.rig.camera, self.world.scene.lights.first());
        self.renderer.render()
    }

    fn pointer_down(&mut self, position: glam::Vec2) {
        let size = self.window.inner_size();
        self.world
            .pointer_down(position.x, position.y, size.width as f32, size.height as f32);
    }
}

pub struct SceneViewApp {
    proxy: EventLoopProxy<SceneEvent>,
    config: SceneConfig,
    view: Option<SceneView>,
    initializing: bool,
    pending: Vec<SceneEvent>,
}

impl SceneViewApp {
    pub fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> Self {
        Self {
            proxy: event_loop.create_proxy(),
            config,
            view: None,
            initializing: false,
            pending: Vec::new(),
        }
    }

    fn spawn_asset_loader(&self) {
        let source = AssetSource::new(self.config.asset_root.as_str());
        let config = self.config.clone();
        let proxy = self.proxy.clone();
        let emit = move |event| {
            if proxy.send_event(event).is_err() {
                log::debug!("Event loop closed before asset arrived");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(move || pollster::block_on(load_assets(source, config, emit)));
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(load_assets(source, config, emit));
        }
    }

    fn install(&mut self, mut view: SceneView) {
        self.initializing = false;
        let size = view.window.inner_size();
        view.resize(size.width, size.height);
        for event in self.pending.drain(..) {
            view.apply(event);
        }
        view.window.request_redraw();
        self.view = Some(view);
    }
}

impl ApplicationHandler<SceneEvent> for SceneViewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() || self.initializing {
            return;
        }
        self.initializing = true;
        let window = match super::create_window(event_loop, "walkabout") {
            Ok(window) => window,
            Err(e) => {
                log::error!("Unable to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.spawn_asset_loader();

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(SceneView::new(window, self.config.clone())) {
                Ok(view) => self.install(view),
                Err(e) => {
                    log::error!("Unable to create renderer: {e}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match SceneView::new(window, config).await {
                    Ok(view) => {
                        if proxy.send_event(SceneEvent::Ready(Box::new(view))).is_err() {
                            log::debug!("Event loop closed before renderer was ready");
                        }
                    }
                    Err(e) => log::error!("Unable to create renderer: {e}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        if let SceneEvent::Ready(view) = event {
            if self.view.is_none() {
                self.install(*view);
            }
            return;
        }
        match self.view.as_mut() {
            Some(view) => view.apply(event),
            // Assets can beat the renderer on the web.
            None => self.pending.push(event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let view = match &mut self.view {
            Some(view) => view,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => view.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match view.render() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = view.window.inner_size();
                    view.resize(size.width, size.height);
                }
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key, state, ..
                },
                ..
            } => {
                if let Some(arrow) = ArrowKey::from_winit(&logical_key) {
                    view.world.handle_key(arrow, state.is_pressed());
                } else if cfg!(not(target_arch = "wasm32"))
                    && logical_key == Key::Named(NamedKey::Escape)
                    && state.is_pressed()
                {
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                view.cursor = glam::Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => view.pointer_down(view.cursor),
            WindowEvent::Touch(Touch {
                phase: TouchPhase::Started,
                location,
                ..
            }) => {
                view.cursor = glam::Vec2::new(location.x as f32, location.y as f32);
                view.pointer_down(view.cursor);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Scene view closed");
        self.view = None;
    }
}

pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    super::init_logging();

    let event_loop = EventLoop::<SceneEvent>::with_user_event().build()?;

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = SceneViewApp::new(&event_loop, config);
        event_loop.run_app(&mut app)?;
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        let app = SceneViewApp::new(&event_loop, config);
        event_loop.spawn_app(app);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationGroup, AnimationSet};

    const WIDTH: f32 = 1600.0;
    const HEIGHT: f32 = 900.0;

    fn world() -> SceneWorld {
        let mut world = SceneWorld::new(SceneConfig::default());
        world.rig.camera.update_aspect(glam::UVec2::new(1600, 900));
        world
    }

    fn model() -> ImportedModel {
        ImportedModel {
            geometry: primitives::box_geometry(0.5, 1.8, 0.5),
            base_color: glam::Vec3::ONE,
            animations: AnimationSet::new(vec![
                AnimationGroup::new("idle", 0.0, 2.0),
                AnimationGroup::new("running", 0.0, 0.8),
            ]),
        }
    }

    fn screen_point(world: &SceneWorld, point: glam::Vec3) -> (f32, f32) {
        let ndc = world.rig.camera.view_proj().project_point3(point);
        ((ndc.x + 1.0) * 0.5 * WIDTH, (1.0 - ndc.y) * 0.5 * HEIGHT)
    }

    fn playing(world: &SceneWorld) -> Vec<String> {
        world
            .character
            .model()
            .map(|m| m.animations.playing().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    #[test]
    fn missing_assets_emit_nothing() {
        let emitted = std::cell::Cell::new(0);
        pollster::block_on(load_assets(
            AssetSource::new("/nonexistent"),
            SceneConfig::default(),
            |_| emitted.set(emitted.get() + 1),
        ));
        assert_eq!(emitted.get(), 0);
    }

    #[test]
    fn click_before_model_is_ignored() {
        let mut world = world();
        let (x, y) = screen_point(&world, glam::Vec3::new(4.0, 0.0, 8.0));
        let hit = world.pointer_down(x, y, WIDTH, HEIGHT).unwrap();
        assert_eq!(hit.name, GROUND_NAME);
        assert!(!world.character.is_travelling());
    }

    #[test]
    fn walks_to_clicked_ground_point() {
        let mut world = world();
        world.attach_model(model());
        assert_eq!(playing(&world), ["idle"]);

        let goal = glam::Vec3::new(4.0, 0.0, 8.0);
        let (x, y) = screen_point(&world, goal);
        let hit = world.pointer_down(x, y, WIDTH, HEIGHT).unwrap();
        assert_eq!(hit.name, GROUND_NAME);
        assert!(hit.point.abs_diff_eq(goal, 0.05));
        assert!(world.character.is_travelling());
        assert_eq!(playing(&world), ["running"]);

        let mut frames = 0;
        while world.character.is_travelling() && frames < 1000 {
            world.frame(16.0);
            frames += 1;
        }
        assert!(!world.character.is_travelling());
        assert_eq!(playing(&world), ["idle"]);

        let position = world.scene.node(world.character.proxy).position;
        assert!(position.distance(hit.point) <= 1.1 + 1e-4);
        assert!((position.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clicking_the_character_does_not_move_it() {
        let mut world = world();
        world.attach_model(model());
        let (x, y) = screen_point(&world, glam::Vec3::new(0.0, 1.0, 0.0));
        let hit = world.pointer_down(x, y, WIDTH, HEIGHT).unwrap();
        assert_ne!(hit.name, GROUND_NAME);
        assert!(!world.character.is_travelling());
    }

    #[test]
    fn arrow_keys_slide_the_camera() {
        let mut world = world();
        let start = world.scene.world_position(world.rig.container);

        world.handle_key(ArrowKey::Up, true);
        world.handle_key(ArrowKey::Left, true);
        world.frame(1000.0);
        let moved = world.scene.world_position(world.rig.container);
        assert!(moved.abs_diff_eq(start + glam::Vec3::new(-3.0, 0.0, 3.0), 1e-4));

        world.handle_key(ArrowKey::Down, false);
        world.handle_key(ArrowKey::Right, false);
        world.frame(1000.0);
        assert_eq!(world.scene.world_position(world.rig.container), moved);
    }
}
