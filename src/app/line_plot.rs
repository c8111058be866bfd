//! Live line chart of the pointer's angle over the last N moves.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    chart::{self, LinePlot, PlotLayout, RollingWindow},
    config::PlotConfig,
    context::GpuContext,
    line::{self, LineRenderer},
};

/// Sample history plus the chart it is drawn into.
pub struct PlotState {
    pub samples: RollingWindow,
    pub plot: LinePlot,
    pub line_color: glam::Vec4,
}

impl PlotState {
    pub fn new(config: &PlotConfig) -> Self {
        Self {
            samples: RollingWindow::new(config.capacity),
            plot: LinePlot::from_config(config),
            line_color: glam::Vec4::from_array(config.line_color),
        }
    }

    /// `x`, `y` are relative to the plot container's top-left corner.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.samples.push(chart::pointer_sample(x, y));
    }

    pub fn layout(&self) -> PlotLayout {
        self.plot.layout(&self.samples)
    }

    pub fn vertices(&self) -> Vec<line::LineVertex> {
        line::plot_vertices(&self.layout(), self.plot.marker_radius, self.line_color)
    }
}

pub struct PlotView {
    window: Arc<Window>,
    renderer: LineRenderer,
    pub state: PlotState,
}

impl PlotView {
    pub async fn new(window: Arc<Window>, config: &PlotConfig) -> anyhow::Result<Self> {
        let ctx = GpuContext::from_winit_window(window.clone()).await?;
        let plot_size = glam::Vec2::new(config.width, config.height);
        let mut renderer = LineRenderer::new(ctx, plot_size);
        let [r, g, b, a] = config.background;
        renderer.clear_color = wgpu::Color { r, g, b, a };
        Ok(Self {
            window,
            renderer,
            state: PlotState::new(config),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.renderer.resize(width, height).is_some() {
            self.window.request_redraw();
        }
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.state.pointer_moved(x, y);
        self.window.request_redraw();
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let vertices = self.state.vertices();
        self.renderer.set_vertices(&vertices);
        self.renderer.render()
    }
}

pub struct PlotApp {
    #[cfg(target_arch = "wasm32")]
    proxy: Option<winit::event_loop::EventLoopProxy<PlotView>>,
    config: PlotConfig,
    view: Option<PlotView>,
}

impl PlotApp {
    pub fn new(#[allow(unused_variables)] event_loop: &EventLoop<PlotView>, config: PlotConfig) -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            proxy: Some(event_loop.create_proxy()),
            config,
            view: None,
        }
    }

    fn install(&mut self, mut view: PlotView) {
        let size = view.window.inner_size();
        view.resize(size.width, size.height);
        view.window.request_redraw();
        self.view = Some(view);
    }
}

impl ApplicationHandler<PlotView> for PlotApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            return;
        }
        let window = match super::create_window(event_loop, "line plot") {
            Ok(window) => window,
            Err(e) => {
                log::error!("Unable to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(PlotView::new(window, &self.config)) {
                Ok(view) => self.install(view),
                Err(e) => {
                    log::error!("Unable to create renderer: {e}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            if let Some(proxy) = self.proxy.take() {
                let config = self.config.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match PlotView::new(window, &config).await {
                        Ok(view) => {
                            if proxy.send_event(view).is_err() {
                                log::debug!("Event loop closed before renderer was ready");
                            }
                        }
                        Err(e) => log::error!("Unable to create renderer: {e}"),
                    }
                });
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, view: PlotView) {
        self.install(view);
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
            WindowEvent::CursorMoved { position, .. } => {
                view.pointer_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::Touch(Touch {
                phase: TouchPhase::Moved,
                location,
                ..
            }) => view.pointer_moved(location.x as f32, location.y as f32),
            WindowEvent::RedrawRequested => match view.render() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = view.window.inner_size();
                    view.resize(size.width, size.height);
                }
                Err(e) => log::error!("Unable to render {}", e),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if cfg!(not(target_arch = "wasm32")) => event_loop.exit(),
            _ => {}
        }
    }
}

pub fn run(config: PlotConfig) -> anyhow::Result<()> {
    super::init_logging();

    let event_loop = EventLoop::<PlotView>::with_user_event().build()?;

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = PlotApp::new(&event_loop, config);
        event_loop.run_app(&mut app)?;
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        let app = PlotApp::new(&event_loop, config);
        event_loop.spawn_app(app);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_moves_feed_bounded_window() {
        let mut state = PlotState::new(&PlotConfig::default());
        for i in 0..450 {
            state.pointer_moved(i as f32, 100.0);
        }
        assert_eq!(state.samples.len(), 200);
        let layout = state.layout();
        assert_eq!(layout.line.len(), 200);
        assert_eq!(layout.line.first().unwrap().x, 20.0);
        assert_eq!(layout.line.last().unwrap().x, 620.0);
    }

    #[test]
    fn no_moves_no_vertices() {
        let state = PlotState::new(&PlotConfig::default());
        assert!(state.vertices().is_empty());
    }
}
