use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use diorama::cli::Cli;
use diorama::config::ViewerConfig;
use diorama::core::{Clock, ResizeSignal, Session, SurfaceSize};
use diorama::gfx::GpuRenderer;
use diorama::loaders::{AssetPath, GltfSource, ThreadedLoader};

type ViewerSession = Session<GpuRenderer, ThreadedLoader<GltfSource>, Clock>;

// === Application ===

struct App {
    config: ViewerConfig,
    resize: ResizeSignal,
    window: Option<Arc<Window>>,
    session: Option<ViewerSession>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            resize: ResizeSignal::new(),
            window: None,
            session: None,
        }
    }

    fn mount(&mut self, window: Arc<Window>) -> Result<ViewerSession> {
        let renderer = pollster::block_on(GpuRenderer::new(window.clone()))
            .context("Failed to initialize renderer")?;
        let loader = ThreadedLoader::new(
            GltfSource,
            AssetPath::new(
                self.config.asset_dir.clone(),
                self.config.asset_extension.clone(),
            ),
        );
        let size = window.inner_size();

        Ok(Session::start(
            &self.config,
            renderer,
            loader,
            &self.resize,
            Clock::new(),
            SurfaceSize::new(size.width, size.height),
        ))
    }

    fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match self.mount(window.clone()) {
            Ok(session) => {
                self.session = Some(session);
                self.window = Some(window);
                self.request_redraw();
            }
            Err(e) => {
                log::error!("{:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::KeyR),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(session) = &mut self.session {
                    log::info!("Reloading {:?}", self.config.asset);
                    session.load_asset(&self.config.asset);
                }
            }
            WindowEvent::Resized(size) => {
                self.resize.notify(SurfaceSize::new(size.width, size.height));
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if session.frame().wants_next_frame() {
                    self.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    log::info!(
        "Diorama - {:?} from {:?} (R to reload, Escape to quit)",
        config.asset,
        config.asset_dir
    );

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
