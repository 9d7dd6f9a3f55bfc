//! Session: ordered startup, per-frame driving and idempotent teardown of one
//! mounted diorama.

use super::clock::{Clock, FrameClock};
use super::render_loop::{FrameOutcome, LoopHandle, RenderLoop};
use super::renderer::SceneRenderer;
use super::resize::{ResizeSignal, ResizeSubscription};
use super::surface::SurfaceSize;
use super::viewport::Viewport;
use crate::animation::AnimationDriver;
use crate::config::ViewerConfig;
use crate::loaders::{completion_channel, AssetLoader, LoadCompletions, LoadTicket};
use crate::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    TornDown,
}

pub struct Session<R: SceneRenderer, L: AssetLoader, C: FrameClock = Clock> {
    viewport: Viewport<R>,
    scene: SceneGraph,
    driver: AnimationDriver,
    loader: L,
    completions: Option<LoadCompletions>,
    render_loop: RenderLoop<C>,
    loop_handle: LoopHandle,
    resize: Option<ResizeSubscription>,
    phase: SessionPhase,
}

impl<R: SceneRenderer, L: AssetLoader, C: FrameClock> Session<R, L, C> {
    /// Mount a diorama onto `renderer`
    ///
    /// Startup order: viewport, scene with its static entities, the first
    /// asset load, resize subscription, then the render loop.
    pub fn start(
        config: &ViewerConfig,
        renderer: R,
        mut loader: L,
        resize_signal: &ResizeSignal,
        clock: C,
        initial_size: SurfaceSize,
    ) -> Self {
        let viewport = Viewport::new(renderer, initial_size, &config.camera);
        let scene = SceneGraph::from_config(&config.scene);

        let (sender, completions) = completion_channel();
        loader.register(sender);
        let ticket = loader.load(&config.asset);
        log::info!("Requested initial asset {:?} ({:?})", config.asset, ticket);

        let resize = resize_signal.subscribe();
        let (render_loop, loop_handle) = RenderLoop::start(clock);

        Self {
            viewport,
            scene,
            driver: AnimationDriver::new(config.playback_rate),
            loader,
            completions: Some(completions),
            render_loop,
            loop_handle,
            resize: Some(resize),
            phase: SessionPhase::Running,
        }
    }

    /// Run one frame: pending resize, finished loads, then the render loop
    pub fn frame(&mut self) -> FrameOutcome {
        if self.phase == SessionPhase::TornDown {
            return FrameOutcome::Stopped;
        }

        if let Some(size) = self.resize.as_ref().and_then(ResizeSubscription::take) {
            self.viewport.resize(size.width, size.height);
        }
        self.poll_loads();

        self.render_loop
            .frame(&mut self.driver, &mut self.scene, &mut self.viewport)
    }

    /// Apply every load that has finished, in completion order
    ///
    /// Returns how many assets were attached. Failures are logged and leave
    /// the current asset in place.
    pub fn poll_loads(&mut self) -> usize {
        let Some(completions) = self.completions.as_mut() else {
            return 0;
        };

        let mut attached = 0;
        for completion in completions.drain() {
            match completion.result {
                Ok(handle) => {
                    log::info!(
                        "Loaded {:?}: {} nodes, {} vertices, {} clips",
                        completion.name,
                        handle.graph().nodes().len(),
                        handle.graph().vertex_count(),
                        handle.clips().len()
                    );
                    self.scene.attach_dynamic_asset(handle);
                    if let Some(node) = self.scene.dynamic_asset() {
                        self.driver.bind(node);
                    }
                    attached += 1;
                }
                Err(e) => {
                    log::warn!("Failed to load {:?} ({:?}): {}", completion.name, completion.ticket, e);
                }
            }
        }
        attached
    }

    /// Start loading another asset; it replaces the current one when done
    pub fn load_asset(&mut self, name: &str) -> Option<LoadTicket> {
        if self.phase == SessionPhase::TornDown {
            log::debug!("Ignoring load of {:?} after teardown", name);
            return None;
        }
        Some(self.loader.load(name))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.phase == SessionPhase::TornDown {
            log::debug!("Ignoring resize {}x{} after teardown", width, height);
            return;
        }
        self.viewport.resize(width, height);
    }

    /// Stop the loop and release everything the session acquired
    ///
    /// Safe to call any number of times.
    pub fn teardown(&mut self) {
        if self.phase == SessionPhase::TornDown {
            return;
        }
        self.phase = SessionPhase::TornDown;

        self.loop_handle.cancel();
        self.resize = None;
        self.viewport.release();
        self.driver.release();
        self.scene.clear_dynamic_asset();
        self.completions = None;

        log::info!(
            "Session torn down after {} frames",
            self.render_loop.frames_rendered()
        );
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running && self.render_loop.is_running()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn viewport(&self) -> &Viewport<R> {
        &self.viewport
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loop_handle(&self) -> &LoopHandle {
        &self.loop_handle
    }

    pub fn frames_rendered(&self) -> u64 {
        self.render_loop.frames_rendered()
    }
}

impl<R: SceneRenderer, L: AssetLoader, C: FrameClock> Drop for Session<R, L, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
