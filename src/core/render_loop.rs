use std::cell::Cell;
use std::rc::Rc;

use super::clock::FrameClock;
use super::frame::{FrameInfo, FrameStats};
use super::renderer::SceneRenderer;
use super::viewport::Viewport;
use crate::animation::AnimationDriver;
use crate::scene::SceneGraph;

/// Cancellation token for a running [`RenderLoop`]
///
/// Cancelling is immediate and permanent; a stopped loop is never resumed.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    cancelled: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Frame drawn; exactly one follow-up frame should be scheduled
    Rendered(FrameInfo),
    /// Surface is empty (minimised); nothing drawn, wait for the next resize
    Paused,
    /// Loop cancelled; schedule nothing
    Stopped,
}

impl FrameOutcome {
    pub fn wants_next_frame(&self) -> bool {
        matches!(self, FrameOutcome::Rendered(_))
    }
}

/// Per-frame scheduler: sample time, advance animation, render
pub struct RenderLoop<C: FrameClock> {
    clock: C,
    handle: LoopHandle,
    frame_number: u64,
    time: f32,
    stats: FrameStats,
}

impl<C: FrameClock> RenderLoop<C> {
    pub fn start(clock: C) -> (Self, LoopHandle) {
        let handle = LoopHandle::default();
        let render_loop = Self {
            clock,
            handle: handle.clone(),
            frame_number: 0,
            time: 0.0,
            stats: FrameStats::default(),
        };
        (render_loop, handle)
    }

    /// Run one frame unless cancelled
    ///
    /// Animation for the frame is applied before the frame is rendered. A
    /// failed render is logged and the loop keeps going.
    pub fn frame<R: SceneRenderer>(
        &mut self,
        driver: &mut AnimationDriver,
        scene: &mut SceneGraph,
        viewport: &mut Viewport<R>,
    ) -> FrameOutcome {
        if self.handle.is_cancelled() {
            return FrameOutcome::Stopped;
        }
        if viewport.size().is_empty() {
            return FrameOutcome::Paused;
        }

        let delta = self.clock.tick();
        self.time += delta;
        let info = FrameInfo::new(self.frame_number, self.time, delta);
        self.frame_number += 1;

        driver.advance(delta);
        driver.apply_pose(scene);

        if let Err(e) = viewport.render(scene) {
            log::warn!("Frame {} render failed: {}", info.number, e);
        }

        if let Some(fps) = self.stats.record(delta) {
            log::debug!("FPS: {:.1}", fps);
        }

        FrameOutcome::Rendered(info)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_cancelled()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_number
    }

    pub fn fps(&self) -> f32 {
        self.stats.fps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::core::clock::ManualClock;
    use crate::core::surface::SurfaceSize;
    use crate::core::viewport::Camera;
    use crate::error::RenderError;

    #[derive(Default)]
    struct CountingRenderer {
        renders: usize,
        fail: bool,
    }

    impl SceneRenderer for CountingRenderer {
        fn render(&mut self, _scene: &SceneGraph, _camera: &Camera) -> Result<(), RenderError> {
            self.renders += 1;
            if self.fail {
                Err(RenderError::Timeout)
            } else {
                Ok(())
            }
        }

        fn resize(&mut self, _size: SurfaceSize) {}

        fn release(&mut self) {}
    }

    fn parts(renderer: CountingRenderer) -> (AnimationDriver, SceneGraph, Viewport<CountingRenderer>) {
        let viewport = Viewport::new(renderer, SurfaceSize::new(800, 600), &CameraConfig::default());
        (AnimationDriver::default(), SceneGraph::default(), viewport)
    }

    #[test]
    fn test_frames_count_and_time() {
        let (mut driver, mut scene, mut viewport) = parts(CountingRenderer::default());
        let (mut render_loop, _handle) = RenderLoop::start(ManualClock::fixed(0.5));

        render_loop.frame(&mut driver, &mut scene, &mut viewport);
        let outcome = render_loop.frame(&mut driver, &mut scene, &mut viewport);

        assert_eq!(outcome, FrameOutcome::Rendered(FrameInfo::new(1, 1.0, 0.5)));
        assert_eq!(render_loop.frames_rendered(), 2);
        assert_eq!(viewport.renderer().renders, 2);
    }

    #[test]
    fn test_cancel_stops_frames() {
        let (mut driver, mut scene, mut viewport) = parts(CountingRenderer::default());
        let (mut render_loop, handle) = RenderLoop::start(ManualClock::fixed(0.1));

        assert!(render_loop.frame(&mut driver, &mut scene, &mut viewport).wants_next_frame());
        handle.cancel();
        let outcome = render_loop.frame(&mut driver, &mut scene, &mut viewport);

        assert_eq!(outcome, FrameOutcome::Stopped);
        assert!(!outcome.wants_next_frame());
        assert!(!render_loop.is_running());
        assert_eq!(viewport.renderer().renders, 1);
    }

    #[test]
    fn test_render_error_keeps_loop_alive() {
        let failing = CountingRenderer {
            fail: true,
            ..Default::default()
        };
        let (mut driver, mut scene, mut viewport) = parts(failing);
        let (mut render_loop, _handle) = RenderLoop::start(ManualClock::fixed(0.1));

        for _ in 0..3 {
            assert!(render_loop.frame(&mut driver, &mut scene, &mut viewport).wants_next_frame());
        }
        assert_eq!(viewport.renderer().renders, 3);
    }

    #[test]
    fn test_empty_surface_pauses_until_resized() {
        let (mut driver, mut scene, mut viewport) = parts(CountingRenderer::default());
        let (mut render_loop, _handle) = RenderLoop::start(ManualClock::fixed(0.1));

        viewport.resize(0, 0);
        let outcome = render_loop.frame(&mut driver, &mut scene, &mut viewport);
        assert_eq!(outcome, FrameOutcome::Paused);
        assert!(!outcome.wants_next_frame());
        assert_eq!(render_loop.frames_rendered(), 0);

        viewport.resize(640, 480);
        assert!(render_loop.frame(&mut driver, &mut scene, &mut viewport).wants_next_frame());
        assert_eq!(viewport.renderer().renders, 1);
    }

    #[test]
    fn test_cloned_handle_shares_cancellation() {
        let (render_loop, handle) = RenderLoop::start(ManualClock::fixed(0.1));
        let other = handle.clone();
        other.cancel();
        assert!(handle.is_cancelled());
        assert!(!render_loop.is_running());
    }
}
