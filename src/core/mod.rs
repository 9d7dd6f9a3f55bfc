pub mod clock;
pub mod frame;
pub mod lifecycle;
pub mod render_loop;
pub mod renderer;
pub mod resize;
pub mod surface;
pub mod viewport;

pub use clock::{Clock, FrameClock, ManualClock};
pub use frame::{FrameInfo, FrameStats};
pub use lifecycle::{Session, SessionPhase};
pub use render_loop::{FrameOutcome, LoopHandle, RenderLoop};
pub use renderer::SceneRenderer;
pub use resize::{ResizeSignal, ResizeSubscription};
pub use surface::SurfaceSize;
pub use viewport::{Camera, OrbitControls, Viewport};
