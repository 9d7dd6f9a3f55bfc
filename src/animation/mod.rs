//! Playback of the attached asset's first clip.
//!
//! The driver is an explicit two-state machine. `Idle` has nothing bound and
//! ignores time; `Bound` owns a [`ClipPlayer`] for the dynamic node it was
//! bound against.

mod clip;
mod pose;

use std::sync::Arc;

use crate::scene::{DynamicNode, SceneGraph};

pub use clip::{AnimationClip, Channel, Interpolation, Keyframes};
pub use pose::{deform, Pose};

/// Playback speed multiplier applied to every frame delta
pub const PLAYBACK_RATE: f32 = 0.65;

/// Time accumulator bound to one clip of one attached node
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    clip: Arc<AnimationClip>,
    generation: u64,
    elapsed: f32,
    rate: f32,
}

impl ClipPlayer {
    fn new(clip: Arc<AnimationClip>, generation: u64, rate: f32) -> Self {
        Self {
            clip,
            generation,
            elapsed: 0.0,
            rate,
        }
    }

    /// Accumulated playback time, before wrapping
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Position on the clip timeline
    pub fn local_time(&self) -> f32 {
        self.clip.local_time(self.elapsed)
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Scene generation of the node this player was bound for
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Bound(ClipPlayer),
}

#[derive(Debug)]
pub struct AnimationDriver {
    state: DriverState,
    rate: f32,
}

impl AnimationDriver {
    pub fn new(rate: f32) -> Self {
        Self {
            state: DriverState::Idle,
            rate,
        }
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, DriverState::Bound(_))
    }

    pub fn player(&self) -> Option<&ClipPlayer> {
        match &self.state {
            DriverState::Bound(player) => Some(player),
            DriverState::Idle => None,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Binds to the first clip of a freshly attached node
    ///
    /// Any previous player is discarded mid-clip. A node without clips leaves
    /// the driver idle.
    pub fn bind(&mut self, node: &DynamicNode) {
        self.state = match node.handle().first_clip() {
            Some(clip) => {
                log::info!(
                    "Playing clip {:?} of {} ({:.2}s) at rate {}",
                    clip.name(),
                    node.handle().name(),
                    clip.duration(),
                    self.rate
                );
                DriverState::Bound(ClipPlayer::new(Arc::clone(clip), node.generation(), self.rate))
            }
            None => {
                log::info!("{} has no animation clips; driver idle", node.handle().name());
                DriverState::Idle
            }
        };
    }

    /// Accumulates `delta × rate` seconds of playback; no-op while idle
    pub fn advance(&mut self, delta: f32) {
        if let DriverState::Bound(player) = &mut self.state {
            if delta.is_finite() && delta > 0.0 {
                player.elapsed += delta * player.rate;
            }
        }
    }

    /// Poses the dynamic node at the player's current clip time
    ///
    /// Only touches the node the player was bound for.
    pub fn apply_pose(&self, scene: &mut SceneGraph) {
        let DriverState::Bound(player) = &self.state else {
            return;
        };
        if let Some(node) = scene.dynamic_asset_mut() {
            if node.generation() == player.generation {
                node.pose_at(&player.clip, player.local_time());
            }
        }
    }

    /// Drops any binding
    pub fn release(&mut self) {
        if self.is_bound() {
            log::debug!("Releasing animation binding");
        }
        self.state = DriverState::Idle;
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(PLAYBACK_RATE)
    }
}
