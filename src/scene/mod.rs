//! Scene graph: a fixed set of static entities plus one dynamic-asset slot.

mod entities;

use glam::{Mat4, Vec3};

use crate::animation::{AnimationClip, Pose};
use crate::asset::AssetHandle;
use crate::config::SceneConfig;
use crate::math::hex_to_rgb;

pub use entities::{
    default_entities, DirectionalLight, GridHelper, GroundPlane, HemisphereLight, StaticEntity,
};

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

/// The attached asset together with its current pose
#[derive(Debug)]
pub struct DynamicNode {
    generation: u64,
    handle: AssetHandle,
    pose: Pose,
}

impl DynamicNode {
    /// Attach counter value; strictly increases across attaches
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&self) -> &AssetHandle {
        &self.handle
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub(crate) fn pose_at(&mut self, clip: &AnimationClip, time: f32) {
        self.pose.apply_clip(self.handle.graph(), clip, time);
    }
}

#[derive(Debug)]
pub struct SceneGraph {
    background: [f32; 3],
    fog: Fog,
    statics: Vec<StaticEntity>,
    asset_root: Mat4,
    dynamic: Option<DynamicNode>,
    next_generation: u64,
}

impl SceneGraph {
    pub fn new(background: [f32; 3], fog: Fog, statics: Vec<StaticEntity>, asset_root: Mat4) -> Self {
        Self {
            background,
            fog,
            statics,
            asset_root,
            dynamic: None,
            next_generation: 1,
        }
    }

    /// Stock diorama: grey backdrop and fog, floor, grid and light rig
    pub fn from_config(config: &SceneConfig) -> Self {
        let color = hex_to_rgb(config.background);
        Self::new(
            color,
            Fog {
                color,
                near: config.fog_near,
                far: config.fog_far,
            },
            default_entities(),
            Mat4::from_scale(Vec3::splat(config.asset_scale)),
        )
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }

    pub fn fog(&self) -> Fog {
        self.fog
    }

    /// Entities fixed at construction
    pub fn static_entities(&self) -> &[StaticEntity] {
        &self.statics
    }

    pub fn hemisphere_light(&self) -> Option<&HemisphereLight> {
        self.statics.iter().find_map(|e| match e {
            StaticEntity::Hemisphere(light) => Some(light),
            _ => None,
        })
    }

    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.statics.iter().find_map(|e| match e {
            StaticEntity::Directional(light) => Some(light),
            _ => None,
        })
    }

    /// Replaces the dynamic node with `handle`, returning the superseded one
    ///
    /// The most recent call always wins; the previous node is detached
    /// unconditionally.
    pub fn attach_dynamic_asset(&mut self, handle: AssetHandle) -> Option<AssetHandle> {
        let generation = self.next_generation;
        self.next_generation += 1;

        let pose = Pose::rest(handle.graph(), self.asset_root);
        let node = DynamicNode {
            generation,
            handle,
            pose,
        };

        let previous = self.dynamic.replace(node).map(|n| n.handle);
        if let Some(prev) = &previous {
            log::debug!("Detached {} (superseded)", prev.name());
        }
        previous
    }

    pub fn dynamic_asset(&self) -> Option<&DynamicNode> {
        self.dynamic.as_ref()
    }

    pub fn dynamic_asset_mut(&mut self) -> Option<&mut DynamicNode> {
        self.dynamic.as_mut()
    }

    pub fn clear_dynamic_asset(&mut self) -> Option<AssetHandle> {
        self.dynamic.take().map(|n| n.handle)
    }

    /// Number of dynamic-asset nodes; never more than one
    pub fn dynamic_count(&self) -> usize {
        usize::from(self.dynamic.is_some())
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}
