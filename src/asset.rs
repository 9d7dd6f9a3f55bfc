//! Loaded asset data: the object graph and its animation clips.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::animation::AnimationClip;

/// Translation / rotation / scale of one node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    /// Rest transform, used wherever no clip channel drives the node
    pub rest: Transform,
}

/// Joint list and inverse bind matrices of one skin
#[derive(Debug, Clone)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

/// One triangle-list primitive, attached to a node and optionally skinned
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub node: usize,
    pub skin: Option<usize>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Per-vertex joint indices into the skin's joint list; empty when rigid
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
}

impl MeshPrimitive {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Skinned only when every vertex carries joint indices and weights
    pub fn is_skinned(&self) -> bool {
        let n = self.positions.len();
        self.skin.is_some() && n > 0 && self.joints.len() == n && self.weights.len() == n
    }
}

/// Node hierarchy plus the geometry hanging off it
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    nodes: Vec<Node>,
    meshes: Vec<MeshPrimitive>,
    skins: Vec<Skin>,
    /// Node indices ordered so every parent precedes its children
    order: Vec<usize>,
}

impl ObjectGraph {
    pub fn new(nodes: Vec<Node>, meshes: Vec<MeshPrimitive>, skins: Vec<Skin>) -> Self {
        let order = parent_first_order(&nodes);
        Self {
            nodes,
            meshes,
            skins,
            order,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[MeshPrimitive] {
        &self.meshes
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn traversal_order(&self) -> &[usize] {
        &self.order
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshPrimitive::vertex_count).sum()
    }

    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len()).sum()
    }
}

/// Breadth-first from the roots; nodes caught in a parent cycle are dropped
fn parent_first_order(nodes: &[Node]) -> Vec<usize> {
    let mut children = vec![Vec::new(); nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    for (idx, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) if parent < nodes.len() => children[parent].push(idx),
            _ => order.push(idx),
        }
    }

    let mut cursor = 0;
    while cursor < order.len() {
        let idx = order[cursor];
        order.extend_from_slice(&children[idx]);
        cursor += 1;
    }
    order
}

/// A completed load: the object graph plus its clips in file order
///
/// Clips are shared so a playback binding can hold one without borrowing the
/// scene that owns the handle.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    name: String,
    graph: ObjectGraph,
    clips: Vec<Arc<AnimationClip>>,
}

impl AssetHandle {
    pub fn new(name: impl Into<String>, graph: ObjectGraph, clips: Vec<AnimationClip>) -> Self {
        Self {
            name: name.into(),
            graph,
            clips: clips.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn clips(&self) -> &[Arc<AnimationClip>] {
        &self.clips
    }

    /// The clip that gets played
    pub fn first_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clips.first()
    }
}
