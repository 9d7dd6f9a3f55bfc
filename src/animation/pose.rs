//! Posed node transforms and CPU skinning.

use glam::{Mat4, Vec3};

use super::clip::AnimationClip;
use crate::asset::{MeshPrimitive, ObjectGraph, Transform};

/// Local and world transforms of every node in one object graph
#[derive(Debug, Clone)]
pub struct Pose {
    root: Mat4,
    locals: Vec<Transform>,
    world: Vec<Mat4>,
    clip_time: Option<f32>,
}

impl Pose {
    /// Rest pose, with `root` applied above the graph's roots
    pub fn rest(graph: &ObjectGraph, root: Mat4) -> Self {
        let locals: Vec<Transform> = graph.nodes().iter().map(|n| n.rest).collect();
        let mut pose = Self {
            root,
            world: vec![Mat4::IDENTITY; locals.len()],
            locals,
            clip_time: None,
        };
        pose.update_world(graph);
        pose
    }

    /// Re-poses from rest with `clip` sampled at clip-local `time`
    pub fn apply_clip(&mut self, graph: &ObjectGraph, clip: &AnimationClip, time: f32) {
        for (local, node) in self.locals.iter_mut().zip(graph.nodes()) {
            *local = node.rest;
        }
        clip.sample_into(time, &mut self.locals);
        self.clip_time = Some(time);
        self.update_world(graph);
    }

    fn update_world(&mut self, graph: &ObjectGraph) {
        for &idx in graph.traversal_order() {
            let local = self.locals[idx].to_matrix();
            let parent = graph.nodes()[idx]
                .parent
                .map(|p| self.world[p])
                .unwrap_or(self.root);
            self.world[idx] = parent * local;
        }
    }

    pub fn world(&self) -> &[Mat4] {
        &self.world
    }

    pub fn locals(&self) -> &[Transform] {
        &self.locals
    }

    /// Clip time this pose was sampled at; `None` for the rest pose
    pub fn clip_time(&self) -> Option<f32> {
        self.clip_time
    }
}

/// Deforms one primitive by `pose`, writing world-space positions and normals
///
/// Skinned primitives blend their joint palette; rigid ones follow their
/// node's world transform.
pub fn deform(
    graph: &ObjectGraph,
    pose: &Pose,
    mesh: &MeshPrimitive,
    positions: &mut Vec<Vec3>,
    normals: &mut Vec<Vec3>,
) {
    positions.clear();
    normals.clear();

    let skin = mesh
        .skin
        .and_then(|s| graph.skins().get(s))
        .filter(|_| mesh.is_skinned());

    let Some(skin) = skin else {
        let model = pose.world().get(mesh.node).copied().unwrap_or(pose.root);
        for (i, p) in mesh.positions.iter().enumerate() {
            positions.push(model.transform_point3(*p));
            let n = mesh.normals.get(i).copied().unwrap_or(Vec3::Y);
            normals.push(model.transform_vector3(n).normalize_or_zero());
        }
        return;
    };

    let palette: Vec<Mat4> = skin
        .joints
        .iter()
        .enumerate()
        .map(|(j, &node)| {
            let world = pose.world().get(node).copied().unwrap_or(Mat4::IDENTITY);
            let inverse_bind = skin.inverse_bind.get(j).copied().unwrap_or(Mat4::IDENTITY);
            world * inverse_bind
        })
        .collect();

    let influences = mesh.joints.iter().zip(&mesh.weights);
    for (i, (p, (joints, weights))) in mesh.positions.iter().zip(influences).enumerate() {
        let n = mesh.normals.get(i).copied().unwrap_or(Vec3::Y);

        let mut skinned = Mat4::ZERO;
        let mut total = 0.0;
        for k in 0..4 {
            let w = weights[k];
            if w <= 0.0 {
                continue;
            }
            if let Some(m) = palette.get(joints[k] as usize) {
                skinned += *m * w;
                total += w;
            }
        }
        if total <= 0.0 {
            skinned = Mat4::IDENTITY;
        } else if (total - 1.0).abs() > 1e-4 {
            skinned *= 1.0 / total;
        }

        positions.push(skinned.transform_point3(*p));
        normals.push(skinned.transform_vector3(n).normalize_or_zero());
    }
}
