#![allow(dead_code)]

use std::path::Path;

use glam::Vec3;

use diorama::animation::{AnimationClip, Channel, Interpolation, Keyframes};
use diorama::asset::{AssetHandle, MeshPrimitive, Node, ObjectGraph, Transform};
use diorama::core::{Camera, SceneRenderer, SurfaceSize};
use diorama::error::{LoadError, RenderError};
use diorama::loaders::{AssetLoader, AssetSource, CompletionSender, LoadCompletion, LoadTicket};
use diorama::scene::SceneGraph;

/// What the renderer saw on one call
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub aspect: f32,
    pub asset: Option<String>,
    pub clip_time: Option<f32>,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub renders: Vec<RenderRecord>,
    pub resizes: Vec<SurfaceSize>,
    pub releases: usize,
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        let node = scene.dynamic_asset();
        self.renders.push(RenderRecord {
            aspect: camera.aspect,
            asset: node.map(|n| n.handle().name().to_string()),
            clip_time: node.and_then(|n| n.pose().clip_time()),
        });
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.resizes.push(size);
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

/// Loader whose requests finish only when the test says so
#[derive(Default)]
pub struct ManualLoader {
    sender: Option<CompletionSender>,
    pub requests: Vec<(LoadTicket, String)>,
}

impl ManualLoader {
    /// Finish request `index` with `asset`; false once the session is gone
    pub fn succeed(&self, index: usize, asset: AssetHandle) -> bool {
        let (ticket, name) = self.requests[index].clone();
        self.send(LoadCompletion {
            ticket,
            name,
            result: Ok(asset),
        })
    }

    pub fn fail(&self, index: usize) -> bool {
        let (ticket, name) = self.requests[index].clone();
        self.send(LoadCompletion {
            ticket,
            name: name.clone(),
            result: Err(LoadError::NotFound(format!("assets/{name}.glb").into())),
        })
    }

    fn send(&self, completion: LoadCompletion) -> bool {
        self.sender
            .as_ref()
            .map(|s| s.complete(completion))
            .unwrap_or(false)
    }
}

impl AssetLoader for ManualLoader {
    fn register(&mut self, completions: CompletionSender) {
        self.sender = Some(completions);
    }

    fn load(&mut self, name: &str) -> LoadTicket {
        let ticket = LoadTicket(self.requests.len() as u64 + 1);
        self.requests.push((ticket, name.to_string()));
        ticket
    }
}

/// Serves every name from memory
pub struct MemorySource {
    pub clips: usize,
}

impl AssetSource for MemorySource {
    fn fetch(&self, name: &str, _path: &Path) -> Result<AssetHandle, LoadError> {
        Ok(animated_asset(name, self.clips))
    }
}

/// A one-triangle rig whose clips slide the root 10 units over 10 seconds
pub fn animated_asset(name: &str, clips: usize) -> AssetHandle {
    let nodes = vec![Node {
        name: "hips".into(),
        parent: None,
        rest: Transform::IDENTITY,
    }];
    let meshes = vec![MeshPrimitive {
        node: 0,
        skin: None,
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        normals: vec![Vec3::Z; 3],
        joints: vec![],
        weights: vec![],
        indices: vec![0, 1, 2],
        color: [1.0; 4],
    }];
    let clips = (0..clips)
        .map(|i| {
            AnimationClip::new(
                format!("{name} {i}"),
                vec![Channel {
                    node: 0,
                    times: vec![0.0, 10.0],
                    keyframes: Keyframes::Translation(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]),
                    interpolation: Interpolation::Linear,
                }],
            )
        })
        .collect();
    AssetHandle::new(name, ObjectGraph::new(nodes, meshes, vec![]), clips)
}
